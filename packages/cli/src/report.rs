//! Plain-text tables for terminal output.

use std::fmt::Write as _;

use crime_oracle_hotspot_models::Hotspot;
use crime_oracle_projection_models::ProjectionReport;

/// One row per hotspot, in index order.
pub fn hotspot_table(hotspots: &[Hotspot]) -> String {
    let mut out = format!(
        "{:<5} {:<20} {:>9} {:<6} {:>10} {:>10}\n",
        "INDEX", "NAME", "INCIDENTS", "TIER", "LAT", "LON"
    );
    out.push_str(&"-".repeat(65));
    for hotspot in hotspots {
        let _ = write!(
            out,
            "\n{:<5} {:<20} {:>9} {:<6} {:>10.5} {:>10.5}",
            hotspot.index,
            hotspot.name,
            hotspot.member_count,
            hotspot.tier,
            hotspot.centroid.latitude,
            hotspot.centroid.longitude
        );
    }
    out
}

/// Headline, per-hotspot predictions, and alerts.
pub fn projection_table(report: &ProjectionReport) -> String {
    let mut out = format!(
        "Prediction for {} x{:.1} risk",
        report.target_date.format("%A, %B %d, %Y"),
        report.multiplier
    );
    if report.triggered.is_empty() {
        out.push_str(" (no calendar factors)");
    } else {
        let _ = write!(out, " ({})", report.triggered.join(", "));
    }

    let _ = write!(
        out,
        "\n\n{:<20} {:>8} {:>9} {:<8} ALERT\n",
        "HOTSPOT", "BASELINE", "PREDICTED", "TIER"
    );
    out.push_str(&"-".repeat(53));
    for projection in &report.projections {
        let _ = write!(
            out,
            "\n{:<20} {:>8} {:>9} {:<8} {}",
            projection.hotspot_name,
            projection.baseline_count,
            projection.predicted_count,
            projection.tier,
            if projection.alert { "yes" } else { "" }
        );
    }

    if !report.alerts.is_empty() {
        let names: Vec<&str> = report
            .alerts
            .iter()
            .map(|a| a.hotspot_name.as_str())
            .collect();
        let _ = write!(out, "\n\nDeploy to: {}", names.join(", "));
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crime_oracle_hotspot_models::{Centroid, HotspotTier};
    use crime_oracle_projection_models::{HotspotAlert, ProjectionTier, RiskProjection};

    #[test]
    fn hotspot_table_has_header_and_rows() {
        let table = hotspot_table(&[Hotspot {
            index: 0,
            name: "Ariaria".to_string(),
            centroid: Centroid {
                latitude: 5.1,
                longitude: 7.3,
            },
            member_count: 25,
            tier: HotspotTier::High,
        }]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("INDEX"));
        assert!(lines[2].contains("Ariaria"));
        assert!(lines[2].contains("HIGH"));
        assert!(lines[2].contains("5.10000"));
    }

    #[test]
    fn projection_table_lists_alerts() {
        let target_date = NaiveDate::from_ymd_opt(2021, 6, 28).unwrap();
        let report = ProjectionReport {
            target_date,
            raw_multiplier: 7.65,
            multiplier: 5.0,
            triggered: vec!["monday".to_string(), "rainy_season".to_string()],
            projections: vec![RiskProjection {
                hotspot_index: 0,
                hotspot_name: "Ariaria".to_string(),
                target_date,
                baseline_count: 15,
                multiplier: 5.0,
                predicted_count: 75,
                tier: ProjectionTier::Critical,
                alert: true,
            }],
            alerts: vec![HotspotAlert {
                hotspot_index: 0,
                hotspot_name: "Ariaria".to_string(),
                predicted_count: 75,
            }],
        };

        let table = projection_table(&report);
        assert!(table.starts_with(
            "Prediction for Monday, June 28, 2021 x5.0 risk (monday, rainy_season)"
        ));
        assert!(table.contains("CRITICAL"));
        assert!(table.ends_with("Deploy to: Ariaria"));
    }
}
