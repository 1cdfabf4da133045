#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Calendar-rule risk projection.
//!
//! [`project`] applies a [`ProjectionConfig`]'s rule table to one target
//! date, clamps the combined multiplier, and scales each hotspot's baseline
//! into a predicted count, a tier, and an alert flag. This is a fixed
//! heuristic, not a fitted model: identical inputs always give identical
//! reports.

use chrono::{Days, Local, NaiveDate};
use crime_oracle_hotspot_models::Hotspot;
use crime_oracle_projection_models::{
    BaselineSource, CalendarRule, HotspotAlert, ProjectionConfig, ProjectionReport,
    ProjectionRequest, RiskProjection,
};
use thiserror::Error;

/// Errors that can occur during risk projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The hotspots do not fit the configured baseline.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what went wrong.
        message: String,
    },

    /// The target date falls before the allowed look-back window.
    #[error("Invalid date {date}: earliest allowed date is {earliest}")]
    InvalidDate {
        /// The rejected target date.
        date: NaiveDate,
        /// The earliest accepted date.
        earliest: NaiveDate,
    },

    /// The rule table or thresholds are malformed.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },
}

/// Combined effect of a rule table on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplierBreakdown {
    /// Product of every matching factor.
    pub raw: f64,
    /// `raw` clamped to `[1.0, cap]`.
    pub clamped: f64,
    /// Names of the matching rules, in declaration order.
    pub triggered: Vec<String>,
}

/// Checks a [`ProjectionConfig`] for malformed rules or thresholds.
///
/// # Errors
///
/// Returns [`ProjectionError::Configuration`] if the cap is not a finite
/// value of at least 1.0, a rule has an empty name or a non-positive or
/// non-finite factor, or the tier thresholds are out of order.
pub fn validate_config(config: &ProjectionConfig) -> Result<(), ProjectionError> {
    if !config.cap.is_finite() || config.cap < 1.0 {
        return Err(ProjectionError::Configuration {
            message: format!("multiplier cap must be finite and >= 1.0, got {}", config.cap),
        });
    }

    for (i, rule) in config.rules.iter().enumerate() {
        if rule.name.trim().is_empty() {
            return Err(ProjectionError::Configuration {
                message: format!("rule {i} has an empty name"),
            });
        }
        if !rule.factor.is_finite() || rule.factor <= 0.0 {
            return Err(ProjectionError::Configuration {
                message: format!("rule '{}' has invalid factor {}", rule.name, rule.factor),
            });
        }
    }

    if !config.tiers.is_ordered() {
        return Err(ProjectionError::Configuration {
            message: format!(
                "tier thresholds must not decrease: medium={} high={} critical={}",
                config.tiers.medium, config.tiers.high, config.tiers.critical
            ),
        });
    }

    Ok(())
}

/// Multiplies the factors of every rule matching `date`, once each, in
/// declaration order, then clamps the product to `[1.0, cap]`.
///
/// Rules are not validated here. A product that is still not finite after
/// clamping (a NaN factor, say) falls back to `1.0`.
#[must_use]
pub fn evaluate_rules(date: NaiveDate, rules: &[CalendarRule], cap: f64) -> MultiplierBreakdown {
    let mut raw = 1.0;
    let mut triggered = Vec::new();

    for rule in rules {
        if rule.when.matches(date) {
            raw *= rule.factor;
            triggered.push(rule.name.clone());
        }
    }

    let clamped = raw.clamp(1.0, cap.max(1.0));

    MultiplierBreakdown {
        raw,
        clamped: if clamped.is_finite() { clamped } else { 1.0 },
        triggered,
    }
}

/// Projects every hotspot onto `request.target_date`.
///
/// # Errors
///
/// * [`ProjectionError::Configuration`] if the config fails
///   [`validate_config`], or `look_back_days` is set without a reference
///   date.
/// * [`ProjectionError::InvalidDate`] if the target date is older than the
///   look-back window allows.
/// * [`ProjectionError::InvalidInput`] if a fixed baseline does not have
///   exactly one entry per hotspot.
pub fn project(
    hotspots: &[Hotspot],
    request: &ProjectionRequest,
    config: &ProjectionConfig,
) -> Result<ProjectionReport, ProjectionError> {
    validate_config(config)?;
    check_date_window(request, config.look_back_days)?;

    let baseline_counts = baselines(hotspots, &config.baseline)?;
    let breakdown = evaluate_rules(request.target_date, &config.rules, config.cap);

    let mut projections: Vec<RiskProjection> = hotspots
        .iter()
        .zip(baseline_counts)
        .map(|(hotspot, baseline_count)| {
            let predicted_count = scale(baseline_count, breakdown.clamped);
            RiskProjection {
                hotspot_index: hotspot.index,
                hotspot_name: hotspot.name.clone(),
                target_date: request.target_date,
                baseline_count,
                multiplier: breakdown.clamped,
                predicted_count,
                tier: config.tiers.classify(predicted_count),
                alert: predicted_count >= config.alert_threshold,
            }
        })
        .collect();
    projections.sort_by_key(|p| p.hotspot_index);

    let alerts = projections
        .iter()
        .filter(|p| p.alert)
        .map(|p| HotspotAlert {
            hotspot_index: p.hotspot_index,
            hotspot_name: p.hotspot_name.clone(),
            predicted_count: p.predicted_count,
        })
        .collect::<Vec<_>>();

    log::info!(
        "Projected {} hotspots for {}: x{:.2} (raw x{:.2}, triggers: [{}]), {} alerts",
        projections.len(),
        request.target_date,
        breakdown.clamped,
        breakdown.raw,
        breakdown.triggered.join(", "),
        alerts.len()
    );

    Ok(ProjectionReport {
        target_date: request.target_date,
        raw_multiplier: breakdown.raw,
        multiplier: breakdown.clamped,
        triggered: breakdown.triggered,
        projections,
        alerts,
    })
}

/// Projects onto `target_date` with today's local date as the reference
/// date for the look-back guard.
///
/// # Errors
///
/// Same as [`project`].
pub fn project_from_today(
    hotspots: &[Hotspot],
    target_date: NaiveDate,
    config: &ProjectionConfig,
) -> Result<ProjectionReport, ProjectionError> {
    let request = ProjectionRequest::new(target_date).with_reference(today());
    project(hotspots, &request, config)
}

/// Today's local date.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The day after today, the default prediction date.
#[must_use]
pub fn tomorrow() -> NaiveDate {
    let today = today();
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

fn check_date_window(
    request: &ProjectionRequest,
    look_back_days: Option<u32>,
) -> Result<(), ProjectionError> {
    let Some(days) = look_back_days else {
        return Ok(());
    };

    let Some(reference) = request.reference_date else {
        return Err(ProjectionError::Configuration {
            message: "look_back_days is set but no reference date was supplied".to_string(),
        });
    };

    let earliest = reference
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN);

    if request.target_date < earliest {
        return Err(ProjectionError::InvalidDate {
            date: request.target_date,
            earliest,
        });
    }

    Ok(())
}

fn baselines(hotspots: &[Hotspot], source: &BaselineSource) -> Result<Vec<u64>, ProjectionError> {
    match source {
        BaselineSource::Historical => Ok(hotspots.iter().map(|h| h.member_count).collect()),
        BaselineSource::Fixed(counts) => {
            if counts.len() != hotspots.len() {
                return Err(ProjectionError::InvalidInput {
                    message: format!(
                        "fixed baseline has {} entries for {} hotspots",
                        counts.len(),
                        hotspots.len()
                    ),
                });
            }
            hotspots
                .iter()
                .map(|h| {
                    counts
                        .get(h.index)
                        .copied()
                        .ok_or_else(|| ProjectionError::InvalidInput {
                            message: format!("no fixed baseline for hotspot index {}", h.index),
                        })
                })
                .collect()
        }
    }
}

/// `floor(baseline * multiplier)`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scale(baseline: u64, multiplier: f64) -> u64 {
    (baseline as f64 * multiplier).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use crime_oracle_hotspot_models::{Centroid, HotspotTier};
    use crime_oracle_projection_models::{
        DatePredicate, LEGACY_BASELINE, ProjectionThresholds, ProjectionTier,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hotspots(counts: &[u64]) -> Vec<Hotspot> {
        counts
            .iter()
            .enumerate()
            .map(|(index, &member_count)| Hotspot {
                index,
                name: format!("Hotspot {}", index + 1),
                centroid: Centroid {
                    latitude: 5.1,
                    longitude: 7.36,
                },
                member_count,
                tier: HotspotTier::Low,
            })
            .collect()
    }

    fn three_rule_config() -> ProjectionConfig {
        let mut config = ProjectionConfig::default();
        config.rules.retain(|r| r.name != "market_day");
        config
    }

    #[test]
    fn monday_in_june_month_end_is_capped() {
        // 2021-06-28: Monday, rainy season, day 28.
        let breakdown = evaluate_rules(date(2021, 6, 28), &three_rule_config().rules, 5.0);

        assert!((breakdown.raw - 7.65).abs() < 1e-9);
        assert!((breakdown.clamped - 5.0).abs() < f64::EPSILON);
        assert_eq!(breakdown.triggered, ["monday", "rainy_season", "month_end"]);
    }

    #[test]
    fn capped_multiplier_makes_critical_alert() {
        let report = project(
            &hotspots(&[10]),
            &ProjectionRequest::new(date(2021, 6, 28)),
            &three_rule_config(),
        )
        .unwrap();

        let projection = &report.projections[0];
        assert_eq!(projection.baseline_count, 10);
        assert_eq!(projection.predicted_count, 50);
        assert_eq!(projection.tier, ProjectionTier::Critical);
        assert!(projection.alert);
        assert_eq!(
            report.alerts,
            vec![HotspotAlert {
                hotspot_index: 0,
                hotspot_name: "Hotspot 1".to_string(),
                predicted_count: 50,
            }]
        );
    }

    #[test]
    fn no_matching_rules_keeps_baseline() {
        // 2025-02-04: Tuesday, dry season, day 4.
        let report = project(
            &hotspots(&[8, 16, 33]),
            &ProjectionRequest::new(date(2025, 2, 4)),
            &ProjectionConfig::default(),
        )
        .unwrap();

        assert!(report.triggered.is_empty());
        assert!((report.multiplier - 1.0).abs() < f64::EPSILON);
        let counts: Vec<u64> = report.projections.iter().map(|p| p.predicted_count).collect();
        assert_eq!(counts, vec![8, 16, 33]);
        let tiers: Vec<ProjectionTier> = report.projections.iter().map(|p| p.tier).collect();
        assert_eq!(
            tiers,
            vec![ProjectionTier::Low, ProjectionTier::Medium, ProjectionTier::High]
        );
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].hotspot_index, 2);
    }

    #[test]
    fn predicted_count_is_floored() {
        let config = ProjectionConfig {
            rules: vec![CalendarRule::new(
                "rainy_season",
                1.7,
                DatePredicate::Months(vec![5, 6, 7, 8, 9, 10]),
            )],
            ..ProjectionConfig::default()
        };
        // 2025-07-03: Thursday in the rainy season.
        let report = project(
            &hotspots(&[8]),
            &ProjectionRequest::new(date(2025, 7, 3)),
            &config,
        )
        .unwrap();
        // 8 * 1.7 = 13.6
        assert_eq!(report.projections[0].predicted_count, 13);
    }

    #[test]
    fn multiplier_stays_within_bounds_all_year() {
        let config = ProjectionConfig::default();
        let mut day = date(2025, 1, 1);
        while day.year() == 2025 {
            let breakdown = evaluate_rules(day, &config.rules, config.cap);
            assert!(
                (1.0..=config.cap).contains(&breakdown.clamped),
                "{day}: {}",
                breakdown.clamped
            );
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn reducing_factors_never_drop_below_one() {
        let rules = vec![CalendarRule::new(
            "holiday_lull",
            0.5,
            DatePredicate::Dates(vec![date(2025, 12, 25)]),
        )];
        let breakdown = evaluate_rules(date(2025, 12, 25), &rules, 5.0);
        assert!((breakdown.raw - 0.5).abs() < f64::EPSILON);
        assert!((breakdown.clamped - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unvalidated_nan_factor_falls_back_to_one() {
        let day = date(2025, 12, 25);
        let rules = vec![
            CalendarRule::new("broken", f64::NAN, DatePredicate::Dates(vec![day])),
            CalendarRule::new(
                "thursday",
                3.0,
                DatePredicate::Weekdays(vec![chrono::Weekday::Thu]),
            ),
        ];
        let breakdown = evaluate_rules(day, &rules, 5.0);
        assert!(breakdown.raw.is_nan());
        assert!((breakdown.clamped - 1.0).abs() < f64::EPSILON);
        assert_eq!(breakdown.triggered, ["broken", "thursday"]);
    }

    #[test]
    fn projection_is_idempotent() {
        let spots = hotspots(&[21, 4, 13, 9, 30, 2, 11, 17]);
        let request = ProjectionRequest::new(date(2025, 6, 25));
        let config = ProjectionConfig::default();

        let first = project(&spots, &request, &config).unwrap();
        let second = project(&spots, &request, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.multiplier.to_bits(), second.multiplier.to_bits());
    }

    #[test]
    fn alerts_are_in_ascending_index_order() {
        let spots = hotspots(&[12, 2, 9, 1, 7]);
        // 2025-06-25: Wednesday market day in the rainy season, day 25.
        let report = project(
            &spots,
            &ProjectionRequest::new(date(2025, 6, 25)),
            &ProjectionConfig::default(),
        )
        .unwrap();

        assert_eq!(report.triggered, ["rainy_season", "month_end", "market_day"]);
        let alerted: Vec<usize> = report.alerts.iter().map(|a| a.hotspot_index).collect();
        assert_eq!(alerted, vec![0, 2, 4]);
    }

    #[test]
    fn legacy_fixed_baseline_is_supported() {
        let config = ProjectionConfig {
            baseline: BaselineSource::Fixed(LEGACY_BASELINE.to_vec()),
            ..ProjectionConfig::default()
        };
        let report = project(
            &hotspots(&[1; 8]),
            &ProjectionRequest::new(date(2025, 2, 4)),
            &config,
        )
        .unwrap();
        let counts: Vec<u64> = report.projections.iter().map(|p| p.predicted_count).collect();
        assert_eq!(counts, LEGACY_BASELINE);
    }

    #[test]
    fn fixed_baseline_length_must_match() {
        let config = ProjectionConfig {
            baseline: BaselineSource::Fixed(vec![10, 10]),
            ..ProjectionConfig::default()
        };
        let err = project(
            &hotspots(&[1, 2, 3]),
            &ProjectionRequest::new(date(2025, 2, 4)),
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidInput { .. }));
    }

    #[test]
    fn malformed_configs_are_rejected() {
        let low_cap = ProjectionConfig {
            cap: 0.5,
            ..ProjectionConfig::default()
        };
        assert!(matches!(
            validate_config(&low_cap),
            Err(ProjectionError::Configuration { .. })
        ));

        let mut bad_factor = ProjectionConfig::default();
        bad_factor.rules[1].factor = f64::NAN;
        assert!(matches!(
            validate_config(&bad_factor),
            Err(ProjectionError::Configuration { .. })
        ));

        let unordered = ProjectionConfig {
            tiers: ProjectionThresholds {
                medium: 30,
                high: 15,
                critical: 40,
            },
            ..ProjectionConfig::default()
        };
        assert!(matches!(
            validate_config(&unordered),
            Err(ProjectionError::Configuration { .. })
        ));
    }

    #[test]
    fn look_back_window_rejects_old_dates() {
        let config = ProjectionConfig {
            look_back_days: Some(30),
            ..ProjectionConfig::default()
        };
        let spots = hotspots(&[5]);
        let today = date(2025, 3, 1);

        let ok = ProjectionRequest::new(date(2025, 1, 30)).with_reference(today);
        assert!(project(&spots, &ok, &config).is_ok());

        let too_old = ProjectionRequest::new(date(2025, 1, 29)).with_reference(today);
        let err = project(&spots, &too_old, &config).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::InvalidDate { earliest, .. } if earliest == date(2025, 1, 30)
        ));

        let no_reference = ProjectionRequest::new(date(2025, 2, 20));
        assert!(matches!(
            project(&spots, &no_reference, &config),
            Err(ProjectionError::Configuration { .. })
        ));
    }

    #[test]
    fn permissive_by_default() {
        let request = ProjectionRequest::new(date(1990, 1, 1)).with_reference(date(2025, 1, 1));
        assert!(project(&hotspots(&[5]), &request, &ProjectionConfig::default()).is_ok());
    }

    #[test]
    fn project_from_today_applies_look_back_window() {
        let config = ProjectionConfig {
            look_back_days: Some(30),
            ..ProjectionConfig::default()
        };
        let spots = hotspots(&[5]);

        let target = tomorrow();
        let report = project_from_today(&spots, target, &config).unwrap();
        assert_eq!(report.target_date, target);
        assert!(matches!(
            project_from_today(&spots, date(2000, 1, 1), &config),
            Err(ProjectionError::InvalidDate { .. })
        ));
    }
}
