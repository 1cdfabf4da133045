//! Offline answers from the current hotspots and prediction.

use std::fmt::Write as _;

use crime_oracle_hotspot_models::Hotspot;
use crime_oracle_projection_models::ProjectionReport;

/// What the assistant knows about right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Briefing {
    /// Current hotspots.
    pub hotspots: Vec<Hotspot>,
    /// Latest prediction, if the user asked for one.
    pub report: Option<ProjectionReport>,
}

impl Briefing {
    /// Hotspots by descending member count, ties by index.
    fn ranked_hotspots(&self) -> Vec<&Hotspot> {
        let mut ranked: Vec<&Hotspot> = self.hotspots.iter().collect();
        ranked.sort_by(|a, b| {
            b.member_count
                .cmp(&a.member_count)
                .then(a.index.cmp(&b.index))
        });
        ranked
    }
}

const DEPLOY_KEYWORDS: &[&str] = &["deploy", "patrol", "recommend", "police", "officer"];
const PREDICTION_KEYWORDS: &[&str] = &[
    "predict", "forecast", "tomorrow", "alert", "risk", "expect",
];
const HOTSPOT_KEYWORDS: &[&str] = &["hotspot", "hot spot", "where", "area", "dangerous"];

/// Answers `question` from `briefing` by keyword.
///
/// Deployment questions are checked first, then prediction questions, then
/// hotspot questions; anything else gets a short usage hint.
#[must_use]
pub fn canned_reply(question: &str, briefing: &Briefing) -> String {
    let question = question.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| question.contains(k));

    if mentions(DEPLOY_KEYWORDS) {
        deployment_reply(briefing)
    } else if mentions(PREDICTION_KEYWORDS) {
        prediction_reply(briefing)
    } else if mentions(HOTSPOT_KEYWORDS) {
        hotspot_reply(briefing)
    } else {
        "I can list the current crime hotspots, explain the latest prediction, or \
         recommend where to deploy patrols. Try asking \"Where are the hotspots?\"."
            .to_string()
    }
}

fn hotspot_reply(briefing: &Briefing) -> String {
    let ranked = briefing.ranked_hotspots();
    if ranked.is_empty() {
        return "No hotspots have been computed yet.".to_string();
    }

    let mut reply = format!("There are {} hotspots. Busiest first:", ranked.len());
    for hotspot in ranked {
        let _ = write!(
            reply,
            "\n- {}: {} incidents ({})",
            hotspot.name, hotspot.member_count, hotspot.tier
        );
    }
    reply
}

fn prediction_reply(briefing: &Briefing) -> String {
    let Some(report) = &briefing.report else {
        return "No prediction has been run yet. Pick a date and run a prediction first."
            .to_string();
    };

    let mut reply = format!(
        "Prediction for {}: risk multiplier x{:.1}",
        report.target_date.format("%A, %B %d, %Y"),
        report.multiplier
    );
    if report.triggered.is_empty() {
        reply.push_str(" (no calendar factors apply).");
    } else {
        let _ = write!(reply, " ({}).", report.triggered.join(", "));
    }

    if report.alerts.is_empty() {
        reply.push_str(" No hotspot reaches the alert threshold.");
    } else {
        reply.push_str(" Alerts:");
        for alert in &report.alerts {
            let _ = write!(
                reply,
                "\n- {}: {} predicted incidents",
                alert.hotspot_name, alert.predicted_count
            );
        }
    }
    reply
}

fn deployment_reply(briefing: &Briefing) -> String {
    if let Some(report) = &briefing.report
        && !report.alerts.is_empty()
    {
        let names: Vec<&str> = report
            .alerts
            .iter()
            .map(|a| a.hotspot_name.as_str())
            .collect();
        return format!(
            "Deploy additional patrols to {} on {}. These hotspots are predicted \
             to reach the alert threshold.",
            names.join(", "),
            report.target_date.format("%A, %B %d, %Y")
        );
    }

    let ranked = briefing.ranked_hotspots();
    match ranked.first() {
        Some(top) => {
            let names: Vec<&str> = ranked
                .iter()
                .filter(|h| h.tier == top.tier)
                .map(|h| h.name.as_str())
                .collect();
            format!(
                "Prioritize patrols in {}, the {} tier hotspots by historical incident count.",
                names.join(", "),
                top.tier
            )
        }
        None => "No hotspots have been computed yet, so there is nothing to recommend.".to_string(),
    }
}

/// Standing instructions for a remote assistant, summarizing `briefing`.
#[must_use]
pub fn system_instruction(briefing: &Briefing) -> String {
    let mut instruction = String::from(
        "You are a public safety assistant for a crime hotspot dashboard. Answer \
         briefly and concretely using the data below. Predictions are a calendar \
         heuristic, not a statistical model; say so if asked about accuracy.\n\n\
         Hotspots (name, incidents, tier, latitude, longitude):",
    );
    for hotspot in briefing.ranked_hotspots() {
        let _ = write!(
            instruction,
            "\n- {}, {}, {}, {:.5}, {:.5}",
            hotspot.name,
            hotspot.member_count,
            hotspot.tier,
            hotspot.centroid.latitude,
            hotspot.centroid.longitude
        );
    }

    if let Some(report) = &briefing.report {
        let _ = write!(
            instruction,
            "\n\nPrediction for {} (multiplier x{:.2}, factors: {}):",
            report.target_date,
            report.multiplier,
            if report.triggered.is_empty() {
                "none".to_string()
            } else {
                report.triggered.join(", ")
            }
        );
        for projection in &report.projections {
            let _ = write!(
                instruction,
                "\n- {}: {} predicted ({}{})",
                projection.hotspot_name,
                projection.predicted_count,
                projection.tier,
                if projection.alert { ", ALERT" } else { "" }
            );
        }
    }

    instruction
}
