#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Risk projection types.
//!
//! A projection turns a hotspot's baseline count into a predicted count for
//! one target date by multiplying it with the factors of every
//! [`CalendarRule`] whose [`DatePredicate`] matches that date. Rules are
//! plain data so the whole rule table can live in a config file.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Baseline counts from the legacy fixed table, by hotspot index.
pub const LEGACY_BASELINE: &[u64] = &[15, 12, 18, 10, 14, 11, 9, 13];

/// Tier of a predicted incident count.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionTier {
    /// Below the medium threshold.
    Low,
    /// At or above the medium threshold.
    Medium,
    /// At or above the high threshold.
    High,
    /// At or above the critical threshold.
    Critical,
}

/// Inclusive lower bounds for each [`ProjectionTier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ProjectionThresholds {
    /// Minimum count for [`ProjectionTier::Medium`].
    pub medium: u64,
    /// Minimum count for [`ProjectionTier::High`].
    pub high: u64,
    /// Minimum count for [`ProjectionTier::Critical`].
    pub critical: u64,
}

impl Default for ProjectionThresholds {
    fn default() -> Self {
        Self {
            medium: 15,
            high: 30,
            critical: 40,
        }
    }
}

impl ProjectionThresholds {
    /// Classifies a predicted count.
    #[must_use]
    pub const fn classify(&self, count: u64) -> ProjectionTier {
        if count >= self.critical {
            ProjectionTier::Critical
        } else if count >= self.high {
            ProjectionTier::High
        } else if count >= self.medium {
            ProjectionTier::Medium
        } else {
            ProjectionTier::Low
        }
    }

    /// Returns `true` if `medium <= high <= critical`.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.medium <= self.high && self.high <= self.critical
    }
}

/// A condition over a calendar date.
///
/// Serialized externally tagged, e.g. `{ weekdays = ["Mon"] }` or
/// `{ not = { months = [1, 2] } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePredicate {
    /// Matches any of the listed days of the week.
    Weekdays(Vec<Weekday>),
    /// Matches any of the listed months (1 = January).
    Months(Vec<u32>),
    /// Matches when the day of month is at least this value.
    DayOfMonthAtLeast(u32),
    /// Matches when the day of month is at most this value.
    DayOfMonthAtMost(u32),
    /// Matches exactly the listed dates.
    Dates(Vec<NaiveDate>),
    /// Matches when every inner predicate matches.
    All(Vec<DatePredicate>),
    /// Matches when at least one inner predicate matches.
    Any(Vec<DatePredicate>),
    /// Inverts the inner predicate.
    Not(Box<DatePredicate>),
}

impl DatePredicate {
    /// Evaluates the predicate for `date`.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Self::Weekdays(days) => days.contains(&date.weekday()),
            Self::Months(months) => months.contains(&date.month()),
            Self::DayOfMonthAtLeast(day) => date.day() >= *day,
            Self::DayOfMonthAtMost(day) => date.day() <= *day,
            Self::Dates(dates) => dates.contains(&date),
            Self::All(inner) => inner.iter().all(|p| p.matches(date)),
            Self::Any(inner) => inner.iter().any(|p| p.matches(date)),
            Self::Not(inner) => !inner.matches(date),
        }
    }
}

/// A named multiplicative factor applied when its predicate matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CalendarRule {
    /// Short identifier reported when the rule fires.
    pub name: String,
    /// Multiplier applied to the running product.
    pub factor: f64,
    /// Condition under which the rule fires.
    pub when: DatePredicate,
}

impl CalendarRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(name: impl Into<String>, factor: f64, when: DatePredicate) -> Self {
        Self {
            name: name.into(),
            factor,
            when,
        }
    }

    /// The default rule table, in declaration order:
    ///
    /// 1. `monday` ×3.0
    /// 2. `rainy_season` (May through October) ×1.7
    /// 3. `month_end` (day 25 onwards, salary week) ×1.5
    /// 4. `market_day` (Wednesday and Saturday) ×3.0
    #[must_use]
    pub fn default_set() -> Vec<Self> {
        vec![
            Self::new("monday", 3.0, DatePredicate::Weekdays(vec![Weekday::Mon])),
            Self::new(
                "rainy_season",
                1.7,
                DatePredicate::Months(vec![5, 6, 7, 8, 9, 10]),
            ),
            Self::new("month_end", 1.5, DatePredicate::DayOfMonthAtLeast(25)),
            Self::new(
                "market_day",
                3.0,
                DatePredicate::Weekdays(vec![Weekday::Wed, Weekday::Sat]),
            ),
        ]
    }
}

/// Where each hotspot's baseline count comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    /// The hotspot's historical member count.
    #[default]
    Historical,
    /// A fixed count per hotspot index.
    Fixed(Vec<u64>),
}

/// Settings for the risk projector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ProjectionConfig {
    /// Rules applied in declaration order.
    pub rules: Vec<CalendarRule>,
    /// Upper bound on the combined multiplier.
    pub cap: f64,
    /// Predicted counts at or above this are alerted.
    pub alert_threshold: u64,
    /// Tier thresholds for predicted counts.
    pub tiers: ProjectionThresholds,
    /// Baseline count source.
    pub baseline: BaselineSource,
    /// When set, target dates more than this many days before the
    /// reference date are rejected.
    pub look_back_days: Option<u32>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            rules: CalendarRule::default_set(),
            cap: 5.0,
            alert_threshold: 30,
            tiers: ProjectionThresholds::default(),
            baseline: BaselineSource::default(),
            look_back_days: None,
        }
    }
}

/// What to project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionRequest {
    /// Date to project risk for.
    pub target_date: NaiveDate,
    /// "Today" for the look-back guard.
    pub reference_date: Option<NaiveDate>,
}

impl ProjectionRequest {
    /// A request with no reference date.
    #[must_use]
    pub const fn new(target_date: NaiveDate) -> Self {
        Self {
            target_date,
            reference_date: None,
        }
    }

    /// Sets the reference date used by the look-back guard.
    #[must_use]
    pub const fn with_reference(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = Some(reference_date);
        self
    }
}

/// Projected risk for one hotspot on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProjection {
    /// Index of the hotspot this projection belongs to.
    pub hotspot_index: usize,
    /// Name of the hotspot.
    pub hotspot_name: String,
    /// Projected date.
    pub target_date: NaiveDate,
    /// Count the multiplier was applied to.
    pub baseline_count: u64,
    /// Clamped multiplier.
    pub multiplier: f64,
    /// `floor(baseline_count * multiplier)`.
    pub predicted_count: u64,
    /// Tier of `predicted_count`.
    pub tier: ProjectionTier,
    /// Whether `predicted_count` reached the alert threshold.
    pub alert: bool,
}

/// A hotspot flagged for operational attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotAlert {
    /// Hotspot index.
    pub hotspot_index: usize,
    /// Hotspot name.
    pub hotspot_name: String,
    /// Predicted incident count.
    pub predicted_count: u64,
}

/// Full projection output for one target date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    /// Projected date.
    pub target_date: NaiveDate,
    /// Product of every matching factor before clamping.
    pub raw_multiplier: f64,
    /// Multiplier after clamping to `[1.0, cap]`.
    pub multiplier: f64,
    /// Names of the rules that fired, in declaration order.
    pub triggered: Vec<String>,
    /// One projection per hotspot, by ascending hotspot index.
    pub projections: Vec<RiskProjection>,
    /// Alerted hotspots, by ascending hotspot index.
    pub alerts: Vec<HotspotAlert>,
}
