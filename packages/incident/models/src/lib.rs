#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident and police station types.
//!
//! These are the raw inputs to the hotspot pipeline. Incidents are loaded
//! once from tabular storage and never mutated; only their coordinates
//! participate in clustering. Category and date ride along untouched so
//! presentation layers can show them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single historical crime incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPoint {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Free-form crime category from the source table.
    pub category: Option<String>,
    /// Day the incident occurred, when the source provides it.
    pub occurred_on: Option<NaiveDate>,
}

impl IncidentPoint {
    /// Creates an incident with coordinates only.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            category: None,
            occurred_on: None,
        }
    }

    /// Attaches a category label.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attaches the occurrence date.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.occurred_on = Some(date);
        self
    }

    /// Returns `true` if both coordinates are finite and inside the valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A police station shown as a static map annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoliceStation {
    /// Display name (e.g. `"Central Police Station"`).
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}
