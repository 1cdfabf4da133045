#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot types and partition configuration.
//!
//! A [`Hotspot`] is one spatial cluster of historical incidents with a name
//! and a density-based [`HotspotTier`]. [`PartitionConfig`] carries every
//! knob of the partitioner, with defaults matching the dashboards this
//! system replaces (8 clusters, seed 42, 10 restarts).

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default area names, one per cluster.
pub const DEFAULT_HOTSPOT_NAMES: &[&str] = &[
    "Ariaria",
    "Ngwa Rd",
    "Osisioma",
    "Ogbor Hill",
    "Ekeoha",
    "Asa Rd",
    "Faulks Rd",
    "P.H. Rd",
];

/// Historical density tier of a hotspot.
///
/// Variants are ordered from least to most risky so tiers can be compared
/// directly.
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
pub enum HotspotTier {
    /// At most `medium_above` incidents.
    Low,
    /// More than `medium_above`, at most `high_above` incidents.
    Medium,
    /// More than `high_above` incidents.
    High,
}

/// Member-count thresholds for [`HotspotTier`].
///
/// Both bounds are exclusive: a cluster must have strictly more members
/// than the bound to reach the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TierThresholds {
    /// Counts above this are at least [`HotspotTier::Medium`].
    pub medium_above: u64,
    /// Counts above this are [`HotspotTier::High`].
    pub high_above: u64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium_above: 10,
            high_above: 20,
        }
    }
}

impl TierThresholds {
    /// Classifies a member count.
    #[must_use]
    pub const fn classify(&self, member_count: u64) -> HotspotTier {
        if member_count > self.high_above {
            HotspotTier::High
        } else if member_count > self.medium_above {
            HotspotTier::Medium
        } else {
            HotspotTier::Low
        }
    }

    /// Returns `true` if the medium bound sits strictly below the high bound.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.medium_above < self.high_above
    }
}

/// Arithmetic mean of a cluster's member coordinates, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Centroid {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// A named spatial cluster of historical incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Position in the partition output, `0..k`.
    pub index: usize,
    /// Human-readable area name.
    pub name: String,
    /// Cluster center.
    pub centroid: Centroid,
    /// Number of incidents assigned to this cluster.
    pub member_count: u64,
    /// Density tier derived from `member_count`.
    pub tier: HotspotTier,
}

/// How names from [`PartitionConfig::names`] are matched to clusters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NameOrder {
    /// Re-index clusters by descending member count (ties by centroid
    /// latitude descending, then longitude ascending) before naming, so
    /// the busiest area always gets the first name.
    #[default]
    MemberCount,
    /// Name clusters in the order the clustering algorithm produced them.
    ClusterIndex,
}

/// Settings for the hotspot partitioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PartitionConfig {
    /// Number of clusters (`k`).
    pub clusters: usize,
    /// Seed for the clustering RNG.
    pub seed: u64,
    /// Number of independently initialized runs; the lowest-inertia run wins.
    pub restarts: u32,
    /// Lloyd iteration limit per run.
    pub max_iterations: u32,
    /// Convergence tolerance, relative to the mean per-axis variance.
    pub tolerance: f64,
    /// One name per cluster; length must equal `clusters`.
    pub names: Vec<String>,
    /// Name-to-cluster matching strategy.
    pub name_order: NameOrder,
    /// Tier thresholds.
    pub tiers: TierThresholds,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            clusters: DEFAULT_HOTSPOT_NAMES.len(),
            seed: 42,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            names: DEFAULT_HOTSPOT_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
            name_order: NameOrder::default(),
            tiers: TierThresholds::default(),
        }
    }
}

impl PartitionConfig {
    /// Returns a copy with a different cluster count and seed, and generic
    /// `"Hotspot N"` names sized to match.
    #[must_use]
    pub fn with_generic_names(clusters: usize, seed: u64) -> Self {
        Self {
            clusters,
            seed,
            names: (1..=clusters).map(|i| format!("Hotspot {i}")).collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_dashboard() {
        let tiers = TierThresholds::default();
        assert_eq!(tiers.classify(0), HotspotTier::Low);
        assert_eq!(tiers.classify(10), HotspotTier::Low);
        assert_eq!(tiers.classify(11), HotspotTier::Medium);
        assert_eq!(tiers.classify(20), HotspotTier::Medium);
        assert_eq!(tiers.classify(21), HotspotTier::High);
    }

    #[test]
    fn tier_is_monotonic_in_member_count() {
        let tiers = TierThresholds::default();
        for lower in 0..60 {
            for higher in lower + 1..60 {
                assert!(
                    tiers.classify(higher) >= tiers.classify(lower),
                    "{higher} classified below {lower}"
                );
            }
        }
    }

    #[test]
    fn default_config_has_one_name_per_cluster() {
        let config = PartitionConfig::default();
        assert_eq!(config.names.len(), config.clusters);
        assert!(config.tiers.is_ordered());
    }

    #[test]
    fn generic_names_are_sized_to_k() {
        let config = PartitionConfig::with_generic_names(3, 7);
        assert_eq!(config.names, vec!["Hotspot 1", "Hotspot 2", "Hotspot 3"]);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn tier_serializes_screaming_case() {
        let json = serde_json::to_string(&HotspotTier::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
        assert_eq!("HIGH".parse::<HotspotTier>().unwrap(), HotspotTier::High);
    }
}
