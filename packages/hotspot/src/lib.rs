#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hotspot partitioning of historical incidents.
//!
//! [`partition`] groups incident coordinates into a fixed number of spatial
//! clusters with seeded k-means, then summarizes each cluster as a named
//! [`Hotspot`] with a centroid, member count, and density tier. The result
//! is a pure function of the points and the [`PartitionConfig`].

pub mod kmeans;

use std::collections::BTreeSet;

use crime_oracle_hotspot_models::{Centroid, Hotspot, NameOrder, PartitionConfig};
use crime_oracle_incident_models::IncidentPoint;
use thiserror::Error;

use crate::kmeans::{Coord, KMeansParams};

/// Errors that can occur while partitioning incidents.
#[derive(Debug, Error)]
pub enum HotspotError {
    /// The incident set or cluster count cannot be partitioned.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what went wrong.
        message: String,
    },

    /// The partition configuration is inconsistent.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what went wrong.
        message: String,
    },
}

/// Result of a partitioning run.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// One hotspot per cluster, ordered by [`Hotspot::index`].
    pub hotspots: Vec<Hotspot>,
    /// Hotspot index for each input point, in input order.
    pub assignments: Vec<usize>,
    /// Within-cluster sum of squared distances, in squared degrees.
    pub inertia: f64,
}

impl Partition {
    /// Total number of points across all hotspots.
    #[must_use]
    pub fn total_members(&self) -> u64 {
        self.hotspots.iter().map(|h| h.member_count).sum()
    }

    /// Input positions of the points assigned to hotspot `index`.
    pub fn members_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.assignments
            .iter()
            .enumerate()
            .filter(move |(_, assigned)| **assigned == index)
            .map(|(i, _)| i)
    }
}

/// Checks the parts of a [`PartitionConfig`] that do not depend on the
/// incident set.
///
/// # Errors
///
/// * [`HotspotError::InvalidInput`] if `clusters` is zero.
/// * [`HotspotError::Configuration`] if the name list length differs from
///   `clusters`, the tier thresholds are not increasing, or the iteration
///   settings are unusable.
pub fn validate_config(config: &PartitionConfig) -> Result<(), HotspotError> {
    if config.clusters == 0 {
        return Err(HotspotError::InvalidInput {
            message: "cluster count must be at least 1".to_string(),
        });
    }

    if config.names.len() != config.clusters {
        return Err(HotspotError::Configuration {
            message: format!(
                "{} hotspot names configured for {} clusters",
                config.names.len(),
                config.clusters
            ),
        });
    }

    if !config.tiers.is_ordered() {
        return Err(HotspotError::Configuration {
            message: format!(
                "tier thresholds must increase: medium_above={} high_above={}",
                config.tiers.medium_above, config.tiers.high_above
            ),
        });
    }

    if config.restarts == 0 || config.max_iterations == 0 {
        return Err(HotspotError::Configuration {
            message: "restarts and max_iterations must be at least 1".to_string(),
        });
    }

    if !config.tolerance.is_finite() || config.tolerance < 0.0 {
        return Err(HotspotError::Configuration {
            message: format!("invalid tolerance {}", config.tolerance),
        });
    }

    Ok(())
}

/// Partitions incidents into `config.clusters` named hotspots.
///
/// # Errors
///
/// * [`HotspotError::InvalidInput`] if `points` is empty, `clusters` is
///   zero, a point has invalid coordinates, or there are fewer distinct
///   points than clusters.
/// * [`HotspotError::Configuration`] if the configuration fails
///   [`validate_config`].
pub fn partition(
    points: &[IncidentPoint],
    config: &PartitionConfig,
) -> Result<Partition, HotspotError> {
    if points.is_empty() {
        return Err(HotspotError::InvalidInput {
            message: "cannot partition an empty incident set".to_string(),
        });
    }

    validate_config(config)?;

    if let Some(bad) = points.iter().position(|p| !p.has_valid_coordinates()) {
        return Err(HotspotError::InvalidInput {
            message: format!(
                "incident {bad} has invalid coordinates ({}, {})",
                points[bad].latitude, points[bad].longitude
            ),
        });
    }

    let coords: Vec<Coord> = points.iter().map(|p| [p.latitude, p.longitude]).collect();

    let distinct = count_distinct(&coords);
    if distinct < config.clusters {
        return Err(HotspotError::InvalidInput {
            message: format!(
                "{} clusters requested but only {distinct} distinct locations",
                config.clusters
            ),
        });
    }

    let clustering = kmeans::fit(
        &coords,
        &KMeansParams {
            k: config.clusters,
            restarts: config.restarts,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            seed: config.seed,
        },
    );

    let mut counts = vec![0u64; config.clusters];
    for &label in &clustering.labels {
        counts[label] += 1;
    }

    let order = naming_order(config.name_order, &clustering.centers, &counts);

    // order[new] = old, remap[old] = new
    let mut remap = vec![0usize; order.len()];
    for (new, &old) in order.iter().enumerate() {
        remap[old] = new;
    }

    let hotspots: Vec<Hotspot> = order
        .iter()
        .enumerate()
        .map(|(index, &old)| Hotspot {
            index,
            name: config.names[index].clone(),
            centroid: Centroid {
                latitude: clustering.centers[old][0],
                longitude: clustering.centers[old][1],
            },
            member_count: counts[old],
            tier: config.tiers.classify(counts[old]),
        })
        .collect();

    let assignments = clustering.labels.iter().map(|&old| remap[old]).collect();

    log::info!(
        "Partitioned {} incidents into {} hotspots (inertia {:.6e})",
        points.len(),
        hotspots.len(),
        clustering.inertia
    );

    Ok(Partition {
        hotspots,
        assignments,
        inertia: clustering.inertia,
    })
}

fn count_distinct(coords: &[Coord]) -> usize {
    coords
        .iter()
        // `+ 0.0` folds -0.0 into 0.0
        .map(|c| ((c[0] + 0.0).to_bits(), (c[1] + 0.0).to_bits()))
        .collect::<BTreeSet<_>>()
        .len()
}

/// Returns the clustering indices in output order.
fn naming_order(name_order: NameOrder, centers: &[Coord], counts: &[u64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..centers.len()).collect();
    if name_order == NameOrder::MemberCount {
        order.sort_by(|&a, &b| {
            counts[b]
                .cmp(&counts[a])
                .then_with(|| centers[b][0].total_cmp(&centers[a][0]))
                .then_with(|| centers[a][1].total_cmp(&centers[b][1]))
        });
    }
    order
}
