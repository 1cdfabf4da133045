//! Seeded k-means over planar `[lat, lon]` pairs.
//!
//! Distances are squared Euclidean in raw degree space. At city scale the
//! distortion against geodesic distance is small, and this keeps cluster
//! centers equal to plain coordinate means.
//!
//! Initialization is greedy k-means++: each new center is the best of a few
//! candidates sampled proportionally to their squared distance from the
//! centers chosen so far. All randomness comes from one [`ChaCha8Rng`]
//! seeded by the caller, so a fit is fully reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A `[latitude, longitude]` pair.
pub type Coord = [f64; 2];

/// Parameters for [`fit`].
#[derive(Debug, Clone, Copy)]
pub struct KMeansParams {
    /// Number of clusters. Must not exceed the number of distinct points.
    pub k: usize,
    /// Independent runs; the lowest-inertia run is kept.
    pub restarts: u32,
    /// Lloyd iteration limit per run.
    pub max_iterations: u32,
    /// Convergence tolerance relative to the mean per-axis variance.
    pub tolerance: f64,
    /// RNG seed.
    pub seed: u64,
}

/// Output of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Cluster centers (means of their members).
    pub centers: Vec<Coord>,
    /// Cluster index for each input point.
    pub labels: Vec<usize>,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
}

/// Runs k-means `restarts` times from one seeded RNG stream and returns the
/// run with the lowest inertia. The first run wins ties.
///
/// Every returned cluster has at least one member provided `k` does not
/// exceed the number of distinct points.
#[must_use]
pub fn fit(points: &[Coord], params: &KMeansParams) -> Clustering {
    debug_assert!(params.k > 0 && params.k <= points.len());

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let tolerance = params.tolerance * mean_variance(points);

    let mut best = run_once(points, params, tolerance, &mut rng);
    log::debug!("k-means run 0: inertia {:.6e}", best.inertia);

    for run in 1..params.restarts.max(1) {
        let candidate = run_once(points, params, tolerance, &mut rng);
        log::debug!("k-means run {run}: inertia {:.6e}", candidate.inertia);
        if candidate.inertia < best.inertia {
            best = candidate;
        }
    }

    best
}

fn run_once(
    points: &[Coord],
    params: &KMeansParams,
    tolerance: f64,
    rng: &mut ChaCha8Rng,
) -> Clustering {
    let mut centers = init_centers(points, params.k, rng);
    let mut labels = vec![0usize; points.len()];

    for _ in 0..params.max_iterations {
        assign(points, &centers, &mut labels);
        let updated = recompute_centers(points, &mut labels, &centers);
        let shift: f64 = centers
            .iter()
            .zip(&updated)
            .map(|(a, b)| squared_distance(a, b))
            .sum();
        centers = updated;
        if shift <= tolerance {
            break;
        }
    }

    // Final E-step so labels and centers agree.
    assign(points, &centers, &mut labels);
    let centers = recompute_centers(points, &mut labels, &centers);

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &label)| squared_distance(p, &centers[label]))
        .sum();

    Clustering {
        centers,
        labels,
        inertia,
    }
}

/// Greedy k-means++ seeding.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn init_centers(points: &[Coord], k: usize, rng: &mut ChaCha8Rng) -> Vec<Coord> {
    let local_trials = 2 + (k as f64).ln() as usize;

    let first = points[rng.random_range(0..points.len())];
    let mut centers = Vec::with_capacity(k);
    centers.push(first);

    let mut closest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &first))
        .collect();
    let mut potential: f64 = closest.iter().sum();

    while centers.len() < k && potential > 0.0 {
        let mut best: Option<(usize, Vec<f64>, f64)> = None;

        for _ in 0..local_trials {
            let target = rng.random::<f64>() * potential;
            let candidate = weighted_index(&closest, target);
            let candidate_closest: Vec<f64> = closest
                .iter()
                .zip(points)
                .map(|(&d, p)| d.min(squared_distance(p, &points[candidate])))
                .collect();
            let candidate_potential: f64 = candidate_closest.iter().sum();

            if best
                .as_ref()
                .is_none_or(|(_, _, best_potential)| candidate_potential < *best_potential)
            {
                best = Some((candidate, candidate_closest, candidate_potential));
            }
        }

        let Some((chosen, chosen_closest, chosen_potential)) = best else {
            break;
        };
        centers.push(points[chosen]);
        closest = chosen_closest;
        potential = chosen_potential;
    }

    centers
}

/// Picks the first index whose cumulative weight exceeds `target`, skipping
/// zero-weight entries (points already sitting on a center).
fn weighted_index(weights: &[f64], target: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if w > 0.0 && cumulative > target {
            return i;
        }
    }
    // Rounding can leave `target` just past the final sum.
    weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
}

/// Assigns each point to its nearest center; ties go to the lowest index.
fn assign(points: &[Coord], centers: &[Coord], labels: &mut [usize]) {
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut best_cluster = 0;
        let mut best_dist = f64::INFINITY;
        for (j, center) in centers.iter().enumerate() {
            let dist = squared_distance(point, center);
            if dist < best_dist {
                best_dist = dist;
                best_cluster = j;
            }
        }
        *label = best_cluster;
    }
}

/// Recomputes centers as member means.
///
/// An empty cluster takes over the point farthest from its current center,
/// drawn only from clusters that keep at least one other member.
#[allow(clippy::cast_precision_loss)]
fn recompute_centers(points: &[Coord], labels: &mut [usize], previous: &[Coord]) -> Vec<Coord> {
    let k = previous.len();
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }

        let mut donor: Option<(usize, f64)> = None;
        for (i, point) in points.iter().enumerate() {
            let label = labels[i];
            if counts[label] < 2 {
                continue;
            }
            let dist = squared_distance(point, &previous[label]);
            if donor.is_none_or(|(_, best)| dist > best) {
                donor = Some((i, dist));
            }
        }

        if let Some((i, _)) = donor {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
        }
    }

    let mut sums = vec![[0.0_f64; 2]; k];
    for (point, &label) in points.iter().zip(labels.iter()) {
        sums[label][0] += point[0];
        sums[label][1] += point[1];
    }

    sums.iter()
        .zip(&counts)
        .zip(previous)
        .map(|((sum, &count), prev)| {
            if count == 0 {
                *prev
            } else {
                let n = count as f64;
                [sum[0] / n, sum[1] / n]
            }
        })
        .collect()
}

/// Mean of the per-axis variances.
#[allow(clippy::cast_precision_loss)]
fn mean_variance(points: &[Coord]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len() as f64;
    let mean = points
        .iter()
        .fold([0.0, 0.0], |acc, p| [acc[0] + p[0], acc[1] + p[1]]);
    let mean = [mean[0] / n, mean[1] / n];
    let var = points.iter().fold([0.0, 0.0], |acc, p| {
        [
            (p[0] - mean[0]).mul_add(p[0] - mean[0], acc[0]),
            (p[1] - mean[1]).mul_add(p[1] - mean[1], acc[1]),
        ]
    });
    (var[0] / n + var[1] / n) / 2.0
}

#[inline]
fn squared_distance(a: &Coord, b: &Coord) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(k: usize) -> KMeansParams {
        KMeansParams {
            k,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }

    fn two_blobs() -> Vec<Coord> {
        let mut points = Vec::new();
        for i in 0..5 {
            let d = f64::from(i) * 0.001;
            points.push([1.0 + d, 1.0 - d]);
            points.push([9.0 - d, 9.0 + d]);
        }
        points
    }

    #[test]
    fn separates_two_blobs() {
        let points = two_blobs();
        let result = fit(&points, &params(2));

        // Alternating input order: even indices are blob A, odd are blob B.
        let a = result.labels[0];
        let b = result.labels[1];
        assert_ne!(a, b);
        for (i, &label) in result.labels.iter().enumerate() {
            assert_eq!(label, if i % 2 == 0 { a } else { b });
        }
        assert!((result.centers[a][0] - 1.002).abs() < 1e-9);
        assert!((result.centers[b][0] - 8.998).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_result() {
        let points = two_blobs();
        assert_eq!(fit(&points, &params(3)), fit(&points, &params(3)));
    }

    #[test]
    fn k_equal_to_distinct_points_gives_singletons() {
        let points = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let result = fit(&points, &params(4));
        let mut labels = result.labels.clone();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2, 3]);
        assert!(result.inertia.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_cluster_takes_farthest_point() {
        let points = vec![[0.0, 0.0], [0.0, 1.0], [0.0, 5.0]];
        let mut labels = vec![0, 0, 0];
        let previous = vec![[0.0, 0.0], [100.0, 100.0]];
        let centers = recompute_centers(&points, &mut labels, &previous);

        assert_eq!(labels, vec![0, 0, 1]);
        assert_eq!(centers[1], [0.0, 5.0]);
        assert_eq!(centers[0], [0.0, 0.5]);
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let weights = [0.0, 2.0, 0.0, 3.0];
        assert_eq!(weighted_index(&weights, 0.0), 1);
        assert_eq!(weighted_index(&weights, 1.9), 1);
        assert_eq!(weighted_index(&weights, 2.5), 3);
        assert_eq!(weighted_index(&weights, 5.0), 3);
    }
}
