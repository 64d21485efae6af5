use serde::{Deserialize, Serialize};

use crate::grid::FeaturePoint;

/// Tuning for [`build_feature_path`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Preferred distance between consecutive points.
    pub target_spacing: f64,
    /// Candidates nearer than this to the current point are skipped.
    pub min_spacing: f64,
    /// Reward per unit of height gained from one point to the next.
    pub height_weight: f64,
    /// Upper bound on path length, start included.
    pub max_points: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            target_spacing: 64.0,
            min_spacing: 16.0,
            height_weight: 0.5,
            max_points: 12,
        }
    }
}

fn distance(a: &FeaturePoint, b: &FeaturePoint) -> f64 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Greedily chain candidates into a path from `start`.
///
/// Each step takes the unvisited candidate maximizing
/// `-|d - target_spacing| + (h - h_current) * height_weight`, ignoring those
/// within `min_spacing`. Stops at `max_points` or when nothing is eligible.
pub fn build_feature_path(
    start: FeaturePoint,
    candidates: &[FeaturePoint],
    config: &PathConfig,
) -> Vec<FeaturePoint> {
    let mut path = Vec::new();
    if config.max_points == 0 {
        return path;
    }
    path.push(start);

    let mut visited = vec![false; candidates.len()];
    let mut current = start;

    while path.len() < config.max_points {
        let mut best: Option<(usize, f64)> = None;

        for (index, candidate) in candidates.iter().enumerate() {
            if visited[index] {
                continue;
            }
            let d = distance(&current, candidate);
            if d < config.min_spacing {
                continue;
            }

            let score = -(d - config.target_spacing).abs()
                + (candidate.height - current.height) * config.height_weight;
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((index, score));
            }
        }

        let Some((index, _)) = best else {
            break;
        };
        visited[index] = true;
        current = candidates[index];
        path.push(current);
    }

    path
}
