//! Terrain analysis over macro fields, chunks and live height queries.
//!
//! Finds ridges, valleys and peaks, and strings feature points into paths
//! for downstream placement code.

pub mod grid;
pub mod path;
pub mod search;

pub use grid::{detect_features, is_peak, is_ridge, is_valley, FeatureKind, FeaturePoint, HeightGrid};
pub use path::{build_feature_path, PathConfig};
pub use search::{find_local_peaks, find_local_ridges, HeightSampler, QuerySampler, MAX_HALF_WIDTH};
