pub mod coords;
pub mod error;
pub mod noise;
pub mod query;

pub use coords::{ChunkCoord, WorldPos};
pub use error::TerrainError;
pub use self::noise::{chunk_seed, GradientNoise, NoiseChannel};
pub use query::{ridge_crest, TerrainQuery};
