pub mod chunk;
pub mod fractal;
pub mod layers;
pub mod macro_field;
pub mod profile;
pub mod synth;

pub use chunk::Chunk;
pub use fractal::{height_at, FractalParams, NonlinearScaling};
pub use layers::{DetailParams, ElevationZone, NoiseScaleLayer, ZoneTable};
pub use macro_field::{MacroComposer, MacroConfig, MacroField};
pub use profile::{Profile, ProfileRegistry, DEFAULT_PROFILE};
pub use synth::{ChunkConfig, ChunkSynthesizer};
