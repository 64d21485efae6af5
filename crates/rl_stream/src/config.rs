use rl_noise::{ChunkConfig, MacroConfig};
use serde::{Deserialize, Serialize};

/// Working-set configuration for chunk streaming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Circular radius, in chunks, of the resident set around the observer.
    pub view_distance: u32,
    pub min_view_distance: u32,
    pub max_view_distance: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            view_distance: 3,
            min_view_distance: 1,
            max_view_distance: 8,
        }
    }
}

impl StreamConfig {
    pub fn clamp_view_distance(&self, n: u32) -> u32 {
        let lo = self.min_view_distance.max(1);
        let hi = self.max_view_distance.max(lo);
        n.clamp(lo, hi)
    }
}

/// Everything the stream manager needs besides the world context.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    #[serde(rename = "macro")]
    pub macro_field: MacroConfig,
    pub chunk: ChunkConfig,
    pub stream: StreamConfig,
}
