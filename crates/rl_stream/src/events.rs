use bevy::prelude::*;
use rl_core::ChunkCoord;

/// Lifecycle notifications for renderers and other observers of the stream.
#[derive(Event, Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// A new macro field is installed; heights for the profile are now final.
    MacroReady { profile: String, root_seed: u32 },
    ChunkLoaded(ChunkCoord),
    /// The chunk left the resident set; any renderer resource for it can go.
    ChunkUnloaded(ChunkCoord),
}
