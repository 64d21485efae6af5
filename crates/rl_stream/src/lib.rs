use bevy::prelude::*;

pub mod config;
pub mod context;
pub mod events;
pub mod manager;
pub mod plugin;

pub use config::{StreamConfig, StreamSettings};
pub use context::WorldContext;
pub use events::StreamEvent;
pub use manager::{
    desired_set, ChangeStatus, ChunkState, ChunkStreamManager, ProfileChange, Readiness,
    StreamStats,
};
pub use plugin::{ObserverPosition, TerrainStream};

/// Chunk streaming plugin for Ridgeline.
/// Drives the stream manager from the observer position each frame and
/// forwards its events. The host inserts the [`TerrainStream`] resource.
pub struct RlStreamPlugin;

impl Plugin for RlStreamPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<StreamEvent>()
            .init_resource::<ObserverPosition>()
            .add_systems(
                Update,
                (plugin::follow_observer, plugin::poll_terrain_stream).chain(),
            );
    }
}
