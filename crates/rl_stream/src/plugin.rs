use bevy::prelude::*;
use rl_core::WorldPos;

use crate::events::StreamEvent;
use crate::manager::ChunkStreamManager;

/// The stream manager as a bevy resource.
#[derive(Resource, Deref, DerefMut)]
pub struct TerrainStream(pub ChunkStreamManager);

/// World position of the observer the stream follows.
#[derive(Resource, Default, Clone, Copy, Debug, PartialEq)]
pub struct ObserverPosition(pub WorldPos);

/// Push observer movement into the stream manager.
pub fn follow_observer(observer: Res<ObserverPosition>, stream: Option<ResMut<TerrainStream>>) {
    let Some(mut stream) = stream else {
        return;
    };
    if !observer.is_changed() {
        return;
    }

    stream.update_observer_position(observer.0.x, observer.0.z);
}

/// Poll the in-flight generation job and forward stream events.
pub fn poll_terrain_stream(
    stream: Option<ResMut<TerrainStream>>,
    mut events: EventWriter<StreamEvent>,
) {
    let Some(mut stream) = stream else {
        return;
    };

    stream.poll();
    for event in stream.drain_events() {
        events.send(event);
    }
}
