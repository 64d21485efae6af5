use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use rl_analysis::{find_local_peaks, find_local_ridges, QuerySampler};
use rl_core::WorldPos;
use rl_persistence::{
    init_settings, load_settings, resolve_settings, SettingsIoError, TerrainSettings, SETTINGS_DIR,
};
use rl_stream::{
    ChunkStreamManager, ObserverPosition, Readiness, RlStreamPlugin, StreamEvent, TerrainStream,
};
use std::path::Path;
use std::time::Duration;

/// Frames to run before exiting.
const RUN_FRAMES: u32 = 900;
/// Observer speed in world units per frame.
const WALK_SPEED: f64 = 6.0;
/// Frames between terrain surveys.
const SURVEY_INTERVAL: u32 = 120;
/// Frame at which the walk switches to the second profile.
const PROFILE_SWITCH_FRAME: u32 = 450;

/// Scripted observer route through the world.
#[derive(Resource)]
struct Walk {
    waypoints: Vec<WorldPos>,
    next: usize,
    frame: u32,
}

impl Default for Walk {
    fn default() -> Self {
        Self {
            waypoints: vec![
                WorldPos::new(0.0, 0.0),
                WorldPos::new(640.0, 0.0),
                WorldPos::new(640.0, 640.0),
                WorldPos::new(-320.0, 960.0),
                WorldPos::new(-1200.0, -400.0),
            ],
            next: 1,
            frame: 0,
        }
    }
}

fn main() {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))),
        LogPlugin::default(),
        RlStreamPlugin,
    ));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(settings) = settings_from_args(&args) else {
        return;
    };

    let context = match settings.context() {
        Ok(context) => context,
        Err(e) => {
            error!("Invalid terrain settings: {}", e);
            return;
        }
    };
    info!(
        "Starting terrain stream with profile `{}` (seed {})",
        settings.initial_profile, settings.root_seed
    );

    app.insert_resource(TerrainStream(ChunkStreamManager::new(context, settings.stream)))
        .init_resource::<Walk>()
        .add_systems(Update, (walk_observer, log_stream_events, survey_terrain, switch_profile))
        .run();
}

/// Pick the session settings from the command line.
///
/// No argument runs the defaults. `--init <name>` writes the defaults under
/// that name in [`SETTINGS_DIR`] and runs them. Any other argument is a
/// settings file path or a name inside [`SETTINGS_DIR`].
fn settings_from_args(args: &[String]) -> Option<TerrainSettings> {
    let dir = Path::new(SETTINGS_DIR);

    match args {
        [] => Some(TerrainSettings::default()),
        [flag, name] if flag == "--init" => {
            let settings = TerrainSettings::default();
            match init_settings(dir, name, &settings) {
                Ok(path) => {
                    info!("Wrote default terrain settings to {}", path.display());
                    Some(settings)
                }
                Err(e) => {
                    error!("Failed to write terrain settings `{}`: {}", name, e);
                    None
                }
            }
        }
        [arg] => {
            let loaded = resolve_settings(dir, arg).and_then(|path| {
                let settings = load_settings(&path)?;
                info!("Loaded terrain settings from {}", path.display());
                Ok(settings)
            });
            match loaded {
                Ok(settings) => Some(settings),
                Err(SettingsIoError::NotFound { name, available }) if available.is_empty() => {
                    error!(
                        "No settings named `{}` and none saved in {}; create one with --init <name>",
                        name, SETTINGS_DIR
                    );
                    None
                }
                Err(e) => {
                    error!("Failed to load terrain settings: {}", e);
                    None
                }
            }
        }
        _ => {
            error!("Usage: ridgeline [SETTINGS | --init NAME]");
            None
        }
    }
}

/// Move the observer toward the next waypoint, exiting after the final frame.
fn walk_observer(
    mut walk: ResMut<Walk>,
    mut observer: ResMut<ObserverPosition>,
    mut exit: EventWriter<AppExit>,
) {
    walk.frame += 1;
    if walk.frame >= RUN_FRAMES {
        exit.send(AppExit::Success);
        return;
    }

    let Some(&target) = walk.waypoints.get(walk.next) else {
        return;
    };
    let position = observer.0;
    let distance = position.distance(target);
    if distance <= WALK_SPEED {
        observer.0 = target;
        walk.next += 1;
        return;
    }

    let t = WALK_SPEED / distance;
    observer.0 = WorldPos::new(
        position.x + (target.x - position.x) * t,
        position.z + (target.z - position.z) * t,
    );
}

fn log_stream_events(mut events: EventReader<StreamEvent>) {
    for event in events.read() {
        match event {
            StreamEvent::MacroReady { profile, root_seed } => {
                info!("Macro field ready: `{}` (seed {})", profile, root_seed);
            }
            StreamEvent::ChunkLoaded(coord) => debug!("Chunk {} loaded", coord),
            StreamEvent::ChunkUnloaded(coord) => debug!("Chunk {} unloaded", coord),
        }
    }
}

/// Periodically log the ground under the observer and nearby features.
fn survey_terrain(walk: Res<Walk>, observer: Res<ObserverPosition>, stream: Res<TerrainStream>) {
    if walk.frame % SURVEY_INTERVAL != 0 {
        return;
    }

    let position = observer.0;
    let height = stream.get_height_at(position.x, position.z);
    let stats = stream.stats();
    info!(
        "Observer at ({:.0}, {:.0}): height {:.1}, {} chunks resident, {} generating ({:?})",
        position.x,
        position.z,
        height,
        stats.resident,
        stats.generating,
        stream.readiness()
    );

    if stream.readiness() != Readiness::Ready {
        return;
    }

    let sampler = QuerySampler(&stream.0);
    let ridges = find_local_ridges(&sampler, position, 96.0, 8.0, 6.0);
    let peaks = find_local_peaks(&sampler, position, 96.0, 8.0, 0.5);
    info!("{} ridge samples and {} peaks within 96 units", ridges.len(), peaks.len());
    if let Some(top) = peaks.iter().max_by(|a, b| a.height.total_cmp(&b.height)) {
        info!("Highest nearby peak at ({:.0}, {:.0}): {:.1}", top.x, top.z, top.height);
    }
}

/// Swap to another profile halfway through the walk.
fn switch_profile(walk: Res<Walk>, mut stream: ResMut<TerrainStream>) {
    if walk.frame != PROFILE_SWITCH_FRAME {
        return;
    }

    let Some(name) = stream
        .context()
        .registry()
        .names()
        .find(|name| *name != stream.context().active_profile().name)
        .map(str::to_string)
    else {
        return;
    };

    match stream.change_profile(&name) {
        Ok(change) => info!("Requested profile `{}` with seed {}", change.profile, change.root_seed),
        Err(e) => warn!("Profile change failed: {}", e),
    }
}
