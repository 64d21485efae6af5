use bevy::log::{debug, info};
use bevy::tasks::{block_on, poll_once, AsyncComputeTaskPool, Task, TaskPool};
use futures_lite::future::yield_now;
use rl_core::{ChunkCoord, TerrainError, TerrainQuery};
use rl_noise::{Chunk, ChunkSynthesizer, MacroComposer, MacroConfig, MacroField, Profile};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::{StreamConfig, StreamSettings};
use crate::context::WorldContext;
use crate::events::StreamEvent;

/// Every chunk coordinate within a circular chunk radius of `center`.
pub fn desired_set(center: ChunkCoord, view_distance: u32) -> HashSet<ChunkCoord> {
    let r = view_distance as i32;
    let r_sq = (view_distance as i64) * (view_distance as i64);
    let mut set = HashSet::new();
    for dz in -r..=r {
        for dx in -r..=r {
            let coord = center.offset(dx, dz);
            if center.distance_sq(coord) <= r_sq {
                set.insert(coord);
            }
        }
    }
    set
}

/// Lifecycle state of one chunk key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Absent,
    Generating,
    Resident,
}

/// Whether the stream has settled around the observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    /// No macro field yet; heights come from direct evaluation.
    BuildingMacro,
    /// Macro field installed, chunk work in flight or queued.
    Streaming,
    /// Resident set matches the observer's neighborhood.
    Ready,
}

/// Receipt for a profile change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileChange {
    pub epoch: u64,
    pub profile: String,
    pub root_seed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeStatus {
    Pending,
    /// The macro field for this change is installed.
    Ready,
    /// A later profile change replaced this one before it finished.
    Superseded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamStats {
    pub resident: usize,
    pub generating: usize,
    pub view_distance: u32,
    pub root_seed: u32,
    pub epoch: u64,
    pub refresh_queued: bool,
}

enum Job {
    Macro(Task<MacroField>),
    Batch(Task<Vec<Chunk>>),
}

enum JobOutput {
    Macro(MacroField),
    Batch(Vec<Chunk>),
}

/// The single job allowed in flight, tagged with the epoch it was spawned under.
struct InFlight {
    epoch: u64,
    job: Job,
}

/// Owns the macro field and the resident chunk map around one observer.
///
/// At most one job (a macro build or a chunk batch) runs at a time. Refresh
/// requests that arrive while busy are coalesced into a single slot holding
/// only the latest request, drained once per completed job.
pub struct ChunkStreamManager {
    context: WorldContext,
    macro_config: MacroConfig,
    synthesizer: Arc<ChunkSynthesizer>,
    config: StreamConfig,
    view_distance: u32,
    composer: MacroComposer,
    macro_field: Option<Arc<MacroField>>,
    chunks: HashMap<ChunkCoord, Chunk>,
    generating: HashSet<ChunkCoord>,
    observer_chunk: ChunkCoord,
    in_flight: Option<InFlight>,
    queued_refresh: Option<ChunkCoord>,
    queued_rebuild: bool,
    epoch: u64,
    events: Vec<StreamEvent>,
}

impl ChunkStreamManager {
    /// Create the manager and start building the macro field for the
    /// context's active profile. The observer starts at chunk `(0, 0)`.
    pub fn new(context: WorldContext, settings: StreamSettings) -> Self {
        AsyncComputeTaskPool::get_or_init(TaskPool::default);

        let composer = MacroComposer::new(
            context.active_profile(),
            context.root_seed(),
            &settings.macro_field,
        );
        let view_distance = settings.stream.clamp_view_distance(settings.stream.view_distance);

        let mut manager = Self {
            context,
            macro_config: settings.macro_field,
            synthesizer: Arc::new(ChunkSynthesizer::new(settings.chunk)),
            config: settings.stream,
            view_distance,
            composer,
            macro_field: None,
            chunks: HashMap::new(),
            generating: HashSet::new(),
            observer_chunk: ChunkCoord::new(0, 0),
            in_flight: None,
            queued_refresh: None,
            queued_rebuild: true,
            epoch: 0,
            events: Vec::new(),
        };
        manager.schedule();
        manager
    }

    pub fn chunk_size(&self) -> f64 {
        self.synthesizer.config().chunk_size
    }

    pub fn context(&self) -> &WorldContext {
        &self.context
    }

    pub fn view_distance(&self) -> u32 {
        self.view_distance
    }

    pub fn observer_chunk(&self) -> ChunkCoord {
        self.observer_chunk
    }

    pub fn macro_field(&self) -> Option<&Arc<MacroField>> {
        self.macro_field.as_ref()
    }

    pub fn synthesizer(&self) -> &ChunkSynthesizer {
        &self.synthesizer
    }

    /// Latest refresh waiting for the in-flight job, if any.
    pub fn queued_refresh(&self) -> Option<ChunkCoord> {
        self.queued_refresh
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn readiness(&self) -> Readiness {
        if self.macro_field.is_none() {
            Readiness::BuildingMacro
        } else if self.in_flight.is_some() || self.queued_refresh.is_some() {
            Readiness::Streaming
        } else {
            Readiness::Ready
        }
    }

    pub fn chunk_state(&self, coord: ChunkCoord) -> ChunkState {
        if self.chunks.contains_key(&coord) {
            ChunkState::Resident
        } else if self.generating.contains(&coord) {
            ChunkState::Generating
        } else {
            ChunkState::Absent
        }
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn resident_coords(&self) -> HashSet<ChunkCoord> {
        self.chunks.keys().copied().collect()
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            resident: self.chunks.len(),
            generating: self.generating.len(),
            view_distance: self.view_distance,
            root_seed: self.context.root_seed(),
            epoch: self.epoch,
            refresh_queued: self.queued_refresh.is_some(),
        }
    }

    /// Take the events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.events)
    }

    /// Report a new observer position. Only a change of chunk triggers work.
    pub fn update_observer_position(&mut self, x: f64, z: f64) {
        let coord = ChunkCoord::from_world(x, z, self.chunk_size());
        if coord == self.observer_chunk {
            return;
        }

        self.observer_chunk = coord;
        self.request_refresh(coord);
    }

    /// Clamp and apply a new view distance, then recompute the desired set.
    pub fn set_view_distance(&mut self, n: u32) {
        self.view_distance = self.config.clamp_view_distance(n);
        self.request_refresh(self.observer_chunk);
    }

    /// Switch profile with a fresh root seed, discarding the macro field and
    /// every resident chunk, then rebuild around the current observer chunk.
    pub fn change_profile(&mut self, name: &str) -> Result<ProfileChange, TerrainError> {
        let profile = self.context.select_profile(name)?;
        let root_seed = self.context.root_seed();

        self.epoch += 1;
        self.macro_field = None;
        self.composer = MacroComposer::new(&profile, root_seed, &self.macro_config);
        self.generating.clear();
        for coord in self.chunks.drain().map(|(coord, _)| coord) {
            self.events.push(StreamEvent::ChunkUnloaded(coord));
        }
        self.queued_refresh = None;
        self.queued_rebuild = true;

        info!(
            "Switching terrain profile to `{}` (seed {}, epoch {})",
            profile.name, root_seed, self.epoch
        );

        self.schedule();

        Ok(ProfileChange {
            epoch: self.epoch,
            profile: profile.name.clone(),
            root_seed,
        })
    }

    pub fn change_status(&self, change: &ProfileChange) -> ChangeStatus {
        if change.epoch < self.epoch {
            ChangeStatus::Superseded
        } else if self.macro_field.is_some() {
            ChangeStatus::Ready
        } else {
            ChangeStatus::Pending
        }
    }

    /// Height at a world position. Total for finite input.
    ///
    /// Tries the chunk that owns the position, then any other resident chunk
    /// containing it, then the macro field, then direct evaluation.
    pub fn get_height_at(&self, x: f64, z: f64) -> f64 {
        let coord = ChunkCoord::from_world(x, z, self.chunk_size());
        if let Some(h) = self.chunks.get(&coord).and_then(|chunk| chunk.height_at(x, z)) {
            return h;
        }

        if let Some(h) = self
            .chunks
            .values()
            .filter(|chunk| chunk.coord() != coord)
            .find_map(|chunk| chunk.height_at(x, z))
        {
            return h;
        }

        match &self.macro_field {
            Some(field) => field.sample(x, z),
            None => self.composer.evaluate(x, z),
        }
    }

    /// Advance the in-flight job without blocking. Returns true when a job finished.
    pub fn poll(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };

        let output = match &mut in_flight.job {
            Job::Macro(task) => block_on(poll_once(task)).map(JobOutput::Macro),
            Job::Batch(task) => block_on(poll_once(task)).map(JobOutput::Batch),
        };
        let Some(output) = output else {
            return false;
        };

        let epoch = in_flight.epoch;
        self.in_flight = None;
        self.complete(epoch, output);
        self.schedule();
        true
    }

    /// Block until no job is in flight or queued.
    pub fn finish_pending(&mut self) {
        while let Some(in_flight) = self.in_flight.take() {
            let output = match in_flight.job {
                Job::Macro(task) => JobOutput::Macro(block_on(task)),
                Job::Batch(task) => JobOutput::Batch(block_on(task)),
            };
            self.complete(in_flight.epoch, output);
            self.schedule();
        }
    }

    fn request_refresh(&mut self, center: ChunkCoord) {
        if self.in_flight.is_some() {
            debug!("Generation busy, queueing refresh around {}", center);
        }
        self.queued_refresh = Some(center);
        self.schedule();
    }

    /// Start the next queued job if nothing is in flight.
    fn schedule(&mut self) {
        if self.in_flight.is_some() {
            return;
        }

        if self.queued_rebuild {
            self.queued_rebuild = false;
            self.spawn_macro_build();
            return;
        }

        if self.macro_field.is_none() {
            return;
        }

        if let Some(center) = self.queued_refresh.take() {
            self.apply_refresh(center);
        }
    }

    /// Evict everything outside the desired set, then spawn one batch for the rest.
    fn apply_refresh(&mut self, center: ChunkCoord) {
        let desired = desired_set(center, self.view_distance);

        let stale: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|coord| !desired.contains(coord))
            .copied()
            .collect();
        for coord in &stale {
            self.chunks.remove(coord);
            self.events.push(StreamEvent::ChunkUnloaded(*coord));
        }
        if !stale.is_empty() {
            debug!("Evicted {} chunks outside radius {} of {}", stale.len(), self.view_distance, center);
        }

        let mut missing: Vec<ChunkCoord> = desired
            .into_iter()
            .filter(|coord| !self.chunks.contains_key(coord))
            .collect();
        if missing.is_empty() {
            return;
        }

        // Nearest first, ties broken by coordinate for a stable order.
        missing.sort_by_key(|coord| (center.distance_sq(*coord), coord.z, coord.x));
        self.spawn_batch(missing);
    }

    fn spawn_macro_build(&mut self) {
        let profile: Arc<Profile> = self.context.active_profile().clone();
        let root_seed = self.context.root_seed();
        let config = self.macro_config.clone();

        debug!("Spawning macro build for `{}` (seed {})", profile.name, root_seed);
        let task = AsyncComputeTaskPool::get().spawn(async move {
            yield_now().await;
            MacroField::build(&profile, root_seed, &config)
        });

        self.in_flight = Some(InFlight {
            epoch: self.epoch,
            job: Job::Macro(task),
        });
    }

    fn spawn_batch(&mut self, coords: Vec<ChunkCoord>) {
        let Some(field) = self.macro_field.clone() else {
            return;
        };
        let profile = self.context.active_profile().clone();
        let root_seed = self.context.root_seed();
        let synthesizer = self.synthesizer.clone();

        debug!("Spawning batch of {} chunks", coords.len());
        self.generating.extend(coords.iter().copied());

        let task = AsyncComputeTaskPool::get().spawn(async move {
            let mut chunks = Vec::with_capacity(coords.len());
            for coord in coords {
                yield_now().await;
                chunks.push(synthesizer.synthesize(coord, &field, &profile, root_seed));
            }
            chunks
        });

        self.in_flight = Some(InFlight {
            epoch: self.epoch,
            job: Job::Batch(task),
        });
    }

    fn complete(&mut self, epoch: u64, output: JobOutput) {
        if epoch != self.epoch {
            debug!("Discarding job results from stale epoch {} (now {})", epoch, self.epoch);
            return;
        }

        match output {
            JobOutput::Macro(field) => {
                let profile = field.profile().name.clone();
                info!(
                    "Macro field ready for `{}` (seed {})",
                    profile,
                    self.context.root_seed()
                );
                self.macro_field = Some(Arc::new(field));
                self.events.push(StreamEvent::MacroReady {
                    profile,
                    root_seed: self.context.root_seed(),
                });
                self.queued_refresh = Some(self.observer_chunk);
            }
            JobOutput::Batch(chunks) => {
                debug!("Batch finished with {} chunks", chunks.len());
                self.generating.clear();
                for chunk in chunks {
                    let coord = chunk.coord();
                    self.chunks.insert(coord, chunk);
                    self.events.push(StreamEvent::ChunkLoaded(coord));
                }
            }
        }
    }

    /// Synthesize one chunk synchronously against the current macro field.
    ///
    /// Fails when the macro field has not been built yet.
    pub fn synthesize_now(&self, coord: ChunkCoord) -> Result<Chunk, TerrainError> {
        let field = self.macro_field.as_ref().ok_or(TerrainError::MacroFieldNotReady)?;
        Ok(self.synthesizer.synthesize(
            coord,
            field,
            self.context.active_profile(),
            self.context.root_seed(),
        ))
    }
}

impl TerrainQuery for ChunkStreamManager {
    fn height_at(&self, x: f64, z: f64) -> f64 {
        self.get_height_at(x, z)
    }

    fn probe_step(&self) -> f64 {
        let resolution = self.synthesizer.config().resolution.max(2);
        self.chunk_size() / (resolution - 1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use rl_noise::{ChunkConfig, ProfileRegistry};

    fn settings(view_distance: u32) -> StreamSettings {
        StreamSettings {
            macro_field: MacroConfig {
                resolution: 65,
                world_size: 2048.0,
                ..MacroConfig::default()
            },
            chunk: ChunkConfig {
                resolution: 17,
                ..ChunkConfig::default()
            },
            stream: StreamConfig {
                view_distance,
                ..StreamConfig::default()
            },
        }
    }

    fn manager(view_distance: u32) -> ChunkStreamManager {
        let context =
            WorldContext::new(ProfileRegistry::with_builtins(), "weathered_range", 42).unwrap();
        ChunkStreamManager::new(context, settings(view_distance))
    }

    /// World position at the center of a chunk.
    fn center_of(coord: ChunkCoord) -> (f64, f64) {
        ((coord.x as f64 + 0.5) * 64.0, (coord.z as f64 + 0.5) * 64.0)
    }

    #[test]
    fn desired_set_is_circular() {
        let set = desired_set(ChunkCoord::new(0, 0), 1);
        assert_eq!(set.len(), 5);
        assert!(set.contains(&ChunkCoord::new(1, 0)));
        assert!(set.contains(&ChunkCoord::new(0, -1)));
        assert!(!set.contains(&ChunkCoord::new(1, 1)));

        assert_eq!(desired_set(ChunkCoord::new(3, -2), 2).len(), 13);
        assert_eq!(desired_set(ChunkCoord::new(0, 0), 3).len(), 29);
    }

    #[test]
    fn initial_neighborhood_is_five_chunks() {
        let mut stream = manager(1);
        assert_eq!(stream.readiness(), Readiness::BuildingMacro);
        stream.finish_pending();

        assert_eq!(stream.readiness(), Readiness::Ready);
        assert_eq!(stream.loaded_chunks().count(), 5);
        assert_eq!(stream.resident_coords(), desired_set(ChunkCoord::new(0, 0), 1));
        assert_eq!(stream.chunk_state(ChunkCoord::new(1, 1)), ChunkState::Absent);
        assert_eq!(stream.chunk_state(ChunkCoord::new(0, 1)), ChunkState::Resident);
    }

    #[test]
    fn moving_far_replaces_the_neighborhood() {
        let mut stream = manager(1);
        stream.finish_pending();
        let original = stream.resident_coords();

        let (x, z) = center_of(ChunkCoord::new(5, 5));
        stream.update_observer_position(x, z);
        stream.finish_pending();

        let resident = stream.resident_coords();
        assert_eq!(resident, desired_set(ChunkCoord::new(5, 5), 1));
        assert!(resident.is_disjoint(&original));
    }

    #[test]
    fn same_chunk_update_is_a_no_op() {
        let mut stream = manager(1);
        stream.finish_pending();
        stream.drain_events();

        stream.update_observer_position(10.0, 20.0);
        stream.update_observer_position(63.0, 1.0);
        assert!(!stream.is_busy());
        assert!(stream.queued_refresh().is_none());
        assert!(stream.drain_events().is_empty());
    }

    #[test]
    fn busy_updates_coalesce_to_latest() {
        let mut stream = manager(1);
        stream.finish_pending();

        let (x, z) = center_of(ChunkCoord::new(2, 0));
        stream.update_observer_position(x, z);
        assert!(stream.is_busy());
        assert_eq!(stream.chunk_state(ChunkCoord::new(3, 0)), ChunkState::Generating);

        for coord in [ChunkCoord::new(9, 9), ChunkCoord::new(-4, 6), ChunkCoord::new(4, 4)] {
            let (x, z) = center_of(coord);
            stream.update_observer_position(x, z);
        }
        assert_eq!(stream.queued_refresh(), Some(ChunkCoord::new(4, 4)));

        stream.finish_pending();
        assert_eq!(stream.resident_coords(), desired_set(ChunkCoord::new(4, 4), 1));
        assert!(stream.queued_refresh().is_none());
    }

    #[test]
    fn resident_set_matches_final_position_after_any_walk() {
        let mut stream = manager(2);
        stream.finish_pending();

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..12 {
            let x = rng.gen_range(-600.0..600.0);
            let z = rng.gen_range(-600.0..600.0);
            stream.update_observer_position(x, z);
            if rng.gen_bool(0.5) {
                stream.poll();
            }
        }
        stream.finish_pending();

        let expected = desired_set(stream.observer_chunk(), 2);
        assert_eq!(stream.resident_coords(), expected);
        assert_eq!(stream.readiness(), Readiness::Ready);
    }

    #[test]
    fn view_distance_is_clamped_and_applied() {
        let mut stream = manager(1);
        stream.finish_pending();

        stream.set_view_distance(0);
        assert_eq!(stream.view_distance(), 1);

        stream.set_view_distance(2);
        stream.finish_pending();
        assert_eq!(stream.loaded_chunks().count(), 13);

        stream.set_view_distance(50);
        assert_eq!(stream.view_distance(), 8);
    }

    #[test]
    fn height_query_is_total() {
        let mut stream = manager(1);

        // Before the macro field exists heights come from direct evaluation.
        assert!(stream.get_height_at(12.0, -40.0).is_finite());

        stream.finish_pending();
        let mut rng = ChaCha8Rng::seed_from_u64(1000);
        for _ in 0..1000 {
            let x = rng.gen_range(-1.0e7..1.0e7);
            let z = rng.gen_range(-1.0e7..1.0e7);
            let h = stream.get_height_at(x, z);
            assert!(h.is_finite(), "Height at ({}, {}) is {}", x, z, h);
        }
    }

    #[test]
    fn height_query_survives_extreme_coordinates() {
        let mut stream = manager(1);
        let extremes = [1e20, -1e20, 1e300, f64::MAX, -f64::MAX, f64::MIN_POSITIVE];

        for &v in &extremes {
            assert!(stream.get_height_at(v, -v).is_finite(), "Height at {} before macro", v);
        }

        stream.finish_pending();
        for &v in &extremes {
            assert!(stream.get_height_at(v, v).is_finite(), "Height at {}", v);
            assert!(stream.get_height_at(0.0, v).is_finite(), "Height at (0, {})", v);
        }
    }

    #[test]
    fn heights_come_from_resident_chunks() {
        let mut stream = manager(1);
        stream.finish_pending();

        let chunk = stream.chunk(ChunkCoord::new(0, 0)).unwrap();
        let expected = chunk.height_at(20.0, 30.0).unwrap();
        assert_eq!(stream.get_height_at(20.0, 30.0), expected);

        // Beyond the resident set the macro field answers.
        let field = stream.macro_field().unwrap().clone();
        assert_eq!(stream.get_height_at(500.0, 500.0), field.sample(500.0, 500.0));
    }

    #[test]
    fn resident_chunks_match_direct_synthesis() {
        let mut stream = manager(1);
        stream.finish_pending();

        let coord = ChunkCoord::new(-1, 0);
        let direct = stream.synthesize_now(coord).unwrap();
        assert_eq!(stream.chunk(coord).unwrap().height_map(), direct.height_map());
    }

    #[test]
    fn synthesis_before_macro_is_rejected() {
        let stream = manager(1);
        assert_eq!(
            stream.synthesize_now(ChunkCoord::new(0, 0)).unwrap_err(),
            TerrainError::MacroFieldNotReady
        );
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let mut stream = manager(1);
        stream.finish_pending();
        let seed = stream.context().root_seed();

        let err = stream.change_profile("volcanic").unwrap_err();
        assert_eq!(err, TerrainError::UnknownProfile("volcanic".to_string()));
        assert_eq!(stream.context().root_seed(), seed);
        assert_eq!(stream.loaded_chunks().count(), 5);
    }

    #[test]
    fn profile_change_rebuilds_everything() {
        let mut stream = manager(1);
        stream.finish_pending();
        stream.drain_events();

        let change = stream.change_profile("dramatic_range").unwrap();
        assert_eq!(stream.loaded_chunks().count(), 0);
        assert_eq!(stream.readiness(), Readiness::BuildingMacro);
        assert_eq!(stream.change_status(&change), ChangeStatus::Pending);

        stream.finish_pending();
        assert_eq!(stream.change_status(&change), ChangeStatus::Ready);
        assert_eq!(stream.context().root_seed(), change.root_seed);
        assert_eq!(stream.macro_field().unwrap().profile().name, "dramatic_range");
        assert_eq!(stream.resident_coords(), desired_set(ChunkCoord::new(0, 0), 1));

        let events = stream.drain_events();
        let unloaded = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::ChunkUnloaded(_)))
            .count();
        assert_eq!(unloaded, 5);
        assert!(events.contains(&StreamEvent::MacroReady {
            profile: "dramatic_range".to_string(),
            root_seed: change.root_seed,
        }));
    }

    #[test]
    fn stale_batch_results_are_discarded() {
        let mut stream = manager(1);
        stream.finish_pending();

        let (x, z) = center_of(ChunkCoord::new(3, 3));
        stream.update_observer_position(x, z);
        assert!(stream.is_busy());

        let first = stream.change_profile("rolling_foothills").unwrap();
        let second = stream.change_profile("jagged_alpine").unwrap();
        assert_eq!(stream.change_status(&first), ChangeStatus::Superseded);

        stream.finish_pending();
        assert_eq!(stream.change_status(&second), ChangeStatus::Ready);
        assert_eq!(stream.resident_coords(), desired_set(ChunkCoord::new(3, 3), 1));

        for chunk in stream.loaded_chunks() {
            let direct = stream.synthesize_now(chunk.coord()).unwrap();
            assert_eq!(chunk.height_map(), direct.height_map());
        }
    }

    #[test]
    fn evictions_precede_generation() {
        let mut stream = manager(1);
        stream.finish_pending();
        stream.drain_events();

        let (x, z) = center_of(ChunkCoord::new(1, 0));
        stream.update_observer_position(x, z);

        // Evictions are visible before the batch lands.
        let events = stream.drain_events();
        assert!(events.contains(&StreamEvent::ChunkUnloaded(ChunkCoord::new(-1, 0))));
        assert!(events.iter().all(|e| !matches!(e, StreamEvent::ChunkLoaded(_))));
        assert_eq!(stream.chunk_state(ChunkCoord::new(-1, 0)), ChunkState::Absent);
        assert_eq!(stream.chunk_state(ChunkCoord::new(2, 0)), ChunkState::Generating);

        stream.finish_pending();
        let events = stream.drain_events();
        assert!(events.contains(&StreamEvent::ChunkLoaded(ChunkCoord::new(2, 0))));
    }

    #[test]
    fn ridge_query_is_consistent_with_heights() {
        let mut stream = manager(1);
        stream.finish_pending();

        // A huge threshold reduces the test to "higher than both x neighbours".
        let step = stream.probe_step();
        for i in 0..32 {
            let x = i as f64 * 2.0;
            let z = 17.0;
            let h = stream.height_at(x, z);
            let expected_x = h > stream.height_at(x + step, z) && h > stream.height_at(x - step, z);
            let expected_z = h > stream.height_at(x, z + step) && h > stream.height_at(x, z - step);
            assert_eq!(stream.is_ridge(x, z, f64::INFINITY), expected_x || expected_z);
        }
    }
}
