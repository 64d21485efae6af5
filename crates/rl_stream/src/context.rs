use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rl_core::TerrainError;
use rl_noise::{Profile, ProfileRegistry};
use std::sync::Arc;

/// Seed and profile state for one world, owned by the stream manager.
#[derive(Clone, Debug)]
pub struct WorldContext {
    root_seed: u32,
    active_profile: Arc<Profile>,
    registry: ProfileRegistry,
    rng: ChaCha8Rng,
}

impl WorldContext {
    /// Start a world with the named profile and a fixed root seed.
    ///
    /// Seeds drawn by later profile changes come from an RNG seeded with
    /// `root_seed`, so a whole session is reproducible.
    pub fn new(registry: ProfileRegistry, profile: &str, root_seed: u32) -> Result<Self, TerrainError> {
        let active_profile = Arc::new(registry.get(profile)?.clone());
        Ok(Self {
            root_seed,
            active_profile,
            registry,
            rng: ChaCha8Rng::seed_from_u64(root_seed as u64),
        })
    }

    pub fn root_seed(&self) -> u32 {
        self.root_seed
    }

    pub fn active_profile(&self) -> &Arc<Profile> {
        &self.active_profile
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Switch to `name` and draw a fresh root seed.
    pub fn select_profile(&mut self, name: &str) -> Result<Arc<Profile>, TerrainError> {
        let profile = Arc::new(self.registry.get(name)?.clone());
        self.root_seed = self.rng.gen();
        self.active_profile = profile.clone();
        Ok(profile)
    }
}
