use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::GameConfig;

use super::difficulty::Difficulty;
use super::obstacle::ObstacleKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub kind: ObstacleKind,
    pub size: [f32; 2],
    pub altitude: f32,
    /// Left edge; `None` spawns at the right edge of the play area
    pub x: Option<f32>,
}

/// What the spawn policy sees each Playing tick.
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub tick: u64,
    /// Distance scrolled this tick
    pub advanced: f32,
    pub difficulty: Difficulty,
}

pub trait SpawnPolicy: Send {
    /// New session
    fn reset(&mut self);
    fn poll(&mut self, ctx: &SpawnContext) -> Option<SpawnRequest>;
}

/// Distance-based spawner with a randomized gap.
pub struct RandomSpawner {
    rng: StdRng,
    min_gap: f32,
    max_gap: f32,
    pterodactyl_chance: f64,
    cactus_sizes: Vec<[f32; 2]>,
    pterodactyl_size: [f32; 2],
    pterodactyl_altitudes: Vec<f32>,
    since_spawn: f32,
    next_gap: f32,
}

impl RandomSpawner {
    pub fn from_config(config: &GameConfig) -> Self {
        let rng = if config.seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(config.seed)
        };
        let mut spawner = Self {
            rng,
            min_gap: config.min_gap,
            max_gap: config.max_gap,
            pterodactyl_chance: config.pterodactyl_chance,
            cactus_sizes: config.cactus_sizes.clone(),
            pterodactyl_size: config.pterodactyl_size,
            pterodactyl_altitudes: config.pterodactyl_altitudes.clone(),
            since_spawn: 0.0,
            next_gap: 0.0,
        };
        spawner.reset();
        spawner
    }

    fn draw_gap(&mut self, scale: f32) -> f32 {
        let (lo, hi) = (self.min_gap * scale, self.max_gap * scale);
        if hi > lo {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        }
    }

    fn draw_request(&mut self) -> SpawnRequest {
        if self.rng.gen_bool(self.pterodactyl_chance) {
            let altitude = self.pterodactyl_altitudes.choose(&mut self.rng).copied().unwrap_or_default();
            SpawnRequest {
                kind: ObstacleKind::Pterodactyl,
                size: self.pterodactyl_size,
                altitude,
                x: None,
            }
        } else {
            let size = self.cactus_sizes.choose(&mut self.rng).copied().unwrap_or_default();
            SpawnRequest {
                kind: ObstacleKind::Cactus,
                size,
                altitude: 0.0,
                x: None,
            }
        }
    }
}

impl SpawnPolicy for RandomSpawner {
    fn reset(&mut self) {
        self.since_spawn = 0.0;
        self.next_gap = self.draw_gap(1.0);
    }

    fn poll(&mut self, ctx: &SpawnContext) -> Option<SpawnRequest> {
        self.since_spawn += ctx.advanced;
        if self.since_spawn < self.next_gap {
            return None;
        }
        self.since_spawn = 0.0;
        self.next_gap = self.draw_gap(ctx.difficulty.gap_scale);
        let request = self.draw_request();
        debug!("spawn {:?} at tick {}, next gap {:.0}", request.kind, ctx.tick, self.next_gap);
        Some(request)
    }
}

/// Fixed spawn list keyed by tick, for simulations and tests.
pub struct ScriptedSpawner {
    script: Vec<(u64, SpawnRequest)>,
    cursor: usize,
}

impl ScriptedSpawner {
    pub fn new(mut script: Vec<(u64, SpawnRequest)>) -> Self {
        script.sort_by_key(|(tick, _)| *tick);
        Self { script, cursor: 0 }
    }
}

impl SpawnPolicy for ScriptedSpawner {
    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn poll(&mut self, ctx: &SpawnContext) -> Option<SpawnRequest> {
        while let Some((tick, request)) = self.script.get(self.cursor) {
            if *tick > ctx.tick {
                return None;
            }
            self.cursor += 1;
            if *tick == ctx.tick {
                return Some(*request);
            }
        }
        None
    }
}
