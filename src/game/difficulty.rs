use serde::Deserialize;

use crate::config::GameConfig;

/// Settings-screen preset, scales base and max speed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyPreset {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl DifficultyPreset {
    pub fn speed_multiplier(self) -> f32 {
        match self {
            DifficultyPreset::Easy => 0.8,
            DifficultyPreset::Normal => 1.0,
            DifficultyPreset::Hard => 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    /// Scroll speed, px per tick
    pub speed: f32,
    /// Multiplier on the spawn gap range, <= 1
    pub gap_scale: f32,
}

/// Difficulty as a pure function of score.
#[derive(Debug, Clone)]
pub struct DifficultyCurve {
    base_speed: f32,
    max_speed: f32,
    speed_per_point: f32,
    gap_shrink_per_point: f32,
    min_gap_scale: f32,
}

impl DifficultyCurve {
    pub fn from_config(config: &GameConfig) -> Self {
        let m = config.difficulty.speed_multiplier();
        Self {
            base_speed: config.base_speed * m,
            max_speed: config.max_speed * m,
            speed_per_point: config.speed_per_point,
            gap_shrink_per_point: config.gap_shrink_per_point,
            min_gap_scale: config.min_gap_scale,
        }
    }

    pub fn at(&self, score: u32) -> Difficulty {
        let score = score as f32;
        Difficulty {
            speed: (self.base_speed + self.speed_per_point * score).min(self.max_speed),
            gap_scale: (1.0 - self.gap_shrink_per_point * score).max(self.min_gap_scale),
        }
    }
}
