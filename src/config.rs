use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;
use crate::game::DifficultyPreset;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub smooth: SmoothConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// High score file (JSON)
    #[serde(default = "default_high_score_path")]
    pub high_score_path: String,
}

fn default_target_fps() -> u32 { 60 }
fn default_high_score_path() -> String { "highscore.json".to_string() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            high_score_path: default_high_score_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default)]
    pub index: i32,
    /// Number of consecutive device indices tried starting at `index`
    #[serde(default = "default_probe_count")]
    pub probe_count: i32,
    #[serde(default = "default_camera_width")]
    pub width: u32,
    #[serde(default = "default_camera_height")]
    pub height: u32,
    /// Flip frames horizontally (selfie view)
    #[serde(default = "default_true")]
    pub mirror: bool,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Detections with a lower mean keypoint confidence are dropped
    #[serde(default = "default_min_pose_confidence")]
    pub min_pose_confidence: f32,
}

fn default_probe_count() -> i32 { 3 }
fn default_camera_width() -> u32 { 640 }
fn default_camera_height() -> u32 { 480 }
fn default_true() -> bool { true }
fn default_model_path() -> String { "models/movenet_lightning.onnx".to_string() }
fn default_min_pose_confidence() -> f32 { 0.2 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            probe_count: default_probe_count(),
            width: default_camera_width(),
            height: default_camera_height(),
            mirror: default_true(),
            model_path: default_model_path(),
            min_pose_confidence: default_min_pose_confidence(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SmoothMode {
    #[default]
    Ema,
    OneEuro,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmoothConfig {
    #[serde(default)]
    pub mode: SmoothMode,
    /// EMA decay: 1.0 = no smoothing
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// Missing frames tolerated before the pose is declared lost
    #[serde(default = "default_grace_frames")]
    pub grace_frames: u32,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_min_cutoff")]
    pub min_cutoff: f32,
    #[serde(default = "default_beta")]
    pub beta: f32,
    #[serde(default = "default_d_cutoff")]
    pub d_cutoff: f32,
}

fn default_alpha() -> f32 { 0.5 }
fn default_grace_frames() -> u32 { 5 }
fn default_confidence_threshold() -> f32 { 0.3 }
fn default_min_cutoff() -> f32 { 1.5 }
fn default_beta() -> f32 { 0.5 }
fn default_d_cutoff() -> f32 { 1.0 }

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            mode: SmoothMode::default(),
            alpha: default_alpha(),
            grace_frames: default_grace_frames(),
            confidence_threshold: default_confidence_threshold(),
            min_cutoff: default_min_cutoff(),
            beta: default_beta(),
            d_cutoff: default_d_cutoff(),
        }
    }
}

/// Landmark used as the vertical reference for jump/duck
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    Shoulders,
    Nose,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GestureConfig {
    #[serde(default)]
    pub anchor: Anchor,
    /// Fraction of body height the anchor must rise above baseline
    #[serde(default = "default_jump_threshold")]
    pub jump_threshold: f32,
    /// Fraction of body height the anchor must drop below baseline
    #[serde(default = "default_duck_threshold")]
    pub duck_threshold: f32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_calibration_frames")]
    pub calibration_frames: u32,
    #[serde(default = "default_calibration_timeout_frames")]
    pub calibration_timeout_frames: u32,
    /// Allowed anchor spread during calibration, as a fraction of body height
    #[serde(default = "default_max_calibration_spread")]
    pub max_calibration_spread: f32,
}

fn default_jump_threshold() -> f32 { 0.25 }
fn default_duck_threshold() -> f32 { 0.35 }
fn default_debounce_ms() -> u64 { 150 }
fn default_calibration_frames() -> u32 { 30 }
fn default_calibration_timeout_frames() -> u32 { 300 }
fn default_max_calibration_spread() -> f32 { 0.15 }

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            anchor: Anchor::default(),
            jump_threshold: default_jump_threshold(),
            duck_threshold: default_duck_threshold(),
            debounce_ms: default_debounce_ms(),
            calibration_frames: default_calibration_frames(),
            calibration_timeout_frames: default_calibration_timeout_frames(),
            max_calibration_spread: default_max_calibration_spread(),
        }
    }
}

/// World units are pixels; altitude grows upward from the ground line.
#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    #[serde(default = "default_play_width")]
    pub play_width: f32,
    #[serde(default = "default_player_x")]
    pub player_x: f32,
    /// [width, height]
    #[serde(default = "default_running_size")]
    pub running_size: [f32; 2],
    #[serde(default = "default_ducking_size")]
    pub ducking_size: [f32; 2],
    /// Per tick
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_jump_velocity")]
    pub jump_velocity: f32,
    #[serde(default = "default_cactus_sizes")]
    pub cactus_sizes: Vec<[f32; 2]>,
    #[serde(default = "default_pterodactyl_size")]
    pub pterodactyl_size: [f32; 2],
    #[serde(default = "default_pterodactyl_altitudes")]
    pub pterodactyl_altitudes: Vec<f32>,
    #[serde(default = "default_pterodactyl_chance")]
    pub pterodactyl_chance: f64,
    #[serde(default = "default_min_gap")]
    pub min_gap: f32,
    #[serde(default = "default_max_gap")]
    pub max_gap: f32,
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_speed_per_point")]
    pub speed_per_point: f32,
    #[serde(default = "default_gap_shrink_per_point")]
    pub gap_shrink_per_point: f32,
    #[serde(default = "default_min_gap_scale")]
    pub min_gap_scale: f32,
    #[serde(default)]
    pub difficulty: DifficultyPreset,
    #[serde(default = "default_lives")]
    pub lives: u32,
    /// Horizontal slack around the player for collision candidates,
    /// at least the widest obstacle
    #[serde(default = "default_proximity_margin")]
    pub proximity_margin: f32,
    /// 0 = seed from entropy
    #[serde(default)]
    pub seed: u64,
}

fn default_play_width() -> f32 { 800.0 }
fn default_player_x() -> f32 { 60.0 }
fn default_running_size() -> [f32; 2] { [60.0, 64.0] }
fn default_ducking_size() -> [f32; 2] { [80.0, 36.0] }
fn default_gravity() -> f32 { 0.6 }
fn default_jump_velocity() -> f32 { 15.0 }
fn default_cactus_sizes() -> Vec<[f32; 2]> { vec![[30.0, 50.0], [50.0, 50.0], [70.0, 60.0]] }
fn default_pterodactyl_size() -> [f32; 2] { [60.0, 40.0] }
fn default_pterodactyl_altitudes() -> Vec<f32> { vec![12.0, 44.0, 90.0] }
fn default_pterodactyl_chance() -> f64 { 0.3 }
fn default_min_gap() -> f32 { 600.0 }
fn default_max_gap() -> f32 { 1200.0 }
fn default_base_speed() -> f32 { 10.0 }
fn default_max_speed() -> f32 { 20.0 }
fn default_speed_per_point() -> f32 { 0.25 }
fn default_gap_shrink_per_point() -> f32 { 0.01 }
fn default_min_gap_scale() -> f32 { 0.5 }
fn default_lives() -> u32 { 1 }
fn default_proximity_margin() -> f32 { 80.0 }

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            play_width: default_play_width(),
            player_x: default_player_x(),
            running_size: default_running_size(),
            ducking_size: default_ducking_size(),
            gravity: default_gravity(),
            jump_velocity: default_jump_velocity(),
            cactus_sizes: default_cactus_sizes(),
            pterodactyl_size: default_pterodactyl_size(),
            pterodactyl_altitudes: default_pterodactyl_altitudes(),
            pterodactyl_chance: default_pterodactyl_chance(),
            min_gap: default_min_gap(),
            max_gap: default_max_gap(),
            base_speed: default_base_speed(),
            max_speed: default_max_speed(),
            speed_per_point: default_speed_per_point(),
            gap_shrink_per_point: default_gap_shrink_per_point(),
            min_gap_scale: default_min_gap_scale(),
            difficulty: DifficultyPreset::default(),
            lives: default_lives(),
            proximity_margin: default_proximity_margin(),
            seed: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// Draw the skeleton overlay
    #[serde(default = "default_true")]
    pub view: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self { view: true }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Missing file falls back to defaults silently; a broken file is logged.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("config {} is invalid, using defaults: {}", path.display(), e);
                    Config::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
            Err(e) => {
                warn!("config {} unreadable, using defaults: {}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.smooth;
        if !(s.alpha > 0.0 && s.alpha <= 1.0) {
            return Err(ConfigError::OutOfRange { field: "smooth.alpha", value: s.alpha as f64 });
        }
        let g = &self.gesture;
        if g.calibration_frames == 0 {
            return Err(ConfigError::OutOfRange { field: "gesture.calibration_frames", value: 0.0 });
        }
        if g.calibration_timeout_frames < g.calibration_frames {
            return Err(ConfigError::OutOfRange {
                field: "gesture.calibration_timeout_frames",
                value: g.calibration_timeout_frames as f64,
            });
        }
        if g.jump_threshold <= 0.0 || g.duck_threshold <= 0.0 {
            return Err(ConfigError::OutOfRange { field: "gesture.*_threshold", value: 0.0 });
        }
        let game = &self.game;
        if game.min_gap > game.max_gap {
            return Err(ConfigError::GapRange { min: game.min_gap, max: game.max_gap });
        }
        if game.gravity <= 0.0 {
            return Err(ConfigError::OutOfRange { field: "game.gravity", value: game.gravity as f64 });
        }
        if game.base_speed <= 0.0 || game.max_speed < game.base_speed {
            return Err(ConfigError::OutOfRange { field: "game.max_speed", value: game.max_speed as f64 });
        }
        if !(0.0..=1.0).contains(&game.pterodactyl_chance) {
            return Err(ConfigError::OutOfRange { field: "game.pterodactyl_chance", value: game.pterodactyl_chance });
        }
        if game.cactus_sizes.is_empty() {
            return Err(ConfigError::Empty("game.cactus_sizes"));
        }
        if game.pterodactyl_altitudes.is_empty() {
            return Err(ConfigError::Empty("game.pterodactyl_altitudes"));
        }
        let widest = game
            .cactus_sizes
            .iter()
            .chain(std::iter::once(&game.pterodactyl_size))
            .map(|[w, _]| *w)
            .fold(0.0_f32, f32::max);
        if game.proximity_margin < widest {
            return Err(ConfigError::OutOfRange { field: "game.proximity_margin", value: game.proximity_margin as f64 });
        }
        if game.lives == 0 {
            return Err(ConfigError::OutOfRange { field: "game.lives", value: 0.0 });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.smooth.grace_frames, 5);
        assert_eq!(config.gesture.debounce_ms, 150);
        assert_eq!(config.game.lives, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [smooth]
            mode = "one_euro"
            alpha = 0.8

            [gesture]
            anchor = "nose"

            [game]
            difficulty = "hard"
            lives = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.smooth.mode, SmoothMode::OneEuro);
        assert_eq!(config.smooth.alpha, 0.8);
        assert_eq!(config.smooth.grace_frames, 5);
        assert_eq!(config.gesture.anchor, Anchor::Nose);
        assert_eq!(config.game.difficulty, DifficultyPreset::Hard);
        assert_eq!(config.game.lives, 3);
        assert_eq!(config.game.base_speed, 10.0);
    }

    #[test]
    fn test_validate_rejects_bad_alpha() {
        let mut config = Config::default();
        config.smooth.alpha = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "smooth.alpha", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_gap() {
        let mut config = Config::default();
        config.game.min_gap = 500.0;
        config.game.max_gap = 100.0;
        assert!(matches!(config.validate(), Err(ConfigError::GapRange { .. })));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("does/not/exist.toml");
        assert_eq!(config.app.target_fps, 60);
    }
}
