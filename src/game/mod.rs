//! Runner game: state machine, physics, obstacles and collision

pub mod collision;
pub mod difficulty;
pub mod obstacle;
pub mod player;
pub mod runner;
pub mod session;
pub mod spawn;

pub use collision::Rect;
pub use difficulty::{Difficulty, DifficultyCurve, DifficultyPreset};
pub use obstacle::{Obstacle, ObstacleId, ObstacleKind};
pub use player::{Hitboxes, PlayerState, Posture};
pub use runner::{Runner, RunnerEvent, Snapshot};
pub use session::{Command, GameSession, GameState};
pub use spawn::{RandomSpawner, ScriptedSpawner, SpawnContext, SpawnPolicy, SpawnRequest};

pub use crate::error::RunnerError;
