use tracing::{debug, info};

use crate::config::GameConfig;
use crate::control::ResolvedInput;
use crate::error::RunnerError;

use super::collision;
use super::difficulty::{Difficulty, DifficultyCurve};
use super::obstacle::{Obstacle, ObstacleId, ObstacleKind};
use super::player::{Hitboxes, PlayerState};
use super::session::{Command, GameSession, GameState};
use super::spawn::{RandomSpawner, SpawnContext, SpawnPolicy, SpawnRequest};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunnerEvent {
    SessionStarted,
    Jumped,
    Landed,
    ObstacleSpawned { id: ObstacleId, kind: ObstacleKind },
    ObstacleCleared { id: ObstacleId },
    LifeLost { remaining: u32 },
    GameOver { score: u32, new_high_score: bool },
    Paused,
    Resumed,
    ReturnedToMenu,
}

/// Read-only view for the render sink.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub session: &'a GameSession,
    pub player: &'a PlayerState,
    pub obstacles: &'a [Obstacle],
    pub difficulty: Difficulty,
    pub high_score: u32,
    pub play_width: f32,
}

/// Runner state machine: session, player, obstacles and the spawner.
pub struct Runner {
    config: GameConfig,
    curve: DifficultyCurve,
    spawner: Box<dyn SpawnPolicy>,
    session: GameSession,
    difficulty: Difficulty,
    player: PlayerState,
    /// Sorted by `x`
    obstacles: Vec<Obstacle>,
    next_id: u64,
    high_score: u32,
}

impl Runner {
    pub fn new(config: &GameConfig, high_score: u32) -> Self {
        Self::with_spawner(config, high_score, Box::new(RandomSpawner::from_config(config)))
    }

    pub fn with_spawner(config: &GameConfig, high_score: u32, spawner: Box<dyn SpawnPolicy>) -> Self {
        let curve = DifficultyCurve::from_config(config);
        let difficulty = curve.at(0);
        let hitboxes = Hitboxes {
            running: config.running_size,
            ducking: config.ducking_size,
        };
        Self {
            config: config.clone(),
            curve,
            spawner,
            session: GameSession::new(difficulty.speed, config.lives),
            difficulty,
            player: PlayerState::new(config.player_x, hitboxes),
            obstacles: Vec::new(),
            next_id: 0,
            high_score,
        }
    }

    pub fn state(&self) -> GameState {
        self.session.state
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            session: &self.session,
            player: &self.player,
            obstacles: &self.obstacles,
            difficulty: self.difficulty,
            high_score: self.high_score,
            play_width: self.config.play_width,
        }
    }

    /// Applies a player command. Unlisted transitions are errors.
    pub fn handle(&mut self, command: Command) -> Result<Vec<RunnerEvent>, RunnerError> {
        let from = self.session.state;
        let to = from.on(command)?;
        info!("{:?} --{:?}--> {:?}", from, command, to);

        let event = match to {
            GameState::Playing if from == GameState::Paused => {
                self.session.state = to;
                RunnerEvent::Resumed
            }
            GameState::Playing => {
                self.start_session();
                RunnerEvent::SessionStarted
            }
            GameState::Paused => {
                self.session.state = to;
                RunnerEvent::Paused
            }
            GameState::Menu => {
                self.session.state = to;
                self.obstacles.clear();
                self.player.reset();
                RunnerEvent::ReturnedToMenu
            }
            // `on` never yields GameOver
            GameState::GameOver => return Err(RunnerError::InvalidTransition { state: from, command }),
        };
        Ok(vec![event])
    }

    /// Advances one Playing tick; no-op in every other state.
    pub fn tick(&mut self, input: &ResolvedInput) -> Vec<RunnerEvent> {
        let mut events = Vec::new();
        if self.session.state != GameState::Playing {
            return events;
        }
        self.session.tick += 1;
        let speed = self.difficulty.speed;

        // Input, then physics
        if self.player.apply_input(input.jump, input.duck, self.config.jump_velocity) {
            events.push(RunnerEvent::Jumped);
        }
        if self.player.integrate(self.config.gravity, input.duck) {
            events.push(RunnerEvent::Landed);
        }

        let ctx = SpawnContext {
            tick: self.session.tick,
            advanced: speed,
            difficulty: self.difficulty,
        };
        if let Some(request) = self.spawner.poll(&ctx) {
            let id = self.spawn(request);
            events.push(RunnerEvent::ObstacleSpawned { id, kind: request.kind });
        }

        // Scroll and retire
        for obstacle in &mut self.obstacles {
            obstacle.x -= speed;
        }
        self.session.distance += speed;
        let before = events.len();
        self.obstacles.retain(|o| {
            if o.is_off_screen() {
                events.push(RunnerEvent::ObstacleCleared { id: o.id });
                false
            } else {
                true
            }
        });
        self.session.score += (events.len() - before) as u32;

        if let Some(id) = collision::check(&self.player, &self.obstacles, self.config.proximity_margin) {
            self.on_collision(id, &mut events);
        }

        if self.session.state == GameState::Playing {
            self.difficulty = self.curve.at(self.session.score);
            self.session.speed = self.difficulty.speed;
        }
        events
    }

    /// Inserts an obstacle keeping the sequence sorted. Returns its id.
    pub fn push_obstacle(&mut self, kind: ObstacleKind, x: f32, altitude: f32, size: [f32; 2]) -> ObstacleId {
        let id = ObstacleId(self.next_id);
        self.next_id += 1;
        let at = self.obstacles.partition_point(|o| o.x <= x);
        self.obstacles.insert(
            at,
            Obstacle {
                id,
                kind,
                x,
                altitude,
                size,
            },
        );
        id
    }

    fn spawn(&mut self, request: SpawnRequest) -> ObstacleId {
        let x = request.x.unwrap_or(self.config.play_width);
        self.push_obstacle(request.kind, x, request.altitude, request.size)
    }

    fn start_session(&mut self) {
        self.difficulty = self.curve.at(0);
        self.session.restart(self.difficulty.speed, self.config.lives);
        self.obstacles.clear();
        self.player.reset();
        self.spawner.reset();
    }

    fn on_collision(&mut self, id: ObstacleId, events: &mut Vec<RunnerEvent>) {
        self.session.lives = self.session.lives.saturating_sub(1);
        if self.session.lives > 0 {
            debug!("hit {:?}, {} lives left", id, self.session.lives);
            self.obstacles.clear();
            events.push(RunnerEvent::LifeLost {
                remaining: self.session.lives,
            });
            return;
        }

        let score = self.session.score;
        let new_high_score = score > self.high_score;
        if new_high_score {
            self.high_score = score;
        }
        self.session.state = GameState::GameOver;
        info!(
            "game over: score {}, high score {}{}",
            score,
            self.high_score,
            if new_high_score { " (new)" } else { "" }
        );
        events.push(RunnerEvent::GameOver { score, new_high_score });
    }
}
