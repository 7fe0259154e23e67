//! Headless run of the full control + game pipeline with a scripted player.
//!
//! Usage: runner_sim [--ticks N] [--seed S] [--config PATH] [--mode keyboard|pose] [--dropout P]

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pose_runner::app::GameLoop;
use pose_runner::config::Config;
use pose_runner::control::{Key, KeyEvent};
use pose_runner::game::{GameState, ObstacleKind, RunnerEvent, Snapshot};
use pose_runner::pose::{Keypoint, KeypointIndex, PoseSnapshot};
use pose_runner::store::MemoryStore;

const CONFIG_PATH: &str = "config.toml";
/// Standing shoulder height and torso length of the simulated player
const STAND_Y: f32 = 0.40;
const TORSO: f32 = 0.28;
/// Ticks to wait on the game over screen before restarting
const RESTART_DELAY: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Keyboard,
    Pose,
}

struct Args {
    ticks: u64,
    seed: Option<u64>,
    config: String,
    mode: Mode,
    dropout: f64,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        ticks: 3600,
        seed: None,
        config: CONFIG_PATH.to_string(),
        mode: Mode::Pose,
        dropout: 0.0,
    };
    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        let mut value = || it.next().with_context(|| format!("{} needs a value", flag));
        match flag.as_str() {
            "--ticks" => args.ticks = value()?.parse().context("--ticks")?,
            "--seed" => args.seed = Some(value()?.parse().context("--seed")?),
            "--config" => args.config = value()?,
            "--mode" => {
                args.mode = match value()?.as_str() {
                    "keyboard" => Mode::Keyboard,
                    "pose" => Mode::Pose,
                    other => bail!("unknown mode: {}", other),
                }
            }
            "--dropout" => args.dropout = value()?.parse().context("--dropout")?,
            other => bail!("unknown argument: {}", other),
        }
    }
    if !(0.0..=1.0).contains(&args.dropout) {
        bail!("--dropout must be within 0..1");
    }
    Ok(args)
}

/// What the autopilot wants to do about the next obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Run,
    Jump,
    Duck,
}

fn decide(snapshot: &Snapshot<'_>, config: &Config) -> Intent {
    let player = snapshot.player.hitbox();
    let speed = snapshot.difficulty.speed;
    let Some(next) = snapshot.obstacles.iter().find(|o| o.right() > player.x) else {
        return Intent::Run;
    };
    let gap = next.x - player.right();
    let [_, running_h] = config.game.running_size;
    let [_, ducking_h] = config.game.ducking_size;
    match next.kind {
        ObstacleKind::Pterodactyl if next.altitude >= running_h => Intent::Run,
        ObstacleKind::Pterodactyl if next.altitude >= ducking_h => {
            if gap < speed * 3.0 {
                Intent::Duck
            } else {
                Intent::Run
            }
        }
        _ if gap > 0.0 && gap < speed * 4.0 => Intent::Jump,
        _ => Intent::Run,
    }
}

/// Standing or moved upper body with a little detector noise.
fn synth_pose(shoulder_y: f32, at: Duration, rng: &mut StdRng) -> PoseSnapshot {
    let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
    let mut put = |index: KeypointIndex, x: f32, y: f32| {
        let noise = rng.gen_range(-0.004..0.004);
        keypoints[index as usize] = Keypoint::new(x, y + noise, rng.gen_range(0.6..0.95));
    };
    put(KeypointIndex::Nose, 0.5, shoulder_y - 0.12);
    put(KeypointIndex::LeftShoulder, 0.42, shoulder_y);
    put(KeypointIndex::RightShoulder, 0.58, shoulder_y);
    put(KeypointIndex::LeftHip, 0.45, shoulder_y + TORSO);
    put(KeypointIndex::RightHip, 0.55, shoulder_y + TORSO);
    PoseSnapshot::new(keypoints, at)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;
    info!("runner_sim {}", env!("GIT_VERSION"));

    let mut config = Config::load_or_default(&args.config);
    if let Some(seed) = args.seed {
        config.game.seed = seed;
    }
    config.validate().context("Invalid config")?;
    info!("mode {:?}, {} ticks, seed {}, dropout {}", args.mode, args.ticks, config.game.seed, args.dropout);

    let mut rng = StdRng::seed_from_u64(config.game.seed.wrapping_add(1));
    let mut game = GameLoop::new(&config, MemoryStore::default());
    let frame = Duration::from_secs_f64(1.0 / config.app.target_fps.max(1) as f64);
    let jump_rise = (config.gesture.jump_threshold + 0.2) * TORSO;
    let duck_drop = (config.gesture.duck_threshold + 0.2) * TORSO;

    let mut keys = vec![KeyEvent::down(Key::Confirm, Duration::ZERO)];
    let mut jump_frames = 0u32;
    let mut duck_key_down = false;
    let mut game_over_at = None;
    let (mut sessions, mut jumps, mut best) = (0u32, 0u32, 0u32);

    for tick in 0..args.ticks {
        let now = frame * tick as u32;

        let intent = {
            let snapshot = game.snapshot();
            if snapshot.session.state == GameState::Playing {
                decide(&snapshot, &config)
            } else {
                Intent::Run
            }
        };

        let raw = match args.mode {
            Mode::Keyboard => {
                match intent {
                    Intent::Jump => keys.push(KeyEvent::down(Key::Jump, now)),
                    Intent::Duck if !duck_key_down => {
                        keys.push(KeyEvent::down(Key::Duck, now));
                        duck_key_down = true;
                    }
                    Intent::Run | Intent::Jump | Intent::Duck => {}
                }
                if intent != Intent::Duck && duck_key_down {
                    keys.push(KeyEvent::up(Key::Duck, now));
                    duck_key_down = false;
                }
                if intent == Intent::Jump {
                    keys.push(KeyEvent::up(Key::Jump, now));
                }
                None
            }
            Mode::Pose => {
                if intent == Intent::Jump && jump_frames == 0 {
                    jump_frames = 12;
                }
                let shoulder_y = if jump_frames > 0 {
                    jump_frames -= 1;
                    STAND_Y - jump_rise
                } else if intent == Intent::Duck {
                    STAND_Y + duck_drop
                } else {
                    STAND_Y
                };
                if rng.gen_bool(args.dropout) {
                    None
                } else {
                    Some(synth_pose(shoulder_y, now, &mut rng))
                }
            }
        };

        let report = game.frame(&keys, raw.as_ref(), now)?;
        keys.clear();

        for event in &report.events {
            match event {
                RunnerEvent::SessionStarted => sessions += 1,
                RunnerEvent::Jumped => jumps += 1,
                RunnerEvent::GameOver { score, new_high_score } => {
                    info!("tick {}: game over, score {}{}", tick, score, if *new_high_score { " (new high)" } else { "" });
                    best = best.max(*score);
                    game_over_at = Some(tick);
                }
                other => debug!("tick {}: {:?}", tick, other),
            }
        }

        if let Some(at) = game_over_at {
            if tick >= at + RESTART_DELAY {
                keys.push(KeyEvent::down(Key::Restart, now));
                game_over_at = None;
            }
        }
    }

    let snapshot = game.snapshot();
    info!(
        "done: {} sessions, {} jumps, best score {}, final state {:?} at score {}",
        sessions, jumps, best, snapshot.session.state, snapshot.session.score
    );
    Ok(())
}
