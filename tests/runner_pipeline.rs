use std::time::Duration;

use pose_runner::app::GameLoop;
use pose_runner::config::{Config, GameConfig};
use pose_runner::control::{InputFault, Key, KeyEvent, ResolvedInput};
use pose_runner::game::{
    Command, GameState, ObstacleKind, Posture, Runner, RunnerEvent, ScriptedSpawner, SpawnRequest,
};
use pose_runner::pose::{Keypoint, KeypointIndex, PoseSnapshot};
use pose_runner::store::MemoryStore;

const FRAME_MS: u64 = 16;

fn at(frame: u64) -> Duration {
    Duration::from_millis(frame * FRAME_MS)
}

/// Upper body with shoulders at `shoulder_y` and a 0.3 torso.
fn standing(shoulder_y: f32, frame: u64) -> PoseSnapshot {
    let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
    keypoints[KeypointIndex::Nose as usize] = Keypoint::new(0.5, shoulder_y - 0.1, 0.9);
    keypoints[KeypointIndex::LeftShoulder as usize] = Keypoint::new(0.4, shoulder_y, 0.9);
    keypoints[KeypointIndex::RightShoulder as usize] = Keypoint::new(0.6, shoulder_y, 0.9);
    keypoints[KeypointIndex::LeftHip as usize] = Keypoint::new(0.45, shoulder_y + 0.3, 0.9);
    keypoints[KeypointIndex::RightHip as usize] = Keypoint::new(0.55, shoulder_y + 0.3, 0.9);
    PoseSnapshot::new(keypoints, at(frame))
}

fn quiet_loop(config: &Config) -> GameLoop<MemoryStore> {
    let runner = Runner::with_spawner(&config.game, 0, Box::new(ScriptedSpawner::new(Vec::new())));
    GameLoop::with_runner(config, runner, MemoryStore::default())
}

fn camera_config() -> Config {
    let mut config = Config::default();
    config.smooth.alpha = 1.0;
    config.smooth.grace_frames = 5;
    config.gesture.calibration_frames = 5;
    config.gesture.calibration_timeout_frames = 60;
    config
}

#[test]
fn scripted_obstacle_ahead_ends_the_game() {
    let config = GameConfig::default();
    let ahead = SpawnRequest {
        kind: ObstacleKind::Cactus,
        size: [30.0, 50.0],
        altitude: 0.0,
        x: Some(config.player_x + 100.0),
    };
    let spawner = ScriptedSpawner::new(vec![(3, ahead)]);
    let mut runner = Runner::with_spawner(&config, 0, Box::new(spawner));
    runner.handle(Command::Start).unwrap();

    let mut game_over_tick = None;
    for _ in 0..20 {
        let events = runner.tick(&ResolvedInput::default());
        if events.iter().any(|e| matches!(e, RunnerEvent::GameOver { .. })) {
            game_over_tick = Some(runner.session().tick);
            break;
        }
    }
    // Spawned at 160, scrolled 10 px per tick, overlaps the player's 120 edge on tick 7
    assert_eq!(game_over_tick, Some(7));
    assert_eq!(runner.state(), GameState::GameOver);

    // Further ticks are no-ops
    assert!(runner.tick(&ResolvedInput::jump()).is_empty());
}

#[test]
fn grace_period_then_keyboard_fallback() {
    let config = camera_config();
    let mut game = quiet_loop(&config);

    let mut frame = 0;
    game.frame(&[KeyEvent::down(Key::Confirm, at(0))], Some(&standing(0.4, 0)), at(0))
        .unwrap();
    while frame < 5 {
        frame += 1;
        game.frame(&[], Some(&standing(0.4, frame)), at(frame)).unwrap();
    }

    frame += 1;
    let report = game.frame(&[], Some(&standing(0.6, frame)), at(frame)).unwrap();
    assert!(report.step.input.duck);
    assert!(report.step.fault.is_none());
    assert_eq!(game.runner().player().posture, Posture::Ducking);

    // Three missing frames: held pose, camera still trusted
    for _ in 0..3 {
        frame += 1;
        let report = game.frame(&[], None, at(frame)).unwrap();
        assert!(report.step.fault.is_none());
        assert_eq!(game.runner().player().posture, Posture::Ducking);
    }
    for _ in 0..2 {
        frame += 1;
        game.frame(&[], None, at(frame)).unwrap();
    }
    assert_eq!(game.runner().player().posture, Posture::Ducking);

    // Sixth consecutive miss: lost, keyboard takes over
    frame += 1;
    let report = game.frame(&[], None, at(frame)).unwrap();
    assert_eq!(report.step.fault, Some(InputFault::PoseUnavailable));
    assert_eq!(game.runner().player().posture, Posture::Running);

    frame += 1;
    let report = game
        .frame(&[KeyEvent::down(Key::Jump, at(frame))], None, at(frame))
        .unwrap();
    assert!(report.events.contains(&RunnerEvent::Jumped));
}

#[test]
fn duck_held_through_landing_lands_ducking() {
    let config = Config::default();
    let mut game = quiet_loop(&config);
    game.frame(&[KeyEvent::down(Key::Confirm, at(0))], None, at(0)).unwrap();

    let report = game
        .frame(&[KeyEvent::down(Key::Jump, at(1)), KeyEvent::up(Key::Jump, at(1))], None, at(1))
        .unwrap();
    assert!(report.events.contains(&RunnerEvent::Jumped));
    game.frame(&[KeyEvent::down(Key::Duck, at(2))], None, at(2)).unwrap();
    assert_eq!(game.runner().player().posture, Posture::Jumping);

    let mut landed = false;
    for frame in 3..100 {
        let report = game.frame(&[], None, at(frame)).unwrap();
        if report.events.contains(&RunnerEvent::Landed) {
            landed = true;
            break;
        }
        assert_eq!(game.runner().player().posture, Posture::Jumping);
    }
    assert!(landed);
    assert_eq!(game.runner().player().posture, Posture::Ducking);
}

#[test]
fn jump_pressed_while_ducking_takes_off() {
    let config = Config::default();
    let mut game = quiet_loop(&config);
    game.frame(&[KeyEvent::down(Key::Confirm, at(0))], None, at(0)).unwrap();
    game.frame(&[KeyEvent::down(Key::Duck, at(1))], None, at(1)).unwrap();
    assert_eq!(game.runner().player().posture, Posture::Ducking);

    let report = game.frame(&[KeyEvent::down(Key::Jump, at(2))], None, at(2)).unwrap();
    assert!(report.events.contains(&RunnerEvent::Jumped));
    assert_eq!(game.runner().player().posture, Posture::Jumping);

    // Holding Duck in the air does not cancel the jump
    for frame in 3..10 {
        game.frame(&[], None, at(frame)).unwrap();
        assert_eq!(game.runner().player().posture, Posture::Jumping);
    }
}

#[test]
fn camera_crouch_then_rise_jumps() {
    let config = camera_config();
    let mut game = quiet_loop(&config);
    game.frame(&[KeyEvent::down(Key::Confirm, at(0))], Some(&standing(0.4, 0)), at(0))
        .unwrap();
    for frame in 1..5 {
        game.frame(&[], Some(&standing(0.4, frame)), at(frame)).unwrap();
    }
    assert!(game.trigger_lines().is_some());

    let mut frame = 5;
    for _ in 0..3 {
        game.frame(&[], Some(&standing(0.6, frame)), at(frame)).unwrap();
        frame += 1;
    }
    assert_eq!(game.runner().player().posture, Posture::Ducking);

    let mut jumped = false;
    for _ in 0..20 {
        let report = game.frame(&[], Some(&standing(0.2, frame)), at(frame)).unwrap();
        frame += 1;
        if report.events.contains(&RunnerEvent::Jumped) {
            jumped = true;
            break;
        }
    }
    assert!(jumped);
    assert_eq!(game.runner().player().posture, Posture::Jumping);
}

#[test]
fn ducking_passes_under_mid_pterodactyl() {
    let config = GameConfig::default();
    let mut runner = Runner::with_spawner(&config, 0, Box::new(ScriptedSpawner::new(Vec::new())));
    runner.handle(Command::Start).unwrap();
    runner.push_obstacle(ObstacleKind::Pterodactyl, 300.0, 44.0, config.pterodactyl_size);

    let mut cleared = false;
    for _ in 0..60 {
        let events = runner.tick(&ResolvedInput::duck());
        assert_eq!(runner.state(), GameState::Playing);
        cleared |= events.iter().any(|e| matches!(e, RunnerEvent::ObstacleCleared { .. }));
    }
    assert!(cleared);
    assert_eq!(runner.session().score, 1);

    // Same bird, standing: hit
    let mut runner = Runner::with_spawner(&config, 0, Box::new(ScriptedSpawner::new(Vec::new())));
    runner.handle(Command::Start).unwrap();
    runner.push_obstacle(ObstacleKind::Pterodactyl, 300.0, 44.0, config.pterodactyl_size);
    for _ in 0..60 {
        runner.tick(&ResolvedInput::default());
    }
    assert_eq!(runner.state(), GameState::GameOver);
}

/// Jumps ground obstacles, ducks mid-height ones.
fn autopilot(runner: &Runner) -> ResolvedInput {
    let snapshot = runner.snapshot();
    let player = snapshot.player.hitbox();
    let speed = snapshot.difficulty.speed;
    let Some(next) = snapshot.obstacles.iter().find(|o| o.right() > player.x) else {
        return ResolvedInput::default();
    };
    let gap = next.x - player.right();
    match next.kind {
        ObstacleKind::Pterodactyl if next.altitude >= 64.0 => ResolvedInput::default(),
        ObstacleKind::Pterodactyl if next.altitude >= 36.0 && gap < speed * 3.0 => ResolvedInput::duck(),
        ObstacleKind::Pterodactyl if next.altitude >= 36.0 => ResolvedInput::default(),
        _ if gap <= speed * 7.0 => ResolvedInput::jump(),
        _ => ResolvedInput::default(),
    }
}

#[test]
fn score_and_difficulty_are_monotone_within_a_session() {
    let config = GameConfig {
        seed: 1234,
        lives: 10_000,
        ..GameConfig::default()
    };
    let mut runner = Runner::new(&config, 0);
    runner.handle(Command::Start).unwrap();

    let mut prev_score = 0;
    let mut prev = runner.snapshot().difficulty;
    for _ in 0..6000u32 {
        let input = autopilot(&runner);
        let events = runner.tick(&input);
        let cleared = events
            .iter()
            .filter(|e| matches!(e, RunnerEvent::ObstacleCleared { .. }))
            .count() as u32;

        let snapshot = runner.snapshot();
        assert_eq!(snapshot.session.score, prev_score + cleared);
        assert!(snapshot.difficulty.speed >= prev.speed);
        assert!(snapshot.difficulty.gap_scale <= prev.gap_scale);
        assert!(snapshot.obstacles.windows(2).all(|w| w[0].x <= w[1].x));
        prev_score = snapshot.session.score;
        prev = snapshot.difficulty;
    }
    assert!(prev_score > 0);

    // Pausing freezes everything
    runner.handle(Command::Pause).unwrap();
    let tick = runner.session().tick;
    runner.tick(&ResolvedInput::jump());
    assert_eq!(runner.session().tick, tick);
    assert_eq!(runner.session().score, prev_score);
}

#[test]
fn no_camera_means_keyboard_only_session() {
    let config = camera_config();
    let mut game = quiet_loop(&config);
    game.frame(&[KeyEvent::down(Key::Confirm, at(0))], None, at(0)).unwrap();

    let mut fault = None;
    for frame in 1..=60 {
        fault = game.frame(&[], None, at(frame)).unwrap().step.fault;
    }
    assert_eq!(fault, Some(InputFault::CalibrationFailed));

    // A pose showing up later is ignored for the rest of the session
    let report = game.frame(&[], Some(&standing(0.1, 61)), at(61)).unwrap();
    assert!(!report.step.input.jump);

    let report = game
        .frame(&[KeyEvent::down(Key::Jump, at(62))], Some(&standing(0.4, 62)), at(62))
        .unwrap();
    assert!(report.events.contains(&RunnerEvent::Jumped));
}
