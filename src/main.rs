use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pose_runner::app::GameLoop;
use pose_runner::camera::{OpenCvCamera, PoseWorker};
use pose_runner::config::Config;
use pose_runner::pose::{LatestPose, MoveNetProvider, PoseDetector, PoseSnapshot};
use pose_runner::render::{MinifbRenderer, Overlay};
use pose_runner::store::JsonFileStore;

const CONFIG_PATH: &str = "config.toml";
const WINDOW_HEIGHT: usize = 300;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("pose-runner {}", env!("GIT_VERSION"));
    let config = Config::load_or_default(CONFIG_PATH);
    config.validate().context("Invalid config")?;
    info!(
        "target fps {}, difficulty {:?}, lives {}, debug view {}",
        config.app.target_fps, config.game.difficulty, config.game.lives, config.debug.view
    );
    info!("keys: [Enter] start  [Space/Up] jump  [Down] duck  [P] pause  [Esc] back  [R] restart");

    let clock = Instant::now();
    let latest = Arc::new(LatestPose::new());
    let mut worker = match start_pose_worker(&config, clock, latest.clone()) {
        Ok(worker) => Some(worker),
        Err(e) => {
            warn!("camera control unavailable, keyboard only: {:#}", e);
            None
        }
    };

    let store = JsonFileStore::new(&config.app.high_score_path);
    let mut game = GameLoop::new(&config, store);
    let mut renderer = MinifbRenderer::new(
        "Pose Runner",
        config.game.play_width as usize,
        WINDOW_HEIGHT,
        config.debug.view,
    )?;

    let frame_duration = Duration::from_secs_f64(1.0 / config.app.target_fps.max(1) as f64);
    let mut seen = 0u64;
    let mut last_pose: Option<PoseSnapshot> = None;
    let mut camera_reopens = 0u32;

    while renderer.is_open() {
        let loop_start = Instant::now();
        let now = clock.elapsed();

        if worker.as_ref().is_some_and(|w| !w.is_alive()) {
            warn!("pose worker stopped, keyboard only");
            worker = None;
        }
        if let Some(reopens) = worker.as_ref().map(PoseWorker::reopen_count) {
            if reopens != camera_reopens {
                camera_reopens = reopens;
                last_pose = None;
                game.camera_restarted();
            }
        }

        let keys = renderer.poll_keys(now);
        let raw = latest.take_newer(&mut seen);
        let report = game.frame(&keys, raw.as_ref(), now)?;
        if raw.is_some() {
            last_pose = raw;
        }

        let overlay = Overlay {
            pose: last_pose.as_ref().filter(|_| report.step.smoothed.is_available()),
            trigger_lines: game.trigger_lines(),
            calibrating: report.step.calibrating,
            fault: report.step.fault,
            confidence_threshold: config.smooth.confidence_threshold,
        };
        renderer.draw(&game.snapshot(), &overlay);
        renderer.update()?;

        if let Some(rest) = frame_duration.checked_sub(loop_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    info!("shutting down");
    Ok(())
}

fn start_pose_worker(config: &Config, clock: Instant, latest: Arc<LatestPose>) -> Result<PoseWorker> {
    let camera = OpenCvCamera::open_first(&config.camera, config.app.target_fps)?;
    let detector = PoseDetector::new(&config.camera.model_path)?;
    info!("model loaded: {}", config.camera.model_path);
    let provider = MoveNetProvider::new(
        detector,
        clock,
        config.camera.mirror,
        config.camera.min_pose_confidence,
    );
    PoseWorker::start(camera, config.camera.clone(), config.app.target_fps, provider, latest)
}
