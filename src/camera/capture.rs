use anyhow::{Context, Result};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureAPIs, VideoCaptureTrait},
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use crate::config::CameraConfig;
use crate::pose::{LatestPose, PoseProvider};

/// Consecutive read failures before the camera is reopened
const REOPEN_AFTER_FAILURES: u32 = 10;
/// Consecutive read failures before the worker gives up
const MAX_READ_FAILURES: u32 = 20;

/// OpenCV video capture device.
pub struct OpenCvCamera {
    capture: VideoCapture,
    index: i32,
    width: u32,
    height: u32,
}

impl OpenCvCamera {
    /// Opens camera `index`, requesting the given resolution and rate.
    pub fn open(index: i32, width: u32, height: u32, fps: u32) -> Result<Self> {
        let mut capture =
            VideoCapture::new(index, VideoCaptureAPIs::CAP_ANY as i32).context("Failed to open camera")?;

        if !capture.is_opened()? {
            anyhow::bail!("Camera {} is not available", index);
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        capture.set(videoio::CAP_PROP_FPS, fps as f64)?;
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let actual_fps = capture.get(videoio::CAP_PROP_FPS)?;
        info!("camera {}: {}x{} @ {} fps", index, actual_width, actual_height, actual_fps);

        Ok(Self {
            capture,
            index,
            width: actual_width,
            height: actual_height,
        })
    }

    /// Tries `probe_count` indices from `index` and returns the first that opens.
    pub fn open_first(config: &CameraConfig, fps: u32) -> Result<Self> {
        let mut last_err = None;
        for index in config.index..config.index + config.probe_count.max(1) {
            match Self::open(index, config.width, config.height, fps) {
                Ok(camera) => return Ok(camera),
                Err(e) => {
                    debug!("camera {} unavailable: {:#}", index, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no camera index to probe")))
            .with_context(|| format!("No camera found at indices {}..{}", config.index, config.index + config.probe_count))
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    /// Actual capture resolution.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Closes the device so it can be opened again.
    pub fn release(&mut self) -> Result<()> {
        self.capture.release().context("Failed to release camera")
    }

    /// Reads one BGR frame.
    pub fn read_frame(&mut self) -> Result<Mat> {
        let mut frame = Mat::default();
        self.capture
            .read(&mut frame)
            .context("Failed to read frame")?;

        if frame.empty() {
            anyhow::bail!("Empty frame received");
        }

        Ok(frame)
    }
}

/// Runs capture and inference on its own thread and writes the newest pose
/// into `LatestPose`.
///
/// After `REOPEN_AFTER_FAILURES` consecutive bad reads the camera is opened
/// again from `config`; the worker stops at `MAX_READ_FAILURES`.
pub struct PoseWorker {
    stop: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    reopened: Arc<AtomicU32>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PoseWorker {
    pub fn start<P>(
        mut camera: OpenCvCamera,
        config: CameraConfig,
        fps: u32,
        mut provider: P,
        latest: Arc<LatestPose>,
    ) -> Result<Self>
    where
        P: PoseProvider<Frame = Mat> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));
        let reopened = Arc::new(AtomicU32::new(0));
        let stop_ref = stop.clone();
        let alive_ref = alive.clone();
        let reopened_ref = reopened.clone();

        let handle = thread::Builder::new()
            .name("pose-worker".into())
            .spawn(move || {
                let mut failures = 0;
                while !stop_ref.load(Ordering::Relaxed) {
                    let frame = match camera.read_frame() {
                        Ok(frame) => {
                            failures = 0;
                            frame
                        }
                        Err(e) => {
                            failures += 1;
                            if failures >= MAX_READ_FAILURES {
                                warn!("camera {} stopped delivering frames: {:#}", camera.index(), e);
                                break;
                            }
                            if failures == REOPEN_AFTER_FAILURES {
                                warn!("camera {} failing, reopening: {:#}", camera.index(), e);
                                if let Err(e) = camera.release() {
                                    debug!("{:#}", e);
                                }
                                match OpenCvCamera::open_first(&config, fps) {
                                    Ok(fresh) => {
                                        let (w, h) = fresh.resolution();
                                        info!("camera {} reopened at {}x{}", fresh.index(), w, h);
                                        camera = fresh;
                                        failures = 0;
                                        reopened_ref.fetch_add(1, Ordering::Release);
                                    }
                                    Err(e) => warn!("reopen failed: {:#}", e),
                                }
                            }
                            continue;
                        }
                    };
                    if let Some(snapshot) = provider.detect(&frame) {
                        latest.publish(snapshot);
                    }
                }
                alive_ref.store(false, Ordering::Release);
            })
            .context("Failed to spawn pose worker")?;

        Ok(Self {
            stop,
            alive,
            reopened,
            handle: Some(handle),
        })
    }

    /// false once the camera failed for good
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// How many times the camera has been reopened
    pub fn reopen_count(&self) -> u32 {
        self.reopened.load(Ordering::Acquire)
    }
}

impl Drop for PoseWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
