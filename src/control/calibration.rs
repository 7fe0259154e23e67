use tracing::{info, warn};

use crate::config::GestureConfig;
use crate::tracker::SmoothedPose;

/// Body height used when the hips were never visible (full frame).
const FRAME_HEIGHT: f32 = 1.0;

/// Neutral standing position for the current session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub anchor_y: f32,
    pub body_height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStatus {
    /// No session running.
    Idle,
    Collecting { collected: u32, needed: u32 },
    Ready(Baseline),
    Failed,
}

/// Averages the first stable window of smoothed poses after session start.
///
/// The window restarts whenever the anchor spread exceeds the allowed
/// fraction of body height; running out of frames fails calibration.
pub struct Calibrator {
    frames_needed: u32,
    timeout_frames: u32,
    max_spread: f32,
    samples: Vec<(f32, Option<f32>)>,
    elapsed: u32,
    status: CalibrationStatus,
}

impl Calibrator {
    pub fn from_config(config: &GestureConfig) -> Self {
        Self {
            frames_needed: config.calibration_frames.max(1),
            timeout_frames: config.calibration_timeout_frames,
            max_spread: config.max_calibration_spread,
            samples: Vec::with_capacity(config.calibration_frames as usize),
            elapsed: 0,
            status: CalibrationStatus::Idle,
        }
    }

    pub fn begin(&mut self) {
        self.samples.clear();
        self.elapsed = 0;
        self.status = CalibrationStatus::Collecting {
            collected: 0,
            needed: self.frames_needed,
        };
    }

    pub fn status(&self) -> CalibrationStatus {
        self.status
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        match &self.status {
            CalibrationStatus::Ready(baseline) => Some(baseline),
            _ => None,
        }
    }

    /// Feed one frame. `pose` is `None` when no fresh pose arrived.
    pub fn observe(&mut self, pose: Option<&SmoothedPose>) -> CalibrationStatus {
        if !matches!(self.status, CalibrationStatus::Collecting { .. }) {
            return self.status;
        }
        self.elapsed += 1;

        if let Some(pose) = pose {
            self.samples.push((pose.anchor_y, pose.body_height));
            if self.spread() > self.max_spread * self.reference_height() {
                // Unstable: restart the window from this sample
                self.samples.clear();
                self.samples.push((pose.anchor_y, pose.body_height));
            }
        }

        let collected = self.samples.len() as u32;
        self.status = if collected >= self.frames_needed {
            let baseline = self.average();
            info!(
                "calibrated: anchor_y={:.3}, body_height={:.3} after {} frames",
                baseline.anchor_y, baseline.body_height, self.elapsed
            );
            CalibrationStatus::Ready(baseline)
        } else if self.elapsed >= self.timeout_frames {
            warn!(
                "calibration failed: {} of {} stable frames within {} frames",
                collected, self.frames_needed, self.timeout_frames
            );
            CalibrationStatus::Failed
        } else {
            CalibrationStatus::Collecting {
                collected,
                needed: self.frames_needed,
            }
        };
        self.status
    }

    fn spread(&self) -> f32 {
        let (min, max) = self
            .samples
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &(y, _)| (lo.min(y), hi.max(y)));
        max - min
    }

    fn reference_height(&self) -> f32 {
        let heights: Vec<f32> = self.samples.iter().filter_map(|&(_, h)| h).collect();
        if heights.is_empty() {
            FRAME_HEIGHT
        } else {
            heights.iter().sum::<f32>() / heights.len() as f32
        }
    }

    fn average(&self) -> Baseline {
        let n = self.samples.len().max(1) as f32;
        let anchor_y = self.samples.iter().map(|&(y, _)| y).sum::<f32>() / n;
        Baseline {
            anchor_y,
            body_height: self.reference_height(),
        }
    }
}
