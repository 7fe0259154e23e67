use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Anchor, SmoothConfig};
use crate::pose::{KeypointIndex, PoseSnapshot};

use super::one_euro::{LowPassFilter, OneEuroFilter};

const FALLBACK_DT: f32 = 1.0 / 30.0;

/// Filtered vertical state of the player's upper body.
///
/// All values are normalized image coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPose {
    /// Height of the anchor landmark (shoulder midpoint or nose)
    pub anchor_y: f32,
    /// Shoulder-to-hip distance; `None` until the hips have been seen
    pub body_height: Option<f32>,
    /// Timestamp of the last snapshot folded in
    pub timestamp: Duration,
}

/// Result of one smoother update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothOutput {
    /// Nothing usable has been seen yet.
    NotAcquired,
    /// Fresh data this frame.
    Tracking(SmoothedPose),
    /// Frame missing, previous pose held (within the grace period).
    Holding { pose: SmoothedPose, missed: u32 },
    /// Grace period exhausted.
    Lost,
}

impl SmoothOutput {
    pub fn pose(&self) -> Option<&SmoothedPose> {
        match self {
            SmoothOutput::Tracking(pose) | SmoothOutput::Holding { pose, .. } => Some(pose),
            SmoothOutput::NotAcquired | SmoothOutput::Lost => None,
        }
    }

    /// Pose produced from a snapshot received this frame.
    pub fn fresh(&self) -> Option<&SmoothedPose> {
        match self {
            SmoothOutput::Tracking(pose) => Some(pose),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.pose().is_some()
    }
}

enum ChannelFilter {
    Ema { alpha: f32, filter: LowPassFilter },
    OneEuro(OneEuroFilter),
}

impl ChannelFilter {
    fn apply(&mut self, value: f32, dt: f32) -> f32 {
        match self {
            ChannelFilter::Ema { alpha, filter } => filter.filter(value, *alpha),
            ChannelFilter::OneEuro(filter) => filter.filter(value, dt),
        }
    }

    fn reset(&mut self) {
        match self {
            ChannelFilter::Ema { filter, .. } => filter.reset(),
            ChannelFilter::OneEuro(filter) => filter.reset(),
        }
    }
}

/// Per-frame landmark filter with a missing-frame grace period.
///
/// A snapshot whose anchor landmarks are below the confidence threshold
/// counts as a missing frame.
pub struct LandmarkSmoother {
    anchor: Anchor,
    confidence_threshold: f32,
    grace_frames: u32,
    anchor_filter: ChannelFilter,
    height_filter: ChannelFilter,
    current: Option<SmoothedPose>,
    missed: u32,
    lost: bool,
}

impl LandmarkSmoother {
    pub fn from_config(config: &SmoothConfig, anchor: Anchor) -> Self {
        let make = || match config.mode {
            crate::config::SmoothMode::Ema => ChannelFilter::Ema {
                alpha: config.alpha,
                filter: LowPassFilter::new(),
            },
            crate::config::SmoothMode::OneEuro => ChannelFilter::OneEuro(OneEuroFilter::new(
                config.min_cutoff,
                config.beta,
                config.d_cutoff,
            )),
        };
        Self {
            anchor,
            confidence_threshold: config.confidence_threshold,
            grace_frames: config.grace_frames,
            anchor_filter: make(),
            height_filter: make(),
            current: None,
            missed: 0,
            lost: false,
        }
    }

    pub fn update(&mut self, raw: Option<&PoseSnapshot>) -> SmoothOutput {
        let measured = raw.and_then(|snapshot| self.measure(snapshot));

        let Some((snapshot_ts, anchor_y, body_height)) = measured else {
            return self.miss();
        };

        if self.lost {
            info!("pose recovered after {} missing frames", self.missed);
            self.reset_filters();
        }

        let dt = match self.current {
            Some(prev) if !self.lost && snapshot_ts > prev.timestamp => {
                (snapshot_ts - prev.timestamp).as_secs_f32()
            }
            _ => FALLBACK_DT,
        };

        let anchor_y = self.anchor_filter.apply(anchor_y, dt);
        let body_height = match body_height {
            Some(h) => Some(self.height_filter.apply(h, dt)),
            None if self.lost => None,
            None => self.current.and_then(|p| p.body_height),
        };

        let pose = SmoothedPose {
            anchor_y,
            body_height,
            timestamp: snapshot_ts,
        };
        self.current = Some(pose);
        self.missed = 0;
        self.lost = false;
        SmoothOutput::Tracking(pose)
    }

    /// Forgets the current pose, e.g. after the camera was reopened.
    pub fn reset(&mut self) {
        self.reset_filters();
        self.current = None;
        self.missed = 0;
        self.lost = false;
    }

    fn miss(&mut self) -> SmoothOutput {
        let Some(pose) = self.current else {
            return SmoothOutput::NotAcquired;
        };
        self.missed = self.missed.saturating_add(1);
        if self.missed <= self.grace_frames {
            return SmoothOutput::Holding { pose, missed: self.missed };
        }
        if !self.lost {
            warn!("pose lost: {} consecutive frames without a pose", self.missed);
            self.lost = true;
        }
        SmoothOutput::Lost
    }

    fn reset_filters(&mut self) {
        self.anchor_filter.reset();
        self.height_filter.reset();
    }

    fn measure(&self, snapshot: &PoseSnapshot) -> Option<(Duration, f32, Option<f32>)> {
        let t = self.confidence_threshold;
        let shoulders = snapshot.mid_y(KeypointIndex::LeftShoulder, KeypointIndex::RightShoulder, t);
        let anchor_y = match self.anchor {
            Anchor::Shoulders => shoulders?,
            Anchor::Nose => {
                let nose = snapshot.get(KeypointIndex::Nose);
                if !nose.is_valid(t) {
                    return None;
                }
                nose.y
            }
        };
        let hips = snapshot.mid_y(KeypointIndex::LeftHip, KeypointIndex::RightHip, t);
        let body_height = match (shoulders, hips) {
            (Some(s), Some(h)) if h > s => Some(h - s),
            _ => None,
        };
        Some((snapshot.timestamp, anchor_y, body_height))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SmoothMode;
    use crate::pose::Keypoint;

    /// Standing pose: shoulders at `shoulder_y`, hips `torso` below.
    pub(crate) fn upper_body(shoulder_y: f32, torso: f32, ms: u64) -> PoseSnapshot {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[KeypointIndex::Nose as usize] = Keypoint::new(0.5, shoulder_y - 0.1, 0.9);
        keypoints[KeypointIndex::LeftShoulder as usize] = Keypoint::new(0.4, shoulder_y, 0.9);
        keypoints[KeypointIndex::RightShoulder as usize] = Keypoint::new(0.6, shoulder_y, 0.9);
        keypoints[KeypointIndex::LeftHip as usize] = Keypoint::new(0.45, shoulder_y + torso, 0.9);
        keypoints[KeypointIndex::RightHip as usize] = Keypoint::new(0.55, shoulder_y + torso, 0.9);
        PoseSnapshot::new(keypoints, Duration::from_millis(ms))
    }

    fn smoother(alpha: f32, grace_frames: u32) -> LandmarkSmoother {
        let config = SmoothConfig {
            alpha,
            grace_frames,
            ..SmoothConfig::default()
        };
        LandmarkSmoother::from_config(&config, Anchor::Shoulders)
    }

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_first_frame_passthrough() {
        let mut s = smoother(0.5, 5);
        let out = s.update(Some(&upper_body(0.4, 0.3, 0)));
        let pose = out.fresh().unwrap();
        assert!(approx_eq(pose.anchor_y, 0.4));
        assert!(approx_eq(pose.body_height.unwrap(), 0.3));
    }

    #[test]
    fn test_ema_blend() {
        let mut s = smoother(0.5, 5);
        s.update(Some(&upper_body(0.4, 0.3, 0)));
        let out = s.update(Some(&upper_body(0.2, 0.3, 33)));
        assert!(approx_eq(out.fresh().unwrap().anchor_y, 0.3));
    }

    #[test]
    fn test_not_acquired_before_first_pose() {
        let mut s = smoother(0.5, 5);
        assert_eq!(s.update(None), SmoothOutput::NotAcquired);
        assert!(!s.update(None).is_available());
    }

    #[test]
    fn test_missing_frames_hold_within_grace() {
        let mut s = smoother(0.5, 5);
        let first = *s.update(Some(&upper_body(0.4, 0.3, 0))).fresh().unwrap();
        for missed in 1..=3 {
            match s.update(None) {
                SmoothOutput::Holding { pose, missed: m } => {
                    assert_eq!(pose, first);
                    assert_eq!(m, missed);
                }
                other => panic!("expected Holding, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_lost_after_grace_exhausted() {
        let mut s = smoother(0.5, 5);
        s.update(Some(&upper_body(0.4, 0.3, 0)));
        for _ in 0..5 {
            assert!(s.update(None).is_available());
        }
        assert_eq!(s.update(None), SmoothOutput::Lost);
        assert_eq!(s.update(None), SmoothOutput::Lost);
    }

    #[test]
    fn test_low_confidence_counts_as_missing() {
        let mut s = smoother(0.5, 1);
        s.update(Some(&upper_body(0.4, 0.3, 0)));
        let mut weak = upper_body(0.1, 0.3, 33);
        weak.keypoints[KeypointIndex::LeftShoulder as usize].confidence = 0.05;
        assert!(matches!(s.update(Some(&weak)), SmoothOutput::Holding { .. }));
        assert_eq!(s.update(Some(&weak)), SmoothOutput::Lost);
    }

    #[test]
    fn test_recovery_restarts_filter() {
        let mut s = smoother(0.1, 1);
        s.update(Some(&upper_body(0.4, 0.3, 0)));
        s.update(None);
        assert_eq!(s.update(None), SmoothOutput::Lost);
        // No blending with the stale pose after recovery
        let out = s.update(Some(&upper_body(0.7, 0.2, 500)));
        let pose = out.fresh().unwrap();
        assert!(approx_eq(pose.anchor_y, 0.7));
        assert!(approx_eq(pose.body_height.unwrap(), 0.2));
        assert!(s.update(None).is_available());
    }

    #[test]
    fn test_reset_forgets_current_pose() {
        let mut s = smoother(0.1, 5);
        s.update(Some(&upper_body(0.4, 0.3, 0)));
        s.reset();
        assert_eq!(s.update(None), SmoothOutput::NotAcquired);
        let out = s.update(Some(&upper_body(0.7, 0.3, 500)));
        assert!(approx_eq(out.fresh().unwrap().anchor_y, 0.7));
    }

    #[test]
    fn test_body_height_kept_when_hips_hidden() {
        let mut s = smoother(1.0, 5);
        s.update(Some(&upper_body(0.4, 0.3, 0)));
        let mut no_hips = upper_body(0.35, 0.3, 33);
        no_hips.keypoints[KeypointIndex::LeftHip as usize].confidence = 0.0;
        let pose = *s.update(Some(&no_hips)).fresh().unwrap();
        assert!(approx_eq(pose.anchor_y, 0.35));
        assert!(approx_eq(pose.body_height.unwrap(), 0.3));
    }

    #[test]
    fn test_nose_anchor() {
        let config = SmoothConfig {
            alpha: 1.0,
            ..SmoothConfig::default()
        };
        let mut s = LandmarkSmoother::from_config(&config, Anchor::Nose);
        let out = s.update(Some(&upper_body(0.4, 0.3, 0)));
        assert!(approx_eq(out.fresh().unwrap().anchor_y, 0.3));
    }

    #[test]
    fn test_one_euro_mode_smooths() {
        let config = SmoothConfig {
            mode: SmoothMode::OneEuro,
            min_cutoff: 1.0,
            beta: 0.0,
            ..SmoothConfig::default()
        };
        let mut s = LandmarkSmoother::from_config(&config, Anchor::Shoulders);
        s.update(Some(&upper_body(0.4, 0.3, 0)));
        let y = s.update(Some(&upper_body(0.2, 0.3, 33))).fresh().unwrap().anchor_y;
        assert!(y < 0.4 && y > 0.2, "expected filtered value, got {}", y);
    }
}
