use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::InputFault;
use crate::pose::PoseSnapshot;
use crate::tracker::{LandmarkSmoother, SmoothOutput};

use super::arbiter::{InputArbiter, ResolvedInput};
use super::calibration::{CalibrationStatus, Calibrator};
use super::gesture::{ControlSignal, GestureClassifier, Source};
use super::keyboard::{Key, KeyEvent, KeyboardState};

/// Outcome of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineStep {
    pub input: ResolvedInput,
    pub fault: Option<InputFault>,
    pub calibrating: bool,
    pub smoothed: SmoothOutput,
    pub camera: ControlSignal,
}

/// Pose → smoother → calibrator/classifier → arbiter, plus the keyboard.
pub struct ControlPipeline {
    smoother: LandmarkSmoother,
    calibrator: Calibrator,
    classifier: GestureClassifier,
    arbiter: InputArbiter,
    keyboard: KeyboardState,
    /// Cleared when calibration fails; restored on the next session
    camera_enabled: bool,
    last_fault: Option<InputFault>,
}

impl ControlPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            smoother: LandmarkSmoother::from_config(&config.smooth, config.gesture.anchor),
            calibrator: Calibrator::from_config(&config.gesture),
            classifier: GestureClassifier::from_config(&config.gesture),
            arbiter: InputArbiter::new(),
            keyboard: KeyboardState::new(),
            camera_enabled: true,
            last_fault: None,
        }
    }

    /// Starts a new calibration window; called when a session enters Playing.
    pub fn begin_session(&mut self) {
        self.calibrator.begin();
        self.classifier.reset();
        self.arbiter.reset();
        self.keyboard.discard_pending();
        self.camera_enabled = true;
        info!("calibrating: hold still");
    }

    /// The camera was reopened: frames from before are no longer related.
    /// The baseline is kept.
    pub fn camera_restarted(&mut self) {
        self.smoother.reset();
        self.classifier.reset();
        info!("camera restarted, smoothing reset");
    }

    pub fn push_key(&mut self, event: KeyEvent) {
        self.keyboard.push(event);
    }

    pub fn take_menu_keys(&mut self) -> Vec<Key> {
        self.keyboard.take_menu_keys()
    }

    pub fn calibration(&self) -> CalibrationStatus {
        self.calibrator.status()
    }

    /// Jump and duck trigger heights in image y, once calibrated.
    pub fn trigger_lines(&self) -> Option<(f32, f32)> {
        let baseline = self.calibrator.baseline()?;
        let t = self.classifier.thresholds();
        let h = baseline.body_height;
        Some((baseline.anchor_y - t.jump * h, baseline.anchor_y + t.duck * h))
    }

    /// One tick. `raw` is `None` when the pose worker produced nothing new;
    /// `now` is on the same clock as snapshot timestamps.
    pub fn step(&mut self, raw: Option<&PoseSnapshot>, now: Duration) -> PipelineStep {
        let smoothed = self.smoother.update(raw);
        let keyboard = self.keyboard.signal();

        if self.camera_enabled
            && self.calibrator.observe(smoothed.fresh()) == CalibrationStatus::Failed
        {
            self.camera_enabled = false;
        }

        let mut camera = ControlSignal::neutral(Source::Camera);
        let mut trusted = false;
        if self.camera_enabled {
            match (self.calibrator.baseline(), &smoothed) {
                (Some(baseline), SmoothOutput::Tracking(pose)) => {
                    camera = self.classifier.classify(pose, baseline);
                    trusted = true;
                }
                (Some(baseline), SmoothOutput::Holding { pose, .. }) => {
                    // Held pose, current clock so the debounce can expire
                    let held = crate::tracker::SmoothedPose { timestamp: now, ..*pose };
                    camera = self.classifier.classify(&held, baseline);
                    trusted = true;
                }
                (Some(_), SmoothOutput::Lost | SmoothOutput::NotAcquired) => {
                    self.classifier.reset();
                }
                (None, _) => {}
            }
        }

        let fault = if !self.camera_enabled {
            Some(InputFault::CalibrationFailed)
        } else if !smoothed.is_available() {
            Some(InputFault::PoseUnavailable)
        } else {
            None
        };
        self.note_fault(fault);

        PipelineStep {
            input: self.arbiter.resolve(camera, keyboard, trusted),
            fault,
            calibrating: matches!(self.calibrator.status(), CalibrationStatus::Collecting { .. }),
            smoothed,
            camera,
        }
    }

    fn note_fault(&mut self, fault: Option<InputFault>) {
        if fault == self.last_fault {
            return;
        }
        match fault {
            Some(fault) => warn!("{}", fault),
            None => info!("camera control active"),
        }
        self.last_fault = fault;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::smooth::tests::upper_body;

    fn config(calibration_frames: u32) -> Config {
        let mut config = Config::default();
        config.smooth.alpha = 1.0;
        config.smooth.grace_frames = 5;
        config.gesture.calibration_frames = calibration_frames;
        config.gesture.calibration_timeout_frames = 10;
        config
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    /// Runs calibration on a standing pose at 0.4 with a 0.3 torso.
    fn calibrated() -> ControlPipeline {
        let mut p = ControlPipeline::new(&config(3));
        p.begin_session();
        for i in 0..3 {
            let step = p.step(Some(&upper_body(0.4, 0.3, i * 33)), ms(i * 33));
            assert_eq!(step.input, ResolvedInput::default());
        }
        assert!(matches!(p.calibration(), CalibrationStatus::Ready(_)));
        p
    }

    #[test]
    fn test_trigger_lines_follow_baseline() {
        let mut p = ControlPipeline::new(&config(3));
        p.begin_session();
        assert!(p.trigger_lines().is_none());

        let p = calibrated();
        let (jump, duck) = p.trigger_lines().unwrap();
        assert!((jump - 0.325).abs() < 1e-5);
        assert!((duck - 0.505).abs() < 1e-5);
    }

    #[test]
    fn test_camera_ignored_while_calibrating() {
        let mut p = ControlPipeline::new(&config(3));
        p.begin_session();
        let step = p.step(Some(&upper_body(0.1, 0.3, 0)), ms(0));
        assert!(step.calibrating);
        assert_eq!(step.input, ResolvedInput::default());
    }

    #[test]
    fn test_rise_after_calibration_jumps_once() {
        let mut p = calibrated();
        let step = p.step(Some(&upper_body(0.2, 0.3, 200)), ms(200));
        assert!(step.input.jump);
        assert_eq!(step.input.source, Some(Source::Camera));
        assert!(!p.step(Some(&upper_body(0.2, 0.3, 233)), ms(233)).input.jump);
    }

    #[test]
    fn test_crouch_ducks() {
        let mut p = calibrated();
        let step = p.step(Some(&upper_body(0.6, 0.3, 200)), ms(200));
        assert!(step.input.duck);
        assert!(step.fault.is_none());
    }

    #[test]
    fn test_crouch_then_rise_jumps_after_hold() {
        let mut p = calibrated();
        assert!(p.step(Some(&upper_body(0.6, 0.3, 200)), ms(200)).input.duck);
        // Duck still held inside the debounce window
        let step = p.step(Some(&upper_body(0.2, 0.3, 233)), ms(233));
        assert!(step.input.duck);
        assert!(!step.input.jump);

        let step = p.step(Some(&upper_body(0.2, 0.3, 400)), ms(400));
        assert!(step.input.jump);
        assert!(!step.input.duck);
        assert_eq!(step.input.source, Some(Source::Camera));
    }

    #[test]
    fn test_grace_then_keyboard_fallback() {
        let mut p = calibrated();
        assert!(p.step(Some(&upper_body(0.6, 0.3, 200)), ms(200)).input.duck);
        for i in 1..=5 {
            let step = p.step(None, ms(200 + i * 33));
            assert!(step.input.duck, "held pose still trusted at miss {}", i);
            assert!(step.fault.is_none());
        }
        let step = p.step(None, ms(400));
        assert_eq!(step.fault, Some(InputFault::PoseUnavailable));
        assert!(!step.input.duck);

        p.push_key(KeyEvent::down(crate::control::Key::Jump, ms(410)));
        let step = p.step(None, ms(420));
        assert!(step.input.jump);
        assert_eq!(step.input.source, Some(Source::Keyboard));
    }

    #[test]
    fn test_camera_restart_drops_held_pose() {
        let mut p = calibrated();
        assert!(p.step(Some(&upper_body(0.6, 0.3, 200)), ms(200)).input.duck);
        p.camera_restarted();
        let step = p.step(None, ms(233));
        assert_eq!(step.smoothed, SmoothOutput::NotAcquired);
        assert_eq!(step.fault, Some(InputFault::PoseUnavailable));
        assert!(!step.input.duck);

        // Baseline survives the restart
        let step = p.step(Some(&upper_body(0.4, 0.3, 266)), ms(266));
        assert!(step.fault.is_none());
        assert!(!step.calibrating);
        assert_eq!(step.input, ResolvedInput::default());
    }

    #[test]
    fn test_calibration_failure_disables_camera_for_session() {
        let mut p = ControlPipeline::new(&config(3));
        p.begin_session();
        let mut last = None;
        for i in 0..10 {
            last = Some(p.step(None, ms(i * 33)));
        }
        assert_eq!(last.unwrap().fault, Some(InputFault::CalibrationFailed));

        // Good poses no longer matter this session
        let step = p.step(Some(&upper_body(0.1, 0.3, 400)), ms(400));
        assert_eq!(step.fault, Some(InputFault::CalibrationFailed));
        assert!(!step.input.jump);

        // Next session calibrates again
        p.begin_session();
        let step = p.step(Some(&upper_body(0.4, 0.3, 500)), ms(500));
        assert!(step.calibrating);
        assert!(step.fault.is_none());
    }
}
