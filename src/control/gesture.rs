use std::time::Duration;

use crate::config::GestureConfig;
use crate::tracker::SmoothedPose;

use super::calibration::Baseline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    #[default]
    Neutral,
    Jump,
    Duck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Camera,
    Keyboard,
}

/// A source's current control level and when that level last changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSignal {
    pub control: Control,
    pub source: Source,
    pub changed_at: Duration,
}

impl ControlSignal {
    pub fn new(control: Control, source: Source, changed_at: Duration) -> Self {
        Self {
            control,
            source,
            changed_at,
        }
    }

    pub fn neutral(source: Source) -> Self {
        Self::new(Control::Neutral, source, Duration::ZERO)
    }

    pub fn is_active(&self) -> bool {
        self.control != Control::Neutral
    }
}

/// Jump/duck trigger distances as fractions of body height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub jump: f32,
    pub duck: f32,
}

/// Frame-by-frame threshold test, no debounce.
///
/// Image y grows downward, so rising means a smaller anchor y.
pub fn classify_height(anchor_y: f32, baseline: &Baseline, thresholds: Thresholds) -> Control {
    let h = baseline.body_height;
    if anchor_y < baseline.anchor_y - thresholds.jump * h {
        Control::Jump
    } else if anchor_y > baseline.anchor_y + thresholds.duck * h {
        Control::Duck
    } else {
        Control::Neutral
    }
}

/// Threshold classifier with a minimum hold on non-Neutral output.
pub struct GestureClassifier {
    thresholds: Thresholds,
    debounce: Duration,
    output: Control,
    changed_at: Duration,
}

impl GestureClassifier {
    pub fn new(thresholds: Thresholds, debounce: Duration) -> Self {
        Self {
            thresholds,
            debounce,
            output: Control::Neutral,
            changed_at: Duration::ZERO,
        }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(
            Thresholds {
                jump: config.jump_threshold,
                duck: config.duck_threshold,
            },
            Duration::from_millis(config.debounce_ms),
        )
    }

    pub fn classify(&mut self, pose: &SmoothedPose, baseline: &Baseline) -> ControlSignal {
        let raw = classify_height(pose.anchor_y, baseline, self.thresholds);
        self.accept(raw, pose.timestamp)
    }

    pub fn reset(&mut self) {
        self.output = Control::Neutral;
        self.changed_at = Duration::ZERO;
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn current(&self) -> ControlSignal {
        ControlSignal::new(self.output, Source::Camera, self.changed_at)
    }

    fn accept(&mut self, raw: Control, now: Duration) -> ControlSignal {
        if raw != self.output {
            let held = self.output != Control::Neutral && now < self.changed_at + self.debounce;
            if !held {
                self.output = raw;
                self.changed_at = now;
            }
        }
        self.current()
    }
}
