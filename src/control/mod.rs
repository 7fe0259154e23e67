//! Motion-to-control translation: gestures, keyboard and their arbitration

pub mod arbiter;
pub mod calibration;
pub mod gesture;
pub mod keyboard;
pub mod pipeline;

pub use arbiter::{InputArbiter, ResolvedInput};
pub use calibration::{Baseline, CalibrationStatus, Calibrator};
pub use gesture::{classify_height, Control, ControlSignal, GestureClassifier, Source, Thresholds};
pub use keyboard::{command_for, Key, KeyEvent, KeyboardState};
pub use pipeline::{ControlPipeline, PipelineStep};

pub use crate::error::InputFault;
