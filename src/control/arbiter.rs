use super::gesture::{Control, ControlSignal, Source};

/// Per-tick input handed to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedInput {
    /// Impulse: true on one tick only
    pub jump: bool,
    /// Level: true while held
    pub duck: bool,
    /// Source that won this tick; `None` when both were Neutral
    pub source: Option<Source>,
}

impl ResolvedInput {
    pub fn jump() -> Self {
        Self { jump: true, duck: false, source: Some(Source::Keyboard) }
    }

    pub fn duck() -> Self {
        Self { jump: false, duck: true, source: Some(Source::Keyboard) }
    }
}

/// Merges camera and keyboard signals into one input.
///
/// Keeps the previous camera level so a level-triggered camera Jump fires
/// once, on the tick it appears.
#[derive(Debug, Default)]
pub struct InputArbiter {
    last_camera: Control,
}

impl InputArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.last_camera = Control::Neutral;
    }

    pub fn resolve(
        &mut self,
        camera: ControlSignal,
        keyboard: ControlSignal,
        pose_available: bool,
    ) -> ResolvedInput {
        let camera = if pose_available {
            camera
        } else {
            ControlSignal::neutral(Source::Camera)
        };
        let previous_camera = std::mem::replace(&mut self.last_camera, camera.control);

        let winner = match (camera.is_active(), keyboard.is_active()) {
            (false, false) => return ResolvedInput::default(),
            (true, false) => camera,
            (false, true) => keyboard,
            // Later change wins; ties go to the keyboard
            (true, true) if camera.changed_at > keyboard.changed_at => camera,
            (true, true) => keyboard,
        };

        match winner.control {
            Control::Jump => ResolvedInput {
                jump: winner.source == Source::Keyboard || previous_camera != Control::Jump,
                duck: false,
                source: Some(winner.source),
            },
            Control::Duck => ResolvedInput {
                jump: false,
                duck: true,
                source: Some(winner.source),
            },
            Control::Neutral => ResolvedInput::default(),
        }
    }
}
