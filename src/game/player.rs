use super::collision::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Posture {
    #[default]
    Running,
    Jumping,
    Ducking,
}

/// [width, height] per posture; Jumping uses the running box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitboxes {
    pub running: [f32; 2],
    pub ducking: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Left edge, fixed
    pub x: f32,
    /// Above ground, >= 0
    pub altitude: f32,
    /// Upward positive, px per tick
    pub velocity: f32,
    pub posture: Posture,
    hitboxes: Hitboxes,
}

impl PlayerState {
    pub fn new(x: f32, hitboxes: Hitboxes) -> Self {
        Self {
            x,
            altitude: 0.0,
            velocity: 0.0,
            posture: Posture::Running,
            hitboxes,
        }
    }

    pub fn hitbox(&self) -> Rect {
        let [w, h] = match self.posture {
            Posture::Ducking => self.hitboxes.ducking,
            Posture::Running | Posture::Jumping => self.hitboxes.running,
        };
        Rect::new(self.x, self.altitude, w, h)
    }

    pub fn is_grounded(&self) -> bool {
        self.posture != Posture::Jumping
    }

    pub(crate) fn reset(&mut self) {
        self.altitude = 0.0;
        self.velocity = 0.0;
        self.posture = Posture::Running;
    }

    /// Applies one tick of input. Returns true if a jump started.
    ///
    /// Jump takes off from the ground, leaving a duck if needed; Duck is a
    /// level that holds Ducking and releases back to Running.
    pub fn apply_input(&mut self, jump: bool, duck: bool, jump_velocity: f32) -> bool {
        if jump && self.is_grounded() {
            self.posture = Posture::Jumping;
            self.velocity = jump_velocity;
            return true;
        }
        match self.posture {
            Posture::Running if duck => self.posture = Posture::Ducking,
            Posture::Ducking if !duck => self.posture = Posture::Running,
            _ => {}
        }
        false
    }

    /// Vertical physics step. Returns true on the landing tick.
    pub fn integrate(&mut self, gravity: f32, duck_held: bool) -> bool {
        if self.posture != Posture::Jumping {
            return false;
        }
        self.altitude += self.velocity;
        self.velocity -= gravity;
        if self.altitude > 0.0 {
            return false;
        }
        self.altitude = 0.0;
        self.velocity = 0.0;
        self.posture = if duck_held { Posture::Ducking } else { Posture::Running };
        true
    }
}
