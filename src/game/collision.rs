use super::obstacle::{Obstacle, ObstacleId};
use super::player::PlayerState;

/// Axis-aligned box in world px. `y` is the bottom edge (altitude).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap; shared edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.top() && other.y < self.top()
    }
}

/// First obstacle overlapping the player's hitbox.
///
/// `obstacles` must be sorted by `x`. Only obstacles whose left edge lies
/// within `margin` of the player's hitbox are tested, so `margin` must be
/// at least the widest obstacle.
pub fn check(player: &PlayerState, obstacles: &[Obstacle], margin: f32) -> Option<ObstacleId> {
    let hitbox = player.hitbox();
    let lo = hitbox.x - margin;
    let hi = hitbox.right() + margin;

    let start = obstacles.partition_point(|o| o.x < lo);
    obstacles[start..]
        .iter()
        .take_while(|o| o.x < hi)
        .find(|o| hitbox.intersects(&o.hitbox()))
        .map(|o| o.id)
}

pub fn collides(player: &PlayerState, obstacles: &[Obstacle], margin: f32) -> bool {
    check(player, obstacles, margin).is_some()
}
