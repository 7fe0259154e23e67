use super::collision::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Cactus,
    Pterodactyl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub kind: ObstacleKind,
    /// Left edge
    pub x: f32,
    /// 0 for ground obstacles
    pub altitude: f32,
    /// [width, height]
    pub size: [f32; 2],
}

impl Obstacle {
    pub fn hitbox(&self) -> Rect {
        Rect::new(self.x, self.altitude, self.size[0], self.size[1])
    }

    pub fn right(&self) -> f32 {
        self.x + self.size[0]
    }

    /// Scrolled fully past the left edge of the play area.
    pub fn is_off_screen(&self) -> bool {
        self.right() < 0.0
    }
}
