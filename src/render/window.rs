use anyhow::Result;
use minifb::{Key as WindowKey, KeyRepeat, Window, WindowOptions};
use std::time::Duration;

use crate::control::{Key, KeyEvent};
use crate::error::InputFault;
use crate::game::{GameState, ObstacleKind, Posture, Rect, Snapshot};
use crate::pose::PoseSnapshot;
use crate::render::skeleton::*;

/// 地面ラインの下端からの距離 (px)
const GROUND_MARGIN: usize = 40;
/// 右上のカメラ表示サイズ (px)
const INSET_WIDTH: usize = 160;
const INSET_HEIGHT: usize = 120;
const STATUS_BAR_HEIGHT: usize = 4;

/// ゲームスナップショットに重ねるフレームごとの表示情報
pub struct Overlay<'a> {
    pub pose: Option<&'a PoseSnapshot>,
    /// ジャンプ・しゃがみ判定ライン（画像y座標）
    pub trigger_lines: Option<(f32, f32)>,
    pub calibrating: bool,
    pub fault: Option<InputFault>,
    pub confidence_threshold: f32,
}

/// minifbを使用したレンダラー
pub struct MinifbRenderer {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
    title: String,
    show_pose: bool,
}

impl MinifbRenderer {
    /// ウィンドウを作成
    pub fn new(title: &str, width: usize, height: usize, show_pose: bool) -> Result<Self> {
        let window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        Ok(Self {
            window,
            buffer: vec![BACKGROUND_COLOR; width * height],
            width,
            height,
            title: title.to_string(),
            show_pose,
        })
    }

    /// ウィンドウが開いているか
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// 前回のポーリング以降のキー押下・解放（時刻 `at` を付与）
    pub fn poll_keys(&self, at: Duration) -> Vec<KeyEvent> {
        let pressed = self.window.get_keys_pressed(KeyRepeat::No);
        let released = self.window.get_keys_released();
        pressed
            .into_iter()
            .filter_map(|k| map_key(k).map(|key| KeyEvent::down(key, at)))
            .chain(
                released
                    .into_iter()
                    .filter_map(|k| map_key(k).map(|key| KeyEvent::up(key, at))),
            )
            .collect()
    }

    pub fn draw(&mut self, snapshot: &Snapshot<'_>, overlay: &Overlay<'_>) {
        self.buffer.fill(BACKGROUND_COLOR);
        let ground_y = self.ground_y();
        self.fill_rect(0, ground_y, self.width as i32, 2, GROUND_COLOR);

        // ワールド座標 → 画面座標（xはウィンドウ幅に合わせて拡大、高度は上向き）
        let scale = self.width as f32 / snapshot.play_width.max(1.0);
        for obstacle in snapshot.obstacles {
            let color = match obstacle.kind {
                ObstacleKind::Cactus => CACTUS_COLOR,
                ObstacleKind::Pterodactyl => PTERODACTYL_COLOR,
            };
            self.fill_world_rect(&obstacle.hitbox(), scale, color);
        }

        let player_color = match snapshot.player.posture {
            Posture::Ducking => GROUND_COLOR,
            Posture::Running | Posture::Jumping => PLAYER_COLOR,
        };
        self.fill_world_rect(&snapshot.player.hitbox(), scale, player_color);

        if snapshot.session.state != GameState::Playing {
            self.tint(INACTIVE_TINT);
        }

        let status = if overlay.fault.is_some() {
            Some(FAULT_COLOR)
        } else if overlay.calibrating {
            Some(CALIBRATING_COLOR)
        } else {
            None
        };
        if let Some(color) = status {
            self.fill_rect(0, 0, self.width as i32, STATUS_BAR_HEIGHT as i32, color);
        }

        if self.show_pose {
            self.draw_inset(overlay);
        }

        let title = match snapshot.session.state {
            GameState::Menu => format!("{} | Enter: start | HI {}", self.title, snapshot.high_score),
            GameState::Playing => format!(
                "{} | {} | HI {} | lives {}",
                self.title, snapshot.session.score, snapshot.high_score, snapshot.session.lives
            ),
            GameState::Paused => format!("{} | paused | P: resume, Esc: menu", self.title),
            GameState::GameOver => format!(
                "{} | GAME OVER {} | R: restart, Enter: menu",
                self.title, snapshot.session.score
            ),
        };
        self.window.set_title(&title);
    }

    /// バッファをウィンドウに表示
    pub fn update(&mut self) -> Result<()> {
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }

    fn ground_y(&self) -> i32 {
        self.height.saturating_sub(GROUND_MARGIN) as i32
    }

    fn fill_world_rect(&mut self, rect: &Rect, scale: f32, color: u32) {
        let ground_y = self.ground_y();
        let x = (rect.x * scale) as i32;
        let w = (rect.w * scale).ceil() as i32;
        let top = ground_y - (rect.top() * scale) as i32;
        let h = (rect.h * scale).ceil() as i32;
        self.fill_rect(x, top, w, h, color);
    }

    /// 姿勢を右上に縮小描画
    fn draw_inset(&mut self, overlay: &Overlay<'_>) {
        let ox = self.width.saturating_sub(INSET_WIDTH + 8) as i32;
        let oy = (STATUS_BAR_HEIGHT + 8) as i32;
        let (w, h) = (INSET_WIDTH as u32, INSET_HEIGHT as u32);
        self.fill_rect(ox, oy, w as i32, h as i32, INSET_BACKGROUND);

        if let Some((jump, duck)) = overlay.trigger_lines {
            for (y, color) in [(jump, CALIBRATING_COLOR), (duck, FAULT_COLOR)] {
                let py = oy + (y.clamp(0.0, 1.0) * h as f32) as i32;
                self.fill_rect(ox, py, w as i32, 1, color);
            }
        }

        let Some(pose) = overlay.pose else {
            return;
        };
        let threshold = overlay.confidence_threshold;

        // 骨格線を描画
        for (start_idx, end_idx) in SKELETON_CONNECTIONS.iter() {
            let start = pose.get(*start_idx);
            let end = pose.get(*end_idx);

            if start.is_valid(threshold) && end.is_valid(threshold) {
                let (x1, y1) = start.to_pixel(w, h);
                let (x2, y2) = end.to_pixel(w, h);
                self.draw_line(ox + x1, oy + y1, ox + x2, oy + y2, SKELETON_COLOR);
            }
        }

        // キーポイントを描画
        for kp in pose.keypoints.iter() {
            let (px, py) = kp.to_pixel(w, h);
            let color = if kp.is_valid(threshold) {
                KEYPOINT_COLOR
            } else {
                LOW_CONFIDENCE_COLOR
            };
            self.draw_circle(ox + px, oy + py, 2, color);
        }
    }

    fn tint(&mut self, color: u32) {
        // チャンネルごとに50%ブレンド
        for px in self.buffer.iter_mut() {
            *px = ((*px >> 1) & 0x7F7F7F) + ((color >> 1) & 0x7F7F7F);
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        for py in y..y + h {
            for px in x..x + w {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Bresenhamのアルゴリズムで線を描画
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            self.set_pixel(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// 円を描画（塗りつぶし）
    fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: u32) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.set_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// ピクセルをセット（境界チェック付き）
    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize * self.width + x as usize] = color;
        }
    }
}

fn map_key(key: WindowKey) -> Option<Key> {
    match key {
        WindowKey::Space | WindowKey::Up => Some(Key::Jump),
        WindowKey::Down => Some(Key::Duck),
        WindowKey::P => Some(Key::Pause),
        WindowKey::Enter => Some(Key::Confirm),
        WindowKey::Escape => Some(Key::Back),
        WindowKey::R => Some(Key::Restart),
        _ => None,
    }
}
