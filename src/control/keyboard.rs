use std::time::Duration;

use crate::game::{Command, GameState};

use super::gesture::{Control, ControlSignal, Source};

/// Logical keys; the platform layer maps physical keys onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Jump,
    Duck,
    Pause,
    Confirm,
    Back,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
    pub at: Duration,
}

impl KeyEvent {
    pub fn down(key: Key, at: Duration) -> Self {
        Self { key, pressed: true, at }
    }

    pub fn up(key: Key, at: Duration) -> Self {
        Self { key, pressed: false, at }
    }
}

/// Edge-triggered keyboard source.
///
/// Jump key-down yields one Jump on the next `signal()`; Duck is a level
/// that lasts from key-down to key-up. Menu keys are queued separately.
#[derive(Debug, Default)]
pub struct KeyboardState {
    jump_down: bool,
    jump_pending: bool,
    duck_down: bool,
    changed_at: Duration,
    menu_keys: Vec<Key>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: KeyEvent) {
        match (event.key, event.pressed) {
            (Key::Jump, true) => {
                // Auto-repeat while held does not retrigger
                if !self.jump_down {
                    self.jump_pending = true;
                    self.changed_at = event.at;
                }
                self.jump_down = true;
            }
            (Key::Jump, false) => self.jump_down = false,
            (Key::Duck, pressed) => {
                if self.duck_down != pressed {
                    self.duck_down = pressed;
                    self.changed_at = event.at;
                }
            }
            (key, true) => self.menu_keys.push(key),
            (_, false) => {}
        }
    }

    /// Current keyboard signal; consumes a pending jump.
    pub fn signal(&mut self) -> ControlSignal {
        let control = if std::mem::take(&mut self.jump_pending) {
            Control::Jump
        } else if self.duck_down {
            Control::Duck
        } else {
            Control::Neutral
        };
        ControlSignal::new(control, Source::Keyboard, self.changed_at)
    }

    /// Drops a pending jump without delivering it (e.g. key pressed while
    /// the game was not running).
    pub fn discard_pending(&mut self) {
        self.jump_pending = false;
    }

    pub fn take_menu_keys(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.menu_keys)
    }
}

/// Maps a menu key to the command it means in `state`, if any.
///
/// Only commands the state machine accepts are produced.
pub fn command_for(key: Key, state: GameState) -> Option<Command> {
    match (state, key) {
        (GameState::Menu, Key::Confirm) => Some(Command::Start),
        (GameState::Playing, Key::Pause | Key::Back) => Some(Command::Pause),
        (GameState::Paused, Key::Pause | Key::Confirm) => Some(Command::Resume),
        (GameState::Paused, Key::Back) => Some(Command::Abandon),
        (GameState::GameOver, Key::Confirm | Key::Back) => Some(Command::Acknowledge),
        (GameState::GameOver, Key::Restart) => Some(Command::Restart),
        _ => None,
    }
}
