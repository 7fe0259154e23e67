use crate::error::RunnerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Menu,
    Playing,
    Paused,
    GameOver,
}

/// Player-issued state changes. Game over is not a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Resume,
    Abandon,
    Acknowledge,
    Restart,
}

impl GameState {
    /// Closed transition table.
    pub fn on(self, command: Command) -> Result<GameState, RunnerError> {
        use Command::*;
        use GameState::*;
        match (self, command) {
            (Menu, Start) => Ok(Playing),
            (Playing, Pause) => Ok(Paused),
            (Paused, Resume) => Ok(Playing),
            (Paused, Abandon) => Ok(Menu),
            (GameOver, Acknowledge) => Ok(Menu),
            (GameOver, Restart) => Ok(Playing),
            (state, command) => Err(RunnerError::InvalidTransition { state, command }),
        }
    }
}

/// Per-session counters. Reset whenever a session enters Playing.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub state: GameState,
    pub score: u32,
    /// Scroll speed in px per tick
    pub speed: f32,
    pub lives: u32,
    pub tick: u64,
    /// Total px scrolled
    pub distance: f32,
}

impl GameSession {
    pub fn new(speed: f32, lives: u32) -> Self {
        Self {
            state: GameState::Menu,
            score: 0,
            speed,
            lives,
            tick: 0,
            distance: 0.0,
        }
    }

    pub(crate) fn restart(&mut self, speed: f32, lives: u32) {
        *self = Self {
            state: GameState::Playing,
            ..Self::new(speed, lives)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [GameState; 4] = [
        GameState::Menu,
        GameState::Playing,
        GameState::Paused,
        GameState::GameOver,
    ];
    const ALL_COMMANDS: [Command; 6] = [
        Command::Start,
        Command::Pause,
        Command::Resume,
        Command::Abandon,
        Command::Acknowledge,
        Command::Restart,
    ];

    #[test]
    fn test_accepted_transitions() {
        assert_eq!(GameState::Menu.on(Command::Start), Ok(GameState::Playing));
        assert_eq!(GameState::Playing.on(Command::Pause), Ok(GameState::Paused));
        assert_eq!(GameState::Paused.on(Command::Resume), Ok(GameState::Playing));
        assert_eq!(GameState::Paused.on(Command::Abandon), Ok(GameState::Menu));
        assert_eq!(GameState::GameOver.on(Command::Acknowledge), Ok(GameState::Menu));
        assert_eq!(GameState::GameOver.on(Command::Restart), Ok(GameState::Playing));
    }

    #[test]
    fn test_everything_else_rejected() {
        let accepted = ALL_STATES
            .iter()
            .flat_map(|s| ALL_COMMANDS.iter().map(move |c| (*s, *c)))
            .filter(|(s, c)| s.on(*c).is_ok())
            .count();
        assert_eq!(accepted, 6);

        assert_eq!(
            GameState::Playing.on(Command::Start),
            Err(RunnerError::InvalidTransition {
                state: GameState::Playing,
                command: Command::Start,
            })
        );
        assert!(GameState::Menu.on(Command::Pause).is_err());
        assert!(GameState::Playing.on(Command::Acknowledge).is_err());
    }

    #[test]
    fn test_restart_clears_counters() {
        let mut s = GameSession::new(10.0, 3);
        s.score = 12;
        s.tick = 400;
        s.distance = 4000.0;
        s.lives = 0;
        s.state = GameState::GameOver;
        s.restart(10.0, 3);
        assert_eq!(s.state, GameState::Playing);
        assert_eq!(s.score, 0);
        assert_eq!(s.tick, 0);
        assert_eq!(s.lives, 3);
        assert_eq!(s.distance, 0.0);
    }
}
