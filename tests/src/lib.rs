#![forbid(unsafe_code)]
//! A fake GPIO board for exercising duelio from config to LEDs without hardware.
use duelio_core::config::{GameConfig, General, Lines};
use duelio_core::hardware::dummy::{DummyChip, DummyHandle};
use duelio_core::hardware::{Direction, Level};
use duelio_core::logger::LogLevel;

/// Lines used by [`Lines::default`].
pub const GAME_LINES: [u32; 5] = [46, 47, 48, 88, 89];

/// Dummy GPIO class whose listed lines start out exported, as inputs, reading high.
pub struct FakeBoard {
    chip: DummyChip,
}

impl FakeBoard {
    pub fn new(exported: &[u32]) -> Self {
        FakeBoard {
            chip: DummyChip::new(exported),
        }
    }

    /// Board with every line of the default game config exported.
    pub fn game() -> Self {
        FakeBoard::new(&GAME_LINES)
    }

    pub fn chip(&self) -> &DummyChip {
        &self.chip
    }

    /// Default game config, with sysfs lines matching [`GAME_LINES`].
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            general: General {
                name: "fake".into(),
                log_level: LogLevel::Debug,
                poll_interval_ms: 1,
            },
            lines: Lines::default(),
        }
    }

    pub fn handle(&self, number: u32) -> DummyHandle {
        self.chip
            .handle(number)
            .unwrap_or_else(|| panic!("gpio{} is not exported", number))
    }

    /// Pull an active-low sensor line low.
    pub fn press(&self, number: u32) {
        self.handle(number).set_level(Level::Low);
    }

    pub fn release(&self, number: u32) {
        self.handle(number).set_level(Level::High);
    }

    pub fn level(&self, number: u32) -> Level {
        self.handle(number).level()
    }

    pub fn direction(&self, number: u32) -> Option<Direction> {
        self.handle(number).direction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelio_core::game::{GameController, GameEvent, GameState, Player};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    const SENSOR1: u32 = 46;
    const SENSOR2: u32 = 47;
    const RESET: u32 = 48;
    const LED1: u32 = 88;
    const LED2: u32 = 89;

    fn started_game() -> (FakeBoard, GameController) {
        let board = FakeBoard::new(&[]);
        let config = board.game_config();
        config.setup_lines_with(board.chip()).unwrap();
        let controller = GameController::new(config.create_lines_with(board.chip()).unwrap());
        (board, controller)
    }

    #[test]
    fn setup_sets_directions() {
        let (board, _controller) = started_game();
        assert_eq!(board.direction(SENSOR1), Some(Direction::Input));
        assert_eq!(board.direction(RESET), Some(Direction::Input));
        assert_eq!(board.direction(LED1), Some(Direction::Output));
        assert_eq!(board.direction(LED2), Some(Direction::Output));
        assert_eq!((board.level(LED1), board.level(LED2)), (Level::High, Level::High));
    }

    #[test]
    fn missing_line_aborts_startup() {
        let board = FakeBoard::new(&[46, 47, 48, 88]);
        let err = board
            .game_config()
            .create_lines_with(board.chip())
            .err()
            .unwrap();
        assert!(err.is_unavailable());
    }

    #[test]
    fn scenarios() {
        let (board, mut controller) = started_game();
        assert_eq!(controller.state(), GameState::Idle);

        // A: sensor 1 wins.
        board.press(SENSOR1);
        assert!(matches!(
            controller.poll(),
            Some(GameEvent::Won {
                player: Player::One,
                ..
            })
        ));
        assert_eq!(controller.state(), GameState::Player1Won);
        assert_eq!((board.level(LED1), board.level(LED2)), (Level::Low, Level::High));

        // B: the win is latched.
        board.release(SENSOR1);
        board.press(SENSOR2);
        assert_eq!(controller.poll(), None);
        assert_eq!(controller.state(), GameState::Player1Won);
        assert_eq!(board.level(LED2), Level::High);

        // C: reset relights both LEDs.
        board.release(SENSOR2);
        board.press(RESET);
        assert_eq!(controller.poll(), Some(GameEvent::Reset));
        assert_eq!(controller.state(), GameState::Idle);
        assert_eq!((board.level(LED1), board.level(LED2)), (Level::High, Level::High));
    }

    #[test]
    fn unreadable_sensor_is_not_asserted() {
        let (board, mut controller) = started_game();
        board.press(SENSOR1);
        board.handle(SENSOR1).fail_reads(usize::MAX);
        board.press(SENSOR2);
        controller.poll();
        assert_eq!(controller.state(), GameState::Player2Won);
        assert_eq!(board.level(LED2), Level::Low);
        assert!(controller.lines().sensor1.is_failing());
    }

    #[test]
    fn run_loop_on_board() {
        let (board, mut controller) = started_game();
        let stop = Arc::new(AtomicBool::new(false));
        let loop_stop = stop.clone();
        let game = thread::spawn(move || {
            controller.run(Duration::from_millis(1), &loop_stop);
            controller
        });
        board.press(SENSOR2);
        while board.level(LED2) != Level::Low {
            thread::sleep(Duration::from_millis(1));
        }
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        let controller = game.join().unwrap();
        assert_eq!(controller.state(), GameState::Player2Won);
        assert_eq!((board.level(LED1), board.level(LED2)), (Level::Low, Level::Low));
    }
}
