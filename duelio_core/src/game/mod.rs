//! The reaction game state machine
//!
//! Each poll iteration checks, in this order:
//! 1. the reset sensor: when asserted both LEDs are lit and the game returns to [`GameState::Idle`],
//! 2. sensor 1: when idle and asserted, LED 1 is turned off and player one wins,
//! 3. sensor 2: as above for player two.
//!
//! A win latches until the next reset. Sensor 1 beating sensor 2 when both trigger in the same
//! iteration follows from the check order and has no deeper meaning.
use crate::time::TimeStamp;
use derive_more::Display;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::Duration;

mod lines;
pub use lines::{GameLines, Indicator, Sensor};

#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Idle,
    Player1Won,
    Player2Won,
}

#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    #[display(fmt = "player 1")]
    One,
    #[display(fmt = "player 2")]
    Two,
}

impl From<Player> for GameState {
    fn from(player: Player) -> Self {
        match player {
            Player::One => GameState::Player1Won,
            Player::Two => GameState::Player2Won,
        }
    }
}

/// Outcome of a poll iteration that changed something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Reset,
    Won { player: Player, reaction_time_ms: u128 },
}

pub struct GameController {
    lines: GameLines,
    state: GameState,
    round_start: TimeStamp,
}

impl GameController {
    /// Take ownership of configured lines and start an idle round with both LEDs lit.
    pub fn new(lines: GameLines) -> Self {
        let mut controller = GameController {
            lines,
            state: GameState::Idle,
            round_start: TimeStamp::now(),
        };
        controller.reset();
        controller
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn lines(&self) -> &GameLines {
        &self.lines
    }

    pub fn reset(&mut self) {
        self.lines.led1.light();
        self.lines.led2.light();
        self.state = GameState::Idle;
        self.round_start = TimeStamp::now();
    }

    /// Run one iteration of the game.
    pub fn poll(&mut self) -> Option<GameEvent> {
        if self.lines.reset.is_asserted() {
            self.reset();
            return Some(GameEvent::Reset);
        }
        if self.state != GameState::Idle {
            return None;
        }
        if self.lines.sensor1.is_asserted() {
            return Some(self.declare_winner(Player::One));
        }
        if self.lines.sensor2.is_asserted() {
            return Some(self.declare_winner(Player::Two));
        }
        None
    }

    fn declare_winner(&mut self, player: Player) -> GameEvent {
        match player {
            Player::One => self.lines.led1.dim(),
            Player::Two => self.lines.led2.dim(),
        }
        self.state = player.into();
        GameEvent::Won {
            player,
            reaction_time_ms: TimeStamp::now().millis_since(self.round_start),
        }
    }

    /// Turn both LEDs off.
    pub fn shutdown(&mut self) {
        self.lines.led1.dim();
        self.lines.led2.dim();
    }

    /// Poll until `stop` is raised, then turn the LEDs off.
    pub fn run(&mut self, interval: Duration, stop: &AtomicBool) {
        info!("Game started, waiting for sensors");
        while !stop.load(Ordering::Relaxed) {
            let previous = self.state;
            match self.poll() {
                Some(GameEvent::Won {
                    player,
                    reaction_time_ms,
                }) => info!("{} won after {} ms", player, reaction_time_ms),
                Some(GameEvent::Reset) if previous != GameState::Idle => {
                    info!("Game reset")
                }
                Some(GameEvent::Reset) => debug!("Reset while idle"),
                None => {}
            }
            sleep(interval);
        }
        self.shutdown();
        info!("Game stopped");
    }
}
