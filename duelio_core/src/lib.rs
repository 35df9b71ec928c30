#![forbid(unsafe_code)]
//! Core of duelio, a two-player reaction game on Linux sysfs GPIO lines.
//!
//! Two sensor inputs race each other; the first one to trigger turns off its player's LED and
//! latches the win until the reset input is asserted.
pub mod config;
pub mod game;
pub mod hardware;
pub mod logger;
pub mod time;

pub const fn duelio_version_str() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
