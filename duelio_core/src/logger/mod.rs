use derive_more::Display;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Set up `env_logger` for a duelio binary.
///
/// `RUST_LOG` is honoured, but the configured level (or debug when `verbose`) takes precedence.
pub fn init_logging(level: LogLevel, verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter(None, LevelFilter::Debug);
    } else {
        builder.filter(None, level.to_filter());
    }
    builder.format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()));
    if builder.try_init().is_err() {
        log::debug!("Logger already initialised");
    }
}

#[derive(Deserialize, Serialize, Display, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn is_debug(&self) -> bool {
        self <= &LogLevel::Debug
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}
