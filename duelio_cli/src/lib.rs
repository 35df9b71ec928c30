use duelio_core::config::ConfigError;
use duelio_core::hardware::HardwareError;
use thiserror::Error;

pub mod gpio;
pub mod opts;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
