#![forbid(unsafe_code)]
use duelio_core::config::{ConfigError, GameConfig};
use duelio_core::duelio_version_str;
use duelio_core::game::GameController;
use duelio_core::hardware::HardwareError;
use duelio_core::logger::init_logging;
use log::{error, info};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use structopt::StructOpt;
use thiserror::Error;

#[tokio::main]
async fn main() {
    if let Err(err) = run_game().await {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

/// Game main loop
///
/// The config is parsed, the lines are opened (and exported first with `--setup`), then the poll
/// loop runs on a blocking task until Ctrl-C, after which both LEDs are turned off.
async fn run_game() -> Result<(), GameError> {
    let opt = Opt::from_args();
    match opt {
        Opt::Run {
            config_file,
            setup,
            verbose,
        } => {
            let config = GameConfig::try_new(config_file.as_path())?;
            run_config(config, setup, verbose).await
        }
        Opt::Dummy { verbose } => run_config(GameConfig::dummy(), false, verbose).await,
    }
}

async fn run_config(config: GameConfig, setup: bool, verbose: bool) -> Result<(), GameError> {
    init_logging(config.general.log_level, verbose);
    info!(
        "Starting game '{}' (duelio {})",
        config.general.name,
        duelio_version_str()
    );
    if setup {
        config.setup_lines()?;
    }
    let controller = GameController::new(config.create_lines()?);
    play_until(controller, config.poll_interval(), tokio::signal::ctrl_c()).await
}

/// Run the poll loop on a blocking task until `signal` completes.
///
/// The loop is stopped, and the LEDs turned off, even when waiting for the signal fails.
async fn play_until<S>(
    mut controller: GameController,
    interval: Duration,
    signal: S,
) -> Result<(), GameError>
where
    S: Future<Output = io::Result<()>>,
{
    let stop = Arc::new(AtomicBool::new(false));
    let loop_stop = stop.clone();
    let game = tokio::task::spawn_blocking(move || controller.run(interval, &loop_stop));

    let signal = signal.await;
    match &signal {
        Ok(()) => info!("Stopping game"),
        Err(err) => error!("Failed waiting for Ctrl-C, stopping game: {}", err),
    }
    stop.store(true, Ordering::Relaxed);
    game.await.map_err(|err| GameError::Join(err.to_string()))?;
    signal?;
    Ok(())
}

#[derive(Debug, StructOpt)]
#[structopt(name = "duelio-game", about = "Two-player reaction game on sysfs GPIO")]
pub enum Opt {
    /// Run the game with lines from a config file
    #[structopt(name = "run")]
    Run {
        config_file: PathBuf,
        /// Export the lines and set their direction before starting
        #[structopt(long)]
        setup: bool,
        #[structopt(short, long)]
        verbose: bool,
    },
    /// Run the game with random dummy sensors
    #[structopt(name = "dummy")]
    Dummy {
        #[structopt(short, long)]
        verbose: bool,
    },
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
    #[error("Signal handling failed: {0}")]
    Signal(#[from] io::Error),
    #[error("Game loop failed: {0}")]
    Join(String),
}
