use duelio_core::hardware::{Direction, Level};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "duelio", about = "sysfs GPIO helpers for duelio")]
pub struct Opt {
    #[structopt(short, long)]
    pub verbose: bool,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Export lines to user space
    #[structopt(name = "export")]
    Export { numbers: Vec<u32> },
    /// Release exported lines
    #[structopt(name = "unexport")]
    Unexport { numbers: Vec<u32> },
    /// Set the direction of an exported line (in or out)
    #[structopt(name = "direction")]
    Direction { number: u32, direction: Direction },
    /// Read the level of a line
    #[structopt(name = "get")]
    Get(GetOpt),
    /// Drive an output line (0 or 1)
    #[structopt(name = "set")]
    Set { number: u32, level: Level },
    /// Toggle an output line back and forth
    #[structopt(name = "blink")]
    Blink(BlinkOpt),
    /// Export and configure the lines of a game config
    #[structopt(name = "setup")]
    Setup { config_file: PathBuf },
    /// Parse and validate a game config
    #[structopt(name = "check-config")]
    CheckConfig { config_file: PathBuf },
}

#[derive(Debug, StructOpt)]
pub struct GetOpt {
    pub number: u32,
    /// Report the line as asserted when it reads 0
    #[structopt(long)]
    pub active_low: bool,
}

#[derive(Debug, StructOpt)]
pub struct BlinkOpt {
    pub number: u32,
    #[structopt(long, default_value = "1")]
    pub times: u32,
    /// Time spent at each level
    #[structopt(long, default_value = "1000")]
    pub period_ms: u32,
}
