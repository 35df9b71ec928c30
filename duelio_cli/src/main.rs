#![forbid(unsafe_code)]
use duelio_cli::opts::{Command, Opt};
use duelio_cli::{gpio, CliError};
use duelio_core::hardware::sysfs::SysfsGpio;
use duelio_core::logger::{init_logging, LogLevel};
use structopt::StructOpt;

fn run_subcommand(cmd: Command) -> Result<(), CliError> {
    let sysfs = SysfsGpio;
    match cmd {
        Command::Export { numbers } => gpio::export(&sysfs, &numbers),
        Command::Unexport { numbers } => gpio::unexport(&sysfs, &numbers),
        Command::Direction { number, direction } => gpio::direction(&sysfs, number, direction),
        Command::Get(opts) => {
            let report = gpio::get(&sysfs, &opts)?;
            println!("{}", report);
            Ok(())
        }
        Command::Set { number, level } => gpio::set(&sysfs, number, level),
        Command::Blink(opts) => gpio::blink(&sysfs, &opts),
        Command::Setup { config_file } => gpio::setup(&sysfs, &config_file).map(|_| ()),
        Command::CheckConfig { config_file } => gpio::check_config(&config_file).map(|_| ()),
    }
}

fn main() {
    let opt = Opt::from_args();
    init_logging(LogLevel::Info, opt.verbose);
    if let Err(err) = run_subcommand(opt.cmd) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
