//! Single-line sysfs commands, and the commands acting on a game config.
use crate::opts::{BlinkOpt, GetOpt};
use crate::CliError;
use duelio_core::config::GameConfig;
use duelio_core::hardware::{self, Delay, Direction, GpioChip, GpioLine, Level, LineId, Polarity};
use log::info;
use std::path::Path;

fn open_line<C: GpioChip>(
    chip: &C,
    number: u32,
    direction: Direction,
) -> Result<C::Line, CliError> {
    Ok(chip.line(number, LineId(format!("gpio{}", number)), direction)?)
}

pub fn export<C: GpioChip>(chip: &C, numbers: &[u32]) -> Result<(), CliError> {
    for number in numbers {
        chip.export(*number)?;
        info!("gpio{} exported", number);
    }
    Ok(())
}

pub fn unexport<C: GpioChip>(chip: &C, numbers: &[u32]) -> Result<(), CliError> {
    for number in numbers {
        chip.unexport(*number)?;
        info!("gpio{} unexported", number);
    }
    Ok(())
}

pub fn direction<C: GpioChip>(
    chip: &C,
    number: u32,
    direction: Direction,
) -> Result<(), CliError> {
    open_line(chip, number, direction)?.configure(direction)?;
    info!("gpio{} direction set to {}", number, direction);
    Ok(())
}

pub fn get<C: GpioChip>(chip: &C, opts: &GetOpt) -> Result<String, CliError> {
    let level = open_line(chip, opts.number, Direction::Input)?.read()?;
    let asserted = Polarity::from_active_low(opts.active_low).is_asserted(level);
    Ok(format!(
        "gpio{}: {} ({})",
        opts.number,
        level.as_sysfs(),
        if asserted { "asserted" } else { "not asserted" }
    ))
}

/// Drive an output, the direction must already be `out`.
pub fn set<C: GpioChip>(chip: &C, number: u32, level: Level) -> Result<(), CliError> {
    open_line(chip, number, Direction::Output)?.write(level)?;
    info!("gpio{} set to {}", number, level.as_sysfs());
    Ok(())
}

pub fn blink<C: GpioChip>(chip: &C, opts: &BlinkOpt) -> Result<(), CliError> {
    let mut line = open_line(chip, opts.number, Direction::Output)?;
    info!("Blinking gpio{} {} times", opts.number, opts.times);
    hardware::blink(&mut line, &mut Delay {}, opts.times, opts.period_ms)?;
    Ok(())
}

/// Export the sysfs lines of a game config and set their directions.
pub fn setup<C: GpioChip>(chip: &C, config_file: &Path) -> Result<GameConfig, CliError> {
    let config = GameConfig::try_new(config_file)?;
    config.setup_lines_with(chip)?;
    info!("Lines of '{}' are set up", config.general.name);
    Ok(config)
}

pub fn check_config(config_file: &Path) -> Result<GameConfig, CliError> {
    let config = GameConfig::try_new(config_file)?;
    info!("Config '{}' is valid", config.general.name);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelio_core::config::ConfigError;
    use duelio_tests::{FakeBoard, GAME_LINES};
    use std::path::PathBuf;

    fn sample_config() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../sample-duelio.json")
    }

    #[test]
    fn get_reports_polarity() {
        let board = FakeBoard::new(&[46]);
        board.press(46);
        let opts = GetOpt {
            number: 46,
            active_low: true,
        };
        assert_eq!(get(board.chip(), &opts).unwrap(), "gpio46: 0 (asserted)");
        let opts = GetOpt {
            number: 46,
            active_low: false,
        };
        assert_eq!(
            get(board.chip(), &opts).unwrap(),
            "gpio46: 0 (not asserted)"
        );
    }

    #[test]
    fn direction_then_set() {
        let board = FakeBoard::new(&[88]);
        direction(board.chip(), 88, Direction::Output).unwrap();
        assert_eq!(board.direction(88), Some(Direction::Output));
        set(board.chip(), 88, Level::Low).unwrap();
        assert_eq!(board.level(88), Level::Low);
    }

    #[test]
    fn blink_leaves_level_unchanged() {
        let board = FakeBoard::new(&[89]);
        let opts = BlinkOpt {
            number: 89,
            times: 2,
            period_ms: 1,
        };
        blink(board.chip(), &opts).unwrap();
        assert_eq!(board.level(89), Level::High);
        assert_eq!(board.handle(89).writes().len(), 4);
    }

    #[test]
    fn unexported_line_fails() {
        let board = FakeBoard::new(&[]);
        let err = set(board.chip(), 12, Level::High).unwrap_err();
        assert!(matches!(err, CliError::Hardware(hw) if hw.is_unavailable()));
    }

    #[test]
    fn export_and_unexport() {
        let board = FakeBoard::new(&[46]);
        export(board.chip(), &[46, 47]).unwrap();
        assert_eq!(board.chip().exported(), vec![46, 47]);
        unexport(board.chip(), &[46, 48]).unwrap();
        assert_eq!(board.chip().exported(), vec![47]);
    }

    #[test]
    fn setup_from_sample_config() {
        let board = FakeBoard::new(&[]);
        let config = setup(board.chip(), &sample_config()).unwrap();
        assert_eq!(config.general.name, "duelio");
        assert_eq!(board.chip().exported(), GAME_LINES.to_vec());
        assert_eq!(board.direction(47), Some(Direction::Input));
        assert_eq!(board.direction(88), Some(Direction::Output));
        assert_eq!(board.direction(89), Some(Direction::Output));
    }

    #[test]
    fn check_sample_config() {
        let config = check_config(&sample_config()).unwrap();
        assert_eq!(config.general.poll_interval_ms, 1);
        let missing = Path::new(env!("CARGO_MANIFEST_DIR")).join("missing.json");
        assert!(matches!(
            check_config(&missing),
            Err(CliError::Config(ConfigError::Io(_)))
        ));
    }
}
