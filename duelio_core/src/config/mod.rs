use crate::game::{GameLines, Indicator, Sensor};
use crate::hardware::dummy::DummyLine;
use crate::hardware::sysfs::SysfsGpio;
use crate::hardware::{Direction, GpioChip, GpioLine, HardwareError, LineId, Polarity};
use crate::logger::LogLevel;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Main game configuration
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GameConfig {
    pub general: General,
    pub lines: Lines,
}

impl GameConfig {
    pub fn try_new(config_file: &Path) -> Result<GameConfig, ConfigError> {
        let config_string = fs::read_to_string(config_file)?;
        GameConfig::from_json(&config_string)
    }

    pub fn from_json(config_string: &str) -> Result<GameConfig, ConfigError> {
        let conf_presumptive: GameConfig = serde_json::from_str(config_string)
            .map_err(|err| ConfigError::Parse(err.to_string()))?;
        GameConfig::validate(conf_presumptive)
    }

    /// Config with random dummy sensors, for running without hardware.
    pub fn dummy() -> GameConfig {
        GameConfig {
            general: General::default(),
            lines: Lines {
                sensor1: LineConfig::dummy(0.001),
                sensor2: LineConfig::dummy(0.001),
                reset: LineConfig::dummy(0.0005),
                led1: LineConfig::dummy(0.0),
                led2: LineConfig::dummy(0.0),
            },
        }
    }

    fn validate(pres: GameConfig) -> Result<GameConfig, ConfigError> {
        if pres.general.poll_interval_ms == 0 {
            return Err(ConfigError::Config(String::from(
                "Poll interval must be positive",
            )));
        }
        if !pres.lines.unique_numbers() {
            return Err(ConfigError::Config(String::from(
                "Non-unique sysfs line numbers",
            )));
        }
        if let Some((role, _)) = pres
            .lines
            .roles()
            .into_iter()
            .find(|(_, line)| !line.type_.is_valid())
        {
            return Err(ConfigError::Config(format!(
                "Dummy probability for '{}' must be within [0, 1]",
                role.id()
            )));
        }
        Ok(pres)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.general.poll_interval_ms)
    }

    /// Export every sysfs line and set its direction.
    pub fn setup_lines(&self) -> Result<(), HardwareError> {
        self.setup_lines_with(&SysfsGpio)
    }

    pub fn setup_lines_with<C: GpioChip>(&self, chip: &C) -> Result<(), HardwareError> {
        for (role, line) in self.lines.roles() {
            if let LineType::Sysfs(number) = line.type_ {
                chip.setup_line(number, role.id(), role.direction())?;
                debug!("Set up gpio{} as '{}'", number, role.id());
            }
        }
        Ok(())
    }

    /// Open the five game lines, which must already be set up.
    pub fn create_lines(&self) -> Result<GameLines, HardwareError> {
        self.create_lines_with(&SysfsGpio)
    }

    pub fn create_lines_with<C: GpioChip>(&self, chip: &C) -> Result<GameLines, HardwareError> {
        let lines = &self.lines;
        Ok(GameLines {
            sensor1: lines.sensor1.create_sensor(LineRole::Sensor1, chip)?,
            sensor2: lines.sensor2.create_sensor(LineRole::Sensor2, chip)?,
            reset: lines.reset.create_sensor(LineRole::Reset, chip)?,
            led1: lines.led1.create_indicator(LineRole::Led1, chip)?,
            led2: lines.led2.create_indicator(LineRole::Led2, chip)?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct General {
    pub name: String,
    pub log_level: LogLevel,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    crate::time::LOOP_PAUSE_TIME.as_millis() as u64
}

impl Default for General {
    fn default() -> Self {
        General {
            name: "No name".into(),
            log_level: LogLevel::Info,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Role of a line in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Sensor1,
    Sensor2,
    Reset,
    Led1,
    Led2,
}

impl LineRole {
    pub fn id(&self) -> LineId {
        let id = match self {
            LineRole::Sensor1 => "sensor1",
            LineRole::Sensor2 => "sensor2",
            LineRole::Reset => "reset",
            LineRole::Led1 => "led1",
            LineRole::Led2 => "led2",
        };
        LineId::from(id)
    }

    pub fn direction(&self) -> Direction {
        match self {
            LineRole::Sensor1 | LineRole::Sensor2 | LineRole::Reset => Direction::Input,
            LineRole::Led1 | LineRole::Led2 => Direction::Output,
        }
    }

    /// Sensors pull low when triggered, LEDs light when driven high.
    fn default_active_low(&self) -> bool {
        self.direction() == Direction::Input
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Lines {
    pub sensor1: LineConfig,
    pub sensor2: LineConfig,
    pub reset: LineConfig,
    pub led1: LineConfig,
    pub led2: LineConfig,
}

impl Default for Lines {
    fn default() -> Self {
        Lines {
            sensor1: LineConfig::sysfs(46),
            sensor2: LineConfig::sysfs(47),
            reset: LineConfig::sysfs(48),
            led1: LineConfig::sysfs(88),
            led2: LineConfig::sysfs(89),
        }
    }
}

impl Lines {
    pub fn roles(&self) -> [(LineRole, &LineConfig); 5] {
        [
            (LineRole::Sensor1, &self.sensor1),
            (LineRole::Sensor2, &self.sensor2),
            (LineRole::Reset, &self.reset),
            (LineRole::Led1, &self.led1),
            (LineRole::Led2, &self.led2),
        ]
    }

    fn unique_numbers(&self) -> bool {
        let numbers: Vec<u32> = self
            .roles()
            .iter()
            .filter_map(|(_, line)| match line.type_ {
                LineType::Sysfs(number) => Some(number),
                LineType::Dummy(_) => None,
            })
            .collect();
        numbers.iter().unique().count() == numbers.len()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum LineType {
    #[serde(rename = "sysfs")]
    Sysfs(u32),
    /// Probability of the line reading asserted on each poll.
    #[serde(rename = "dummy")]
    Dummy(f64),
}

impl LineType {
    fn is_valid(&self) -> bool {
        match self {
            LineType::Sysfs(_) => true,
            LineType::Dummy(probability) => (0.0..=1.0).contains(probability),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LineConfig {
    #[serde(rename = "type")]
    pub type_: LineType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_low: Option<bool>,
}

impl LineConfig {
    pub fn sysfs(number: u32) -> Self {
        LineConfig {
            type_: LineType::Sysfs(number),
            active_low: None,
        }
    }

    pub fn dummy(probability: f64) -> Self {
        LineConfig {
            type_: LineType::Dummy(probability),
            active_low: None,
        }
    }

    pub fn polarity(&self, role: LineRole) -> Polarity {
        Polarity::from_active_low(self.active_low.unwrap_or(role.default_active_low()))
    }

    /// Open the line for `role`.
    ///
    /// The line types cannot be known before the config is read, hence the dynamic dispatch.
    pub fn create_line<C: GpioChip>(
        &self,
        role: LineRole,
        chip: &C,
    ) -> Result<Box<dyn GpioLine>, HardwareError> {
        match &self.type_ {
            LineType::Sysfs(number) => {
                let line = chip.line(*number, role.id(), role.direction())?;
                Ok(Box::new(line))
            }
            LineType::Dummy(probability) => {
                let idle = self.polarity(role).level_for(false);
                let line = match role.direction() {
                    Direction::Input => {
                        DummyLine::random(role.id(), role.direction(), *probability, !idle)
                    }
                    Direction::Output => DummyLine::new(role.id(), role.direction(), idle),
                };
                Ok(Box::new(line))
            }
        }
    }

    fn create_sensor<C: GpioChip>(
        &self,
        role: LineRole,
        chip: &C,
    ) -> Result<Sensor, HardwareError> {
        Ok(Sensor::new(self.create_line(role, chip)?, self.polarity(role)))
    }

    fn create_indicator<C: GpioChip>(
        &self,
        role: LineRole,
        chip: &C,
    ) -> Result<Indicator, HardwareError> {
        Ok(Indicator::new(
            self.create_line(role, chip)?,
            self.polarity(role),
        ))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error opening config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod game_config_tests {
    use super::*;
    use crate::game::{GameController, GameState};
    use crate::hardware::dummy::DummyChip;
    use crate::hardware::Level;

    const PARSE_STRING: &str = r#"
                {
                  "general": {
                    "name": "DUELLO",
                    "log_level": "debug"
                  },
                  "lines": {
                    "sensor1": {"type": {"sysfs": 46}},
                    "sensor2": {"type": {"sysfs": 47}},
                    "reset": {"type": {"sysfs": 48}},
                    "led1": {"type": {"sysfs": 88}},
                    "led2": {"type": {"sysfs": 89}, "active_low": true}
                  }
                }
            "#;

    #[test]
    fn test_parse() {
        let config = GameConfig::from_json(PARSE_STRING).unwrap();
        assert_eq!(config.general.poll_interval_ms, 1);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
        assert!(config.general.log_level.is_debug());
        assert_eq!(config.lines.reset.type_, LineType::Sysfs(48));
    }

    #[test]
    fn test_polarity_defaults() {
        let config = GameConfig::from_json(PARSE_STRING).unwrap();
        let lines = &config.lines;
        assert_eq!(
            lines.sensor1.polarity(LineRole::Sensor1),
            Polarity::ActiveLow
        );
        assert_eq!(lines.led1.polarity(LineRole::Led1), Polarity::ActiveHigh);
        assert_eq!(lines.led2.polarity(LineRole::Led2), Polarity::ActiveLow);
    }

    #[test]
    fn test_duplicate_numbers() {
        let config = PARSE_STRING.replace("\"sysfs\": 47", "\"sysfs\": 46");
        assert!(matches!(
            GameConfig::from_json(&config),
            Err(ConfigError::Config(_))
        ));
    }

    #[test]
    fn test_zero_interval() {
        let config = PARSE_STRING.replace(
            "\"log_level\": \"debug\"",
            "\"log_level\": \"debug\", \"poll_interval_ms\": 0",
        );
        assert!(matches!(
            GameConfig::from_json(&config),
            Err(ConfigError::Config(_))
        ));
    }

    #[test]
    fn test_bad_probability() {
        let config = PARSE_STRING.replace("{\"sysfs\": 48}", "{\"dummy\": 1.5}");
        assert!(matches!(
            GameConfig::from_json(&config),
            Err(ConfigError::Config(_))
        ));
    }

    #[test]
    fn test_garbage() {
        assert!(matches!(
            GameConfig::from_json("{\"general\": 3}"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_sysfs_lines() {
        let config = GameConfig::from_json(PARSE_STRING).unwrap();
        let chip = DummyChip::new(&[46, 47, 48, 88]);
        let err = config.create_lines_with(&chip).err().unwrap();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_setup_then_create() {
        let config = GameConfig::from_json(PARSE_STRING).unwrap();
        let chip = DummyChip::default();
        config.setup_lines_with(&chip).unwrap();
        assert_eq!(chip.exported(), vec![46, 47, 48, 88, 89]);
        let led1 = chip.handle(88).unwrap();
        assert_eq!(led1.direction(), Some(Direction::Output));
        assert_eq!(chip.handle(47).unwrap().direction(), Some(Direction::Input));

        let controller = GameController::new(config.create_lines_with(&chip).unwrap());
        assert_eq!(controller.state(), GameState::Idle);
        assert_eq!(led1.level(), Level::High);
        // led2 is configured active low, so lit means driven low.
        assert_eq!(chip.handle(89).unwrap().level(), Level::Low);
    }

    #[test]
    fn test_sample_config() {
        let sample = Path::new(env!("CARGO_MANIFEST_DIR")).join("../sample-duelio.json");
        let config = GameConfig::try_new(&sample).unwrap();
        assert_eq!(config.general.name, "duelio");
        assert_eq!(config.lines.sensor1.type_, LineType::Sysfs(46));
        assert_eq!(config.lines.led2.type_, LineType::Sysfs(89));
    }

    #[test]
    fn test_missing_file() {
        let missing = Path::new(env!("CARGO_MANIFEST_DIR")).join("no-such-config.json");
        assert!(matches!(
            GameConfig::try_new(&missing),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_default_lines() {
        let lines = Lines::default();
        assert_eq!(lines.led2.type_, LineType::Sysfs(89));
        assert!(lines.unique_numbers());
    }

    #[test]
    fn test_dummy_game() {
        let mut config = GameConfig::dummy();
        config.lines.sensor1 = LineConfig::dummy(1.0);
        config.lines.reset = LineConfig::dummy(0.0);
        let config = GameConfig::validate(config).unwrap();
        let mut controller = GameController::new(config.create_lines().unwrap());
        assert_eq!(controller.lines().led1.is_lit(), Some(true));
        controller.poll();
        assert_eq!(controller.state(), GameState::Player1Won);
        assert_eq!(controller.lines().led1.is_lit(), Some(false));
        assert_eq!(controller.lines().led2.is_lit(), Some(true));
    }
}
