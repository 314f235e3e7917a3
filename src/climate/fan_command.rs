use std::fmt;
use std::str::FromStr;

use anyhow::{Error, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanCommand {
    On,
    Off,
}

impl FanCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanCommand::On => "ON",
            FanCommand::Off => "OFF",
        }
    }
}

impl fmt::Display for FanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ON" | "on" => Ok(FanCommand::On),
            "OFF" | "off" => Ok(FanCommand::Off),
            _ => bail!("unknown fan command: {}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_cases() {
        assert_eq!("ON".parse::<FanCommand>().unwrap(), FanCommand::On);
        assert_eq!("off".parse::<FanCommand>().unwrap(), FanCommand::Off);
        assert_eq!("OFF\n".parse::<FanCommand>().unwrap(), FanCommand::Off);
        assert!("toggle".parse::<FanCommand>().is_err());
    }
}
