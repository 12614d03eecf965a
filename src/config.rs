//! # Configuration
//!
//! The input is four whitespace-separated integers:
//! population size, unit size, station work units and logbook work units.

use std::{fs, path::Path};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// how many operatives take part, N
    pub operatives: u32,
    /// operatives per unit, M
    pub unit_size: u32,
    /// work units spent at a station
    pub station_work: u32,
    /// work units a leader spends writing the logbook
    pub log_work: u32,
}

const FIELDS: [&str; 4] = ["operatives", "unit_size", "station_work", "log_work"];

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Trailing tokens after the 4th value are ignored.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut tokens = text.split_whitespace();
        let mut values = [0u32; 4];
        for (slot, field) in values.iter_mut().zip(FIELDS) {
            let token = tokens.next().ok_or(ConfigError::Missing(field))?;
            *slot = token.parse().map_err(|_| ConfigError::Invalid {
                field,
                value: token.to_string(),
            })?;
            if *slot == 0 {
                return Err(ConfigError::NotPositive(field));
            }
        }
        let [operatives, unit_size, station_work, log_work] = values;
        if operatives % unit_size != 0 {
            return Err(ConfigError::Indivisible {
                operatives,
                unit_size,
            });
        }
        Ok(Self {
            operatives,
            unit_size,
            station_work,
            log_work,
        })
    }

    pub fn unit_count(&self) -> usize {
        (self.operatives / self.unit_size) as usize
    }
}
