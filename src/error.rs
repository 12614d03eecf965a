use std::{io, path::PathBuf};

use thiserror::Error;

/// Problems with the four-integer input file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("configuration is missing the {0} value")]
    Missing(&'static str),
    #[error("configuration value for {field} is not an integer: `{value}'")]
    Invalid { field: &'static str, value: String },
    #[error("configuration value for {0} must be positive")]
    NotPositive(&'static str),
    #[error("{operatives} operatives cannot be split into units of {unit_size}")]
    Indivisible { operatives: u32, unit_size: u32 },
}

/// Everything that stops a run before any thread starts
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot open output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot start thread: {0}")]
    Spawn(#[source] io::Error),
}
