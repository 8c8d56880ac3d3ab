//! Error types for interlace.
//!
//! Uses `thiserror` for ergonomic error definitions. Configuration and range
//! errors abort a run before any task executes; per-task failures never show
//! up here, they are recorded in the result stream instead.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or missing input detected while preparing a run.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required input: {0}")]
    MissingInput(&'static str),

    #[error("empty {0} specification")]
    EmptySpec(&'static str),

    #[error("no tasks to run: {0}")]
    EmptyTaskProduct(String),

    #[error(
        "realport list has {real_ports} entries but port list has {ports}; \
         _realport_ is only paired positionally with lists of equal length"
    )]
    RealPortMismatch { ports: usize, real_ports: usize },

    #[error("thread count must be at least 1")]
    InvalidThreads,

    #[error("timeout must be greater than zero")]
    InvalidTimeout,

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("could not determine the configuration directory")]
    DirectoryNotFound,
}

/// An invalid numeric range in a host or port specification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid port range {start}-{end}: start must be lower than end")]
    PortOrder { start: i64, end: i64 },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("invalid address range: {0}")]
    InvalidRange(String),

    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    #[error("'{spec}' expands to {count} hosts (max: {max})")]
    TooLarge { spec: String, count: u64, max: u64 },
}

/// Failures that stop the execution engine itself.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("worker stopped unexpectedly: {0}")]
    WorkerLost(String),

    #[error("task queue lock poisoned")]
    QueuePoisoned,
}

/// Umbrella error returned by the resolve → build → run pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Result type alias for configuration handling.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for range expansion.
pub type RangeResult<T> = std::result::Result<T, RangeError>;

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}
