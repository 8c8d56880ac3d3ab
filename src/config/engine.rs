//! Run configuration.
//!
//! One immutable [`EngineConfig`] is built from the command line and passed
//! through the resolver, builder and engine.

use crate::error::{ConfigError, ConfigResult};
use crate::expander::ExpandOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent workers.
pub const DEFAULT_THREADS: usize = 5;

/// Default per-task timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Configuration shared by every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of tasks allowed to run at once.
    pub threads: usize,
    /// Wall-clock limit per task. The command line takes whole seconds.
    pub timeout: Duration,
    /// Directory substituted for `_output_` and used for output files.
    pub output_dir: Option<PathBuf>,
    /// Proxies handed out round-robin through `_proxy_`.
    pub proxies: Vec<String>,
    /// Directory whose files are drawn from for `_random_`.
    pub random_dir: Option<PathBuf>,
    /// Value substituted for `_proto_`.
    pub proto: Option<String>,
    /// Host expansion options.
    pub expand: ExpandOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: None,
            proxies: Vec::new(),
            random_dir: None,
            proto: None,
            expand: ExpandOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the per-task timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the proxy rotation.
    pub fn with_proxies(mut self, proxies: Vec<String>) -> Self {
        self.proxies = proxies;
        self
    }

    /// Set the `_random_` source directory.
    pub fn with_random_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.random_dir = Some(dir.into());
        self
    }

    /// Set the protocol string.
    pub fn with_proto(mut self, proto: impl Into<String>) -> Self {
        self.proto = Some(proto.into());
        self
    }

    /// Set the host expansion options.
    pub fn with_expand_options(mut self, expand: ExpandOptions) -> Self {
        self.expand = expand;
        self
    }

    /// Check limits before anything is resolved.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// The output directory as substituted for `_output_`, without a
    /// trailing `/`.
    pub fn output_placeholder(&self) -> Option<String> {
        self.output_dir.as_ref().map(|dir| {
            let dir = dir.to_string_lossy();
            match dir.trim_end_matches('/') {
                "" if dir.starts_with('/') => "/".to_string(),
                trimmed => trimmed.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.threads, 5);
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        assert!(matches!(
            EngineConfig::new().with_threads(0).validate(),
            Err(ConfigError::InvalidThreads)
        ));
        assert!(matches!(
            EngineConfig::new().with_timeout(Duration::ZERO).validate(),
            Err(ConfigError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_output_placeholder_strips_trailing_slash() {
        let config = EngineConfig::new().with_output_dir("/tmp/results/");
        assert_eq!(config.output_placeholder().as_deref(), Some("/tmp/results"));
        let config = EngineConfig::new().with_output_dir("/");
        assert_eq!(config.output_placeholder().as_deref(), Some("/"));
        assert_eq!(EngineConfig::new().output_placeholder(), None);
    }
}
