//! # Interlace - command fan-out across hosts and ports
//!
//! Interlace takes target specs, command templates and ports, builds one
//! fully substituted command per combination and runs them on a fixed pool
//! of workers with a per-command timeout.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use interlace::builder::TaskBuilder;
//! use interlace::config::EngineConfig;
//! use interlace::engine::Engine;
//! use interlace::resolver::TargetResolver;
//! use interlace::types::{InputSource, PortSpec};
//!
//! #[tokio::main]
//! async fn main() -> interlace::Result<()> {
//!     let config = EngineConfig::new().with_threads(10);
//!     let targets = TargetResolver::new(config.expand).resolve(
//!         &InputSource::Literal("192.168.1.0/28".to_string()),
//!         Some(&InputSource::Literal("192.168.1.1".to_string())),
//!     )?;
//!     let ports: PortSpec = "22,80".parse()?;
//!     let commands = vec!["nc -zv _target_ _port_".to_string()];
//!
//!     let tasks = TaskBuilder::new(&config)?.build(
//!         &targets,
//!         &ports,
//!         &PortSpec::new(),
//!         &commands,
//!     )?;
//!
//!     let mut results = Engine::new(&config).run(tasks);
//!     while let Some(result) = results.next().await {
//!         println!("{} {}", result.task.label(), result.completion);
//!     }
//!     results.finish().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`expander`] - host spec expansion (CIDR, dash ranges, globs)
//! - [`resolver`] - targets minus exclusions
//! - [`builder`] - the task queue and placeholder substitution
//! - [`engine`] - the worker pool, timeouts and output capture
//! - [`output`] - result formats, progress bar and run summary
//! - [`config`] - run configuration and user settings
//! - [`cli`] - the command line
//! - [`error`] - error types

pub mod builder;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod expander;
pub mod output;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use builder::TaskBuilder;
pub use config::EngineConfig;
pub use engine::{CommandRunner, Engine, ResultStream, ShellRunner};
pub use error::{ConfigError, EngineError, Error, RangeError, Result};
pub use resolver::TargetResolver;
pub use types::{Completion, InputSource, PortSpec, Task, TaskResult};
