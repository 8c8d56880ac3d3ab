//! Configuration management for interlace.
//!
//! [`EngineConfig`] is the immutable per-run configuration; [`AppSettings`]
//! holds user defaults loaded from the XDG config directory.

mod engine;
mod settings;

pub use engine::{EngineConfig, DEFAULT_THREADS, DEFAULT_TIMEOUT_SECS};
pub use settings::{AppSettings, Paths};
