//! Units of work and their outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One fully substituted command, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    /// Position in the queue; unique and increasing from 0.
    pub id: usize,
    /// Command with every recognized placeholder replaced.
    pub command: String,
    /// Target host this task was built for.
    pub target: String,
    /// Port this task was built for, if ports were given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Real port paired with `port`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_port: Option<String>,
    /// Proxy assigned by rotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Where captured output goes when an output directory is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    /// Wall-clock budget for the process.
    #[serde(skip)]
    pub timeout: Duration,
}

impl Task {
    /// Create a task with no port, proxy or output file.
    pub fn new(
        id: usize,
        command: impl Into<String>,
        target: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            id,
            command: command.into(),
            target: target.into(),
            port: None,
            real_port: None,
            proxy: None,
            output_file: None,
            timeout,
        }
    }

    /// Set the port.
    pub fn with_port(mut self, port: Option<String>) -> Self {
        self.port = port;
        self
    }

    /// Set the paired real port.
    pub fn with_real_port(mut self, real_port: Option<String>) -> Self {
        self.real_port = real_port;
        self
    }

    /// Set the proxy.
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Set the output file hint.
    pub fn with_output_file(mut self, path: Option<PathBuf>) -> Self {
        self.output_file = path;
        self
    }

    /// `target` or `target:port`, for progress and log lines.
    pub fn label(&self) -> String {
        match &self.port {
            Some(port) => format!("{}:{}", self.target, port),
            None => self.target.clone(),
        }
    }
}

/// Terminal state of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Completion {
    /// The process exited; `None` when it was ended by a signal.
    Completed(Option<i32>),
    /// The timeout elapsed and the process was killed.
    TimedOut,
    /// The run was interrupted while this task was running.
    Cancelled,
    /// The process could not be started.
    SpawnFailed(String),
}

impl Completion {
    /// Exited with status zero.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed(Some(0)))
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(Some(code)) => write!(f, "exit {code}"),
            Self::Completed(None) => write!(f, "killed by signal"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::SpawnFailed(reason) => write!(f, "spawn failed: {reason}"),
        }
    }
}

/// Output captured from a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapturedOutput {
    /// Nothing was captured (timeout, cancellation, spawn failure).
    Empty,
    /// Output held in memory.
    Inline { stdout: String, stderr: String },
    /// Output written to the task's output file.
    File { path: PathBuf },
}

/// Outcome of running one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task: Task,
    pub completion: Completion,
    pub output: CapturedOutput,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl TaskResult {
    /// Create a result with no captured output.
    pub fn new(
        task: Task,
        completion: Completion,
        started_at: DateTime<Utc>,
        elapsed: Duration,
    ) -> Self {
        Self {
            task,
            completion,
            output: CapturedOutput::Empty,
            started_at,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Attach captured output.
    pub fn with_output(mut self, output: CapturedOutput) -> Self {
        self.output = output;
        self
    }

    /// Time spent between spawn and terminal state.
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_label() {
        let task = Task::new(0, "echo", "10.0.0.1", Duration::from_secs(1));
        assert_eq!(task.label(), "10.0.0.1");
        let task = task.with_port(Some("80".to_string()));
        assert_eq!(task.label(), "10.0.0.1:80");
    }

    #[test]
    fn test_completion_display() {
        assert_eq!(Completion::Completed(Some(3)).to_string(), "exit 3");
        assert_eq!(Completion::TimedOut.to_string(), "timed out");
        assert!(Completion::Completed(Some(0)).is_success());
        assert!(!Completion::TimedOut.is_success());
    }

    #[test]
    fn test_completion_serialization() {
        let json = serde_json::to_string(&Completion::Completed(Some(0))).unwrap();
        assert_eq!(json, r#"{"status":"completed","detail":0}"#);
        let json = serde_json::to_string(&Completion::TimedOut).unwrap();
        assert_eq!(json, r#"{"status":"timed_out"}"#);
    }
}
