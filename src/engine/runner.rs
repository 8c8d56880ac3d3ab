//! External command execution.
//!
//! [`CommandRunner`] is the seam between the engine and the operating
//! system: run one command line, stop it when the token fires, hand back
//! whatever it produced. [`ShellRunner`] is the real implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How long pipes are drained after the shell exits.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// What happened to one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The process ran to completion.
    Exited {
        code: Option<i32>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// The token fired first and the process was killed.
    Cancelled,
    /// The process never started.
    SpawnFailed(String),
}

/// Runs a command line, honouring a cancellation token.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion, or kill it once `cancel` fires.
    async fn run(&self, command: &str, cancel: &CancellationToken) -> RunOutcome;
}

/// Runs commands through the platform shell (`sh -c` or `cmd /C`).
///
/// On Unix each command gets its own process group so that a timeout kills
/// the whole pipeline, not only the shell. Once the shell exits, whatever is
/// left in its group is killed too, so background jobs cannot hold the
/// pipes open and keep the task running.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
    flag: String,
}

impl ShellRunner {
    /// Use the platform default shell.
    pub fn new() -> Self {
        if cfg!(windows) {
            Self::with_shell("cmd", "/C")
        } else {
            Self::with_shell("sh", "-c")
        }
    }

    /// Use a specific shell and command flag.
    pub fn with_shell(shell: impl Into<PathBuf>, flag: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            flag: flag.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str, cancel: &CancellationToken) -> RunOutcome {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.flag)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return RunOutcome::SpawnFailed(e.to_string()),
        };

        let pid = child.id();
        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let status = {
            let reading = read_pipes(&mut stdout_pipe, &mut stderr_pipe, &mut stdout, &mut stderr);
            let waiting = child.wait();
            tokio::pin!(reading, waiting);

            let mut drained = false;
            loop {
                tokio::select! {
                    status = &mut waiting => break Some(status),
                    _ = &mut reading, if !drained => drained = true,
                    _ = cancel.cancelled() => break None,
                }
            }
        };

        let Some(status) = status else {
            terminate(&mut child).await;
            return RunOutcome::Cancelled;
        };

        kill_group(pid);
        let drain = read_pipes(&mut stdout_pipe, &mut stderr_pipe, &mut stdout, &mut stderr);
        if tokio::time::timeout(DRAIN_GRACE, drain).await.is_err() {
            debug!("output pipes still open after exit, keeping what was read");
        }
        exited(status, stdout, stderr)
    }
}

fn exited(status: std::io::Result<ExitStatus>, stdout: Vec<u8>, mut stderr: Vec<u8>) -> RunOutcome {
    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            stderr.extend_from_slice(format!("failed to wait for process: {e}").as_bytes());
            None
        }
    };
    RunOutcome::Exited {
        code,
        stdout,
        stderr,
    }
}

/// Read both pipes to EOF. Bytes read before the future is dropped stay in
/// the buffers, so it can be polled again later to pick up the rest.
async fn read_pipes<O, E>(
    stdout_pipe: &mut Option<O>,
    stderr_pipe: &mut Option<E>,
    stdout: &mut Vec<u8>,
    stderr: &mut Vec<u8>,
) where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    tokio::join!(read_into(stdout_pipe, stdout), read_into(stderr_pipe, stderr));
}

async fn read_into<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut Vec<u8>) {
    if let Some(reader) = pipe.as_mut() {
        if let Err(e) = reader.read_to_end(buf).await {
            debug!(error = %e, "stopped reading process output");
        }
    }
}

/// Send SIGKILL to the process group led by `pid`.
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid {
        // SAFETY: killpg only sends a signal. The group id stays reserved
        // while any member is alive; an empty group yields ESRCH.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

/// Kill the process group and the child itself, then reap it.
async fn terminate(child: &mut Child) {
    kill_group(child.id());

    if let Err(e) = child.kill().await {
        debug!(error = %e, "process already gone");
    }
}
