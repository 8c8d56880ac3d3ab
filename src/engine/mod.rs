//! Execution engine - runs tasks on a fixed pool of workers.
//!
//! Tasks sit in one FIFO queue. `threads` workers each pop a task, run it
//! under its own timeout, push the result onto a channel and loop until the
//! queue is empty or the run is stopped. Nothing else bounds concurrency,
//! so at most `threads` processes are alive at any moment.
//!
//! Two tokens control a run. The stop token is checked before every dequeue
//! and lets running tasks finish; the abort token also kills them.

pub mod runner;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::types::{CapturedOutput, Completion, Task, TaskResult};
use chrono::Utc;
use futures::Stream;
use std::collections::VecDeque;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use runner::{CommandRunner, RunOutcome, ShellRunner};

type Queue = Arc<Mutex<VecDeque<Task>>>;

/// Runs tasks with bounded concurrency.
pub struct Engine {
    threads: usize,
    runner: Arc<dyn CommandRunner>,
    stop: CancellationToken,
    abort: CancellationToken,
}

impl Engine {
    /// Create an engine that runs commands through the platform shell.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threads: config.threads.max(1),
            runner: Arc::new(ShellRunner::new()),
            stop: CancellationToken::new(),
            abort: CancellationToken::new(),
        }
    }

    /// Replace the command runner.
    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// Token that stops dequeuing. Running tasks finish normally and the
    /// rest of the queue is dropped.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Token that stops dequeuing and kills every running process.
    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Start running `tasks` and return a stream of their results.
    ///
    /// Results arrive in completion order. Must be called from within a
    /// tokio runtime.
    pub fn run(&self, tasks: Vec<Task>) -> ResultStream {
        let total = tasks.len();
        let workers = self.threads.min(total);
        let (tx, rx) = mpsc::channel(workers.max(1).saturating_mul(2));
        let queue: Queue = Arc::new(Mutex::new(VecDeque::from(tasks)));

        info!(tasks = total, workers, "starting run");

        let runner = Arc::clone(&self.runner);
        let control = Control {
            stop: self.stop.clone(),
            abort: self.abort.clone(),
        };
        let supervisor = tokio::spawn(async move {
            let mut pool = JoinSet::new();
            for worker in 0..workers {
                pool.spawn(work(
                    worker,
                    Arc::clone(&queue),
                    Arc::clone(&runner),
                    tx.clone(),
                    control.clone(),
                ));
            }
            drop(tx);

            let mut failure = None;
            while let Some(joined) = pool.join_next().await {
                let outcome = joined.map_err(|e| EngineError::WorkerLost(e.to_string()));
                match outcome.and_then(|inner| inner) {
                    Ok(ran) => debug!(ran, "worker finished"),
                    Err(e) => {
                        warn!(error = %e, "worker failed");
                        control.stop.cancel();
                        failure.get_or_insert(e);
                    }
                }
            }

            match failure {
                Some(e) => Err(e),
                None => Ok(()),
            }
        });

        ResultStream {
            results: rx,
            supervisor,
            total,
        }
    }
}

/// Results of a run, in completion order.
///
/// Drain it with [`futures::StreamExt::next`], then call
/// [`ResultStream::finish`] to learn whether the engine itself failed.
pub struct ResultStream {
    results: mpsc::Receiver<TaskResult>,
    supervisor: JoinHandle<Result<(), EngineError>>,
    total: usize,
}

impl ResultStream {
    /// Number of tasks submitted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Wait for every worker to stop.
    pub async fn finish(self) -> Result<(), EngineError> {
        drop(self.results);
        self.supervisor
            .await
            .map_err(|e| EngineError::WorkerLost(e.to_string()))?
    }
}

impl Stream for ResultStream {
    type Item = TaskResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.results.poll_recv(cx)
    }
}

#[derive(Clone)]
struct Control {
    stop: CancellationToken,
    abort: CancellationToken,
}

impl Control {
    fn stopped(&self) -> bool {
        self.stop.is_cancelled() || self.abort.is_cancelled()
    }
}

async fn work(
    worker: usize,
    queue: Queue,
    runner: Arc<dyn CommandRunner>,
    results: mpsc::Sender<TaskResult>,
    control: Control,
) -> Result<usize, EngineError> {
    let mut ran = 0;
    loop {
        if control.stopped() {
            debug!(worker, "run stopped");
            break;
        }
        let next = queue
            .lock()
            .map_err(|_| EngineError::QueuePoisoned)?
            .pop_front();
        let Some(task) = next else {
            break;
        };

        let result = execute(task, runner.as_ref(), &control.abort).await;
        ran += 1;
        if results.send(result).await.is_err() {
            debug!(worker, "result receiver dropped");
            break;
        }
    }
    Ok(ran)
}

/// Run one task under its timeout.
async fn execute(task: Task, runner: &dyn CommandRunner, abort: &CancellationToken) -> TaskResult {
    let started_at = Utc::now();
    let start = Instant::now();

    // Fires on timeout or when the run is aborted.
    let deadline = abort.child_token();
    let timer = {
        let deadline = deadline.clone();
        let timeout = task.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            deadline.cancel();
        })
    };

    debug!(task = task.id, command = %task.command, "spawning");
    let outcome = runner.run(&task.command, &deadline).await;
    timer.abort();
    let elapsed = start.elapsed();

    match outcome {
        RunOutcome::Exited {
            code,
            stdout,
            stderr,
        } => {
            debug!(task = task.id, ?code, "exited");
            let output = capture(&task, &stdout, &stderr).await;
            TaskResult::new(task, Completion::Completed(code), started_at, elapsed)
                .with_output(output)
        }
        RunOutcome::Cancelled if abort.is_cancelled() => {
            debug!(task = task.id, "killed by abort");
            TaskResult::new(task, Completion::Cancelled, started_at, elapsed)
        }
        RunOutcome::Cancelled => {
            warn!(task = task.id, target = %task.target, "timed out, process killed");
            TaskResult::new(task, Completion::TimedOut, started_at, elapsed)
        }
        RunOutcome::SpawnFailed(reason) => {
            warn!(task = task.id, %reason, "spawn failed");
            TaskResult::new(task, Completion::SpawnFailed(reason), started_at, elapsed)
        }
    }
}

/// Write output to the task's file, or keep it inline.
async fn capture(task: &Task, stdout: &[u8], stderr: &[u8]) -> CapturedOutput {
    if let Some(path) = &task.output_file {
        match write_output(path, stdout, stderr).await {
            Ok(()) => return CapturedOutput::File { path: path.clone() },
            Err(e) => warn!(path = %path.display(), error = %e, "could not write output file"),
        }
    }

    CapturedOutput::Inline {
        stdout: String::from_utf8_lossy(stdout).into_owned(),
        stderr: String::from_utf8_lossy(stderr).into_owned(),
    }
}

async fn write_output(path: &Path, stdout: &[u8], stderr: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut content = Vec::with_capacity(stdout.len() + stderr.len());
    content.extend_from_slice(stdout);
    content.extend_from_slice(stderr);
    tokio::fs::write(path, content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Treats the command as a number of milliseconds to sleep, or fails to
    /// spawn when it is `fail`.
    #[derive(Default)]
    struct SleepRunner {
        active: AtomicUsize,
        peak: AtomicUsize,
        started: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for SleepRunner {
        async fn run(&self, command: &str, cancel: &CancellationToken) -> RunOutcome {
            if command == "fail" {
                return RunOutcome::SpawnFailed("no such file".to_string());
            }
            self.started.lock().unwrap().push(command.to_string());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let millis: u64 = command.parse().unwrap();
            let outcome = tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(millis)) => RunOutcome::Exited {
                    code: Some(0),
                    stdout: command.as_bytes().to_vec(),
                    stderr: Vec::new(),
                },
                _ = cancel.cancelled() => RunOutcome::Cancelled,
            };

            self.active.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    struct Shared(Arc<SleepRunner>);

    #[async_trait]
    impl CommandRunner for Shared {
        async fn run(&self, command: &str, cancel: &CancellationToken) -> RunOutcome {
            self.0.run(command, cancel).await
        }
    }

    fn tasks(commands: &[&str], timeout: Duration) -> Vec<Task> {
        commands
            .iter()
            .enumerate()
            .map(|(id, command)| Task::new(id, *command, "10.0.0.1", timeout))
            .collect()
    }

    async fn collect(mut stream: ResultStream) -> Vec<TaskResult> {
        let mut results = Vec::new();
        while let Some(result) = stream.next().await {
            results.push(result);
        }
        stream.finish().await.unwrap();
        results
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_threads() {
        let runner = Arc::new(SleepRunner::default());
        let engine = Engine::new(&EngineConfig::new().with_threads(3))
            .with_runner(Shared(Arc::clone(&runner)));

        let results = collect(engine.run(tasks(&["20"; 12], Duration::from_secs(5)))).await;

        assert_eq!(results.len(), 12);
        assert_eq!(runner.peak.load(Ordering::SeqCst), 3);
        assert!(results.iter().all(|r| r.completion.is_success()));
    }

    #[tokio::test]
    async fn test_single_worker_runs_in_queue_order() {
        let runner = Arc::new(SleepRunner::default());
        let engine = Engine::new(&EngineConfig::new().with_threads(1))
            .with_runner(Shared(Arc::clone(&runner)));

        let results = collect(engine.run(tasks(&["3", "1", "2"], Duration::from_secs(5)))).await;

        let ids: Vec<usize> = results.iter().map(|r| r.task.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(*runner.started.lock().unwrap(), vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_timeout_does_not_stop_the_run() {
        let engine = Engine::new(&EngineConfig::new().with_threads(1))
            .with_runner(SleepRunner::default());

        let results =
            collect(engine.run(tasks(&["10000", "1"], Duration::from_millis(50)))).await;

        assert_eq!(results[0].completion, Completion::TimedOut);
        assert_eq!(results[0].output, CapturedOutput::Empty);
        assert!(results[0].elapsed() < Duration::from_secs(5));
        assert!(results[1].completion.is_success());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_recorded() {
        let engine = Engine::new(&EngineConfig::new().with_threads(2))
            .with_runner(SleepRunner::default());

        let results = collect(engine.run(tasks(&["fail", "1"], Duration::from_secs(5)))).await;

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .any(|r| matches!(r.completion, Completion::SpawnFailed(_))));
        assert!(results.iter().any(|r| r.completion.is_success()));
    }

    #[tokio::test]
    async fn test_stopped_run_drops_queued_tasks() {
        let engine = Engine::new(&EngineConfig::new().with_threads(2))
            .with_runner(SleepRunner::default());
        engine.stop_token().cancel();

        let results = collect(engine.run(tasks(&["1", "1", "1"], Duration::from_secs(5)))).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_stop_lets_running_tasks_finish() {
        let engine = Engine::new(&EngineConfig::new().with_threads(2))
            .with_runner(SleepRunner::default());
        let stop = engine.stop_token();

        let mut stream = engine.run(tasks(&["200", "200", "200", "200"], Duration::from_secs(60)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.cancel();

        let mut results = Vec::new();
        while let Some(result) = stream.next().await {
            results.push(result);
        }
        stream.finish().await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.completion.is_success()));
    }

    #[tokio::test]
    async fn test_abort_kills_running_tasks() {
        let engine = Engine::new(&EngineConfig::new().with_threads(2))
            .with_runner(SleepRunner::default());
        let abort = engine.abort_token();

        let mut stream = engine.run(tasks(&["10000", "10000", "10000"], Duration::from_secs(60)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        abort.cancel();

        let mut results = Vec::new();
        while let Some(result) = stream.next().await {
            results.push(result);
        }
        stream.finish().await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.completion == Completion::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_run_finishes() {
        let engine = Engine::new(&EngineConfig::new());
        let stream = engine.run(Vec::new());
        assert_eq!(stream.total(), 0);
        assert!(collect(stream).await.is_empty());
    }

    #[tokio::test]
    async fn test_output_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("0_10.0.0.1.log");
        let task = Task::new(0, "5", "10.0.0.1", Duration::from_secs(5))
            .with_output_file(Some(path.clone()));

        let engine = Engine::new(&EngineConfig::new()).with_runner(SleepRunner::default());
        let results = collect(engine.run(vec![task])).await;

        assert_eq!(results[0].output, CapturedOutput::File { path: path.clone() });
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "5");
    }

    #[tokio::test]
    async fn test_huge_thread_count_is_bounded_by_tasks() {
        let runner = Arc::new(SleepRunner::default());
        let engine = Engine::new(&EngineConfig::new().with_threads(usize::MAX))
            .with_runner(Shared(Arc::clone(&runner)));

        let results = collect(engine.run(tasks(&["5", "5"], Duration::from_secs(5)))).await;

        assert_eq!(results.len(), 2);
        assert!(runner.peak.load(Ordering::SeqCst) <= 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_background_job_completes_with_output() {
        let engine = Engine::new(&EngineConfig::new());
        let results =
            collect(engine.run(tasks(&["echo hi; sleep 30 &"], Duration::from_secs(20)))).await;

        assert_eq!(results[0].completion, Completion::Completed(Some(0)));
        assert_eq!(
            results[0].output,
            CapturedOutput::Inline {
                stdout: "hi\n".to_string(),
                stderr: String::new(),
            }
        );
        assert!(results[0].elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_runner_inline_output() {
        let engine = Engine::new(&EngineConfig::new());
        let results = collect(engine.run(tasks(&["echo hello"], Duration::from_secs(5)))).await;

        assert_eq!(results[0].completion, Completion::Completed(Some(0)));
        assert_eq!(
            results[0].output,
            CapturedOutput::Inline {
                stdout: "hello\n".to_string(),
                stderr: String::new(),
            }
        );
    }
}
