//! Runs the pipeline for one invocation: resolve, build, execute, report.

use super::Cli;
use crate::builder::TaskBuilder;
use crate::engine::Engine;
use crate::output::{print_warning, Reporter, RunSummary};
use crate::resolver::TargetResolver;
use anyhow::Context;
use futures::StreamExt;
use tokio::signal;
use tracing::info;

/// Execute the command line.
///
/// Configuration problems are returned before anything runs. Once the
/// engine starts, per-task failures only show up in the summary.
pub async fn execute(cli: &Cli) -> anyhow::Result<RunSummary> {
    let settings = cli.settings().context("failed to load settings")?;
    let config = cli.engine_config(&settings)?;
    let report = cli.report_options(&settings)?;

    if report.no_colour {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let targets = TargetResolver::new(config.expand)
        .resolve(&cli.target_source()?, cli.exclusion_source().as_ref())?;
    let ports = cli.ports()?;
    let real_ports = cli.real_ports()?;
    let commands = cli.command_source()?.entries("command")?;

    let tasks = TaskBuilder::new(&config)?.build(&targets, &ports, &real_ports, &commands)?;
    info!(
        tasks = tasks.len(),
        targets = targets.len(),
        threads = config.threads,
        "task queue built"
    );

    if let Some(dir) = &config.output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    }

    let engine = Engine::new(&config);
    let interrupt = {
        let stop = engine.stop_token();
        let abort = engine.abort_token();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_err() {
                return;
            }
            print_warning("interrupted, letting running commands finish (Ctrl-C again to kill them)");
            stop.cancel();

            if signal::ctrl_c().await.is_ok() {
                print_warning("killing running commands");
                abort.cancel();
            }
        })
    };

    let mut results = engine.run(tasks);
    let mut reporter = Reporter::stdout(report, results.total())?;
    while let Some(result) = results.next().await {
        reporter.record(&result)?;
    }
    let finished = results.finish().await;
    interrupt.abort();
    finished?;

    Ok(reporter.finish()?)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;
    use std::io::Write;

    #[tokio::test]
    async fn test_execute_creates_nested_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("out");
        let mut settings = tempfile::NamedTempFile::new().unwrap();
        write!(settings, "{{}}").unwrap();

        let mut args: Vec<OsString> = ["interlace", "-t", "localhost", "-c", "true", "-o"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(output.clone().into_os_string());
        args.extend(["--silent", "--no-bar", "--config"].map(OsString::from));
        args.push(settings.path().as_os_str().to_os_string());

        let cli = Cli::try_parse_from(args).unwrap();

        let summary = execute(&cli).await.unwrap();

        assert!(output.is_dir());
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.total, 1);
    }
}
