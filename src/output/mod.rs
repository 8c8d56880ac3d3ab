//! Output formatting module.
//!
//! [`Reporter`] consumes the engine's result stream: it renders each result
//! in the chosen [`OutputFormat`], drives the progress bar and keeps the
//! [`RunSummary`].

mod csv_format;
mod json_format;
mod plain;
mod summary;

pub use plain::{print_error, print_summary, print_warning};
pub use summary::RunSummary;

use crate::types::TaskResult;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Instant;

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// One JSON object per line
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// How results are presented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub format: OutputFormat,
    /// Only command output, no status lines, bar or summary.
    pub silent: bool,
    /// Echo each command under its status line.
    pub verbose: bool,
    /// Strip ANSI sequences from command output.
    pub no_colour: bool,
    /// Hide the progress bar.
    pub no_bar: bool,
}

enum Sink<W: Write> {
    Plain(W),
    Json(W),
    Csv(csv::Writer<W>),
}

impl<W: Write> Sink<W> {
    fn write(&mut self, result: &TaskResult, options: &ReportOptions) -> io::Result<()> {
        match self {
            Self::Plain(out) => {
                plain::write_result(out, result, options)?;
                out.flush()
            }
            Self::Json(out) => {
                json_format::write_result(out, result)?;
                out.flush()
            }
            Self::Csv(wtr) => csv_format::write_result(wtr, result),
        }
    }
}

/// Renders results as they arrive.
pub struct Reporter<W: Write> {
    sink: Sink<W>,
    options: ReportOptions,
    progress: Option<ProgressBar>,
    summary: RunSummary,
    started: Instant,
}

impl Reporter<io::Stdout> {
    /// Report to standard output.
    pub fn stdout(options: ReportOptions, total: usize) -> io::Result<Self> {
        Self::new(io::stdout(), options, total)
    }
}

impl<W: Write> Reporter<W> {
    /// Report a run of `total` tasks to `out`.
    pub fn new(out: W, options: ReportOptions, total: usize) -> io::Result<Self> {
        let sink = match options.format {
            OutputFormat::Plain => Sink::Plain(out),
            OutputFormat::Json => Sink::Json(out),
            OutputFormat::Csv => Sink::Csv(csv_format::writer(out)?),
        };

        let progress = if options.silent || options.no_bar || total == 0 {
            None
        } else {
            Some(progress_bar(total))
        };

        Ok(Self {
            sink,
            options,
            progress,
            summary: RunSummary::new(total),
            started: Instant::now(),
        })
    }

    /// Render one result and advance the bar.
    pub fn record(&mut self, result: &TaskResult) -> io::Result<()> {
        self.summary.record(&result.completion);

        match &self.progress {
            Some(pb) => {
                pb.suspend(|| self.sink.write(result, &self.options))?;
                pb.set_message(result.task.label());
                pb.inc(1);
            }
            None => self.sink.write(result, &self.options)?,
        }
        Ok(())
    }

    /// Totals so far.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Close the bar and print the summary unless silent.
    pub fn finish(mut self) -> io::Result<RunSummary> {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        if let Sink::Csv(wtr) = &mut self.sink {
            wtr.flush()?;
        }

        self.summary.set_elapsed(self.started.elapsed());
        if !self.options.silent {
            print_summary(&self.summary);
        }
        Ok(self.summary)
    }
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    )
    .map(|style| style.progress_chars("=>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
