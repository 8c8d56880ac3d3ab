//! Plain text output formatting.
//!
//! One status line per finished task followed by whatever the command
//! printed. Status lines are coloured with `console`; command output is
//! passed through untouched unless colours are turned off.

use super::summary::RunSummary;
use super::ReportOptions;
use crate::types::{CapturedOutput, Completion, TaskResult};
use console::{style, Style};
use std::io::{self, Write};

/// Write one finished task.
pub fn write_result<W: Write>(
    out: &mut W,
    result: &TaskResult,
    options: &ReportOptions,
) -> io::Result<()> {
    let task = &result.task;

    if !options.silent {
        let (marker, marker_style) = match &result.completion {
            Completion::Completed(_) if result.completion.is_success() => {
                ("✓", Style::new().green().bold())
            }
            Completion::Completed(_) => ("✗", Style::new().red().bold()),
            Completion::TimedOut | Completion::Cancelled => ("!", Style::new().yellow().bold()),
            Completion::SpawnFailed(_) => ("✗", Style::new().red()),
        };

        writeln!(
            out,
            "{} {} {} {} {}",
            marker_style.apply_to(marker),
            style(format!("[{}]", task.id)).dim(),
            style(task.label()).bold(),
            marker_style.apply_to(result.completion.to_string()),
            style(format!("({:.2}s)", result.elapsed().as_secs_f64())).dim()
        )?;

        if options.verbose {
            writeln!(out, "  {} {}", style("$").dim(), task.command)?;
        }
    }

    match &result.output {
        CapturedOutput::Empty => {}
        CapturedOutput::Inline { stdout, stderr } => {
            write_captured(out, stdout, options.no_colour)?;
            write_captured(out, stderr, options.no_colour)?;
        }
        CapturedOutput::File { path } => {
            if !options.silent {
                writeln!(out, "  {} {}", style("→").dim(), path.display())?;
            }
        }
    }

    Ok(())
}

fn write_captured<W: Write>(out: &mut W, text: &str, no_colour: bool) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    if no_colour {
        write!(out, "{}", console::strip_ansi_codes(text))?;
    } else {
        write!(out, "{text}")?;
    }
    if !text.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

/// Print the end-of-run summary to stderr.
pub fn print_summary(summary: &RunSummary) {
    eprintln!();
    eprintln!(
        "{} {} tasks in {:.2}s",
        style("Finished").cyan().bold(),
        summary.finished(),
        summary.elapsed().as_secs_f64()
    );
    eprintln!(
        "  {} succeeded, {} failed, {} timed out, {} spawn failures",
        style(summary.succeeded).green().bold(),
        style(summary.failed).red(),
        style(summary.timed_out).yellow(),
        style(summary.spawn_failed).red()
    );
    if summary.cancelled > 0 || summary.skipped() > 0 {
        eprintln!(
            "  {} cancelled, {} never started",
            style(summary.cancelled).yellow(),
            style(summary.skipped()).dim()
        );
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
