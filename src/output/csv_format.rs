//! CSV output: a header row, then one row per finished task.

use crate::types::{CapturedOutput, Completion, TaskResult};
use std::io::{self, Write};

const HEADER: [&str; 9] = [
    "id",
    "target",
    "port",
    "command",
    "status",
    "exit_code",
    "started_at",
    "elapsed_ms",
    "output",
];

/// Create a CSV writer and emit the header row.
pub fn writer<W: Write>(out: W) -> io::Result<csv::Writer<W>> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;
    Ok(wtr)
}

/// Write one result row.
pub fn write_result<W: Write>(wtr: &mut csv::Writer<W>, result: &TaskResult) -> io::Result<()> {
    let task = &result.task;
    let (status, exit_code) = match &result.completion {
        Completion::Completed(code) => ("completed", code.map_or(String::new(), |c| c.to_string())),
        Completion::TimedOut => ("timed_out", String::new()),
        Completion::Cancelled => ("cancelled", String::new()),
        Completion::SpawnFailed(_) => ("spawn_failed", String::new()),
    };
    let output = match &result.output {
        CapturedOutput::Empty => String::new(),
        CapturedOutput::Inline { stdout, .. } => stdout.clone(),
        CapturedOutput::File { path } => path.display().to_string(),
    };

    let id = task.id.to_string();
    let started_at = result.started_at.to_rfc3339();
    let elapsed_ms = result.elapsed_ms.to_string();
    wtr.write_record([
        id.as_str(),
        task.target.as_str(),
        task.port.as_deref().unwrap_or(""),
        task.command.as_str(),
        status,
        exit_code.as_str(),
        started_at.as_str(),
        elapsed_ms.as_str(),
        output.as_str(),
    ])?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Task;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_csv_rows() {
        let mut wtr = writer(Vec::new()).unwrap();
        let task = Task::new(0, "nmap 10.0.0.1", "10.0.0.1", Duration::from_secs(1));
        let result = TaskResult::new(task, Completion::TimedOut, Utc::now(), Duration::ZERO);
        write_result(&mut wtr, &result).unwrap();

        let bytes = wtr.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,target,port,command,status,exit_code,started_at,elapsed_ms,output")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("0,10.0.0.1,,nmap 10.0.0.1,timed_out,,"));
        assert!(lines.next().is_none());
    }
}
