//! JSON lines output: one object per finished task.

use crate::types::TaskResult;
use std::io::{self, Write};

/// Write one result as a single JSON line.
pub fn write_result<W: Write>(out: &mut W, result: &TaskResult) -> io::Result<()> {
    serde_json::to_writer(&mut *out, result)?;
    writeln!(out)
}
