//! Core type definitions shared by the resolver, builder and engine.

mod host;
mod input;
mod port;
mod task;

pub use host::HostSpec;
pub use input::{read_lines, InputSource, FILE_SENTINEL};
pub use port::{expand_ports, PortSpec};
pub use task::{CapturedOutput, Completion, Task, TaskResult};
