//! External tool plumbing: discovery of ffmpeg/ffprobe and a builder for
//! executing them with timeout, cancellation, and captured output.

mod command;
mod tools;

pub use command::{ToolCommand, ToolOutput};
pub use tools::{ToolInfo, ToolRegistry};
