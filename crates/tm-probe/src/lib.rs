//! Media metadata extraction.
//!
//! [`MediaInfo`] is the immutable per-file descriptor the planner consumes;
//! [`probe_file`] fills it by parsing ffprobe's JSON output.

mod ffprobe;
mod types;

pub use ffprobe::probe_file;
pub use types::{AudioStream, MediaInfo, SubtitleStream, VideoStream};
