//! Unified error type for the transmog workspace.
//!
//! All crates funnel their failures into [`Error`]; per-file failures are
//! resolved or reported at single-file granularity by the batch processor.

/// Unified error type covering all failure modes in transmog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be parsed or is invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) could not be located or spawned.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Media probing failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// A plan could not be built for a file.
    #[error("Plan error: {0}")]
    Plan(String),

    /// The retry engine hit an unrecoverable condition.
    #[error("Engine error [{stage}]: {message}")]
    Engine {
        /// The engine stage that failed.
        stage: String,
        /// Human-readable error description.
        message: String,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Engine`].
    pub fn engine(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Engine {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
