//! Error types for tonearm-av.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving external audio tools.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// A probe invocation produced no usable output at all.
    #[error("probe produced no output")]
    ProbeFailed,

    /// A command template rendered to nothing.
    #[error("empty command template")]
    EmptyTemplate,

    /// An external tool exited abnormally or could not be driven.
    #[error("{tool} failed: {message}")]
    SubprocessFailed { tool: String, message: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a subprocess failure error.
    pub fn subprocess_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SubprocessFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
