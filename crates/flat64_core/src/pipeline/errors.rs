//! Error types for the conversion pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tools::ToolError;

/// Fatal error that aborts a run.
///
/// Tool failures only show up here when the error policy says to halt;
/// under the ignore policy they are logged, counted, and the source file
/// is kept verbatim instead.
#[derive(Error, Debug)]
pub enum RunError {
    /// File I/O failed.
    #[error("I/O error while {operation} '{path}': {source}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An external tool failed and the policy is to halt.
    #[error("while processing '{path}': {source}")]
    Tool {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    /// The user declined to continue after a tool failure.
    #[error("run aborted by user after tool failure on '{path}'")]
    Aborted { path: PathBuf },
}

impl RunError {
    /// Create an I/O error with operation context.
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a halting tool error.
    pub fn tool(path: impl Into<PathBuf>, source: ToolError) -> Self {
        Self::Tool {
            path: path.into(),
            source,
        }
    }

    /// Create an aborted-by-user error.
    pub fn aborted(path: impl Into<PathBuf>) -> Self {
        Self::Aborted { path: path.into() }
    }
}

/// Result type for pipeline operations.
pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_displays_context() {
        let err = RunError::io(
            "copying",
            "/src/game.prg",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("copying"));
        assert!(msg.contains("/src/game.prg"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn tool_error_displays_path() {
        let err = RunError::tool(
            "/src/pack.zip",
            ToolError::Failed {
                tool: "unzip".to_string(),
                exit_code: 9,
                stderr: "bad archive".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("/src/pack.zip"));
        assert!(msg.contains("unzip"));
    }
}
