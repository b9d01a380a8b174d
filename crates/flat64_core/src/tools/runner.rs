//! Low-level external command execution.
//!
//! Every external program runs through [`run_tool`]: explicit working
//! directory, captured output, and a uniform error type. The process-wide
//! working directory is never changed.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::process::{Command, Output};

use thiserror::Error;

/// Errors from launching or running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program is not installed or not on PATH.
    #[error("tool not found: {tool}")]
    NotFound { tool: String },

    /// The program exists but could not be started.
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The program ran and exited with a non-zero status.
    #[error("{tool} exited with status {exit_code}: {stderr}")]
    Failed {
        tool: String,
        exit_code: i32,
        stderr: String,
    },

    /// An I/O error while staging input for the program.
    #[error("failed to stage input for {tool}: {source}")]
    Staging {
        tool: String,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    /// The program name this error refers to.
    pub fn tool(&self) -> &str {
        match self {
            ToolError::NotFound { tool }
            | ToolError::Launch { tool, .. }
            | ToolError::Failed { tool, .. }
            | ToolError::Staging { tool, .. } => tool,
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Run an external tool and wait for it to finish.
///
/// `cwd` is the working directory for the child process; callers state it
/// explicitly because several of the wrapped tools write their output
/// relative to it. Output is captured, and a non-zero exit status becomes
/// a [`ToolError::Failed`] carrying the tool's stderr.
pub fn run_tool<I, S>(program: &str, args: I, cwd: &Path) -> ToolResult<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();

    tracing::debug!(
        "Running: {} {} (in {})",
        program,
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" "),
        cwd.display()
    );

    let output = Command::new(program)
        .args(&args)
        .current_dir(cwd)
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ToolError::NotFound {
                    tool: program.to_string(),
                }
            } else {
                ToolError::Launch {
                    tool: program.to_string(),
                    source: e,
                }
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ToolError::Failed {
            tool: program.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    Ok(output)
}
