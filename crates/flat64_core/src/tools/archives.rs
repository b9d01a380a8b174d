//! Wrappers for the general-purpose archive tools.
//!
//! Each wrapper extracts one archive into a workspace directory. Paths
//! handed to the tools are kept as `OsStr` so odd bytes in source names
//! survive the trip.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crate::config::ToolSettings;

use super::runner::{run_tool, ToolError, ToolResult};

/// Extract a zip archive into the workspace.
///
/// Member names are lowercased on extraction (`-L`) so the later passes
/// see consistent casing regardless of how the archive was built.
pub fn extract_zip(tools: &ToolSettings, archive: &Path, workspace: &Path) -> ToolResult<()> {
    run_tool(
        &tools.unzip,
        [
            OsStr::new("-qq"),
            OsStr::new("-o"),
            OsStr::new("-L"),
            OsStr::new("-d"),
            workspace.as_os_str(),
            archive.as_os_str(),
        ],
        workspace,
    )?;
    Ok(())
}

/// Extract a rar archive into the workspace.
pub fn extract_rar(tools: &ToolSettings, archive: &Path, workspace: &Path) -> ToolResult<()> {
    // unrar wants a trailing slash to treat the target as a directory
    let mut target = workspace.as_os_str().to_os_string();
    target.push("/");

    run_tool(
        &tools.unrar,
        [
            OsStr::new("x"),
            OsStr::new("-inul"),
            archive.as_os_str(),
            target.as_os_str(),
        ],
        workspace,
    )?;
    Ok(())
}

/// Decompress a gzip file into the workspace.
///
/// The source is first copied into the workspace under its original name
/// so the decompressor can derive the output name from the `.gz` suffix;
/// the copy is consumed by the decompression.
pub fn extract_gzip(
    tools: &ToolSettings,
    archive: &Path,
    file_name: &str,
    workspace: &Path,
) -> ToolResult<()> {
    let staged = workspace.join(file_name);
    fs::copy(archive, &staged).map_err(|e| ToolError::Staging {
        tool: tools.gzip.clone(),
        source: e,
    })?;

    run_tool(
        &tools.gzip,
        [OsStr::new("-d"), staged.as_os_str()],
        workspace,
    )?;
    Ok(())
}

/// Extract a tar archive into the workspace.
///
/// `gzipped` selects the decompression filter for `.tgz` archives.
pub fn extract_tar(
    tools: &ToolSettings,
    archive: &Path,
    gzipped: bool,
    workspace: &Path,
) -> ToolResult<()> {
    let mode = if gzipped { "-xz" } else { "-x" };

    run_tool(
        &tools.tar,
        [
            OsStr::new(mode),
            OsStr::new("-C"),
            workspace.as_os_str(),
            OsStr::new("-f"),
            archive.as_os_str(),
        ],
        workspace,
    )?;
    Ok(())
}
