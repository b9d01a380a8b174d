//! Wrappers for the Commodore format converters.
//!
//! `cbmconvert` unpacks disk, tape, and single-file images and rebuilds
//! disks from linked images; `zip2disk` merges a four-part grouped set
//! back into a disk image. Both write relative to their working
//! directory, so every call pins `cwd` to the right place.

use std::ffi::OsStr;
use std::path::Path;

use crate::config::ToolSettings;

use super::runner::{run_tool, ToolResult};

/// Converter mode for each image family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMode {
    /// 1541 disk image (`.d64`).
    Disk,
    /// Tape image (`.t64`).
    Tape,
    /// Single-file wrapper (`.p00`).
    SingleFile,
}

impl ImageMode {
    fn flag(self) -> &'static str {
        match self {
            ImageMode::Disk => "-d",
            ImageMode::Tape => "-t",
            ImageMode::SingleFile => "-p",
        }
    }
}

/// Unpack a machine image into the workspace.
///
/// The converter writes the unpacked files into its working directory,
/// so `workspace` doubles as `cwd`. `image` must be an absolute path for
/// the same reason.
pub fn unpack_image(
    tools: &ToolSettings,
    mode: ImageMode,
    image: &Path,
    workspace: &Path,
) -> ToolResult<()> {
    run_tool(
        &tools.cbmconvert,
        [
            OsStr::new("-v0"),
            OsStr::new("-N"),
            OsStr::new(mode.flag()),
            image.as_os_str(),
        ],
        workspace,
    )?;
    Ok(())
}

/// Rebuild a disk image from a linked image.
///
/// The new disk is created as `disk_name` inside the workspace and can
/// then be processed like any other disk image.
pub fn lynx_to_disk(
    tools: &ToolSettings,
    lynx: &Path,
    disk_name: &str,
    workspace: &Path,
) -> ToolResult<()> {
    run_tool(
        &tools.cbmconvert,
        [
            OsStr::new("-v0"),
            OsStr::new("-D4"),
            OsStr::new(disk_name),
            OsStr::new("-l"),
            lynx.as_os_str(),
        ],
        workspace,
    )?;
    Ok(())
}

/// Merge a four-part grouped set into a disk image.
///
/// Runs in the directory holding the parts; the tool resolves the
/// `1!`..`4!` member names from the bare remainder. `output` must be an
/// absolute path so the disk lands in the workspace, not next to the
/// parts.
pub fn merge_grouped(
    tools: &ToolSettings,
    parts_dir: &Path,
    remainder: &str,
    output: &Path,
) -> ToolResult<()> {
    run_tool(
        &tools.zip2disk,
        [OsStr::new(remainder), output.as_os_str()],
        parts_dir,
    )?;
    Ok(())
}

/// Name for the disk produced from a grouped set.
///
/// A `z64` suffix is the conventional marker for grouped sets and is
/// rewritten to `d64`; a name already ending in `d64` is kept as is;
/// anything else gets `.d64` appended.
pub fn grouped_disk_name(remainder: &str) -> String {
    let lower = remainder.to_ascii_lowercase();
    if let Some(stem_len) = lower.strip_suffix("z64").map(str::len) {
        format!("{}d64", &remainder[..stem_len])
    } else if lower.ends_with("d64") {
        remainder.to_string()
    } else {
        format!("{}.d64", remainder)
    }
}
