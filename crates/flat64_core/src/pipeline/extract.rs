//! Container extraction handlers.
//!
//! Every handler follows the same shape: allocate a scratch workspace,
//! run the external tool, then either walk the unpacked contents into
//! the destination or keep the container as a plain file. Disk and tape
//! images are only unwrapped when the retention heuristics say the
//! wrapper adds nothing; archives always unwrap.
//!
//! A tool failure resolved by the ignore policy keeps the source file
//! verbatim. A partially filled workspace is never walked.

use std::fs;
use std::path::Path;

use crate::tools::{self, ImageMode};
use crate::workspace::Workspace;

use super::context::{GroupedState, RunContext};
use super::dispatch::save_file;
use super::errors::{RunError, RunResult};
use super::walk;

/// Score tables this size or larger are left alone; only small leftover
/// save files are deleted.
const SCORE_TABLE_MAX_BYTES: u64 = 1024;

pub fn zip(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let source = dir.join(name);
    let workspace = allocate(ctx, "zip", &source)?;

    if let Err(e) = tools::extract_zip(&ctx.settings.tools, &source, workspace.path()) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

pub fn rar(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let source = dir.join(name);
    let workspace = allocate(ctx, "rar", &source)?;

    if let Err(e) = tools::extract_rar(&ctx.settings.tools, &source, workspace.path()) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

pub fn gzip(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let source = dir.join(name);
    let workspace = allocate(ctx, "gz", &source)?;

    if let Err(e) = tools::extract_gzip(&ctx.settings.tools, &source, name, workspace.path()) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

pub fn tar(
    ctx: &mut RunContext,
    dir: &Path,
    name: &str,
    dest_dir: &Path,
    gzipped: bool,
) -> RunResult<()> {
    let source = dir.join(name);
    let tag = if gzipped { "tgz" } else { "tar" };
    let workspace = allocate(ctx, tag, &source)?;

    if let Err(e) = tools::extract_tar(&ctx.settings.tools, &source, gzipped, workspace.path()) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

/// Unwrap a disk image, or keep it when it looks like a full disk.
///
/// With a lister configured the decision comes first: the image is only
/// unwrapped when its directory shows a single program on otherwise
/// clean block accounting. Without a lister the image is unwrapped
/// blindly and kept whenever more than one file came out.
pub fn disk_image(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let source = dir.join(name);
    let workspace = allocate(ctx, "d64", &source)?;

    let analysis = if ctx.settings.tools.disk_lister.is_empty() {
        None
    } else {
        match tools::list_image(&ctx.settings.tools, &source, workspace.path()) {
            Ok(listing) => Some(tools::analyze_listing(&listing)),
            Err(e) => {
                ctx.resolve_tool_failure(&source, e)?;
                return keep_container(ctx, dir, name, dest_dir);
            }
        }
    };

    if let Some(analysis) = &analysis {
        tracing::debug!(
            "{}: {} entries, {} + {} blocks",
            source.display(),
            analysis.entries,
            analysis.total_blocks,
            analysis.free_blocks
        );
        if !analysis.single_program(ctx.settings.layout.clean_disk_blocks) {
            return keep_container(ctx, dir, name, dest_dir);
        }
    }

    if let Err(e) = tools::unpack_image(&ctx.settings.tools, ImageMode::Disk, &source, workspace.path()) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    match &analysis {
        Some(analysis) => {
            if analysis.hiscore {
                delete_score_tables(workspace.path())?;
            }
        }
        None => {
            if walk::count_files(workspace.path())? > 1 {
                return keep_container(ctx, dir, name, dest_dir);
            }
        }
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

/// Unwrap a tape image unless it holds a real collection.
pub fn tape_image(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let source = dir.join(name);
    let workspace = allocate(ctx, "t64", &source)?;

    if let Err(e) = tools::unpack_image(&ctx.settings.tools, ImageMode::Tape, &source, workspace.path()) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    // One or two files unwrap cleanly; anything bigger is a collection
    // worth keeping whole.
    let produced = walk::count_files(workspace.path())?;
    if produced > 2 {
        return keep_container(ctx, dir, name, dest_dir);
    }

    // A tape holding one unnamed program comes out as `file.prg`. Give
    // it the image's stem so the name survives the unwrap.
    if produced == 1 {
        let anonymous = workspace.join("file.prg");
        if anonymous.is_file() {
            let named = workspace.join(&format!("{}.prg", stem(name)));
            fs::rename(&anonymous, &named)
                .map_err(|e| RunError::io("renaming", &anonymous, e))?;
        }
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

/// Unwrap a single-file image unless it holds a real collection.
pub fn single_file_image(
    ctx: &mut RunContext,
    dir: &Path,
    name: &str,
    dest_dir: &Path,
) -> RunResult<()> {
    let source = dir.join(name);
    let workspace = allocate(ctx, "p00", &source)?;

    if let Err(e) = tools::unpack_image(
        &ctx.settings.tools,
        ImageMode::SingleFile,
        &source,
        workspace.path(),
    ) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    if walk::count_files(workspace.path())? > 2 {
        return keep_container(ctx, dir, name, dest_dir);
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

/// Convert a linked image to a disk image and process that.
///
/// The converted disk lands in the workspace and goes through the
/// regular walk, so the disk image heuristics decide its fate.
pub fn linked_image(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    let source = dir.join(name);
    let workspace = allocate(ctx, "lnx", &source)?;

    let disk_name = lynx_disk_name(name);
    if let Err(e) = tools::lynx_to_disk(&ctx.settings.tools, &source, &disk_name, workspace.path()) {
        ctx.resolve_tool_failure(&source, e)?;
        return keep_container(ctx, dir, name, dest_dir);
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

/// Merge a four-part grouped set into one disk image and process that.
///
/// All four members classify as grouped, so the set runs exactly once:
/// the first member seen does the merge, the other three count as
/// skipped. When the merge fails and the run continues, all four parts
/// are preserved verbatim instead.
pub fn grouped_parts(
    ctx: &mut RunContext,
    dir: &Path,
    name: &str,
    remainder: &str,
    dest_dir: &Path,
) -> RunResult<()> {
    if ctx.grouped_state(dir, remainder).is_some() {
        ctx.stats.entries_skipped += 1;
        return Ok(());
    }
    ctx.mark_grouped(dir, remainder, GroupedState::InProgress);

    let source = dir.join(name);
    let workspace = allocate(ctx, "zipcode", &source)?;
    let disk = workspace.join(&tools::grouped_disk_name(remainder));

    let merged = tools::merge_grouped(&ctx.settings.tools, dir, remainder, &disk);
    ctx.mark_grouped(dir, remainder, GroupedState::Done);

    if let Err(e) = merged {
        ctx.resolve_tool_failure(&source, e)?;
        for part in (1..=4).map(|n| format!("{}!{}", n, remainder)) {
            save_file(ctx, dir, &part, dest_dir)?;
        }
        tracing::debug!("Keeping grouped set: {}", dir.join(remainder).display());
        ctx.stats.containers_kept += 1;
        return Ok(());
    }

    unpacked(ctx, &workspace, &source, dest_dir)
}

fn allocate(ctx: &mut RunContext, tag: &str, source: &Path) -> RunResult<Workspace> {
    ctx.workspaces
        .allocate(tag)
        .map_err(|e| RunError::io("allocating a workspace for", source, e))
}

/// Record the unwrap and walk the workspace contents into the same
/// destination directory.
fn unpacked(
    ctx: &mut RunContext,
    workspace: &Workspace,
    source: &Path,
    dest_dir: &Path,
) -> RunResult<()> {
    tracing::info!("Unpacked: {}", source.display());
    ctx.stats.containers_extracted += 1;
    walk::process_dir(ctx, workspace.path(), dest_dir)
}

/// Preserve a container as a plain file in the destination.
fn keep_container(ctx: &mut RunContext, dir: &Path, name: &str, dest_dir: &Path) -> RunResult<()> {
    tracing::debug!("Keeping container: {}", dir.join(name).display());
    save_file(ctx, dir, name, dest_dir)?;
    ctx.stats.containers_kept += 1;
    Ok(())
}

/// Remove leftover high-score tables from an unpacked disk.
///
/// Only files that both carry a score-like name and are small enough to
/// be save data are deleted; a program that merely has a score-like
/// name survives.
fn delete_score_tables(workspace: &Path) -> RunResult<()> {
    for name in walk::read_dir_sorted(workspace)?.files {
        if !tools::is_score_table_name(&name) {
            continue;
        }
        let path = workspace.join(&name);
        let size = fs::metadata(&path)
            .map_err(|e| RunError::io("inspecting", &path, e))?
            .len();
        if size < SCORE_TABLE_MAX_BYTES {
            tracing::debug!("Deleting score table: {}", path.display());
            fs::remove_file(&path).map_err(|e| RunError::io("deleting", &path, e))?;
        }
    }
    Ok(())
}

/// Disk name for a converted linked image: a trailing `lnx` becomes
/// `d64`, any other name gets `.d64` appended.
fn lynx_disk_name(name: &str) -> String {
    match name.to_ascii_lowercase().strip_suffix("lnx").map(str::len) {
        Some(stem_len) => format!("{}d64", &name[..stem_len]),
        None => format!("{}.d64", name),
    }
}

fn stem(name: &str) -> &str {
    name.rfind('.').map_or(name, |pos| &name[..pos])
}
