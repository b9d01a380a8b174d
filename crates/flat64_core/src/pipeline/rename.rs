//! Second pass: normalize destination directory names.
//!
//! The convert pass copies directories under their source names so the
//! walk stays anchored while files are still arriving. This pass renames
//! them to the constrained form, deepest directories first, so a rename
//! never invalidates a path the walk still has to visit.

use std::fs;
use std::path::Path;

use crate::naming::normalize_dir_name;

use super::context::RunContext;
use super::errors::{RunError, RunResult};
use super::walk;

/// Rename every directory below the destination root. The root itself
/// keeps the name the user chose.
pub fn rename_dirs(ctx: &mut RunContext) -> RunResult<()> {
    let root = ctx.dest_root.clone();
    rename_below(ctx, &root)
}

fn rename_below(ctx: &mut RunContext, dir: &Path) -> RunResult<()> {
    for name in walk::read_dir_sorted(dir)?.dirs {
        rename_below(ctx, &dir.join(&name))?;
        rename_one(ctx, dir, &name)?;
    }
    Ok(())
}

/// Rename a single directory to its normalized form, probing with an
/// index when the normalized name is already taken.
fn rename_one(ctx: &mut RunContext, parent: &Path, name: &str) -> RunResult<()> {
    let mut target = normalize_dir_name(name, 0, &ctx.settings.naming);
    if target == name {
        return Ok(());
    }

    let mut index = 1u32;
    loop {
        let candidate = parent.join(&target);
        if !candidate.is_file() && !candidate.is_dir() {
            break;
        }
        target = normalize_dir_name(name, index, &ctx.settings.naming);
        index += 1;
    }

    let from = parent.join(name);
    let to = parent.join(&target);
    tracing::info!("Renaming dir: {} -> {}", from.display(), to.display());
    fs::rename(&from, &to).map_err(|e| RunError::io("renaming", &from, e))?;
    ctx.stats.dirs_renamed += 1;
    Ok(())
}
