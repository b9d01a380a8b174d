//! The three-pass conversion pipeline.
//!
//! A run copies the source tree into the destination in three passes:
//!
//! 1. **convert**: walk the source, classify every file, unwrap
//!    containers recursively, and copy payloads under normalized names
//! 2. **rename**: normalize directory names, deepest first
//! 3. **arrange**: deal overfull directories into bucket subdirectories
//!
//! All run state lives in [`RunContext`]. Nothing process-global is
//! touched, so a failed run leaves no trace beyond its own scratch
//! directory, which is cleaned up on drop.

mod arrange;
mod context;
mod dispatch;
mod errors;
mod extract;
mod rename;
mod summary;
mod walk;

// Re-export public types
pub use context::{Confirmer, GroupedState, ResumeGate, RunContext};
pub use errors::{RunError, RunResult};
pub use summary::RunSummary;

use std::fs;

/// Execute a full conversion run and return the run counters.
pub fn run(ctx: &mut RunContext) -> RunResult<RunSummary> {
    let source = ctx.source_root.clone();
    let dest = ctx.dest_root.clone();
    fs::create_dir_all(&dest).map_err(|e| RunError::io("creating", &dest, e))?;

    tracing::info!(
        "Pass 1/3: converting {} into {}",
        source.display(),
        dest.display()
    );
    walk::process_dir(ctx, &source, &dest)?;

    tracing::info!("Pass 2/3: renaming directories");
    rename::rename_dirs(ctx)?;

    tracing::info!("Pass 3/3: rebalancing directory fan-out");
    arrange::arrange(ctx)?;

    Ok(ctx.stats)
}
