//! Third pass: rebalance overfull destination directories.
//!
//! Directories holding files are capped at a fixed entry count. When a
//! directory goes over, all of its entries are dealt in natural order
//! into numbered bucket subdirectories, so a browser on the target
//! machine never has to page through hundreds of names. Directories
//! without direct files are left as structure and only descended into.

use std::fs;
use std::path::Path;

use crate::naming::{normalize_dir_name, MAX_BASE_LEN};
use crate::util::natural_sort;

use super::context::RunContext;
use super::errors::{RunError, RunResult};
use super::walk;

/// Rebalance the whole destination tree.
pub fn arrange(ctx: &mut RunContext) -> RunResult<()> {
    let root = ctx.dest_root.clone();
    arrange_dir(ctx, &root)
}

fn arrange_dir(ctx: &mut RunContext, dir: &Path) -> RunResult<()> {
    let listing = walk::read_dir_sorted(dir)?;
    let cap = ctx.settings.layout.max_entries;

    if listing.files.is_empty() || listing.files.len() + listing.dirs.len() <= cap {
        for name in &listing.dirs {
            arrange_dir(ctx, &dir.join(name))?;
        }
        return Ok(());
    }

    // Files and subdirectories share the cap and are dealt together, so
    // a bucket holds a contiguous alphabetic slice of everything.
    let mut entries = listing.files;
    entries.extend(listing.dirs);
    natural_sort(&mut entries);

    let prefix = ctx.settings.layout.bucket_prefix.clone();
    let mut buckets = Vec::new();

    for (index, chunk) in entries.chunks(cap).enumerate() {
        let base = bucket_base(&prefix, (index + 1) * cap, &chunk[0]);
        let name = probe_bucket_name(ctx, dir, &base);
        let bucket = dir.join(&name);

        tracing::info!(
            "Balancing: {} entries into {}",
            chunk.len(),
            bucket.display()
        );
        fs::create_dir(&bucket).map_err(|e| RunError::io("creating", &bucket, e))?;
        ctx.stats.buckets_created += 1;

        for entry in chunk {
            let from = dir.join(entry);
            fs::rename(&from, bucket.join(entry))
                .map_err(|e| RunError::io("moving", &from, e))?;
        }
        buckets.push(name);
    }

    // Moved subdirectories still need their own interiors checked.
    for name in &buckets {
        arrange_dir(ctx, &dir.join(name))?;
    }
    Ok(())
}

/// Bucket directory name: prefix, the running entry offset, and a hint
/// taken from the first entry so a human can guess the range. The hint
/// is dropped entirely when the name budget has no room for it.
fn bucket_base(prefix: &str, offset: usize, first_entry: &str) -> String {
    let numeric = offset.to_string();
    let used = prefix.chars().count() + numeric.len();
    let budget = MAX_BASE_LEN.saturating_sub(used + 1);

    let fragment: String = first_entry
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .take(budget)
        .collect();

    if fragment.is_empty() {
        format!("{}{}", prefix, numeric)
    } else {
        format!("{}{}-{}", prefix, numeric, fragment)
    }
}

fn probe_bucket_name(ctx: &RunContext, dir: &Path, base: &str) -> String {
    let mut name = base.to_string();
    let mut index = 1u32;
    loop {
        let candidate = dir.join(&name);
        if !candidate.is_file() && !candidate.is_dir() {
            return name;
        }
        name = normalize_dir_name(base, index, &ctx.settings.naming);
        index += 1;
    }
}
