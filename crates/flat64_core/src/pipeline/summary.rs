//! Run counters.

use std::fmt;

/// Counters accumulated across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files written into the destination, payloads and kept containers
    /// alike.
    pub files_saved: u64,
    /// Containers unpacked and replaced by their contents.
    pub containers_extracted: u64,
    /// Containers kept whole as destination files.
    pub containers_kept: u64,
    /// Entries skipped: dotfiles, noise extensions, repeat grouped parts.
    pub entries_skipped: u64,
    /// Tool failures the run continued past.
    pub tool_failures_ignored: u64,
    /// Directories renamed in the second pass.
    pub dirs_renamed: u64,
    /// Fan-out buckets created in the third pass.
    pub buckets_created: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Saved files:           {}", self.files_saved)?;
        writeln!(f, "Unpacked containers:   {}", self.containers_extracted)?;
        writeln!(f, "Kept containers:       {}", self.containers_kept)?;
        writeln!(f, "Skipped entries:       {}", self.entries_skipped)?;
        writeln!(f, "Ignored tool failures: {}", self.tool_failures_ignored)?;
        writeln!(f, "Renamed directories:   {}", self.dirs_renamed)?;
        write!(f, "Created buckets:       {}", self.buckets_created)
    }
}
