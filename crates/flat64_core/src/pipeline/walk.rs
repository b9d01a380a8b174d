//! Directory walking for the conversion pass.
//!
//! One directory level at a time: files are dispatched first, then
//! subdirectories are mirrored into the destination and recursed into.
//! Listing order is natural order, so `part2` sorts before `part10` and
//! runs are reproducible across filesystems.

use std::fs;
use std::path::Path;

use crate::util::natural_sort;

use super::context::RunContext;
use super::dispatch;
use super::errors::{RunError, RunResult};

/// Direct children of one directory, split by kind and natural-sorted.
#[derive(Debug, Default)]
pub struct DirListing {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

/// Read one directory level.
///
/// Entries that are neither regular files nor directories (sockets,
/// fifos, symlinks) are skipped with a warning, as are names that do
/// not decode as UTF-8.
pub fn read_dir_sorted(dir: &Path) -> RunResult<DirListing> {
    let mut listing = DirListing::default();

    let entries =
        fs::read_dir(dir).map_err(|e| RunError::io("reading directory", dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| RunError::io("reading directory", dir, e))?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!("Skipping entry with undecodable name: {}", path.display());
            continue;
        };

        let file_type = entry
            .file_type()
            .map_err(|e| RunError::io("inspecting", &path, e))?;
        if file_type.is_dir() {
            listing.dirs.push(name);
        } else if file_type.is_file() {
            listing.files.push(name);
        } else {
            tracing::warn!("Neither file nor directory, skipping: {}", path.display());
        }
    }

    natural_sort(&mut listing.files);
    natural_sort(&mut listing.dirs);
    Ok(listing)
}

/// Count the regular files at the top level of a directory.
///
/// Extraction heuristics judge a container by how many files it
/// produced; subdirectories do not count.
pub fn count_files(dir: &Path) -> RunResult<usize> {
    Ok(read_dir_sorted(dir)?.files.len())
}

/// Process one source directory into one destination directory.
///
/// Files are dispatched before subdirectories, and each destination
/// subdirectory is created before recursing into its source. The resume
/// gate only applies to files; directories are always entered so a
/// resume point deep in the tree is reached.
pub fn process_dir(ctx: &mut RunContext, dir: &Path, dest_dir: &Path) -> RunResult<()> {
    let listing = read_dir_sorted(dir)?;

    for name in &listing.files {
        let path = dir.join(name);
        if !ctx.resume.should_process(&path) {
            tracing::debug!("Before resume point, skipping: {}", path.display());
            continue;
        }
        dispatch::process_file(ctx, dir, name, dest_dir)?;
    }

    for name in &listing.dirs {
        let sub_dest = dest_dir.join(name);
        if !sub_dest.is_dir() {
            fs::create_dir(&sub_dest)
                .map_err(|e| RunError::io("creating directory", &sub_dest, e))?;
        }
        process_dir(ctx, &dir.join(name), &sub_dest)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_is_split_and_natural_sorted() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("part10.prg"), b"x").unwrap();
        fs::write(temp.path().join("part2.prg"), b"x").unwrap();
        fs::create_dir(temp.path().join("zeta")).unwrap();
        fs::create_dir(temp.path().join("alpha")).unwrap();

        let listing = read_dir_sorted(temp.path()).unwrap();
        assert_eq!(listing.files, vec!["part2.prg", "part10.prg"]);
        assert_eq!(listing.dirs, vec!["alpha", "zeta"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("real.prg"), b"x").unwrap();
        std::os::unix::fs::symlink(temp.path().join("real.prg"), temp.path().join("link.prg"))
            .unwrap();

        let listing = read_dir_sorted(temp.path()).unwrap();
        assert_eq!(listing.files, vec!["real.prg"]);
    }

    #[test]
    fn count_files_ignores_directories() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.prg"), b"x").unwrap();
        fs::write(temp.path().join("b.prg"), b"x").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join("c.prg"), b"x").unwrap();

        assert_eq!(count_files(temp.path()).unwrap(), 2);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = read_dir_sorted(Path::new("/no/such/dir/anywhere")).unwrap_err();
        assert!(matches!(err, RunError::Io { .. }));
    }
}
