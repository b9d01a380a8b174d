//! Scratch workspaces for extraction steps.
//!
//! Every container is unpacked into its own scratch directory under one
//! run-scoped root. The numbered names keep nested containers of the
//! same kind apart, and dropping a workspace removes it, so a failed
//! step cannot leak partial output into a later one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The run-scoped scratch root this process would use under `temp_root`.
///
/// The name carries the process id, so concurrent runs can share a temp
/// root without stepping on each other.
pub fn scratch_root(temp_root: &Path) -> PathBuf {
    temp_root.join(format!("flat64-{}", std::process::id()))
}

/// Hands out scratch directories under one run-scoped root.
///
/// Dropping the allocator removes the root and anything left under it.
#[derive(Debug)]
pub struct WorkspaceAllocator {
    root: PathBuf,
    next_id: u64,
}

impl WorkspaceAllocator {
    /// Create an allocator rooted under `temp_root`.
    ///
    /// The run root is created (and made absolute) right away, so a bad
    /// temp root fails the run before any source file is touched.
    pub fn new(temp_root: &Path) -> io::Result<Self> {
        let root = std::path::absolute(scratch_root(temp_root))?;
        fs::create_dir_all(&root)?;
        Ok(Self { root, next_id: 0 })
    }

    /// The run-scoped root all workspaces live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh workspace for one extraction step.
    ///
    /// `tag` names the container kind and only serves debuggability; the
    /// counter is what makes the directory unique within the run.
    pub fn allocate(&mut self, tag: &str) -> io::Result<Workspace> {
        let path = self.root.join(format!("{}-{}", tag, self.next_id));
        self.next_id += 1;

        // A leftover from a crashed run with the same pid must not leak
        // its contents into this step.
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir(&path)?;

        Ok(Workspace { path })
    }
}

impl Drop for WorkspaceAllocator {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.root) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    "Failed to remove scratch root {}: {}",
                    self.root.display(),
                    e
                );
            }
        }
    }
}

/// Scratch directory for a single extraction step, removed on drop.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
}

impl Workspace {
    /// Absolute path of this workspace.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of an entry inside this workspace.
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove workspace {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_root_carries_the_pid() {
        let root = scratch_root(Path::new("/tmp"));
        assert_eq!(
            root,
            Path::new("/tmp").join(format!("flat64-{}", std::process::id()))
        );
    }

    #[test]
    fn workspaces_are_unique_and_created() {
        let temp = tempfile::tempdir().unwrap();
        let mut alloc = WorkspaceAllocator::new(temp.path()).unwrap();

        let a = alloc.allocate("zip").unwrap();
        let b = alloc.allocate("zip").unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        assert!(a.path().ends_with("zip-0"));
        assert!(b.path().ends_with("zip-1"));
    }

    #[test]
    fn workspace_is_removed_on_drop() {
        let temp = tempfile::tempdir().unwrap();
        let mut alloc = WorkspaceAllocator::new(temp.path()).unwrap();

        let ws = alloc.allocate("d64").unwrap();
        let path = ws.path().to_path_buf();
        fs::write(ws.join("leftover.prg"), b"x").unwrap();

        drop(ws);
        assert!(!path.exists());
    }

    #[test]
    fn allocator_removes_run_root_on_drop() {
        let temp = tempfile::tempdir().unwrap();
        let alloc = WorkspaceAllocator::new(temp.path()).unwrap();
        let root = alloc.root().to_path_buf();
        assert!(root.is_dir());

        drop(alloc);
        assert!(!root.exists());
    }

    #[test]
    fn stale_contents_are_cleared() {
        let temp = tempfile::tempdir().unwrap();
        let mut alloc = WorkspaceAllocator::new(temp.path()).unwrap();

        let stale = alloc.root().join("tar-0");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("junk"), b"junk").unwrap();

        let ws = alloc.allocate("tar").unwrap();
        assert_eq!(ws.path(), stale.as_path());
        assert_eq!(fs::read_dir(ws.path()).unwrap().count(), 0);
    }
}
