//! Run-scoped state threaded through every pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{ErrorPolicy, Settings};
use crate::tools::ToolError;
use crate::workspace::WorkspaceAllocator;

use super::errors::{RunError, RunResult};
use super::summary::RunSummary;

/// Callback that asks the user whether to continue after a tool failure.
pub type Confirmer = Box<dyn FnMut(&str) -> bool>;

/// Processing state of one grouped-container set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupedState {
    /// Conversion is underway.
    InProgress,
    /// The set has been handled; remaining parts are skipped.
    Done,
}

/// Gate that skips files until a resume point is reached.
///
/// Directories are always entered; only file processing is gated, so a
/// resume point deep in the tree is found without replaying the work
/// before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeGate {
    /// Process everything.
    Armed,
    /// Skip files until this source path comes up.
    Waiting(PathBuf),
}

impl ResumeGate {
    /// Decide whether `path` is processed. Reaching the resume point
    /// arms the gate, and the resume point itself is processed.
    pub fn should_process(&mut self, path: &Path) -> bool {
        match self {
            ResumeGate::Armed => true,
            ResumeGate::Waiting(target) => {
                if path == target {
                    *self = ResumeGate::Armed;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Run-scoped state owned by the driver and threaded through every
/// component.
///
/// Everything a run mutates lives here: the workspace counter, the
/// grouped-set map, the resume gate, and the statistics. Nothing is
/// global, so two runs in one process cannot interfere.
pub struct RunContext {
    pub settings: Settings,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub workspaces: WorkspaceAllocator,
    pub resume: ResumeGate,
    pub stats: RunSummary,
    /// RFC 3339 timestamp taken when the context was created.
    pub started_at: String,
    grouped: HashMap<(PathBuf, String), GroupedState>,
    confirmer: Option<Confirmer>,
}

impl RunContext {
    /// Create a context for one run.
    ///
    /// Roots are made absolute up front: extraction tools run with their
    /// working directory inside a workspace, so every path handed to
    /// them must stand on its own.
    pub fn new(settings: Settings, source_root: &Path, dest_root: &Path) -> RunResult<Self> {
        let temp_root = settings.run.effective_temp_root();
        let workspaces = WorkspaceAllocator::new(&temp_root)
            .map_err(|e| RunError::io("creating scratch root", temp_root.clone(), e))?;

        let source_root = std::path::absolute(source_root)
            .map_err(|e| RunError::io("resolving source root", source_root, e))?;
        let dest_root = std::path::absolute(dest_root)
            .map_err(|e| RunError::io("resolving destination root", dest_root, e))?;

        Ok(Self {
            settings,
            source_root,
            dest_root,
            workspaces,
            resume: ResumeGate::Armed,
            stats: RunSummary::default(),
            started_at: chrono::Local::now().to_rfc3339(),
            grouped: HashMap::new(),
            confirmer: None,
        })
    }

    /// Skip files until `path` is reached; processing starts there.
    pub fn resume_from(&mut self, path: &Path) -> RunResult<()> {
        let target = std::path::absolute(path)
            .map_err(|e| RunError::io("resolving resume point", path, e))?;
        self.resume = ResumeGate::Waiting(target);
        Ok(())
    }

    /// Install the callback consulted by the ask policy.
    pub fn set_confirmer(&mut self, confirmer: Confirmer) {
        self.confirmer = Some(confirmer);
    }

    /// Look up the processing state of a grouped set.
    pub fn grouped_state(&self, dir: &Path, remainder: &str) -> Option<GroupedState> {
        self.grouped
            .get(&(dir.to_path_buf(), remainder.to_string()))
            .copied()
    }

    /// Record the processing state of a grouped set.
    pub fn mark_grouped(&mut self, dir: &Path, remainder: &str, state: GroupedState) {
        self.grouped
            .insert((dir.to_path_buf(), remainder.to_string()), state);
    }

    /// Resolve a tool failure according to the error policy.
    ///
    /// `Ok(())` means the run continues and the caller keeps the source
    /// file verbatim; an error stops the run.
    pub fn resolve_tool_failure(&mut self, path: &Path, error: ToolError) -> RunResult<()> {
        tracing::error!("{}: {}", path.display(), error);

        match self.settings.run.on_tool_error {
            ErrorPolicy::Ignore => {
                self.stats.tool_failures_ignored += 1;
                Ok(())
            }
            ErrorPolicy::Halt => Err(RunError::tool(path, error)),
            ErrorPolicy::Ask => match self.confirmer.as_mut() {
                Some(confirm) => {
                    if confirm(&format!("{}. Continue?", error)) {
                        self.stats.tool_failures_ignored += 1;
                        Ok(())
                    } else {
                        Err(RunError::aborted(path))
                    }
                }
                None => {
                    tracing::warn!("ask policy without a confirmer, halting");
                    Err(RunError::tool(path, error))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with_policy(policy: ErrorPolicy) -> (tempfile::TempDir, RunContext) {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("src");
        let dest = temp.path().join("dst");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&dest).unwrap();

        let mut settings = Settings::default();
        settings.run.temp_root = temp.path().join("tmp").display().to_string();
        settings.run.on_tool_error = policy;

        let ctx = RunContext::new(settings, &source, &dest).unwrap();
        (temp, ctx)
    }

    fn failure() -> ToolError {
        ToolError::Failed {
            tool: "unzip".to_string(),
            exit_code: 2,
            stderr: "broken".to_string(),
        }
    }

    #[test]
    fn resume_gate_arms_on_target() {
        let mut gate = ResumeGate::Waiting(PathBuf::from("/src/b.zip"));
        assert!(!gate.should_process(Path::new("/src/a.zip")));
        assert!(gate.should_process(Path::new("/src/b.zip")));
        // Armed from here on
        assert!(gate.should_process(Path::new("/src/a.zip")));
    }

    #[test]
    fn grouped_state_round_trip() {
        let (_temp, mut ctx) = context_with_policy(ErrorPolicy::Ignore);
        let dir = Path::new("/src/games");

        assert_eq!(ctx.grouped_state(dir, "astro.z64"), None);
        ctx.mark_grouped(dir, "astro.z64", GroupedState::InProgress);
        assert_eq!(
            ctx.grouped_state(dir, "astro.z64"),
            Some(GroupedState::InProgress)
        );
        ctx.mark_grouped(dir, "astro.z64", GroupedState::Done);
        assert_eq!(ctx.grouped_state(dir, "astro.z64"), Some(GroupedState::Done));

        // Same remainder in another directory is a different set
        assert_eq!(ctx.grouped_state(Path::new("/src/other"), "astro.z64"), None);
    }

    #[test]
    fn ignore_policy_counts_and_continues() {
        let (_temp, mut ctx) = context_with_policy(ErrorPolicy::Ignore);
        ctx.resolve_tool_failure(Path::new("/src/a.zip"), failure())
            .unwrap();
        assert_eq!(ctx.stats.tool_failures_ignored, 1);
    }

    #[test]
    fn halt_policy_stops() {
        let (_temp, mut ctx) = context_with_policy(ErrorPolicy::Halt);
        let err = ctx
            .resolve_tool_failure(Path::new("/src/a.zip"), failure())
            .unwrap_err();
        assert!(matches!(err, RunError::Tool { .. }));
    }

    #[test]
    fn ask_policy_follows_the_confirmer() {
        let (_temp, mut ctx) = context_with_policy(ErrorPolicy::Ask);
        ctx.set_confirmer(Box::new(|_| true));
        ctx.resolve_tool_failure(Path::new("/src/a.zip"), failure())
            .unwrap();
        assert_eq!(ctx.stats.tool_failures_ignored, 1);

        ctx.set_confirmer(Box::new(|_| false));
        let err = ctx
            .resolve_tool_failure(Path::new("/src/b.zip"), failure())
            .unwrap_err();
        assert!(matches!(err, RunError::Aborted { .. }));
    }

    #[test]
    fn ask_policy_without_confirmer_halts() {
        let (_temp, mut ctx) = context_with_policy(ErrorPolicy::Ask);
        let err = ctx
            .resolve_tool_failure(Path::new("/src/a.zip"), failure())
            .unwrap_err();
        assert!(matches!(err, RunError::Tool { .. }));
    }
}
