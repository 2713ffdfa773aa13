//! State-changing commands.
//!
//! Only one action process may run at a time; [`ActionSlot`] enforces that.
//! Short repository operations that must finish before the caller goes on
//! (a rename) run through [`run_blocking`] instead.

use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use crate::error::{AppError, Result};

/// The action commands the user can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Update,
    Add,
    Remove,
    Revert,
    Resolved,
    Mkdir,
    Copy,
}

/// Which list shows an action's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    Output,
    Update,
}

/// Refreshes to run once an action succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowUp {
    pub status: bool,
    pub tree: bool,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Update => "update",
            ActionKind::Add => "add",
            ActionKind::Remove => "remove",
            ActionKind::Revert => "revert",
            ActionKind::Resolved => "resolved",
            ActionKind::Mkdir => "mkdir",
            ActionKind::Copy => "copy",
        }
    }

    pub fn target(self) -> ActionTarget {
        match self {
            ActionKind::Update => ActionTarget::Update,
            _ => ActionTarget::Output,
        }
    }

    pub fn follow_up(self) -> FollowUp {
        match self {
            ActionKind::Update => FollowUp {
                status: true,
                tree: true,
            },
            ActionKind::Add | ActionKind::Remove | ActionKind::Revert | ActionKind::Resolved => {
                FollowUp {
                    status: true,
                    tree: false,
                }
            }
            ActionKind::Mkdir | ActionKind::Copy => FollowUp {
                status: false,
                tree: true,
            },
        }
    }
}

/// An action holding the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningAction {
    pub kind: ActionKind,
    pub command: String,
}

/// Admits one action process at a time.
#[derive(Debug, Default)]
pub struct ActionSlot {
    current: Option<RunningAction>,
}

impl ActionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or fail with `ActionBusy` if it is taken.
    pub fn acquire(&mut self, kind: ActionKind, command: &str) -> Result<()> {
        if let Some(running) = &self.current {
            warn!(
                running = running.kind.label(),
                refused = kind.label(),
                "action refused, slot busy"
            );
            return Err(AppError::ActionBusy);
        }
        info!(action = kind.label(), command, "action started");
        self.current = Some(RunningAction {
            kind,
            command: command.to_string(),
        });
        Ok(())
    }

    /// Free the slot, returning the action that held it.
    pub fn release(&mut self) -> Option<RunningAction> {
        let released = self.current.take();
        if let Some(action) = &released {
            info!(action = action.kind.label(), "action finished");
        }
        released
    }

    pub fn current(&self) -> Option<&RunningAction> {
        self.current.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the running action writes into `target`.
    pub fn targets(&self, target: ActionTarget) -> bool {
        self.current
            .as_ref()
            .map(|a| a.kind.target() == target)
            .unwrap_or(false)
    }
}

/// Run `command` through the shell and wait for it.
///
/// A non-zero exit is reported as `ToolFailed` carrying the first line the
/// tool wrote to stderr, or the exit status if it wrote nothing.
pub fn run_blocking(command: &str, cwd: Option<&Path>) -> Result<()> {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|source| AppError::Spawn {
        command: command.to_string(),
        source,
    })?;

    if output.status.success() {
        info!(command, "blocking command succeeded");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let status = stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| output.status.to_string());
    warn!(command, %status, "blocking command failed");
    Err(AppError::ToolFailed {
        command: command.to_string(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_action_is_refused() {
        let mut slot = ActionSlot::new();
        slot.acquire(ActionKind::Add, "svn add a.c").unwrap();
        let err = slot.acquire(ActionKind::Revert, "svn revert a.c").unwrap_err();
        assert!(matches!(err, AppError::ActionBusy));
        assert_eq!(slot.current().map(|a| a.kind), Some(ActionKind::Add));
    }

    #[test]
    fn release_frees_slot() {
        let mut slot = ActionSlot::new();
        slot.acquire(ActionKind::Update, "svn update").unwrap();
        assert!(slot.targets(ActionTarget::Update));
        assert!(!slot.targets(ActionTarget::Output));
        let released = slot.release().unwrap();
        assert_eq!(released.command, "svn update");
        assert!(!slot.is_busy());
        assert!(slot.release().is_none());
        slot.acquire(ActionKind::Add, "svn add b.c").unwrap();
    }

    #[test]
    fn follow_ups() {
        assert_eq!(
            ActionKind::Update.follow_up(),
            FollowUp {
                status: true,
                tree: true
            }
        );
        assert!(!ActionKind::Add.follow_up().tree);
        assert!(!ActionKind::Mkdir.follow_up().status);
        assert_eq!(ActionKind::Copy.target(), ActionTarget::Output);
    }

    #[test]
    fn blocking_success_in_directory() {
        let dir = TempDir::new().unwrap();
        run_blocking("touch made.txt", Some(dir.path())).unwrap();
        assert!(dir.path().join("made.txt").exists());
    }

    #[test]
    fn blocking_failure_reports_stderr() {
        let err = run_blocking("echo 'svn: E155010: not found' >&2; exit 1", None).unwrap_err();
        match err {
            AppError::ToolFailed { status, .. } => assert_eq!(status, "svn: E155010: not found"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blocking_failure_without_stderr_reports_status() {
        let err = run_blocking("exit 4", None).unwrap_err();
        assert!(err.to_string().contains('4'));
    }
}
