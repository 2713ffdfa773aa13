use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::event::Event;
use crate::theme::{resolve_theme, ThemeColors};
use crate::vcs::action::{ActionKind, ActionSlot, ActionTarget};
use crate::vcs::classifier::{
    OutputClassifier, PropListClassifier, StatusClassifier, UpdateClassifier,
};
use crate::vcs::command::{rev_option, Substitution};
use crate::vcs::expansion::ExpansionState;
use crate::vcs::list::ListRefresher;
use crate::vcs::listing::join_repo_path;
use crate::vcs::process::{LinkId, Termination};
use crate::vcs::tree::{NodeId, NodeKind, RepoTree, TreeCommands};

/// How long a status message stays on screen.
const STATUS_MESSAGE_SECS: u64 = 3;

/// The views, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Status,
    Update,
    Properties,
    Repository,
    Output,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Status,
        Tab::Update,
        Tab::Properties,
        Tab::Repository,
        Tab::Output,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Status => "Status",
            Tab::Update => "Update",
            Tab::Properties => "Properties",
            Tab::Repository => "Repository",
            Tab::Output => "Output",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Tab> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Which tree operation a prompt collects a name for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    Rename { node: NodeId },
    Mkdir { parent: NodeId },
    Copy { node: NodeId },
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::Rename { .. } => "Rename to: ",
            PromptKind::Mkdir { .. } => "New directory: ",
            PromptKind::Copy { .. } => "Copy as: ",
        }
    }
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Prompt(PromptKind),
}

/// Text typed into the prompt.
#[derive(Debug, Default)]
pub struct PromptState {
    pub input: String,
    pub cursor_position: usize,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    created: Instant,
}

/// What the viewer was pointed at on the command line.
#[derive(Debug, Clone, Default)]
pub struct Target {
    /// Local checkout; the status and update views need one.
    pub working_copy: Option<PathBuf>,
    /// Path or URL shown at the root of the repository tree.
    pub repo_root: String,
    /// Revision pin for the repository tree.
    pub revision: Option<String>,
    /// Repository path to open on startup.
    pub open_path: Option<String>,
}

/// Main application state.
pub struct App {
    pub should_quit: bool,
    pub tab: Tab,
    pub mode: AppMode,
    pub prompt_state: PromptState,
    pub status_message: Option<StatusMessage>,
    pub theme: ThemeColors,
    pub status: ListRefresher<StatusClassifier>,
    pub update: ListRefresher<UpdateClassifier>,
    pub properties: ListRefresher<PropListClassifier>,
    pub output: ListRefresher<OutputClassifier>,
    pub tree: RepoTree,
    pub actions: ActionSlot,
    /// Whether watcher events should be acted on; off while an action runs.
    pub watcher_active: bool,
    watcher_enabled: bool,
    config: AppConfig,
    target: Target,
    state_file: Option<PathBuf>,
    refresh_interval: Option<Duration>,
    last_tree_refresh: Instant,
    last_view: ViewStamp,
    dirty: bool,
}

/// Everything a redraw depends on that changes behind the user's back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ViewStamp {
    versions: [u64; 5],
    busy: [bool; 5],
}

impl App {
    pub fn new(config: AppConfig, target: Target, notify: mpsc::UnboundedSender<Event>) -> Self {
        let svn = config.vcs_binary().to_string();
        let theme = resolve_theme(&config.theme);

        let status = ListRefresher::new(StatusClassifier, notify.clone());
        let status = match &target.working_copy {
            Some(wc) => {
                let command = Substitution::new()
                    .arg("svn", &svn)
                    .apply(config.status_command());
                status.with_source(command, Some(wc.clone()))
            }
            None => status,
        };

        let tree = RepoTree::new(
            &target.repo_root,
            target.revision.clone(),
            TreeCommands {
                svn,
                list: config.list_command().to_string(),
                rename: config.move_command().to_string(),
            },
            notify.clone(),
        );

        let interval = config.refresh_interval_secs();
        let watcher_enabled = config.watcher_enabled() && target.working_copy.is_some();

        let mut app = Self {
            should_quit: false,
            tab: if target.working_copy.is_some() {
                Tab::Status
            } else {
                Tab::Repository
            },
            mode: AppMode::Normal,
            prompt_state: PromptState::default(),
            status_message: None,
            theme,
            status,
            update: ListRefresher::new(UpdateClassifier, notify.clone()),
            properties: ListRefresher::new(PropListClassifier, notify.clone()),
            output: ListRefresher::new(OutputClassifier, notify),
            tree,
            actions: ActionSlot::new(),
            watcher_active: watcher_enabled,
            watcher_enabled,
            state_file: config.state_file(),
            config,
            target,
            refresh_interval: (interval > 0).then(|| Duration::from_secs(interval)),
            last_tree_refresh: Instant::now(),
            last_view: ViewStamp::default(),
            dirty: true,
        };
        app.last_view = app.view_stamp();
        app
    }

    /// Restore the saved tree state and start the initial refreshes.
    pub fn start(&mut self) {
        if let Some(path) = self.state_file.clone() {
            match ExpansionState::load(&path) {
                Ok(paths) => {
                    info!(restored = paths.len(), "expansion state loaded");
                    self.tree.remember_open(paths);
                }
                Err(e) => self.report(Err(e)),
            }
        }
        if let Some(path) = self.target.open_path.clone() {
            self.tree.save_path_to_open(&path);
        }

        let result = self.status.refresh_content();
        self.report(result);
        let root = self.tree.root();
        let result = self.tree.open_node(root);
        self.last_tree_refresh = Instant::now();
        self.report(result);
    }

    /// Persist which directories are open, plus remembered ones that have
    /// not been listed yet.
    pub fn save_state(&self) -> Result<()> {
        let Some(path) = &self.state_file else {
            return Ok(());
        };
        let mut paths = self.tree.open_paths();
        for pending in self.tree.memory().iter() {
            if !paths.iter().any(|p| p == pending) {
                paths.push(pending.to_string());
            }
        }
        ExpansionState::new(paths).save(path)
    }

    pub fn working_copy(&self) -> Option<&Path> {
        self.target.working_copy.as_deref()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Kill every running child process.
    pub fn shutdown(&mut self) {
        self.status.cancel();
        self.update.cancel();
        self.properties.cancel();
        self.output.cancel();
        self.tree.shutdown();
    }

    // ---- messages ----------------------------------------------------------

    pub fn set_status_message(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            created: Instant::now(),
        });
        self.dirty = true;
    }

    pub fn set_error_message(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: true,
            created: Instant::now(),
        });
        self.dirty = true;
    }

    /// Show the error of a failed operation, if any.
    pub fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            warn!(error = %e, "operation failed");
            self.set_error_message(e.to_string());
        }
    }

    pub fn clear_expired_status(&mut self) {
        if let Some(msg) = &self.status_message {
            if msg.created.elapsed().as_secs() >= STATUS_MESSAGE_SECS {
                self.status_message = None;
                self.dirty = true;
            }
        }
    }

    // ---- redraw tracking ---------------------------------------------------

    fn view_stamp(&self) -> ViewStamp {
        ViewStamp {
            versions: [
                self.status.version(),
                self.update.version(),
                self.properties.version(),
                self.tree.version(),
                self.output.version(),
            ],
            busy: [
                self.status.is_busy(),
                self.update.is_busy(),
                self.properties.is_busy(),
                self.tree.is_busy(),
                self.output.is_busy(),
            ],
        }
    }

    /// Whether the screen is out of date; resets the flag.
    pub fn take_redraw(&mut self) -> bool {
        let stamp = self.view_stamp();
        let changed = stamp != self.last_view;
        self.last_view = stamp;
        std::mem::replace(&mut self.dirty, false) || changed
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_tab_busy(&self, tab: Tab) -> bool {
        match tab {
            Tab::Status => self.status.is_busy(),
            Tab::Update => self.update.is_busy(),
            Tab::Properties => self.properties.is_busy(),
            Tab::Repository => self.tree.is_busy(),
            Tab::Output => self.output.is_busy(),
        }
    }

    // ---- events ------------------------------------------------------------

    /// Route a child-process wake-up to whichever view owns the link.
    pub fn handle_link(&mut self, id: LinkId) {
        if self.status.owns(id) {
            self.status.handle_link_event(id);
        } else if self.update.owns(id) {
            if let Some(termination) = self.update.handle_link_event(id) {
                self.action_finished(ActionTarget::Update, termination);
            }
        } else if self.output.owns(id) {
            if let Some(termination) = self.output.handle_link_event(id) {
                self.action_finished(ActionTarget::Output, termination);
            }
        } else if self.properties.owns(id) {
            self.properties.handle_link_event(id);
        } else if !self.tree.handle_link_event(id) {
            debug!(link = %id, "event for a finished link");
        }
    }

    /// The working copy changed on disk.
    pub fn handle_fs_change(&mut self, paths: Vec<PathBuf>) {
        if !self.watcher_active || self.actions.is_busy() {
            return;
        }
        if self.status.is_busy() {
            debug!(changed = paths.len(), "status already refreshing");
            return;
        }
        debug!(changed = paths.len(), "refreshing status after change");
        let result = self.status.refresh_content();
        self.report(result);
    }

    /// Periodic housekeeping: message expiry and the tree timer.
    pub fn tick(&mut self) {
        self.clear_expired_status();
        let Some(interval) = self.refresh_interval else {
            return;
        };
        if self.last_tree_refresh.elapsed() >= interval && !self.tree.is_busy() {
            debug!("timed tree refresh");
            self.refresh_tree(false);
        }
    }

    // ---- refreshing --------------------------------------------------------

    /// Refresh whatever the current tab shows.
    pub fn refresh_current(&mut self, fresh: bool) {
        let result = match self.tab {
            Tab::Status => self.status.refresh_content(),
            Tab::Update => self.start_action(ActionKind::Update),
            Tab::Properties => self.properties.refresh_content(),
            Tab::Repository => {
                self.refresh_tree(fresh);
                Ok(())
            }
            Tab::Output => Ok(()),
        };
        self.report(result);
    }

    pub fn refresh_tree(&mut self, fresh: bool) {
        self.last_tree_refresh = Instant::now();
        let result = self.tree.refresh(fresh);
        self.report(result);
    }

    /// List the properties of the targeted rows.
    pub fn show_properties(&mut self) {
        let targets = match self.tab {
            Tab::Repository => self
                .selected_tree_node()
                .and_then(|id| self.tree.node(id))
                .map(|n| vec![n.repo_path.clone()])
                .unwrap_or_default(),
            _ => self.status.target_keys(),
        };
        if targets.is_empty() {
            self.set_status_message("Nothing selected");
            return;
        }
        let command = Substitution::new()
            .arg("svn", self.config.vcs_binary())
            .args("file_name", targets.iter().map(String::as_str))
            .apply(self.config.proplist_command());
        self.properties
            .set_source(command, self.target.working_copy.clone());
        let result = self.properties.refresh_content();
        self.tab = Tab::Properties;
        self.dirty = true;
        self.report(result);
    }

    // ---- actions -----------------------------------------------------------

    /// Run an action on the status rows (or the whole working copy for update).
    pub fn start_action(&mut self, kind: ActionKind) -> Result<()> {
        if self.target.working_copy.is_none() {
            return Err(AppError::InvalidPath("no working copy".into()));
        }
        let svn = self.config.vcs_binary();
        let command = match kind {
            ActionKind::Update => Substitution::new()
                .arg("svn", svn)
                .apply(self.config.update_command()),
            ActionKind::Add | ActionKind::Remove | ActionKind::Revert | ActionKind::Resolved => {
                let targets = self.status.target_keys();
                if targets.is_empty() {
                    self.set_status_message("Nothing selected");
                    return Ok(());
                }
                let template = match kind {
                    ActionKind::Add => self.config.add_command(),
                    ActionKind::Remove => self.config.remove_command(),
                    ActionKind::Revert => self.config.revert_command(),
                    _ => self.config.resolved_command(),
                };
                Substitution::new()
                    .arg("svn", svn)
                    .args("file_name", targets.iter().map(String::as_str))
                    .apply(template)
            }
            ActionKind::Mkdir | ActionKind::Copy => {
                return Err(AppError::InvalidPath(format!(
                    "{} needs a name",
                    kind.label()
                )))
            }
        };
        self.run_action(kind, command)
    }

    /// Claim the action slot and stream `command` into the action's tab.
    fn run_action(&mut self, kind: ActionKind, command: String) -> Result<()> {
        self.actions.acquire(kind, &command)?;
        let cwd = self.target.working_copy.clone();
        let result = match kind.target() {
            ActionTarget::Output => {
                self.output.set_source(command, cwd);
                self.output.refresh_content()
            }
            ActionTarget::Update => {
                self.update.set_source(command, cwd);
                self.update.refresh_content()
            }
        };
        if let Err(e) = result {
            self.actions.release();
            return Err(e);
        }
        self.watcher_active = false;
        self.tab = match kind.target() {
            ActionTarget::Output => Tab::Output,
            ActionTarget::Update => Tab::Update,
        };
        self.dirty = true;
        Ok(())
    }

    fn action_finished(&mut self, target: ActionTarget, termination: Termination) {
        if !self.actions.targets(target) {
            return;
        }
        let Some(action) = self.actions.release() else {
            return;
        };
        self.watcher_active = self.watcher_enabled;

        if !termination.success {
            self.set_error_message(
                AppError::ToolFailed {
                    command: action.command,
                    status: termination.to_string(),
                }
                .to_string(),
            );
            return;
        }

        self.set_status_message(format!("{} finished", action.kind.label()));
        let follow_up = action.kind.follow_up();
        if follow_up.status {
            let result = self.status.refresh_content();
            self.report(result);
        }
        if follow_up.tree {
            self.refresh_tree(false);
        }
    }

    /// Stop the running action; its partial output stays visible.
    pub fn cancel_action(&mut self) {
        let Some(action) = self.actions.release() else {
            return;
        };
        match action.kind.target() {
            ActionTarget::Output => self.output.cancel(),
            ActionTarget::Update => self.update.cancel(),
        }
        self.watcher_active = self.watcher_enabled;
        info!(action = action.kind.label(), "action cancelled");
        self.set_status_message(format!("{} cancelled", action.kind.label()));
    }

    // ---- navigation --------------------------------------------------------

    pub fn select_next(&mut self) {
        match self.tab {
            Tab::Status => self.status.select_next(),
            Tab::Update => self.update.select_next(),
            Tab::Properties => self.properties.select_next(),
            Tab::Repository => self.tree.select_next(),
            Tab::Output => self.output.select_next(),
        }
    }

    pub fn select_previous(&mut self) {
        match self.tab {
            Tab::Status => self.status.select_previous(),
            Tab::Update => self.update.select_previous(),
            Tab::Properties => self.properties.select_previous(),
            Tab::Repository => self.tree.select_previous(),
            Tab::Output => self.output.select_previous(),
        }
    }

    pub fn select_first(&mut self) {
        match self.tab {
            Tab::Status => self.status.select_first(),
            Tab::Update => self.update.select_first(),
            Tab::Properties => self.properties.select_first(),
            Tab::Repository => self.tree.select_first(),
            Tab::Output => self.output.select_first(),
        }
    }

    pub fn select_last(&mut self) {
        match self.tab {
            Tab::Status => self.status.select_last(),
            Tab::Update => self.update.select_last(),
            Tab::Properties => self.properties.select_last(),
            Tab::Repository => self.tree.select_last(),
            Tab::Output => self.output.select_last(),
        }
    }

    /// Mark or unmark the row under the cursor.
    pub fn toggle_selected(&mut self) {
        match self.tab {
            Tab::Status => self.status.toggle_selected(),
            Tab::Update => self.update.toggle_selected(),
            Tab::Properties => self.properties.toggle_selected(),
            Tab::Repository => {}
            Tab::Output => self.output.toggle_selected(),
        }
    }

    pub fn select_all(&mut self) {
        match self.tab {
            Tab::Status => self.status.select_all(),
            Tab::Update => self.update.select_all(),
            Tab::Properties => self.properties.select_all(),
            Tab::Repository => {}
            Tab::Output => self.output.select_all(),
        }
    }

    pub fn clear_selection(&mut self) {
        match self.tab {
            Tab::Status => self.status.clear_selection(),
            Tab::Update => self.update.clear_selection(),
            Tab::Properties => self.properties.clear_selection(),
            Tab::Repository => {}
            Tab::Output => self.output.clear_selection(),
        }
    }

    /// Number of marked rows in the current list.
    pub fn marked_count(&self) -> usize {
        let entries = match self.tab {
            Tab::Status => self.status.entries(),
            Tab::Update => self.update.entries(),
            Tab::Properties => self.properties.entries(),
            Tab::Repository => return 0,
            Tab::Output => self.output.entries(),
        };
        entries.iter().filter(|e| e.selected).count()
    }

    pub fn expand_selected(&mut self) {
        let result = self.tree.expand_selected();
        self.report(result);
    }

    pub fn collapse_selected(&mut self) {
        self.tree.collapse_selected();
    }

    /// The selected tree node, unless it is a placeholder row.
    pub fn selected_tree_node(&self) -> Option<NodeId> {
        let id = self.tree.selected_id()?;
        let node = self.tree.node(id)?;
        matches!(node.kind, NodeKind::File | NodeKind::Directory).then_some(id)
    }

    // ---- prompt ------------------------------------------------------------

    /// Ask for a name for a tree operation on the selected node.
    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt_state = PromptState::default();
        if let PromptKind::Rename { node } | PromptKind::Copy { node } = &kind {
            if let Some(n) = self.tree.node(*node) {
                self.prompt_state.input = n.name.clone();
                self.prompt_state.cursor_position = n.name.len();
            }
        }
        self.mode = AppMode::Prompt(kind);
    }

    /// Open a prompt of the kind built by `make` for the selected node.
    pub fn prompt_for_selected(&mut self, make: fn(NodeId) -> PromptKind) {
        match self.selected_tree_node() {
            Some(id) => self.open_prompt(make(id)),
            None => self.set_status_message("Select a file or directory first"),
        }
    }

    pub fn close_prompt(&mut self) {
        self.mode = AppMode::Normal;
        self.prompt_state = PromptState::default();
    }

    pub fn prompt_input_char(&mut self, c: char) {
        self.prompt_state
            .input
            .insert(self.prompt_state.cursor_position, c);
        self.prompt_state.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn prompt_delete_char(&mut self) {
        let before = &self.prompt_state.input[..self.prompt_state.cursor_position];
        if let Some(prev) = before.chars().next_back() {
            self.prompt_state.cursor_position -= prev.len_utf8();
            self.prompt_state
                .input
                .remove(self.prompt_state.cursor_position);
        }
    }

    pub fn prompt_move_cursor_left(&mut self) {
        let before = &self.prompt_state.input[..self.prompt_state.cursor_position];
        if let Some(prev) = before.chars().next_back() {
            self.prompt_state.cursor_position -= prev.len_utf8();
        }
    }

    pub fn prompt_move_cursor_right(&mut self) {
        let after = &self.prompt_state.input[self.prompt_state.cursor_position..];
        if let Some(next) = after.chars().next() {
            self.prompt_state.cursor_position += next.len_utf8();
        }
    }

    /// Carry out the prompted operation with the typed name.
    pub fn submit_prompt(&mut self) {
        let AppMode::Prompt(kind) = std::mem::take(&mut self.mode) else {
            return;
        };
        let name = std::mem::take(&mut self.prompt_state.input).trim().to_string();
        self.prompt_state = PromptState::default();
        if name.is_empty() || name.contains('/') {
            self.set_error_message(format!("Invalid name: {name:?}"));
            return;
        }

        let result = match kind {
            PromptKind::Rename { node } => {
                let result = self.tree.rename(node, &name);
                if result.is_ok() {
                    self.set_status_message(format!("Renamed to {name}"));
                }
                result
            }
            PromptKind::Mkdir { parent } => self.make_directory(parent, &name),
            PromptKind::Copy { node } => self.copy_node(node, &name),
        };
        self.report(result);
    }

    fn make_directory(&mut self, at: NodeId, name: &str) -> Result<()> {
        let Some(node) = self.tree.node(at) else {
            return Ok(());
        };
        // Files get their sibling directory.
        let base = match (node.kind, node.parent) {
            (NodeKind::Directory, _) | (_, None) => node.repo_path.clone(),
            (_, Some(parent)) => self
                .tree
                .node(parent)
                .map(|p| p.repo_path.clone())
                .unwrap_or_default(),
        };
        let command = Substitution::new()
            .arg("svn", self.config.vcs_binary())
            .arg("path", &join_repo_path(&base, name))
            .apply(self.config.mkdir_command());
        self.run_action(ActionKind::Mkdir, command)
    }

    fn copy_node(&mut self, id: NodeId, name: &str) -> Result<()> {
        let Some(node) = self.tree.node(id) else {
            return Ok(());
        };
        let parent_path = node
            .parent
            .and_then(|p| self.tree.node(p))
            .map(|p| p.repo_path.clone())
            .unwrap_or_default();
        let command = Substitution::new()
            .arg("svn", self.config.vcs_binary())
            .raw("rev_option", rev_option(node.revision_pin.as_deref()))
            .arg("src", &node.repo_path)
            .arg("dst", &join_repo_path(&parent_path, name))
            .apply(self.config.copy_command());
        self.run_action(ActionKind::Copy, command)
    }
}
