//! The refresh engine behind every flat list view.

use std::cmp::Ordering;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::event::Event;
use crate::vcs::classifier::{Classified, Entry, LineClassifier};
use crate::vcs::process::{LinkId, LinkLine, ProcessLink, Termination};
use crate::vcs::selection::SelectionSnapshot;

/// Life-cycle of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Starting,
    Streaming,
    Draining,
}

/// What a list runs to populate itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSource {
    pub command: String,
    pub cwd: Option<PathBuf>,
}

/// Key order used by every collection: case-insensitive, then byte-wise.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

/// A flat, sorted collection fed by one child process at a time.
pub struct ListRefresher<C: LineClassifier> {
    classifier: C,
    source: Option<ListSource>,
    notify: mpsc::UnboundedSender<Event>,
    link: Option<ProcessLink>,
    state: RefreshState,
    entries: Vec<Entry>,
    snapshot: Option<SelectionSnapshot>,
    errors: Vec<String>,
    saved_scroll: Option<usize>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    /// Bumped on every visible change so the UI knows to redraw.
    version: u64,
}

impl<C: LineClassifier> ListRefresher<C> {
    pub fn new(classifier: C, notify: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            classifier,
            source: None,
            notify,
            link: None,
            state: RefreshState::Idle,
            entries: Vec::new(),
            snapshot: None,
            errors: Vec::new(),
            saved_scroll: None,
            selected_index: 0,
            scroll_offset: 0,
            version: 0,
        }
    }

    pub fn with_source(mut self, command: impl Into<String>, cwd: Option<PathBuf>) -> Self {
        self.set_source(command, cwd);
        self
    }

    /// Change the command run by the next refresh.
    pub fn set_source(&mut self, command: impl Into<String>, cwd: Option<PathBuf>) {
        self.source = Some(ListSource {
            command: command.into(),
            cwd,
        });
    }

    pub fn source(&self) -> Option<&ListSource> {
        self.source.as_ref()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_busy(&self) -> bool {
        self.link.is_some()
    }

    /// Whether `id` is the link currently feeding this list.
    pub fn owns(&self, id: LinkId) -> bool {
        self.link.as_ref().map(|l| l.id() == id).unwrap_or(false)
    }

    /// Start a new refresh, cancelling any run still in flight.
    ///
    /// On spawn failure the list is left empty and idle, and the error is
    /// returned for the caller to report.
    pub fn refresh_content(&mut self) -> Result<()> {
        let mut snapshot = SelectionSnapshot::from_keys(self.selected_keys());

        if let Some(mut link) = self.link.take() {
            link.kill();
            debug!(list = self.classifier.name(), link = %link.id(), "cancelled refresh");
            if let Some(pending) = self.snapshot.take() {
                snapshot.merge(pending);
            }
        } else {
            self.saved_scroll = (self.scroll_offset > 0).then_some(self.scroll_offset);
        }

        self.state = RefreshState::Starting;
        self.entries.clear();
        self.errors.clear();
        self.selected_index = 0;
        self.scroll_offset = 0;
        self.snapshot = None;
        self.version += 1;

        let Some(source) = &self.source else {
            self.state = RefreshState::Idle;
            return Ok(());
        };

        match ProcessLink::spawn(&source.command, source.cwd.as_deref(), self.notify.clone()) {
            Ok(link) => {
                info!(
                    list = self.classifier.name(),
                    link = %link.id(),
                    restoring = snapshot.len(),
                    "refresh started"
                );
                self.link = Some(link);
                self.snapshot = (!snapshot.is_empty()).then_some(snapshot);
                self.state = RefreshState::Streaming;
                Ok(())
            }
            Err(e) => {
                warn!(list = self.classifier.name(), error = %e, "refresh failed to start");
                self.saved_scroll = None;
                self.state = RefreshState::Idle;
                Err(e)
            }
        }
    }

    /// Stop the running refresh without starting another. Partial output stays.
    pub fn cancel(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.kill();
            self.snapshot = None;
            self.saved_scroll = None;
            self.errors.clear();
            self.state = RefreshState::Idle;
            self.version += 1;
        }
    }

    /// Consume whatever the link named by `id` has produced.
    ///
    /// Returns the termination once the run has been fully drained. Events for
    /// links this list no longer owns are ignored.
    pub fn handle_link_event(&mut self, id: LinkId) -> Option<Termination> {
        if !self.owns(id) {
            return None;
        }
        let mut link = self.link.take()?;

        while let LinkLine::Line(line) = link.next_stdout_line() {
            self.insert_line(&line);
        }
        while let LinkLine::Line(line) = link.next_stderr_line() {
            self.errors.push(line);
        }

        match link.poll_terminated() {
            Some(termination) => {
                self.drain(link.command(), termination);
                Some(termination)
            }
            None => {
                self.link = Some(link);
                None
            }
        }
    }

    fn insert_line(&mut self, line: &str) {
        let Classified::Accepted(mut entry) = self.classifier.accept(line) else {
            return;
        };
        if let Some(snapshot) = &self.snapshot {
            entry.selected = snapshot.contains(&entry.sort_key);
        }

        let pos = self
            .entries
            .partition_point(|e| compare_keys(&e.sort_key, &entry.sort_key) != Ordering::Greater);
        if pos <= self.selected_index && !self.entries.is_empty() {
            self.selected_index += 1;
        }
        self.entries.insert(pos, entry);
        self.version += 1;
    }

    fn drain(&mut self, command: &str, termination: Termination) {
        self.state = RefreshState::Draining;

        let mut errors = std::mem::take(&mut self.errors);
        if errors.is_empty() && !termination.success {
            errors.push(format!("`{}` ended with {}", command, termination));
        }
        let count = errors.len();
        if count > 0 && !self.entries.is_empty() {
            self.selected_index += count;
        }
        for (i, text) in errors.into_iter().enumerate() {
            self.entries.insert(i, Entry::error(text));
        }

        if let Some(scroll) = self.saved_scroll.take() {
            self.scroll_offset = scroll.min(self.entries.len().saturating_sub(1));
            self.selected_index = self.selected_index.max(self.scroll_offset);
        }
        self.clamp_selected_index();

        let restored = self.entries.iter().filter(|e| e.selected).count();
        self.snapshot = None;
        self.version += 1;
        self.state = RefreshState::Idle;
        info!(
            list = self.classifier.name(),
            entries = self.entries.len(),
            errors = count,
            restored,
            %termination,
            "refresh finished"
        );
    }

    // ---- selection -------------------------------------------------------

    /// Keys of every selected row that has one.
    pub fn selected_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.selected && !e.sort_key.is_empty())
            .map(|e| e.sort_key.clone())
            .collect()
    }

    /// Replace the selection with exactly the rows whose key is in `keys`.
    #[cfg(test)]
    pub fn set_selection<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let wanted = SelectionSnapshot::from_keys(keys);
        for entry in &mut self.entries {
            entry.selected = wanted.contains(&entry.sort_key);
        }
        self.user_changed_selection();
    }

    /// Flip the selection of the row under the cursor.
    pub fn toggle_selected(&mut self) {
        if let Some(entry) = self.entries.get_mut(self.selected_index) {
            if !entry.sort_key.is_empty() {
                entry.selected = !entry.selected;
            }
        }
        self.user_changed_selection();
    }

    pub fn select_all(&mut self) {
        for entry in &mut self.entries {
            entry.selected = !entry.sort_key.is_empty();
        }
        self.user_changed_selection();
    }

    pub fn clear_selection(&mut self) {
        for entry in &mut self.entries {
            entry.selected = false;
        }
        self.user_changed_selection();
    }

    /// The user's choice wins over a selection still waiting to be restored.
    fn user_changed_selection(&mut self) {
        if self.snapshot.take().is_some() {
            debug!(list = self.classifier.name(), "pending selection discarded");
        }
        self.version += 1;
    }

    /// Keys the action commands should act on: the selection, or else the
    /// row under the cursor.
    pub fn target_keys(&self) -> Vec<String> {
        let selected = self.selected_keys();
        if !selected.is_empty() {
            return selected;
        }
        self.current()
            .filter(|e| !e.sort_key.is_empty())
            .map(|e| vec![e.sort_key.clone()])
            .unwrap_or_default()
    }

    // ---- cursor ----------------------------------------------------------

    pub fn current(&self) -> Option<&Entry> {
        self.entries.get(self.selected_index)
    }

    pub fn select_next(&mut self) {
        if self.selected_index + 1 < self.entries.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.entries.len().saturating_sub(1);
    }

    fn clamp_selected_index(&mut self) {
        if self.selected_index >= self.entries.len() {
            self.selected_index = self.entries.len().saturating_sub(1);
        }
    }

    /// Update the scroll offset to ensure the cursor row is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }
}
