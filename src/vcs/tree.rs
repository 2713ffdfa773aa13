//! The repository browser: a lazily populated tree of `svn list` results.
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Every
//! directory node owns at most one running listing process; while it runs,
//! the node's only child is a `Busy` placeholder.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tempfile::{Builder, NamedTempFile};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::event::Event;
use crate::vcs::action;
use crate::vcs::command::{rev_option, Substitution};
use crate::vcs::expansion::ExpansionMemory;
use crate::vcs::list::compare_keys;
use crate::vcs::listing::{self, EntryKind, Listing};
use crate::vcs::process::{LinkId, LinkLine, ProcessLink, Termination};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    Error,
    Busy,
}

impl NodeKind {
    /// Synthetic rows sort ahead of real entries.
    fn is_placeholder(self) -> bool {
        matches!(self, NodeKind::Error | NodeKind::Busy)
    }
}

/// Command templates the tree needs.
#[derive(Debug, Clone)]
pub struct TreeCommands {
    /// Value of `$svn`.
    pub svn: String,
    /// Listing template; uses `$path` and `$rev_option`.
    pub list: String,
    /// Rename template; uses `$src` and `$dst`.
    pub rename: String,
}

pub struct RepoNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Display name; for `Error` nodes, the diagnostic text.
    pub name: String,
    pub repo_path: String,
    pub revision_pin: Option<String>,
    pub kind: NodeKind,
    pub revision: Option<u64>,
    pub mod_time: Option<DateTime<Utc>>,
    pub author: String,
    pub size: Option<u64>,
    pub needs_update: bool,
    pub is_open: bool,
    link: Option<ProcessLink>,
    artifact: Option<NamedTempFile>,
    errors: Vec<String>,
}

impl RepoNode {
    fn new(parent: Option<NodeId>, name: String, repo_path: String, kind: NodeKind) -> Self {
        Self {
            parent,
            children: Vec::new(),
            name,
            repo_path,
            revision_pin: None,
            kind,
            revision: None,
            mod_time: None,
            author: String::new(),
            size: None,
            needs_update: kind == NodeKind::Directory,
            is_open: false,
            link: None,
            artifact: None,
            errors: Vec::new(),
        }
    }

    fn placeholder(parent: NodeId, kind: NodeKind, text: String) -> Self {
        Self::new(Some(parent), text, String::new(), kind)
    }

    /// Time since the last commit, e.g. "3 days".
    pub fn age(&self, now: DateTime<Utc>) -> Option<String> {
        self.mod_time.map(|t| listing::format_age(t, now))
    }

    pub fn is_busy(&self) -> bool {
        self.link.is_some()
    }
}

/// A flattened row of the visible tree, used for rendering.
#[derive(Debug, Clone)]
pub struct FlatItem {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub depth: usize,
    pub is_open: bool,
    pub is_last_sibling: bool,
}

pub struct RepoTree {
    nodes: Vec<Option<RepoNode>>,
    free: Vec<usize>,
    root: NodeId,
    links: HashMap<LinkId, NodeId>,
    memory: ExpansionMemory,
    commands: TreeCommands,
    notify: mpsc::UnboundedSender<Event>,
    /// Where listing artifacts are created.
    artifact_dir: PathBuf,
    /// Path the cursor returns to once its node is listed again.
    pending_selection: Option<String>,
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    version: u64,
}

impl RepoTree {
    /// Create a tree rooted at `repo_path`. Nothing runs until the root is opened.
    pub fn new(
        repo_path: &str,
        revision_pin: Option<String>,
        commands: TreeCommands,
        notify: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let mut root = RepoNode::new(
            None,
            repo_path.to_string(),
            repo_path.to_string(),
            NodeKind::Directory,
        );
        root.revision_pin = revision_pin;

        let mut tree = Self {
            nodes: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
            links: HashMap::new(),
            memory: ExpansionMemory::new(),
            commands,
            notify,
            artifact_dir: std::env::temp_dir(),
            pending_selection: None,
            flat_items: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            version: 0,
        };
        tree.flatten();
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&RepoNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut RepoNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether any listing is still running.
    pub fn is_busy(&self) -> bool {
        !self.links.is_empty()
    }

    pub fn memory(&self) -> &ExpansionMemory {
        &self.memory
    }

    /// Find a live node by repository path.
    pub fn find(&self, repo_path: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| {
                n.as_ref()
                    .map(|n| !n.kind.is_placeholder() && n.repo_path == repo_path)
                    .unwrap_or(false)
            })
            .map(|(i, _)| NodeId(i))
    }

    // ---- arena -----------------------------------------------------------

    fn alloc(&mut self, node: RepoNode) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Drop `id` and its subtree. Running listings are killed and their
    /// artifacts deleted as the nodes go.
    fn remove_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) else {
                continue;
            };
            if let Some(link) = &node.link {
                self.links.remove(&link.id());
            }
            stack.extend(node.children.iter().copied());
            self.free.push(current.0);
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = match self.node_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn insert_sorted(&mut self, parent: NodeId, child: NodeId) {
        let Some(new_name) = self.node(child).map(|n| n.name.clone()) else {
            return;
        };
        let siblings = self.children(parent);
        let pos = siblings.partition_point(|&s| {
            self.node(s)
                .map(|n| {
                    n.kind.is_placeholder()
                        || compare_keys(&n.name, &new_name) != std::cmp::Ordering::Greater
                })
                .unwrap_or(true)
        });
        if let Some(node) = self.node_mut(parent) {
            node.children.insert(pos, child);
        }
    }

    fn resort_children(&mut self, parent: NodeId) {
        let Some(mut children) = self.node_mut(parent).map(|n| std::mem::take(&mut n.children))
        else {
            return;
        };
        children.sort_by(|&a, &b| {
            let (Some(a), Some(b)) = (self.node(a), self.node(b)) else {
                return std::cmp::Ordering::Equal;
            };
            match (a.kind.is_placeholder(), b.kind.is_placeholder()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                (false, false) => compare_keys(&a.name, &b.name),
            }
        });
        if let Some(node) = self.node_mut(parent) {
            node.children = children;
        }
    }

    // ---- listing life-cycle ---------------------------------------------

    fn listing_command(&self, node: &RepoNode) -> String {
        Substitution::new()
            .arg("svn", &self.commands.svn)
            .arg("path", &node.repo_path)
            .raw("rev_option", rev_option(node.revision_pin.as_deref()))
            .apply(&self.commands.list)
    }

    /// Re-list the children of `id`, cancelling a listing already running.
    ///
    /// On failure the node's children are left as they were.
    pub fn update(&mut self, id: NodeId) -> Result<()> {
        let command = match self.node(id) {
            Some(node) if node.kind == NodeKind::Directory => self.listing_command(node),
            _ => return Ok(()),
        };

        // Created before the running listing is cancelled; if this fails,
        // that listing keeps running behind its placeholder.
        let artifact = Builder::new()
            .prefix("svnview-list-")
            .tempfile_in(&self.artifact_dir)?;
        let stdout = artifact.reopen()?;

        let had_link = self.cancel_listing(id);
        let link = match ProcessLink::spawn_to_file(&command, None, stdout, self.notify.clone()) {
            Ok(link) => link,
            Err(e) => {
                // A cancelled run leaves only its placeholder behind.
                if had_link {
                    self.clear_children(id);
                    self.flatten();
                }
                return Err(e);
            }
        };

        let cursor_inside = self.hold_selection(id);
        self.clear_children(id);
        let busy = self.alloc(RepoNode::placeholder(id, NodeKind::Busy, "Loading...".into()));
        self.links.insert(link.id(), id);
        if let Some(node) = self.node_mut(id) {
            info!(node = %node.repo_path, link = %link.id(), "listing started");
            node.children.push(busy);
            node.link = Some(link);
            node.artifact = Some(artifact);
            node.needs_update = false;
        }
        self.flatten();
        if cursor_inside {
            if let Some(i) = self.flat_items.iter().position(|item| item.id == id) {
                self.selected_index = i;
            }
        }
        Ok(())
    }

    /// Kill the listing running for `id`. Returns whether there was one.
    fn cancel_listing(&mut self, id: NodeId) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let link = node.link.take();
        node.artifact = None;
        node.errors.clear();
        let Some(mut link) = link else {
            return false;
        };
        link.kill();
        let link_id = link.id();
        self.links.remove(&link_id);
        debug!(link = %link_id, "cancelled listing");
        true
    }

    /// Remember the cursor's path when it sits below `id`, whose children
    /// are about to be replaced. Returns whether it does.
    fn hold_selection(&mut self, id: NodeId) -> bool {
        let Some(selected) = self.selected_id() else {
            return false;
        };
        if selected == id || !self.is_descendant(selected, id) {
            return false;
        }
        if self.pending_selection.is_none() {
            self.pending_selection = self.selected_path().map(str::to_string);
            debug!(path = ?self.pending_selection, "holding selection");
        }
        true
    }

    fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.node(parent).and_then(|n| n.parent);
        }
        false
    }

    /// Put the cursor back on the held path once it is visible again.
    ///
    /// The held path is dropped when every listing has finished without
    /// bringing it back.
    fn restore_selection(&mut self) {
        let Some(path) = self.pending_selection.clone() else {
            return;
        };
        if self.select_path(&path) {
            debug!(path = %path, "selection restored");
            self.pending_selection = None;
        } else if self.links.is_empty() {
            debug!(path = %path, "selected path is gone");
            self.pending_selection = None;
        }
    }

    /// Consume a wake-up for `link_id`. Returns whether this tree owned it.
    pub fn handle_link_event(&mut self, link_id: LinkId) -> bool {
        let Some(&id) = self.links.get(&link_id) else {
            return false;
        };
        let Some(node) = self.node_mut(id) else {
            self.links.remove(&link_id);
            return false;
        };
        let Some(link) = node.link.as_mut() else {
            self.links.remove(&link_id);
            return false;
        };

        while let LinkLine::Line(line) = link.next_stderr_line() {
            node.errors.push(line);
        }
        while let LinkLine::Line(line) = link.next_stdout_line() {
            debug!(link = %link_id, line, "unexpected stdout from listing");
        }

        if let Some(termination) = link.poll_terminated() {
            self.finish_update(id, termination);
        }
        true
    }

    fn finish_update(&mut self, id: NodeId, termination: Termination) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let link = node.link.take();
        let artifact = node.artifact.take();
        let mut errors = std::mem::take(&mut node.errors);
        let repo_path = node.repo_path.clone();

        let command = link.as_ref().map(|l| l.command().to_string()).unwrap_or_default();
        if let Some(link) = &link {
            self.links.remove(&link.id());
        }

        if !termination.success && errors.is_empty() {
            errors.push(format!("`{}` ended with {}", command, termination));
        }

        let text = match &artifact {
            Some(file) => std::fs::read_to_string(file.path()).map_err(AppError::from),
            None => Err(AppError::Parse("listing output missing".into())),
        };
        // Dropping the artifact deletes the file.
        drop(artifact);

        let listing = match text {
            Ok(text) if text.trim().is_empty() && !errors.is_empty() => None,
            Ok(text) => match listing::parse_listing(&text) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    warn!(node = %repo_path, error = %e, "listing could not be parsed");
                    errors.push(e.to_string());
                    None
                }
            },
            Err(e) => {
                warn!(node = %repo_path, error = %e, "listing could not be read");
                errors.push(e.to_string());
                None
            }
        };

        info!(
            node = %repo_path,
            entries = listing.as_ref().map(|l| l.entries.len()).unwrap_or(0),
            errors = errors.len(),
            %termination,
            "listing finished"
        );
        self.install_listing(id, listing, errors);
    }

    /// Replace the placeholder of `id` with parsed children and error rows,
    /// then reopen any child the expansion memory asks for.
    fn install_listing(&mut self, id: NodeId, listing: Option<Listing>, errors: Vec<String>) {
        self.clear_children(id);
        let Some(parent) = self.node(id) else {
            return;
        };
        let pin = parent.revision_pin.clone();
        let parent_path = parent.repo_path.clone();

        let mut added = Vec::new();
        if let Some(Listing { path: list_path, entries }) = listing {
            let base = if list_path.is_empty() { parent_path } else { list_path };
            for entry in entries {
                let repo_path = listing::join_repo_path(&base, &entry.name);
                let kind = match entry.kind {
                    EntryKind::Directory => NodeKind::Directory,
                    EntryKind::File => NodeKind::File,
                };
                let mut node = RepoNode::new(Some(id), entry.name, repo_path, kind);
                node.revision_pin = pin.clone();
                node.revision = entry.revision;
                node.mod_time = entry.date;
                node.author = entry.author;
                node.size = entry.size;

                let child = self.alloc(node);
                self.insert_sorted(id, child);
                added.push(child);
            }
        }

        for (i, text) in errors.into_iter().enumerate() {
            let error = self.alloc(RepoNode::placeholder(id, NodeKind::Error, text));
            if let Some(node) = self.node_mut(id) {
                node.children.insert(i, error);
            }
        }

        for child in added {
            self.reopen_if_needed(child);
        }
        self.flatten();
        self.restore_selection();
    }

    fn reopen_if_needed(&mut self, id: NodeId) {
        let repo_path = match self.node(id) {
            Some(node) if node.kind == NodeKind::Directory => node.repo_path.clone(),
            _ => return,
        };
        if !self.memory.take(&repo_path) {
            return;
        }
        debug!(node = %repo_path, "reopening");
        if let Err(e) = self.open_node(id) {
            warn!(node = %repo_path, error = %e, "could not reopen");
            let error = self.alloc(RepoNode::placeholder(id, NodeKind::Error, e.to_string()));
            if let Some(node) = self.node_mut(id) {
                node.children.insert(0, error);
            }
        }
    }

    /// Open a directory, listing it the first time.
    ///
    /// `needs_update` is cleared before the listing starts so repeated
    /// requests do not spawn twice.
    pub fn open_node(&mut self, id: NodeId) -> Result<()> {
        let Some(node) = self.node_mut(id) else {
            return Ok(());
        };
        if node.kind != NodeKind::Directory {
            return Ok(());
        }
        node.is_open = true;
        let first = std::mem::replace(&mut node.needs_update, false);
        let result = if first { self.update(id) } else { Ok(()) };
        if result.is_err() {
            if let Some(node) = self.node_mut(id) {
                node.needs_update = true;
            }
        }
        self.flatten();
        result
    }

    pub fn close_node(&mut self, id: NodeId) {
        if let Some(node) = self.node_mut(id) {
            node.is_open = false;
        }
        self.flatten();
    }

    /// Repository paths of every open directory below the root, in tree order.
    pub fn open_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut stack: Vec<NodeId> = self.children(self.root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.kind == NodeKind::Directory && node.is_open {
                paths.push(node.repo_path.clone());
                stack.extend(node.children.iter().rev().copied());
            }
        }
        paths
    }

    /// Re-list the whole tree, reopening what is open now.
    ///
    /// A fresh refresh forgets remembered paths that never reappeared.
    pub fn refresh(&mut self, fresh: bool) -> Result<()> {
        if fresh {
            self.memory.clear();
        }
        let open = self.open_paths();
        debug!(
            fresh,
            open = open.len(),
            remembered = self.memory.len(),
            "refreshing tree"
        );
        self.memory.extend(open);
        if let Some(root) = self.node_mut(self.root) {
            root.is_open = true;
        }
        self.update(self.root)
    }

    /// Seed remembered paths, e.g. from the saved state.
    pub fn remember_open<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.memory.extend(paths);
        self.apply_memory();
    }

    /// Make sure `path` ends up open, together with every ancestor below
    /// the root.
    pub fn save_path_to_open(&mut self, path: &str) {
        let path = path.trim_end_matches('/');
        let root = self
            .node(self.root)
            .map(|n| n.repo_path.trim_end_matches('/').to_string())
            .unwrap_or_default();

        match path.strip_prefix(root.as_str()) {
            Some(rest) if rest.starts_with('/') => {
                let mut prefix = root.clone();
                for segment in rest.split('/').filter(|s| !s.is_empty()) {
                    prefix = listing::join_repo_path(&prefix, segment);
                    self.memory.insert(prefix.clone());
                }
            }
            _ => self.memory.insert(path.to_string()),
        }
        info!(path, "saved path to open");
        self.apply_memory();
    }

    /// Open already-listed directories the memory asks for.
    fn apply_memory(&mut self) {
        if self.memory.is_empty() {
            self.flatten();
            return;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let children: Vec<NodeId> = self.children(id).to_vec();
            for child in children {
                self.reopen_if_needed(child);
                if self.node(child).map(|n| n.is_open).unwrap_or(false) {
                    stack.push(child);
                }
            }
        }
        self.flatten();
    }

    /// Rename `id` with a blocking move, then resort its siblings.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        if node.kind.is_placeholder() || id == self.root {
            return Err(AppError::InvalidPath(node.name.clone()));
        }
        let parent = node.parent;
        let parent_path = parent
            .and_then(|p| self.node(p))
            .map(|p| p.repo_path.clone())
            .unwrap_or_default();
        let new_path = listing::join_repo_path(&parent_path, new_name);
        let command = Substitution::new()
            .arg("svn", &self.commands.svn)
            .arg("src", &node.repo_path)
            .arg("dst", &new_path)
            .apply(&self.commands.rename);

        action::run_blocking(&command, None)?;

        let is_dir = node.kind == NodeKind::Directory;
        if is_dir {
            self.clear_children(id);
        }
        if let Some(node) = self.node_mut(id) {
            if let Some(mut link) = node.link.take() {
                link.kill();
            }
            node.name = new_name.to_string();
            node.repo_path = new_path;
            if is_dir {
                node.needs_update = true;
                node.is_open = false;
            }
        }
        if let Some(parent) = parent {
            self.resort_children(parent);
        }
        self.flatten();
        Ok(())
    }

    /// Kill every running listing.
    pub fn shutdown(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            if let Some(mut link) = node.link.take() {
                link.kill();
            }
            node.artifact = None;
        }
        self.links.clear();
    }

    // ---- view ------------------------------------------------------------

    /// Rebuild the flat rows from the open part of the tree.
    pub fn flatten(&mut self) {
        let mut items = Vec::new();
        self.flatten_node(self.root, 0, true, &mut items);
        self.flat_items = items;
        if !self.flat_items.is_empty() && self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
        self.version += 1;
    }

    fn flatten_node(&self, id: NodeId, depth: usize, is_last: bool, items: &mut Vec<FlatItem>) {
        let Some(node) = self.node(id) else {
            return;
        };
        items.push(FlatItem {
            id,
            name: node.name.clone(),
            kind: node.kind,
            depth,
            is_open: node.is_open,
            is_last_sibling: is_last,
        });
        if node.is_open {
            let count = node.children.len();
            for (i, &child) in node.children.iter().enumerate() {
                self.flatten_node(child, depth + 1, i + 1 == count, items);
            }
        }
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.flat_items.get(self.selected_index).map(|item| item.id)
    }

    /// Repository path under the cursor, unless it is a placeholder row.
    pub fn selected_path(&self) -> Option<&str> {
        let node = self.node(self.selected_id()?)?;
        (!node.kind.is_placeholder()).then_some(node.repo_path.as_str())
    }

    /// Move the cursor to the visible node at `repo_path`.
    pub fn select_path(&mut self, repo_path: &str) -> bool {
        let Some(id) = self.find(repo_path) else {
            return false;
        };
        match self.flat_items.iter().position(|item| item.id == id) {
            Some(i) => {
                self.selected_index = i;
                true
            }
            None => false,
        }
    }

    /// A cursor move by the user wins over a held selection.
    fn user_moved(&mut self) {
        self.pending_selection = None;
    }

    pub fn select_next(&mut self) {
        self.user_moved();
        if self.selected_index + 1 < self.flat_items.len() {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.user_moved();
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.user_moved();
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.user_moved();
        self.selected_index = self.flat_items.len().saturating_sub(1);
    }

    pub fn expand_selected(&mut self) -> Result<()> {
        self.user_moved();
        match self.selected_id() {
            Some(id) => self.open_node(id),
            None => Ok(()),
        }
    }

    /// Collapse the selected directory, or jump to its parent.
    pub fn collapse_selected(&mut self) {
        self.user_moved();
        let Some(id) = self.selected_id() else {
            return;
        };
        let Some(node) = self.node(id) else {
            return;
        };
        if node.kind == NodeKind::Directory && node.is_open {
            self.close_node(id);
            return;
        }
        if let Some(parent) = node.parent {
            if let Some(i) = self.flat_items.iter().position(|item| item.id == parent) {
                self.selected_index = i;
            }
        }
    }

    /// Update the scroll offset to ensure the selected item is visible.
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

impl Drop for RepoTree {
    fn drop(&mut self) {
        self.shutdown();
    }
}
