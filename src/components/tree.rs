use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::vcs::listing::format_size;
use crate::vcs::tree::{FlatItem, NodeKind, RepoNode, RepoTree};

/// Renders the repository tree with box-drawing characters and a
/// revision/author/age column on the right.
pub struct RepoTreeWidget<'a> {
    tree: &'a RepoTree,
    theme: &'a ThemeColors,
    now: DateTime<Utc>,
    block: Option<Block<'a>>,
}

impl<'a> RepoTreeWidget<'a> {
    pub fn new(tree: &'a RepoTree, theme: &'a ThemeColors, now: DateTime<Utc>) -> Self {
        Self {
            tree,
            theme,
            now,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Build the indentation prefix; continuation lines depend on whether
    /// each ancestor was the last of its siblings.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut prefix = String::new();
        for d in 1..item.depth {
            let mut ancestor_is_last = false;
            for j in (0..item_index).rev() {
                if items[j].depth == d {
                    ancestor_is_last = items[j].is_last_sibling;
                    break;
                }
                if items[j].depth < d {
                    break;
                }
            }
            prefix.push_str(if ancestor_is_last { "   " } else { "│  " });
        }
        prefix.push_str(if item.is_last_sibling { "└──" } else { "├──" });
        prefix
    }

    fn item_indicator(item: &FlatItem) -> &'static str {
        match item.kind {
            NodeKind::Directory if item.is_open => "▾ ",
            NodeKind::Directory => "▸ ",
            NodeKind::File => "  ",
            NodeKind::Error => "! ",
            NodeKind::Busy => "… ",
        }
    }

    fn item_style(&self, item: &FlatItem) -> Style {
        match item.kind {
            NodeKind::Directory => Style::default()
                .fg(self.theme.dir_fg)
                .add_modifier(Modifier::BOLD),
            NodeKind::File => Style::default().fg(self.theme.fg),
            NodeKind::Error => Style::default().fg(self.theme.error_fg),
            NodeKind::Busy => Style::default()
                .fg(self.theme.busy_fg)
                .add_modifier(Modifier::ITALIC),
        }
    }

    /// "r123  alice  1.5 KB  3 days", or empty for placeholder rows.
    fn details(&self, node: &RepoNode) -> String {
        let mut parts = Vec::new();
        if let Some(rev) = node.revision {
            parts.push(format!("r{rev}"));
        }
        if !node.author.is_empty() {
            parts.push(node.author.clone());
        }
        if let Some(size) = node.size.filter(|_| node.kind == NodeKind::File) {
            parts.push(format_size(size));
        }
        if let Some(age) = node.age(self.now) {
            parts.push(age);
        }
        parts.join("  ")
    }
}

impl<'a> Widget for RepoTreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let items = &self.tree.flat_items;
        let visible_height = inner_area.height as usize;
        if items.is_empty() || visible_height == 0 {
            return;
        }
        let width = inner_area.width as usize;

        let visible_items = items
            .iter()
            .enumerate()
            .skip(self.tree.scroll_offset)
            .take(visible_height);

        for (i, (idx, item)) in visible_items.enumerate() {
            let y = inner_area.y + i as u16;
            let is_selected = idx == self.tree.selected_index;

            let prefix = Self::build_prefix(item, items, idx);
            let label = format!("{}{}{}", prefix, Self::item_indicator(item), item.name);
            let details = self
                .tree
                .node(item.id)
                .map(|node| self.details(node))
                .unwrap_or_default();

            let label_len = label.chars().count();
            let details_len = details.chars().count();
            let gap = width.saturating_sub(label_len + details_len);

            let mut style = self.item_style(item);
            let mut details_style = Style::default().fg(self.theme.dim_fg);
            if is_selected {
                style = style.bg(self.theme.selected_bg);
                details_style = details_style.bg(self.theme.selected_bg);
            }

            let mut spans = vec![Span::styled(label, style)];
            if gap > 0 && details_len > 0 {
                spans.push(Span::styled(" ".repeat(gap), details_style));
                spans.push(Span::styled(details, details_style));
            } else if is_selected && width > label_len {
                spans.push(Span::styled(" ".repeat(width - label_len), details_style));
            }

            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
