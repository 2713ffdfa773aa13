use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::vcs::classifier::Entry;

/// Renders the rows of one flat list view.
pub struct EntryListWidget<'a> {
    entries: &'a [Entry],
    selected_index: usize,
    scroll_offset: usize,
    theme: &'a ThemeColors,
    block: Option<Block<'a>>,
    placeholder: Option<&'a str>,
}

impl<'a> EntryListWidget<'a> {
    pub fn new(
        entries: &'a [Entry],
        selected_index: usize,
        scroll_offset: usize,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            entries,
            selected_index,
            scroll_offset,
            theme,
            block: None,
            placeholder: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Text shown when the list has no rows.
    pub fn placeholder(mut self, text: &'a str) -> Self {
        self.placeholder = Some(text);
        self
    }

    fn row_style(&self, entry: &Entry, is_cursor: bool) -> Style {
        let mut style = self.theme.row_style(entry.style);
        if entry.selected {
            style = style.fg(self.theme.marked_fg).add_modifier(Modifier::BOLD);
        }
        if is_cursor {
            style = style.bg(self.theme.selected_bg);
        }
        style
    }
}

impl<'a> Widget for EntryListWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let visible_height = inner_area.height as usize;
        if visible_height == 0 || inner_area.width == 0 {
            return;
        }

        if self.entries.is_empty() {
            if let Some(text) = self.placeholder {
                let style = Style::default()
                    .fg(self.theme.dim_fg)
                    .add_modifier(Modifier::ITALIC);
                let line = Line::from(Span::styled(text, style));
                buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            }
            return;
        }

        let rows = self
            .entries
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (idx, entry)) in rows.enumerate() {
            let y = inner_area.y + i as u16;
            let is_cursor = idx == self.selected_index;
            let style = self.row_style(entry, is_cursor);

            let marker = if entry.selected { "● " } else { "  " };
            let mut text = format!("{}{}", marker, entry.display_text);
            if is_cursor {
                // Extend the highlight across the full row.
                let width = inner_area.width as usize;
                let len = text.chars().count();
                if len < width {
                    text.push_str(&" ".repeat(width - len));
                }
            }

            let line = Line::from(Span::styled(text, style));
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::dark_theme;
    use crate::vcs::classifier::StyleTag;

    fn entry(text: &str, selected: bool) -> Entry {
        Entry {
            display_text: text.to_string(),
            sort_key: text.to_string(),
            style: StyleTag::Normal,
            is_error_line: false,
            selected,
        }
    }

    fn row(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn renders_rows_from_scroll_offset() {
        let theme = dark_theme();
        let entries = vec![entry("A  one", false), entry("M  two", true), entry("?  three", false)];
        let area = Rect::new(0, 0, 12, 2);
        let mut buf = Buffer::empty(area);

        EntryListWidget::new(&entries, 1, 1, &theme).render(area, &mut buf);

        assert!(row(&buf, 0, 12).starts_with("● M  two"));
        assert!(row(&buf, 1, 12).starts_with("  ?  three"));
        assert_eq!(buf[(2, 0)].bg, theme.selected_bg);
        assert_eq!(buf[(2, 0)].fg, theme.marked_fg);
    }

    #[test]
    fn error_rows_use_error_color() {
        let theme = dark_theme();
        let entries = vec![Entry::error("svn: E155007: not a working copy")];
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);

        EntryListWidget::new(&entries, 5, 0, &theme).render(area, &mut buf);

        assert_eq!(buf[(2, 0)].fg, theme.error_fg);
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let theme = dark_theme();
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);

        EntryListWidget::new(&[], 0, 0, &theme)
            .placeholder("(no changes)")
            .render(area, &mut buf);

        assert!(row(&buf, 0, 20).starts_with("(no changes)"));
    }
}
