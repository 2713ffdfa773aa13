use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// One tab label and whether its view is still loading.
#[derive(Debug, Clone, Copy)]
pub struct TabLabel<'a> {
    pub title: &'a str,
    pub busy: bool,
}

/// Single-line tab bar; busy views carry a `*` mark.
pub struct TabsBarWidget<'a> {
    labels: &'a [TabLabel<'a>],
    active: usize,
    theme: &'a ThemeColors,
}

impl<'a> TabsBarWidget<'a> {
    pub fn new(labels: &'a [TabLabel<'a>], active: usize, theme: &'a ThemeColors) -> Self {
        Self {
            labels,
            active,
            theme,
        }
    }
}

impl<'a> Widget for TabsBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let mut spans = Vec::new();
        for (i, label) in self.labels.iter().enumerate() {
            let style = if i == self.active {
                Style::default()
                    .fg(self.theme.border_focused_fg)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(self.theme.fg)
            };
            spans.push(Span::styled(format!(" {}:{} ", i + 1, label.title), style));
            if label.busy {
                spans.push(Span::styled(
                    "*",
                    Style::default()
                        .fg(self.theme.busy_fg)
                        .add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.push(Span::raw(" "));
            }
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
