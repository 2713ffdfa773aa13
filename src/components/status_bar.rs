use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Status bar: location on the left, info and key hints on the right.
/// A status message or an input prompt replaces the whole bar.
pub struct StatusBarWidget<'a> {
    location: &'a str,
    info: &'a str,
    key_hints: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    prompt: Option<(&'a str, &'a str)>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(location: &'a str, info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            location,
            info,
            key_hints: "",
            theme,
            status_message: None,
            is_error: false,
            prompt: None,
        }
    }

    pub fn key_hints(mut self, hints: &'a str) -> Self {
        self.key_hints = hints;
        self
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    /// Show `label` followed by the text typed so far.
    pub fn prompt(mut self, label: &'a str, input: &'a str) -> Self {
        self.prompt = Some((label, input));
        self
    }
}

/// Keep the last `max_width` characters, marking the cut with "...".
fn truncate_left(text: &str, max_width: usize) -> String {
    let len = text.chars().count();
    if len <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return text.chars().take(max_width).collect();
    }
    let tail: String = text.chars().skip(len - (max_width - 3)).collect();
    format!("...{tail}")
}

fn pad_to(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;
        let bar_style = Style::default()
            .bg(self.theme.status_bg)
            .fg(self.theme.status_fg);

        if let Some((label, input)) = self.prompt {
            let line = Line::from(vec![
                Span::styled(
                    label.to_string(),
                    bar_style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    pad_to(&format!("{input}█"), width.saturating_sub(label.chars().count())),
                    bar_style,
                ),
            ]);
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                bar_style.fg(self.theme.added_fg)
            };
            let line = Line::from(Span::styled(pad_to(msg, width), style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // [location] ... [info] [hints]
        let hints_len = self.key_hints.chars().count();
        let info_len = self.info.chars().count();
        let remaining = width.saturating_sub(hints_len);
        let location_width = remaining.saturating_sub(info_len + 1);
        let location = truncate_left(self.location, location_width);
        let info: String = self
            .info
            .chars()
            .take(remaining.saturating_sub(location.chars().count()))
            .collect();
        let gap = remaining
            .saturating_sub(location.chars().count())
            .saturating_sub(info.chars().count());

        let hints_style = bar_style.fg(self.theme.dim_fg);
        let info_style = bar_style.fg(self.theme.busy_fg);

        let spans = vec![
            Span::styled(location, bar_style),
            Span::styled(" ".repeat(gap), bar_style),
            Span::styled(info, info_style),
            Span::styled(self.key_hints.to_string(), hints_style),
        ];
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::dark_theme;

    fn render(widget: StatusBarWidget, width: u16) -> (String, Buffer) {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let text = (0..width).map(|x| buf[(x, 0)].symbol()).collect();
        (text, buf)
    }

    #[test]
    fn truncate_keeps_tail() {
        assert_eq!(truncate_left("/home/user/wc", 20), "/home/user/wc");
        assert_eq!(truncate_left("/home/user/wc", 8), "...er/wc");
        assert_eq!(truncate_left("/home/user/wc", 2), "/h");
    }

    #[test]
    fn normal_bar_layout() {
        let theme = dark_theme();
        let (text, _) = render(
            StatusBarWidget::new("/wc", "2 marked", &theme).key_hints(" q:quit"),
            30,
        );
        assert!(text.starts_with("/wc"));
        assert!(text.ends_with("2 marked q:quit"));
    }

    #[test]
    fn error_message_replaces_bar() {
        let theme = dark_theme();
        let (text, buf) = render(
            StatusBarWidget::new("/wc", "", &theme)
                .status_message("Another command is still running", true),
            40,
        );
        assert!(text.starts_with("Another command is still running"));
        assert_eq!(buf[(0, 0)].bg, theme.error_fg);
    }

    #[test]
    fn prompt_shows_input() {
        let theme = dark_theme();
        let (text, _) = render(
            StatusBarWidget::new("/wc", "", &theme).prompt("Rename to: ", "lib2"),
            30,
        );
        assert!(text.starts_with("Rename to: lib2█"));
    }
}
