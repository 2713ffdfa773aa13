//! Theme data model: built-in palettes and resolution from config.
//!
//! Two built-in palettes (dark and light) plus custom color overrides from
//! the config file. Row styles for the list views are derived from a
//! [`StyleTag`] here so the widgets never pick colors themselves.

use ratatui::style::{Color, Modifier, Style};

use crate::config::{ThemeColorsConfig, ThemeConfig};
use crate::vcs::classifier::StyleTag;

// ── Runtime theme colors ─────────────────────────────────────────────────────

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub fg: Color,
    pub selected_bg: Color,
    /// Rows the user has marked for an action.
    pub marked_fg: Color,
    pub dir_fg: Color,

    // Row categories
    pub added_fg: Color,
    pub removed_fg: Color,
    pub error_fg: Color,
    pub dim_fg: Color,
    pub emphasis_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders & chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,
    pub busy_fg: Color,
}

// ── Built-in palettes ────────────────────────────────────────────────────────

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        marked_fg: Color::Rgb(203, 166, 247),   // #cba6f7 (mauve)
        dir_fg: Color::Rgb(137, 180, 250),      // #89b4fa (blue)
        added_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        removed_fg: Color::Rgb(166, 173, 200),  // #a6adc8 (subtext0)
        error_fg: Color::Rgb(243, 139, 168),    // #f38ba8 (red)
        dim_fg: Color::Rgb(108, 112, 134),      // #6c7086 (overlay0)
        emphasis_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        status_bg: Color::Rgb(30, 30, 46),      // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),
        border_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250),
        busy_fg: Color::Rgb(250, 179, 135), // #fab387 (peach)
    }
}

/// Light palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        fg: Color::Rgb(76, 79, 105),            // #4c4f69 (text)
        selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        marked_fg: Color::Rgb(136, 57, 239),    // #8839ef (mauve)
        dir_fg: Color::Rgb(30, 102, 245),       // #1e66f5 (blue)
        added_fg: Color::Rgb(30, 102, 245),
        removed_fg: Color::Rgb(108, 111, 133), // #6c6f85 (subtext0)
        error_fg: Color::Rgb(210, 15, 57),     // #d20f39 (red)
        dim_fg: Color::Rgb(156, 160, 176),     // #9ca0b0 (overlay0)
        emphasis_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        status_bg: Color::Rgb(239, 241, 245),  // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),
        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),
        busy_fg: Color::Rgb(254, 100, 11), // #fe640b (peach)
    }
}

impl ThemeColors {
    /// Style of a list row in category `tag`.
    pub fn row_style(&self, tag: StyleTag) -> Style {
        match tag {
            StyleTag::Normal => Style::default().fg(self.fg),
            StyleTag::Error => Style::default().fg(self.error_fg),
            StyleTag::Added => Style::default().fg(self.added_fg),
            StyleTag::Removed => Style::default()
                .fg(self.removed_fg)
                .add_modifier(Modifier::CROSSED_OUT),
            StyleTag::Dimmed => Style::default().fg(self.dim_fg),
            StyleTag::Emphasized => Style::default()
                .fg(self.emphasis_fg)
                .add_modifier(Modifier::BOLD),
        }
    }
}

// ── Color parsing ────────────────────────────────────────────────────────────

/// Parse a hex color string like `"#aabbcc"` into a `ratatui::style::Color`.
/// Returns `None` for malformed input.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

// ── Theme resolution ─────────────────────────────────────────────────────────

/// Resolve the final `ThemeColors` from config.
///
/// - `"dark"` (default): dark Catppuccin palette
/// - `"light"`: light Catppuccin palette
/// - `"custom"`: start from dark palette, then override with custom hex values
pub fn resolve_theme(config: &ThemeConfig) -> ThemeColors {
    match config.scheme.as_deref().unwrap_or("dark") {
        "light" => light_theme(),
        "custom" => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
        _ => dark_theme(),
    }
}

/// Apply custom hex color overrides on top of an existing theme.
fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let overrides: [(&Option<String>, &mut Color); 12] = [
        (&custom.fg, &mut theme.fg),
        (&custom.selected_bg, &mut theme.selected_bg),
        (&custom.marked_fg, &mut theme.marked_fg),
        (&custom.dir_fg, &mut theme.dir_fg),
        (&custom.added_fg, &mut theme.added_fg),
        (&custom.removed_fg, &mut theme.removed_fg),
        (&custom.error_fg, &mut theme.error_fg),
        (&custom.dim_fg, &mut theme.dim_fg),
        (&custom.emphasis_fg, &mut theme.emphasis_fg),
        (&custom.status_bg, &mut theme.status_bg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.border_fg, &mut theme.border_fg),
    ];
    for (value, slot) in overrides {
        if let Some(color) = value.as_deref().and_then(parse_hex_color) {
            *slot = color;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
