//! Color palettes: Catppuccin Mocha (dark), Catppuccin Latte (light), and
//! a custom palette built from the `[theme.custom]` config table. Tag
//! chips carry their own `#rrggbb` colors.

use ratatui::style::Color;

use crate::config::{ThemeColorsConfig, ThemeConfig};

#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_bg: Color,
    pub tree_fg: Color,
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_folder_fg: Color,
    pub tree_file_fg: Color,
    pub tree_missing_fg: Color,

    // Editor panel
    pub editor_bg: Color,
    pub editor_fg: Color,
    pub editor_line_nr: Color,
    pub editor_line_nr_current: Color,
    pub editor_gutter_sep: Color,
    pub editor_cursor_fg: Color,
    pub editor_cursor_bg: Color,
    pub editor_current_line_bg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Chrome
    pub border_fg: Color,
    pub border_focused_fg: Color,

    // Dialogs
    pub dialog_bg: Color,
    pub dialog_border_fg: Color,

    // Fixed per palette; not overridable from config.
    pub error_fg: Color,
    pub warning_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub accent_fg: Color,
    pub dim_fg: Color,
}

/// Dark theme using Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(205, 214, 244),          // #cdd6f4 (text)
        tree_selected_bg: Color::Rgb(69, 71, 90),    // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_folder_fg: Color::Rgb(137, 180, 250),   // #89b4fa (blue)
        tree_file_fg: Color::Rgb(205, 214, 244),     // #cdd6f4
        tree_missing_fg: Color::Rgb(108, 112, 134),  // #6c7086 (overlay0)

        editor_bg: Color::Reset,
        editor_fg: Color::Rgb(205, 214, 244),
        editor_line_nr: Color::Rgb(108, 112, 134),         // #6c7086 (overlay0)
        editor_line_nr_current: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        editor_gutter_sep: Color::Rgb(69, 71, 90),         // #45475a (surface1)
        editor_cursor_fg: Color::Rgb(30, 30, 46),          // #1e1e2e (base)
        editor_cursor_bg: Color::Rgb(205, 214, 244),       // #cdd6f4 (text)
        editor_current_line_bg: Color::Rgb(49, 50, 68),    // #313244 (surface0)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112),           // #585b70 (surface2)
        border_focused_fg: Color::Rgb(137, 180, 250), // #89b4fa (blue)

        dialog_bg: Color::Rgb(49, 50, 68), // #313244 (surface0)
        dialog_border_fg: Color::Rgb(137, 180, 250),

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        warning_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        accent_fg: Color::Rgb(203, 166, 247),  // #cba6f7 (mauve)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme using Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_bg: Color::Reset,
        tree_fg: Color::Rgb(76, 79, 105),            // #4c4f69 (text)
        tree_selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),
        tree_folder_fg: Color::Rgb(30, 102, 245), // #1e66f5 (blue)
        tree_file_fg: Color::Rgb(76, 79, 105),
        tree_missing_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)

        editor_bg: Color::Reset,
        editor_fg: Color::Rgb(76, 79, 105),
        editor_line_nr: Color::Rgb(156, 160, 176),
        editor_line_nr_current: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        editor_gutter_sep: Color::Rgb(204, 208, 218),
        editor_cursor_fg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        editor_cursor_bg: Color::Rgb(76, 79, 105),
        editor_current_line_bg: Color::Rgb(230, 233, 239), // #e6e9ef (surface0)

        status_bg: Color::Rgb(239, 241, 245),
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)
        border_focused_fg: Color::Rgb(30, 102, 245),

        dialog_bg: Color::Rgb(230, 233, 239),
        dialog_border_fg: Color::Rgb(30, 102, 245),

        error_fg: Color::Rgb(210, 15, 57),    // #d20f39 (red)
        warning_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        success_fg: Color::Rgb(64, 160, 43),  // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),
        accent_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

/// `#rrggbb` or `rrggbb`; anything else is `None`.
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let rgb = u32::from_str_radix(digits, 16).ok()?;
    Some(Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
}

/// Color for a tag chip; unparseable values fall back to the accent color.
pub fn tag_color(hex: &str, theme: &ThemeColors) -> Color {
    parse_hex_color(hex).unwrap_or(theme.accent_fg)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Dark,
    Light,
    Custom,
}

impl Scheme {
    /// Unknown names fall back to dark.
    fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" => Scheme::Light,
            "custom" => Scheme::Custom,
            _ => Scheme::Dark,
        }
    }
}

/// Build the palette for `scheme`.
///
/// `scheme` comes from the runtime toggle or the persisted choice, so it
/// may differ from `config.scheme`. A custom scheme starts from the dark
/// palette.
pub fn resolve_scheme(scheme: &str, config: &ThemeConfig) -> ThemeColors {
    match Scheme::from_name(scheme) {
        Scheme::Dark => dark_theme(),
        Scheme::Light => light_theme(),
        Scheme::Custom => {
            let mut theme = dark_theme();
            if let Some(custom) = &config.custom {
                apply_custom_colors(&mut theme, custom);
            }
            theme
        }
    }
}

fn apply_custom_colors(theme: &mut ThemeColors, custom: &ThemeColorsConfig) {
    let overrides: [(&Option<String>, &mut Color); 15] = [
        (&custom.tree_bg, &mut theme.tree_bg),
        (&custom.tree_fg, &mut theme.tree_fg),
        (&custom.tree_selected_bg, &mut theme.tree_selected_bg),
        (&custom.tree_selected_fg, &mut theme.tree_selected_fg),
        (&custom.tree_folder_fg, &mut theme.tree_folder_fg),
        (&custom.tree_file_fg, &mut theme.tree_file_fg),
        (&custom.tree_missing_fg, &mut theme.tree_missing_fg),
        (&custom.editor_bg, &mut theme.editor_bg),
        (&custom.editor_fg, &mut theme.editor_fg),
        (&custom.editor_line_nr_fg, &mut theme.editor_line_nr),
        (&custom.status_bg, &mut theme.status_bg),
        (&custom.status_fg, &mut theme.status_fg),
        (&custom.border_fg, &mut theme.border_fg),
        (&custom.dialog_bg, &mut theme.dialog_bg),
        (&custom.dialog_border_fg, &mut theme.dialog_border_fg),
    ];
    for (value, slot) in overrides {
        match value.as_deref().map(|v| (v, parse_hex_color(v))) {
            Some((_, Some(color))) => *slot = color,
            Some((raw, None)) => tracing::warn!(value = raw, "ignoring invalid theme color"),
            None => {}
        }
    }
}
