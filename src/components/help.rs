use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::theme::ThemeColors;

/// `(keys, description)` pairs, grouped under a heading.
type KeyTable = (&'static str, &'static [(&'static str, &'static str)]);

const SECTIONS: &[KeyTable] = &[
    (
        "Navigation",
        &[
            ("j / ↓", "Move down"),
            ("k / ↑", "Move up"),
            ("g / Home", "Jump to first item"),
            ("G / End", "Jump to last item"),
            ("Enter / l / →", "Open file / expand folder"),
            ("h / ←", "Collapse / go to parent"),
            ("Tab", "Focus the editor"),
            ("Mouse click", "Select, click again to open"),
        ],
    ),
    (
        "Managing Paths",
        &[
            ("a", "Add a file or folder"),
            ("s", "Scan a folder for config files"),
            ("n", "Add common config files"),
            ("d / Delete", "Stop managing (top-level items)"),
            ("r", "Reload folder contents"),
            ("o", "Reveal in file manager"),
        ],
    ),
    (
        "Tags & Filters",
        &[
            ("t", "Tag the selected item"),
            ("M", "Manage tags"),
            ("1-9", "Toggle filter by tag"),
            ("0", "Clear tag filter"),
            ("/", "Filter by name"),
            ("m", "Show / hide missing files"),
        ],
    ),
    (
        "Editor",
        &[
            ("Esc", "Back to the tree"),
            ("Ctrl+S", "Save file"),
            ("Ctrl+W", "Close file"),
            ("Ctrl+Z / Ctrl+Y", "Undo / redo"),
            ("Home / End", "Start / end of line"),
            ("Ctrl+Home/End", "Top / bottom of file"),
            ("PgUp / PgDn", "Page up / page down"),
            ("Tab / Shift+Tab", "Indent / dedent"),
            ("Scroll wheel", "Move the cursor by line"),
        ],
    ),
    (
        "General",
        &[
            ("?", "Toggle this help overlay"),
            ("T", "Toggle dark / light theme"),
            ("q / Ctrl+C", "Quit (tree)"),
            ("Ctrl+Q", "Quit (editor)"),
        ],
    ),
];

const KEY_COLUMN: usize = 20;

/// Keybinding reference drawn over the main view.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
    scroll_offset: usize,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a ThemeColors, scroll_offset: usize) -> Self {
        Self {
            theme,
            scroll_offset,
        }
    }

    fn content_lines(&self) -> Vec<Line<'static>> {
        let heading = Style::default()
            .fg(self.theme.accent_fg)
            .add_modifier(Modifier::BOLD);
        let key_style = Style::default()
            .fg(self.theme.warning_fg)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(self.theme.tree_file_fg);

        let mut lines = vec![
            Line::from(Span::styled(" Keybinding Reference ", heading)),
            Line::from(""),
        ];
        for (name, entries) in SECTIONS {
            lines.push(Line::from(vec![
                Span::styled(format!("── {} ", name), heading),
                Span::styled("─".repeat(30), Style::default().fg(self.theme.dim_fg)),
            ]));
            lines.extend(entries.iter().map(|(key, desc)| {
                Line::from(vec![
                    Span::styled(format!("  {:<width$}", key, width = KEY_COLUMN), key_style),
                    Span::styled(*desc, desc_style),
                ])
            }));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            " ? or Esc closes, j/k scroll ",
            Style::default().fg(self.theme.dim_fg),
        )));
        lines
    }

    /// Number of content lines, the bound for scrolling.
    pub fn total_lines() -> usize {
        // Title and blank, then per section a heading, entries and a blank,
        // then the footer.
        2 + SECTIONS.iter().map(|(_, e)| e.len() + 2).sum::<usize>() + 1
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (area.width * 7 / 10).clamp(area.width.min(50), 80);
        let height = (area.height * 4 / 5).min(50);
        let overlay = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );

        Clear.render(overlay, buf);
        let block = Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_focused_fg))
            .style(Style::default().bg(self.theme.dialog_bg));
        let inner = block.inner(overlay);
        block.render(overlay, buf);

        let lines = self.content_lines();
        let visible = inner.height as usize;
        for (row, line) in lines.iter().skip(self.scroll_offset).take(visible).enumerate() {
            buf.set_line(inner.x + 1, inner.y + row as u16, line, inner.width.saturating_sub(2));
        }

        if lines.len() > visible && overlay.height > 0 {
            let indicator = Span::styled(
                format!(" {}/{} ", (self.scroll_offset + 1).min(lines.len()), lines.len()),
                Style::default().fg(self.theme.dim_fg),
            );
            let w = indicator.width() as u16;
            buf.set_span(
                overlay.x + overlay.width.saturating_sub(w + 1),
                overlay.y + overlay.height - 1,
                &indicator,
                w,
            );
        }
    }
}
