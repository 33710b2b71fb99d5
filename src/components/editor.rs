use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};
use syntect::easy::HighlightLines;
use syntect::highlighting::Theme;
use syntect::parsing::SyntaxSet;

use crate::editor::TextBuffer;
use crate::syntax::syntax_for_language;
use crate::theme::ThemeColors;

/// Editor view: line numbers, syntect highlighting and a block cursor.
pub struct EditorWidget<'a> {
    buffer: &'a TextBuffer,
    language: &'a str,
    theme: &'a ThemeColors,
    syntax_set: &'a SyntaxSet,
    syntax_theme: &'a Theme,
    show_cursor: bool,
    block: Option<Block<'a>>,
}

impl<'a> EditorWidget<'a> {
    pub fn new(
        buffer: &'a TextBuffer,
        language: &'a str,
        theme: &'a ThemeColors,
        syntax_set: &'a SyntaxSet,
        syntax_theme: &'a Theme,
    ) -> Self {
        Self {
            buffer,
            language,
            theme,
            syntax_set,
            syntax_theme,
            show_cursor: true,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Hide the cursor while the tree has focus.
    pub fn show_cursor(mut self, show: bool) -> Self {
        self.show_cursor = show;
        self
    }

    fn draw_gutter(&self, line_idx: usize, x: u16, y: u16, width: u16, buf: &mut Buffer) {
        let style = if line_idx == self.buffer.cursor_line {
            Style::default()
                .fg(self.theme.editor_line_nr_current)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.editor_line_nr)
        };
        let number = format!("{:>w$} ", line_idx + 1, w = width.saturating_sub(2) as usize);
        buf.set_stringn(x, y, number, width as usize, style);
        buf.set_string(
            x + width - 1,
            y,
            "│",
            Style::default().fg(self.theme.editor_gutter_sep),
        );
    }

    /// Paint one highlighted line into `area`, a single row.
    fn draw_code(
        &self,
        segments: &[(syntect::highlighting::Style, &str)],
        area: Rect,
        line_bg: Option<Color>,
        cursor_col: Option<usize>,
        buf: &mut Buffer,
    ) {
        if let Some(bg) = line_bg {
            buf.set_style(area, Style::default().bg(bg));
        }
        let cursor_style = Style::default()
            .fg(self.theme.editor_cursor_fg)
            .bg(self.theme.editor_cursor_bg);

        let chars = segments.iter().flat_map(|(style, text)| {
            let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
            text.chars().map(move |ch| (fg, ch))
        });
        let mut written = 0;
        for (col, (fg, ch)) in chars.take(area.width as usize).enumerate() {
            let style = if cursor_col == Some(col) {
                cursor_style
            } else {
                let base = Style::default().fg(fg);
                line_bg.map_or(base, |bg| base.bg(bg))
            };
            let shown = if ch == '\t' { ' ' } else { ch };
            buf.set_string(area.x + col as u16, area.y, shown.to_string(), style);
            written = col + 1;
        }

        // Cursor at or past the end of the line.
        if let Some(col) = cursor_col.filter(|&c| c >= written && c < area.width as usize) {
            buf.set_string(area.x + col as u16, area.y, " ", cursor_style);
        }
    }
}

impl<'a> Widget for EditorWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };

        let gutter_w = self.buffer.gutter_width();
        if inner.is_empty() || inner.width <= gutter_w {
            return;
        }

        let scroll = self.buffer.scroll_offset;
        let syntax = syntax_for_language(self.syntax_set, self.language);
        let mut highlighter = HighlightLines::new(syntax, self.syntax_theme);
        // Lines above the viewport still advance the parser state.
        for line in self.buffer.lines.iter().take(scroll) {
            let _ = highlighter.highlight_line(line, self.syntax_set);
        }

        for (row, y) in (inner.y..inner.bottom()).enumerate() {
            let line_idx = scroll + row;
            let Some(text) = self.buffer.lines.get(line_idx) else {
                buf.set_string(inner.x, y, "~", Style::default().fg(self.theme.dim_fg));
                continue;
            };

            self.draw_gutter(line_idx, inner.x, y, gutter_w, buf);

            let on_cursor_line = self.show_cursor && line_idx == self.buffer.cursor_line;
            let segments = highlighter
                .highlight_line(text, self.syntax_set)
                .unwrap_or_default();
            let code = Rect::new(inner.x + gutter_w, y, inner.width - gutter_w, 1);
            self.draw_code(
                &segments,
                code,
                on_cursor_line.then_some(self.theme.editor_current_line_bg),
                on_cursor_line.then_some(self.buffer.cursor_col),
                buf,
            );
        }
    }
}

/// Placeholder shown when no file is open.
pub fn empty_editor_hint(theme: &ThemeColors) -> Line<'static> {
    let dim = Style::default().fg(theme.dim_fg);
    Line::from(vec![
        Span::styled("Select a file and press ", dim),
        Span::styled("Enter", Style::default().fg(theme.accent_fg).add_modifier(Modifier::BOLD)),
        Span::styled(" to edit it.", dim),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use syntect::highlighting::ThemeSet;

    struct Fixture {
        colors: ThemeColors,
        syntaxes: SyntaxSet,
        highlight: Theme,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                colors: crate::theme::dark_theme(),
                syntaxes: SyntaxSet::load_defaults_nonewlines(),
                highlight: ThemeSet::load_defaults().themes["base16-ocean.dark"].clone(),
            }
        }

        fn widget<'a>(&'a self, text: &'a TextBuffer, language: &'a str) -> EditorWidget<'a> {
            EditorWidget::new(text, language, &self.colors, &self.syntaxes, &self.highlight)
        }
    }

    fn draw(widget: EditorWidget, width: u16, height: u16) -> (Buffer, Vec<String>) {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        let rows = (0..height)
            .map(|y| (0..width).map(|x| buf.cell((x, y)).unwrap().symbol()).collect())
            .collect();
        (buf, rows)
    }

    #[test]
    fn lines_are_numbered() {
        let fx = Fixture::new();
        let text = TextBuffer::new("line1\nline2\nline3", 4);
        let (_, rows) = draw(fx.widget(&text, "plaintext"), 40, 5);
        assert!(rows[0].starts_with("1 │line1"));
        assert!(rows[2].starts_with("3 │line3"));
        assert!(rows[3].starts_with('~'));
    }

    #[test]
    fn content_sits_inside_block() {
        let fx = Fixture::new();
        let text = TextBuffer::new("{\"a\": 1}", 4);
        let block = Block::default()
            .title(" settings.json ")
            .borders(ratatui::widgets::Borders::ALL);
        let (_, rows) = draw(fx.widget(&text, "json").block(block), 40, 5);
        assert!(rows[0].contains("settings.json"));
        assert!(rows[1].contains("1 │{\"a\": 1}"));
    }

    #[test]
    fn cursor_cell_uses_cursor_colors() {
        let fx = Fixture::new();
        let mut text = TextBuffer::new("abc", 4);
        text.set_cursor_position(0, 1);
        let (buf, _) = draw(fx.widget(&text, "plaintext"), 20, 2);
        // Gutter "1 │" is three cells wide.
        let cell = buf.cell((4, 0)).unwrap();
        assert_eq!(cell.symbol(), "b");
        assert_eq!(cell.bg, fx.colors.editor_cursor_bg);
        assert_eq!(buf.cell((5, 0)).unwrap().bg, fx.colors.editor_current_line_bg);
    }

    #[test]
    fn cursor_after_last_char() {
        let fx = Fixture::new();
        let mut text = TextBuffer::new("ab", 4);
        text.set_cursor_position(0, 2);
        let (buf, _) = draw(fx.widget(&text, "plaintext"), 20, 2);
        assert_eq!(buf.cell((5, 0)).unwrap().bg, fx.colors.editor_cursor_bg);
    }

    #[test]
    fn hidden_cursor_leaves_line_plain() {
        let fx = Fixture::new();
        let text = TextBuffer::new("abc", 4);
        let (buf, _) = draw(fx.widget(&text, "plaintext").show_cursor(false), 20, 2);
        assert_ne!(buf.cell((3, 0)).unwrap().bg, fx.colors.editor_cursor_bg);
    }

    #[test]
    fn view_starts_at_scroll_offset() {
        let fx = Fixture::new();
        let content = (1..=50).map(|i| format!("row{}", i)).collect::<Vec<_>>().join("\n");
        let mut text = TextBuffer::new(&content, 4);
        text.scroll_offset = 10;
        let (_, rows) = draw(fx.widget(&text, "plaintext").show_cursor(false), 30, 3);
        assert!(rows[0].starts_with("11 │row11"));
    }
}
