//! Line-based text buffer behind the editor panel.
//!
//! Columns are char indices, never byte offsets. Line endings are detected
//! on load and restored by [`TextBuffer::text`].

/// Line terminator used when joining the buffer back into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineEnding::Lf => "LF",
            LineEnding::CrLf => "CRLF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditKind {
    Insert,
    Delete,
    Other,
}

#[derive(Debug, Clone)]
struct Snapshot {
    lines: Vec<String>,
    cursor_line: usize,
    cursor_col: usize,
}

/// Maximum entries in the undo stack.
const MAX_UNDO_ENTRIES: usize = 1000;

/// Editable text with cursor, viewport and undo history.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    /// Lines without terminators; never empty.
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    /// Index of the topmost visible line.
    pub scroll_offset: usize,
    /// Visible height of the editor area (set during render).
    pub visible_height: usize,
    pub line_ending: LineEnding,
    tab_width: usize,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    last_edit: Option<(EditKind, usize)>,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("", 4)
    }
}

impl TextBuffer {
    pub fn new(content: &str, tab_width: usize) -> Self {
        let line_ending = if content.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };
        let lines = content
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();

        Self {
            lines,
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            visible_height: 24,
            line_ending,
            tab_width: tab_width.max(1),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            last_edit: None,
        }
    }

    /// The buffer joined with its line ending.
    pub fn text(&self) -> String {
        self.lines.join(self.line_ending.as_str())
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Width of the line number gutter (digits + space + separator).
    pub fn gutter_width(&self) -> u16 {
        let digits = self.line_count().max(1).to_string().len() as u16;
        digits + 2
    }

    pub fn current_line_len(&self) -> usize {
        self.lines
            .get(self.cursor_line)
            .map(|l| l.chars().count())
            .unwrap_or(0)
    }

    pub fn set_cursor_position(&mut self, line: usize, col: usize) {
        self.cursor_line = line.min(self.lines.len().saturating_sub(1));
        self.cursor_col = col.min(self.current_line_len());
        self.last_edit = None;
        self.ensure_cursor_visible();
    }

    fn clamp_cursor(&mut self) {
        if self.cursor_line >= self.lines.len() {
            self.cursor_line = self.lines.len().saturating_sub(1);
        }
        let len = self.current_line_len();
        if self.cursor_col > len {
            self.cursor_col = len;
        }
    }

    /// Scroll so the cursor stays inside the viewport with a small margin.
    pub fn ensure_cursor_visible(&mut self) {
        let margin = 2usize;
        if self.visible_height == 0 {
            return;
        }
        if self.cursor_line < self.scroll_offset + margin {
            self.scroll_offset = self.cursor_line.saturating_sub(margin);
        }
        let bottom = self.scroll_offset + self.visible_height;
        if self.cursor_line >= bottom.saturating_sub(margin) {
            self.scroll_offset = self
                .cursor_line
                .saturating_sub(self.visible_height.saturating_sub(margin + 1));
        }
    }

    // ── Undo/Redo ─────────────────────────────────────────────────────

    /// Record the pre-edit state. Consecutive typing or deleting on the
    /// same line collapses into one undo step.
    fn checkpoint(&mut self, kind: EditKind) {
        let merge = kind != EditKind::Other && self.last_edit == Some((kind, self.cursor_line));
        if !merge {
            self.undo_stack.push(Snapshot {
                lines: self.lines.clone(),
                cursor_line: self.cursor_line,
                cursor_col: self.cursor_col,
            });
            if self.undo_stack.len() > MAX_UNDO_ENTRIES {
                self.undo_stack.remove(0);
            }
        }
        self.redo_stack.clear();
        self.last_edit = Some((kind, self.cursor_line));
    }

    fn restore(&mut self, snap: Snapshot) -> Snapshot {
        let current = Snapshot {
            lines: std::mem::replace(&mut self.lines, snap.lines),
            cursor_line: self.cursor_line,
            cursor_col: self.cursor_col,
        };
        self.cursor_line = snap.cursor_line;
        self.cursor_col = snap.cursor_col;
        self.last_edit = None;
        self.clamp_cursor();
        self.ensure_cursor_visible();
        current
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snap) => {
                let current = self.restore(snap);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snap) => {
                let current = self.restore(snap);
                self.undo_stack.push(current);
                true
            }
            None => false,
        }
    }

    // ── Buffer mutation ───────────────────────────────────────────────

    pub fn insert_char(&mut self, ch: char) {
        self.checkpoint(EditKind::Insert);
        if let Some(line) = self.lines.get_mut(self.cursor_line) {
            let byte_idx = char_to_byte_index(line, self.cursor_col);
            line.insert(byte_idx, ch);
            self.cursor_col += 1;
        }
    }

    /// Insert pasted text, which may span several lines.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        self.checkpoint(EditKind::Other);
        let line = &self.lines[self.cursor_line];
        let byte_idx = char_to_byte_index(line, self.cursor_col);
        let tail = line[byte_idx..].to_string();
        self.lines[self.cursor_line].truncate(byte_idx);

        let mut parts = s.split('\n').map(|p| p.strip_suffix('\r').unwrap_or(p));
        if let Some(first) = parts.next() {
            self.lines[self.cursor_line].push_str(first);
            self.cursor_col += first.chars().count();
        }
        for part in parts {
            self.cursor_line += 1;
            self.lines.insert(self.cursor_line, part.to_string());
            self.cursor_col = part.chars().count();
        }
        self.lines[self.cursor_line].push_str(&tail);
        self.ensure_cursor_visible();
    }

    /// Backspace: delete before the cursor, joining lines at column 0.
    pub fn delete_char_before(&mut self) {
        if self.cursor_col > 0 {
            self.checkpoint(EditKind::Delete);
            let line = &mut self.lines[self.cursor_line];
            let start = char_to_byte_index(line, self.cursor_col - 1);
            let end = char_to_byte_index(line, self.cursor_col);
            line.replace_range(start..end, "");
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.checkpoint(EditKind::Other);
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
            self.lines[self.cursor_line].push_str(&current);
            self.ensure_cursor_visible();
        }
    }

    /// Delete key: delete at the cursor, joining the next line at line end.
    pub fn delete_char_at(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.checkpoint(EditKind::Delete);
            let line = &mut self.lines[self.cursor_line];
            let start = char_to_byte_index(line, self.cursor_col);
            let end = char_to_byte_index(line, self.cursor_col + 1);
            line.replace_range(start..end, "");
        } else if self.cursor_line + 1 < self.lines.len() {
            self.checkpoint(EditKind::Other);
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
        }
    }

    /// Split the line at the cursor, copying the leading whitespace.
    pub fn insert_newline(&mut self) {
        self.checkpoint(EditKind::Other);
        let line = &self.lines[self.cursor_line];
        let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        let byte_idx = char_to_byte_index(line, self.cursor_col);
        let remainder = line[byte_idx..].to_string();

        self.lines[self.cursor_line].truncate(byte_idx);
        self.lines
            .insert(self.cursor_line + 1, format!("{}{}", indent, remainder));
        self.cursor_line += 1;
        self.cursor_col = indent.chars().count();
        self.ensure_cursor_visible();
    }

    /// Detect the indent unit used in the buffer, falling back to
    /// `tab_width` spaces.
    pub fn detect_indent(&self) -> String {
        for line in self.lines.iter().take(50) {
            if line.starts_with('\t') {
                return "\t".to_string();
            }
            let spaces = line.chars().take_while(|c| *c == ' ').count();
            if (2..=4).contains(&spaces) {
                return " ".repeat(spaces);
            }
        }
        " ".repeat(self.tab_width)
    }

    pub fn insert_tab(&mut self) {
        let indent = self.detect_indent();
        self.checkpoint(EditKind::Other);
        let line = &mut self.lines[self.cursor_line];
        let byte_idx = char_to_byte_index(line, self.cursor_col);
        line.insert_str(byte_idx, &indent);
        self.cursor_col += indent.chars().count();
    }

    /// Remove one indentation level from the start of the line.
    pub fn dedent(&mut self) {
        let unit = self.detect_indent().chars().count();
        let leading = self.lines[self.cursor_line]
            .chars()
            .take_while(|c| c.is_whitespace())
            .count();
        if leading == 0 {
            return;
        }
        self.checkpoint(EditKind::Other);
        let remove = leading.min(unit);
        let line = &mut self.lines[self.cursor_line];
        let end = char_to_byte_index(line, remove);
        line.replace_range(..end, "");
        self.cursor_col = self.cursor_col.saturating_sub(remove);
    }

    // ── Navigation ────────────────────────────────────────────────────

    fn moved(&mut self) {
        self.last_edit = None;
        self.clamp_cursor();
        self.ensure_cursor_visible();
    }

    pub fn move_up(&mut self) {
        self.cursor_line = self.cursor_line.saturating_sub(1);
        self.moved();
    }

    pub fn move_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
        }
        self.moved();
    }

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_line_len();
        }
        self.moved();
    }

    pub fn move_right(&mut self) {
        if self.cursor_col < self.current_line_len() {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
        self.moved();
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
        self.moved();
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.current_line_len();
        self.moved();
    }

    pub fn move_to_top(&mut self) {
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.moved();
    }

    pub fn move_to_bottom(&mut self) {
        self.cursor_line = self.lines.len().saturating_sub(1);
        self.cursor_col = self.current_line_len();
        self.moved();
    }

    pub fn page_up(&mut self) {
        let jump = self.visible_height.max(1);
        self.cursor_line = self.cursor_line.saturating_sub(jump);
        self.moved();
    }

    pub fn page_down(&mut self) {
        let jump = self.visible_height.max(1);
        self.cursor_line = (self.cursor_line + jump).min(self.lines.len().saturating_sub(1));
        self.moved();
    }
}

/// Convert a char-based column index to a byte index in a string.
fn char_to_byte_index(s: &str, char_col: usize) -> usize {
    s.char_indices()
        .nth(char_col)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_empty_content() {
        let buf = TextBuffer::new("", 4);
        assert_eq!(buf.lines, vec![""]);
        assert_eq!(buf.text(), "");
    }

    #[test]
    fn test_trailing_newline_round_trips() {
        let buf = TextBuffer::new("hello\nworld\n", 4);
        assert_eq!(buf.lines, vec!["hello", "world", ""]);
        assert_eq!(buf.text(), "hello\nworld\n");
    }

    #[test]
    fn test_crlf_is_preserved() {
        let buf = TextBuffer::new("a=1\r\nb=2\r\n", 4);
        assert_eq!(buf.line_ending, LineEnding::CrLf);
        assert_eq!(buf.lines, vec!["a=1", "b=2", ""]);
        assert_eq!(buf.text(), "a=1\r\nb=2\r\n");
    }

    #[test]
    fn test_insert_char_multibyte() {
        let mut buf = TextBuffer::new("héllo", 4);
        buf.cursor_col = 2;
        buf.insert_char('X');
        assert_eq!(buf.lines[0], "héXllo");
        assert_eq!(buf.cursor_col, 3);
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buf = TextBuffer::new("ab\ncd", 4);
        buf.set_cursor_position(1, 0);
        buf.delete_char_before();
        assert_eq!(buf.lines, vec!["abcd"]);
        assert_eq!((buf.cursor_line, buf.cursor_col), (0, 2));
    }

    #[test]
    fn test_delete_at_end_joins_next() {
        let mut buf = TextBuffer::new("ab\ncd", 4);
        buf.set_cursor_position(0, 2);
        buf.delete_char_at();
        assert_eq!(buf.lines, vec!["abcd"]);
    }

    #[test]
    fn test_newline_auto_indents() {
        let mut buf = TextBuffer::new("    key = 1", 4);
        buf.set_cursor_position(0, 11);
        buf.insert_newline();
        assert_eq!(buf.lines, vec!["    key = 1", "    "]);
        assert_eq!((buf.cursor_line, buf.cursor_col), (1, 4));
    }

    #[test]
    fn test_insert_str_multiline() {
        let mut buf = TextBuffer::new("[a]\nz", 4);
        buf.set_cursor_position(0, 3);
        buf.insert_str("\nx = 1\ny = 2");
        assert_eq!(buf.text(), "[a]\nx = 1\ny = 2\nz");
        assert_eq!((buf.cursor_line, buf.cursor_col), (2, 5));
    }

    #[test]
    fn test_typing_undoes_as_one_step() {
        let mut buf = TextBuffer::new("", 4);
        for ch in "abc".chars() {
            buf.insert_char(ch);
        }
        assert_eq!(buf.text(), "abc");
        assert!(buf.undo());
        assert_eq!(buf.text(), "");
        assert!(!buf.undo());
        assert!(buf.redo());
        assert_eq!(buf.text(), "abc");
    }

    #[test]
    fn test_cursor_move_breaks_undo_group() {
        let mut buf = TextBuffer::new("", 4);
        buf.insert_char('a');
        buf.move_left();
        buf.insert_char('b');
        assert_eq!(buf.text(), "ba");
        buf.undo();
        assert_eq!(buf.text(), "a");
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut buf = TextBuffer::new("x", 4);
        buf.set_cursor_position(0, 1);
        buf.insert_newline();
        buf.undo();
        buf.insert_char('y');
        assert!(!buf.redo());
    }

    #[test]
    fn test_tab_uses_configured_width() {
        let mut buf = TextBuffer::new("x", 2);
        buf.insert_tab();
        assert_eq!(buf.lines[0], "  x");
        assert_eq!(buf.cursor_col, 2);
    }

    #[test]
    fn test_tab_follows_detected_indent() {
        let mut buf = TextBuffer::new("a\n\tb\nc", 4);
        buf.set_cursor_position(2, 0);
        buf.insert_tab();
        assert_eq!(buf.lines[2], "\tc");
    }

    #[test]
    fn test_dedent() {
        let mut buf = TextBuffer::new("        x", 4);
        buf.set_cursor_position(0, 8);
        buf.dedent();
        assert_eq!(buf.lines[0], "    x");
        assert_eq!(buf.cursor_col, 4);
    }

    #[test]
    fn test_navigation_clamps_column() {
        let mut buf = TextBuffer::new("long line\nab", 4);
        buf.set_cursor_position(0, 9);
        buf.move_down();
        assert_eq!((buf.cursor_line, buf.cursor_col), (1, 2));
        buf.move_to_top();
        assert_eq!((buf.cursor_line, buf.cursor_col), (0, 0));
        buf.move_to_bottom();
        assert_eq!((buf.cursor_line, buf.cursor_col), (1, 2));
    }

    #[test]
    fn test_page_down_scrolls() {
        let content = (0..100).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let mut buf = TextBuffer::new(&content, 4);
        buf.visible_height = 10;
        buf.page_down();
        assert_eq!(buf.cursor_line, 10);
        assert!(buf.scroll_offset > 0);
    }

    #[test]
    fn test_gutter_width() {
        assert_eq!(TextBuffer::new("a", 4).gutter_width(), 3);
        let content = vec!["x"; 120].join("\n");
        assert_eq!(TextBuffer::new(&content, 4).gutter_width(), 5);
    }
}
