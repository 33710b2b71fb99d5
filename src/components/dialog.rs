use std::path::Path;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, ChecklistValue, DialogKind, DialogState, PendingAction};
use crate::tags::TagStore;
use crate::theme::{tag_color, ThemeColors};

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
    tags: &'a TagStore,
    theme: &'a ThemeColors,
    scanning: bool,
}

impl<'a> DialogWidget<'a> {
    pub fn new(
        mode: &'a AppMode,
        dialog_state: &'a DialogState,
        tags: &'a TagStore,
        theme: &'a ThemeColors,
    ) -> Self {
        Self {
            mode,
            dialog_state,
            tags,
            theme,
            scanning: false,
        }
    }

    /// Show the "scanning" placeholder in the scan results dialog.
    pub fn scanning(mut self, scanning: bool) -> Self {
        self.scanning = scanning;
        self
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }

    /// Clear `rect`, draw the bordered frame and return the inner area.
    fn frame(&self, title: &str, rect: Rect, border: Color, buf: &mut Buffer) -> Rect {
        Clear.render(rect, buf);
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(self.theme.dialog_bg))
            .padding(Padding::horizontal(1));
        let inner = block.inner(rect);
        block.render(rect, buf);
        inner
    }

    fn hint(&self, text: &str) -> Line<'static> {
        Line::from(Span::styled(
            text.to_string(),
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ))
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let kind = match &self.mode {
            AppMode::Dialog(kind) => kind,
            _ => return,
        };

        match kind {
            DialogKind::AddPath => {
                self.render_input("Add File or Folder", "Path (~ expands to home)", area, buf)
            }
            DialogKind::ScanFolder => {
                self.render_input("Scan Folder", "Folder to search for config files", area, buf)
            }
            DialogKind::NewTag { .. } => self.render_input("New Tag", "Tag name", area, buf),
            DialogKind::Filter => self.render_input("Filter", "Fuzzy match on names", area, buf),
            DialogKind::Templates => self.render_checklist(
                "Add Common Config Files",
                "[Space] Toggle  [Enter] Add  [Esc] Cancel",
                area,
                buf,
            ),
            DialogKind::Onboarding => self.render_checklist(
                "Welcome! Pick files to manage",
                "[Space] Toggle  [Enter] Start  [Esc] Skip",
                area,
                buf,
            ),
            DialogKind::ScanResults { root } => {
                let title = format!("Config files in {}", root.display());
                if self.scanning {
                    self.render_message(&title, "Scanning…", "[Esc] Cancel", self.theme.info_fg, area, buf);
                } else if self.dialog_state.items.is_empty() {
                    self.render_message(
                        &title,
                        "No new config files found.",
                        "[Esc] Close",
                        self.theme.info_fg,
                        area,
                        buf,
                    );
                } else {
                    self.render_checklist(&title, "[Space] Toggle  [Enter] Import  [Esc] Cancel", area, buf);
                }
            }
            DialogKind::TagPicker { target } => {
                let title = format!("Tags for {}", file_label(target));
                if self.dialog_state.items.is_empty() {
                    self.render_message(
                        &title,
                        "No tags yet.",
                        "[n] New tag  [Esc] Close",
                        self.theme.info_fg,
                        area,
                        buf,
                    );
                } else {
                    self.render_checklist(
                        &title,
                        "[Space] Toggle  [n] New  [Enter] Apply  [Esc] Cancel",
                        area,
                        buf,
                    );
                }
            }
            DialogKind::TagManager => {
                if self.dialog_state.items.is_empty() {
                    self.render_message(
                        "Tags",
                        "No tags yet.",
                        "[n] New tag  [Esc] Close",
                        self.theme.info_fg,
                        area,
                        buf,
                    );
                } else {
                    self.render_checklist("Tags", "[n] New  [d] Delete  [Esc] Close", area, buf);
                }
            }
            DialogKind::RemoveConfirm { target } => self.render_message(
                "Stop Managing",
                &format!("Remove {} from the list? Nothing is deleted on disk.", target.display()),
                "[y] Yes  [n/Esc] Cancel",
                self.theme.warning_fg,
                area,
                buf,
            ),
            DialogKind::DiscardConfirm { pending } => {
                let action = match pending {
                    PendingAction::Open(path) => format!("open {}", file_label(path)),
                    PendingAction::CloseEditor => "close the editor".to_string(),
                    PendingAction::Quit => "quit".to_string(),
                };
                self.render_message(
                    "Unsaved Changes",
                    &format!("Discard unsaved changes and {}?", action),
                    "[y] Discard  [n/Esc] Keep editing",
                    self.theme.warning_fg,
                    area,
                    buf,
                );
            }
            DialogKind::Error { message } => self.render_message(
                "Error",
                message,
                "[Enter/Esc] Dismiss",
                self.theme.error_fg,
                area,
                buf,
            ),
            // Drawn by the help overlay.
            DialogKind::Help => {}
        }
    }
}

impl<'a> DialogWidget<'a> {
    fn render_input(&self, title: &str, label: &str, area: Rect, buf: &mut Buffer) {
        let dialog_width = 60.min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(dialog_width, 6, area);
        let inner = self.frame(title, rect, self.theme.dialog_border_fg, buf);
        if inner.height < 3 || inner.width == 0 {
            return;
        }

        buf.set_line(
            inner.x,
            inner.y,
            &Line::from(Span::styled(label.to_string(), Style::default().fg(self.theme.dim_fg))),
            inner.width,
        );

        let input = &self.dialog_state.input;
        let cursor_pos = self.dialog_state.cursor_position.min(input.len());
        let (before, rest) = input.split_at(cursor_pos);
        let mut rest_chars = rest.chars();
        let cursor_char = rest_chars.next().map(String::from).unwrap_or_else(|| " ".into());
        let after = rest_chars.as_str();

        // Keep the cursor in view by dropping characters from the left.
        let max_width = inner.width as usize;
        let before_chars = before.chars().count();
        let keep = max_width.saturating_sub(2);
        let before_display: String = if before_chars > keep {
            before.chars().skip(before_chars - keep).collect()
        } else {
            before.to_string()
        };

        let input_style = Style::default().fg(self.theme.tree_fg);
        let cursor_style = Style::default()
            .bg(self.theme.editor_cursor_bg)
            .fg(self.theme.editor_cursor_fg)
            .add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled(before_display, input_style),
            Span::styled(cursor_char, cursor_style),
            Span::styled(after.to_string(), input_style),
        ]);
        buf.set_line(inner.x, inner.y + 1, &line, inner.width);
        buf.set_line(
            inner.x,
            inner.y + inner.height - 1,
            &self.hint("[Enter] Confirm  [Esc] Cancel"),
            inner.width,
        );
    }

    fn render_checklist(&self, title: &str, hint: &str, area: Rect, buf: &mut Buffer) {
        let items = &self.dialog_state.items;
        let dialog_width = 70.min(area.width.saturating_sub(4));
        let dialog_height = (items.len() as u16 + 4).clamp(6, area.height.saturating_sub(2).max(6));
        let rect = Self::centered_rect(dialog_width, dialog_height, area);
        let inner = self.frame(title, rect, self.theme.dialog_border_fg, buf);
        if inner.height < 2 || inner.width == 0 {
            return;
        }

        let list_height = (inner.height - 1) as usize;
        let selected = self.dialog_state.selected;
        let first = if selected >= list_height { selected + 1 - list_height } else { 0 };

        for (row, (idx, item)) in items.iter().enumerate().skip(first).take(list_height).enumerate() {
            let is_selected = idx == selected;
            let mut style = if !item.enabled {
                Style::default().fg(self.theme.dim_fg)
            } else {
                Style::default().fg(self.theme.tree_fg)
            };
            if is_selected {
                style = style
                    .bg(self.theme.tree_selected_bg)
                    .add_modifier(Modifier::BOLD);
            }

            let mark = if item.checked { "[x] " } else { "[ ] " };
            let mut spans = vec![Span::styled(mark, style)];
            if let ChecklistValue::Tag(id) = &item.value {
                let color = self
                    .tags
                    .get(id)
                    .map(|t| tag_color(&t.color, self.theme))
                    .unwrap_or(self.theme.accent_fg);
                spans.push(Span::styled("● ", Style::default().fg(color)));
            }
            spans.push(Span::styled(item.label.clone(), style));
            spans.push(Span::styled(
                format!("  {}", item.detail),
                Style::default().fg(self.theme.dim_fg),
            ));
            buf.set_line(inner.x, inner.y + row as u16, &Line::from(spans), inner.width);
        }

        buf.set_line(inner.x, inner.y + inner.height - 1, &self.hint(hint), inner.width);
    }

    fn render_message(
        &self,
        title: &str,
        message: &str,
        hint: &str,
        border: Color,
        area: Rect,
        buf: &mut Buffer,
    ) {
        let dialog_width = (message.chars().count() as u16 + 6)
            .max(40)
            .min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(dialog_width, 5, area);
        let inner = self.frame(title, rect, border, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let msg_line = Line::from(Span::styled(message.to_string(), Style::default().fg(border)));
        buf.set_line(inner.x, inner.y + inner.height / 2, &msg_line, inner.width);
        if inner.height > 1 {
            buf.set_line(inner.x, inner.y + inner.height - 1, &self.hint(hint), inner.width);
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
