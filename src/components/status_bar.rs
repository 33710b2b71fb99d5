use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

pub const TREE_HINTS: &str = " a:add  s:scan  n:templates  t:tag  d:remove  ?:help ";
pub const EDITOR_HINTS: &str = " ^S:save  ^W:close  ^Z:undo  Esc:tree ";

/// Bottom line of the screen.
///
/// Normally `path  ...  info [activity] hints`; a status message, when set,
/// takes the whole line instead.
pub struct StatusBarWidget<'a> {
    path_str: &'a str,
    file_info: &'a str,
    theme: &'a ThemeColors,
    key_hints: &'a str,
    message: Option<(&'a str, bool)>,
    activity: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(path_str: &'a str, file_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            path_str,
            file_info,
            theme,
            key_hints: TREE_HINTS,
            message: None,
            activity: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.message = Some((msg, is_error));
        self
    }

    pub fn key_hints(mut self, hints: &'a str) -> Self {
        self.key_hints = hints;
        self
    }

    /// Background work indicator, e.g. a folder scan in flight.
    pub fn activity(mut self, activity: &'a str) -> Self {
        self.activity = Some(activity);
        self
    }

    fn message_line(&self, text: &str, is_error: bool, width: usize) -> Line<'static> {
        let style = if is_error {
            Style::default()
                .bg(self.theme.error_fg)
                .fg(self.theme.status_fg)
        } else {
            Style::default().fg(self.theme.success_fg)
        };
        let text = format!("{:<width$}", take_chars(text, width), width = width);
        Line::from(Span::styled(text, style))
    }

    fn info_line(&self, width: usize) -> Line<'a> {
        let mut right = Vec::with_capacity(2);
        if let Some(activity) = self.activity {
            right.push(Span::styled(
                format!(" {} ", activity),
                Style::default()
                    .fg(self.theme.warning_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        right.push(Span::styled(
            self.key_hints,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));
        let right_len: usize = right.iter().map(|s| s.content.chars().count()).sum();

        // The path gives way first, then the info text.
        let left_budget = width.saturating_sub(right_len);
        let info_len = self.file_info.chars().count();
        let path = truncate_left(self.path_str, left_budget.saturating_sub(info_len + 1));
        let path_len = path.chars().count();
        let info = take_chars(self.file_info, left_budget.saturating_sub(path_len));
        let gap = left_budget.saturating_sub(path_len + info.chars().count());

        let mut spans = vec![
            Span::styled(path, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap)),
            Span::styled(info, Style::default().fg(self.theme.info_fg)),
        ];
        spans.extend(right);
        Line::from(spans)
    }
}

fn take_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Keep the tail of `s`, prefixed with "...", so it fits in `budget` columns.
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    match budget {
        _ if len <= budget => s.to_string(),
        0..=3 => take_chars(s, budget),
        _ => {
            let tail: String = s.chars().skip(len - (budget - 3)).collect();
            format!("...{}", tail)
        }
    }
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let width = area.width as usize;
        let line = match self.message {
            Some((text, is_error)) => self.message_line(text, is_error, width),
            None => self.info_line(width),
        };
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
