use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::fs::tree::ItemFilter;
use crate::tags::TagStore;
use crate::theme::{tag_color, ThemeColors};

/// One-line strip of tag chips above the tree.
///
/// The first nine tags are numbered to match their filter keys; chips in
/// the active filter are drawn reversed.
pub struct TagBarWidget<'a> {
    tags: &'a TagStore,
    filter: &'a ItemFilter,
    theme: &'a ThemeColors,
}

impl<'a> TagBarWidget<'a> {
    pub fn new(tags: &'a TagStore, filter: &'a ItemFilter, theme: &'a ThemeColors) -> Self {
        Self { tags, filter, theme }
    }
}

impl<'a> Widget for TagBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let dim = Style::default().fg(self.theme.dim_fg);
        let mut spans = vec![Span::styled(" Tags: ", dim)];

        if self.tags.tags().is_empty() {
            spans.push(Span::styled("none (t to tag, M to manage)", dim));
        }
        for (i, tag) in self.tags.tags().iter().enumerate() {
            let color = tag_color(&tag.color, self.theme);
            let active = self.filter.tags.contains(&tag.id);
            let label = if i < 9 {
                format!(" {}:{} ", i + 1, tag.name)
            } else {
                format!(" {} ", tag.name)
            };
            let style = if active {
                Style::default()
                    .fg(self.theme.status_bg)
                    .bg(color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            };
            spans.push(Span::styled(label, style));
        }

        if !self.filter.query.is_empty() {
            spans.push(Span::styled("  /", dim));
            spans.push(Span::styled(
                self.filter.query.clone(),
                Style::default().fg(self.theme.accent_fg),
            ));
        }
        if self.filter.show_missing {
            spans.push(Span::styled(
                "  +missing",
                Style::default().fg(self.theme.tree_missing_fg),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
