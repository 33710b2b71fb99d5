use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::fs::tree::{FlatItem, TreeView};
use crate::tags::TagStore;
use crate::theme::{tag_color, ThemeColors};

/// Managed tree widget: folders with their lazily loaded contents, then
/// standalone files, each row followed by its tag dots.
pub struct TreeWidget<'a> {
    view: &'a TreeView,
    tags: &'a TagStore,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(view: &'a TreeView, tags: &'a TagStore, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            view,
            tags,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Indentation prefix drawn with box-drawing characters.
    ///
    /// Continuation lines depend on whether each ancestor was the last of
    /// its siblings, found by walking back to the nearest row at that depth.
    fn build_prefix(item: &FlatItem, items: &[FlatItem], item_index: usize) -> String {
        if item.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..item.depth {
            let mut ancestor_is_last = false;
            for j in (0..item_index).rev() {
                if items[j].depth == d {
                    ancestor_is_last = items[j].is_last_sibling;
                    break;
                }
                if items[j].depth < d {
                    break;
                }
            }
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }
        parts.push(if item.is_last_sibling { "└──" } else { "├──" });
        parts.join("")
    }

    fn item_indicator(&self, item: &FlatItem) -> &'static str {
        match (self.use_icons, item.is_folder) {
            (true, true) if item.is_expanded => " ",
            (true, true) => " ",
            (true, false) => Self::file_icon(&item.name),
            (false, true) if item.is_expanded => "[-] ",
            (false, true) => "[+] ",
            (false, false) => "    ",
        }
    }

    /// Nerd Font icon by extension, with the usual dotfiles as shell scripts.
    fn file_icon(name: &str) -> &'static str {
        let ext = name.rsplit('.').next().unwrap_or("").to_lowercase();
        match ext.as_str() {
            "zshrc" | "bashrc" | "bash_profile" | "profile" | "sh" | "bash" | "zsh" | "fish" => " ",
            "gitconfig" | "gitignore" | "gitattributes" => " ",
            "json" => " ",
            "toml" | "yaml" | "yml" | "ini" | "cfg" | "conf" | "npmrc" | "editorconfig" => " ",
            "vimrc" => " ",
            "md" | "txt" => " ",
            "js" => " ",
            "ts" => " ",
            "py" => " ",
            "rs" => " ",
            "xml" | "html" | "htm" => " ",
            _ => " ",
        }
    }

    fn row_style(&self, item: &FlatItem, is_selected: bool) -> Style {
        if is_selected {
            return Style::default()
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD);
        }
        if !item.exists {
            return Style::default()
                .fg(self.theme.tree_missing_fg)
                .add_modifier(Modifier::ITALIC);
        }
        if item.is_folder {
            Style::default()
                .fg(self.theme.tree_folder_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.tree_file_fg)
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let items = &self.view.flat_items;
        let visible_height = inner_area.height as usize;

        if items.is_empty() {
            if visible_height > 0 {
                let hint = Line::from(Span::styled(
                    "Nothing managed yet. Press 'a' to add a path or 'n' for templates.",
                    Style::default().fg(self.theme.dim_fg),
                ));
                buf.set_line(inner_area.x, inner_area.y, &hint, inner_area.width);
            }
            return;
        }

        let visible_items = items
            .iter()
            .enumerate()
            .skip(self.view.scroll_offset)
            .take(visible_height);

        for (i, (idx, item)) in visible_items.enumerate() {
            let y = inner_area.y + i as u16;
            let is_selected = idx == self.view.selected_index;
            let style = self.row_style(item, is_selected);

            let mut spans = vec![Span::styled(
                format!(
                    "{}{}{}",
                    Self::build_prefix(item, items, idx),
                    self.item_indicator(item),
                    item.name
                ),
                style,
            )];
            if item.is_loading {
                spans.push(Span::styled(" …", Style::default().fg(self.theme.info_fg)));
            }
            if !item.exists {
                spans.push(Span::styled(" (missing)", style));
            }
            for id in &item.tags {
                if let Some(tag) = self.tags.get(id) {
                    spans.push(Span::styled(
                        " ●",
                        Style::default().fg(tag_color(&tag.color, self.theme)),
                    ));
                }
            }

            if is_selected {
                for x in inner_area.x..inner_area.x + inner_area.width {
                    buf.set_string(x, y, " ", style);
                }
            }
            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
