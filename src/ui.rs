use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, AppMode, DialogKind, Focus};
use crate::components::dialog::DialogWidget;
use crate::components::editor::{empty_editor_hint, EditorWidget};
use crate::components::help::HelpOverlay;
use crate::components::status_bar::{StatusBarWidget, EDITOR_HINTS, TREE_HINTS};
use crate::components::tag_bar::TagBarWidget;
use crate::components::tree::TreeWidget;
use crate::fs::paths::display_path;

/// Render the application UI: tag bar, tree and editor side by side, and
/// the status bar, with any dialog drawn on top.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);

    app.tree_area = panels[0];
    app.editor_area = panels[1];
    // Account for the borders.
    app.view
        .update_scroll(panels[0].height.saturating_sub(2) as usize);
    app.session.buffer.visible_height = panels[1].height.saturating_sub(2) as usize;

    frame.render_widget(TagBarWidget::new(&app.tags, &app.filter, &app.theme), rows[0]);
    render_tree(app, frame, panels[0]);
    render_editor(app, frame, panels[1]);
    render_status(app, frame, rows[2]);

    if let AppMode::Dialog(kind) = &app.mode {
        if *kind == DialogKind::Help {
            frame.render_widget(HelpOverlay::new(&app.theme, app.dialog_state.selected), area);
        } else {
            let dialog = DialogWidget::new(&app.mode, &app.dialog_state, &app.tags, &app.theme)
                .scanning(app.scanning.is_some());
            frame.render_widget(dialog, area);
        }
    }
}

fn panel_block(app: &App, title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        app.theme.border_focused_fg
    } else {
        app.theme.border_fg
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn render_tree(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Tree;
    let title = if app.filter.is_active() {
        " Managed (filtered) ".to_string()
    } else {
        " Managed ".to_string()
    };
    let block = panel_block(app, title, focused).style(Style::default().bg(app.theme.tree_bg));
    let widget = TreeWidget::new(&app.view, &app.tags, &app.theme, app.config.use_icons()).block(block);
    frame.render_widget(widget, area);
}

fn render_editor(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Editor;
    let Some(file) = &app.session.current else {
        let block = panel_block(app, " Editor ".to_string(), false);
        let hint = Paragraph::new(empty_editor_hint(&app.theme)).block(block);
        frame.render_widget(hint, area);
        return;
    };

    let mut title = format!(" {}", file.name);
    if app.session.is_dirty() {
        title.push_str(" ●");
    }
    if !file.exists {
        title.push_str(" (new)");
    }
    title.push_str(&format!(" [{}] ", app.session.language));

    let block = panel_block(app, title, focused)
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .style(Style::default().bg(app.theme.editor_bg).fg(app.theme.editor_fg));
    let widget = EditorWidget::new(
        &app.session.buffer,
        app.session.language,
        &app.theme,
        &app.highlighting.syntax_set,
        &app.highlighting.theme,
    )
    .show_cursor(focused)
    .block(block);
    frame.render_widget(widget, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.focus == Focus::Editor && app.session.is_open();

    let (path_str, file_info) = match (&app.session.current, editing) {
        (Some(file), true) => {
            let buffer = &app.session.buffer;
            let mut info = format!(
                "Ln {}, Col {} | {} | {}",
                buffer.cursor_line + 1,
                buffer.cursor_col + 1,
                app.session.language,
                buffer.line_ending.label()
            );
            if app.session.is_dirty() {
                info.push_str(" | modified");
            }
            (display_path(&file.path, app.home()), info)
        }
        _ => {
            let path = app
                .view
                .selected()
                .map(|i| display_path(&i.path, app.home()))
                .unwrap_or_default();
            let (total, existing) = app.tree.stats();
            let missing = total - existing;
            let noun = if total == 1 { "file" } else { "files" };
            let info = if missing > 0 {
                format!("{} {} ({} missing)", total, noun, missing)
            } else {
                format!("{} {}", total, noun)
            };
            (path, info)
        }
    };

    let mut widget = StatusBarWidget::new(&path_str, &file_info, &app.theme)
        .key_hints(if editing { EDITOR_HINTS } else { TREE_HINTS });
    if app.scanning.is_some() {
        widget = widget.activity("Scanning…");
    } else if app.selected_is_loading() {
        widget = widget.activity("Loading…");
    }
    if let Some(msg) = &app.status_message {
        widget = widget.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(widget, area);
}
