use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, AppMode, DialogKind, Focus};
use crate::components::help::HelpOverlay;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    match app.mode.clone() {
        AppMode::Dialog(kind) => handle_dialog_key(app, kind, key),
        AppMode::Normal => match app.focus {
            Focus::Tree => handle_tree_key(app, key),
            Focus::Editor => handle_editor_key(app, key),
        },
    }
}

fn handle_tree_key(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => app.request_quit(),
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => app.save(),
        (_, KeyCode::Char('j')) | (_, KeyCode::Down) => app.view.select_next(),
        (_, KeyCode::Char('k')) | (_, KeyCode::Up) => app.view.select_previous(),
        (_, KeyCode::Char('g')) | (_, KeyCode::Home) => app.view.select_first(),
        (_, KeyCode::Char('G')) | (_, KeyCode::End) => app.view.select_last(),
        (_, KeyCode::Enter) | (_, KeyCode::Char('l')) | (_, KeyCode::Right) => app.activate_selected(),
        (_, KeyCode::Char('h')) | (_, KeyCode::Left) => app.collapse_or_parent(),
        (_, KeyCode::Char('a')) => app.open_dialog(DialogKind::AddPath),
        (_, KeyCode::Char('s')) => app.open_dialog(DialogKind::ScanFolder),
        (_, KeyCode::Char('n')) => app.open_templates(),
        (_, KeyCode::Char('t')) => app.open_tag_picker(),
        (_, KeyCode::Char('M')) => app.open_tag_manager(),
        (_, KeyCode::Char('0')) => app.clear_filter_tags(),
        (_, KeyCode::Char(c @ '1'..='9')) => {
            let index = (c as u8 - b'1') as usize;
            app.toggle_filter_tag(index);
        }
        (_, KeyCode::Char('/')) => app.open_filter(),
        (_, KeyCode::Char('m')) => app.toggle_show_missing(),
        (_, KeyCode::Char('d')) | (_, KeyCode::Delete) => app.request_remove_selected(),
        (_, KeyCode::Char('r')) => app.reload_selected(),
        (_, KeyCode::Char('o')) => app.reveal_selected(),
        (_, KeyCode::Char('T')) => app.toggle_theme(),
        (_, KeyCode::Char('?')) => app.open_dialog(DialogKind::Help),
        (_, KeyCode::Tab) if app.session.is_open() => app.focus = Focus::Editor,
        _ => {}
    }
}

fn handle_editor_key(app: &mut App, key: KeyEvent) {
    let buffer = &mut app.session.buffer;
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('s')) => app.save(),
        (KeyModifiers::CONTROL, KeyCode::Char('w')) => app.request_close_editor(),
        (KeyModifiers::CONTROL, KeyCode::Char('q')) => app.request_quit(),
        (KeyModifiers::CONTROL, KeyCode::Char('z')) => {
            buffer.undo();
        }
        (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
            buffer.redo();
        }
        (KeyModifiers::CONTROL, KeyCode::Home) => buffer.move_to_top(),
        (KeyModifiers::CONTROL, KeyCode::End) => buffer.move_to_bottom(),
        (_, KeyCode::Esc) => app.focus = Focus::Tree,
        (_, KeyCode::Up) => buffer.move_up(),
        (_, KeyCode::Down) => buffer.move_down(),
        (_, KeyCode::Left) => buffer.move_left(),
        (_, KeyCode::Right) => buffer.move_right(),
        (_, KeyCode::Home) => buffer.move_home(),
        (_, KeyCode::End) => buffer.move_end(),
        (_, KeyCode::PageUp) => buffer.page_up(),
        (_, KeyCode::PageDown) => buffer.page_down(),
        (_, KeyCode::Enter) => buffer.insert_newline(),
        (_, KeyCode::Backspace) => buffer.delete_char_before(),
        (_, KeyCode::Delete) => buffer.delete_char_at(),
        (_, KeyCode::Tab) => buffer.insert_tab(),
        (_, KeyCode::BackTab) => buffer.dedent(),
        (m, KeyCode::Char(c)) if !m.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            buffer.insert_char(c)
        }
        _ => {}
    }
    app.session.buffer.ensure_cursor_visible();
}

fn handle_dialog_key(app: &mut App, kind: DialogKind, key: KeyEvent) {
    match kind {
        DialogKind::AddPath => handle_input_key(app, key, App::add_path_from_input),
        DialogKind::ScanFolder => handle_input_key(app, key, App::start_scan_from_input),
        DialogKind::NewTag { .. } => handle_input_key(app, key, App::create_tag_from_input),
        DialogKind::Filter => match key.code {
            KeyCode::Esc => app.cancel_filter(),
            KeyCode::Enter => app.close_dialog(),
            _ => {
                if edit_input(app, key) {
                    app.apply_filter_query();
                }
            }
        },
        DialogKind::Templates | DialogKind::Onboarding | DialogKind::ScanResults { .. } => {
            handle_checklist_key(app, key, App::confirm_checklist)
        }
        DialogKind::TagPicker { .. } => match key.code {
            KeyCode::Char('n') => app.open_new_tag(),
            _ => handle_checklist_key(app, key, App::apply_tag_picker),
        },
        DialogKind::TagManager => match key.code {
            KeyCode::Char('n') => app.open_new_tag(),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected_tag(),
            KeyCode::Down | KeyCode::Char('j') => app.checklist_next(),
            KeyCode::Up | KeyCode::Char('k') => app.checklist_previous(),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => app.close_dialog(),
            _ => {}
        },
        DialogKind::RemoveConfirm { target } => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                app.close_dialog();
                app.remove_managed(&target);
            }
            KeyCode::Char('n') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        DialogKind::DiscardConfirm { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_discard(),
            KeyCode::Char('n') | KeyCode::Esc => app.close_dialog(),
            _ => {}
        },
        DialogKind::Help => match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                let max = HelpOverlay::total_lines().saturating_sub(1);
                app.dialog_state.selected = (app.dialog_state.selected + 1).min(max);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.dialog_state.selected = app.dialog_state.selected.saturating_sub(1);
            }
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => {
                app.close_dialog()
            }
            _ => {}
        },
        DialogKind::Error { .. } => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => {
                app.close_dialog()
            }
            _ => {}
        },
    }
}

/// Single-line text prompt: Esc cancels, Enter submits.
fn handle_input_key(app: &mut App, key: KeyEvent, submit: fn(&mut App)) {
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => submit(app),
        _ => {
            edit_input(app, key);
        }
    }
}

/// Apply an editing key to the dialog input; returns whether the text changed.
fn edit_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.dialog_input_char(c);
            true
        }
        KeyCode::Backspace => {
            app.dialog_delete_char();
            true
        }
        KeyCode::Left => {
            app.dialog_move_cursor_left();
            false
        }
        KeyCode::Right => {
            app.dialog_move_cursor_right();
            false
        }
        KeyCode::Home => {
            app.dialog_cursor_home();
            false
        }
        KeyCode::End => {
            app.dialog_cursor_end();
            false
        }
        _ => false,
    }
}

fn handle_checklist_key(app: &mut App, key: KeyEvent, confirm: fn(&mut App)) {
    match key.code {
        KeyCode::Esc => app.close_dialog(),
        KeyCode::Enter => confirm(app),
        KeyCode::Char(' ') => app.checklist_toggle(),
        KeyCode::Down | KeyCode::Char('j') => app.checklist_next(),
        KeyCode::Up | KeyCode::Char('k') => app.checklist_previous(),
        _ => {}
    }
}

fn inside(col: u16, row: u16, area: Rect) -> bool {
    col >= area.x && col < area.x + area.width && row >= area.y && row < area.y + area.height
}

/// Handle a mouse event: wheel scrolls, left click selects or places the cursor.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    if app.mode != AppMode::Normal {
        return;
    }
    let in_tree = inside(mouse.column, mouse.row, app.tree_area);
    let in_editor = inside(mouse.column, mouse.row, app.editor_area);
    match mouse.kind {
        MouseEventKind::ScrollDown if in_tree => app.view.select_next(),
        MouseEventKind::ScrollUp if in_tree => app.view.select_previous(),
        MouseEventKind::ScrollDown if in_editor => {
            app.session.buffer.move_down();
            app.session.buffer.ensure_cursor_visible();
        }
        MouseEventKind::ScrollUp if in_editor => {
            app.session.buffer.move_up();
            app.session.buffer.ensure_cursor_visible();
        }
        MouseEventKind::Down(MouseButton::Left) if in_tree => {
            app.focus = Focus::Tree;
            // One row of border above the list.
            let row = mouse.row.saturating_sub(app.tree_area.y + 1) as usize;
            let index = app.view.scroll_offset + row;
            if index < app.view.flat_items.len() {
                if index == app.view.selected_index {
                    app.activate_selected();
                } else {
                    app.view.selected_index = index;
                }
            }
        }
        MouseEventKind::Down(MouseButton::Left) if in_editor && app.session.is_open() => {
            app.focus = Focus::Editor;
            let buffer = &mut app.session.buffer;
            let row = mouse.row.saturating_sub(app.editor_area.y + 1) as usize;
            // Left border, then the gutter (separator included).
            let text_x = app.editor_area.x + 1 + buffer.gutter_width();
            let col = mouse.column.saturating_sub(text_x) as usize;
            buffer.set_cursor_position(buffer.scroll_offset + row, col);
        }
        _ => {}
    }
}

/// Bracketed paste goes to whatever has text input.
pub fn handle_paste(app: &mut App, text: &str) {
    match &app.mode {
        AppMode::Dialog(DialogKind::AddPath)
        | AppMode::Dialog(DialogKind::ScanFolder)
        | AppMode::Dialog(DialogKind::NewTag { .. }) => app.dialog_input_str(text),
        AppMode::Dialog(DialogKind::Filter) => {
            app.dialog_input_str(text);
            app.apply_filter_query();
        }
        AppMode::Normal if app.focus == Focus::Editor => {
            app.session.buffer.insert_str(text);
            app.session.buffer.ensure_cursor_visible();
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::fs::backend::tests_support::MockBackend;
    use crate::state::AppState;
    use std::path::Path;
    use std::sync::Arc;

    fn setup() -> App {
        let mut config = AppConfig::default();
        config.general.onboarding = Some(false);
        let backend = MockBackend::default()
            .with_file("/home/mock/.zshrc", "export A=1\n")
            .with_file("/home/mock/.vimrc", "set nu\n");
        App::new(config, Arc::new(backend), AppState::default(), None)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, c: char) {
        handle_key_event(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn add(app: &mut App, raw: &str) {
        press(app, KeyCode::Char('a'));
        type_str(app, raw);
        press(app, KeyCode::Enter);
    }

    #[test]
    fn add_dialog_via_keys() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.tree.contains(Path::new("/home/mock/.zshrc")));
    }

    #[test]
    fn escape_cancels_add_dialog() {
        let mut app = setup();
        press(&mut app, KeyCode::Char('a'));
        type_str(&mut app, "~/.zshrc");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.tree.roots.is_empty());
    }

    #[test]
    fn q_inside_dialog_is_text() {
        let mut app = setup();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.dialog_state.input, "q");
    }

    #[test]
    fn enter_opens_file_and_typing_edits_it() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus, Focus::Editor);

        type_str(&mut app, "# ");
        assert!(app.session.is_dirty());
        assert_eq!(app.session.buffer.lines[0], "# export A=1");

        ctrl(&mut app, 'z');
        assert!(!app.session.is_dirty());
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focus, Focus::Tree);
    }

    #[test]
    fn ctrl_s_saves_from_editor() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char('!'));
        ctrl(&mut app, 's');
        assert!(!app.session.is_dirty());
        assert_eq!(app.status_message.as_ref().unwrap().text, "Saved .zshrc");
    }

    #[test]
    fn quit_with_dirty_buffer_needs_confirmation() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.mode, AppMode::Normal);
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.should_quit);
    }

    #[test]
    fn number_keys_toggle_tag_filter() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.vimrc");
        let id = app.tags.create_tag("shell", "#22c55e").unwrap();
        app.tags.set_tags(Path::new("/home/mock/.zshrc"), vec![id]);

        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.view.flat_items.len(), 1);
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.view.flat_items.len(), 2);
    }

    #[test]
    fn tag_picker_space_and_enter() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        let id = app.tags.create_tag("shell", "#22c55e").unwrap();
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.tags.tags_for(Path::new("/home/mock/.zshrc")), &[id]);
    }

    #[test]
    fn filter_dialog_updates_live() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.vimrc");
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "zsh");
        assert_eq!(app.view.flat_items.len(), 1);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.filter.query, "zsh");
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn remove_via_keys() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.tree.roots.is_empty());
    }

    #[test]
    fn paste_into_add_dialog() {
        let mut app = setup();
        press(&mut app, KeyCode::Char('a'));
        handle_paste(&mut app, "~/.vimrc\n");
        assert_eq!(app.dialog_state.input, "~/.vimrc");
    }

    #[test]
    fn click_selects_then_activates_row() {
        let mut app = setup();
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.vimrc");
        app.tree_area = Rect::new(0, 1, 30, 10);
        app.view.selected_index = 0;

        let click = |row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click(3));
        assert_eq!(app.view.selected_index, 1);
        handle_mouse_event(&mut app, click(3));
        assert!(app.session.is_open_path(Path::new("/home/mock/.vimrc")));
    }
}
