use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::fs::backend::Backend;
use crate::fs::paths::file_name_of;
use crate::fs::scanner::ScannedFile;
use crate::fs::tree::{ExpandOutcome, FileSystemItem, ItemFilter, ManagedTree, TreeView};
use crate::jobs::Job;
use crate::session::{EditorSession, OpenFile};
use crate::state::{AppState, StateFile};
use crate::syntax::Highlighting;
use crate::tags::{next_color, TagId, TagStore};
use crate::theme::{resolve_scheme, ThemeColors};

/// Which panel receives keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Tree,
    Editor,
}

/// What to do once the user agrees to drop unsaved edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Open(PathBuf),
    CloseEditor,
    Quit,
}

/// The kind of dialog being displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    AddPath,
    ScanFolder,
    ScanResults { root: PathBuf },
    Templates,
    Onboarding,
    TagPicker { target: PathBuf },
    NewTag { target: Option<PathBuf> },
    TagManager,
    RemoveConfirm { target: PathBuf },
    DiscardConfirm { pending: PendingAction },
    Error { message: String },
    Filter,
    Help,
}

/// Application mode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Normal,
    Dialog(DialogKind),
}

/// What a checklist row stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecklistValue {
    Path(PathBuf),
    Tag(TagId),
}

/// One row of a selectable list dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub label: String,
    pub detail: String,
    pub value: ChecklistValue,
    pub checked: bool,
    /// Disabled rows are shown but cannot be toggled.
    pub enabled: bool,
}

/// State for a dialog's text input and list.
#[derive(Debug, Default)]
pub struct DialogState {
    pub input: String,
    pub cursor_position: usize,
    pub items: Vec<ChecklistItem>,
    pub selected: usize,
}

/// A transient message in the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Main application state.
pub struct App {
    pub tree: ManagedTree,
    pub tags: TagStore,
    pub session: EditorSession,
    pub view: TreeView,
    pub filter: ItemFilter,
    pub focus: Focus,
    pub mode: AppMode,
    pub dialog_state: DialogState,
    pub status_message: Option<StatusMessage>,
    pub theme_name: String,
    pub theme: ThemeColors,
    pub config: AppConfig,
    pub highlighting: Highlighting,
    pub onboarding_completed: bool,
    pub should_quit: bool,
    /// Root of the import scan in flight, if any.
    pub scanning: Option<PathBuf>,
    /// Last rendered panels, for mouse hit-testing.
    pub tree_area: Rect,
    pub editor_area: Rect,
    backend: Arc<dyn Backend>,
    state_file: Option<StateFile>,
    pending_jobs: Vec<Job>,
}

impl App {
    /// Build the controller from config and a loaded state snapshot.
    ///
    /// Root existence is re-probed, expanded folders that were never loaded
    /// are queued for scanning, and the onboarding dialog opens on first run.
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn Backend>,
        state: AppState,
        state_file: Option<StateFile>,
    ) -> Self {
        let theme_name = state
            .theme
            .clone()
            .unwrap_or_else(|| config.theme_scheme().to_string());
        let theme = resolve_scheme(&theme_name, &config.theme);
        let onboarding_completed = state.onboarding_completed;
        let (tree, tags) = state.into_stores();

        let mut app = Self {
            tree,
            tags,
            session: EditorSession::new(config.tab_width()),
            view: TreeView::default(),
            filter: ItemFilter {
                show_missing: config.show_missing(),
                ..Default::default()
            },
            focus: Focus::Tree,
            mode: AppMode::Normal,
            dialog_state: DialogState::default(),
            status_message: None,
            theme_name,
            theme,
            highlighting: Highlighting::new(config.syntax_theme_name()),
            onboarding_completed,
            should_quit: false,
            scanning: None,
            tree_area: Rect::default(),
            editor_area: Rect::default(),
            backend,
            state_file,
            pending_jobs: Vec::new(),
            config,
        };

        let existence = app.backend.check_many_existence(&app.tree.root_paths());
        app.tree.refresh_existence(&existence);
        app.resume_expanded();
        app.refresh_view();

        if app.config.onboarding_enabled() && !app.onboarding_completed {
            app.open_onboarding();
        }
        app
    }

    /// Drain the background work requested since the last call.
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.pending_jobs)
    }

    fn schedule(&mut self, outcome: ExpandOutcome) {
        if let ExpandOutcome::Scan(path) = outcome {
            self.pending_jobs.push(Job::LoadChildren(path));
        }
    }

    /// Queue scans for expanded folders whose children are not loaded.
    fn resume_expanded(&mut self) {
        let expanded: Vec<PathBuf> = self.tree.expanded.iter().cloned().collect();
        for path in expanded {
            let unloaded = self
                .tree
                .find(&path)
                .is_some_and(|i| i.is_folder() && i.children().is_none() && !i.is_loading());
            if unloaded {
                let outcome = self.tree.expand(&path);
                self.schedule(outcome);
            }
        }
    }

    /// Re-flatten the tree into the view.
    pub fn refresh_view(&mut self) {
        let items = self.tree.flatten(&self.tags, &self.filter);
        self.view.set_items(items);
    }

    fn select_path(&mut self, path: &Path) {
        if let Some(idx) = self.view.find_index_by_path(path) {
            self.view.selected_index = idx;
        }
    }

    pub fn selected_path(&self) -> Option<PathBuf> {
        self.view.selected().map(|i| i.path.clone())
    }

    pub fn home(&self) -> &Path {
        self.backend.home()
    }

    /// Write the state document. Failures surface in the status bar.
    pub fn persist(&mut self) {
        let Some(state_file) = &self.state_file else {
            return;
        };
        let state = AppState::capture(
            &self.tree,
            &self.tags,
            self.onboarding_completed,
            &self.theme_name,
        );
        if let Err(e) = state_file.save(&state) {
            tracing::warn!(error = %e, "failed to save state");
            self.set_error_message(format!("Could not save state: {}", e));
        }
    }

    // ── Background results ──────────────────────────────────────────────

    /// Apply a folder listing produced by a `LoadChildren` job.
    pub fn handle_children_loaded(&mut self, path: PathBuf, result: Result<Vec<FileSystemItem>>) {
        let error = result.as_ref().err().map(|e| e.to_string());
        if !self.tree.finish_load(&path, result) {
            return;
        }
        match error {
            Some(e) => {
                self.set_error_message(format!("Could not read {}: {}", file_name_of(&path), e));
            }
            None => {
                for child in self.tree.pending_expanded_children(&path) {
                    let outcome = self.tree.expand(&child);
                    self.schedule(outcome);
                }
                self.persist();
            }
        }
        self.refresh_view();
    }

    /// Fill the scan results dialog from a `ScanConfigs` job.
    pub fn handle_scan_finished(&mut self, root: PathBuf, result: Result<Vec<ScannedFile>>) {
        if self.scanning.as_deref() != Some(root.as_path()) {
            tracing::debug!(root = %root.display(), "dropping stale import scan");
            return;
        }
        self.scanning = None;
        let showing = self.mode == AppMode::Dialog(DialogKind::ScanResults { root: root.clone() });

        match result {
            Ok(files) => {
                tracing::info!(root = %root.display(), found = files.len(), "import scan finished");
                if !showing {
                    return;
                }
                self.dialog_state.items = files
                    .into_iter()
                    .filter(|f| !self.tree.contains(&f.path))
                    .map(|f| ChecklistItem {
                        detail: f
                            .path
                            .strip_prefix(&root)
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|_| f.path.display().to_string()),
                        label: f.name,
                        value: ChecklistValue::Path(f.path),
                        checked: true,
                        enabled: true,
                    })
                    .collect();
                self.dialog_state.selected = 0;
            }
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "import scan failed");
                if showing {
                    self.open_dialog(DialogKind::Error {
                        message: format!("Scan of {} failed: {}", root.display(), e),
                    });
                }
            }
        }
    }

    // ── Tree actions ────────────────────────────────────────────────────

    /// Enter on a row: folders toggle, files open in the editor.
    pub fn activate_selected(&mut self) {
        let Some(item) = self.view.selected().cloned() else {
            return;
        };
        if item.is_folder {
            let outcome = self.tree.toggle(&item.path);
            self.schedule(outcome);
            self.refresh_view();
        } else {
            self.request_open(&item.path);
        }
    }

    /// Left on a row: collapse an open folder, otherwise jump to the parent.
    pub fn collapse_or_parent(&mut self) {
        let Some(item) = self.view.selected().cloned() else {
            return;
        };
        if item.is_folder && item.is_expanded {
            self.tree.collapse(&item.path);
            self.refresh_view();
        } else if let Some(idx) = self.view.parent_index() {
            self.view.selected_index = idx;
        }
    }

    /// Drop and rescan the selected folder's children.
    pub fn reload_selected(&mut self) {
        let Some(item) = self.view.selected().cloned() else {
            return;
        };
        if !item.is_folder {
            return;
        }
        match self.tree.reload(&item.path) {
            ExpandOutcome::AlreadyLoading => self.set_status_message("Already loading".into()),
            outcome => {
                self.schedule(outcome);
                self.set_status_message(format!("Reloading {}", item.name));
            }
        }
        self.refresh_view();
    }

    /// Open a file, asking first when unsaved edits would be lost.
    pub fn request_open(&mut self, path: &Path) {
        if self.session.is_open_path(path) {
            self.focus = Focus::Editor;
            return;
        }
        if self.needs_discard_confirm() {
            self.open_dialog(DialogKind::DiscardConfirm {
                pending: PendingAction::Open(path.to_path_buf()),
            });
            return;
        }
        self.do_open(path);
    }

    fn do_open(&mut self, path: &Path) {
        let exists = self.backend.check_existence(path);
        self.tree.set_exists(path, exists);
        if exists {
            match self.backend.read_text(path) {
                Ok(content) => {
                    self.session.open(OpenFile::new(path, true), &content);
                    self.focus = Focus::Editor;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read file");
                    self.set_error_message(format!("Could not open {}: {}", file_name_of(path), e));
                }
            }
        } else {
            self.session.open_missing(OpenFile::new(path, false));
            self.focus = Focus::Editor;
            self.set_status_message(format!("{} does not exist yet; saving creates it", file_name_of(path)));
        }
        self.refresh_view();
    }

    fn needs_discard_confirm(&self) -> bool {
        self.session.is_dirty() && self.config.confirm_discard()
    }

    /// Carry out the action held by the discard dialog.
    pub fn confirm_discard(&mut self) {
        let AppMode::Dialog(DialogKind::DiscardConfirm { pending }) = &self.mode else {
            return;
        };
        let pending = pending.clone();
        self.close_dialog();
        self.run_pending(pending);
    }

    fn run_pending(&mut self, pending: PendingAction) {
        match pending {
            PendingAction::Open(path) => self.do_open(&path),
            PendingAction::CloseEditor => {
                self.session.close();
                self.focus = Focus::Tree;
            }
            PendingAction::Quit => self.quit(),
        }
    }

    pub fn request_close_editor(&mut self) {
        if !self.session.is_open() {
            return;
        }
        if self.needs_discard_confirm() {
            self.open_dialog(DialogKind::DiscardConfirm {
                pending: PendingAction::CloseEditor,
            });
        } else {
            self.run_pending(PendingAction::CloseEditor);
        }
    }

    pub fn request_quit(&mut self) {
        if self.needs_discard_confirm() {
            self.open_dialog(DialogKind::DiscardConfirm {
                pending: PendingAction::Quit,
            });
        } else {
            self.quit();
        }
    }

    /// Save the open file.
    pub fn save(&mut self) {
        match self.session.save(self.backend.as_ref()) {
            Ok(Some(path)) => {
                self.tree.set_exists(&path, true);
                self.set_status_message(format!("Saved {}", file_name_of(&path)));
                self.persist();
                self.refresh_view();
            }
            Ok(None) => self.set_status_message("No changes to save".into()),
            Err(e) => {
                tracing::warn!(error = %e, "save failed");
                self.set_error_message(format!("Save failed: {}", e));
            }
        }
    }

    /// Ask before removing the selected managed item.
    pub fn request_remove_selected(&mut self) {
        let Some(item) = self.view.selected().cloned() else {
            return;
        };
        if item.depth > 0 {
            self.set_error_message("Only managed items can be removed; remove the folder instead".into());
            return;
        }
        self.open_dialog(DialogKind::RemoveConfirm { target: item.path });
    }

    /// Stop managing `path`. Nothing is deleted on disk.
    pub fn remove_managed(&mut self, path: &Path) {
        let was_folder = self.tree.find(path).is_some_and(|i| i.is_folder());
        let Some(removed) = self.tree.remove(path) else {
            self.set_error_message(AppError::NotFound(path.to_path_buf()).to_string());
            return;
        };
        if was_folder {
            // Children may be unloaded (reload, scan in flight), so match by
            // prefix. Files managed on their own keep their tags.
            let tree = &self.tree;
            self.tags.remove_associations_under(path, |p| tree.contains(p));
        } else {
            self.tags.remove_associations_for_paths(&removed);
        }
        let open_removed = self
            .session
            .current
            .as_ref()
            .is_some_and(|f| f.path.starts_with(path) && !self.tree.contains(&f.path));
        if open_removed {
            self.session.close();
            self.focus = Focus::Tree;
        }
        self.set_status_message(format!("Removed {}", file_name_of(path)));
        self.persist();
        self.refresh_view();
    }

    /// Show the selected item in the system file manager.
    pub fn reveal_selected(&mut self) {
        let Some(path) = self.selected_path() else {
            return;
        };
        if let Err(e) = self.backend.reveal_in_file_manager(&path) {
            self.set_error_message(format!("Could not reveal {}: {}", path.display(), e));
        }
    }

    pub fn toggle_show_missing(&mut self) {
        self.filter.show_missing = !self.filter.show_missing;
        self.set_status_message(if self.filter.show_missing {
            "Showing missing files".into()
        } else {
            "Hiding missing files".into()
        });
        self.refresh_view();
    }

    /// Switch between the dark and light palettes.
    pub fn toggle_theme(&mut self) {
        self.theme_name = if self.theme_name == "light" { "dark" } else { "light" }.to_string();
        self.theme = resolve_scheme(&self.theme_name, &self.config.theme);
        self.persist();
    }

    // ── Filters ─────────────────────────────────────────────────────────

    /// Toggle the `index`-th registered tag in the tag filter.
    pub fn toggle_filter_tag(&mut self, index: usize) {
        let Some(tag) = self.tags.tags().get(index) else {
            return;
        };
        let id = tag.id.clone();
        if let Some(pos) = self.filter.tags.iter().position(|t| *t == id) {
            self.filter.tags.remove(pos);
        } else {
            self.filter.tags.push(id);
        }
        self.refresh_view();
    }

    pub fn clear_filter_tags(&mut self) {
        self.filter.tags.clear();
        self.refresh_view();
    }

    pub fn open_filter(&mut self) {
        self.mode = AppMode::Dialog(DialogKind::Filter);
        self.dialog_state = DialogState {
            cursor_position: self.filter.query.len(),
            input: self.filter.query.clone(),
            ..Default::default()
        };
    }

    /// Mirror the filter input into the live name query.
    pub fn apply_filter_query(&mut self) {
        self.filter.query = self.dialog_state.input.clone();
        self.refresh_view();
    }

    pub fn cancel_filter(&mut self) {
        self.close_dialog();
        self.filter.query.clear();
        self.refresh_view();
    }

    // ── Dialogs ─────────────────────────────────────────────────────────

    /// Open a dialog of the given kind.
    pub fn open_dialog(&mut self, kind: DialogKind) {
        self.dialog_state = DialogState::default();
        self.mode = AppMode::Dialog(kind);
    }

    /// Close the current dialog and return to normal mode.
    pub fn close_dialog(&mut self) {
        if let AppMode::Dialog(DialogKind::ScanResults { .. }) = self.mode {
            self.scanning = None;
        }
        if let AppMode::Dialog(DialogKind::Onboarding) = self.mode {
            self.finish_onboarding();
        }
        self.mode = AppMode::Normal;
        self.dialog_state = DialogState::default();
    }

    /// Add the path typed into the add dialog.
    ///
    /// Directories become managed folders; anything else, including a path
    /// that does not exist yet, becomes a standalone file.
    pub fn add_path_from_input(&mut self) {
        let raw = self.dialog_state.input.trim().to_string();
        if raw.is_empty() {
            return;
        }
        self.close_dialog();
        match self.add_path(&raw) {
            Ok(path) => {
                self.refresh_view();
                self.select_path(&path);
                let exists = self.tree.find(&path).is_some_and(|i| i.exists);
                let suffix = if exists { "" } else { " (missing)" };
                self.set_status_message(format!("Added {}{}", path.display(), suffix));
                self.persist();
            }
            Err(e) => self.set_error_message(e.to_string()),
        }
    }

    /// Resolve a typed path and add it to the tree: directories become
    /// folders, anything else a (possibly missing) file.
    pub fn add_path(&mut self, raw: &str) -> Result<PathBuf> {
        let probe = self.backend.resolve_and_probe(raw);
        if probe.is_directory {
            self.tree.add_folder(&probe.actual_path, true)?;
        } else {
            self.tree.add_file(&probe.actual_path, probe.exists)?;
        }
        tracing::debug!(path = %probe.actual_path.display(), exists = probe.exists, "added path");
        Ok(probe.actual_path)
    }

    /// Start an import scan of the folder typed into the scan dialog.
    pub fn start_scan_from_input(&mut self) {
        let raw = self.dialog_state.input.trim().to_string();
        if raw.is_empty() {
            return;
        }
        let probe = self.backend.resolve_and_probe(&raw);
        if !probe.is_directory {
            self.close_dialog();
            let err = AppError::InvalidPath(format!("{} is not a folder", probe.actual_path.display()));
            self.set_error_message(err.to_string());
            return;
        }
        let root = probe.actual_path;
        self.open_dialog(DialogKind::ScanResults { root: root.clone() });
        self.scanning = Some(root.clone());
        self.pending_jobs.push(Job::ScanConfigs(root));
    }

    /// Quick-add dialog over the platform's well-known config files.
    pub fn open_templates(&mut self) {
        let items = self
            .backend
            .list_templates()
            .into_iter()
            .map(|t| {
                let managed = self.tree.contains(&t.path);
                let exists = self.backend.check_existence(&t.path);
                let state = if managed {
                    "managed"
                } else if exists {
                    "exists"
                } else {
                    "missing"
                };
                ChecklistItem {
                    label: format!("{} [{}]", t.name, t.category.label()),
                    detail: format!("{} ({})", t.description, state),
                    value: ChecklistValue::Path(t.path),
                    checked: false,
                    enabled: !managed,
                }
            })
            .collect();
        self.open_dialog(DialogKind::Templates);
        self.dialog_state.items = items;
    }

    /// First-run picker: existing files are pre-selected, missing ones
    /// cannot be picked.
    pub fn open_onboarding(&mut self) {
        let items = self
            .backend
            .list_templates()
            .into_iter()
            .map(|t| {
                let exists = self.backend.check_existence(&t.path);
                let managed = self.tree.contains(&t.path);
                ChecklistItem {
                    label: t.name.to_string(),
                    detail: t.path.display().to_string(),
                    value: ChecklistValue::Path(t.path),
                    checked: exists,
                    enabled: exists && !managed,
                }
            })
            .collect();
        self.open_dialog(DialogKind::Onboarding);
        self.dialog_state.items = items;
    }

    fn finish_onboarding(&mut self) {
        if !self.onboarding_completed {
            self.onboarding_completed = true;
            self.persist();
        }
    }

    pub fn checklist_next(&mut self) {
        let len = self.dialog_state.items.len();
        if len > 0 && self.dialog_state.selected < len - 1 {
            self.dialog_state.selected += 1;
        }
    }

    pub fn checklist_previous(&mut self) {
        self.dialog_state.selected = self.dialog_state.selected.saturating_sub(1);
    }

    pub fn checklist_toggle(&mut self) {
        if let Some(item) = self.dialog_state.items.get_mut(self.dialog_state.selected) {
            if item.enabled {
                item.checked = !item.checked;
            }
        }
    }

    /// Apply a checklist dialog (templates, onboarding, scan results).
    pub fn confirm_checklist(&mut self) {
        let picked: Vec<PathBuf> = self
            .dialog_state
            .items
            .iter()
            .filter(|i| i.checked && i.enabled)
            .filter_map(|i| match &i.value {
                ChecklistValue::Path(p) => Some(p.clone()),
                ChecklistValue::Tag(_) => None,
            })
            .collect();
        self.close_dialog();

        let mut added = 0;
        for path in &picked {
            let exists = self.backend.check_existence(path);
            match self.tree.add_file(path, exists) {
                Ok(()) => added += 1,
                Err(e) => tracing::debug!(error = %e, "skipping import"),
            }
        }
        if added > 0 {
            self.set_status_message(format!("Added {} file(s)", added));
            self.persist();
        }
        self.refresh_view();
    }

    /// Tag picker for the selected row.
    pub fn open_tag_picker(&mut self) {
        let Some(target) = self.selected_path() else {
            return;
        };
        self.open_tag_picker_for(target);
    }

    fn open_tag_picker_for(&mut self, target: PathBuf) {
        let assigned = self.tags.tags_for(&target).to_vec();
        let items = self
            .tags
            .tags()
            .iter()
            .map(|t| ChecklistItem {
                label: t.name.clone(),
                detail: t.color.clone(),
                value: ChecklistValue::Tag(t.id.clone()),
                checked: assigned.contains(&t.id),
                enabled: true,
            })
            .collect();
        self.open_dialog(DialogKind::TagPicker { target });
        self.dialog_state.items = items;
    }

    /// Store the picker's selection, keeping the order of tags that stay.
    pub fn apply_tag_picker(&mut self) {
        let AppMode::Dialog(DialogKind::TagPicker { target }) = &self.mode else {
            return;
        };
        let target = target.clone();
        let checked: Vec<TagId> = self
            .dialog_state
            .items
            .iter()
            .filter(|i| i.checked)
            .filter_map(|i| match &i.value {
                ChecklistValue::Tag(id) => Some(id.clone()),
                ChecklistValue::Path(_) => None,
            })
            .collect();
        let mut tags: Vec<TagId> = self
            .tags
            .tags_for(&target)
            .iter()
            .filter(|t| checked.contains(t))
            .cloned()
            .collect();
        for id in checked {
            if !tags.contains(&id) {
                tags.push(id);
            }
        }
        self.tags.set_tags(&target, tags);
        self.close_dialog();
        self.persist();
        self.refresh_view();
    }

    pub fn open_tag_manager(&mut self) {
        let items = self
            .tags
            .tags()
            .iter()
            .map(|t| {
                let uses = self
                    .tags
                    .assignments()
                    .values()
                    .filter(|list| list.contains(&t.id))
                    .count();
                ChecklistItem {
                    label: t.name.clone(),
                    detail: format!("{} item(s)", uses),
                    value: ChecklistValue::Tag(t.id.clone()),
                    checked: false,
                    enabled: true,
                }
            })
            .collect();
        let selected = self.dialog_state.selected;
        self.open_dialog(DialogKind::TagManager);
        self.dialog_state.items = items;
        self.dialog_state.selected = selected.min(self.dialog_state.items.len().saturating_sub(1));
    }

    /// Delete the tag under the cursor in the tag manager.
    pub fn delete_selected_tag(&mut self) {
        let Some(ChecklistValue::Tag(id)) = self
            .dialog_state
            .items
            .get(self.dialog_state.selected)
            .map(|i| i.value.clone())
        else {
            return;
        };
        if self.tags.delete_tag(&id) {
            self.filter.tags.retain(|t| *t != id);
            self.persist();
            self.refresh_view();
        }
        self.open_tag_manager();
    }

    /// Open the name prompt for a new tag, returning to `target`'s picker
    /// (or the manager) afterwards.
    pub fn open_new_tag(&mut self) {
        let target = match &self.mode {
            AppMode::Dialog(DialogKind::TagPicker { target }) => Some(target.clone()),
            _ => None,
        };
        self.open_dialog(DialogKind::NewTag { target });
    }

    pub fn create_tag_from_input(&mut self) {
        let AppMode::Dialog(DialogKind::NewTag { target }) = &self.mode else {
            return;
        };
        let target = target.clone();
        let color = next_color(self.tags.tags().len());
        match self.tags.create_tag(&self.dialog_state.input, color) {
            Ok(id) => {
                if let Some(path) = &target {
                    self.tags.toggle_tag(path, &id);
                }
                self.persist();
                self.refresh_view();
            }
            Err(e) => self.set_error_message(e.to_string()),
        }
        match target {
            Some(path) => self.open_tag_picker_for(path),
            None => self.open_tag_manager(),
        }
    }

    // ── Dialog text input ───────────────────────────────────────────────

    /// Insert a character at the current cursor position.
    pub fn dialog_input_char(&mut self, c: char) {
        self.dialog_state
            .input
            .insert(self.dialog_state.cursor_position, c);
        self.dialog_state.cursor_position += c.len_utf8();
    }

    /// Insert pasted text at the cursor, dropping line breaks.
    pub fn dialog_input_str(&mut self, s: &str) {
        for c in s.chars().filter(|c| *c != '\n' && *c != '\r') {
            self.dialog_input_char(c);
        }
    }

    /// Delete the character before the cursor (backspace).
    pub fn dialog_delete_char(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
            self.dialog_state
                .input
                .remove(self.dialog_state.cursor_position);
        }
    }

    /// Move cursor left by one character.
    pub fn dialog_move_cursor_left(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(prev) = self.dialog_state.input[..pos].chars().next_back() {
            self.dialog_state.cursor_position -= prev.len_utf8();
        }
    }

    /// Move cursor right by one character.
    pub fn dialog_move_cursor_right(&mut self) {
        let pos = self.dialog_state.cursor_position;
        if let Some(next) = self.dialog_state.input[pos..].chars().next() {
            self.dialog_state.cursor_position += next.len_utf8();
        }
    }

    pub fn dialog_cursor_home(&mut self) {
        self.dialog_state.cursor_position = 0;
    }

    pub fn dialog_cursor_end(&mut self) {
        self.dialog_state.cursor_position = self.dialog_state.input.len();
    }

    // ── Status ──────────────────────────────────────────────────────────

    pub fn set_status_message(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            text: msg,
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error_message(&mut self, msg: String) {
        self.status_message = Some(StatusMessage {
            text: msg,
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message if it has been displayed for more than 3 seconds.
    pub fn clear_expired_status(&mut self) {
        if let Some(msg) = &self.status_message {
            if msg.created.elapsed().as_secs() > 3 {
                self.status_message = None;
            }
        }
    }

    /// Quit the application, saving state first.
    pub fn quit(&mut self) {
        self.persist();
        self.should_quit = true;
    }

    /// Whether the selected row is a folder still being listed.
    pub fn selected_is_loading(&self) -> bool {
        self.view.selected().is_some_and(|i| i.is_loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::backend::tests_support::MockBackend;
    use std::time::Duration;
    use tempfile::TempDir;

    fn quiet_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.general.onboarding = Some(false);
        config
    }

    fn setup(backend: MockBackend) -> (Arc<MockBackend>, App) {
        let backend = Arc::new(backend);
        let app = App::new(quiet_config(), backend.clone(), AppState::default(), None);
        (backend, app)
    }

    fn add(app: &mut App, raw: &str) {
        app.open_dialog(DialogKind::AddPath);
        app.dialog_input_str(raw);
        app.add_path_from_input();
    }

    fn conf_dir() -> MockBackend {
        MockBackend::default()
            .with_dir(
                "/etc/app",
                vec![
                    FileSystemItem::folder(Path::new("/etc/app/conf.d"), true),
                    FileSystemItem::file(Path::new("/etc/app/main.conf"), true),
                ],
            )
            .with_file("/etc/app/main.conf", "port = 80\n")
            .with_file("/home/mock/.zshrc", "export A=1\n")
            .with_file("/home/mock/.vimrc", "set nu\n")
    }

    #[test]
    fn add_path_detects_folder_and_file() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.not-there");
        app.toggle_show_missing();

        assert!(app.tree.find(Path::new("/etc/app")).unwrap().is_folder());
        assert!(app.tree.contains(Path::new("/home/mock/.zshrc")));
        let missing = app.tree.find(Path::new("/home/mock/.not-there")).unwrap();
        assert!(!missing.exists);
        assert_eq!(app.view.flat_items.len(), 3);
    }

    #[test]
    fn duplicate_add_reports_error() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        add(&mut app, "/etc/app");
        let msg = app.status_message.as_ref().unwrap();
        assert!(msg.is_error);
        assert!(msg.text.contains("Already managed"));
    }

    #[test]
    fn expanding_schedules_exactly_one_scan() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        app.view.selected_index = 0;

        app.activate_selected();
        assert_eq!(app.take_jobs(), vec![Job::LoadChildren(PathBuf::from("/etc/app"))]);
        assert!(app.selected_is_loading());

        // Collapse then expand again while the scan is still in flight.
        app.activate_selected();
        app.activate_selected();
        assert!(app.take_jobs().is_empty());
    }

    #[test]
    fn loaded_children_show_up_and_never_rescan() {
        let (backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        app.activate_selected();
        app.take_jobs();

        let listing = backend.list_children(Path::new("/etc/app"), true);
        app.handle_children_loaded(PathBuf::from("/etc/app"), listing);
        let names: Vec<&str> = app.view.flat_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["app", "conf.d", "main.conf"]);

        app.view.selected_index = 0;
        app.activate_selected();
        app.activate_selected();
        assert!(app.take_jobs().is_empty());
        assert_eq!(backend.scans(), 1);
    }

    #[test]
    fn failed_load_reverts_and_reports() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        app.activate_selected();
        app.take_jobs();

        app.handle_children_loaded(
            PathBuf::from("/etc/app"),
            Err(AppError::Scan("timed out after 10 ms".into())),
        );
        assert!(app.status_message.as_ref().unwrap().is_error);
        assert!(!app.tree.is_expanded(Path::new("/etc/app")));

        app.activate_selected();
        assert_eq!(app.take_jobs().len(), 1);
    }

    #[test]
    fn result_for_removed_folder_is_dropped() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        app.activate_selected();
        app.remove_managed(Path::new("/etc/app"));
        app.handle_children_loaded(PathBuf::from("/etc/app"), Ok(vec![]));
        assert!(app.view.flat_items.is_empty());
    }

    #[test]
    fn open_missing_file_then_save_creates_it() {
        let (backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.gitconfig");
        app.toggle_show_missing();
        app.view.selected_index = 0;
        app.activate_selected();

        assert_eq!(app.focus, Focus::Editor);
        assert_eq!(app.session.buffer.text(), "");
        app.session.buffer.insert_str("[user]\n");
        app.save();

        assert_eq!(backend.content("/home/mock/.gitconfig").as_deref(), Some("[user]\n"));
        assert!(app.tree.find(Path::new("/home/mock/.gitconfig")).unwrap().exists);
    }

    #[test]
    fn switching_with_unsaved_edits_asks_first() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.vimrc");
        app.request_open(Path::new("/home/mock/.zshrc"));
        app.session.buffer.insert_char('#');

        app.request_open(Path::new("/home/mock/.vimrc"));
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::DiscardConfirm {
                pending: PendingAction::Open(PathBuf::from("/home/mock/.vimrc"))
            })
        );
        assert!(app.session.is_open_path(Path::new("/home/mock/.zshrc")));

        app.confirm_discard();
        assert!(app.session.is_open_path(Path::new("/home/mock/.vimrc")));
        assert!(!app.session.is_dirty());
    }

    #[test]
    fn discard_guard_can_be_disabled() {
        let mut config = quiet_config();
        config.editor.confirm_discard = Some(false);
        let mut app = App::new(config, Arc::new(conf_dir()), AppState::default(), None);
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.vimrc");
        app.request_open(Path::new("/home/mock/.zshrc"));
        app.session.buffer.insert_char('#');
        app.request_open(Path::new("/home/mock/.vimrc"));
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.session.is_open_path(Path::new("/home/mock/.vimrc")));
    }

    #[test]
    fn quit_with_unsaved_edits_asks_first() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        app.request_open(Path::new("/home/mock/.zshrc"));
        app.session.buffer.insert_char('#');
        app.request_quit();
        assert!(!app.should_quit);
        app.confirm_discard();
        assert!(app.should_quit);
    }

    #[test]
    fn remove_cleans_tags_and_closes_editor() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        let path = PathBuf::from("/home/mock/.zshrc");
        let id = app.tags.create_tag("shell", "#22c55e").unwrap();
        app.tags.set_tags(&path, vec![id]);
        app.request_open(&path);

        app.remove_managed(&path);
        assert!(!app.tree.contains(&path));
        assert!(app.tags.tags_for(&path).is_empty());
        assert!(!app.session.is_open());
        assert_eq!(app.focus, Focus::Tree);
    }

    #[test]
    fn removing_reloaded_folder_drops_descendant_tags() {
        let (backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        app.activate_selected();
        let listing = backend.list_children(Path::new("/etc/app"), true);
        app.handle_children_loaded(PathBuf::from("/etc/app"), listing);

        let main = PathBuf::from("/etc/app/main.conf");
        let id = app.tags.create_tag("server", "#22c55e").unwrap();
        app.tags.set_tags(&main, vec![id.clone()]);
        app.tags.set_tags(Path::new("/etc/app"), vec![id]);
        app.request_open(&main);

        app.view.selected_index = 0;
        app.reload_selected();
        assert!(app.tree.find(Path::new("/etc/app")).unwrap().is_loading());

        app.remove_managed(Path::new("/etc/app"));
        assert!(app.tags.tags_for(&main).is_empty());
        assert!(app.tags.tags_for(Path::new("/etc/app")).is_empty());
        assert!(!app.session.is_open());
    }

    #[test]
    fn removing_folder_keeps_tags_of_standalone_file_inside() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        add(&mut app, "/etc/app/main.conf");
        let main = PathBuf::from("/etc/app/main.conf");
        let id = app.tags.create_tag("server", "#22c55e").unwrap();
        app.tags.set_tags(&main, vec![id]);

        app.remove_managed(Path::new("/etc/app"));
        assert!(app.tree.contains(&main));
        assert_eq!(app.tags.tags_for(&main).len(), 1);
    }

    #[test]
    fn only_root_items_can_be_removed() {
        let (backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        app.activate_selected();
        let listing = backend.list_children(Path::new("/etc/app"), true);
        app.handle_children_loaded(PathBuf::from("/etc/app"), listing);

        app.view.selected_index = 2;
        app.request_remove_selected();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.status_message.as_ref().unwrap().is_error);

        app.view.selected_index = 0;
        app.request_remove_selected();
        assert_eq!(
            app.mode,
            AppMode::Dialog(DialogKind::RemoveConfirm {
                target: PathBuf::from("/etc/app")
            })
        );
    }

    #[test]
    fn tag_picker_keeps_existing_order() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        let path = PathBuf::from("/home/mock/.zshrc");
        let a = app.tags.create_tag("a", "#111111").unwrap();
        let b = app.tags.create_tag("b", "#222222").unwrap();
        let c = app.tags.create_tag("c", "#333333").unwrap();
        app.tags.set_tags(&path, vec![c.clone(), a.clone()]);
        app.refresh_view();

        app.open_tag_picker();
        // Rows follow registry order: a, b, c. Check b, uncheck a.
        app.checklist_toggle();
        app.checklist_next();
        app.checklist_toggle();
        app.apply_tag_picker();

        assert_eq!(app.tags.tags_for(&path), &[c, b]);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn new_tag_from_picker_is_assigned() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        app.open_tag_picker();
        app.open_new_tag();
        app.dialog_input_str("work");
        app.create_tag_from_input();

        let tag = &app.tags.tags()[0];
        assert_eq!(tag.name, "work");
        assert_eq!(tag.color, next_color(0));
        assert_eq!(app.tags.tags_for(Path::new("/home/mock/.zshrc")), &[tag.id.clone()]);
        assert!(matches!(app.mode, AppMode::Dialog(DialogKind::TagPicker { .. })));
        assert!(app.dialog_state.items[0].checked);
    }

    #[test]
    fn empty_tag_name_is_rejected() {
        let (_backend, mut app) = setup(conf_dir());
        app.open_new_tag();
        app.dialog_input_str("   ");
        app.create_tag_from_input();
        assert!(app.tags.tags().is_empty());
        assert!(app.status_message.as_ref().unwrap().is_error);
    }

    #[test]
    fn deleting_tag_prunes_filter() {
        let (_backend, mut app) = setup(conf_dir());
        let id = app.tags.create_tag("x", "#111111").unwrap();
        app.toggle_filter_tag(0);
        assert_eq!(app.filter.tags, vec![id]);

        app.open_tag_manager();
        app.delete_selected_tag();
        assert!(app.tags.tags().is_empty());
        assert!(app.filter.tags.is_empty());
        assert!(app.dialog_state.items.is_empty());
    }

    #[test]
    fn tag_filter_narrows_standalone_files() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.vimrc");
        let id = app.tags.create_tag("shell", "#22c55e").unwrap();
        app.tags.set_tags(Path::new("/home/mock/.zshrc"), vec![id]);

        app.toggle_filter_tag(0);
        let names: Vec<&str> = app.view.flat_items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec![".zshrc"]);

        app.clear_filter_tags();
        assert_eq!(app.view.flat_items.len(), 2);
    }

    #[test]
    fn name_filter_is_live_and_cancel_clears() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        add(&mut app, "~/.vimrc");
        app.open_filter();
        app.dialog_input_str("vim");
        app.apply_filter_query();
        assert_eq!(app.view.flat_items.len(), 1);

        app.cancel_filter();
        assert!(app.filter.query.is_empty());
        assert_eq!(app.view.flat_items.len(), 2);
    }

    #[test]
    fn onboarding_preselects_existing_templates() {
        let backend = Arc::new(conf_dir());
        let app = App::new(AppConfig::default(), backend, AppState::default(), None);
        assert_eq!(app.mode, AppMode::Dialog(DialogKind::Onboarding));

        let zshrc = app
            .dialog_state
            .items
            .iter()
            .find(|i| i.label == ".zshrc")
            .unwrap();
        assert!(zshrc.checked && zshrc.enabled);
        let bashrc = app
            .dialog_state
            .items
            .iter()
            .find(|i| i.label == ".bashrc")
            .unwrap();
        assert!(!bashrc.checked && !bashrc.enabled);
    }

    #[test]
    fn onboarding_confirm_adds_and_completes() {
        let tmp = TempDir::new().unwrap();
        let state_file = StateFile::new(tmp.path().join("state.json"));
        let mut app = App::new(
            AppConfig::default(),
            Arc::new(conf_dir()),
            AppState::default(),
            Some(state_file.clone()),
        );
        app.confirm_checklist();

        assert!(app.onboarding_completed);
        assert!(app.tree.contains(Path::new("/home/mock/.zshrc")));
        assert!(app.tree.contains(Path::new("/home/mock/.vimrc")));
        assert_eq!(app.tree.roots.len(), 2);

        let saved = state_file.load().unwrap();
        assert!(saved.onboarding_completed);
        let again = App::new(AppConfig::default(), Arc::new(conf_dir()), saved, None);
        assert_eq!(again.mode, AppMode::Normal);
    }

    #[test]
    fn templates_disable_managed_entries() {
        let (_backend, mut app) = setup(conf_dir());
        add(&mut app, "~/.zshrc");
        app.open_templates();
        let zshrc = app
            .dialog_state
            .items
            .iter()
            .find(|i| i.value == ChecklistValue::Path(PathBuf::from("/home/mock/.zshrc")))
            .unwrap();
        assert!(!zshrc.enabled);
        assert!(zshrc.detail.contains("managed"));

        // Missing templates may still be added.
        let idx = app
            .dialog_state
            .items
            .iter()
            .position(|i| i.label.starts_with(".bashrc"))
            .unwrap();
        app.dialog_state.selected = idx;
        app.checklist_toggle();
        app.confirm_checklist();
        let bashrc = app.tree.find(Path::new("/home/mock/.bashrc")).unwrap();
        assert!(!bashrc.exists);
    }

    #[test]
    fn import_scan_skips_managed_files() {
        let backend = conf_dir()
            .with_dir("/proj", vec![])
            .with_file("/proj/a.toml", "")
            .with_file("/proj/sub/b.yaml", "");
        let (backend, mut app) = setup(backend);
        add(&mut app, "/proj/a.toml");

        app.open_dialog(DialogKind::ScanFolder);
        app.dialog_input_str("/proj");
        app.start_scan_from_input();
        assert_eq!(app.take_jobs(), vec![Job::ScanConfigs(PathBuf::from("/proj"))]);
        assert_eq!(app.scanning, Some(PathBuf::from("/proj")));

        let result = backend.scan_config_files(Path::new("/proj"), 2, Default::default());
        app.handle_scan_finished(PathBuf::from("/proj"), result);
        assert_eq!(app.scanning, None);
        let labels: Vec<&str> = app.dialog_state.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["b.yaml"]);

        app.confirm_checklist();
        assert!(app.tree.contains(Path::new("/proj/sub/b.yaml")));
    }

    #[test]
    fn scan_of_a_file_is_rejected() {
        let (_backend, mut app) = setup(conf_dir());
        app.open_dialog(DialogKind::ScanFolder);
        app.dialog_input_str("~/.zshrc");
        app.start_scan_from_input();
        assert!(app.take_jobs().is_empty());
        let msg = app.status_message.as_ref().unwrap();
        assert!(msg.is_error);
        assert_eq!(msg.text, "Invalid path: /home/mock/.zshrc is not a folder");
    }

    #[test]
    fn cancelled_scan_result_is_ignored() {
        let (_backend, mut app) = setup(conf_dir().with_dir("/proj", vec![]));
        app.open_dialog(DialogKind::ScanFolder);
        app.dialog_input_str("/proj");
        app.start_scan_from_input();
        app.close_dialog();
        app.handle_scan_finished(PathBuf::from("/proj"), Ok(vec![]));
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn state_round_trips_through_file() {
        let tmp = TempDir::new().unwrap();
        let state_file = StateFile::new(tmp.path().join("state.json"));
        let backend = Arc::new(conf_dir());
        let mut app = App::new(
            quiet_config(),
            backend.clone(),
            AppState::default(),
            Some(state_file.clone()),
        );
        add(&mut app, "/etc/app");
        app.activate_selected();
        app.take_jobs();
        app.toggle_theme();

        let mut restored = App::new(quiet_config(), backend, state_file.load().unwrap(), None);
        assert_eq!(restored.theme_name, "light");
        assert!(restored.tree.is_expanded(Path::new("/etc/app")));
        // The folder was saved mid-scan, so it is scanned again on startup.
        assert_eq!(
            restored.take_jobs(),
            vec![Job::LoadChildren(PathBuf::from("/etc/app"))]
        );
    }

    #[test]
    fn startup_refreshes_existence() {
        let mut state = AppState::default();
        state
            .managed_items
            .push(FileSystemItem::file(Path::new("/home/mock/.zshrc"), false));
        let app = App::new(quiet_config(), Arc::new(conf_dir()), state, None);
        assert!(app.tree.find(Path::new("/home/mock/.zshrc")).unwrap().exists);
    }

    #[test]
    fn collapse_or_parent_walks_up() {
        let (backend, mut app) = setup(conf_dir());
        add(&mut app, "/etc/app");
        app.activate_selected();
        let listing = backend.list_children(Path::new("/etc/app"), true);
        app.handle_children_loaded(PathBuf::from("/etc/app"), listing);

        app.view.selected_index = 2;
        app.collapse_or_parent();
        assert_eq!(app.view.selected_index, 0);
        app.collapse_or_parent();
        assert!(!app.tree.is_expanded(Path::new("/etc/app")));
    }

    #[test]
    fn dialog_input_editing() {
        let (_backend, mut app) = setup(conf_dir());
        app.open_dialog(DialogKind::AddPath);
        app.dialog_input_char('a');
        app.dialog_input_char('é');
        app.dialog_input_char('c');
        app.dialog_move_cursor_left();
        app.dialog_delete_char();
        assert_eq!(app.dialog_state.input, "ac");
        assert_eq!(app.dialog_state.cursor_position, 1);
        app.dialog_cursor_end();
        app.dialog_move_cursor_right();
        assert_eq!(app.dialog_state.cursor_position, 2);
        app.dialog_cursor_home();
        app.dialog_delete_char();
        assert_eq!(app.dialog_state.input, "ac");
    }

    #[test]
    fn close_dialog_returns_to_normal() {
        let (_backend, mut app) = setup(conf_dir());
        app.open_dialog(DialogKind::Help);
        app.dialog_input_char('x');
        app.close_dialog();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.dialog_state.input.is_empty());
    }

    #[test]
    fn clear_expired_status_removes_old() {
        let (_backend, mut app) = setup(conf_dir());
        app.set_status_message("fresh".into());
        app.clear_expired_status();
        assert!(app.status_message.is_some());

        if let Some(msg) = app.status_message.as_mut() {
            msg.created = Instant::now() - Duration::from_secs(5);
        }
        app.clear_expired_status();
        assert!(app.status_message.is_none());
    }
}
