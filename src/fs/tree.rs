use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::fs::paths::file_name_of;
use crate::tags::{tags_intersect, TagId, TagStore};

/// Load state of a folder's children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "items", rename_all = "snake_case")]
pub enum Children {
    /// Never scanned (or the last scan failed).
    #[default]
    NotLoaded,
    /// A scan is in flight.
    Loading,
    /// Scanned; the list may be empty.
    Loaded(Vec<FileSystemItem>),
}

/// File or folder. Only folders carry children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder {
        #[serde(default)]
        children: Children,
    },
}

/// A node in the managed tree, keyed by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemItem {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
    pub kind: ItemKind,
}

impl FileSystemItem {
    pub fn file(path: &Path, exists: bool) -> Self {
        Self {
            name: file_name_of(path),
            path: path.to_path_buf(),
            exists,
            kind: ItemKind::File,
        }
    }

    /// A folder whose children have not been scanned yet.
    pub fn folder(path: &Path, exists: bool) -> Self {
        Self {
            name: file_name_of(path),
            path: path.to_path_buf(),
            exists,
            kind: ItemKind::Folder {
                children: Children::NotLoaded,
            },
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.kind,
            ItemKind::Folder {
                children: Children::Loading
            }
        )
    }

    /// Loaded children, or `None` for files and folders not yet loaded.
    pub fn children(&self) -> Option<&[FileSystemItem]> {
        match &self.kind {
            ItemKind::Folder {
                children: Children::Loaded(items),
            } => Some(items),
            _ => None,
        }
    }
}

/// Sort a sibling list: folders first (optional), then case-insensitive name.
pub fn sort_items(items: &mut [FileSystemItem], dirs_first: bool) {
    items.sort_by(|a, b| {
        let mut cmp = std::cmp::Ordering::Equal;
        if dirs_first {
            cmp = b.is_folder().cmp(&a.is_folder());
        }
        cmp.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

// ── Path-addressed tree edits ────────────────────────────────────────────────

/// Find an item anywhere in the tree by exact path.
pub fn find_item<'a>(items: &'a [FileSystemItem], path: &Path) -> Option<&'a FileSystemItem> {
    for item in items {
        if item.path == path {
            return Some(item);
        }
        if let Some(children) = item.children() {
            if path.starts_with(&item.path) {
                if let Some(found) = find_item(children, path) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Replace the item at `path` with `f(item)`, rebuilding each parent on the
/// way down. Returns the new list and whether the path was found.
pub fn update_item<F>(items: Vec<FileSystemItem>, path: &Path, f: &mut F) -> (Vec<FileSystemItem>, bool)
where
    F: FnMut(FileSystemItem) -> FileSystemItem,
{
    let mut found = false;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if found {
            out.push(item);
        } else if item.path == path {
            found = true;
            out.push(f(item));
        } else if path.starts_with(&item.path) {
            let (rebuilt, hit) = rebuild_children(item, |children| update_item(children, path, f));
            found = hit;
            out.push(rebuilt);
        } else {
            out.push(item);
        }
    }
    (out, found)
}

/// Remove the item at `path` (and with it every descendant).
pub fn remove_item(
    items: Vec<FileSystemItem>,
    path: &Path,
) -> (Vec<FileSystemItem>, Option<FileSystemItem>) {
    let mut removed = None;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if removed.is_some() {
            out.push(item);
        } else if item.path == path {
            removed = Some(item);
        } else if path.starts_with(&item.path) {
            let mut hit = None;
            let (rebuilt, _) = rebuild_children(item, |children| {
                let (children, r) = remove_item(children, path);
                let found = r.is_some();
                hit = r;
                (children, found)
            });
            removed = hit;
            out.push(rebuilt);
        } else {
            out.push(item);
        }
    }
    (out, removed)
}

/// Apply `edit` to a folder's loaded children and reassemble the folder.
fn rebuild_children<E>(item: FileSystemItem, edit: E) -> (FileSystemItem, bool)
where
    E: FnOnce(Vec<FileSystemItem>) -> (Vec<FileSystemItem>, bool),
{
    let FileSystemItem {
        name,
        path,
        exists,
        kind,
    } = item;
    match kind {
        ItemKind::Folder {
            children: Children::Loaded(children),
        } => {
            let (children, hit) = edit(children);
            let kind = ItemKind::Folder {
                children: Children::Loaded(children),
            };
            (
                FileSystemItem {
                    name,
                    path,
                    exists,
                    kind,
                },
                hit,
            )
        }
        kind => (
            FileSystemItem {
                name,
                path,
                exists,
                kind,
            },
            false,
        ),
    }
}

/// The item's own path followed by every loaded descendant's path.
pub fn subtree_paths(item: &FileSystemItem) -> Vec<PathBuf> {
    let mut paths = vec![item.path.clone()];
    if let Some(children) = item.children() {
        for child in children {
            paths.extend(subtree_paths(child));
        }
    }
    paths
}

fn reset_pending(items: &mut [FileSystemItem]) {
    for item in items {
        if let ItemKind::Folder { children } = &mut item.kind {
            match children {
                Children::Loading => *children = Children::NotLoaded,
                Children::Loaded(kids) => reset_pending(kids),
                Children::NotLoaded => {}
            }
        }
    }
}

fn count_files(items: &[FileSystemItem], total: &mut usize, existing: &mut usize) {
    for item in items {
        match &item.kind {
            ItemKind::File => {
                *total += 1;
                if item.exists {
                    *existing += 1;
                }
            }
            ItemKind::Folder { .. } => {
                if let Some(children) = item.children() {
                    count_files(children, total, existing);
                }
            }
        }
    }
}

// ── Managed tree ─────────────────────────────────────────────────────────────

/// Result of an expand request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// The folder moved to `Loading`; the caller must scan it and report
    /// back through `finish_load`.
    Scan(PathBuf),
    /// Children were already loaded; only the expansion set changed.
    Expanded,
    /// Toggle closed an expanded folder.
    Collapsed,
    /// A scan is already in flight; nothing to do.
    AlreadyLoading,
    NotAFolder,
    Missing,
}

/// A standalone managed file with its tags, as shown in the flat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedFile {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
    pub tags: Vec<TagId>,
}

/// Keep the standalone files matching a tag selection.
///
/// Missing files are dropped unless `include_missing`; an empty selection
/// keeps every remaining file.
pub fn filter_tagged_files<'a>(
    files: &'a [TaggedFile],
    selected: &[TagId],
    include_missing: bool,
) -> Vec<&'a TaggedFile> {
    files
        .iter()
        .filter(|f| f.exists || include_missing)
        .filter(|f| tags_intersect(&f.tags, selected))
        .collect()
}

/// Every managed item in one path-indexed store.
///
/// Root-level files are the standalone managed files; root-level folders
/// are managed folders whose contents load lazily. A path may appear only
/// once anywhere in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedTree {
    pub roots: Vec<FileSystemItem>,
    pub expanded: BTreeSet<PathBuf>,
}

impl ManagedTree {
    pub fn new(roots: Vec<FileSystemItem>, expanded: BTreeSet<PathBuf>) -> Self {
        let mut tree = Self { roots, expanded };
        tree.reset_pending();
        tree
    }

    pub fn contains(&self, path: &Path) -> bool {
        find_item(&self.roots, path).is_some()
    }

    pub fn find(&self, path: &Path) -> Option<&FileSystemItem> {
        find_item(&self.roots, path)
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.contains(path)
    }

    /// Add a standalone file.
    pub fn add_file(&mut self, path: &Path, exists: bool) -> Result<()> {
        self.add_root(FileSystemItem::file(path, exists))
    }

    /// Add a managed folder (children load on first expand).
    pub fn add_folder(&mut self, path: &Path, exists: bool) -> Result<()> {
        self.add_root(FileSystemItem::folder(path, exists))
    }

    fn add_root(&mut self, item: FileSystemItem) -> Result<()> {
        if self.contains(&item.path) {
            return Err(AppError::AlreadyManaged(item.path));
        }
        tracing::info!(path = %item.path.display(), folder = item.is_folder(), "added managed item");
        self.roots.push(item);
        Ok(())
    }

    /// Root-level managed folders.
    pub fn folders(&self) -> impl Iterator<Item = &FileSystemItem> {
        self.roots.iter().filter(|i| i.is_folder())
    }

    /// Root-level standalone files joined with their tags.
    pub fn standalone_files(&self, tags: &TagStore) -> Vec<TaggedFile> {
        self.roots
            .iter()
            .filter(|i| !i.is_folder())
            .map(|i| TaggedFile {
                name: i.name.clone(),
                path: i.path.clone(),
                exists: i.exists,
                tags: tags.tags_for(&i.path).to_vec(),
            })
            .collect()
    }

    /// Expand a folder, scheduling a scan only if it was never loaded.
    pub fn expand(&mut self, path: &Path) -> ExpandOutcome {
        let state = match find_item(&self.roots, path).map(|i| &i.kind) {
            None => return ExpandOutcome::Missing,
            Some(ItemKind::File) => return ExpandOutcome::NotAFolder,
            Some(ItemKind::Folder { children }) => match children {
                Children::NotLoaded => None,
                Children::Loading => Some(ExpandOutcome::AlreadyLoading),
                Children::Loaded(_) => Some(ExpandOutcome::Expanded),
            },
        };
        self.expanded.insert(path.to_path_buf());
        match state {
            Some(outcome) => outcome,
            None => {
                self.set_children(path, Children::Loading);
                tracing::debug!(path = %path.display(), "folder loading");
                ExpandOutcome::Scan(path.to_path_buf())
            }
        }
    }

    /// Collapse a folder; loaded children are kept.
    pub fn collapse(&mut self, path: &Path) {
        self.expanded.remove(path);
    }

    /// Collapse if expanded, expand otherwise.
    pub fn toggle(&mut self, path: &Path) -> ExpandOutcome {
        if self.expanded.contains(path) {
            self.collapse(path);
            ExpandOutcome::Collapsed
        } else {
            self.expand(path)
        }
    }

    /// Drop a folder's loaded children and scan it again.
    pub fn reload(&mut self, path: &Path) -> ExpandOutcome {
        if find_item(&self.roots, path).is_some_and(|i| i.children().is_some()) {
            self.set_children(path, Children::NotLoaded);
        }
        self.expand(path)
    }

    /// Expanded folders directly under `path` whose children are not loaded.
    pub fn pending_expanded_children(&self, path: &Path) -> Vec<PathBuf> {
        let Some(children) = find_item(&self.roots, path).and_then(|i| i.children()) else {
            return Vec::new();
        };
        children
            .iter()
            .filter(|c| c.is_folder() && c.children().is_none() && !c.is_loading())
            .filter(|c| self.expanded.contains(&c.path))
            .map(|c| c.path.clone())
            .collect()
    }

    /// Deliver a scan result for a folder in `Loading`.
    ///
    /// On failure the folder returns to `NotLoaded` and leaves the expansion
    /// set, so the next expand retries. Results for folders that are no
    /// longer loading (removed meanwhile) are dropped; returns whether the
    /// result was applied.
    pub fn finish_load(&mut self, path: &Path, result: Result<Vec<FileSystemItem>>) -> bool {
        if !find_item(&self.roots, path).is_some_and(|i| i.is_loading()) {
            tracing::debug!(path = %path.display(), "dropping stale scan result");
            return false;
        }
        match result {
            Ok(items) => {
                tracing::debug!(path = %path.display(), count = items.len(), "folder loaded");
                self.set_children(path, Children::Loaded(items));
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "folder scan failed");
                self.set_children(path, Children::NotLoaded);
                self.expanded.remove(path);
            }
        }
        true
    }

    fn set_children(&mut self, path: &Path, children: Children) {
        let mut children = Some(children);
        let roots = std::mem::take(&mut self.roots);
        let (roots, _) = update_item(roots, path, &mut |mut item: FileSystemItem| {
            if let (ItemKind::Folder { children: slot }, Some(new)) =
                (&mut item.kind, children.take())
            {
                *slot = new;
            }
            item
        });
        self.roots = roots;
    }

    /// Remove an item and its descendants.
    ///
    /// Returns every removed path so the caller can drop tag associations.
    pub fn remove(&mut self, path: &Path) -> Option<Vec<PathBuf>> {
        let roots = std::mem::take(&mut self.roots);
        let (roots, removed) = remove_item(roots, path);
        self.roots = roots;
        let removed = removed?;
        let paths = subtree_paths(&removed);
        for p in &paths {
            self.expanded.remove(p);
        }
        tracing::info!(path = %path.display(), count = paths.len(), "removed managed item");
        Some(paths)
    }

    pub fn set_exists(&mut self, path: &Path, exists: bool) -> bool {
        let roots = std::mem::take(&mut self.roots);
        let (roots, found) = update_item(roots, path, &mut |mut item: FileSystemItem| {
            item.exists = exists;
            item
        });
        self.roots = roots;
        found
    }

    /// Apply a batch of existence probes.
    pub fn refresh_existence(&mut self, existence: &HashMap<PathBuf, bool>) {
        for (path, exists) in existence {
            self.set_exists(path, *exists);
        }
    }

    /// Paths of every root item, for bulk existence checks.
    pub fn root_paths(&self) -> Vec<PathBuf> {
        self.roots.iter().map(|i| i.path.clone()).collect()
    }

    /// Any `Loading` folder (e.g. from a persisted snapshot) becomes `NotLoaded`.
    pub fn reset_pending(&mut self) {
        reset_pending(&mut self.roots);
    }

    /// `(total files, existing files)` over standalone files and loaded folders.
    pub fn stats(&self) -> (usize, usize) {
        let (mut total, mut existing) = (0, 0);
        count_files(&self.roots, &mut total, &mut existing);
        (total, existing)
    }

    /// Flatten the visible part of the tree for rendering.
    ///
    /// Folders come first (in the order they were added), then standalone
    /// files.
    pub fn flatten(&self, tags: &TagStore, filter: &ItemFilter) -> Vec<FlatItem> {
        let matcher = SkimMatcherV2::default();
        let ctx = FlattenCtx {
            tree: self,
            tags,
            filter,
            matcher: &matcher,
        };
        let mut items = Vec::new();

        let folders: Vec<&FileSystemItem> = self.folders().collect();
        for (i, folder) in folders.iter().enumerate() {
            ctx.flatten_node(folder, 0, i + 1 == folders.len(), false, &mut items);
        }

        let files = self.standalone_files(tags);
        let shown = filter_tagged_files(&files, &filter.tags, filter.show_missing);
        for (i, file) in shown.iter().enumerate() {
            if !ctx.name_matches(&file.name) {
                continue;
            }
            items.push(FlatItem {
                name: file.name.clone(),
                path: file.path.clone(),
                is_folder: false,
                depth: 0,
                is_expanded: false,
                is_loading: false,
                is_last_sibling: i + 1 == shown.len(),
                exists: file.exists,
                standalone: true,
                tags: file.tags.clone(),
            });
        }
        items
    }
}

// ── Flattening ───────────────────────────────────────────────────────────────

/// Filter applied while flattening.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Selected tag ids (OR semantics).
    pub tags: Vec<TagId>,
    /// Fuzzy name query.
    pub query: String,
    /// Show standalone files that do not exist on disk.
    pub show_missing: bool,
}

impl ItemFilter {
    pub fn is_active(&self) -> bool {
        !self.tags.is_empty() || !self.query.is_empty()
    }
}

/// A flattened tree row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatItem {
    pub name: String,
    pub path: PathBuf,
    pub is_folder: bool,
    pub depth: usize,
    pub is_expanded: bool,
    pub is_loading: bool,
    pub is_last_sibling: bool,
    pub exists: bool,
    /// Root-level standalone file.
    pub standalone: bool,
    pub tags: Vec<TagId>,
}

struct FlattenCtx<'a> {
    tree: &'a ManagedTree,
    tags: &'a TagStore,
    filter: &'a ItemFilter,
    matcher: &'a SkimMatcherV2,
}

impl FlattenCtx<'_> {
    fn name_matches(&self, name: &str) -> bool {
        self.filter.query.is_empty() || self.matcher.fuzzy_match(name, &self.filter.query).is_some()
    }

    /// Push `node` (and visible descendants) into `out`.
    ///
    /// `inherited` is set when an ancestor folder's tags already satisfy the
    /// tag filter. Returns whether anything was pushed.
    fn flatten_node(
        &self,
        node: &FileSystemItem,
        depth: usize,
        is_last: bool,
        inherited: bool,
        out: &mut Vec<FlatItem>,
    ) -> bool {
        let node_tags = self.tags.tags_for(&node.path);
        let expanded = self.tree.is_expanded(&node.path);

        if !self.filter.is_active() {
            out.push(self.row(node, depth, is_last, expanded, node_tags));
            if expanded {
                self.flatten_children(node, depth, false, out);
            }
            return true;
        }

        let tag_ok = inherited || tags_intersect(node_tags, &self.filter.tags);
        let self_matches = tag_ok && self.name_matches(&node.name);

        let mut child_rows = Vec::new();
        let child_matches = self.flatten_children(node, depth, tag_ok, &mut child_rows);

        if self_matches || child_matches {
            out.push(self.row(node, depth, is_last, expanded || child_matches, node_tags));
            out.extend(child_rows);
            true
        } else {
            false
        }
    }

    fn flatten_children(
        &self,
        node: &FileSystemItem,
        depth: usize,
        inherited: bool,
        out: &mut Vec<FlatItem>,
    ) -> bool {
        let Some(children) = node.children() else {
            return false;
        };
        let mut any = false;
        let start = out.len();
        for (i, child) in children.iter().enumerate() {
            if self.flatten_node(child, depth + 1, i + 1 == children.len(), inherited, out) {
                any = true;
            }
        }
        // Filtering can hide the real last sibling; re-mark the last shown one.
        if self.filter.is_active() {
            let mut last_at_depth = None;
            for (idx, row) in out.iter_mut().enumerate().skip(start) {
                if row.depth == depth + 1 {
                    row.is_last_sibling = false;
                    last_at_depth = Some(idx);
                }
            }
            if let Some(idx) = last_at_depth {
                out[idx].is_last_sibling = true;
            }
        }
        any
    }

    fn row(
        &self,
        node: &FileSystemItem,
        depth: usize,
        is_last: bool,
        is_expanded: bool,
        tags: &[TagId],
    ) -> FlatItem {
        FlatItem {
            name: node.name.clone(),
            path: node.path.clone(),
            is_folder: node.is_folder(),
            depth,
            is_expanded: node.is_folder() && is_expanded,
            is_loading: node.is_loading(),
            is_last_sibling: is_last,
            exists: node.exists,
            standalone: false,
            tags: tags.to_vec(),
        }
    }
}

// ── Selection / scrolling over the flat list ─────────────────────────────────

/// Cursor and scroll state over the flattened tree.
#[derive(Debug, Default)]
pub struct TreeView {
    pub flat_items: Vec<FlatItem>,
    pub selected_index: usize,
    pub scroll_offset: usize,
}

impl TreeView {
    /// Replace the rows, keeping the selection on the same path if it is
    /// still visible.
    pub fn set_items(&mut self, items: Vec<FlatItem>) {
        let selected_path = self.selected().map(|i| i.path.clone());
        self.flat_items = items;
        if let Some(path) = selected_path {
            if let Some(idx) = self.find_index_by_path(&path) {
                self.selected_index = idx;
                return;
            }
        }
        if !self.flat_items.is_empty() && self.selected_index >= self.flat_items.len() {
            self.selected_index = self.flat_items.len() - 1;
        }
    }

    pub fn selected(&self) -> Option<&FlatItem> {
        self.flat_items.get(self.selected_index)
    }

    pub fn find_index_by_path(&self, path: &Path) -> Option<usize> {
        self.flat_items.iter().position(|item| item.path == path)
    }

    pub fn select_next(&mut self) {
        let len = self.flat_items.len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        let len = self.flat_items.len();
        if len > 0 {
            self.selected_index = len - 1;
        }
    }

    /// Index of the parent folder row of the selected item.
    pub fn parent_index(&self) -> Option<usize> {
        let item = self.selected()?;
        let parent = item.path.parent()?;
        if item.depth == 0 {
            return None;
        }
        self.find_index_by_path(parent)
    }

    /// Update the scroll offset to ensure the selected item is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }
}
