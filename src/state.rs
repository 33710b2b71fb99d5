//! Persisted application state: one JSON document loaded at startup and
//! rewritten after every mutation.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fs::tree::{FileSystemItem, ManagedTree};
use crate::tags::{TagId, TagRecord, TagStore};

/// Snapshot of everything that survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub managed_items: Vec<FileSystemItem>,
    pub expanded_folders: Vec<PathBuf>,
    pub tags: Vec<TagRecord>,
    pub file_tags: BTreeMap<PathBuf, Vec<TagId>>,
    pub onboarding_completed: bool,
    pub theme: Option<String>,
}

impl AppState {
    /// Capture the live stores.
    pub fn capture(tree: &ManagedTree, tags: &TagStore, onboarding_completed: bool, theme: &str) -> Self {
        Self {
            managed_items: tree.roots.clone(),
            expanded_folders: tree.expanded.iter().cloned().collect(),
            tags: tags.tags().to_vec(),
            file_tags: tags.assignments().clone(),
            onboarding_completed,
            theme: Some(theme.to_string()),
        }
    }

    /// Split into live stores. Folders persisted mid-scan come back unloaded.
    pub fn into_stores(self) -> (ManagedTree, TagStore) {
        let expanded: BTreeSet<PathBuf> = self.expanded_folders.into_iter().collect();
        let tree = ManagedTree::new(self.managed_items, expanded);
        let tags = TagStore::from_parts(self.tags, self.file_tags);
        (tree, tags)
    }
}

/// Location of the state document.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state; a missing file is a fresh install.
    pub fn load(&self) -> Result<AppState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no state file, starting fresh");
                return Ok(AppState::default());
            }
            Err(e) => return Err(e.into()),
        };
        let state: AppState = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            items = state.managed_items.len(),
            tags = state.tags.len(),
            "state loaded"
        );
        Ok(state)
    }

    /// Write the state through a temp file and rename it into place.
    pub fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
