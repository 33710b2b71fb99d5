//! Tag registry and path-to-tags associations.
//!
//! Tags live independently of the managed tree and are addressed by path,
//! so a folder's children can be tagged before or after they are scanned.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Tag identifier (epoch milliseconds rendered as a string).
pub type TagId = String;

/// Palette offered when creating a tag.
pub const TAG_COLORS: &[&str] = &[
    "#3b82f6", // blue
    "#10b981", // emerald
    "#f59e0b", // amber
    "#ef4444", // red
    "#8b5cf6", // violet
    "#06b6d4", // cyan
    "#84cc16", // lime
    "#f97316", // orange
];

/// Pick a palette color by index, wrapping around.
pub fn next_color(n: usize) -> &'static str {
    TAG_COLORS[n % TAG_COLORS.len()]
}

/// A user-defined label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

/// Global tag registry plus the path → tag list mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagStore {
    tags: Vec<TagRecord>,
    assignments: BTreeMap<PathBuf, Vec<TagId>>,
}

impl TagStore {
    /// Rebuild a store from persisted parts.
    pub fn from_parts(tags: Vec<TagRecord>, assignments: BTreeMap<PathBuf, Vec<TagId>>) -> Self {
        Self { tags, assignments }
    }

    /// All registered tags in creation order.
    pub fn tags(&self) -> &[TagRecord] {
        &self.tags
    }

    /// The full path → tags mapping.
    pub fn assignments(&self) -> &BTreeMap<PathBuf, Vec<TagId>> {
        &self.assignments
    }

    pub fn get(&self, id: &str) -> Option<&TagRecord> {
        self.tags.iter().find(|t| t.id == id)
    }

    /// Register a new tag and return its id.
    ///
    /// Ids are the current epoch milliseconds, bumped past the newest
    /// existing id so two tags created in the same millisecond never clash.
    pub fn create_tag(&mut self, name: &str, color: &str) -> Result<TagId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidTag("tag name is empty".into()));
        }

        let now = chrono::Utc::now().timestamp_millis();
        let newest = self
            .tags
            .iter()
            .filter_map(|t| t.id.parse::<i64>().ok())
            .max()
            .unwrap_or(i64::MIN);
        let id = if now > newest { now } else { newest + 1 }.to_string();

        self.tags.push(TagRecord {
            id: id.clone(),
            name: name.to_string(),
            color: color.to_string(),
        });
        tracing::info!(tag = %id, name, "created tag");
        Ok(id)
    }

    /// Remove a tag from the registry and from every path's list.
    ///
    /// Returns `false` if the id was unknown.
    pub fn delete_tag(&mut self, id: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.id != id);
        if self.tags.len() == before {
            return false;
        }
        for list in self.assignments.values_mut() {
            list.retain(|t| t != id);
        }
        self.assignments.retain(|_, list| !list.is_empty());
        tracing::info!(tag = %id, "deleted tag");
        true
    }

    /// Replace the full tag list for a path.
    pub fn set_tags(&mut self, path: &Path, tags: Vec<TagId>) {
        if tags.is_empty() {
            self.assignments.remove(path);
        } else {
            self.assignments.insert(path.to_path_buf(), tags);
        }
    }

    /// Add the tag at the end of the path's list, or remove it if present.
    pub fn toggle_tag(&mut self, path: &Path, id: &str) {
        let mut current = self.tags_for(path).to_vec();
        if let Some(pos) = current.iter().position(|t| t == id) {
            current.remove(pos);
        } else {
            current.push(id.to_string());
        }
        self.set_tags(path, current);
    }

    /// Tags attached to a path, in insertion order.
    pub fn tags_for(&self, path: &Path) -> &[TagId] {
        self.assignments
            .get(path)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn remove_associations_for_path(&mut self, path: &Path) {
        self.assignments.remove(path);
    }

    /// Drop the associations of every given path (a removed subtree).
    pub fn remove_associations_for_paths<'a, I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        for path in paths {
            self.remove_associations_for_path(path);
        }
    }

    /// Drop the associations of `root` and everything below it, whether or
    /// not those paths are loaded in the tree. Paths for which `keep`
    /// returns true survive.
    pub fn remove_associations_under(&mut self, root: &Path, keep: impl Fn(&Path) -> bool) {
        self.assignments.retain(|p, _| !p.starts_with(root) || keep(p));
    }

    /// OR-semantics filter: an empty selection matches everything.
    pub fn matches(&self, path: &Path, selected: &[TagId]) -> bool {
        tags_intersect(self.tags_for(path), selected)
    }
}

/// Whether `tags` matches a filter selection (any overlap, or no selection).
pub fn tags_intersect(tags: &[TagId], selected: &[TagId]) -> bool {
    selected.is_empty() || selected.iter().any(|s| tags.contains(s))
}
