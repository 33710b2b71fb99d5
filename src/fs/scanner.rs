//! Directory listing and recursive config discovery.
//!
//! Both functions are blocking and meant to run on `spawn_blocking`.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::fs::filter::{is_binary, is_skipped_dir, ScanMode};
use crate::fs::paths::file_name_of;
use crate::fs::tree::{sort_items, FileSystemItem};

/// A file found by a recursive scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
}

/// List the immediate children of `dir`.
///
/// Entries whose metadata cannot be read (broken symlinks, permission
/// errors) are skipped, as are `SKIPPED_DIRS` and binary files. An
/// unreadable directory yields an empty list.
pub fn list_children(dir: &Path, dirs_first: bool) -> Result<Vec<FileSystemItem>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return Ok(Vec::new());
        }
    };

    let mut items = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let name = file_name_of(&path);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unprobeable entry");
                continue;
            }
        };

        if meta.is_dir() {
            if is_skipped_dir(&name) {
                continue;
            }
            items.push(FileSystemItem::folder(&path, true));
        } else {
            if is_binary(&name) {
                tracing::debug!(path = %path.display(), "excluding binary file");
                continue;
            }
            items.push(FileSystemItem::file(&path, true));
        }
    }

    sort_items(&mut items, dirs_first);
    Ok(items)
}

/// Recursively collect files under `dir` accepted by `mode`.
///
/// The root is depth 0 and its files sit at depth 1, so `max_depth = 0`
/// finds nothing. Hidden directories and `node_modules` are never entered;
/// unreadable entries and broken links are skipped.
pub fn scan_for_config_files(dir: &Path, max_depth: usize, mode: ScanMode) -> Result<Vec<ScannedFile>> {
    let mut found: Vec<ScannedFile> = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_pruned_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let path = e.into_path();
            let name = file_name_of(&path);
            mode.accepts(&name).then_some(ScannedFile {
                name,
                path,
                exists: true,
            })
        })
        .collect();
    found.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(dir = %dir.display(), count = found.len(), "config scan finished");
    Ok(found)
}

fn is_pruned_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Creates:
    ///   root/
    ///     .git/HEAD
    ///     node_modules/pkg.json
    ///     a.txt
    ///     b.exe
    ///     sub/
    ///       c.toml
    ///       deeper/
    ///         d.yaml
    fn setup_test_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/pkg.json"), "{}").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("b.exe"), "MZ").unwrap();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("sub/c.toml"), "x = 1").unwrap();
        fs::write(root.join("sub/deeper/d.yaml"), "k: v").unwrap();
        tmp
    }

    #[test]
    fn list_children_filters_and_sorts() {
        let tmp = setup_test_dir();
        let items = list_children(tmp.path(), true).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["sub", "a.txt"]);
        assert!(items.iter().all(|i| i.exists));
        assert!(items[0].is_folder());
        assert!(items[0].children().is_none());
    }

    #[test]
    fn list_children_unreadable_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let items = list_children(&tmp.path().join("does-not-exist"), true).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn list_children_empty_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(list_children(tmp.path(), true).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn list_children_skips_broken_symlink() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("real.conf"), "").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("nowhere"), tmp.path().join("dangling")).unwrap();
        let items = list_children(tmp.path(), true).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["real.conf"]);
    }

    #[test]
    fn scan_respects_max_depth() {
        let tmp = setup_test_dir();
        let shallow = scan_for_config_files(tmp.path(), 1, ScanMode::ExcludeBinary).unwrap();
        let names: Vec<&str> = shallow.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt"]);

        let deeper = scan_for_config_files(tmp.path(), 2, ScanMode::ExcludeBinary).unwrap();
        let names: Vec<&str> = deeper.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.toml"]);

        let all = scan_for_config_files(tmp.path(), 3, ScanMode::ExcludeBinary).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn scan_depth_zero_returns_nothing() {
        let tmp = setup_test_dir();
        assert!(scan_for_config_files(tmp.path(), 0, ScanMode::ExcludeBinary)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn scan_skips_hidden_and_node_modules() {
        let tmp = setup_test_dir();
        let all = scan_for_config_files(tmp.path(), 5, ScanMode::ExcludeBinary).unwrap();
        assert!(all.iter().all(|f| !f.path.to_string_lossy().contains(".git")));
        assert!(all.iter().all(|f| !f.path.to_string_lossy().contains("node_modules")));
    }

    #[cfg(unix)]
    #[test]
    fn scan_follows_links_and_skips_broken_ones() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("real.conf"), "").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real.conf"), tmp.path().join("linked.conf")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("nowhere"), tmp.path().join("dangling.conf")).unwrap();
        let found = scan_for_config_files(tmp.path(), 2, ScanMode::ExcludeBinary).unwrap();
        let names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["linked.conf", "real.conf"]);
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let found = scan_for_config_files(&tmp.path().join("gone"), 3, ScanMode::ExcludeBinary).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn config_only_mode_drops_plain_text() {
        let tmp = setup_test_dir();
        let found = scan_for_config_files(tmp.path(), 3, ScanMode::ConfigOnly).unwrap();
        let names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["c.toml", "d.yaml"]);
    }
}
