//! Filesystem boundary used by the controller.
//!
//! Everything that touches the disk or spawns a process goes through
//! [`Backend`], so the controller can be driven by a test double.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread::JoinHandle;

use crate::error::Result;
use crate::fs::filter::ScanMode;
use crate::fs::paths;
use crate::fs::scanner::{self, ScannedFile};
use crate::fs::templates::{self, ConfigTemplate, Platform};
use crate::fs::tree::FileSystemItem;

/// Result of probing a user-supplied path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathProbe {
    pub actual_path: PathBuf,
    pub exists: bool,
    pub is_file: bool,
    pub is_directory: bool,
}

pub trait Backend: Send + Sync {
    fn platform_id(&self) -> Platform;

    /// Directory that `~` expands to.
    fn home(&self) -> &Path;

    fn list_templates(&self) -> Vec<ConfigTemplate>;

    fn check_existence(&self, path: &Path) -> bool;

    fn check_many_existence(&self, paths: &[PathBuf]) -> HashMap<PathBuf, bool> {
        paths
            .iter()
            .map(|p| (p.clone(), self.check_existence(p)))
            .collect()
    }

    fn read_text(&self, path: &Path) -> Result<String>;

    /// Write `content`, creating the file and its parent directories if needed.
    fn write_text(&self, path: &Path, content: &str) -> Result<()>;

    /// Expand `~`, normalize separators and stat the result.
    fn resolve_and_probe(&self, raw: &str) -> PathProbe;

    fn list_children(&self, dir: &Path, dirs_first: bool) -> Result<Vec<FileSystemItem>>;

    fn scan_config_files(&self, dir: &Path, max_depth: usize, mode: ScanMode) -> Result<Vec<ScannedFile>>;

    /// Show the item in the platform file manager.
    fn reveal_in_file_manager(&self, path: &Path) -> Result<()>;
}

/// The real, disk-backed implementation.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    home: PathBuf,
    platform: Platform,
}

impl LocalBackend {
    pub fn new(home: PathBuf) -> Self {
        Self {
            home,
            platform: Platform::current(),
        }
    }
}

impl Backend for LocalBackend {
    fn platform_id(&self) -> Platform {
        self.platform
    }

    fn home(&self) -> &Path {
        &self.home
    }

    fn list_templates(&self) -> Vec<ConfigTemplate> {
        templates::templates_for(self.platform, &self.home)
    }

    fn check_existence(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        tracing::info!(path = %path.display(), bytes = content.len(), "saved file");
        Ok(())
    }

    fn resolve_and_probe(&self, raw: &str) -> PathProbe {
        let actual_path = paths::resolve(raw, &self.home);
        match fs::metadata(&actual_path) {
            Ok(meta) => PathProbe {
                actual_path,
                exists: true,
                is_file: meta.is_file(),
                is_directory: meta.is_dir(),
            },
            Err(_) => PathProbe {
                actual_path,
                exists: false,
                is_file: false,
                is_directory: false,
            },
        }
    }

    fn list_children(&self, dir: &Path, dirs_first: bool) -> Result<Vec<FileSystemItem>> {
        scanner::list_children(dir, dirs_first)
    }

    fn scan_config_files(&self, dir: &Path, max_depth: usize, mode: ScanMode) -> Result<Vec<ScannedFile>> {
        scanner::scan_for_config_files(dir, max_depth, mode)
    }

    fn reveal_in_file_manager(&self, path: &Path) -> Result<()> {
        spawn_reaped(reveal_command(self.platform, path))?;
        Ok(())
    }
}

fn reveal_command(platform: Platform, path: &Path) -> Command {
    match platform {
        Platform::MacOs => {
            let mut c = Command::new("open");
            c.arg("-R").arg(path);
            c
        }
        Platform::Windows => {
            let mut c = Command::new("explorer");
            c.arg(format!("/select,{}", path.display()));
            c
        }
        Platform::Linux => {
            let mut c = Command::new("xdg-open");
            c.arg(path.parent().unwrap_or(path));
            c
        }
    }
}

/// Start `cmd` and wait for it on a helper thread so it never lingers as a
/// zombie. Spawn failures are returned; the exit status is only logged.
fn spawn_reaped(mut cmd: Command) -> Result<JoinHandle<()>> {
    let mut child = cmd.spawn()?;
    let program = cmd.get_program().to_string_lossy().into_owned();
    Ok(std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => {
            tracing::warn!(%program, %status, "file manager exited with failure");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(%program, error = %e, "failed to wait on file manager"),
    }))
}

#[cfg(test)]
pub mod tests_support {
    //! In-memory backend for controller tests.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::error::AppError;

    #[derive(Default)]
    pub struct MockBackend {
        pub files: Mutex<HashMap<PathBuf, String>>,
        pub dirs: Mutex<HashMap<PathBuf, Vec<FileSystemItem>>>,
        pub scan_calls: AtomicUsize,
        pub fail_writes: bool,
    }

    impl MockBackend {
        pub fn with_file(self, path: &str, content: &str) -> Self {
            if let Ok(mut files) = self.files.lock() {
                files.insert(PathBuf::from(path), content.to_string());
            }
            self
        }

        pub fn with_dir(self, path: &str, children: Vec<FileSystemItem>) -> Self {
            if let Ok(mut dirs) = self.dirs.lock() {
                dirs.insert(PathBuf::from(path), children);
            }
            self
        }

        pub fn scans(&self) -> usize {
            self.scan_calls.load(Ordering::SeqCst)
        }

        pub fn content(&self, path: &str) -> Option<String> {
            self.files.lock().ok()?.get(Path::new(path)).cloned()
        }
    }

    impl Backend for MockBackend {
        fn platform_id(&self) -> Platform {
            Platform::Linux
        }

        fn home(&self) -> &Path {
            Path::new("/home/mock")
        }

        fn list_templates(&self) -> Vec<ConfigTemplate> {
            templates::templates_for(Platform::Linux, Path::new("/home/mock"))
        }

        fn check_existence(&self, path: &Path) -> bool {
            self.files.lock().map(|f| f.contains_key(path)).unwrap_or(false)
                || self.dirs.lock().map(|d| d.contains_key(path)).unwrap_or(false)
        }

        fn read_text(&self, path: &Path) -> Result<String> {
            self.files
                .lock()
                .ok()
                .and_then(|f| f.get(path).cloned())
                .ok_or_else(|| AppError::NotFound(path.to_path_buf()))
        }

        fn write_text(&self, path: &Path, content: &str) -> Result<()> {
            if self.fail_writes {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            if let Ok(mut files) = self.files.lock() {
                files.insert(path.to_path_buf(), content.to_string());
            }
            Ok(())
        }

        fn resolve_and_probe(&self, raw: &str) -> PathProbe {
            let actual_path = paths::resolve(raw, Path::new("/home/mock"));
            let is_file = self.files.lock().map(|f| f.contains_key(&actual_path)).unwrap_or(false);
            let is_directory = self.dirs.lock().map(|d| d.contains_key(&actual_path)).unwrap_or(false);
            PathProbe {
                actual_path,
                exists: is_file || is_directory,
                is_file,
                is_directory,
            }
        }

        fn list_children(&self, dir: &Path, _dirs_first: bool) -> Result<Vec<FileSystemItem>> {
            self.scan_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .dirs
                .lock()
                .ok()
                .and_then(|d| d.get(dir).cloned())
                .unwrap_or_default())
        }

        fn scan_config_files(&self, dir: &Path, _max_depth: usize, _mode: ScanMode) -> Result<Vec<ScannedFile>> {
            let files = self.files.lock().map(|f| {
                f.keys()
                    .filter(|p| p.starts_with(dir))
                    .map(|p| ScannedFile {
                        name: paths::file_name_of(p),
                        path: p.clone(),
                        exists: true,
                    })
                    .collect::<Vec<_>>()
            });
            let mut files = files.unwrap_or_default();
            files.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(files)
        }

        fn reveal_in_file_manager(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }
}
