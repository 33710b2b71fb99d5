//! Path resolution for user-typed paths: `~` expansion and separator cleanup.
//!
//! Everything here is a pure string transformation. Nothing touches the
//! filesystem, so a resolved path may well not exist.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Expand a leading `~/` (or `~\`) to `home`.
///
/// Anything else is returned unchanged, including a bare `~` and `~user/...`.
pub fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return home.join(rest);
    }
    PathBuf::from(raw)
}

/// Normalize path separators for the current platform.
///
/// On Windows forward slashes become backslashes. Elsewhere a path written
/// with backslashes only (pasted from Windows) is converted to slashes; a
/// path that already contains `/` is left alone since `\` is a legal file
/// name character there.
pub fn normalize_separators(raw: &str) -> String {
    if MAIN_SEPARATOR == '\\' {
        raw.replace('/', "\\")
    } else if raw.contains('\\') && !raw.contains('/') {
        raw.replace('\\', "/")
    } else {
        raw.to_string()
    }
}

/// Resolve a user-typed path: trim, normalize separators, expand `~`.
pub fn resolve(raw: &str, home: &Path) -> PathBuf {
    let trimmed = raw.trim();
    let normalized = normalize_separators(trimmed);
    expand_tilde(&normalized, home)
}

/// Render a path for display, collapsing the home prefix back to `~`.
pub fn display_path(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~{}{}", MAIN_SEPARATOR, rest.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Last path component as a display name, falling back to the whole path.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// The user's home directory, or `.` when it cannot be determined.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        PathBuf::from("/home/tester")
    }

    #[test]
    fn tilde_slash_expands_to_home() {
        assert_eq!(
            expand_tilde("~/.zshrc", &home()),
            PathBuf::from("/home/tester/.zshrc")
        );
    }

    #[test]
    fn only_tilde_slash_is_expanded() {
        assert_eq!(expand_tilde("~", &home()), PathBuf::from("~"));
        assert_eq!(expand_tilde("~user/.zshrc", &home()), PathBuf::from("~user/.zshrc"));
    }

    #[test]
    fn path_without_tilde_is_unchanged() {
        assert_eq!(
            expand_tilde("/etc/hosts", &home()),
            PathBuf::from("/etc/hosts")
        );
        assert_eq!(
            expand_tilde("relative/file", &home()),
            PathBuf::from("relative/file")
        );
    }

    #[test]
    fn tilde_user_is_not_expanded() {
        assert_eq!(
            expand_tilde("~other/.bashrc", &home()),
            PathBuf::from("~other/.bashrc")
        );
    }

    #[test]
    fn tilde_in_middle_is_not_expanded() {
        assert_eq!(
            expand_tilde("/tmp/~/x", &home()),
            PathBuf::from("/tmp/~/x")
        );
    }

    #[cfg(unix)]
    #[test]
    fn backslash_only_path_is_converted_on_unix() {
        assert_eq!(normalize_separators("dir\\sub\\file"), "dir/sub/file");
        assert_eq!(normalize_separators("dir/we\\ird"), "dir/we\\ird");
    }

    #[test]
    fn resolve_trims_and_expands() {
        assert_eq!(
            resolve("  ~/.ssh/config \n", &home()),
            PathBuf::from("/home/tester/.ssh/config")
        );
    }

    #[cfg(unix)]
    #[test]
    fn display_path_collapses_home() {
        assert_eq!(
            display_path(Path::new("/home/tester/.gitconfig"), &home()),
            "~/.gitconfig"
        );
        assert_eq!(display_path(&home(), &home()), "~");
        assert_eq!(display_path(Path::new("/etc/hosts"), &home()), "/etc/hosts");
    }

    #[test]
    fn file_name_of_uses_last_component() {
        assert_eq!(file_name_of(Path::new("/a/b/settings.json")), "settings.json");
        assert_eq!(file_name_of(Path::new("/")), "/");
    }
}
