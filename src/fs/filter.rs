//! Fixed pattern tables deciding which directory entries are worth showing.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Directory names never descended into or listed.
pub const SKIPPED_DIRS: &[&str] = &["node_modules", ".git"];

/// Binary and OS-artifact file patterns excluded from every scan.
static BINARY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\.(exe|dll|so|dylib|dmg|pkg|deb|rpm)$",
        r"(?i)\.(zip|tar|gz|bz2|7z|rar|xz)$",
        r"(?i)\.(jpg|jpeg|png|gif|bmp|ico|svg|webp)$",
        r"(?i)\.(mp3|mp4|avi|mov|wmv|flv|wav|flac)$",
        r"(?i)\.(pdf|doc|docx|xls|xlsx|ppt|pptx)$",
        r"(?i)\.(ttf|otf|woff|woff2|eot)$",
        r"(?i)\.(bin|dat|db|sqlite)$",
        r"\.DS_Store$",
        r"^Thumbs\.db$",
    ])
});

/// Positive patterns for the config-only scan mode.
static CONFIG_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\.(json|jsonc|json5|yaml|yml|toml|ini|conf|config|cfg|xml|properties|env|plist|editorconfig)$",
        r"^\.[^.]",
        r"rc$",
        r"profile$",
        r"^(Dockerfile|Makefile|hosts|config)$",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!(pattern = p, error = %e, "invalid built-in pattern");
                None
            }
        })
        .collect()
}

/// Whether a file name matches one of the binary-exclusion patterns.
pub fn is_binary(name: &str) -> bool {
    BINARY_PATTERNS.iter().any(|re| re.is_match(name))
}

/// Whether a file name looks like a configuration file.
pub fn is_config_file(name: &str) -> bool {
    CONFIG_PATTERNS.iter().any(|re| re.is_match(name))
}

/// Whether a directory is excluded from listings.
pub fn is_skipped_dir(name: &str) -> bool {
    SKIPPED_DIRS.contains(&name)
}

/// File selection policy for recursive scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Keep everything that is not a known binary format.
    #[default]
    ExcludeBinary,
    /// Keep only names matching the config-file table (and not binary).
    ConfigOnly,
}

impl ScanMode {
    /// Parse from a config string, defaulting to `ExcludeBinary`.
    pub fn from_config(s: &str) -> Self {
        match s {
            "config_only" => ScanMode::ConfigOnly,
            _ => ScanMode::ExcludeBinary,
        }
    }

    /// Whether a file with this name is collected.
    pub fn accepts(&self, name: &str) -> bool {
        if is_binary(name) {
            return false;
        }
        match self {
            ScanMode::ExcludeBinary => true,
            ScanMode::ConfigOnly => is_config_file(name),
        }
    }
}
