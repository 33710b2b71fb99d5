//! User configuration, read from TOML layers.
//!
//! Layers are applied lowest priority first, each one only overriding the
//! keys it sets:
//! 1. built-in defaults
//! 2. `<config_dir>/cfm/config.toml`
//! 3. `.cfm.toml` in the working directory
//! 4. the file named by `$CFM_CONFIG`
//! 5. `--config <path>`
//! 6. command-line flags

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fs::filter::ScanMode;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    pub mouse: Option<bool>,
    /// List standalone files that are not on disk.
    pub show_missing: Option<bool>,
    /// Offer the first-run template picker when nothing is managed yet.
    pub onboarding: Option<bool>,
    /// Location of the persisted managed set, tags and UI state.
    pub state_file: Option<String>,
}

/// `[scan]`: folder listing and the recursive import.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    pub max_depth: Option<usize>,
    /// `"exclude_binary"` or `"config_only"`.
    pub mode: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TreeConfig {
    pub dirs_first: Option<bool>,
    /// Nerd font glyphs; ASCII markers otherwise.
    pub use_icons: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
    pub tab_width: Option<usize>,
    /// A syntect theme name.
    pub syntax_theme: Option<String>,
    pub confirm_discard: Option<bool>,
}

/// Hex (`"#rrggbb"`) or named colors for `scheme = "custom"`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_bg: Option<String>,
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_folder_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub tree_missing_fg: Option<String>,
    pub editor_bg: Option<String>,
    pub editor_fg: Option<String>,
    pub editor_line_nr_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_bg: Option<String>,
    pub dialog_border_fg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// `"dark"`, `"light"` or `"custom"`.
    pub scheme: Option<String>,
    pub custom: Option<ThemeColorsConfig>,
}

/// Every key is optional; a missing key falls through to the layer below
/// and finally to the getter's default.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub scan: ScanConfig,
    pub tree: TreeConfig,
    pub editor: EditorConfig,
    pub theme: ThemeConfig,
}

pub const DEFAULT_SCAN_DEPTH: usize = 2;
pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_TAB_WIDTH: usize = 4;
const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";

/// Apply a higher-priority layer on top of `self`.
trait Layer {
    fn layer(&mut self, top: &Self);
}

fn set<T: Clone>(slot: &mut Option<T>, top: &Option<T>) {
    if let Some(v) = top {
        *slot = Some(v.clone());
    }
}

impl Layer for GeneralConfig {
    fn layer(&mut self, top: &Self) {
        set(&mut self.mouse, &top.mouse);
        set(&mut self.show_missing, &top.show_missing);
        set(&mut self.onboarding, &top.onboarding);
        set(&mut self.state_file, &top.state_file);
    }
}

impl Layer for ScanConfig {
    fn layer(&mut self, top: &Self) {
        set(&mut self.max_depth, &top.max_depth);
        set(&mut self.mode, &top.mode);
        set(&mut self.timeout_ms, &top.timeout_ms);
    }
}

impl Layer for TreeConfig {
    fn layer(&mut self, top: &Self) {
        set(&mut self.dirs_first, &top.dirs_first);
        set(&mut self.use_icons, &top.use_icons);
    }
}

impl Layer for EditorConfig {
    fn layer(&mut self, top: &Self) {
        set(&mut self.tab_width, &top.tab_width);
        set(&mut self.syntax_theme, &top.syntax_theme);
        set(&mut self.confirm_discard, &top.confirm_discard);
    }
}

impl Layer for ThemeConfig {
    fn layer(&mut self, top: &Self) {
        set(&mut self.scheme, &top.scheme);
        // A custom palette is replaced as a whole.
        set(&mut self.custom, &top.custom);
    }
}

impl Layer for AppConfig {
    fn layer(&mut self, top: &Self) {
        self.general.layer(&top.general);
        self.scan.layer(&top.scan);
        self.tree.layer(&top.tree);
        self.editor.layer(&top.editor);
        self.theme.layer(&top.theme);
    }
}

/// Config files to read, lowest priority first.
fn sources(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = dirs::config_dir()
        .map(|dir| dir.join("cfm").join("config.toml"))
        .into_iter()
        .collect();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".cfm.toml"));
    }
    if let Some(env_path) = std::env::var_os("CFM_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }
    paths.extend(explicit.map(Path::to_path_buf));
    paths
}

/// Parse one layer. An absent file is silently skipped; an unreadable or
/// malformed one is logged and skipped.
fn read_layer(path: &Path) -> Option<AppConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
            return None;
        }
    };
    toml::from_str(&text)
        .inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
        })
        .ok()
}

impl AppConfig {
    /// `self` with every key set in `top` replaced.
    pub fn merge(mut self, top: &AppConfig) -> AppConfig {
        self.layer(top);
        self
    }

    /// Read every config layer, then apply `overrides` from the command line.
    pub fn load(explicit: Option<&Path>, overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = sources(explicit)
            .iter()
            .filter_map(|path| read_layer(path))
            .fold(AppConfig::default(), |acc, file| acc.merge(&file));
        if let Some(cli) = overrides {
            config.layer(cli);
        }
        tracing::debug!(?config, "configuration loaded");
        config
    }

    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn show_missing(&self) -> bool {
        self.general.show_missing.unwrap_or(false)
    }

    pub fn onboarding_enabled(&self) -> bool {
        self.general.onboarding.unwrap_or(true)
    }

    /// Defaults to `<data_dir>/cfm/state.json`; `~` is expanded.
    pub fn state_file(&self) -> PathBuf {
        match &self.general.state_file {
            Some(p) => crate::fs::paths::resolve(p, &crate::fs::paths::home_dir()),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cfm")
                .join("state.json"),
        }
    }

    pub fn scan_max_depth(&self) -> usize {
        self.scan.max_depth.unwrap_or(DEFAULT_SCAN_DEPTH)
    }

    pub fn scan_mode(&self) -> ScanMode {
        self.scan
            .mode
            .as_deref()
            .map(ScanMode::from_config)
            .unwrap_or_default()
    }

    pub fn scan_timeout_ms(&self) -> u64 {
        self.scan.timeout_ms.unwrap_or(DEFAULT_SCAN_TIMEOUT_MS)
    }

    pub fn dirs_first(&self) -> bool {
        self.tree.dirs_first.unwrap_or(true)
    }

    pub fn use_icons(&self) -> bool {
        self.tree.use_icons.unwrap_or(true)
    }

    /// Never zero.
    pub fn tab_width(&self) -> usize {
        self.editor.tab_width.unwrap_or(DEFAULT_TAB_WIDTH).max(1)
    }

    pub fn syntax_theme_name(&self) -> &str {
        self.editor
            .syntax_theme
            .as_deref()
            .unwrap_or(DEFAULT_SYNTAX_THEME)
    }

    pub fn confirm_discard(&self) -> bool {
        self.editor.confirm_discard.unwrap_or(true)
    }

    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}
