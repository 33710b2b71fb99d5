//! Well-known configuration files offered for quick-add and onboarding.

use std::path::{Path, PathBuf};

/// Host operating system, used to pick per-OS template paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Platform::MacOs => "darwin",
            Platform::Windows => "win32",
            Platform::Linux => "linux",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateCategory {
    Shell,
    Dev,
    System,
    Editor,
}

impl TemplateCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TemplateCategory::Shell => "Shell",
            TemplateCategory::Dev => "Dev",
            TemplateCategory::System => "System",
            TemplateCategory::Editor => "Editor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTemplate {
    pub name: &'static str,
    pub path: PathBuf,
    pub description: &'static str,
    pub category: TemplateCategory,
}

fn vscode_settings(platform: Platform, home: &Path) -> PathBuf {
    let user_dir = match platform {
        Platform::MacOs => home.join("Library").join("Application Support"),
        Platform::Windows => home.join("AppData").join("Roaming"),
        Platform::Linux => home.join(".config"),
    };
    user_dir.join("Code").join("User").join("settings.json")
}

fn hosts_file(platform: Platform) -> PathBuf {
    match platform {
        Platform::Windows => PathBuf::from(r"C:\Windows\System32\drivers\etc\hosts"),
        _ => PathBuf::from("/etc/hosts"),
    }
}

/// Templates for `platform`, with paths rooted at `home`.
pub fn templates_for(platform: Platform, home: &Path) -> Vec<ConfigTemplate> {
    use TemplateCategory::*;

    let t = |name: &'static str,
             path: PathBuf,
             description: &'static str,
             category: TemplateCategory| ConfigTemplate {
        name,
        path,
        description,
        category,
    };

    vec![
        t(".zshrc", home.join(".zshrc"), "Zsh shell configuration", Shell),
        t(".bashrc", home.join(".bashrc"), "Bash shell configuration", Shell),
        t(".bash_profile", home.join(".bash_profile"), "Bash profile settings", Shell),
        t(".gitconfig", home.join(".gitconfig"), "Git global configuration", Dev),
        t(".npmrc", home.join(".npmrc"), "NPM configuration file", Dev),
        t(
            ".ssh/config",
            home.join(".ssh").join("config"),
            "SSH client configuration",
            Dev,
        ),
        t("hosts", hosts_file(platform), "System hosts file", System),
        t(
            ".tmux.conf",
            home.join(".tmux.conf"),
            "Tmux terminal multiplexer configuration",
            System,
        ),
        t(
            "VS Code Settings",
            vscode_settings(platform, home),
            "Visual Studio Code settings",
            Editor,
        ),
        t(".vimrc", home.join(".vimrc"), "Vim editor configuration", Editor),
        t(
            ".editorconfig",
            home.join(".editorconfig"),
            "Cross-editor coding style",
            Editor,
        ),
    ]
}
