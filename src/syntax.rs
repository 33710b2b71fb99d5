//! Language detection for config files and syntect lookup.

use std::path::Path;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::fs::paths::file_name_of;

/// Editor language id for a path, by file name first, then extension.
///
/// Dotfiles are keyed by the part after the last dot, so `.zshrc` maps via
/// `zshrc`; a name without any dot is looked up whole.
pub fn language_for_path(path: &Path) -> &'static str {
    let file_name = file_name_of(path).to_lowercase();

    if file_name == "hosts" {
        return "plaintext";
    }
    for (prefix, lang) in [
        (".zshrc", "shell"),
        (".bashrc", "shell"),
        (".bash_profile", "shell"),
        (".gitconfig", "ini"),
        (".npmrc", "ini"),
    ] {
        if file_name.starts_with(prefix) {
            return lang;
        }
    }
    if file_name == "dockerfile" || file_name.starts_with("dockerfile.") {
        return "dockerfile";
    }
    if file_name == "makefile" || file_name.starts_with("makefile.") {
        return "makefile";
    }

    let extension = file_name.rsplit('.').next().unwrap_or("");
    match extension {
        "zshrc" | "bashrc" | "bash_profile" | "profile" => "shell",
        "sh" | "bash" | "zsh" => "shell",
        "npmrc" | "gitconfig" | "editorconfig" => "ini",
        "ini" | "conf" | "cfg" => "ini",
        "yarnrc" | "yaml" | "yml" => "yaml",
        "json" => "json",
        "xml" => "xml",
        "toml" => "toml",
        "js" => "javascript",
        "ts" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "java" => "java",
        "cpp" | "h" | "hpp" => "cpp",
        "c" => "c",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "html" | "htm" => "html",
        "md" => "markdown",
        _ => "plaintext",
    }
}

/// Extension token syntect knows the language by.
fn syntect_token(language: &str) -> Option<&'static str> {
    Some(match language {
        "shell" => "sh",
        "ini" => "ini",
        "yaml" => "yaml",
        "json" => "json",
        "xml" => "xml",
        "toml" => "toml",
        "javascript" => "js",
        "typescript" => "ts",
        "python" => "py",
        "ruby" => "rb",
        "go" => "go",
        "rust" => "rs",
        "java" => "java",
        "cpp" => "cpp",
        "c" => "c",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "html" => "html",
        "markdown" => "md",
        "makefile" => "Makefile",
        _ => return None,
    })
}

/// Syntax for a language id; plain text when the bundled set lacks it.
pub fn syntax_for_language<'a>(ss: &'a SyntaxSet, language: &str) -> &'a SyntaxReference {
    syntect_token(language)
        .and_then(|token| ss.find_syntax_by_extension(token))
        .unwrap_or_else(|| ss.find_syntax_plain_text())
}

/// Load a theme from the built-in theme set by name, with fallback.
pub fn load_theme(theme_name: &str) -> Theme {
    let mut ts = ThemeSet::load_defaults();
    if let Some(theme) = ts.themes.remove(theme_name) {
        return theme;
    }
    tracing::warn!(theme = theme_name, "unknown syntax theme, using base16-ocean.dark");
    ts.themes.remove("base16-ocean.dark").unwrap_or_default()
}

/// Syntax definitions plus the active highlighting theme.
pub struct Highlighting {
    pub syntax_set: SyntaxSet,
    pub theme: Theme,
}

impl Highlighting {
    pub fn new(theme_name: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_nonewlines(),
            theme: load_theme(theme_name),
        }
    }
}
