use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The path is already part of the managed set.
    #[error("Already managed: {}", .0.display())]
    AlreadyManaged(PathBuf),

    /// A managed item was addressed that is not in the tree.
    #[error("Not managed: {}", .0.display())]
    NotFound(PathBuf),

    /// Tag creation with an unusable name or an unknown tag id.
    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    /// The persisted state file could not be decoded or encoded.
    #[error("State file error: {0}")]
    State(String),

    /// A directory scan failed, timed out, or its worker died.
    #[error("Scan failed: {0}")]
    Scan(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::State(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn already_managed_display_includes_path() {
        let err = AppError::AlreadyManaged(PathBuf::from("/home/user/.zshrc"));
        assert_eq!(err.to_string(), "Already managed: /home/user/.zshrc");
    }

    #[test]
    fn json_error_maps_to_state() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: AppError = json_err.into();
        assert!(matches!(err, AppError::State(_)));
    }
}
