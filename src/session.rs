//! The file currently open in the editor and its dirty state.

use std::path::{Path, PathBuf};

use crate::editor::TextBuffer;
use crate::error::Result;
use crate::fs::backend::Backend;
use crate::fs::paths::file_name_of;
use crate::syntax::language_for_path;

/// Identity of the open file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
}

impl OpenFile {
    pub fn new(path: &Path, exists: bool) -> Self {
        Self {
            name: file_name_of(path),
            path: path.to_path_buf(),
            exists,
        }
    }
}

/// Editor session: at most one open file, its last saved text, and the
/// live buffer.
#[derive(Debug, Default)]
pub struct EditorSession {
    pub current: Option<OpenFile>,
    loaded: String,
    pub buffer: TextBuffer,
    pub language: &'static str,
    tab_width: usize,
}

impl EditorSession {
    pub fn new(tab_width: usize) -> Self {
        Self {
            current: None,
            loaded: String::new(),
            buffer: TextBuffer::new("", tab_width),
            language: "plaintext",
            tab_width,
        }
    }

    /// Open a file with its content.
    pub fn open(&mut self, file: OpenFile, content: &str) {
        self.buffer = TextBuffer::new(content, self.tab_width);
        // Baseline is the re-joined text, so mixed line endings do not
        // count as an edit.
        self.loaded = self.buffer.text();
        self.language = language_for_path(&file.path);
        tracing::debug!(path = %file.path.display(), language = self.language, "opened file");
        self.current = Some(file);
    }

    /// Open a file that does not exist yet: empty content, created on save.
    pub fn open_missing(&mut self, file: OpenFile) {
        self.open(file, "");
    }

    pub fn close(&mut self) {
        self.current = None;
        self.loaded.clear();
        self.buffer = TextBuffer::new("", self.tab_width);
        self.language = "plaintext";
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_open_path(&self, path: &Path) -> bool {
        self.current.as_ref().is_some_and(|f| f.path == path)
    }

    pub fn is_dirty(&self) -> bool {
        self.current.is_some() && self.buffer.text() != self.loaded
    }

    pub fn can_save(&self) -> bool {
        self.is_dirty()
    }

    /// Write the buffer through `backend`.
    ///
    /// On success the buffer becomes the new baseline and the file is marked
    /// as existing; on failure nothing changes. Returns the saved path, or
    /// `None` when there was nothing to save.
    pub fn save(&mut self, backend: &dyn Backend) -> Result<Option<PathBuf>> {
        if !self.can_save() {
            return Ok(None);
        }
        let Some(file) = self.current.as_mut() else {
            return Ok(None);
        };
        let text = self.buffer.text();
        backend.write_text(&file.path, &text)?;
        self.loaded = text;
        file.exists = true;
        Ok(Some(file.path.clone()))
    }
}
