//! Upload storage on the local filesystem
//!
//! Files live at `<root>/<project_id>/<sanitized filename>`. Uploading a file
//! with the same name into the same project overwrites it.

use crate::StoreError;
use gym_domain::ValidationError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reduce an uploaded filename to a safe single path component
///
/// Path separators and whitespace become `_`; anything outside
/// `[A-Za-z0-9._-]` is dropped; leading and trailing dots/underscores are
/// stripped. Returns `None` when nothing usable remains.
///
/// # Examples
///
/// ```
/// use gym_store::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("etc_passwd"));
/// assert_eq!(sanitize_filename("my notes.pdf").as_deref(), Some("my_notes.pdf"));
/// ```
pub fn sanitize_filename(name: &str) -> Option<String> {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Filesystem store for uploaded documents
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root` (created lazily on first save)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of all uploads
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save `bytes` for `project_id` under a sanitized version of `filename`
    ///
    /// Returns the stored filename and the full path.
    pub fn save(
        &self,
        project_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(String, PathBuf), StoreError> {
        let project_dir = sanitize_filename(project_id)
            .ok_or_else(|| ValidationError::new("project_id", "not usable as a directory name"))?;
        let stored_name = sanitize_filename(filename)
            .ok_or_else(|| ValidationError::new("filename", "no usable characters"))?;

        let dir = self.root.join(project_dir);
        fs::create_dir_all(&dir)?;
        let path = dir.join(&stored_name);
        fs::write(&path, bytes)?;
        debug!("Saved upload {} ({} bytes)", path.display(), bytes.len());
        Ok((stored_name, path))
    }

    /// Read a stored file back
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StoreError> {
        Ok(fs::read(path)?)
    }

    /// Remove a stored file; a file that is already gone is not an error
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
