use crate::error::{BatchError, FileRefError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Capability onto a file whose identity is owned elsewhere (a file cache, a
/// UI model). The engine only asks where the file currently is and tells it
/// where it went.
pub trait FileRef: Send + Sync {
    /// Absolute path the file currently lives at
    fn current_path(&self) -> PathBuf;

    /// Called after every successful rename step that moved this file,
    /// including the temporary detour of a cycle.
    fn commit_rename(&self, new_path: &Path) -> Result<(), FileRefError>;
}

/// A shared, mutable path cell. Clones observe each other's renames.
#[derive(Clone, Default)]
pub struct PathRef {
    path: Arc<RwLock<PathBuf>>,
}

impl PathRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(RwLock::new(path.into())),
        }
    }
}

impl fmt::Debug for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathRef").field(&self.current_path()).finish()
    }
}

impl FileRef for PathRef {
    fn current_path(&self) -> PathBuf {
        match self.path.read() {
            Ok(path) => path.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn commit_rename(&self, new_path: &Path) -> Result<(), FileRefError> {
        let mut guard = self.path.write().map_err(|_| FileRefError {
            path: new_path.to_path_buf(),
            reason: "path cell poisoned".to_string(),
        })?;
        *guard = new_path.to_path_buf();
        Ok(())
    }
}

/// One file and the leaf name it should end up with.
#[derive(Clone)]
pub struct RenameRequest {
    pub file_ref: Arc<dyn FileRef>,
    pub directory: PathBuf,
    pub current_name: String,
    pub target_name: String,
}

impl RenameRequest {
    /// Resolve directory and current name from the file handle.
    ///
    /// Fails with [`BatchError::InvalidName`] when the handle points at a path
    /// without a UTF-8 leaf name (for example `/` or `..`). The request index is
    /// not known yet at this point and is reported as `usize::MAX`.
    pub fn new(file_ref: Arc<dyn FileRef>, target_name: impl Into<String>) -> Result<Self, BatchError> {
        let path = file_ref.current_path();
        let current_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| BatchError::InvalidName {
                request: usize::MAX,
                name: path.display().to_string(),
                reason: "source has no UTF-8 file name",
            })?
            .to_string();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        Ok(Self {
            file_ref,
            directory,
            current_name,
            target_name: target_name.into(),
        })
    }

    /// Convenience for callers that only have a path
    pub fn for_path(path: impl Into<PathBuf>, target_name: impl Into<String>) -> Result<Self, BatchError> {
        Self::new(Arc::new(PathRef::new(path)), target_name)
    }

    pub fn current_path(&self) -> PathBuf {
        self.directory.join(&self.current_name)
    }

    pub fn target_path(&self) -> PathBuf {
        self.directory.join(&self.target_name)
    }

    pub fn is_noop(&self) -> bool {
        self.current_name == self.target_name
    }
}

impl fmt::Debug for RenameRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenameRequest")
            .field("directory", &self.directory)
            .field("current_name", &self.current_name)
            .field("target_name", &self.target_name)
            .finish_non_exhaustive()
    }
}
