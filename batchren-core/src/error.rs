use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Structural problems that reject a whole batch before any filesystem call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// Two or more requests want the same name in the same directory
    #[error("{} requests target {}", requests.len(), directory.join(name).display())]
    DuplicateTarget {
        directory: PathBuf,
        name: String,
        requests: Vec<usize>,
    },

    /// Two or more requests rename the same file
    #[error("{} requests rename {}", requests.len(), directory.join(name).display())]
    DuplicateSource {
        directory: PathBuf,
        name: String,
        requests: Vec<usize>,
    },

    /// A target name that cannot be a leaf name
    #[error("invalid target name {name:?} for request {request}: {reason}")]
    InvalidName {
        request: usize,
        name: String,
        reason: &'static str,
    },
}

impl BatchError {
    /// Indices of the requests that caused the rejection
    pub fn offending_requests(&self) -> Vec<usize> {
        match self {
            Self::DuplicateTarget { requests, .. } | Self::DuplicateSource { requests, .. } => {
                requests.clone()
            },
            Self::InvalidName { request, .. } => vec![*request],
        }
    }

    /// Per-request error kind reported for an offending request
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateTarget { .. } => ErrorKind::DuplicateTarget,
            Self::DuplicateSource { .. } => ErrorKind::DuplicateSource,
            Self::InvalidName { .. } => ErrorKind::InvalidName,
        }
    }
}

/// Why a single request did not end up under its target name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("destination already exists")]
    NameCollisionOnDisk,
    #[error("permission denied")]
    PermissionDenied,
    #[error("read-only filesystem")]
    ReadOnlyFilesystem,
    #[error("file not found")]
    NotFound,
    #[error("no free temporary name for cycle detour")]
    TemporaryNameExhausted,
    /// The target is still occupied because a downstream rename failed
    #[error("blocked by a failed rename further down the chain")]
    Blocked,
    /// Another member of the same cycle failed
    #[error("cycle aborted")]
    CycleAborted,
    #[error("cancelled before this rename started")]
    Cancelled,
    #[error("duplicate target name in batch")]
    DuplicateTarget,
    #[error("file renamed more than once in batch")]
    DuplicateSource,
    #[error("invalid target name")]
    InvalidName,
    /// The batch was rejected because of another request
    #[error("batch rejected")]
    BatchRejected,
    #[error("{0}")]
    Io(String),
}

impl ErrorKind {
    /// Map an error from the rename primitive onto the per-request taxonomy
    pub fn from_io(err: &io::Error) -> Self {
        #[cfg(unix)]
        if err.raw_os_error() == Some(libc::EROFS) {
            return Self::ReadOnlyFilesystem;
        }

        match err.kind() {
            io::ErrorKind::AlreadyExists => Self::NameCollisionOnDisk,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<&io::Error> for ErrorKind {
    fn from(err: &io::Error) -> Self {
        Self::from_io(err)
    }
}

/// Returned by a [`crate::FileRef`] that refuses to track a new location.
#[derive(Debug, Error)]
#[error("file handle could not follow rename to {}: {reason}", path.display())]
pub struct FileRefError {
    pub path: PathBuf,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_mapping() {
        let err = io::Error::new(io::ErrorKind::AlreadyExists, "exists");
        assert_eq!(ErrorKind::from_io(&err), ErrorKind::NameCollisionOnDisk);

        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(ErrorKind::from_io(&err), ErrorKind::PermissionDenied);

        let err = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(ErrorKind::from_io(&err), ErrorKind::NotFound);

        let err = io::Error::new(io::ErrorKind::Other, "weird");
        assert_eq!(ErrorKind::from_io(&err), ErrorKind::Io("weird".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_erofs_mapping() {
        let err = io::Error::from_raw_os_error(libc::EROFS);
        assert_eq!(ErrorKind::from_io(&err), ErrorKind::ReadOnlyFilesystem);
    }

    #[test]
    fn test_error_kind_json_shape() {
        let json = serde_json::to_string(&ErrorKind::NameCollisionOnDisk).unwrap();
        assert_eq!(json, r#"{"kind":"name_collision_on_disk"}"#);

        let json = serde_json::to_string(&ErrorKind::Io("boom".to_string())).unwrap();
        assert_eq!(json, r#"{"kind":"io","detail":"boom"}"#);
    }

    #[test]
    fn test_offending_requests() {
        let err = BatchError::DuplicateTarget {
            directory: PathBuf::from("/tmp"),
            name: "a".to_string(),
            requests: vec![0, 3],
        };
        assert_eq!(err.offending_requests(), vec![0, 3]);
        assert_eq!(err.kind(), ErrorKind::DuplicateTarget);
        assert!(err.to_string().contains("2 requests target"));
    }
}
