//! The diff engine contract.

use dirsync_cycle::SyncSession;
use dirsync_protocol::{DirectoryVersion, FileVersion, SyncResult};
use std::sync::Arc;
use thiserror::Error;

/// Result type for diff engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors a diff engine may report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Server-side storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The request named a path the engine cannot handle.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The engine is temporarily unavailable.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// A client's view of the directory structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySyncRequest {
    /// Versions at the end of the last successful round.
    pub original_versions: Vec<DirectoryVersion>,
    /// Versions currently on the client.
    pub client_versions: Vec<DirectoryVersion>,
}

impl DirectorySyncRequest {
    /// Creates a new request.
    pub fn new(
        original_versions: Vec<DirectoryVersion>,
        client_versions: Vec<DirectoryVersion>,
    ) -> Self {
        Self {
            original_versions,
            client_versions,
        }
    }
}

/// A client's view of the files in one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSyncRequest {
    /// Directory path.
    pub path: String,
    /// Versions at the end of the last successful round.
    pub original_versions: Vec<FileVersion>,
    /// Versions currently on the client.
    pub client_versions: Vec<FileVersion>,
}

impl FileSyncRequest {
    /// Creates a new request.
    pub fn new(
        path: impl Into<String>,
        original_versions: Vec<FileVersion>,
        client_versions: Vec<FileVersion>,
    ) -> Self {
        Self {
            path: path.into(),
            original_versions,
            client_versions,
        }
    }
}

/// Computes the actions of one sync round.
///
/// Implementations compare the client's state against the server's and
/// decide what each side has to do. They are shared between sessions.
pub trait DiffEngine: Send + Sync {
    /// Computes a round over the directory structure.
    fn diff_directories(
        &self,
        session: &SyncSession,
        request: &DirectorySyncRequest,
    ) -> EngineResult<SyncResult>;

    /// Computes a round over the files of one directory.
    fn diff_files(
        &self,
        session: &SyncSession,
        request: &FileSyncRequest,
    ) -> EngineResult<SyncResult>;
}

impl<E: DiffEngine + ?Sized> DiffEngine for Arc<E> {
    fn diff_directories(
        &self,
        session: &SyncSession,
        request: &DirectorySyncRequest,
    ) -> EngineResult<SyncResult> {
        (**self).diff_directories(session, request)
    }

    fn diff_files(
        &self,
        session: &SyncSession,
        request: &FileSyncRequest,
    ) -> EngineResult<SyncResult> {
        (**self).diff_files(session, request)
    }
}
