//! Test fixtures for sync rounds.
//!
//! Provides a scripted diff engine, a map-backed directory version
//! provider and builders for common actions and results.

use dirsync_cycle::{DirectoryVersionProvider, SyncSession, VersionError, VersionResult};
use dirsync_protocol::{Checksum, DirectoryVersion, FileVersion, SyncAction, SyncResult};
use dirsync_server::{
    DiffEngine, DirectorySyncRequest, EngineError, EngineResult, FileSyncRequest,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Creates a directory version.
pub fn directory_version(path: &str, checksum: &str) -> DirectoryVersion {
    DirectoryVersion::new(path, Checksum::new(checksum))
}

/// Creates an upload action for `name` in `path`.
pub fn upload(path: &str, name: &str) -> SyncAction {
    SyncAction::Upload {
        path: path.to_string(),
        file: FileVersion::new(name, Checksum::new("aa")),
    }
}

/// Creates a download action for `name` in `path`.
pub fn download(path: &str, name: &str) -> SyncAction {
    SyncAction::Download {
        path: path.to_string(),
        file: FileVersion::new(name, Checksum::new("bb")),
    }
}

/// Creates a non-resetting directory sync action.
pub fn sync_directory(path: &str, checksum: &str) -> SyncAction {
    SyncAction::SyncDirectory {
        version: directory_version(path, checksum),
        reset: false,
    }
}

/// Creates a result with `actions` for the client only.
pub fn client_result(actions: Vec<SyncAction>) -> SyncResult {
    SyncResult::for_client(actions)
}

/// Directory versions backed by a map.
///
/// Paths that are not in the map are reported as not found.
#[derive(Debug, Default)]
pub struct MappedVersionProvider {
    versions: HashMap<String, Checksum>,
    failing: HashSet<String>,
    lookups: AtomicUsize,
}

impl MappedVersionProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a known directory.
    pub fn with(mut self, path: &str, checksum: &str) -> Self {
        self.versions.insert(path.to_string(), Checksum::new(checksum));
        self
    }

    /// Makes lookups of `path` fail as if the checksum store were down.
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Returns the number of lookups made so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl DirectoryVersionProvider for MappedVersionProvider {
    fn directory_version(
        &self,
        _session: &SyncSession,
        path: &str,
    ) -> VersionResult<DirectoryVersion> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(path) {
            return Err(VersionError::Unavailable(format!("lookup of {path} failed")));
        }
        self.versions
            .get(path)
            .map(|checksum| DirectoryVersion::new(path, checksum.clone()))
            .ok_or_else(|| VersionError::NotFound(path.to_string()))
    }
}

/// A diff engine that replays scripted results.
///
/// Queued results are handed out first, in order. Once the queue of a
/// round kind is empty, its repeated result is returned (empty by default).
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    directory_queue: Mutex<VecDeque<EngineResult<SyncResult>>>,
    directory_repeat: Mutex<SyncResult>,
    file_queue: Mutex<HashMap<String, VecDeque<EngineResult<SyncResult>>>>,
    file_repeat: Mutex<HashMap<String, SyncResult>>,
    directory_calls: AtomicUsize,
    file_calls: AtomicUsize,
}

impl ScriptedEngine {
    /// Creates an engine that always reports no changes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `result` for every directory round once the queue is empty.
    pub fn repeat_directories(self, result: SyncResult) -> Self {
        *self.directory_repeat.lock() = result;
        self
    }

    /// Queues a result for the next directory round.
    pub fn push_directories(self, result: SyncResult) -> Self {
        self.directory_queue.lock().push_back(Ok(result));
        self
    }

    /// Queues a failure for the next directory round.
    pub fn fail_directories(self, error: EngineError) -> Self {
        self.directory_queue.lock().push_back(Err(error));
        self
    }

    /// Returns `result` for every file round of `path` once its queue is empty.
    pub fn repeat_files(self, path: &str, result: SyncResult) -> Self {
        self.file_repeat.lock().insert(path.to_string(), result);
        self
    }

    /// Queues a result for the next file round of `path`.
    pub fn push_files(self, path: &str, result: SyncResult) -> Self {
        self.file_queue
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(Ok(result));
        self
    }

    /// Returns the number of directory rounds computed.
    pub fn directory_calls(&self) -> usize {
        self.directory_calls.load(Ordering::SeqCst)
    }

    /// Returns the number of file rounds computed.
    pub fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }
}

impl DiffEngine for ScriptedEngine {
    fn diff_directories(
        &self,
        _session: &SyncSession,
        _request: &DirectorySyncRequest,
    ) -> EngineResult<SyncResult> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        match self.directory_queue.lock().pop_front() {
            Some(result) => result,
            None => Ok(self.directory_repeat.lock().clone()),
        }
    }

    fn diff_files(
        &self,
        _session: &SyncSession,
        request: &FileSyncRequest,
    ) -> EngineResult<SyncResult> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        let queued = self
            .file_queue
            .lock()
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(result) => result,
            None => Ok(self
                .file_repeat
                .lock()
                .get(&request.path)
                .cloned()
                .unwrap_or_default()),
        }
    }
}
