//! Request handlers for sync rounds.

use crate::engine::{DiffEngine, DirectorySyncRequest, FileSyncRequest};
use crate::error::{ServerError, ServerResult};
use crate::session::{SessionRegistry, SessionStats, STATS_KEY};
use dirsync_cycle::{CycleDetector, DirectoryVersionProvider, SessionId, SyncSession};
use dirsync_protocol::SyncResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// Handler for sync requests.
///
/// Every round locks its session, asks the diff engine for the round's
/// actions and passes them through the cycle detector before they are
/// handed out.
pub struct RequestHandler<E: DiffEngine, P: DirectoryVersionProvider> {
    sessions: Arc<SessionRegistry>,
    engine: E,
    detector: CycleDetector<P>,
}

impl<E: DiffEngine, P: DirectoryVersionProvider> RequestHandler<E, P> {
    /// Creates a new request handler.
    pub fn new(sessions: Arc<SessionRegistry>, engine: E, detector: CycleDetector<P>) -> Self {
        Self {
            sessions,
            engine,
            detector,
        }
    }

    /// Returns the cycle detector.
    pub fn detector(&self) -> &CycleDetector<P> {
        &self.detector
    }

    /// Handles a round over the directory structure.
    pub fn handle_sync_directories(
        &self,
        id: &SessionId,
        request: &DirectorySyncRequest,
    ) -> ServerResult<SyncResult> {
        for version in request
            .client_versions
            .iter()
            .chain(&request.original_versions)
        {
            validate_path(&version.path)?;
        }

        let shared = self.sessions.get(id)?;
        let mut session = shared.lock();

        let result = self
            .engine
            .diff_directories(&session, request)
            .inspect_err(|err| warn!(session = %id, error = %err, "directory diff failed"))?;
        debug!(session = %id, actions = result.len(), "computed directory round");

        let tracked = self.detector.track_and_detect(&mut session, result);
        let stats = stats_mut(&mut session);
        stats.directory_rounds += 1;
        if tracked.is_corrected() {
            stats.corrections += 1;
        }
        Ok(tracked.result)
    }

    /// Handles a round over the files of one directory.
    pub fn handle_sync_files(
        &self,
        id: &SessionId,
        request: &FileSyncRequest,
    ) -> ServerResult<SyncResult> {
        validate_path(&request.path)?;

        let shared = self.sessions.get(id)?;
        let mut session = shared.lock();

        let result = self
            .engine
            .diff_files(&session, request)
            .inspect_err(|err| {
                warn!(session = %id, path = %request.path, error = %err, "file diff failed")
            })?;
        debug!(session = %id, path = %request.path, actions = result.len(), "computed file round");

        let result = self.detector.track(&mut session, result, &request.path);
        stats_mut(&mut session).file_rounds += 1;
        Ok(result)
    }

    /// Returns the round counters of a session.
    pub fn session_stats(&self, id: &SessionId) -> ServerResult<SessionStats> {
        let shared = self.sessions.get(id)?;
        let session = shared.lock();
        Ok(session
            .parameters()
            .get(&STATS_KEY)
            .cloned()
            .unwrap_or_default())
    }
}

fn stats_mut(session: &mut SyncSession) -> &mut SessionStats {
    session
        .parameters_mut()
        .get_or_init(&STATS_KEY, SessionStats::default)
}

/// Checks that `path` is absolute and does not leave the sync root.
fn validate_path(path: &str) -> ServerResult<()> {
    if !path.starts_with('/') {
        return Err(ServerError::InvalidRequest(format!(
            "path must be absolute: {path}"
        )));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(ServerError::InvalidRequest(format!(
            "path must not contain '..': {path}"
        )));
    }
    Ok(())
}
