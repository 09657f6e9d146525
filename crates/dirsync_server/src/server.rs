//! Main sync server.

use crate::config::ServerConfig;
use crate::engine::{DiffEngine, DirectorySyncRequest, FileSyncRequest};
use crate::error::ServerResult;
use crate::handler::RequestHandler;
use crate::session::{SessionRegistry, SessionStats};
use dirsync_cycle::{CycleDetector, DetectorConfig, DirectoryVersionProvider, SessionId};
use dirsync_protocol::SyncResult;
use std::sync::Arc;

/// The sync server.
///
/// Owns the open sessions and runs every round through the diff engine
/// and the cycle detector. Transports call into it once per request.
///
/// # Example
///
/// ```rust,ignore
/// use dirsync_server::{DirectorySyncRequest, ServerConfig, SyncServer};
///
/// let server = SyncServer::new(ServerConfig::default(), engine, versions);
/// let session = server.open_session()?;
///
/// let result = server.sync_directories(&session, &DirectorySyncRequest::default())?;
/// // Send `result.client_actions()` to the client.
///
/// server.close_session(&session);
/// ```
pub struct SyncServer<E: DiffEngine, P: DirectoryVersionProvider> {
    handler: RequestHandler<E, P>,
    sessions: Arc<SessionRegistry>,
}

impl<E: DiffEngine, P: DirectoryVersionProvider> SyncServer<E, P> {
    /// Creates a new sync server.
    pub fn new(config: ServerConfig, engine: E, provider: P) -> Self {
        let sessions = Arc::new(SessionRegistry::new(
            config.max_sessions,
            config.trace_sessions,
        ));
        let detector = CycleDetector::new(config.detector, provider);
        let handler = RequestHandler::new(Arc::clone(&sessions), engine, detector);

        Self { handler, sessions }
    }

    /// Opens a new session with the configured trace setting.
    pub fn open_session(&self) -> ServerResult<SessionId> {
        self.sessions.open()
    }

    /// Opens a new session with verbose tracing.
    pub fn open_traced_session(&self) -> ServerResult<SessionId> {
        self.sessions.open_with_trace(true)
    }

    /// Closes a session and drops its history.
    pub fn close_session(&self, id: &SessionId) -> bool {
        self.sessions.close(id)
    }

    /// Handles a round over the directory structure.
    pub fn sync_directories(
        &self,
        id: &SessionId,
        request: &DirectorySyncRequest,
    ) -> ServerResult<SyncResult> {
        self.handler.handle_sync_directories(id, request)
    }

    /// Handles a round over the files of one directory.
    pub fn sync_files(&self, id: &SessionId, request: &FileSyncRequest) -> ServerResult<SyncResult> {
        self.handler.handle_sync_files(id, request)
    }

    /// Returns the round counters of a session.
    pub fn session_stats(&self, id: &SessionId) -> ServerResult<SessionStats> {
        self.handler.session_stats(id)
    }

    /// Returns the number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Returns the cycle detection settings.
    pub fn detector_config(&self) -> &DetectorConfig {
        self.handler.detector().config()
    }
}
