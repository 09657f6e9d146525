//! Open sync sessions.

use crate::error::{ServerError, ServerResult};
use dirsync_cycle::{SessionId, SessionKey, SyncSession};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Session parameter holding the round counters of a session.
pub const STATS_KEY: SessionKey<SessionStats> = SessionKey::new("dirsync.server.stats");

/// Round counters of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Rounds over the directory structure.
    pub directory_rounds: u64,
    /// Rounds over the files of a directory.
    pub file_rounds: u64,
    /// Rounds whose result was replaced by reset actions.
    pub corrections: u64,
}

/// A session shared between request threads.
///
/// Rounds lock the session for their whole duration, so two rounds of the
/// same session never interleave.
pub type SharedSession = Arc<Mutex<SyncSession>>;

/// Registry of open sessions.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
    max_sessions: usize,
    trace: bool,
}

impl SessionRegistry {
    /// Creates a registry.
    pub fn new(max_sessions: usize, trace: bool) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            trace,
        }
    }

    /// Opens a new session.
    pub fn open(&self) -> ServerResult<SessionId> {
        self.open_with_trace(self.trace)
    }

    /// Opens a new session with the given trace setting.
    pub fn open_with_trace(&self, trace: bool) -> ServerResult<SessionId> {
        let mut sessions = self.sessions.write();
        if sessions.len() >= self.max_sessions {
            return Err(ServerError::SessionLimit(self.max_sessions));
        }

        let id = SessionId::new();
        let session = SyncSession::new(id).with_trace(trace);
        sessions.insert(id, Arc::new(Mutex::new(session)));
        debug!(session = %id, trace, "opened sync session");
        Ok(id)
    }

    /// Returns an open session.
    pub fn get(&self, id: &SessionId) -> ServerResult<SharedSession> {
        self.sessions
            .read()
            .get(id)
            .cloned()
            .ok_or(ServerError::UnknownSession(*id))
    }

    /// Closes a session, dropping its state. Returns false if it was not open.
    pub fn close(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            debug!(session = %id, "closed sync session");
        }
        removed
    }

    /// Returns the number of open sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no sessions are open.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_and_close() {
        let registry = SessionRegistry::new(10, false);
        let id = registry.open().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().lock().id(), id);

        assert!(registry.close(&id));
        assert!(!registry.close(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_session() {
        let registry = SessionRegistry::new(10, false);
        let result = registry.get(&SessionId::new());
        assert!(matches!(result, Err(ServerError::UnknownSession(_))));
    }

    #[test]
    fn session_limit() {
        let registry = SessionRegistry::new(1, false);
        let first = registry.open().unwrap();
        assert!(matches!(registry.open(), Err(ServerError::SessionLimit(1))));

        registry.close(&first);
        assert!(registry.open().is_ok());
    }

    #[test]
    fn trace_setting() {
        let registry = SessionRegistry::new(10, true);
        let traced = registry.open().unwrap();
        let quiet = registry.open_with_trace(false).unwrap();
        assert!(registry.get(&traced).unwrap().lock().is_trace_enabled());
        assert!(!registry.get(&quiet).unwrap().lock().is_trace_enabled());
    }

    #[test]
    fn closing_drops_session_state() {
        let registry = SessionRegistry::new(10, false);
        let id = registry.open().unwrap();
        let session = registry.get(&id).unwrap();
        session.lock().parameters_mut().set(&STATS_KEY, SessionStats::default());

        registry.close(&id);
        // Only the handle taken above keeps the state alive now.
        assert_eq!(Arc::strong_count(&session), 1);
    }
}
