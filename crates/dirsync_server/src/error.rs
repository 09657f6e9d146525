//! Error types for the sync server.

use crate::engine::EngineError;
use dirsync_cycle::SessionId;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The session is not open.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    /// No more sessions can be opened.
    #[error("session limit reached: {0}")]
    SessionLimit(usize),

    /// Invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The diff engine failed.
    #[error("diff engine error: {0}")]
    Engine(#[from] EngineError),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::UnknownSession(_) | ServerError::InvalidRequest(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::SessionLimit(_) | ServerError::Engine(_))
    }
}
