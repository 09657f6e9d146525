//! # dirsync Server
//!
//! Session-scoped handling of directory sync rounds.
//!
//! This crate provides:
//! - A session registry with one lock per session
//! - The `DiffEngine` contract for computing round results
//! - Request handlers that pass every round through cycle detection
//!
//! # Protocol
//!
//! A client drives a session with two kinds of rounds:
//! 1. A directory round compares the client's directory listing against
//!    the server's. Its result is checked for cycles and may be replaced
//!    by reset actions.
//! 2. A file round compares the files of one directory. Its result is
//!    recorded with the directory path and handed out unchanged.
//!
//! Rounds of one session are serialized; rounds of different sessions run
//! independently.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod engine;
mod error;
mod handler;
mod server;
mod session;

pub use config::ServerConfig;
pub use engine::{DiffEngine, DirectorySyncRequest, EngineError, EngineResult, FileSyncRequest};
pub use error::{ServerError, ServerResult};
pub use handler::RequestHandler;
pub use server::SyncServer;
pub use session::{SessionRegistry, SessionStats, SharedSession, STATS_KEY};
