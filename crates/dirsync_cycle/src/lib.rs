//! # dirsync Cycle Detection
//!
//! Detects client/server sync sessions that keep repeating the same rounds
//! without converging, and replaces the next result with reset actions.
//!
//! This crate provides:
//! - `find_repetitions`, the repeating-unit search over any sequence
//! - `HistoryEntry` and `SyncHistory`, the bounded per-session round log
//! - `CycleDetector`, which records rounds and derives corrective results
//! - `SyncSession` and `SessionParameters`, typed per-session state
//! - `DirectoryVersionProvider`, the lookup used to build reset actions
//!
//! ## Detection
//!
//! Every round is appended to the session history. After each round over
//! the directory structure, every suffix of the history is searched for a
//! unit that repeats back to back until the end of the history. The
//! longest suffix whose unit repeats at least `min_repetition_count` times
//! and is not the idle round is reported as a cycle.
//!
//! ## Key Invariants
//!
//! - The history never holds more than `max_history_size` rounds
//! - Compacted rounds compare equal to their full form
//! - Idle rounds alone never form a cycle
//! - Tracking never fails; lookup errors fall back to the empty checksum

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod detector;
mod error;
mod finder;
mod history;
mod session;
mod trace;
mod version;

pub use config::{
    DetectorConfig, DEFAULT_MAX_HISTORY_ENTRY_LENGTH, DEFAULT_MAX_HISTORY_SIZE,
    DEFAULT_MIN_REPETITION_COUNT, DEFAULT_MIN_SEQUENCE_LENGTH,
};
pub use detector::{CycleDetector, DetectedCycle, Tracked};
pub use error::{VersionError, VersionResult};
pub use finder::{find_repetitions, RepeatedSequence};
pub use history::{HistoryEntry, SyncHistory, HISTORY_KEY};
pub use session::{SessionId, SessionKey, SessionParameters, SyncSession};
pub use trace::CycleTrace;
pub use version::{resolve_or_empty, DirectoryVersionProvider};
