//! # dirsync Protocol
//!
//! Sync action and result types shared by the dirsync crates.
//!
//! This crate provides:
//! - `Checksum`, `DirectoryVersion` and `FileVersion` for describing state
//! - `SyncAction` for the instructions a sync round produces
//! - `SyncResult`, the server-bound and client-bound actions of one round,
//!   with a lossy compaction that keeps equality intact
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod result;

pub use action::{Checksum, DirectoryVersion, FileVersion, SyncAction};
pub use result::{ActionDigest, ActionList, SyncResult};
