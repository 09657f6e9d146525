//! # dirsync Testkit
//!
//! Test utilities for dirsync.
//!
//! This crate provides:
//! - A scripted diff engine and a map-backed version provider
//! - Builders for common actions and results
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dirsync_testkit::prelude::*;
//!
//! let engine = ScriptedEngine::new()
//!     .repeat_directories(client_result(vec![sync_directory("/docs", "aa")]));
//! let versions = MappedVersionProvider::new().with("/docs", "bb");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
