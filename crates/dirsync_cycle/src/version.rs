//! Resolution of current directory versions.

use crate::error::VersionResult;
use crate::session::SyncSession;
use dirsync_protocol::DirectoryVersion;
use std::sync::Arc;
use tracing::warn;

/// Looks up the current server-side version of a directory.
///
/// Implementations are shared between sessions and may be called several
/// times per round, once for every directory a cycle touches.
pub trait DirectoryVersionProvider: Send + Sync {
    /// Returns the current version of the directory at `path`.
    fn directory_version(
        &self,
        session: &SyncSession,
        path: &str,
    ) -> VersionResult<DirectoryVersion>;
}

impl<P: DirectoryVersionProvider + ?Sized> DirectoryVersionProvider for Arc<P> {
    fn directory_version(
        &self,
        session: &SyncSession,
        path: &str,
    ) -> VersionResult<DirectoryVersion> {
        (**self).directory_version(session, path)
    }
}

impl<P: DirectoryVersionProvider + ?Sized> DirectoryVersionProvider for &P {
    fn directory_version(
        &self,
        session: &SyncSession,
        path: &str,
    ) -> VersionResult<DirectoryVersion> {
        (**self).directory_version(session, path)
    }
}

/// Resolves the version of `path`, falling back to the empty-checksum version.
///
/// Provider failures are logged and never returned.
pub fn resolve_or_empty<P>(provider: &P, session: &SyncSession, path: &str) -> DirectoryVersion
where
    P: DirectoryVersionProvider + ?Sized,
{
    match provider.directory_version(session, path) {
        Ok(version) => version,
        Err(err) => {
            warn!(
                session = %session.id(),
                path,
                error = %err,
                "unable to resolve directory version, using empty checksum"
            );
            DirectoryVersion::empty(path)
        }
    }
}
