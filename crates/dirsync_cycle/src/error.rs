//! Error types for directory version resolution.

use thiserror::Error;

/// Result type for directory version lookups.
pub type VersionResult<T> = Result<T, VersionError>;

/// Errors a [`DirectoryVersionProvider`](crate::DirectoryVersionProvider) may report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The directory does not exist (anymore).
    #[error("directory not found: {0}")]
    NotFound(String),

    /// The checksum store could not be reached.
    #[error("checksum provider unavailable: {0}")]
    Unavailable(String),

    /// Any other provider failure.
    #[error("provider error: {0}")]
    Provider(String),
}

impl VersionError {
    /// Returns true if a later lookup may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, VersionError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = VersionError::NotFound("/docs".into());
        assert_eq!(err.to_string(), "directory not found: /docs");
    }

    #[test]
    fn transient_errors() {
        assert!(VersionError::Unavailable("timeout".into()).is_transient());
        assert!(!VersionError::NotFound("/a".into()).is_transient());
        assert!(!VersionError::Provider("boom".into()).is_transient());
    }
}
