//! Sync actions and the versions they refer to.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex digest of a directory or file.
///
/// Serialized as a plain string. Deserializing goes through
/// [`Checksum::new`], so the stored form is always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
    /// Digest of empty content, used when the real checksum is unknown.
    pub const EMPTY: &'static str = "d41d8cd98f00b204e9800998ecf8427e";

    /// Creates a checksum from its hex form. The value is lowercased.
    pub fn new(hex: impl Into<String>) -> Self {
        let mut hex = hex.into();
        hex.make_ascii_lowercase();
        Self(hex)
    }

    /// Returns the sentinel checksum of empty content.
    pub fn empty() -> Self {
        Self(Self::EMPTY.to_string())
    }

    /// Returns true if this is the empty-content sentinel.
    pub fn is_empty(&self) -> bool {
        self.0 == Self::EMPTY
    }

    /// Returns the hex form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Checksum {
    fn from(hex: String) -> Self {
        Self::new(hex)
    }
}

impl From<Checksum> for String {
    fn from(checksum: Checksum) -> Self {
        checksum.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directory path together with the checksum of its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryVersion {
    /// Directory path, relative to the sync root (`/` is the root).
    pub path: String,
    /// Checksum of the directory contents.
    pub checksum: Checksum,
}

impl DirectoryVersion {
    /// Creates a new directory version.
    pub fn new(path: impl Into<String>, checksum: Checksum) -> Self {
        Self {
            path: path.into(),
            checksum,
        }
    }

    /// Creates a version with the empty-content checksum.
    pub fn empty(path: impl Into<String>) -> Self {
        Self::new(path, Checksum::empty())
    }
}

impl fmt::Display for DirectoryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.path, self.checksum)
    }
}

/// A file name together with the checksum of its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileVersion {
    /// File name within its directory.
    pub name: String,
    /// Checksum of the file contents.
    pub checksum: Checksum,
}

impl FileVersion {
    /// Creates a new file version.
    pub fn new(name: impl Into<String>, checksum: Checksum) -> Self {
        Self {
            name: name.into(),
            checksum,
        }
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.checksum)
    }
}

/// An instruction produced by a sync round, executed by the client or the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncAction {
    /// Synchronize the files of one directory.
    SyncDirectory {
        /// The directory and its expected checksum.
        version: DirectoryVersion,
        /// Discard cached state instead of preserving it where possible.
        #[serde(default)]
        reset: bool,
    },
    /// Synchronize the complete directory structure.
    SyncDirectories {
        /// Discard cached state instead of preserving it where possible.
        #[serde(default)]
        reset: bool,
    },
    /// Remove a directory.
    RemoveDirectory {
        /// Directory path.
        path: String,
    },
    /// Upload a file to the server.
    Upload {
        /// Directory path.
        path: String,
        /// The file to upload.
        file: FileVersion,
    },
    /// Download a file from the server.
    Download {
        /// Directory path.
        path: String,
        /// The file to download.
        file: FileVersion,
    },
    /// Remove a file.
    RemoveFile {
        /// Directory path.
        path: String,
        /// The file to remove.
        file: FileVersion,
    },
    /// Acknowledge a directory version as in sync.
    Acknowledge {
        /// The acknowledged version.
        version: DirectoryVersion,
    },
}

impl SyncAction {
    /// Creates an action that resynchronizes `version` from scratch.
    pub fn reset_directory(version: DirectoryVersion) -> Self {
        SyncAction::SyncDirectory {
            version,
            reset: true,
        }
    }

    /// Creates an action that resynchronizes the whole tree from scratch.
    pub fn reset_directories() -> Self {
        SyncAction::SyncDirectories { reset: true }
    }

    /// Returns a numeric tag for the action kind.
    pub fn to_code(&self) -> u8 {
        match self {
            SyncAction::SyncDirectory { .. } => 1,
            SyncAction::SyncDirectories { .. } => 2,
            SyncAction::RemoveDirectory { .. } => 3,
            SyncAction::Upload { .. } => 4,
            SyncAction::Download { .. } => 5,
            SyncAction::RemoveFile { .. } => 6,
            SyncAction::Acknowledge { .. } => 7,
        }
    }

    /// Returns the directory path the action applies to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            SyncAction::SyncDirectory { version, .. } | SyncAction::Acknowledge { version } => {
                Some(&version.path)
            }
            SyncAction::RemoveDirectory { path }
            | SyncAction::Upload { path, .. }
            | SyncAction::Download { path, .. }
            | SyncAction::RemoveFile { path, .. } => Some(path),
            SyncAction::SyncDirectories { .. } => None,
        }
    }

    /// Feeds the canonical form of this action into `hasher`.
    ///
    /// Strings are length-prefixed so that adjacent fields cannot run into
    /// each other.
    pub fn digest_into(&self, hasher: &mut Sha256) {
        hasher.update([self.to_code()]);
        match self {
            SyncAction::SyncDirectory { version, reset } => {
                feed_str(hasher, &version.path);
                feed_str(hasher, version.checksum.as_str());
                hasher.update([u8::from(*reset)]);
            }
            SyncAction::SyncDirectories { reset } => {
                hasher.update([u8::from(*reset)]);
            }
            SyncAction::RemoveDirectory { path } => {
                feed_str(hasher, path);
            }
            SyncAction::Upload { path, file }
            | SyncAction::Download { path, file }
            | SyncAction::RemoveFile { path, file } => {
                feed_str(hasher, path);
                feed_str(hasher, &file.name);
                feed_str(hasher, file.checksum.as_str());
            }
            SyncAction::Acknowledge { version } => {
                feed_str(hasher, &version.path);
                feed_str(hasher, version.checksum.as_str());
            }
        }
    }
}

fn feed_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::SyncDirectory { version, reset } => {
                write!(f, "SYNC_DIRECTORY {version}")?;
                if *reset {
                    f.write_str(" (reset)")?;
                }
                Ok(())
            }
            SyncAction::SyncDirectories { reset } => {
                f.write_str("SYNC_DIRECTORIES")?;
                if *reset {
                    f.write_str(" (reset)")?;
                }
                Ok(())
            }
            SyncAction::RemoveDirectory { path } => write!(f, "REMOVE_DIRECTORY {path}"),
            SyncAction::Upload { path, file } => write!(f, "UPLOAD {path} {file}"),
            SyncAction::Download { path, file } => write!(f, "DOWNLOAD {path} {file}"),
            SyncAction::RemoveFile { path, file } => write!(f, "REMOVE_FILE {path} {file}"),
            SyncAction::Acknowledge { version } => write!(f, "ACKNOWLEDGE {version}"),
        }
    }
}
