//! Property-based test generators using proptest.
//!
//! Provides strategies for generating actions, round results and
//! histories, including histories that end in a known repetition.

use dirsync_cycle::HistoryEntry;
use dirsync_protocol::{Checksum, DirectoryVersion, FileVersion, SyncAction, SyncResult};
use proptest::prelude::*;

/// Strategy for generating hex checksums.
pub fn checksum_strategy() -> impl Strategy<Value = Checksum> {
    prop::string::string_regex("[0-9a-f]{32}")
        .expect("Invalid regex")
        .prop_map(|hex| Checksum::new(hex))
}

/// Strategy for generating directory paths from a small fixed set.
///
/// The set is small on purpose so that generated rounds collide often.
pub fn path_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["/", "/docs", "/photos", "/music/live"]).prop_map(String::from)
}

/// Strategy for generating file versions.
pub fn file_version_strategy() -> impl Strategy<Value = FileVersion> {
    (
        prop::string::string_regex("[a-z]{1,8}\\.txt").expect("Invalid regex"),
        checksum_strategy(),
    )
        .prop_map(|(name, checksum)| FileVersion::new(name, checksum))
}

/// Strategy for generating directory versions.
pub fn directory_version_strategy() -> impl Strategy<Value = DirectoryVersion> {
    (path_strategy(), checksum_strategy())
        .prop_map(|(path, checksum)| DirectoryVersion::new(path, checksum))
}

/// Strategy for generating any sync action.
pub fn action_strategy() -> impl Strategy<Value = SyncAction> {
    prop_oneof![
        (directory_version_strategy(), any::<bool>())
            .prop_map(|(version, reset)| SyncAction::SyncDirectory { version, reset }),
        any::<bool>().prop_map(|reset| SyncAction::SyncDirectories { reset }),
        path_strategy().prop_map(|path| SyncAction::RemoveDirectory { path }),
        (path_strategy(), file_version_strategy())
            .prop_map(|(path, file)| SyncAction::Upload { path, file }),
        (path_strategy(), file_version_strategy())
            .prop_map(|(path, file)| SyncAction::Download { path, file }),
        (path_strategy(), file_version_strategy())
            .prop_map(|(path, file)| SyncAction::RemoveFile { path, file }),
        directory_version_strategy().prop_map(|version| SyncAction::Acknowledge { version }),
    ]
}

/// Strategy for generating round results with up to `max_actions` actions per side.
pub fn sync_result_strategy(max_actions: usize) -> impl Strategy<Value = SyncResult> {
    (
        prop::collection::vec(action_strategy(), 0..=max_actions),
        prop::collection::vec(action_strategy(), 0..=max_actions),
    )
        .prop_map(|(server, client)| SyncResult::new(server, client))
}

/// Strategy for generating history entries.
pub fn history_entry_strategy() -> impl Strategy<Value = HistoryEntry> {
    (sync_result_strategy(3), prop::option::of(path_strategy()))
        .prop_map(|(result, path)| HistoryEntry::new(result, path))
}

/// Strategy for generating short lists over a three-letter alphabet.
///
/// Small alphabets produce accidental repetitions, which is what the
/// repetition search needs to be exercised on.
pub fn symbol_list_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..3, 0..=max_len)
}

/// Strategy for generating a list that is `unit` repeated `repetitions` times.
///
/// Yields `(unit, repetitions, list)`. The unit itself may contain
/// repetitions, so the shortest repeating unit of `list` can be shorter.
pub fn repeated_list_strategy() -> impl Strategy<Value = (Vec<u8>, usize, Vec<u8>)> {
    (prop::collection::vec(0u8..4, 1..6), 1usize..6).prop_map(|(unit, repetitions)| {
        let list = unit.repeat(repetitions);
        (unit, repetitions, list)
    })
}
