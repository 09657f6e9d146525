//! Bounded per-session history of sync rounds.

use crate::config::DetectorConfig;
use crate::session::SessionKey;
use dirsync_protocol::SyncResult;
use std::fmt;

/// Session parameter under which the history of a session is stored.
pub const HISTORY_KEY: SessionKey<SyncHistory> = SessionKey::new("dirsync.cycle.history");

/// The recorded outcome of one sync round.
///
/// Equality and hashing cover the result and the path. A compacted result
/// compares equal to the full result it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryEntry {
    result: SyncResult,
    path: Option<String>,
}

impl HistoryEntry {
    /// Creates an entry. `path` is the directory of a file-level round, or
    /// `None` for a round over the whole directory structure.
    pub fn new(result: SyncResult, path: Option<String>) -> Self {
        Self { result, path }
    }

    /// Returns the idle entry: no actions, no path.
    pub fn idle() -> Self {
        Self::new(SyncResult::empty(), None)
    }

    /// Returns true if this is the idle entry.
    pub fn is_idle(&self) -> bool {
        self.path.is_none() && self.result.is_empty()
    }

    /// Returns the recorded result.
    pub fn result(&self) -> &SyncResult {
        &self.result
    }

    /// Returns the directory path of the round, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns a copy with the result compacted.
    pub fn compact(&self) -> Self {
        Self {
            result: self.result.compact(),
            path: self.path.clone(),
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{path}: {}", self.result),
            None => write!(f, "<directories>: {}", self.result),
        }
    }
}

/// Ordered, bounded log of the rounds of one session.
#[derive(Debug, Clone)]
pub struct SyncHistory {
    entries: Vec<HistoryEntry>,
    max_size: usize,
    max_entry_length: usize,
}

impl SyncHistory {
    /// Creates an empty history.
    ///
    /// At most `max_size` entries are kept (at least one). Results with
    /// more than `max_entry_length` actions are stored compacted.
    pub fn new(max_size: usize, max_entry_length: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: Vec::with_capacity(max_size),
            max_size,
            max_entry_length,
        }
    }

    /// Creates an empty history with the limits of `config`.
    pub fn with_config(config: &DetectorConfig) -> Self {
        Self::new(config.max_history_size, config.max_history_entry_length)
    }

    /// Appends a round and returns the entry actually stored.
    ///
    /// Long results are compacted unless `trace` is set. The oldest entry is
    /// evicted once the history is full.
    pub fn insert(
        &mut self,
        result: &SyncResult,
        path: Option<String>,
        trace: bool,
    ) -> &HistoryEntry {
        let result = if !trace && result.len() > self.max_entry_length {
            result.compact()
        } else {
            result.clone()
        };
        self.entries.push(HistoryEntry::new(result, path));

        if self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(..excess);
        }

        &self.entries[self.entries.len() - 1]
    }

    /// Returns all entries, oldest first.
    pub fn all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no rounds have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SyncHistory {
    fn default() -> Self {
        Self::with_config(&DetectorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirsync_protocol::{Checksum, FileVersion, SyncAction};

    fn uploads(count: usize) -> SyncResult {
        let actions = (0..count)
            .map(|i| SyncAction::Upload {
                path: "/docs".into(),
                file: FileVersion::new(format!("file{i}.txt"), Checksum::new("aa")),
            })
            .collect();
        SyncResult::for_client(actions)
    }

    #[test]
    fn idle_entry() {
        assert!(HistoryEntry::idle().is_idle());
        assert!(!HistoryEntry::new(SyncResult::empty(), Some("/a".into())).is_idle());
        assert!(!HistoryEntry::new(uploads(1), None).is_idle());
    }

    #[test]
    fn path_is_part_of_equality() {
        let a = HistoryEntry::new(uploads(1), Some("/a".into()));
        let b = HistoryEntry::new(uploads(1), Some("/b".into()));
        assert_ne!(a, b);
        assert_eq!(a, a.compact());
    }

    #[test]
    fn insert_keeps_order() {
        let mut history = SyncHistory::new(10, 10);
        history.insert(&uploads(1), None, false);
        history.insert(&uploads(2), Some("/a".into()), false);

        assert_eq!(history.len(), 2);
        assert_eq!(history.all()[0].result().len(), 1);
        assert_eq!(history.all()[1].path(), Some("/a"));
    }

    #[test]
    fn long_results_are_compacted() {
        let mut history = SyncHistory::new(10, 10);

        let stored = history.insert(&uploads(10), None, false);
        assert!(!stored.result().is_compacted());

        let stored = history.insert(&uploads(11), None, false);
        assert!(stored.result().is_compacted());
        assert_eq!(stored.result().len(), 11);
        assert_eq!(stored.result(), &uploads(11));
    }

    #[test]
    fn compacting_leaves_caller_result_intact() {
        let mut history = SyncHistory::new(10, 10);
        let round = uploads(11);

        let stored = history.insert(&round, Some("/docs".into()), false);
        assert!(stored.result().is_compacted());
        assert!(stored.result().client_actions().is_empty());

        assert!(!round.is_compacted());
        assert_eq!(round.client_actions().len(), 11);
    }

    #[test]
    fn tracing_keeps_long_results() {
        let mut history = SyncHistory::new(10, 10);
        let stored = history.insert(&uploads(11), None, true);
        assert!(!stored.result().is_compacted());
        assert_eq!(stored.result().client_actions().len(), 11);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut history = SyncHistory::new(50, 100);
        for i in 0..53 {
            history.insert(&uploads(i), None, false);
        }

        assert_eq!(history.len(), 50);
        let lengths: Vec<usize> = history.all().iter().map(|e| e.result().len()).collect();
        let expected: Vec<usize> = (3..53).collect();
        assert_eq!(lengths, expected);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let mut history = SyncHistory::new(0, 10);
        history.insert(&uploads(1), None, false);
        history.insert(&uploads(2), None, false);
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.all(), &[HistoryEntry::new(uploads(2), None)]);
    }

    #[test]
    fn clear_history() {
        let mut history = SyncHistory::default();
        history.insert(&uploads(1), None, false);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 50);
    }
}
