//! Cycle detection over the history of a session.

use crate::config::DetectorConfig;
use crate::finder::find_repetitions;
use crate::history::{HistoryEntry, SyncHistory, HISTORY_KEY};
use crate::session::SyncSession;
use crate::trace::CycleTrace;
use crate::version::{resolve_or_empty, DirectoryVersionProvider};
use dirsync_protocol::{SyncAction, SyncResult};
use tracing::{debug, info};

/// A repeating unit of rounds found at the tail of a session's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCycle {
    entries: Vec<HistoryEntry>,
    repetitions: usize,
    start: usize,
}

impl DetectedCycle {
    /// Returns the rounds of one repetition, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Returns how often the unit repeated.
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Returns the index in the history where the first repetition starts.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the distinct directory paths of the unit, in order of appearance.
    ///
    /// Only rounds recorded without a path are skipped; every recorded path,
    /// including the empty one, is reported as given.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for path in self.entries.iter().filter_map(HistoryEntry::path) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    /// Returns a printable dump of the cycle.
    pub fn trace(&self) -> CycleTrace<'_> {
        CycleTrace::new(self)
    }
}

/// The result to hand out for a round, and the cycle it breaks, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracked {
    /// The original result, or the corrective one if a cycle was found.
    pub result: SyncResult,
    /// The detected cycle.
    pub cycle: Option<DetectedCycle>,
}

impl Tracked {
    /// Returns true if the result was replaced.
    pub fn is_corrected(&self) -> bool {
        self.cycle.is_some()
    }
}

/// Records sync rounds per session and breaks up repeating rounds.
///
/// Every round is appended to the session's [`SyncHistory`]. After a round
/// over the directory structure, the detector looks for a unit of rounds
/// that makes up the whole tail of the history and repeats often enough.
/// If one is found, the round's result is replaced by reset actions for the
/// directories involved, or for the whole tree if the unit names none.
///
/// # Example
///
/// ```
/// use dirsync_cycle::{
///     CycleDetector, DetectorConfig, DirectoryVersionProvider, SessionId, SyncSession,
///     VersionResult,
/// };
/// use dirsync_protocol::{DirectoryVersion, SyncAction, SyncResult};
///
/// struct EmptyVersions;
///
/// impl DirectoryVersionProvider for EmptyVersions {
///     fn directory_version(
///         &self,
///         _session: &SyncSession,
///         path: &str,
///     ) -> VersionResult<DirectoryVersion> {
///         Ok(DirectoryVersion::empty(path))
///     }
/// }
///
/// let detector = CycleDetector::new(DetectorConfig::default(), EmptyVersions);
/// let mut session = SyncSession::new(SessionId::new());
/// let round = SyncResult::for_client(vec![SyncAction::SyncDirectories { reset: false }]);
///
/// assert_eq!(detector.track_and_check(&mut session, round.clone()), round);
/// assert_eq!(detector.track_and_check(&mut session, round.clone()), round);
///
/// let corrected = detector.track_and_check(&mut session, round.clone());
/// assert_eq!(corrected.client_actions(), &[SyncAction::reset_directories()]);
/// ```
pub struct CycleDetector<P: DirectoryVersionProvider> {
    config: DetectorConfig,
    provider: P,
}

impl<P: DirectoryVersionProvider> CycleDetector<P> {
    /// Creates a detector.
    pub fn new(config: DetectorConfig, provider: P) -> Self {
        Self { config, provider }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns the directory version provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Records a round over the directory structure and checks for a cycle.
    ///
    /// Returns `result` unchanged unless the history now ends in a cycle, in
    /// which case the corrective reset result is returned instead.
    pub fn track_and_check(&self, session: &mut SyncSession, result: SyncResult) -> SyncResult {
        self.track_and_detect(session, result).result
    }

    /// Like [`track_and_check`](Self::track_and_check), but also reports the cycle.
    pub fn track_and_detect(&self, session: &mut SyncSession, result: SyncResult) -> Tracked {
        let trace = session.is_trace_enabled();
        let detected = {
            let history = self.history(session);
            history.insert(&result, None, trace);
            self.detect(history.all())
        };

        let Some(cycle) = detected else {
            return Tracked {
                result,
                cycle: None,
            };
        };

        if trace {
            info!(session = %session.id(), "{}", cycle.trace());
        } else {
            debug!(
                session = %session.id(),
                rounds = cycle.entries().len(),
                repetitions = cycle.repetitions(),
                "sync cycle detected, resetting"
            );
        }

        Tracked {
            result: self.corrective_result(session, &cycle),
            cycle: Some(cycle),
        }
    }

    /// Records a file-level round for the directory at `path`.
    ///
    /// File-level rounds never trigger a correction on their own; they show
    /// up in later cycles and decide which directories are reset.
    pub fn track(&self, session: &mut SyncSession, result: SyncResult, path: &str) -> SyncResult {
        let trace = session.is_trace_enabled();
        let history = self.history(session);
        let stored = history.insert(&result, Some(path.to_string()), trace);
        debug!(path, compacted = stored.result().is_compacted(), "tracked file round");
        result
    }

    /// Looks for a cycle at the tail of `history`.
    ///
    /// Suffixes are tried from the longest to the shortest; the first whose
    /// repeating unit passes the thresholds and is not the idle round wins.
    pub fn detect(&self, history: &[HistoryEntry]) -> Option<DetectedCycle> {
        (0..history.len()).find_map(|start| {
            let found = find_repetitions(&history[start..]);
            let accepted = found.repetitions >= self.config.min_repetition_count
                && found.sequence.len() >= self.config.min_sequence_length
                && !is_idle_unit(found.sequence);
            accepted.then(|| DetectedCycle {
                entries: found.sequence.to_vec(),
                repetitions: found.repetitions,
                start,
            })
        })
    }

    /// Builds the reset result for `cycle`.
    pub fn corrective_result(&self, session: &SyncSession, cycle: &DetectedCycle) -> SyncResult {
        let actions: Vec<SyncAction> = cycle
            .paths()
            .into_iter()
            .map(|path| {
                let version = resolve_or_empty(&self.provider, session, path);
                SyncAction::reset_directory(version)
            })
            .collect();

        let actions = if actions.is_empty() {
            vec![SyncAction::reset_directories()]
        } else {
            actions
        };

        if self.config.reset_server_directories {
            SyncResult::new(actions.clone(), actions)
        } else {
            SyncResult::for_client(actions)
        }
    }

    /// Returns the history of `session`, creating it on first use.
    fn history<'s>(&self, session: &'s mut SyncSession) -> &'s mut SyncHistory {
        session
            .parameters_mut()
            .get_or_init(&HISTORY_KEY, || SyncHistory::with_config(&self.config))
    }
}

fn is_idle_unit(sequence: &[HistoryEntry]) -> bool {
    matches!(sequence, [only] if only.is_idle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{VersionError, VersionResult};
    use crate::session::SessionId;
    use dirsync_protocol::{Checksum, DirectoryVersion, FileVersion};
    use std::collections::HashMap;

    #[derive(Default)]
    struct Versions(HashMap<String, Result<Checksum, VersionError>>);

    impl Versions {
        fn with(mut self, path: &str, checksum: &str) -> Self {
            self.0.insert(path.into(), Ok(Checksum::new(checksum)));
            self
        }

        fn failing(mut self, path: &str) -> Self {
            self.0
                .insert(path.into(), Err(VersionError::Unavailable("offline".into())));
            self
        }
    }

    impl DirectoryVersionProvider for Versions {
        fn directory_version(
            &self,
            _session: &SyncSession,
            path: &str,
        ) -> VersionResult<DirectoryVersion> {
            match self.0.get(path) {
                Some(Ok(checksum)) => Ok(DirectoryVersion::new(path, checksum.clone())),
                Some(Err(err)) => Err(err.clone()),
                None => Err(VersionError::NotFound(path.into())),
            }
        }
    }

    fn session() -> SyncSession {
        SyncSession::new(SessionId::new())
    }

    fn upload(path: &str, name: &str) -> SyncResult {
        SyncResult::for_client(vec![SyncAction::Upload {
            path: path.into(),
            file: FileVersion::new(name, Checksum::new("aa")),
        }])
    }

    fn sync_dir(path: &str) -> SyncResult {
        SyncResult::for_client(vec![SyncAction::SyncDirectory {
            version: DirectoryVersion::new(path, Checksum::new("bb")),
            reset: false,
        }])
    }

    fn entry(result: SyncResult, path: Option<&str>) -> HistoryEntry {
        HistoryEntry::new(result, path.map(str::to_string))
    }

    #[test]
    fn third_identical_round_is_corrected() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let mut session = session();
        let round = sync_dir("/a");

        assert_eq!(detector.track_and_check(&mut session, round.clone()), round);
        assert_eq!(detector.track_and_check(&mut session, round.clone()), round);

        let corrected = detector.track_and_check(&mut session, round.clone());
        assert_ne!(corrected, round);
        assert_eq!(corrected.client_actions(), &[SyncAction::reset_directories()]);
        assert!(corrected.server_actions().is_empty());
    }

    #[test]
    fn tracked_reports_the_cycle() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let mut session = session();
        let round = sync_dir("/a");

        assert!(!detector.track_and_detect(&mut session, round.clone()).is_corrected());
        assert!(!detector.track_and_detect(&mut session, round.clone()).is_corrected());

        let tracked = detector.track_and_detect(&mut session, round.clone());
        assert!(tracked.is_corrected());
        let cycle = tracked.cycle.unwrap();
        assert_eq!(cycle.repetitions(), 3);
        assert_eq!(cycle.entries(), &[entry(round, None)]);
    }

    #[test]
    fn threshold_gates_detection() {
        let detector = CycleDetector::new(
            DetectorConfig::default().with_min_repetition_count(4),
            Versions::default(),
        );
        let history = vec![entry(sync_dir("/a"), None); 3];
        assert!(detector.detect(&history).is_none());

        let history = vec![entry(sync_dir("/a"), None); 4];
        let cycle = detector.detect(&history).unwrap();
        assert_eq!(cycle.repetitions(), 4);
        assert_eq!(cycle.start(), 0);
    }

    #[test]
    fn idle_rounds_are_never_a_cycle() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let mut session = session();
        for _ in 0..20 {
            let result = detector.track_and_check(&mut session, SyncResult::empty());
            assert!(result.is_empty());
        }
    }

    #[test]
    fn idle_rounds_inside_a_longer_unit_count() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let a = entry(sync_dir("/a"), None);
        let history = vec![
            a.clone(),
            HistoryEntry::idle(),
            a.clone(),
            HistoryEntry::idle(),
            a,
            HistoryEntry::idle(),
        ];
        let cycle = detector.detect(&history).unwrap();
        assert_eq!(cycle.entries().len(), 2);
        assert_eq!(cycle.repetitions(), 3);
    }

    #[test]
    fn cycle_after_unrelated_rounds() {
        let detector = CycleDetector::new(
            DetectorConfig::default(),
            Versions::default().with("/a", "a1").with("/b", "b1"),
        );
        let a = entry(upload("/a", "x.txt"), Some("/a"));
        let b = entry(upload("/b", "y.txt"), Some("/b"));
        let history = vec![
            entry(sync_dir("/x"), None),
            entry(sync_dir("/y"), None),
            a.clone(),
            b.clone(),
            a.clone(),
            b.clone(),
            a.clone(),
            b.clone(),
        ];

        let cycle = detector.detect(&history).unwrap();
        assert_eq!(cycle.start(), 2);
        assert_eq!(cycle.entries(), &[a, b]);
        assert_eq!(cycle.paths(), vec!["/a", "/b"]);

        let corrected = detector.corrective_result(&session(), &cycle);
        assert_eq!(
            corrected.client_actions(),
            &[
                SyncAction::reset_directory(DirectoryVersion::new("/a", Checksum::new("a1"))),
                SyncAction::reset_directory(DirectoryVersion::new("/b", Checksum::new("b1"))),
            ]
        );
    }

    #[test]
    fn failed_resolution_uses_empty_version_for_that_path_only() {
        let detector = CycleDetector::new(
            DetectorConfig::default(),
            Versions::default().with("/a", "a1").failing("/b"),
        );
        let a = entry(upload("/a", "x.txt"), Some("/a"));
        let b = entry(upload("/b", "y.txt"), Some("/b"));
        let history = [a.clone(), b.clone(), a.clone(), b.clone(), a, b];

        let cycle = detector.detect(&history).unwrap();
        let corrected = detector.corrective_result(&session(), &cycle);
        assert_eq!(
            corrected.client_actions(),
            &[
                SyncAction::reset_directory(DirectoryVersion::new("/a", Checksum::new("a1"))),
                SyncAction::reset_directory(DirectoryVersion::empty("/b")),
            ]
        );
    }

    #[test]
    fn server_reset_is_opt_in() {
        let detector = CycleDetector::new(
            DetectorConfig::default().with_reset_server_directories(true),
            Versions::default(),
        );
        let history = vec![entry(sync_dir("/a"), None); 3];
        let cycle = detector.detect(&history).unwrap();
        let corrected = detector.corrective_result(&session(), &cycle);
        assert_eq!(corrected.server_actions(), &[SyncAction::reset_directories()]);
        assert_eq!(corrected.client_actions(), &[SyncAction::reset_directories()]);
    }

    #[test]
    fn file_rounds_do_not_trigger_detection() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let mut session = session();
        let round = upload("/a", "x.txt");
        for _ in 0..5 {
            assert_eq!(detector.track(&mut session, round.clone(), "/a"), round);
        }
        let history = session.parameters().get(&HISTORY_KEY).unwrap();
        assert_eq!(history.len(), 5);
        assert!(history.all().iter().all(|e| e.path() == Some("/a")));
    }

    #[test]
    fn file_rounds_name_the_directories_to_reset() {
        let detector = CycleDetector::new(
            DetectorConfig::default(),
            Versions::default().with("/a", "a1"),
        );
        let mut session = session();
        let listing = sync_dir("/a");
        let files = upload("/a", "x.txt");

        let mut last = SyncResult::empty();
        for _ in 0..3 {
            detector.track(&mut session, files.clone(), "/a");
            last = detector.track_and_check(&mut session, listing.clone());
        }

        assert_eq!(
            last.client_actions(),
            &[SyncAction::reset_directory(DirectoryVersion::new(
                "/a",
                Checksum::new("a1")
            ))]
        );
    }

    #[test]
    fn non_repeating_round_passes_through() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let mut session = session();
        for name in ["a", "b", "c", "d"] {
            let round = upload("/docs", name);
            assert_eq!(detector.track_and_check(&mut session, round.clone()), round);
        }
    }

    #[test]
    fn long_rounds_are_compared_in_compacted_form() {
        let detector = CycleDetector::new(
            DetectorConfig::default().with_max_history_entry_length(2),
            Versions::default(),
        );
        let mut session = session();
        let round = SyncResult::for_client(vec![
            SyncAction::RemoveDirectory { path: "/a".into() },
            SyncAction::RemoveDirectory { path: "/b".into() },
            SyncAction::RemoveDirectory { path: "/c".into() },
        ]);

        detector.track_and_check(&mut session, round.clone());
        detector.track_and_check(&mut session, round.clone());
        let history = session.parameters().get(&HISTORY_KEY).unwrap();
        assert!(history.all().iter().all(|e| e.result().is_compacted()));

        let corrected = detector.track_and_check(&mut session, round);
        assert_eq!(corrected.client_actions(), &[SyncAction::reset_directories()]);
    }

    #[test]
    fn history_is_created_lazily() {
        let detector = CycleDetector::new(
            DetectorConfig::default().with_max_history_size(5),
            Versions::default(),
        );
        let mut session = session();
        assert!(!session.parameters().contains(&HISTORY_KEY));

        for name in ["a", "b", "c", "d", "e", "f", "g"] {
            detector.track_and_check(&mut session, upload("/docs", name));
        }
        let history = session.parameters().get(&HISTORY_KEY).unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history.all()[0].result(), &upload("/docs", "c"));
    }

    #[test]
    fn empty_path_is_kept() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let mut session = session();

        let mut last = SyncResult::empty();
        for _ in 0..3 {
            detector.track(&mut session, upload("", "a.txt"), "");
            last = detector.track_and_check(&mut session, sync_dir("/a"));
        }

        assert_eq!(
            last.client_actions(),
            &[SyncAction::reset_directory(DirectoryVersion::empty(""))]
        );
    }

    #[test]
    fn detection_is_silent_unless_traced() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let round = sync_dir("/a");

        let quiet = captured_info_logs(|| {
            let mut session = session();
            for _ in 0..3 {
                detector.track_and_check(&mut session, round.clone());
            }
        });
        assert!(quiet.is_empty(), "unexpected output: {quiet}");

        let traced = captured_info_logs(|| {
            let mut session = session().with_trace(true);
            for _ in 0..3 {
                detector.track_and_check(&mut session, round.clone());
            }
        });
        assert!(traced.contains("Detected sync cycle"));
    }

    fn captured_info_logs(f: impl FnOnce()) -> String {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        struct Capture(Arc<Mutex<Vec<u8>>>);

        impl Write for Capture {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&buffer);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || Capture(Arc::clone(&writer)))
            .finish();
        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn trace_lists_rounds() {
        let detector = CycleDetector::new(DetectorConfig::default(), Versions::default());
        let history = vec![entry(upload("/a", "x.txt"), Some("/a")); 3];
        let cycle = detector.detect(&history).unwrap();

        let text = cycle.trace().to_string();
        assert!(text.starts_with("Detected sync cycle of 1 round(s), repeated 3 time(s)"));
        assert!(text.contains("1. /a: server=[] client=[UPLOAD /a x.txt [aa]]"));
    }
}
