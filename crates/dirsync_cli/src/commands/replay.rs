//! Replay command implementation.
//!
//! Feeds a recorded round log through a fresh session and cycle detector
//! and reports, round by round, what the detector would have sent back.

use dirsync_cycle::{
    CycleDetector, DetectedCycle, DetectorConfig, DirectoryVersionProvider, SessionId,
    SyncHistory, SyncSession, VersionError, VersionResult, HISTORY_KEY,
};
use dirsync_protocol::{Checksum, DirectoryVersion, SyncAction, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Result type for replay operations.
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Errors that can occur while replaying a round log.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line of the round log is not a valid round.
    #[error("invalid round on line {line}: {source}")]
    Round {
        /// 1-based line number.
        line: usize,
        /// Parse failure.
        source: serde_json::Error,
    },

    /// The versions file is not a path to checksum map.
    #[error("invalid versions file: {0}")]
    Versions(#[source] serde_json::Error),
}

/// One recorded round.
///
/// Rounds with a `path` are file rounds for that directory, the others are
/// directory rounds.
#[derive(Debug, Clone, Deserialize)]
pub struct Round {
    /// Directory of a file round.
    #[serde(default)]
    pub path: Option<String>,
    /// Actions for the server.
    #[serde(default)]
    pub server: Vec<SyncAction>,
    /// Actions for the client.
    #[serde(default)]
    pub client: Vec<SyncAction>,
}

impl Round {
    fn result(&self) -> SyncResult {
        SyncResult::new(self.server.clone(), self.client.clone())
    }
}

/// Outcome of a replayed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The round's actions were handed out unchanged.
    Pass,
    /// A cycle was detected and the actions were replaced.
    Cycle,
}

/// A detected cycle, in log terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    /// Round number at which the repetitions begin.
    pub start_round: usize,
    /// Rounds in the repeating unit.
    pub rounds: usize,
    /// Back-to-back occurrences of the unit.
    pub repetitions: usize,
    /// Directories reset by the correction.
    pub paths: Vec<String>,
}

/// Report line for one replayed round.
#[derive(Debug, Clone, Serialize)]
pub struct RoundOutcome {
    /// 1-based round number.
    pub round: usize,
    /// Directory of a file round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether the round was corrected.
    pub outcome: Outcome,
    /// The detected cycle, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<CycleInfo>,
    /// Actions handed out to the server.
    pub server: Vec<SyncAction>,
    /// Actions handed out to the client.
    pub client: Vec<SyncAction>,
}

/// Directory versions loaded from a JSON file.
///
/// Paths missing from the file resolve to the empty checksum.
#[derive(Debug, Default)]
pub struct FileVersions {
    versions: HashMap<String, Checksum>,
}

impl FileVersions {
    /// Loads a `{"/path": "checksum"}` map.
    pub fn load(path: &Path) -> ReplayResult<Self> {
        let file = File::open(path)?;
        let versions =
            serde_json::from_reader(BufReader::new(file)).map_err(ReplayError::Versions)?;
        Ok(Self { versions })
    }
}

impl DirectoryVersionProvider for FileVersions {
    fn directory_version(
        &self,
        _session: &SyncSession,
        path: &str,
    ) -> VersionResult<DirectoryVersion> {
        self.versions
            .get(path)
            .map(|checksum| DirectoryVersion::new(path, checksum.clone()))
            .ok_or_else(|| VersionError::NotFound(path.to_string()))
    }
}

/// Runs the replay command.
pub fn run(
    log: &Path,
    versions: Option<&Path>,
    config: DetectorConfig,
    trace: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = match versions {
        Some(path) => FileVersions::load(path)?,
        None => FileVersions::default(),
    };
    let detector = CycleDetector::new(config, provider);
    let outcomes = replay(BufReader::new(File::open(log)?), &detector, trace)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
        _ => {
            print_text_output(&outcomes);
        }
    }

    Ok(())
}

/// Replays every round of `reader` through `detector` in a fresh session.
///
/// Blank lines are skipped.
pub fn replay<R, P>(
    reader: R,
    detector: &CycleDetector<P>,
    trace: bool,
) -> ReplayResult<Vec<RoundOutcome>>
where
    R: BufRead,
    P: DirectoryVersionProvider,
{
    let mut session = SyncSession::new(SessionId::new()).with_trace(trace);
    let mut outcomes = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let round: Round = serde_json::from_str(line).map_err(|source| ReplayError::Round {
            line: index + 1,
            source,
        })?;
        let number = outcomes.len() + 1;

        let outcome = match &round.path {
            Some(path) => {
                let result = detector.track(&mut session, round.result(), path);
                passed(number, round.path.clone(), &result)
            }
            None => {
                let tracked = detector.track_and_detect(&mut session, round.result());
                match &tracked.cycle {
                    Some(cycle) => corrected(number, &session, cycle, &tracked.result),
                    None => passed(number, None, &tracked.result),
                }
            }
        };
        debug!(round = number, outcome = ?outcome.outcome, "replayed round");
        outcomes.push(outcome);
    }

    Ok(outcomes)
}

fn passed(round: usize, path: Option<String>, result: &SyncResult) -> RoundOutcome {
    RoundOutcome {
        round,
        path,
        outcome: Outcome::Pass,
        cycle: None,
        server: result.server_actions().to_vec(),
        client: result.client_actions().to_vec(),
    }
}

fn corrected(
    round: usize,
    session: &SyncSession,
    cycle: &DetectedCycle,
    result: &SyncResult,
) -> RoundOutcome {
    // The history window ends at this round; older rounds may be evicted.
    let window = session
        .parameters()
        .get(&HISTORY_KEY)
        .map_or(0, SyncHistory::len);
    let first_round = round + 1 - window;

    RoundOutcome {
        round,
        path: None,
        outcome: Outcome::Cycle,
        cycle: Some(CycleInfo {
            start_round: first_round + cycle.start(),
            rounds: cycle.entries().len(),
            repetitions: cycle.repetitions(),
            paths: cycle.paths().into_iter().map(str::to_string).collect(),
        }),
        server: result.server_actions().to_vec(),
        client: result.client_actions().to_vec(),
    }
}

fn print_text_output(outcomes: &[RoundOutcome]) {
    for outcome in outcomes {
        let label = match &outcome.path {
            Some(path) => format!("round {} [{}]", outcome.round, path),
            None => format!("round {}", outcome.round),
        };
        match &outcome.cycle {
            Some(cycle) => {
                println!(
                    "{}: cycle of {} round(s) x{} since round {}",
                    label, cycle.rounds, cycle.repetitions, cycle.start_round
                );
                for action in outcome.client.iter() {
                    println!("  client: {}", action);
                }
                for action in outcome.server.iter() {
                    println!("  server: {}", action);
                }
            }
            None => {
                println!(
                    "{}: pass ({} action(s))",
                    label,
                    outcome.server.len() + outcome.client.len()
                );
            }
        }
    }

    let cycles = outcomes
        .iter()
        .filter(|o| o.outcome == Outcome::Cycle)
        .count();
    println!();
    println!("{} round(s), {} cycle(s) detected", outcomes.len(), cycles);
}
