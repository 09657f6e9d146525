//! Configuration for cycle detection.

/// Default number of back-to-back repetitions that make a cycle.
pub const DEFAULT_MIN_REPETITION_COUNT: usize = 3;
/// Default minimum number of rounds in a repeating unit.
pub const DEFAULT_MIN_SEQUENCE_LENGTH: usize = 1;
/// Default number of rounds kept per session.
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 50;
/// Default action count above which a round is stored compacted.
pub const DEFAULT_MAX_HISTORY_ENTRY_LENGTH: usize = 10;

/// Configuration for the cycle detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Repetitions a unit needs before it counts as a cycle.
    pub min_repetition_count: usize,
    /// Rounds a unit needs before it counts as a cycle.
    pub min_sequence_length: usize,
    /// Rounds kept per session; older rounds are evicted first.
    pub max_history_size: usize,
    /// Rounds with more actions than this are stored compacted unless the
    /// session is traced.
    pub max_history_entry_length: usize,
    /// Whether corrective reset actions are also sent to the server side.
    pub reset_server_directories: bool,
}

impl DetectorConfig {
    /// Creates a configuration with the default thresholds.
    pub fn new() -> Self {
        Self {
            min_repetition_count: DEFAULT_MIN_REPETITION_COUNT,
            min_sequence_length: DEFAULT_MIN_SEQUENCE_LENGTH,
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            max_history_entry_length: DEFAULT_MAX_HISTORY_ENTRY_LENGTH,
            reset_server_directories: false,
        }
    }

    /// Sets the minimum repetition count.
    pub fn with_min_repetition_count(mut self, count: usize) -> Self {
        self.min_repetition_count = count;
        self
    }

    /// Sets the minimum sequence length.
    pub fn with_min_sequence_length(mut self, length: usize) -> Self {
        self.min_sequence_length = length;
        self
    }

    /// Sets the history capacity.
    pub fn with_max_history_size(mut self, size: usize) -> Self {
        self.max_history_size = size;
        self
    }

    /// Sets the action count above which rounds are compacted.
    pub fn with_max_history_entry_length(mut self, length: usize) -> Self {
        self.max_history_entry_length = length;
        self
    }

    /// Enables or disables server-side reset actions.
    pub fn with_reset_server_directories(mut self, enabled: bool) -> Self {
        self.reset_server_directories = enabled;
        self
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new()
    }
}
