//! Server configuration.

use dirsync_cycle::DetectorConfig;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of concurrently open sessions.
    pub max_sessions: usize,
    /// Whether new sessions are opened with verbose tracing.
    pub trace_sessions: bool,
    /// Cycle detection settings.
    pub detector: DetectorConfig,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new() -> Self {
        Self {
            max_sessions: 1000,
            trace_sessions: false,
            detector: DetectorConfig::default(),
        }
    }

    /// Sets the maximum number of open sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Enables verbose tracing for all new sessions.
    pub fn with_trace_sessions(mut self, trace: bool) -> Self {
        self.trace_sessions = trace;
        self
    }

    /// Sets the cycle detection settings.
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
