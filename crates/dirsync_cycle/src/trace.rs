//! Human-readable dumps of detected cycles.

use crate::detector::DetectedCycle;
use std::fmt;

/// Renders a [`DetectedCycle`] for session tracing.
///
/// ```text
/// Detected sync cycle of 2 round(s), repeated 3 time(s), starting at round 4:
///   1. /docs: server=[] client=[UPLOAD /docs a.txt [aa]]
///   2. <directories>: server=[] client=[SYNC_DIRECTORY /docs [bb]]
/// ```
pub struct CycleTrace<'a> {
    cycle: &'a DetectedCycle,
}

impl<'a> CycleTrace<'a> {
    /// Creates a trace of `cycle`.
    pub fn new(cycle: &'a DetectedCycle) -> Self {
        Self { cycle }
    }
}

impl fmt::Display for CycleTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Detected sync cycle of {} round(s), repeated {} time(s), starting at round {}:",
            self.cycle.entries().len(),
            self.cycle.repetitions(),
            self.cycle.start() + 1
        )?;
        for (i, entry) in self.cycle.entries().iter().enumerate() {
            write!(f, "\n  {}. {entry}", i + 1)?;
        }
        Ok(())
    }
}
