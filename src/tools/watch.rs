//! Simple stopwatch for measuring request durations.

use std::time::Instant;

/// A lightweight stopwatch reporting elapsed time in milliseconds.
pub struct Watch {
    start: Instant,
}

impl Watch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed time in (fractional) milliseconds since the watch was started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
