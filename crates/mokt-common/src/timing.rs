//! Device timestamps and the derived human-readable figures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const GIB: f64 = (1u64 << 30) as f64;

/// Start and end of a completed dispatch on the device clock, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTiming {
    pub start_ns: u64,
    pub end_ns: u64,
}

impl ExecutionTiming {
    pub const fn new(start_ns: u64, end_ns: u64) -> Self {
        Self { start_ns, end_ns }
    }

    /// Wall time on the device. Saturates at zero if the driver reports an
    /// end before the start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.end_ns.saturating_sub(self.start_ns))
    }
}

/// Render a duration in the largest unit that keeps the value at or above 1.
pub fn format_duration(d: Duration) -> String {
    let ns = d.as_nanos();
    if ns < 1_000 {
        format!("{ns} ns")
    } else if ns < 1_000_000 {
        format!("{:.3} µs", ns as f64 / 1e3)
    } else if ns < 1_000_000_000 {
        format!("{:.3} ms", ns as f64 / 1e6)
    } else {
        format!("{:.3} s", d.as_secs_f64())
    }
}

/// Bytes per second expressed in GiB/s. `None` when `elapsed` is zero.
pub fn gib_per_second(bytes: usize, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    (secs > 0.0).then(|| bytes as f64 / GIB / secs)
}
