//! Device timing, bytes moved and derived throughput.

use crate::score::{score_all, OutputReport, Tolerance};
use mokt_common::{gib_per_second, ExecutionTiming, HostArray};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Total bytes of every input plus every output.
///
/// A rough diagnostic: it ignores caching, reuse inside the kernel and any
/// bytes the kernel never touches.
pub fn bytes_moved(inputs: &[HostArray], outputs: &[HostArray]) -> usize {
    inputs.iter().chain(outputs).map(HostArray::nbytes).sum()
}

/// Performance figures for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub device_start_ns: u64,
    pub device_end_ns: u64,
    pub bytes_moved: usize,
    /// `None` when the device reported a zero-length interval.
    #[serde(with = "crate::float::option")]
    pub throughput_gib_s: Option<f64>,
    pub host: Option<HostBaseline>,
}

impl Profile {
    pub fn new(timing: ExecutionTiming, inputs: &[HostArray], outputs: &[HostArray]) -> Self {
        let bytes = bytes_moved(inputs, outputs);
        Self {
            device_start_ns: timing.start_ns,
            device_end_ns: timing.end_ns,
            bytes_moved: bytes,
            throughput_gib_s: gib_per_second(bytes, timing.elapsed()),
            host: None,
        }
    }

    pub fn device_time(&self) -> Duration {
        ExecutionTiming::new(self.device_start_ns, self.device_end_ns).elapsed()
    }

    /// Host time divided by device time, when both are non-zero.
    pub fn speedup(&self) -> Option<f64> {
        let host = self.host.as_ref()?.elapsed().as_secs_f64();
        let device = self.device_time().as_secs_f64();
        (host > 0.0 && device > 0.0).then(|| host / device)
    }
}

/// The same computation on the host, timed and scored against the same
/// expected outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostBaseline {
    pub elapsed_ns: u64,
    #[serde(with = "crate::float::option")]
    pub throughput_gib_s: Option<f64>,
    pub outputs: Vec<OutputReport>,
}

impl HostBaseline {
    pub fn new(
        elapsed: Duration,
        bytes_moved: usize,
        host_outputs: &[HostArray],
        expected: &[HostArray],
        tolerance: Tolerance,
    ) -> Self {
        Self {
            elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            throughput_gib_s: gib_per_second(bytes_moved, elapsed),
            outputs: score_all(expected, host_outputs, tolerance),
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns)
    }

    pub fn passed(&self) -> bool {
        self.outputs.iter().all(|o| o.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_count_inputs_and_outputs() {
        let inputs = vec![HostArray::from(vec![0.0f32; 4]), HostArray::from(vec![0.0f32; 4])];
        let outputs = vec![HostArray::from(vec![0u8; 3])];
        assert_eq!(bytes_moved(&inputs, &outputs), 35);
    }

    #[test]
    fn profile_throughput() {
        // 1 MiB in 1 ms.
        let inputs = vec![HostArray::from(vec![0u8; 1 << 19])];
        let outputs = vec![HostArray::from(vec![0u8; 1 << 19])];
        let profile = Profile::new(ExecutionTiming::new(0, 1_000_000), &inputs, &outputs);
        assert_eq!(profile.device_time(), Duration::from_millis(1));
        let rate = profile.throughput_gib_s.unwrap();
        assert!((rate - 1000.0 / 1024.0).abs() < 1e-9);
    }

    #[test]
    fn zero_interval_has_no_throughput() {
        let profile = Profile::new(ExecutionTiming::new(5, 5), &[HostArray::from(vec![1u8])], &[]);
        assert!(profile.throughput_gib_s.is_none());
        assert!(profile.speedup().is_none());
    }

    #[test]
    fn host_baseline_scores_and_speedup() {
        let expected = vec![HostArray::from(vec![1.0f32, 2.0])];
        let host = HostBaseline::new(Duration::from_micros(40), 16, &expected, &expected, Tolerance::default());
        assert!(host.passed());

        let mut profile = Profile::new(ExecutionTiming::new(0, 10_000), &expected, &expected);
        profile.host = Some(host);
        let speedup = profile.speedup().unwrap();
        assert!((speedup - 4.0).abs() < 1e-9);
    }
}
