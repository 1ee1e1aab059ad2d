//! Timed host execution and demo input generation.

use crate::error::Result;
use crate::operation::Operation;
use mokt_common::HostArray;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outputs of a host reference run and the wall time it took.
#[derive(Debug, Clone)]
pub struct HostRun {
    pub outputs: Vec<HostArray>,
    pub elapsed: Duration,
}

/// Run `op`'s host reference under a monotonic clock.
pub fn run_timed(op: &dyn Operation, inputs: &[HostArray]) -> Result<HostRun> {
    let start = Instant::now();
    let outputs = op.host_reference(inputs)?;
    let elapsed = start.elapsed();
    debug!(op = op.name(), elapsed_ns = elapsed.as_nanos() as u64, "host reference finished");
    Ok(HostRun { outputs, elapsed })
}

/// Reproducible random inputs for `op`.
pub fn random_inputs(op: &dyn Operation, len: usize, seed: u64) -> Vec<HostArray> {
    let mut rng = StdRng::seed_from_u64(seed);
    op.random_inputs(len, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Add, Relu};

    #[test]
    fn timed_run_returns_reference_outputs() {
        let inputs = vec![HostArray::from(vec![1.0f32; 4]), HostArray::from(vec![2.0f32; 4])];
        let run = run_timed(&Add, &inputs).unwrap();
        assert_eq!(run.outputs, vec![HostArray::F32(vec![3.0; 4])]);
    }

    #[test]
    fn timed_run_propagates_errors() {
        assert!(run_timed(&Add, &[]).is_err());
    }

    #[test]
    fn seeds_are_reproducible() {
        assert_eq!(random_inputs(&Relu, 32, 42), random_inputs(&Relu, 32, 42));
        assert_ne!(random_inputs(&Relu, 32, 42), random_inputs(&Relu, 32, 43));
    }
}
