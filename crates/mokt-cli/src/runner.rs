//! Command implementations: checkpoint-driven kernel tests, built-in
//! operation demos and device listing.

use crate::config::RunPlan;
use anyhow::{Context, Result};
use mokt_checkpoint::{ReferenceSet, SafeTensorsCheckpoint};
use mokt_common::{HostArray, LaunchGeometry, LocalSize, OutputDescriptor};
use mokt_opencl::{list_devices, DeviceInfo, DeviceSelector, KernelSource, TestEnvironment};
use mokt_ops::{random_inputs, run_timed, Operation, OperationRegistry};
use mokt_verify::{verify_and_profile, Tolerance, VerificationReport};
use std::time::Duration;
use tracing::{info, warn};

/// A finished run: the report plus the inputs it echoes on mismatch.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: VerificationReport,
    pub inputs: Vec<HostArray>,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.report.passed()
    }
}

fn environment(
    device: &DeviceSelector,
    build_options: &str,
    timeout: Option<Duration>,
) -> Result<TestEnvironment> {
    let mut env = TestEnvironment::new(device)
        .with_context(|| format!("failed to open compute device ({device})"))?
        .with_build_options(build_options);
    if let Some(limit) = timeout {
        env = env.with_timeout(limit);
    }
    Ok(env)
}

/// Load inputs and expected output from a checkpoint, run the kernel file
/// and verify it.
pub fn run_checkpoint(plan: &RunPlan, registry: &OperationRegistry) -> Result<RunOutcome> {
    let checkpoint = SafeTensorsCheckpoint::open(&plan.checkpoint)
        .with_context(|| format!("failed to open checkpoint {}", plan.checkpoint.display()))?;
    let refs = ReferenceSet::load(&checkpoint, plan.inputs.as_slice(), std::slice::from_ref(&plan.output))
        .context("failed to load reference tensors")?;

    let global = match &plan.global {
        Some(global) => global.clone(),
        None => vec![refs.inputs.first().map_or(0, HostArray::len)],
    };
    let geometry = LaunchGeometry::new(global, plan.local.clone())?;
    info!(kernel = %plan.kernel_name, source = %plan.cl_source.display(), %geometry, "running kernel test");

    let env = environment(&plan.device, &plan.build_options, plan.timeout)?;
    let run = env.run_kernel(
        &KernelSource::file(&plan.cl_source),
        &plan.kernel_name,
        &refs.inputs,
        &OutputDescriptor::for_expected(&refs.expected),
        &geometry,
    )?;

    let mut report = verify_and_profile(
        &plan.kernel_name,
        run.timing,
        &refs.inputs,
        &refs.expected,
        &run.outputs,
        plan.tolerance,
    );
    if plan.host_baseline {
        match registry.by_kernel_name(&plan.kernel_name) {
            Some(op) => report = attach_baseline(report, op, &refs.inputs, &refs.expected),
            None => warn!(kernel = %plan.kernel_name, "no host reference for this kernel; skipping baseline"),
        }
    }
    Ok(RunOutcome { report, inputs: refs.inputs })
}

fn attach_baseline(
    report: VerificationReport,
    op: &dyn Operation,
    inputs: &[HostArray],
    expected: &[HostArray],
) -> VerificationReport {
    match run_timed(op, inputs) {
        Ok(host) => report.with_host_baseline(host.elapsed, &host.outputs, expected),
        Err(e) => {
            warn!(op = op.name(), error = %e, "host baseline failed");
            report
        }
    }
}

/// Settings for a built-in operation demo.
#[derive(Debug, Clone)]
pub struct OpRun {
    pub name: String,
    pub len: usize,
    pub seed: u64,
    pub device: DeviceSelector,
    pub local: LocalSize,
    pub tolerance: Tolerance,
    pub timeout: Option<Duration>,
}

/// Run a built-in operation on random inputs. Expected values and the host
/// baseline both come from the operation's host reference.
pub fn run_operation(demo: &OpRun, registry: &OperationRegistry) -> Result<RunOutcome> {
    let op = registry.require(&demo.name)?;
    let inputs = random_inputs(op, demo.len, demo.seed);
    let host = run_timed(op, &inputs).context("host reference failed")?;
    let descriptors = op.output_descriptors(&inputs);

    let global = descriptors.first().map_or(demo.len, |d| d.length);
    let geometry = LaunchGeometry::new(vec![global], demo.local.clone())?;
    info!(op = op.name(), len = demo.len, seed = demo.seed, %geometry, "running built-in operation");

    let env = environment(&demo.device, "", demo.timeout)?;
    let run = env.run_kernel(
        &KernelSource::inline(op.source()),
        op.kernel_name(),
        &inputs,
        &descriptors,
        &geometry,
    )?;

    let report = verify_and_profile(
        op.kernel_name(),
        run.timing,
        &inputs,
        &host.outputs,
        &run.outputs,
        demo.tolerance,
    )
    .with_host_baseline(host.elapsed, &host.outputs, &host.outputs);
    Ok(RunOutcome { report, inputs })
}

/// Every OpenCL device on the host.
pub fn devices() -> Result<Vec<DeviceInfo>> {
    Ok(list_devices()?)
}
