//! One-call kernel execution on an owned compute context.

use crate::context::ComputeContext;
use crate::device::DeviceSelector;
use crate::launch::dispatch;
use crate::program::Program;
use crate::retrieve::retrieve;
use mokt_common::{ExecutionTiming, HostArray, LaunchGeometry, OutputDescriptor, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Where kernel source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelSource {
    Inline(String),
    File(PathBuf),
}

impl KernelSource {
    pub fn inline(source: impl Into<String>) -> Self {
        Self::Inline(source.into())
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

/// Outputs and device timing of one kernel run.
#[derive(Debug, Clone)]
pub struct KernelRun {
    pub kernel: String,
    pub outputs: Vec<HostArray>,
    pub timing: ExecutionTiming,
}

impl KernelRun {
    pub fn elapsed(&self) -> Duration {
        self.timing.elapsed()
    }
}

/// Owns a [`ComputeContext`] for the lifetime of a test session.
///
/// Every [`run_kernel`](Self::run_kernel) call compiles, uploads, dispatches
/// and retrieves from scratch; no device state carries over between runs.
#[derive(Debug)]
pub struct TestEnvironment {
    ctx: ComputeContext,
    build_options: String,
    timeout: Option<Duration>,
}

impl TestEnvironment {
    pub fn new(selector: &DeviceSelector) -> Result<Self> {
        Ok(Self::from_context(ComputeContext::create(selector)?))
    }

    pub fn from_context(ctx: ComputeContext) -> Self {
        Self { ctx, build_options: String::new(), timeout: None }
    }

    /// Compiler options passed to every build.
    pub fn with_build_options(mut self, options: impl Into<String>) -> Self {
        self.build_options = options.into();
        self
    }

    /// Fail runs whose dispatch does not complete within `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn context(&self) -> &ComputeContext {
        &self.ctx
    }

    /// Compile `source`. A file source must define `kernel_name`.
    pub fn program(&self, source: &KernelSource, kernel_name: &str) -> Result<Program<'_>> {
        match source {
            KernelSource::Inline(text) => {
                self.ctx.build_program_with_options(text, &self.build_options)
            }
            KernelSource::File(path) => {
                Program::from_file_with_options(&self.ctx, path, kernel_name, &self.build_options)
            }
        }
    }

    /// Compile, upload, dispatch, wait and retrieve.
    ///
    /// `inputs` bind first in the order given, then one output per
    /// descriptor. Every device buffer is released before this returns.
    pub fn run_kernel(
        &self,
        source: &KernelSource,
        kernel_name: &str,
        inputs: &[HostArray],
        outputs: &[OutputDescriptor],
        geometry: &LaunchGeometry,
    ) -> Result<KernelRun> {
        let program = self.program(source, kernel_name)?;
        let kernel = program.entry_point(kernel_name)?;

        let input_buffers = self.ctx.upload_all(inputs)?;
        let output_buffers = self.ctx.allocate_outputs(outputs)?;

        let handle = dispatch(&kernel, geometry, &input_buffers, &output_buffers)?;
        let timing = match self.timeout {
            Some(limit) => handle.wait_timeout(limit)?,
            None => handle.wait()?,
        };
        let results = retrieve(&handle, &output_buffers, outputs)?;

        info!(
            kernel = kernel_name,
            elapsed_ns = timing.elapsed().as_nanos() as u64,
            outputs = results.len(),
            "kernel run complete"
        );
        Ok(KernelRun { kernel: kernel_name.to_string(), outputs: results, timing })
    }
}
