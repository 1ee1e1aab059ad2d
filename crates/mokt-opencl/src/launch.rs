//! Kernel dispatch and execution handles.

use crate::backend::RawEvent;
use crate::buffer::DeviceBuffer;
use crate::codes::{ClStatus, CL_COMPLETE};
use crate::context::ComputeContext;
use crate::program::Kernel;
use mokt_common::{BufferRole, ExecutionTiming, KernelTestError, LaunchGeometry, Result};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_START: Duration = Duration::from_micros(50);
const POLL_MAX: Duration = Duration::from_millis(10);

/// Enqueue `kernel` over `geometry`.
///
/// Buffers bind positionally: `inputs` in the order given, then `outputs` in
/// descriptor order. That order must match the kernel signature; only the
/// total count can be checked here.
pub fn dispatch<'k>(
    kernel: &Kernel<'k>,
    geometry: &LaunchGeometry,
    inputs: &[DeviceBuffer<'_>],
    outputs: &[DeviceBuffer<'_>],
) -> Result<ExecutionHandle<'k>> {
    let ctx = kernel.context();
    let bound = inputs.len() + outputs.len();
    if bound != kernel.declared_args() as usize {
        return Err(KernelTestError::ArgumentCountMismatch {
            kernel: kernel.name().to_string(),
            declared: kernel.declared_args(),
            bound,
        });
    }

    let max_group = ctx.info().max_work_group_size;
    if let Some(items) = geometry.work_group_items() {
        if max_group > 0 && items > max_group {
            return Err(KernelTestError::work_group(
                None,
                format!("work-group of {items} items exceeds the device maximum of {max_group}"),
            ));
        }
    }

    check_owner(ctx, BufferRole::Input, inputs)?;
    check_owner(ctx, BufferRole::Output, outputs)?;

    let args: Vec<_> = inputs.iter().chain(outputs).map(DeviceBuffer::raw).collect();
    let raw = ctx
        .raw()
        .enqueue(kernel.raw(), &args, geometry.global(), geometry.local())
        .map_err(|status| enqueue_error(kernel.name(), geometry, status))?;
    debug!(kernel = kernel.name(), %geometry, "dispatched");

    Ok(ExecutionHandle { ctx, raw, kernel: kernel.name().to_string() })
}

fn check_owner(ctx: &ComputeContext, role: BufferRole, buffers: &[DeviceBuffer<'_>]) -> Result<()> {
    match buffers.iter().position(|b| !std::ptr::eq(b.context(), ctx)) {
        Some(index) => Err(KernelTestError::invalid_descriptor(
            role,
            index,
            "buffer belongs to a different compute context",
        )),
        None => Ok(()),
    }
}

fn enqueue_error(kernel: &str, geometry: &LaunchGeometry, status: ClStatus) -> KernelTestError {
    if status.is_geometry_error() {
        KernelTestError::work_group(None, format!("device rejected {geometry}: {status}"))
    } else {
        KernelTestError::DispatchFailed {
            kernel: kernel.to_string(),
            code: status.code(),
            reason: format!("enqueue failed: {status}"),
        }
    }
}

/// Token for a submitted dispatch.
///
/// Dropping a handle without waiting is safe: the runtime keeps every memory
/// object the command references alive until it completes.
pub struct ExecutionHandle<'ctx> {
    ctx: &'ctx ComputeContext,
    raw: RawEvent,
    kernel: String,
}

impl<'ctx> ExecutionHandle<'ctx> {
    pub fn kernel_name(&self) -> &str {
        &self.kernel
    }

    /// Block until the dispatch finishes, then read its device timestamps.
    pub fn wait(&self) -> Result<ExecutionTiming> {
        self.raw.wait().map_err(|status| self.failed(status))?;
        self.check_status()?;
        self.timing()
    }

    /// Like [`wait`](Self::wait), but give up after `limit` with
    /// [`KernelTestError::Timeout`].
    pub fn wait_timeout(&self, limit: Duration) -> Result<ExecutionTiming> {
        let deadline = Instant::now() + limit;
        let mut pause = POLL_START;
        loop {
            if self.is_complete()? {
                return self.timing();
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(kernel = %self.kernel, ?limit, "dispatch timed out");
                return Err(KernelTestError::Timeout { kernel: self.kernel.clone(), limit });
            }
            std::thread::sleep(pause.min(deadline - now));
            pause = (pause * 2).min(POLL_MAX);
        }
    }

    /// Non-blocking completion check. A failed dispatch is an error.
    pub fn is_complete(&self) -> Result<bool> {
        Ok(self.check_status()? == CL_COMPLETE)
    }

    /// Device start/end timestamps. Only meaningful once complete.
    pub fn timing(&self) -> Result<ExecutionTiming> {
        let (start_ns, end_ns) = self
            .raw
            .profile()
            .map_err(|status| KernelTestError::Profiling(format!("kernel '{}': {status}", self.kernel)))?;
        Ok(ExecutionTiming::new(start_ns, end_ns))
    }

    pub fn context(&self) -> &'ctx ComputeContext {
        self.ctx
    }

    pub(crate) fn raw(&self) -> &RawEvent {
        &self.raw
    }

    fn check_status(&self) -> Result<i32> {
        let status = self.raw.execution_status().map_err(|status| self.failed(status))?;
        if status < 0 {
            return Err(self.failed(ClStatus(status)));
        }
        Ok(status)
    }

    fn failed(&self, status: ClStatus) -> KernelTestError {
        KernelTestError::DispatchFailed {
            kernel: self.kernel.clone(),
            code: status.code(),
            reason: format!("execution failed: {status}"),
        }
    }
}

impl fmt::Debug for ExecutionHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionHandle").field("kernel", &self.kernel).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{CL_INVALID_WORK_GROUP_SIZE, CL_OUT_OF_RESOURCES};
    use mokt_common::LocalSize;

    fn geometry() -> LaunchGeometry {
        LaunchGeometry::new(vec![8], LocalSize::Explicit(vec![4])).unwrap()
    }

    #[test]
    fn device_geometry_rejection_maps_to_work_group_error() {
        let err = enqueue_error("relu", &geometry(), ClStatus(CL_INVALID_WORK_GROUP_SIZE));
        match err {
            KernelTestError::InvalidWorkGroupSize { dimension, reason } => {
                assert_eq!(dimension, None);
                assert!(reason.contains("global=(8) local=(4)"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn other_enqueue_failures_keep_code() {
        let err = enqueue_error("relu", &geometry(), ClStatus(CL_OUT_OF_RESOURCES));
        assert!(matches!(
            err,
            KernelTestError::DispatchFailed { code: CL_OUT_OF_RESOURCES, ref kernel, .. } if kernel == "relu"
        ));
    }
}
