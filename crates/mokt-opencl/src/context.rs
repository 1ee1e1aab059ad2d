//! The compute context: one device, one profiling-enabled queue.

use crate::backend::RawContext;
use crate::device::{list_devices, DeviceInfo, DeviceSelector};
use crate::program::Program;
use mokt_common::{KernelTestError, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Owns a device context and its command queue.
///
/// Programs, buffers and execution handles borrow the context, so it
/// outlives all of them. Dropping it drains the queue and releases the
/// runtime objects.
pub struct ComputeContext {
    raw: RawContext,
    info: DeviceInfo,
    live_buffers: AtomicUsize,
}

impl ComputeContext {
    /// Acquire the device chosen by `selector`.
    pub fn create(selector: &DeviceSelector) -> Result<Self> {
        let devices = list_devices()?;
        let info = selector.select(&devices).cloned().ok_or_else(|| {
            KernelTestError::device_unavailable(format!(
                "no device matches selector '{selector}' ({} enumerated)",
                devices.len()
            ))
        })?;

        let raw = RawContext::open(info.index).map_err(KernelTestError::device_unavailable)?;
        info!(
            device = %info.name,
            vendor = %info.vendor,
            kind = %info.kind,
            compute_units = info.compute_units,
            max_work_group = info.max_work_group_size,
            fp64 = info.supports_fp64,
            "compute context created"
        );

        Ok(Self { raw, info, live_buffers: AtomicUsize::new(0) })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Number of device buffers currently allocated from this context.
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.load(Ordering::SeqCst)
    }

    /// Compile inline kernel source.
    pub fn build_program(&self, source: impl AsRef<[u8]>) -> Result<Program<'_>> {
        self.build_program_with_options(source, "")
    }

    /// Compile inline kernel source with compiler options such as
    /// `-cl-fast-relaxed-math`.
    pub fn build_program_with_options(
        &self,
        source: impl AsRef<[u8]>,
        options: &str,
    ) -> Result<Program<'_>> {
        Program::build(self, source.as_ref(), options, "inline source".to_string())
    }

    pub(crate) fn raw(&self) -> &RawContext {
        &self.raw
    }

    pub(crate) fn buffer_acquired(&self) {
        self.live_buffers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn buffer_released(&self) {
        self.live_buffers.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for ComputeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeContext")
            .field("device", &self.info.name)
            .field("kind", &self.info.kind)
            .field("live_buffers", &self.live_buffers())
            .finish()
    }
}

impl Drop for ComputeContext {
    fn drop(&mut self) {
        if let Err(status) = self.raw.finish() {
            warn!(%status, "command queue did not drain cleanly");
        }
        debug!(device = %self.info.name, "compute context released");
    }
}
