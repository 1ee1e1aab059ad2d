//! `opencl3` implementation of the runtime handles.

use crate::codes::ClStatus;
use crate::device::{DeviceInfo, DeviceKind};
use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::{
    get_all_devices, Device, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU,
    CL_DEVICE_TYPE_GPU,
};
use opencl3::error_codes::ClError;
use opencl3::event::Event;
use opencl3::kernel::{ExecuteKernel, Kernel};
use opencl3::memory::{Buffer, ClMem, CL_MEM_COPY_HOST_PTR, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use opencl3::program::Program;
use opencl3::types::{cl_device_id, CL_NON_BLOCKING};
use std::ffi::c_void;
use tracing::debug;

fn status(e: ClError) -> ClStatus {
    ClStatus(e.0)
}

fn device_ids() -> Result<Vec<cl_device_id>, String> {
    get_all_devices(CL_DEVICE_TYPE_ALL)
        .map_err(|e| format!("OpenCL device enumeration failed: {}", status(e)))
}

fn describe(index: usize, id: cl_device_id) -> DeviceInfo {
    let device = Device::new(id);
    let kind = match device.dev_type() {
        Ok(t) if t & CL_DEVICE_TYPE_GPU != 0 => DeviceKind::Gpu,
        Ok(t) if t & CL_DEVICE_TYPE_CPU != 0 => DeviceKind::Cpu,
        Ok(t) if t & CL_DEVICE_TYPE_ACCELERATOR != 0 => DeviceKind::Accelerator,
        _ => DeviceKind::Other,
    };
    DeviceInfo {
        index,
        name: device.name().unwrap_or_default(),
        vendor: device.vendor().unwrap_or_default(),
        version: device.version().unwrap_or_default(),
        kind,
        compute_units: device.max_compute_units().unwrap_or(0),
        max_work_group_size: device.max_work_group_size().unwrap_or(0),
        global_mem_bytes: device.global_mem_size().unwrap_or(0),
        supports_fp64: device
            .extensions()
            .map(|ext| ext.contains("cl_khr_fp64"))
            .unwrap_or(false),
    }
}

pub(crate) fn enumerate_devices() -> Result<Vec<DeviceInfo>, String> {
    let ids = device_ids()?;
    Ok(ids.into_iter().enumerate().map(|(index, id)| describe(index, id)).collect())
}

/// Context plus its profiling-enabled in-order queue.
pub(crate) struct RawContext {
    // Field order is drop order: the queue goes before its context.
    queue: CommandQueue,
    context: Context,
}

impl RawContext {
    pub(crate) fn open(index: usize) -> Result<Self, String> {
        let ids = device_ids()?;
        let id = *ids
            .get(index)
            .ok_or_else(|| format!("device index {index} out of range ({} devices)", ids.len()))?;
        let device = Device::new(id);

        let context = Context::from_device(&device)
            .map_err(|e| format!("failed to create OpenCL context: {}", status(e)))?;
        let queue = CommandQueue::create_default_with_properties(
            &context,
            CL_QUEUE_PROFILING_ENABLE,
            0,
        )
        .map_err(|e| format!("failed to create command queue: {}", status(e)))?;

        Ok(Self { queue, context })
    }

    /// Compile `source`. The error is the compiler's build log.
    pub(crate) fn build(&self, source: &str, options: &str) -> Result<RawProgram, String> {
        Program::create_and_build_from_source(&self.context, source, options)
            .map(|program| RawProgram { program })
    }

    /// Read-only buffer initialised from `bytes` at creation.
    pub(crate) fn upload(&self, bytes: &[u8]) -> Result<RawBuffer, ClStatus> {
        // SAFETY: CL_MEM_COPY_HOST_PTR copies `bytes` during the call and the
        // runtime does not retain the pointer.
        let buffer = unsafe {
            Buffer::<u8>::create(
                &self.context,
                CL_MEM_READ_ONLY | CL_MEM_COPY_HOST_PTR,
                bytes.len(),
                bytes.as_ptr() as *mut c_void,
            )
        }
        .map_err(status)?;
        Ok(RawBuffer { buffer })
    }

    /// Uninitialised write-only buffer of `nbytes`.
    pub(crate) fn allocate(&self, nbytes: usize) -> Result<RawBuffer, ClStatus> {
        // SAFETY: no host pointer is passed.
        let buffer = unsafe {
            Buffer::<u8>::create(&self.context, CL_MEM_WRITE_ONLY, nbytes, std::ptr::null_mut())
        }
        .map_err(status)?;
        Ok(RawBuffer { buffer })
    }

    /// Enqueue `kernel` with `args` bound positionally.
    ///
    /// The caller has already checked `args.len()` against the kernel's
    /// declared argument count.
    pub(crate) fn enqueue(
        &self,
        kernel: &RawKernel,
        args: &[&RawBuffer],
        global: &[usize],
        local: Option<&[usize]>,
    ) -> Result<RawEvent, ClStatus> {
        let mut exec = ExecuteKernel::new(&kernel.kernel);
        for arg in args {
            // SAFETY: every argument is a live `cl_mem` owned by a DeviceBuffer
            // that outlives this call.
            unsafe {
                exec.set_arg(&arg.buffer.get());
            }
        }
        exec.set_global_work_sizes(global);
        if let Some(local) = local {
            exec.set_local_work_sizes(local);
        }
        // SAFETY: the argument count matches and the runtime retains the
        // memory objects until the command completes.
        let event = unsafe { exec.enqueue_nd_range(&self.queue) }.map_err(status)?;
        debug!(args = args.len(), ?global, ?local, "kernel enqueued");
        Ok(RawEvent { event })
    }

    /// Non-blocking copy of `buffer` into `dst`, ordered after `after`.
    ///
    /// # Safety
    ///
    /// `dst` must stay alive and must not be accessed until the returned
    /// event has completed.
    pub(crate) unsafe fn read_into(
        &self,
        buffer: &RawBuffer,
        dst: &mut [u8],
        after: &RawEvent,
    ) -> Result<RawEvent, ClStatus> {
        let wait_list = [after.event.get()];
        self.queue
            .enqueue_read_buffer(&buffer.buffer, CL_NON_BLOCKING, 0, dst, &wait_list)
            .map(|event| RawEvent { event })
            .map_err(status)
    }

    /// Block until every command on the queue has finished.
    pub(crate) fn finish(&self) -> Result<(), ClStatus> {
        self.queue.finish().map_err(status)
    }
}

pub(crate) struct RawProgram {
    program: Program,
}

impl RawProgram {
    pub(crate) fn kernel_names(&self) -> Vec<String> {
        self.program
            .kernel_names()
            .split(';')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect()
    }

    pub(crate) fn create_kernel(&self, name: &str) -> Result<RawKernel, ClStatus> {
        Kernel::create(&self.program, name).map(|kernel| RawKernel { kernel }).map_err(status)
    }
}

pub(crate) struct RawKernel {
    kernel: Kernel,
}

impl RawKernel {
    pub(crate) fn num_args(&self) -> Result<u32, ClStatus> {
        self.kernel.num_args().map_err(status)
    }
}

pub(crate) struct RawBuffer {
    buffer: Buffer<u8>,
}

pub(crate) struct RawEvent {
    event: Event,
}

impl RawEvent {
    pub(crate) fn wait(&self) -> Result<(), ClStatus> {
        self.event.wait().map_err(status)
    }

    /// Raw `CL_EVENT_COMMAND_EXECUTION_STATUS`.
    pub(crate) fn execution_status(&self) -> Result<i32, ClStatus> {
        self.event.command_execution_status().map(|s| s.0).map_err(status)
    }

    /// Device start and end timestamps in nanoseconds.
    pub(crate) fn profile(&self) -> Result<(u64, u64), ClStatus> {
        let start = self.event.profiling_command_start().map_err(status)?;
        let end = self.event.profiling_command_end().map_err(status)?;
        Ok((start, end))
    }
}
