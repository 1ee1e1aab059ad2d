//! Stand-in handles for builds without the `opencl` feature.
//!
//! Every handle type is uninhabited, so methods on them are unreachable.

use crate::codes::ClStatus;
use crate::device::DeviceInfo;

const NOT_BUILT: &str = "mokt was built without the `opencl` feature";

pub(crate) fn enumerate_devices() -> Result<Vec<DeviceInfo>, String> {
    Err(NOT_BUILT.to_string())
}

pub(crate) enum RawContext {}

impl RawContext {
    pub(crate) fn open(_index: usize) -> Result<Self, String> {
        Err(NOT_BUILT.to_string())
    }

    pub(crate) fn build(&self, _source: &str, _options: &str) -> Result<RawProgram, String> {
        match *self {}
    }

    pub(crate) fn upload(&self, _bytes: &[u8]) -> Result<RawBuffer, ClStatus> {
        match *self {}
    }

    pub(crate) fn allocate(&self, _nbytes: usize) -> Result<RawBuffer, ClStatus> {
        match *self {}
    }

    pub(crate) fn enqueue(
        &self,
        _kernel: &RawKernel,
        _args: &[&RawBuffer],
        _global: &[usize],
        _local: Option<&[usize]>,
    ) -> Result<RawEvent, ClStatus> {
        match *self {}
    }

    /// # Safety
    ///
    /// Same contract as the OpenCL implementation; never callable here.
    pub(crate) unsafe fn read_into(
        &self,
        _buffer: &RawBuffer,
        _dst: &mut [u8],
        _after: &RawEvent,
    ) -> Result<RawEvent, ClStatus> {
        match *self {}
    }

    pub(crate) fn finish(&self) -> Result<(), ClStatus> {
        match *self {}
    }
}

pub(crate) enum RawProgram {}

impl RawProgram {
    pub(crate) fn kernel_names(&self) -> Vec<String> {
        match *self {}
    }

    pub(crate) fn create_kernel(&self, _name: &str) -> Result<RawKernel, ClStatus> {
        match *self {}
    }
}

pub(crate) enum RawKernel {}

impl RawKernel {
    pub(crate) fn num_args(&self) -> Result<u32, ClStatus> {
        match *self {}
    }
}

pub(crate) enum RawBuffer {}

pub(crate) enum RawEvent {}

impl RawEvent {
    pub(crate) fn wait(&self) -> Result<(), ClStatus> {
        match *self {}
    }

    pub(crate) fn execution_status(&self) -> Result<i32, ClStatus> {
        match *self {}
    }

    pub(crate) fn profile(&self) -> Result<(u64, u64), ClStatus> {
        match *self {}
    }
}
