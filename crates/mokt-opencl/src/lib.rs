//! OpenCL execution for the mokt kernel test harness.
//!
//! A [`ComputeContext`] owns one device and a profiling-enabled queue.
//! [`Program`]s compile against it, [`DeviceBuffer`]s are marshalled from
//! host arrays, [`dispatch`] launches a [`Kernel`] and [`retrieve`] copies the
//! outputs back. [`TestEnvironment`] runs the whole pipeline in one call.
//!
//! Build with the `opencl` feature to link the system OpenCL loader. Without
//! it every constructor fails with `DeviceUnavailable`.

mod backend;
pub mod buffer;
pub mod codes;
pub mod context;
pub mod device;
pub mod environment;
pub mod launch;
pub mod program;
pub mod retrieve;

pub use buffer::{Access, DeviceBuffer};
pub use codes::ClStatus;
pub use context::ComputeContext;
pub use device::{list_devices, DeviceInfo, DeviceKind, DeviceSelector};
pub use environment::{KernelRun, KernelSource, TestEnvironment};
pub use launch::{dispatch, ExecutionHandle};
pub use program::{Kernel, Program};
pub use retrieve::retrieve;

/// Whether this build can reach a real OpenCL runtime.
pub const fn opencl_enabled() -> bool {
    cfg!(feature = "opencl")
}
