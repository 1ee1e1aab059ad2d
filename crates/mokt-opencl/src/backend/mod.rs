//! Thin layer over the OpenCL runtime.
//!
//! With the `opencl` feature the handles wrap `opencl3` objects. Without it
//! they are uninhabited: device enumeration fails and nothing downstream can
//! ever be constructed.

#[cfg(feature = "opencl")]
mod cl;
#[cfg(feature = "opencl")]
pub(crate) use cl::{enumerate_devices, RawBuffer, RawContext, RawEvent, RawKernel, RawProgram};

#[cfg(not(feature = "opencl"))]
mod unavailable;
#[cfg(not(feature = "opencl"))]
pub(crate) use unavailable::{
    enumerate_devices, RawBuffer, RawContext, RawEvent, RawKernel, RawProgram,
};
