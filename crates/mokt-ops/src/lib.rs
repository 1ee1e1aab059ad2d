//! Built-in operations for the mokt harness.
//!
//! Each [`Operation`] carries an OpenCL kernel and a host implementation of
//! the same computation. The host side supplies expected values for demo runs
//! and the CPU baseline reported next to device timings.

pub mod baseline;
pub mod error;
pub mod kernels;
pub mod operation;
pub mod registry;

pub use baseline::{random_inputs, run_timed, HostRun};
pub use error::{OpError, Result};
pub use operation::{Add, CopyBytes, Operation, Relu, Scale2};
pub use registry::OperationRegistry;
