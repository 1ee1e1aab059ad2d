//! Shared types for the mokt kernel test harness.
//!
//! Everything here is device independent: the error taxonomy, element types,
//! host arrays and output descriptors, launch geometry and device timing.

pub mod array;
pub mod dtype;
pub mod error;
pub mod geometry;
pub mod timing;

pub use array::{HostArray, OutputDescriptor};
pub use dtype::{Element, ElementType};
pub use error::{BufferRole, KernelTestError, Result};
pub use geometry::{parse_sizes, LaunchGeometry, LocalSize, MAX_DIMENSIONS};
pub use timing::{format_duration, gib_per_second, ExecutionTiming};
