//! Reference data for kernel tests.
//!
//! Expected values come from a trained model's tensors. [`TensorSource`] is
//! the seam; [`SafeTensorsCheckpoint`] reads them from `.safetensors` files.

pub mod checkpoint;
pub mod error;
pub mod source;

pub use checkpoint::SafeTensorsCheckpoint;
pub use error::{CheckpointError, Result};
pub use source::{MemorySource, ReferenceSet, TensorSource};
