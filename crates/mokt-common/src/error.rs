//! Error taxonomy for kernel execution and verification.
//!
//! Every variant is an infrastructure failure. Verification mismatches are
//! never errors; they are reported through the verification report.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while acquiring a device, building programs, marshalling
/// buffers, dispatching kernels, or copying results back to the host.
#[derive(Debug, Error)]
pub enum KernelTestError {
    /// No compatible accelerator could be discovered or opened.
    #[error("no compatible compute device: {reason}")]
    DeviceUnavailable { reason: String },

    /// The kernel source failed to compile. `log` carries the compiler output.
    #[error("failed to compile {origin}:\n{log}")]
    CompilationError { origin: String, log: String },

    /// The requested entry point is not defined by the compiled program.
    #[error("kernel '{name}' not found in {origin} (available: {available})")]
    KernelNotFound { name: String, origin: String, available: String },

    /// The kernel source file does not exist.
    #[error("kernel source file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// An input array or output descriptor cannot back a device buffer.
    #[error("invalid {role} #{index}: {reason}")]
    InvalidDescriptor { role: BufferRole, index: usize, reason: String },

    /// Launch geometry rejected on the host or by the device.
    #[error("invalid work-group size{}: {reason}", dimension_suffix(.dimension))]
    InvalidWorkGroupSize { dimension: Option<usize>, reason: String },

    /// The number of bound buffers disagrees with the kernel signature.
    #[error(
        "kernel '{kernel}' declares {declared} arguments but {bound} buffers were bound \
         (inputs first, then outputs)"
    )]
    ArgumentCountMismatch { kernel: String, declared: u32, bound: usize },

    /// A device-to-host copy could not be enqueued or did not complete.
    #[error("transfer of output #{index} failed: {reason}")]
    TransferError { index: usize, reason: String },

    /// The device refused to enqueue or run a dispatch for another reason.
    #[error("dispatch of kernel '{kernel}' failed (code {code}): {reason}")]
    DispatchFailed { kernel: String, code: i32, reason: String },

    /// A host-side watchdog gave up waiting on an execution handle.
    #[error("kernel '{kernel}' did not complete within {limit:?}")]
    Timeout { kernel: String, limit: Duration },

    /// Device timestamps could not be read from a completed dispatch.
    #[error("profiling information unavailable: {0}")]
    Profiling(String),

    /// Reading a file failed for a reason other than it being absent.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which side of a dispatch a buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRole {
    Input,
    Output,
}

impl std::fmt::Display for BufferRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output descriptor"),
        }
    }
}

fn dimension_suffix(dimension: &Option<usize>) -> String {
    dimension.map(|d| format!(" in dimension {d}")).unwrap_or_default()
}

impl KernelTestError {
    pub fn device_unavailable<S: Into<String>>(reason: S) -> Self {
        Self::DeviceUnavailable { reason: reason.into() }
    }

    pub fn work_group<S: Into<String>>(dimension: Option<usize>, reason: S) -> Self {
        Self::InvalidWorkGroupSize { dimension, reason: reason.into() }
    }

    pub fn invalid_descriptor<S: Into<String>>(role: BufferRole, index: usize, reason: S) -> Self {
        Self::InvalidDescriptor { role, index, reason: reason.into() }
    }

    /// Resource-acquisition failures abort a run before any dispatch; the
    /// rest leave the compute context usable for another attempt.
    pub fn is_acquisition_failure(&self) -> bool {
        matches!(
            self,
            Self::DeviceUnavailable { .. }
                | Self::CompilationError { .. }
                | Self::KernelNotFound { .. }
                | Self::FileNotFound { .. }
                | Self::Io { .. }
        )
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, KernelTestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_group_error_names_dimension() {
        let err = KernelTestError::work_group(Some(0), "global size 10 is not divisible by 3");
        let msg = err.to_string();
        assert!(msg.contains("dimension 0"), "{msg}");
        assert!(msg.contains("not divisible"), "{msg}");
    }

    #[test]
    fn work_group_error_without_dimension() {
        let err = KernelTestError::work_group(None, "local size exceeds device limit");
        assert_eq!(err.to_string(), "invalid work-group size: local size exceeds device limit");
    }

    #[test]
    fn descriptor_error_names_role_and_index() {
        let err = KernelTestError::invalid_descriptor(BufferRole::Output, 2, "length must be positive");
        assert_eq!(err.to_string(), "invalid output descriptor #2: length must be positive");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = KernelTestError::FileNotFound { path: PathBuf::from("kernels/relu.cl") };
        assert!(err.to_string().contains("kernels/relu.cl"));
    }

    #[test]
    fn acquisition_classification() {
        assert!(KernelTestError::device_unavailable("none").is_acquisition_failure());
        assert!(!KernelTestError::TransferError { index: 0, reason: "lost".into() }
            .is_acquisition_failure());
        assert!(!KernelTestError::work_group(None, "x").is_acquisition_failure());
    }
}
