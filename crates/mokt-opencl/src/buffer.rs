//! Device buffers for one kernel invocation.

use crate::backend::RawBuffer;
use crate::codes::ClStatus;
use crate::context::ComputeContext;
use mokt_common::{BufferRole, ElementType, HostArray, KernelTestError, OutputDescriptor, Result};
use std::fmt;
use tracing::debug;

/// How the kernel is allowed to use a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Populated from host data at creation.
    ReadOnly,
    /// Populated by kernel execution.
    WriteOnly,
}

/// Device memory bound to one kernel argument.
///
/// Released on drop. Buffers are never pooled or reused across invocations.
pub struct DeviceBuffer<'ctx> {
    ctx: &'ctx ComputeContext,
    raw: RawBuffer,
    access: Access,
    element_type: ElementType,
    len: usize,
}

impl<'ctx> DeviceBuffer<'ctx> {
    pub fn access(&self) -> Access {
        self.access
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len * self.element_type.size_of()
    }

    pub fn descriptor(&self) -> OutputDescriptor {
        OutputDescriptor::new(self.len, self.element_type)
    }

    pub(crate) fn raw(&self) -> &RawBuffer {
        &self.raw
    }

    pub(crate) fn context(&self) -> &'ctx ComputeContext {
        self.ctx
    }
}

impl fmt::Debug for DeviceBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("access", &self.access)
            .field("element_type", &self.element_type)
            .field("len", &self.len)
            .finish()
    }
}

impl Drop for DeviceBuffer<'_> {
    fn drop(&mut self) {
        self.ctx.buffer_released();
    }
}

fn allocation_failed(role: BufferRole, index: usize, bytes: usize, status: ClStatus) -> KernelTestError {
    let reason = if status.is_allocation_error() {
        format!("device cannot allocate {bytes} bytes: {status}")
    } else {
        format!("buffer creation failed: {status}")
    };
    KernelTestError::invalid_descriptor(role, index, reason)
}

impl ComputeContext {
    /// Read-only buffer holding a copy of `array`.
    ///
    /// The copy happens at creation, so it is complete before any dispatch.
    pub fn upload(&self, array: &HostArray) -> Result<DeviceBuffer<'_>> {
        self.upload_at(0, array)
    }

    /// Write-only buffer of `length * size_of(element_type)` bytes.
    pub fn allocate_output(&self, descriptor: &OutputDescriptor) -> Result<DeviceBuffer<'_>> {
        self.allocate_output_at(0, descriptor)
    }

    /// Upload every input, in order. Errors name the offending input.
    pub fn upload_all(&self, inputs: &[HostArray]) -> Result<Vec<DeviceBuffer<'_>>> {
        inputs.iter().enumerate().map(|(index, array)| self.upload_at(index, array)).collect()
    }

    /// Allocate one output buffer per descriptor, in order.
    pub fn allocate_outputs(
        &self,
        descriptors: &[OutputDescriptor],
    ) -> Result<Vec<DeviceBuffer<'_>>> {
        descriptors
            .iter()
            .enumerate()
            .map(|(index, descriptor)| self.allocate_output_at(index, descriptor))
            .collect()
    }

    fn upload_at(&self, index: usize, array: &HostArray) -> Result<DeviceBuffer<'_>> {
        if array.is_empty() {
            return Err(KernelTestError::invalid_descriptor(
                BufferRole::Input,
                index,
                "input array is empty",
            ));
        }
        let bytes = array.as_bytes();
        let raw = self
            .raw()
            .upload(bytes)
            .map_err(|status| allocation_failed(BufferRole::Input, index, bytes.len(), status))?;
        self.buffer_acquired();
        debug!(index, element_type = %array.element_type(), len = array.len(), "uploaded input");

        Ok(DeviceBuffer {
            ctx: self,
            raw,
            access: Access::ReadOnly,
            element_type: array.element_type(),
            len: array.len(),
        })
    }

    fn allocate_output_at(
        &self,
        index: usize,
        descriptor: &OutputDescriptor,
    ) -> Result<DeviceBuffer<'_>> {
        if descriptor.length == 0 {
            return Err(KernelTestError::invalid_descriptor(
                BufferRole::Output,
                index,
                "length must be positive",
            ));
        }
        let bytes = descriptor.byte_len().ok_or_else(|| {
            KernelTestError::invalid_descriptor(
                BufferRole::Output,
                index,
                format!(
                    "{} elements of {} overflow the address space",
                    descriptor.length, descriptor.element_type
                ),
            )
        })?;
        let raw = self
            .raw()
            .allocate(bytes)
            .map_err(|status| allocation_failed(BufferRole::Output, index, bytes, status))?;
        self.buffer_acquired();
        debug!(index, element_type = %descriptor.element_type, len = descriptor.length, "allocated output");

        Ok(DeviceBuffer {
            ctx: self,
            raw,
            access: Access::WriteOnly,
            element_type: descriptor.element_type,
            len: descriptor.length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_failure_mentions_size() {
        let err = allocation_failed(BufferRole::Output, 1, 4096, ClStatus(-4));
        let msg = err.to_string();
        assert!(msg.contains("output descriptor #1"), "{msg}");
        assert!(msg.contains("4096 bytes"), "{msg}");
        assert!(msg.contains("CL_MEM_OBJECT_ALLOCATION_FAILURE"), "{msg}");
    }

    #[test]
    fn other_creation_failures_keep_status() {
        let err = allocation_failed(BufferRole::Input, 0, 16, ClStatus(-30));
        assert!(err.to_string().contains("CL_INVALID_VALUE"));
    }
}
