//! Device-to-host copies of kernel outputs.

use crate::buffer::DeviceBuffer;
use crate::codes::ClStatus;
use crate::launch::ExecutionHandle;
use mokt_common::{HostArray, KernelTestError, OutputDescriptor, Result};
use tracing::debug;

fn transfer_error(index: usize, reason: impl Into<String>) -> KernelTestError {
    KernelTestError::TransferError { index, reason: reason.into() }
}

/// Copy every output buffer back to the host, in descriptor order.
///
/// Each copy waits on the execution event and runs non-blocking; all of them
/// are awaited before this returns, on the error path too.
pub fn retrieve(
    handle: &ExecutionHandle<'_>,
    outputs: &[DeviceBuffer<'_>],
    descriptors: &[OutputDescriptor],
) -> Result<Vec<HostArray>> {
    if outputs.len() != descriptors.len() {
        return Err(transfer_error(
            outputs.len().min(descriptors.len()),
            format!("{} output buffers but {} descriptors", outputs.len(), descriptors.len()),
        ));
    }
    for (index, (buffer, descriptor)) in outputs.iter().zip(descriptors).enumerate() {
        if buffer.descriptor() != *descriptor {
            return Err(transfer_error(
                index,
                format!(
                    "buffer holds {} x {} but descriptor asks for {} x {}",
                    buffer.len(),
                    buffer.element_type(),
                    descriptor.length,
                    descriptor.element_type
                ),
            ));
        }
    }

    let ctx = handle.context();
    let mut hosts: Vec<HostArray> = descriptors.iter().map(HostArray::zeros).collect();
    let mut pending = Vec::with_capacity(outputs.len());
    let mut failure = None;

    for (index, (buffer, host)) in outputs.iter().zip(hosts.iter_mut()).enumerate() {
        // SAFETY: `hosts` is neither touched nor dropped until every event in
        // `pending` has been waited on below.
        let enqueued = unsafe { ctx.raw().read_into(buffer.raw(), host.as_bytes_mut(), handle.raw()) };
        match enqueued {
            Ok(event) => pending.push((index, event)),
            Err(status) => {
                failure = Some(transfer_error(index, format!("cannot enqueue read: {status}")));
                break;
            }
        }
    }

    for (index, event) in &pending {
        let outcome = event.wait().and_then(|()| match event.execution_status()? {
            status if status < 0 => Err(ClStatus(status)),
            _ => Ok(()),
        });
        if let Err(status) = outcome {
            failure.get_or_insert_with(|| transfer_error(*index, format!("read did not complete: {status}")));
        }
    }
    drop(pending);

    if let Some(err) = failure {
        return Err(err);
    }
    debug!(outputs = hosts.len(), "retrieved outputs");
    Ok(hosts)
}
