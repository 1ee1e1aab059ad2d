//! The [`Operation`] trait and the built-in operations.

use crate::error::{OpError, Result};
use crate::kernels;
use mokt_common::{ElementType, HostArray, OutputDescriptor};
use rand::rngs::StdRng;
use rand::Rng;

/// A kernel paired with a host implementation of the same computation.
pub trait Operation: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Other names the registry accepts.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Entry point defined by [`source`](Self::source).
    fn kernel_name(&self) -> &'static str;

    /// OpenCL C source.
    fn source(&self) -> &'static str;

    /// Number of input arrays.
    fn arity(&self) -> usize;

    /// Compute the outputs on the host.
    fn host_reference(&self, inputs: &[HostArray]) -> Result<Vec<HostArray>>;

    /// Shapes of the outputs for `inputs`. Defaults to one output shaped like
    /// the first input.
    fn output_descriptors(&self, inputs: &[HostArray]) -> Vec<OutputDescriptor> {
        inputs.first().map(HostArray::descriptor).into_iter().collect()
    }

    /// Random inputs of `len` elements each, for demo runs. Defaults to
    /// `f32` values uniform in `[0, 1)`.
    fn random_inputs(&self, len: usize, rng: &mut StdRng) -> Vec<HostArray> {
        (0..self.arity())
            .map(|_| HostArray::F32((0..len).map(|_| rng.gen::<f32>()).collect()))
            .collect()
    }
}

/// Borrow `inputs` as `f32` slices of equal length, checking arity first.
fn f32_inputs<'a>(op: &'static str, arity: usize, inputs: &'a [HostArray]) -> Result<Vec<&'a [f32]>> {
    if inputs.len() != arity {
        return Err(OpError::Arity { op, expected: arity, got: inputs.len() });
    }
    let slices = inputs
        .iter()
        .enumerate()
        .map(|(index, array)| {
            array.as_slice::<f32>().ok_or(OpError::ElementType {
                op,
                index,
                expected: ElementType::F32,
                got: array.element_type(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if let Some(other) = slices.iter().map(|s| s.len()).find(|&n| n != slices[0].len()) {
        return Err(OpError::LengthMismatch { op, first: slices[0].len(), other });
    }
    Ok(slices)
}

/// `out[i] = a[i] + b[i]`
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl Operation for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["sum"]
    }

    fn kernel_name(&self) -> &'static str {
        "add"
    }

    fn source(&self) -> &'static str {
        kernels::ADD_SRC
    }

    fn arity(&self) -> usize {
        2
    }

    fn host_reference(&self, inputs: &[HostArray]) -> Result<Vec<HostArray>> {
        let xs = f32_inputs(self.name(), self.arity(), inputs)?;
        let out: Vec<f32> = xs[0].iter().zip(xs[1]).map(|(a, b)| a + b).collect();
        Ok(vec![out.into()])
    }
}

/// `out[i] = max(in[i], 0)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Relu;

impl Operation for Relu {
    fn name(&self) -> &'static str {
        "relu"
    }

    fn kernel_name(&self) -> &'static str {
        "relu"
    }

    fn source(&self) -> &'static str {
        kernels::RELU_SRC
    }

    fn arity(&self) -> usize {
        1
    }

    fn host_reference(&self, inputs: &[HostArray]) -> Result<Vec<HostArray>> {
        let xs = f32_inputs(self.name(), self.arity(), inputs)?;
        let out: Vec<f32> = xs[0].iter().map(|&x| if x < 0.0 { 0.0 } else { x }).collect();
        Ok(vec![out.into()])
    }

    /// Uniform in `[-3, 2)` so roughly half the inputs are clamped.
    fn random_inputs(&self, len: usize, rng: &mut StdRng) -> Vec<HostArray> {
        vec![HostArray::F32((0..len).map(|_| rng.gen::<f32>() * 5.0 - 3.0).collect())]
    }
}

/// `out[i] = in[i] * 2`
#[derive(Debug, Clone, Copy, Default)]
pub struct Scale2;

impl Operation for Scale2 {
    fn name(&self) -> &'static str {
        "scale2"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["double"]
    }

    fn kernel_name(&self) -> &'static str {
        "scale2"
    }

    fn source(&self) -> &'static str {
        kernels::SCALE2_SRC
    }

    fn arity(&self) -> usize {
        1
    }

    fn host_reference(&self, inputs: &[HostArray]) -> Result<Vec<HostArray>> {
        let xs = f32_inputs(self.name(), self.arity(), inputs)?;
        let out: Vec<f32> = xs[0].iter().map(|x| x * 2.0).collect();
        Ok(vec![out.into()])
    }
}

/// Byte-for-byte copy of an array of any element type.
///
/// The output is always `uint8` with one element per input byte, so launch
/// it with a global size of `input.nbytes()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyBytes;

impl Operation for CopyBytes {
    fn name(&self) -> &'static str {
        "copy_bytes"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["copy", "passthrough"]
    }

    fn kernel_name(&self) -> &'static str {
        "copy_bytes"
    }

    fn source(&self) -> &'static str {
        kernels::COPY_BYTES_SRC
    }

    fn arity(&self) -> usize {
        1
    }

    fn host_reference(&self, inputs: &[HostArray]) -> Result<Vec<HostArray>> {
        match inputs {
            [input] => Ok(vec![HostArray::U8(input.as_bytes().to_vec())]),
            _ => Err(OpError::Arity { op: self.name(), expected: 1, got: inputs.len() }),
        }
    }

    fn output_descriptors(&self, inputs: &[HostArray]) -> Vec<OutputDescriptor> {
        inputs
            .first()
            .map(|input| OutputDescriptor::new(input.nbytes(), ElementType::U8))
            .into_iter()
            .collect()
    }
}
