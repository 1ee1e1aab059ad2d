//! Host-side arrays and the output descriptors derived from them.

use crate::dtype::{Element, ElementType};
use serde::{Deserialize, Serialize};

/// A flat, typed host array. Kernel inputs, expected outputs and retrieved
/// results all travel as `HostArray`s.
#[derive(Debug, Clone, PartialEq)]
pub enum HostArray {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
}

/// Applies `$body` to the inner `Vec` of every variant, binding it as `$v`.
#[macro_export]
macro_rules! with_host_array {
    ($array:expr, $v:ident => $body:expr) => {
        match $array {
            $crate::HostArray::F32($v) => $body,
            $crate::HostArray::F64($v) => $body,
            $crate::HostArray::I8($v) => $body,
            $crate::HostArray::U8($v) => $body,
            $crate::HostArray::I16($v) => $body,
            $crate::HostArray::U16($v) => $body,
            $crate::HostArray::I32($v) => $body,
            $crate::HostArray::U32($v) => $body,
            $crate::HostArray::I64($v) => $body,
            $crate::HostArray::U64($v) => $body,
        }
    };
}

impl HostArray {
    /// A zero-filled array shaped by `descriptor`.
    pub fn zeros(descriptor: &OutputDescriptor) -> Self {
        let n = descriptor.length;
        match descriptor.element_type {
            ElementType::F32 => Self::F32(vec![0.0; n]),
            ElementType::F64 => Self::F64(vec![0.0; n]),
            ElementType::I8 => Self::I8(vec![0; n]),
            ElementType::U8 => Self::U8(vec![0; n]),
            ElementType::I16 => Self::I16(vec![0; n]),
            ElementType::U16 => Self::U16(vec![0; n]),
            ElementType::I32 => Self::I32(vec![0; n]),
            ElementType::U32 => Self::U32(vec![0; n]),
            ElementType::I64 => Self::I64(vec![0; n]),
            ElementType::U64 => Self::U64(vec![0; n]),
        }
    }

    /// Reinterpret native-endian bytes as an array of `element_type`.
    ///
    /// Returns `None` when `bytes.len()` is not a multiple of the element size.
    pub fn from_bytes(element_type: ElementType, bytes: &[u8]) -> Option<Self> {
        if bytes.len() % element_type.size_of() != 0 {
            return None;
        }
        let array = match element_type {
            ElementType::F32 => Self::F32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::F64 => Self::F64(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::I8 => Self::I8(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::U8 => Self::U8(bytes.to_vec()),
            ElementType::I16 => Self::I16(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::U16 => Self::U16(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::I32 => Self::I32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::U32 => Self::U32(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::I64 => Self::I64(bytemuck::pod_collect_to_vec(bytes)),
            ElementType::U64 => Self::U64(bytemuck::pod_collect_to_vec(bytes)),
        };
        Some(array)
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
            Self::I8(_) => ElementType::I8,
            Self::U8(_) => ElementType::U8,
            Self::I16(_) => ElementType::I16,
            Self::U16(_) => ElementType::U16,
            Self::I32(_) => ElementType::I32,
            Self::U32(_) => ElementType::U32,
            Self::I64(_) => ElementType::I64,
            Self::U64(_) => ElementType::U64,
        }
    }

    pub fn len(&self) -> usize {
        with_host_array!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the array contents in bytes.
    pub fn nbytes(&self) -> usize {
        self.len() * self.element_type().size_of()
    }

    /// The raw bytes of the array, in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        with_host_array!(self, v => bytemuck::cast_slice(v.as_slice()))
    }

    /// Mutable byte view, used as the destination of device-to-host copies.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        with_host_array!(self, v => bytemuck::cast_slice_mut(v.as_mut_slice()))
    }

    /// Element `index` widened to `f64`, for display and delta computation.
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        with_host_array!(self, v => v.get(index).map(|x| x.to_f64()))
    }

    /// All elements widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_host_array!(self, v => v.iter().map(|x| x.to_f64()).collect())
    }

    /// The output descriptor that would hold an array like this one.
    pub fn descriptor(&self) -> OutputDescriptor {
        OutputDescriptor::new(self.len(), self.element_type())
    }

    /// Borrow the contents as `&[T]` when `T` matches the element type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        if T::TYPE != self.element_type() {
            return None;
        }
        // Same element type, so the byte view is an exact `[T]`.
        bytemuck::try_cast_slice(self.as_bytes()).ok()
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for HostArray {
                fn from(v: Vec<$ty>) -> Self {
                    HostArray::$variant(v)
                }
            }

            impl From<&[$ty]> for HostArray {
                fn from(v: &[$ty]) -> Self {
                    HostArray::$variant(v.to_vec())
                }
            }
        )*
    };
}

impl_from_vec! {
    f32 => F32,
    f64 => F64,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
}

/// Length and element type of one kernel output.
///
/// Used only to size the write-only device buffer and the host array the
/// result is copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub length: usize,
    pub element_type: ElementType,
}

impl OutputDescriptor {
    pub const fn new(length: usize, element_type: ElementType) -> Self {
        Self { length, element_type }
    }

    /// Bytes needed to hold the output, or `None` on overflow.
    pub fn byte_len(&self) -> Option<usize> {
        self.length.checked_mul(self.element_type.size_of())
    }

    /// Descriptors matching each expected output, in order.
    pub fn for_expected(expected: &[HostArray]) -> Vec<OutputDescriptor> {
        expected.iter().map(HostArray::descriptor).collect()
    }
}
