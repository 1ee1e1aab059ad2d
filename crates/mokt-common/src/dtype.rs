//! Element types that can back host arrays and device buffers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric element type of a host array or device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    F32,
    F64,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl ElementType {
    pub const ALL: [ElementType; 10] = [
        Self::F32,
        Self::F64,
        Self::I8,
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::U32,
        Self::I64,
        Self::U64,
    ];

    /// Size of one element in bytes.
    pub const fn size_of(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::F64 | Self::I64 | Self::U64 => 8,
        }
    }

    /// Canonical lowercase name (`float32`, `int32`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "float32",
            Self::F64 => "float64",
            Self::I8 => "int8",
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::I32 => "int32",
            Self::U32 => "uint32",
            Self::I64 => "int64",
            Self::U64 => "uint64",
        }
    }

    /// The matching OpenCL C scalar type.
    pub const fn opencl_name(self) -> &'static str {
        match self {
            Self::F32 => "float",
            Self::F64 => "double",
            Self::I8 => "char",
            Self::U8 => "uchar",
            Self::I16 => "short",
            Self::U16 => "ushort",
            Self::I32 => "int",
            Self::U32 => "uint",
            Self::I64 => "long",
            Self::U64 => "ulong",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "f32" | "float32" | "float" => Self::F32,
            "f64" | "float64" | "double" => Self::F64,
            "i8" | "int8" | "char" => Self::I8,
            "u8" | "uint8" | "uchar" => Self::U8,
            "i16" | "int16" | "short" => Self::I16,
            "u16" | "uint16" | "ushort" => Self::U16,
            "i32" | "int32" | "int" => Self::I32,
            "u32" | "uint32" | "uint" => Self::U32,
            "i64" | "int64" | "long" => Self::I64,
            "u64" | "uint64" | "ulong" => Self::U64,
            other => {
                return Err(format!(
                    "unknown element type '{other}'. Expected one of: float32, float64, int8, \
                     uint8, int16, uint16, int32, uint32, int64, uint64"
                ));
            }
        };
        Ok(ty)
    }
}

/// A Rust scalar that maps onto an [`ElementType`].
///
/// Equality is exact in the native type; `to_f64` is only used for deltas and
/// tolerance checks.
pub trait Element: bytemuck::Pod + PartialEq + PartialOrd + fmt::Debug + Send + Sync {
    const TYPE: ElementType;

    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const TYPE: ElementType = ElementType::$variant;

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_element! {
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
