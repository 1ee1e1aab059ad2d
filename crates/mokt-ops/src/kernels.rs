//! OpenCL C sources for the built-in operations.

pub const ADD_SRC: &str = include_str!("../kernels/add.cl");
pub const RELU_SRC: &str = include_str!("../kernels/relu.cl");
pub const SCALE2_SRC: &str = include_str!("../kernels/scale2.cl");
pub const COPY_BYTES_SRC: &str = include_str!("../kernels/copy_bytes.cl");
