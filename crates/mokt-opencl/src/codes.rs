//! OpenCL status codes the harness interprets.
//!
//! Defined locally so error mapping compiles and is testable without the
//! `opencl` feature.

use std::fmt;

pub const CL_SUCCESS: i32 = 0;
pub const CL_DEVICE_NOT_FOUND: i32 = -1;
pub const CL_DEVICE_NOT_AVAILABLE: i32 = -2;
pub const CL_MEM_OBJECT_ALLOCATION_FAILURE: i32 = -4;
pub const CL_OUT_OF_RESOURCES: i32 = -5;
pub const CL_OUT_OF_HOST_MEMORY: i32 = -6;
pub const CL_PROFILING_INFO_NOT_AVAILABLE: i32 = -7;
pub const CL_BUILD_PROGRAM_FAILURE: i32 = -11;
pub const CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST: i32 = -14;
pub const CL_INVALID_VALUE: i32 = -30;
pub const CL_INVALID_MEM_OBJECT: i32 = -38;
pub const CL_INVALID_KERNEL_NAME: i32 = -46;
pub const CL_INVALID_ARG_INDEX: i32 = -49;
pub const CL_INVALID_ARG_VALUE: i32 = -50;
pub const CL_INVALID_ARG_SIZE: i32 = -51;
pub const CL_INVALID_KERNEL_ARGS: i32 = -52;
pub const CL_INVALID_WORK_DIMENSION: i32 = -53;
pub const CL_INVALID_WORK_GROUP_SIZE: i32 = -54;
pub const CL_INVALID_WORK_ITEM_SIZE: i32 = -55;
pub const CL_INVALID_GLOBAL_OFFSET: i32 = -56;
pub const CL_INVALID_EVENT_WAIT_LIST: i32 = -57;
pub const CL_INVALID_BUFFER_SIZE: i32 = -61;
pub const CL_INVALID_GLOBAL_WORK_SIZE: i32 = -63;
pub const CL_PLATFORM_NOT_FOUND_KHR: i32 = -1001;

/// `CL_COMPLETE` execution status; positive values are still in flight,
/// negative values are errors.
pub const CL_COMPLETE: i32 = 0;

/// A status code returned by the OpenCL runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClStatus(pub i32);

impl ClStatus {
    pub const fn code(self) -> i32 {
        self.0
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            CL_SUCCESS => "CL_SUCCESS",
            CL_DEVICE_NOT_FOUND => "CL_DEVICE_NOT_FOUND",
            CL_DEVICE_NOT_AVAILABLE => "CL_DEVICE_NOT_AVAILABLE",
            CL_MEM_OBJECT_ALLOCATION_FAILURE => "CL_MEM_OBJECT_ALLOCATION_FAILURE",
            CL_OUT_OF_RESOURCES => "CL_OUT_OF_RESOURCES",
            CL_OUT_OF_HOST_MEMORY => "CL_OUT_OF_HOST_MEMORY",
            CL_PROFILING_INFO_NOT_AVAILABLE => "CL_PROFILING_INFO_NOT_AVAILABLE",
            CL_BUILD_PROGRAM_FAILURE => "CL_BUILD_PROGRAM_FAILURE",
            CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST => {
                "CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST"
            }
            CL_INVALID_VALUE => "CL_INVALID_VALUE",
            CL_INVALID_MEM_OBJECT => "CL_INVALID_MEM_OBJECT",
            CL_INVALID_KERNEL_NAME => "CL_INVALID_KERNEL_NAME",
            CL_INVALID_ARG_INDEX => "CL_INVALID_ARG_INDEX",
            CL_INVALID_ARG_VALUE => "CL_INVALID_ARG_VALUE",
            CL_INVALID_ARG_SIZE => "CL_INVALID_ARG_SIZE",
            CL_INVALID_KERNEL_ARGS => "CL_INVALID_KERNEL_ARGS",
            CL_INVALID_WORK_DIMENSION => "CL_INVALID_WORK_DIMENSION",
            CL_INVALID_WORK_GROUP_SIZE => "CL_INVALID_WORK_GROUP_SIZE",
            CL_INVALID_WORK_ITEM_SIZE => "CL_INVALID_WORK_ITEM_SIZE",
            CL_INVALID_GLOBAL_OFFSET => "CL_INVALID_GLOBAL_OFFSET",
            CL_INVALID_EVENT_WAIT_LIST => "CL_INVALID_EVENT_WAIT_LIST",
            CL_INVALID_BUFFER_SIZE => "CL_INVALID_BUFFER_SIZE",
            CL_INVALID_GLOBAL_WORK_SIZE => "CL_INVALID_GLOBAL_WORK_SIZE",
            CL_PLATFORM_NOT_FOUND_KHR => "CL_PLATFORM_NOT_FOUND_KHR",
            _ => "CL_UNKNOWN_ERROR",
        }
    }

    /// The device rejected the launch geometry.
    pub fn is_geometry_error(self) -> bool {
        matches!(
            self.0,
            CL_INVALID_WORK_GROUP_SIZE
                | CL_INVALID_WORK_ITEM_SIZE
                | CL_INVALID_GLOBAL_WORK_SIZE
                | CL_INVALID_WORK_DIMENSION
        )
    }

    /// The device could not back an allocation of the requested size.
    pub fn is_allocation_error(self) -> bool {
        matches!(
            self.0,
            CL_MEM_OBJECT_ALLOCATION_FAILURE
                | CL_OUT_OF_RESOURCES
                | CL_OUT_OF_HOST_MEMORY
                | CL_INVALID_BUFFER_SIZE
        )
    }
}

impl fmt::Display for ClStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(ClStatus(-54).to_string(), "CL_INVALID_WORK_GROUP_SIZE (-54)");
        assert_eq!(ClStatus(-9999).to_string(), "CL_UNKNOWN_ERROR (-9999)");
    }

    #[test]
    fn classification() {
        assert!(ClStatus(CL_INVALID_WORK_GROUP_SIZE).is_geometry_error());
        assert!(ClStatus(CL_INVALID_GLOBAL_WORK_SIZE).is_geometry_error());
        assert!(!ClStatus(CL_OUT_OF_RESOURCES).is_geometry_error());
        assert!(ClStatus(CL_MEM_OBJECT_ALLOCATION_FAILURE).is_allocation_error());
        assert!(!ClStatus(CL_INVALID_KERNEL_ARGS).is_allocation_error());
    }
}
