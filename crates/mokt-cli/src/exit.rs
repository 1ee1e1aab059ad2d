// Exit codes for CI triage
pub const EXIT_SUCCESS: i32 = 0;
/// Infrastructure failure: device, build, transfer, config or I/O.
pub const EXIT_FAILURE: i32 = 1;
/// The kernel ran but at least one output did not match.
pub const EXIT_MISMATCH: i32 = 2;

pub fn for_verdict(passed: bool) -> i32 {
    if passed {
        EXIT_SUCCESS
    } else {
        EXIT_MISMATCH
    }
}
