//! Verification and profiling of kernel outputs.
//!
//! [`score`] compares expected and actual arrays element by element,
//! [`profile`] turns device timestamps and buffer sizes into throughput, and
//! [`report`] bundles both into a [`VerificationReport`] that renders for a
//! terminal or as JSON.

mod float;
pub mod profile;
pub mod report;
pub mod score;

pub use profile::{bytes_moved, HostBaseline, Profile};
pub use report::{render, verify_and_profile, RenderOptions, VerificationReport};
pub use score::{score, score_all, score_slices, score_with, Mismatch, OutputReport, Tolerance};
