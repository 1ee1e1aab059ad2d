//! Elementwise comparison of expected and actual outputs.
//!
//! Two separate notions are reported:
//!
//! - **accuracy and deltas** use exact comparison in the native element type:
//!   every index where `expected[i] != actual[i]` is a mismatch;
//! - **pass/fail** is tolerance based, `|actual - expected| <= atol + rtol *
//!   |expected|` for every element.
//!
//! NaN never compares equal, and its delta is not recorded.

use mokt_common::{Element, HostArray, OutputDescriptor};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Relative and absolute tolerance for the pass/fail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    #[serde(with = "crate::float")]
    pub rtol: f64,
    #[serde(with = "crate::float")]
    pub atol: f64,
}

impl Tolerance {
    pub const DEFAULT_RTOL: f64 = 1e-5;
    pub const DEFAULT_ATOL: f64 = 1e-8;

    pub const fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// Only bit-for-bit equal values pass.
    pub const fn exact() -> Self {
        Self { rtol: 0.0, atol: 0.0 }
    }

    pub fn is_close(&self, expected: f64, actual: f64) -> bool {
        if expected == actual {
            return true;
        }
        // Infinities are close only to themselves; NaN to nothing.
        if !expected.is_finite() || !actual.is_finite() {
            return false;
        }
        let diff = (actual - expected).abs();
        diff <= self.atol + self.rtol * expected.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RTOL, Self::DEFAULT_ATOL)
    }
}

/// One position where expected and actual differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub index: usize,
    #[serde(with = "crate::float")]
    pub expected: f64,
    /// `None` when `actual` is shorter than `expected`.
    #[serde(with = "crate::float::option")]
    pub actual: Option<f64>,
    /// `|expected - actual|`; `None` when missing or NaN.
    #[serde(with = "crate::float::option")]
    pub delta: Option<f64>,
}

/// Comparison of one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputReport {
    /// Position of the output among the kernel's outputs.
    pub output: usize,
    /// Every element within tolerance and lengths equal.
    pub passed: bool,
    /// Every element exactly equal and lengths equal.
    pub exact: bool,
    /// Number of expected elements.
    pub total: usize,
    pub actual_len: usize,
    /// `(total - mismatches) / total`.
    pub accuracy: f64,
    /// Mean over recorded deltas; `0.0` when there are none.
    #[serde(with = "crate::float")]
    pub mean_delta: f64,
    #[serde(with = "crate::float")]
    pub max_delta: f64,
    pub mismatches: Vec<Mismatch>,
}

impl OutputReport {
    pub fn mismatch_count(&self) -> usize {
        self.mismatches.len()
    }

    pub fn mismatched_indices(&self) -> Vec<usize> {
        self.mismatches.iter().map(|m| m.index).collect()
    }

    /// `(index, delta)` for every mismatch with a recorded delta.
    pub fn deltas(&self) -> Vec<(usize, f64)> {
        self.mismatches.iter().filter_map(|m| m.delta.map(|d| (m.index, d))).collect()
    }

    pub fn length_mismatch(&self) -> bool {
        self.total != self.actual_len
    }

    fn with_output(mut self, output: usize) -> Self {
        self.output = output;
        self
    }
}

/// Score `actual` against `expected` with the default tolerance.
pub fn score(expected: &HostArray, actual: &HostArray) -> OutputReport {
    score_with(expected, actual, Tolerance::default())
}

/// Score `actual` against `expected`.
///
/// Matching element types compare natively. Differing types are widened to
/// `f64` first.
pub fn score_with(expected: &HostArray, actual: &HostArray, tolerance: Tolerance) -> OutputReport {
    use HostArray as H;
    match (expected, actual) {
        (H::F32(e), H::F32(a)) => score_slices(e, a, tolerance),
        (H::F64(e), H::F64(a)) => score_slices(e, a, tolerance),
        (H::I8(e), H::I8(a)) => score_slices(e, a, tolerance),
        (H::U8(e), H::U8(a)) => score_slices(e, a, tolerance),
        (H::I16(e), H::I16(a)) => score_slices(e, a, tolerance),
        (H::U16(e), H::U16(a)) => score_slices(e, a, tolerance),
        (H::I32(e), H::I32(a)) => score_slices(e, a, tolerance),
        (H::U32(e), H::U32(a)) => score_slices(e, a, tolerance),
        (H::I64(e), H::I64(a)) => score_slices(e, a, tolerance),
        (H::U64(e), H::U64(a)) => score_slices(e, a, tolerance),
        _ => {
            warn!(
                expected = %expected.element_type(),
                actual = %actual.element_type(),
                "element types differ; comparing as float64"
            );
            score_slices(&expected.to_f64_vec(), &actual.to_f64_vec(), tolerance)
        }
    }
}

/// Score typed slices. `total` is `expected.len()`; expected positions past
/// the end of `actual` count as mismatches without a delta.
pub fn score_slices<T: Element>(expected: &[T], actual: &[T], tolerance: Tolerance) -> OutputReport {
    let total = expected.len();
    let actual_len = actual.len();

    if expected == actual {
        return OutputReport {
            output: 0,
            passed: true,
            exact: true,
            total,
            actual_len,
            accuracy: 1.0,
            mean_delta: 0.0,
            max_delta: 0.0,
            mismatches: Vec::new(),
        };
    }

    let mut passed = total == actual_len;
    let mut mismatches = Vec::new();
    let mut delta_sum = 0.0;
    let mut delta_count = 0usize;
    let mut max_delta = 0.0f64;

    for (index, &e) in expected.iter().enumerate() {
        let expected_f = e.to_f64();
        let Some(&a) = actual.get(index) else {
            passed = false;
            mismatches.push(Mismatch { index, expected: expected_f, actual: None, delta: None });
            continue;
        };
        let actual_f = a.to_f64();
        if !tolerance.is_close(expected_f, actual_f) {
            passed = false;
        }
        if e != a {
            let delta = (expected_f - actual_f).abs();
            let delta = (!delta.is_nan()).then_some(delta);
            if let Some(d) = delta {
                delta_sum += d;
                delta_count += 1;
                max_delta = max_delta.max(d);
            }
            mismatches.push(Mismatch { index, expected: expected_f, actual: Some(actual_f), delta });
        }
    }

    let accuracy = if total == 0 {
        1.0
    } else {
        (total - mismatches.len()) as f64 / total as f64
    };
    let mean_delta = if delta_count == 0 { 0.0 } else { delta_sum / delta_count as f64 };

    OutputReport {
        output: 0,
        passed,
        exact: false,
        total,
        actual_len,
        accuracy,
        mean_delta,
        max_delta,
        mismatches,
    }
}

/// Score each expected output against the actual output at the same
/// position. A missing actual output scores as empty.
pub fn score_all(expected: &[HostArray], actual: &[HostArray], tolerance: Tolerance) -> Vec<OutputReport> {
    expected
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let report = match actual.get(i) {
                Some(a) => score_with(e, a, tolerance),
                None => {
                    let empty = HostArray::zeros(&OutputDescriptor::new(0, e.element_type()));
                    score_with(e, &empty, tolerance)
                }
            };
            report.with_output(i)
        })
        .collect()
}
