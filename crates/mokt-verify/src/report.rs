//! Run-level verification report and its console and JSON renderings.

use crate::profile::{HostBaseline, Profile};
use crate::score::{score_all, OutputReport, Tolerance};
use console::style;
use mokt_common::{format_duration, ExecutionTiming, HostArray};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::warn;

/// Everything known about one kernel run after verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub kernel: String,
    pub tolerance: Tolerance,
    pub outputs: Vec<OutputReport>,
    /// Actual outputs with no expected counterpart. Any fails the run.
    #[serde(default)]
    pub extra_outputs: usize,
    pub profile: Profile,
}

impl VerificationReport {
    /// Every output passed, on the device side.
    pub fn passed(&self) -> bool {
        self.extra_outputs == 0 && self.outputs.iter().all(|o| o.passed)
    }

    /// Attach a host baseline scored against the same expected outputs.
    pub fn with_host_baseline(
        mut self,
        elapsed: Duration,
        host_outputs: &[HostArray],
        expected: &[HostArray],
    ) -> Self {
        self.profile.host = Some(HostBaseline::new(
            elapsed,
            self.profile.bytes_moved,
            host_outputs,
            expected,
            self.tolerance,
        ));
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Score every output and derive the device profile. Never fails on
/// mismatch.
pub fn verify_and_profile(
    kernel: &str,
    timing: ExecutionTiming,
    inputs: &[HostArray],
    expected: &[HostArray],
    actual: &[HostArray],
    tolerance: Tolerance,
) -> VerificationReport {
    let extra_outputs = actual.len().saturating_sub(expected.len());
    if extra_outputs > 0 {
        warn!(
            kernel,
            expected = expected.len(),
            actual = actual.len(),
            "kernel produced outputs with no expected values"
        );
    }
    VerificationReport {
        kernel: kernel.to_string(),
        tolerance,
        outputs: score_all(expected, actual, tolerance),
        extra_outputs,
        profile: Profile::new(timing, inputs, actual),
    }
}

/// Console rendering knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Mismatches listed per output before the rest are summarised.
    pub max_mismatches: usize,
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { max_mismatches: 20, color: true }
    }
}

fn percent(accuracy: f64) -> String {
    format!("{:.4}%", accuracy * 100.0)
}

fn throughput(rate: Option<f64>) -> String {
    rate.map(|r| format!("{r:.3} GiB/s")).unwrap_or_else(|| "n/a".to_string())
}

/// Human-readable report. `inputs` are echoed next to each listed mismatch.
pub fn render(report: &VerificationReport, inputs: &[HostArray], options: &RenderOptions) -> String {
    let mut out = String::new();
    let profile = &report.profile;

    let _ = writeln!(
        out,
        "Kernel '{}': accelerator time {}, {} ({} bytes moved)",
        report.kernel,
        format_duration(profile.device_time()),
        throughput(profile.throughput_gib_s),
        profile.bytes_moved
    );

    for output in &report.outputs {
        render_output(&mut out, output, inputs, options);
    }
    if report.extra_outputs > 0 {
        let line = format!(
            "{} output(s) beyond the {} expected have nothing to compare against",
            report.extra_outputs,
            report.outputs.len()
        );
        let _ = writeln!(out, "{}", style(line).red().force_styling(options.color));
    }

    if let Some(host) = &profile.host {
        let _ = writeln!(
            out,
            "Host baseline: {}, {}",
            format_duration(host.elapsed()),
            throughput(host.throughput_gib_s)
        );
        for output in &host.outputs {
            let _ = writeln!(
                out,
                "  [Output #{}]: {} accurate, mean delta = {:.6}",
                output.output,
                percent(output.accuracy),
                output.mean_delta
            );
        }
        if let Some(speedup) = profile.speedup() {
            let _ = writeln!(out, "Accelerator speedup over host: {speedup:.2}x");
        }
    }
    out
}

fn render_output(out: &mut String, output: &OutputReport, inputs: &[HostArray], options: &RenderOptions) {
    if output.passed {
        let line = format!("[Output #{}]: Expected and actual values are equal", output.output);
        let _ = writeln!(out, "{}", style(line).green().force_styling(options.color));
        if !output.exact {
            let _ = writeln!(
                out,
                "  within tolerance; {} exact, mean delta = {:.6}",
                percent(output.accuracy),
                output.mean_delta
            );
        }
        return;
    }

    let line = format!("[Output #{}]: Actual values do not match expected", output.output);
    let _ = writeln!(out, "{}", style(line).red().force_styling(options.color));
    if output.length_mismatch() {
        let _ = writeln!(
            out,
            "  length: expected {}, actual {}",
            output.total, output.actual_len
        );
    }

    for mismatch in output.mismatches.iter().take(options.max_mismatches) {
        let echoed: Vec<String> = inputs
            .iter()
            .filter_map(|input| input.get_f64(mismatch.index))
            .map(|v| format!("{v:.6}"))
            .collect();
        let actual = mismatch.actual.map_or_else(|| "missing".to_string(), |a| format!("{a:.6}"));
        let delta = mismatch.delta.map_or_else(|| "n/a".to_string(), |d| format!("{d:.6}"));
        let _ = writeln!(
            out,
            "  {}) in: {} = expected: {:.6}, actual: {}, delta = {}",
            mismatch.index,
            echoed.join(", "),
            mismatch.expected,
            actual,
            delta
        );
    }
    let hidden = output.mismatch_count().saturating_sub(options.max_mismatches);
    if hidden > 0 {
        let _ = writeln!(out, "  ... and {hidden} more");
    }

    let _ = writeln!(
        out,
        "  {} accurate ({} of {} elements differ), mean delta = {:.6}, max delta = {:.6}",
        percent(output.accuracy),
        output.mismatch_count(),
        output.total,
        output.mean_delta,
        output.max_delta
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> RenderOptions {
        RenderOptions { max_mismatches: 20, color: false }
    }

    fn report_for(inputs: &[HostArray], expected: &[HostArray], actual: &[HostArray]) -> VerificationReport {
        verify_and_profile(
            "scale2",
            ExecutionTiming::new(1_000, 13_500),
            inputs,
            expected,
            actual,
            Tolerance::default(),
        )
    }

    #[test]
    fn mismatch_scenario() {
        let inputs = vec![HostArray::from(vec![1.0f32])];
        let report = report_for(&inputs, &[HostArray::from(vec![1.0f32])], &[HostArray::from(vec![2.0f32])]);
        assert!(!report.passed());
        let output = &report.outputs[0];
        assert_eq!(output.accuracy, 0.0);
        assert_eq!(output.mean_delta, 1.0);
        assert_eq!(output.mismatched_indices(), vec![0]);

        let text = render(&report, &inputs, &plain());
        assert!(text.contains("accelerator time 12.500 µs"), "{text}");
        assert!(text.contains("[Output #0]: Actual values do not match expected"), "{text}");
        assert!(
            text.contains("0) in: 1.000000 = expected: 1.000000, actual: 2.000000, delta = 1.000000"),
            "{text}"
        );
        assert!(text.contains("0.0000% accurate"), "{text}");
    }

    #[test]
    fn passing_output_is_one_line() {
        let data = vec![HostArray::from(vec![0.0f32, 0.0, 3.5])];
        let report = report_for(&[HostArray::from(vec![-2.0f32, 0.0, 3.5])], &data, &data);
        assert!(report.passed());
        let text = render(&report, &[], &plain());
        assert!(text.contains("[Output #0]: Expected and actual values are equal"));
        assert!(!text.contains("delta"));
    }

    #[test]
    fn mismatch_listing_is_capped() {
        let expected = vec![HostArray::from(vec![0i32; 30])];
        let actual = vec![HostArray::from(vec![1i32; 30])];
        let report = report_for(&[], &expected, &actual);
        let text = render(&report, &[], &RenderOptions { max_mismatches: 5, color: false });
        assert_eq!(text.matches(" in: ").count(), 5);
        assert!(text.contains("... and 25 more"), "{text}");
    }

    #[test]
    fn host_baseline_is_rendered() {
        let data = vec![HostArray::from(vec![1.0f32; 4])];
        let report = report_for(&data, &data, &data).with_host_baseline(
            Duration::from_micros(125),
            &data,
            &data,
        );
        let text = render(&report, &data, &plain());
        assert!(text.contains("Host baseline: 125.000 µs"), "{text}");
        assert!(text.contains("speedup"), "{text}");
    }

    #[test]
    fn color_can_be_forced_off() {
        let data = vec![HostArray::from(vec![1u8])];
        let report = report_for(&data, &data, &data);
        assert!(!render(&report, &data, &plain()).contains('\u{1b}'));
        assert!(render(&report, &data, &RenderOptions::default()).contains('\u{1b}'));
    }

    #[test]
    fn extra_outputs_fail_the_run() {
        let data = vec![HostArray::from(vec![1.0f32])];
        let actual = vec![HostArray::from(vec![1.0f32]), HostArray::from(vec![7.0f32])];
        let report = report_for(&data, &data, &actual);
        assert!(report.outputs[0].passed);
        assert_eq!(report.extra_outputs, 1);
        assert!(!report.passed());
        let text = render(&report, &data, &plain());
        assert!(text.contains("1 output(s) beyond the 1 expected"), "{text}");
    }

    #[test]
    fn json_keeps_non_finite_values() {
        let expected = vec![HostArray::from(vec![f32::NAN, f32::INFINITY])];
        let actual = vec![HostArray::from(vec![0.0f32, 0.0])];
        let report = report_for(&[], &expected, &actual);
        let json = report.to_json().unwrap();
        assert!(json.contains("\"NaN\""), "{json}");
        assert!(json.contains("\"inf\""), "{json}");

        let back: VerificationReport = serde_json::from_str(&json).unwrap();
        let output = &back.outputs[0];
        assert!(!back.passed());
        assert!(output.mismatches[0].expected.is_nan());
        assert_eq!(output.mismatches[1].expected, f64::INFINITY);
        assert_eq!(output.mismatches[1].delta, Some(f64::INFINITY));
        assert_eq!(output.mean_delta, f64::INFINITY);
        assert_eq!(output.max_delta, f64::INFINITY);
    }

    #[test]
    fn json_roundtrip_keeps_verdict() {
        let data = vec![HostArray::from(vec![2.0f64])];
        let report = report_for(&data, &data, &[HostArray::from(vec![2.5f64])]);
        let json = report.to_json().unwrap();
        let back: VerificationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.outputs, report.outputs);
        assert_eq!(back.profile.bytes_moved, 16);
        assert!(!back.passed());
        assert!(json.contains("\"passed\": false"));
    }
}
