//! Where reports go and how they look.
//!
//! Reports are the only thing written to stdout; logs and status lines go to
//! stderr.

use mokt_common::HostArray;
use mokt_verify::{render, RenderOptions, VerificationReport};
use std::io::Write;

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'. Expected one of: text, json")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Output settings derived from global flags.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: OutputFormat::Text, color: true }
    }
}

impl OutputConfig {
    /// Print a status line to stderr (suppressed in JSON mode).
    pub fn status(&self, msg: &str) {
        if self.format == OutputFormat::Json {
            return;
        }
        eprintln!("{msg}");
    }

    /// Write `report` to stdout in the configured format.
    pub fn emit_report(
        &self,
        report: &VerificationReport,
        inputs: &[HostArray],
        max_mismatches: usize,
    ) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout().lock();
        match self.format {
            OutputFormat::Json => writeln!(stdout, "{}", report.to_json()?)?,
            OutputFormat::Text => {
                let options = RenderOptions { max_mismatches, color: self.color };
                write!(stdout, "{}", render(report, inputs, &options))?;
            }
        }
        Ok(())
    }
}
