//! Run configuration: `key=value` or TOML files layered under command-line
//! flags.
//!
//! Keys are accepted with or without a leading `--`, and `-` and `_` are
//! interchangeable (`--chkp-dir`, `chkp_dir`).

use anyhow::{anyhow, bail, Context, Result};
use mokt_common::{parse_sizes, LocalSize};
use mokt_opencl::DeviceSelector;
use mokt_verify::Tolerance;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One configuration layer. Unset fields fall through to lower layers and
/// then to defaults in [`RunConfig::resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    pub checkpoint: Option<PathBuf>,
    pub input: Option<String>,
    pub second_input: Option<String>,
    pub output: Option<String>,
    pub cl_source: Option<PathBuf>,
    pub kernel_name: Option<String>,
    pub global: Option<Vec<usize>>,
    pub local: Option<LocalSize>,
    pub device: Option<DeviceSelector>,
    pub rtol: Option<f64>,
    pub atol: Option<f64>,
    pub max_mismatches: Option<usize>,
    pub timeout: Option<Duration>,
    pub host_baseline: Option<bool>,
    pub build_options: Option<String>,
}

/// Fully resolved settings for one checkpoint-driven kernel test.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub checkpoint: PathBuf,
    pub inputs: Vec<String>,
    pub output: String,
    pub cl_source: PathBuf,
    pub kernel_name: String,
    /// `None` means one work item per element of the first input.
    pub global: Option<Vec<usize>>,
    pub local: LocalSize,
    pub device: DeviceSelector,
    pub tolerance: Tolerance,
    pub max_mismatches: usize,
    pub timeout: Option<Duration>,
    pub host_baseline: bool,
    pub build_options: String,
}

pub const DEFAULT_MAX_MISMATCHES: usize = 20;

impl RunConfig {
    /// Read a config file. `.toml` files are parsed as TOML, anything else
    /// as `key=value` lines.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let parsed = if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml_str(&text)
        } else {
            Self::from_key_values(&text)
        };
        parsed.with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse `key=value` lines. Blank lines and `#` comments are skipped.
    pub fn from_key_values(text: &str) -> Result<Self> {
        let mut config = Self::default();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("line {}: expected key=value, got '{line}'", lineno + 1))?;
            config.set(key, value.trim()).with_context(|| format!("line {}", lineno + 1))?;
        }
        Ok(config)
    }

    /// Parse a TOML table of the same keys. Arrays of sizes are accepted
    /// for `global` and `local`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: toml::Table = text.parse().context("malformed TOML")?;
        let mut config = Self::default();
        for (key, value) in &table {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        toml::Value::Integer(i) => Ok(i.to_string()),
                        other => Err(anyhow!("'{key}': expected integers, got {other}")),
                    })
                    .collect::<Result<Vec<_>>>()?
                    .join(","),
                other => bail!("'{key}': unsupported value {other}"),
            };
            config.set(key, &value)?;
        }
        Ok(config)
    }

    /// Set one option from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = normalize_key(key);
        let text = || value.to_string();
        match key.as_str() {
            "chkp_dir" | "checkpoint" => self.checkpoint = Some(PathBuf::from(value)),
            "input" | "first_input" => self.input = Some(text()),
            "second_input" => self.second_input = Some(text()),
            "output" => self.output = Some(text()),
            "cl_source" => self.cl_source = Some(PathBuf::from(value)),
            "kernel_name" => self.kernel_name = Some(text()),
            "global" | "global_size" => {
                self.global = Some(parse_sizes(value).map_err(|e| anyhow!("global: {e}"))?)
            }
            "local" | "local_size" => {
                self.local = Some(value.parse().map_err(|e| anyhow!("local: {e}"))?)
            }
            "device" => self.device = Some(value.parse().map_err(|e| anyhow!("device: {e}"))?),
            "rtol" => self.rtol = Some(parse_number(&key, value)?),
            "atol" => self.atol = Some(parse_number(&key, value)?),
            "max_mismatches" => self.max_mismatches = Some(parse_number(&key, value)?),
            "timeout_ms" => self.timeout = Some(Duration::from_millis(parse_number(&key, value)?)),
            "host_baseline" => self.host_baseline = Some(parse_bool(&key, value)?),
            "build_options" => self.build_options = Some(text()),
            other => bail!("unknown option '{other}'"),
        }
        Ok(())
    }

    /// `overrides` wins wherever it is set.
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            checkpoint: overrides.checkpoint.or(self.checkpoint),
            input: overrides.input.or(self.input),
            second_input: overrides.second_input.or(self.second_input),
            output: overrides.output.or(self.output),
            cl_source: overrides.cl_source.or(self.cl_source),
            kernel_name: overrides.kernel_name.or(self.kernel_name),
            global: overrides.global.or(self.global),
            local: overrides.local.or(self.local),
            device: overrides.device.or(self.device),
            rtol: overrides.rtol.or(self.rtol),
            atol: overrides.atol.or(self.atol),
            max_mismatches: overrides.max_mismatches.or(self.max_mismatches),
            timeout: overrides.timeout.or(self.timeout),
            host_baseline: overrides.host_baseline.or(self.host_baseline),
            build_options: overrides.build_options.or(self.build_options),
        }
    }

    /// Apply defaults and derive the kernel from the output tensor name when
    /// neither source nor name is given.
    pub fn resolve(self) -> Result<RunPlan> {
        let output = self.output.ok_or_else(|| anyhow!("missing required option 'output'"))?;
        let input = self.input.ok_or_else(|| anyhow!("missing required option 'input'"))?;
        let checkpoint =
            self.checkpoint.ok_or_else(|| anyhow!("missing required option 'chkp_dir'"))?;

        let (cl_source, kernel_name) = match (self.cl_source, self.kernel_name) {
            (Some(source), Some(name)) => (source, name),
            (Some(source), None) => {
                let name = source
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("cannot derive a kernel name from {}", source.display()))?;
                (source, name)
            }
            (None, explicit) => {
                let derived = derive_kernel_name(&output)
                    .ok_or_else(|| anyhow!("cannot derive a kernel name from output '{output}'"))?;
                let source = PathBuf::from(format!("{derived}.cl"));
                (source, explicit.unwrap_or(derived))
            }
        };

        let inputs = std::iter::once(input).chain(self.second_input).collect();
        Ok(RunPlan {
            checkpoint,
            inputs,
            output,
            cl_source,
            kernel_name,
            global: self.global,
            local: self.local.unwrap_or_else(|| LocalSize::Explicit(vec![1])),
            device: self.device.unwrap_or_default(),
            tolerance: Tolerance::new(
                self.rtol.unwrap_or(Tolerance::DEFAULT_RTOL),
                self.atol.unwrap_or(Tolerance::DEFAULT_ATOL),
            ),
            max_mismatches: self.max_mismatches.unwrap_or(DEFAULT_MAX_MISMATCHES),
            timeout: self.timeout,
            host_baseline: self.host_baseline.unwrap_or(false),
            build_options: self.build_options.unwrap_or_default(),
        })
    }
}

/// `dense/Relu:0` -> `relu`: last path segment, output index dropped,
/// lowercased.
pub fn derive_kernel_name(output: &str) -> Option<String> {
    let last = output.rsplit('/').next().unwrap_or(output);
    let base = match last.rsplit_once(':') {
        Some((base, index)) if index.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => last,
    };
    let name = base.trim().to_lowercase();
    (!name.is_empty()).then_some(name)
}

fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches("--").replace('-', "_").to_ascii_lowercase()
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| anyhow!("{key}: invalid value '{value}': {e}"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key}: expected a boolean, got '{value}'"),
    }
}
