//! mokt command-line runner
//!
//! Runs OpenCL kernels against reference tensors or built-in host
//! references and reports accuracy and timing.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use mokt_cli::config::{RunConfig, DEFAULT_MAX_MISMATCHES};
use mokt_cli::exit::{for_verdict, EXIT_FAILURE, EXIT_SUCCESS};
use mokt_cli::output::{OutputConfig, OutputFormat};
use mokt_cli::runner::{self, OpRun};
use mokt_common::LocalSize;
use mokt_opencl::DeviceSelector;
use mokt_ops::OperationRegistry;
use mokt_verify::Tolerance;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

/// mokt - OpenCL kernel verification harness
#[derive(Parser)]
#[command(name = "mokt")]
#[command(about = "Run OpenCL kernels and verify their outputs")]
#[command(long_about = r#"
mokt executes OpenCL kernels, compares their outputs against reference values
and reports accuracy, deltas and device timing.

Examples:
  # Test relu.cl against tensors from a checkpoint
  mokt run --chkp-dir model/ --input dense/BiasAdd:0 --output dense/Relu:0

  # Same, with options from a file
  mokt run --file relu.args

  # Built-in operation on random data, with a host baseline
  mokt op add --len 5000000

  # List OpenCL devices
  mokt devices

Exit status: 0 when every output matches, 2 on a mismatch, 1 on any other
failure.
"#)]
#[command(version)]
struct Cli {
    /// Device selector (auto, first, gpu, cpu, accelerator, an index, name:<substring>)
    #[arg(long, value_name = "SEL", global = true, env = "MOKT_DEVICE")]
    device: Option<DeviceSelector>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Report format
    #[arg(long, value_name = "FORMAT", global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    json: bool,

    /// Disable ANSI colors in the report
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test a kernel file against checkpoint tensors
    Run(RunArgs),

    /// Run a built-in operation on random inputs
    #[command(alias = "demo")]
    Op(OpArgs),

    /// List OpenCL devices
    Devices,
}

#[derive(Args)]
struct RunArgs {
    /// Options file: key=value lines, or TOML when it ends in .toml
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Checkpoint file or directory of .safetensors shards
    #[arg(long = "chkp-dir", visible_alias = "chkp_dir", value_name = "PATH")]
    chkp_dir: Option<PathBuf>,

    /// First input tensor name
    #[arg(long, visible_alias = "first-input", alias = "first_input", value_name = "TENSOR")]
    input: Option<String>,

    /// Second input tensor name
    #[arg(long, alias = "second_input", value_name = "TENSOR")]
    second_input: Option<String>,

    /// Expected output tensor name
    #[arg(long, value_name = "TENSOR")]
    output: Option<String>,

    /// Kernel source file (derived from --output when omitted)
    #[arg(long, alias = "cl_source", value_name = "PATH")]
    cl_source: Option<PathBuf>,

    /// Kernel entry point (derived from --output when omitted)
    #[arg(long, alias = "kernel_name", value_name = "NAME")]
    kernel_name: Option<String>,

    /// Global size, e.g. 1024 or 32,32 (default: first input's length)
    #[arg(long, value_name = "SIZES")]
    global: Option<String>,

    /// Local size, e.g. 16,1 or auto (default: 1)
    #[arg(long, value_name = "SIZES")]
    local: Option<String>,

    /// Relative tolerance for pass/fail
    #[arg(long)]
    rtol: Option<f64>,

    /// Absolute tolerance for pass/fail
    #[arg(long)]
    atol: Option<f64>,

    /// Mismatches listed per output
    #[arg(long, value_name = "N")]
    max_mismatches: Option<usize>,

    /// Give up on a dispatch after this many milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Also time the matching built-in host reference, if any
    #[arg(long)]
    host_baseline: bool,

    /// OpenCL compiler options
    #[arg(long, value_name = "OPTS", allow_hyphen_values = true)]
    build_options: Option<String>,
}

impl RunArgs {
    /// Flags as a configuration layer; `None` where a flag was not given.
    fn to_config(&self, device: Option<DeviceSelector>) -> Result<RunConfig> {
        let mut config = RunConfig {
            checkpoint: self.chkp_dir.clone(),
            input: self.input.clone(),
            second_input: self.second_input.clone(),
            output: self.output.clone(),
            cl_source: self.cl_source.clone(),
            kernel_name: self.kernel_name.clone(),
            device,
            rtol: self.rtol,
            atol: self.atol,
            max_mismatches: self.max_mismatches,
            timeout: self.timeout_ms.map(Duration::from_millis),
            host_baseline: self.host_baseline.then_some(true),
            build_options: self.build_options.clone(),
            ..RunConfig::default()
        };
        if let Some(global) = &self.global {
            config.set("global", global)?;
        }
        if let Some(local) = &self.local {
            config.set("local", local)?;
        }
        Ok(config)
    }
}

#[derive(Args)]
struct OpArgs {
    /// Operation name (add, relu, scale2, copy_bytes, or an alias)
    name: String,

    /// Elements per input
    #[arg(long, default_value_t = 1 << 20)]
    len: usize,

    /// Seed for the random inputs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Local size, e.g. 64 or auto
    #[arg(long, default_value = "auto")]
    local: LocalSize,

    #[arg(long, default_value_t = Tolerance::DEFAULT_RTOL)]
    rtol: f64,

    #[arg(long, default_value_t = Tolerance::DEFAULT_ATOL)]
    atol: f64,

    /// Mismatches listed per output
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_MISMATCHES)]
    max_mismatches: usize,

    /// Give up on a dispatch after this many milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

fn main() {
    // Usage errors exit 1 so that 2 always means a verification mismatch.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_FAILURE } else { EXIT_SUCCESS };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = setup_logging(cli.log_level.as_deref()) {
        eprintln!("{e:#}");
        std::process::exit(EXIT_FAILURE);
    }

    let code = match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            for cause in e.chain().skip(1) {
                error!("  Caused by: {cause}");
            }
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

/// Logs go to stderr. `--log-level` wins over `RUST_LOG`, which wins over
/// the `info` default.
fn setup_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{level}'"))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}

fn execute(cli: Cli) -> Result<i32> {
    let output = OutputConfig {
        format: if cli.json { OutputFormat::Json } else { cli.format },
        color: !cli.no_color && console::colors_enabled(),
    };
    let registry = OperationRegistry::default();

    match cli.command {
        Commands::Run(args) => {
            let flags = args.to_config(cli.device)?;
            let config = match &args.file {
                Some(path) => RunConfig::from_file(path)?.merge(flags),
                None => flags,
            };
            let plan = config.resolve()?;
            let max_mismatches = plan.max_mismatches;
            let outcome = runner::run_checkpoint(&plan, &registry)?;
            output.emit_report(&outcome.report, &outcome.inputs, max_mismatches)?;
            Ok(for_verdict(outcome.passed()))
        }
        Commands::Op(args) => {
            let demo = OpRun {
                name: args.name,
                len: args.len,
                seed: args.seed,
                device: cli.device.unwrap_or_default(),
                local: args.local,
                tolerance: Tolerance::new(args.rtol, args.atol),
                timeout: args.timeout_ms.map(Duration::from_millis),
            };
            let outcome = runner::run_operation(&demo, &registry)?;
            output.emit_report(&outcome.report, &outcome.inputs, args.max_mismatches)?;
            Ok(for_verdict(outcome.passed()))
        }
        Commands::Devices => {
            let devices = runner::devices()?;
            if devices.is_empty() {
                output.status("No OpenCL devices found");
            }
            for device in &devices {
                println!("{device}");
            }
            Ok(EXIT_SUCCESS)
        }
    }
}
