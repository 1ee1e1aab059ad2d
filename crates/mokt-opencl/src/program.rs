//! Program loading and entry-point lookup.

use crate::backend::{RawKernel, RawProgram};
use crate::context::ComputeContext;
use mokt_common::{KernelTestError, Result};
use std::fmt;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// A compiled program. Immutable once built.
pub struct Program<'ctx> {
    ctx: &'ctx ComputeContext,
    raw: RawProgram,
    origin: String,
    kernel_names: Vec<String>,
}

impl<'ctx> Program<'ctx> {
    pub(crate) fn build(
        ctx: &'ctx ComputeContext,
        source: &[u8],
        options: &str,
        origin: String,
    ) -> Result<Self> {
        let source = std::str::from_utf8(source).map_err(|e| KernelTestError::CompilationError {
            origin: origin.clone(),
            log: format!("source is not valid UTF-8: {e}"),
        })?;

        let raw = ctx
            .raw()
            .build(source, options)
            .map_err(|log| KernelTestError::CompilationError { origin: origin.clone(), log })?;
        let kernel_names = raw.kernel_names();
        info!(%origin, kernels = %kernel_names.join(","), "compiled OpenCL program");

        Ok(Self { ctx, raw, origin, kernel_names })
    }

    /// Read `path` as kernel source, compile it, and check that it defines
    /// `kernel_name`.
    pub fn from_file(
        ctx: &'ctx ComputeContext,
        path: impl AsRef<Path>,
        kernel_name: &str,
    ) -> Result<Self> {
        Self::from_file_with_options(ctx, path, kernel_name, "")
    }

    /// [`from_file`](Self::from_file) with compiler options.
    pub fn from_file_with_options(
        ctx: &'ctx ComputeContext,
        path: impl AsRef<Path>,
        kernel_name: &str,
        options: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => KernelTestError::FileNotFound { path: path.to_path_buf() },
            _ => KernelTestError::Io { path: path.to_path_buf(), source },
        })?;
        debug!(path = %path.display(), bytes = source.len(), "read kernel source");

        let program = Self::build(ctx, &source, options, path.display().to_string())?;
        if !program.defines(kernel_name) {
            return Err(program.not_found(kernel_name));
        }
        Ok(program)
    }

    /// Resolve an entry point by name.
    pub fn entry_point(&self, name: &str) -> Result<Kernel<'_>> {
        if !self.defines(name) {
            return Err(self.not_found(name));
        }
        let raw = self.raw.create_kernel(name).map_err(|_| self.not_found(name))?;
        let declared_args = raw.num_args().map_err(|status| KernelTestError::DispatchFailed {
            kernel: name.to_string(),
            code: status.code(),
            reason: format!("cannot query argument count: {status}"),
        })?;
        debug!(kernel = name, declared_args, "resolved entry point");

        Ok(Kernel { program: self, raw, name: name.to_string(), declared_args })
    }

    /// Entry points defined by the program, in the order the runtime lists
    /// them.
    pub fn kernel_names(&self) -> &[String] {
        &self.kernel_names
    }

    /// Where the source came from: a file path or `inline source`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn context(&self) -> &'ctx ComputeContext {
        self.ctx
    }

    fn defines(&self, name: &str) -> bool {
        // Some drivers do not report kernel names; let creation decide then.
        self.kernel_names.is_empty() || self.kernel_names.iter().any(|k| k == name)
    }

    fn not_found(&self, name: &str) -> KernelTestError {
        KernelTestError::KernelNotFound {
            name: name.to_string(),
            origin: self.origin.clone(),
            available: if self.kernel_names.is_empty() {
                "none reported".to_string()
            } else {
                self.kernel_names.join(", ")
            },
        }
    }
}

impl fmt::Debug for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("origin", &self.origin)
            .field("kernel_names", &self.kernel_names)
            .finish()
    }
}

/// An invocable entry point of a [`Program`].
pub struct Kernel<'p> {
    program: &'p Program<'p>,
    raw: RawKernel,
    name: String,
    declared_args: u32,
}

impl<'p> Kernel<'p> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters in the kernel signature.
    pub fn declared_args(&self) -> u32 {
        self.declared_args
    }

    pub fn program(&self) -> &'p Program<'p> {
        self.program
    }

    pub(crate) fn context(&self) -> &'p ComputeContext {
        self.program.ctx
    }

    pub(crate) fn raw(&self) -> &RawKernel {
        &self.raw
    }
}

impl fmt::Debug for Kernel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name)
            .field("declared_args", &self.declared_args)
            .field("origin", &self.program.origin)
            .finish()
    }
}
