use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("no .safetensors files in {}", .path.display())]
    EmptyDirectory { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed checkpoint {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("tensor '{name}' not found in checkpoint ({shards} shard(s) searched)")]
    TensorNotFound { name: String, shards: usize },

    #[error("tensor '{name}' has unsupported dtype {dtype}")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("reference set needs at least one {0} tensor name")]
    MissingNames(&'static str),
}

pub type Result<T> = std::result::Result<T, CheckpointError>;
