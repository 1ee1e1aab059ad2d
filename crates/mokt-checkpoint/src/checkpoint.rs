//! SafeTensors checkpoints: a single file or a directory of shards.

use crate::error::{CheckpointError, Result};
use crate::source::TensorSource;
use half::{bf16, f16};
use mokt_common::HostArray;
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

struct Shard {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Shard {
    fn read(path: PathBuf) -> Result<Self> {
        let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => CheckpointError::NotFound { path: path.clone() },
            _ => CheckpointError::Io { path: path.clone(), source },
        })?;
        Ok(Self { path, bytes })
    }

    fn tensors(&self) -> Result<SafeTensors<'_>> {
        SafeTensors::deserialize(&self.bytes).map_err(|e| CheckpointError::Malformed {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Tensors from one or more `.safetensors` files, addressed by name.
///
/// Names may carry a graph-style output suffix (`dense/Relu:0`); when the
/// exact name is absent, the name without the `:N` suffix is tried.
pub struct SafeTensorsCheckpoint {
    shards: Vec<Shard>,
    index: HashMap<String, usize>,
}

impl SafeTensorsCheckpoint {
    /// Open a `.safetensors` file, or every `.safetensors` file directly
    /// inside a directory (sorted by file name).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let paths = if path.is_dir() {
            shard_paths(path)?
        } else {
            vec![path.to_path_buf()]
        };

        let shards = paths.into_iter().map(Shard::read).collect::<Result<Vec<_>>>()?;
        let mut index = HashMap::new();
        for (i, shard) in shards.iter().enumerate() {
            for name in shard.tensors()?.names() {
                if let Some(first) = index.get(name.as_str()) {
                    let first: &Shard = &shards[*first];
                    warn!(
                        tensor = %name,
                        kept = %first.path.display(),
                        ignored = %shard.path.display(),
                        "tensor defined in more than one shard"
                    );
                    continue;
                }
                index.insert(name.clone(), i);
            }
        }
        info!(path = %path.display(), shards = shards.len(), tensors = index.len(), "opened checkpoint");
        Ok(Self { shards, index })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Every tensor name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn resolve<'n>(&self, name: &'n str) -> Option<(&'n str, usize)> {
        if let Some(&shard) = self.index.get(name) {
            return Some((name, shard));
        }
        let stripped = strip_output_suffix(name)?;
        self.index.get(stripped).map(|&shard| (stripped, shard))
    }
}

impl std::fmt::Debug for SafeTensorsCheckpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeTensorsCheckpoint")
            .field("shards", &self.shards.iter().map(|s| &s.path).collect::<Vec<_>>())
            .field("tensors", &self.index.len())
            .finish()
    }
}

impl TensorSource for SafeTensorsCheckpoint {
    fn load_tensor(&self, name: &str) -> Result<HostArray> {
        let (key, shard) = self.resolve(name).ok_or_else(|| CheckpointError::TensorNotFound {
            name: name.to_string(),
            shards: self.shards.len(),
        })?;
        let shard = &self.shards[shard];
        let tensors = shard.tensors()?;
        let view = tensors.tensor(key).map_err(|e| CheckpointError::Malformed {
            path: shard.path.clone(),
            reason: e.to_string(),
        })?;
        let array = flatten(key, &view)?;
        debug!(
            tensor = key,
            shape = ?view.shape(),
            dtype = ?view.dtype(),
            elements = array.len(),
            "loaded reference tensor"
        );
        Ok(array)
    }
}

fn shard_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|source| CheckpointError::Io { path: dir.to_path_buf(), source })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CheckpointError::Io { path: dir.to_path_buf(), source })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "safetensors") {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(CheckpointError::EmptyDirectory { path: dir.to_path_buf() });
    }
    paths.sort();
    Ok(paths)
}

/// `dense/Relu:0` -> `dense/Relu`. `None` when there is no numeric suffix.
fn strip_output_suffix(name: &str) -> Option<&str> {
    let (base, suffix) = name.rsplit_once(':')?;
    (!suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit())).then_some(base)
}

/// Little-endian tensor bytes as a flat host array. Half types widen to f32
/// and bool becomes u8.
fn flatten(name: &str, view: &TensorView<'_>) -> Result<HostArray> {
    let data = view.data();
    let unsupported = || CheckpointError::UnsupportedDtype {
        name: name.to_string(),
        dtype: format!("{:?}", view.dtype()),
    };
    let array = match view.dtype() {
        Dtype::F32 => HostArray::F32(le_values(data, f32::from_le_bytes)),
        Dtype::F64 => HostArray::F64(le_values(data, f64::from_le_bytes)),
        Dtype::F16 => HostArray::F32(
            le_values(data, u16::from_le_bytes).into_iter().map(|b| f16::from_bits(b).to_f32()).collect(),
        ),
        Dtype::BF16 => HostArray::F32(
            le_values(data, u16::from_le_bytes).into_iter().map(|b| bf16::from_bits(b).to_f32()).collect(),
        ),
        Dtype::I8 => HostArray::I8(bytemuck::cast_slice(data).to_vec()),
        Dtype::U8 => HostArray::U8(data.to_vec()),
        Dtype::BOOL => HostArray::U8(data.iter().map(|&b| u8::from(b != 0)).collect()),
        Dtype::I16 => HostArray::I16(le_values(data, i16::from_le_bytes)),
        Dtype::U16 => HostArray::U16(le_values(data, u16::from_le_bytes)),
        Dtype::I32 => HostArray::I32(le_values(data, i32::from_le_bytes)),
        Dtype::U32 => HostArray::U32(le_values(data, u32::from_le_bytes)),
        Dtype::I64 => HostArray::I64(le_values(data, i64::from_le_bytes)),
        Dtype::U64 => HostArray::U64(le_values(data, u64::from_le_bytes)),
        _ => return Err(unsupported()),
    };
    Ok(array)
}

fn le_values<T, const N: usize>(data: &[u8], from_le: fn([u8; N]) -> T) -> Vec<T> {
    data.chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            from_le(bytes)
        })
        .collect()
}
