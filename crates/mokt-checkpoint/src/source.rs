//! Name-addressed reference tensors.

use crate::error::{CheckpointError, Result};
use mokt_common::HostArray;
use std::collections::HashMap;

/// Anything that can hand out flattened tensors by name.
pub trait TensorSource {
    fn load_tensor(&self, name: &str) -> Result<HostArray>;
}

/// In-memory tensors, mostly for tests and generated demos.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tensors: HashMap<String, HostArray>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: impl Into<HostArray>) {
        self.tensors.insert(name.into(), tensor.into());
    }

    pub fn with(mut self, name: impl Into<String>, tensor: impl Into<HostArray>) -> Self {
        self.insert(name, tensor);
        self
    }
}

impl TensorSource for MemorySource {
    fn load_tensor(&self, name: &str) -> Result<HostArray> {
        self.tensors
            .get(name)
            .cloned()
            .ok_or_else(|| CheckpointError::TensorNotFound { name: name.to_string(), shards: 1 })
    }
}

/// Inputs and expected outputs of one kernel test, resolved by tensor name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    pub inputs: Vec<HostArray>,
    pub expected: Vec<HostArray>,
}

impl ReferenceSet {
    /// Load every named tensor from `source`, inputs first.
    pub fn load<S, N>(source: &S, input_names: &[N], output_names: &[N]) -> Result<Self>
    where
        S: TensorSource + ?Sized,
        N: AsRef<str>,
    {
        if input_names.is_empty() {
            return Err(CheckpointError::MissingNames("input"));
        }
        if output_names.is_empty() {
            return Err(CheckpointError::MissingNames("output"));
        }
        let load_all = |names: &[N]| -> Result<Vec<HostArray>> {
            names.iter().map(|n| source.load_tensor(n.as_ref())).collect()
        };
        Ok(Self { inputs: load_all(input_names)?, expected: load_all(output_names)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_inputs_then_outputs() {
        let source = MemorySource::new()
            .with("x", vec![1.0f32, 2.0])
            .with("y", vec![3.0f32, 4.0])
            .with("out", vec![4.0f32, 6.0]);
        let set = ReferenceSet::load(&source, &["x", "y"], &["out"]).unwrap();
        assert_eq!(set.inputs.len(), 2);
        assert_eq!(set.expected[0], HostArray::from(vec![4.0f32, 6.0]));
    }

    #[test]
    fn missing_tensor_is_named() {
        let source = MemorySource::new().with("x", vec![1u8]);
        let err = ReferenceSet::load(&source, &["x"], &["nope"]).unwrap_err();
        assert!(err.to_string().contains("'nope'"));
    }

    #[test]
    fn empty_name_lists_are_rejected() {
        let source = MemorySource::new();
        let none: [&str; 0] = [];
        assert!(matches!(
            ReferenceSet::load(&source, &none, &["out"]),
            Err(CheckpointError::MissingNames("input"))
        ));
    }
}
