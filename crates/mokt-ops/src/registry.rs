use crate::error::{OpError, Result};
use crate::operation::{Add, CopyBytes, Operation, Relu, Scale2};
use std::fmt;

/// Operations addressable by name, alias, or kernel entry point.
pub struct OperationRegistry {
    operations: Vec<Box<dyn Operation>>,
}

impl OperationRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self { operations: Vec::new() }
    }

    /// `add`, `relu`, `scale2` and `copy_bytes`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(Add));
        registry.register(Box::new(Relu));
        registry.register(Box::new(Scale2));
        registry.register(Box::new(CopyBytes));
        registry
    }

    /// Add an operation. A later registration shadows an earlier one with
    /// the same name.
    pub fn register(&mut self, operation: Box<dyn Operation>) {
        self.operations.retain(|op| op.name() != operation.name());
        self.operations.push(operation);
    }

    /// Look up by name or alias, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&dyn Operation> {
        let name = name.trim();
        self.operations
            .iter()
            .find(|op| {
                op.name().eq_ignore_ascii_case(name)
                    || op.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(name))
            })
            .map(|op| op.as_ref())
    }

    /// Like [`get`](Self::get), with an error listing what is available.
    pub fn require(&self, name: &str) -> Result<&dyn Operation> {
        self.get(name).ok_or_else(|| OpError::UnknownOperation {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// The operation whose kernel has entry point `kernel_name`.
    pub fn by_kernel_name(&self, kernel_name: &str) -> Option<&dyn Operation> {
        self.operations.iter().find(|op| op.kernel_name() == kernel_name).map(|op| op.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Operation> + '_ {
        self.operations.iter().map(|op| op.as_ref())
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry").field("operations", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mokt_common::HostArray;

    #[test]
    fn builtins_registered() {
        let registry = OperationRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["add", "relu", "scale2", "copy_bytes"]);
    }

    #[test]
    fn lookup_by_alias_and_case() {
        let registry = OperationRegistry::default();
        assert_eq!(registry.get("sum").map(|op| op.name()), Some("add"));
        assert_eq!(registry.get("ReLU").map(|op| op.name()), Some("relu"));
        assert!(registry.get("softmax").is_none());
    }

    #[test]
    fn require_lists_available() {
        let registry = OperationRegistry::default();
        let err = registry.require("gelu").err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("gelu") && msg.contains("scale2"), "{msg}");
    }

    #[test]
    fn lookup_by_kernel_name() {
        let registry = OperationRegistry::default();
        assert_eq!(registry.by_kernel_name("scale2").map(|op| op.arity()), Some(1));
        assert!(registry.by_kernel_name("Scale2").is_none());
    }

    struct Negate;

    impl Operation for Negate {
        fn name(&self) -> &'static str {
            "relu"
        }
        fn kernel_name(&self) -> &'static str {
            "negate"
        }
        fn source(&self) -> &'static str {
            "__kernel void negate(__global const float *a, __global float *b) { b[get_global_id(0)] = -a[get_global_id(0)]; }"
        }
        fn arity(&self) -> usize {
            1
        }
        fn host_reference(&self, inputs: &[HostArray]) -> Result<Vec<HostArray>> {
            Ok(vec![HostArray::F32(inputs[0].to_f64_vec().iter().map(|x| -(*x as f32)).collect())])
        }
    }

    #[test]
    fn later_registration_shadows() {
        let mut registry = OperationRegistry::with_builtins();
        registry.register(Box::new(Negate));
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("relu").map(|op| op.kernel_name()), Some("negate"));
    }
}
