use mokt_common::ElementType;
use thiserror::Error;

/// Errors from host reference implementations and registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("operation '{op}' takes {expected} inputs, got {got}")]
    Arity { op: &'static str, expected: usize, got: usize },

    #[error("operation '{op}' input #{index} must be {expected}, got {got}")]
    ElementType { op: &'static str, index: usize, expected: ElementType, got: ElementType },

    #[error("operation '{op}' inputs differ in length ({first} vs {other})")]
    LengthMismatch { op: &'static str, first: usize, other: usize },

    #[error("unknown operation '{name}' (available: {available})")]
    UnknownOperation { name: String, available: String },
}

pub type Result<T> = std::result::Result<T, OpError>;
