//! Execution errors
use thiserror::Error;

use super::memory::object::{Kind, ObjRef};

/// Errors raised by VM operations
///
/// All of these abort the operation that detected them. VM operations
/// check before they mutate so a failed operation leaves stack and heap
/// as they were.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("stack overflow (capacity {0})")]
    StackOverflow(usize),
    #[error("stack underflow")]
    StackUnderflow,
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: Kind, found: Kind },
    #[error("unknown object kind tag {0}")]
    UnknownKind(u8),
    #[error("dangling object reference {0}")]
    DanglingReference(ObjRef),
}
