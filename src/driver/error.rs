//! Overall high-level error type for the driver
use crate::eval::error::ExecutionError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DriverError {
    /// Process exit code to report this error with
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Execution(_) => 1,
            DriverError::Io(_) => 2,
        }
    }
}
