//! Error types for the X2 engine
//!
//! Three families of failures surface through [`Error`]:
//! - configuration errors (shader settings, missing bytecode, attachment or
//!   descriptor mismatches) map to `InvalidResource`
//! - native API failures map to `BackendError` or `OutOfMemory`
//! - contract violations (slot kind mismatch, duplicate feature names,
//!   unknown render pass names) map to `InvalidResource` or `BackendError`
//!
//! None of them are recovered from inside the engine.

use std::fmt;

/// Result type for X2 engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// X2 engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan call failure, lock poisoning, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or configuration (shader, render pass, material slot, ...)
    InvalidResource(String),

    /// Initialization failed (device, swapchain, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::InvalidResource(error.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
