//! Error types for Toad Quill
//!
//! This module defines the error type shared by the swapchain manager,
//! the presentation backends and the demo application.

use std::fmt;

/// Result type for Toad Quill operations
pub type Result<T> = std::result::Result<T, Error>;

/// Toad Quill errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (Vulkan call failed, etc.)
    BackendError(String),

    /// Out of host or device memory
    OutOfMemory,

    /// Invalid resource (image index, handle, etc.)
    InvalidResource(String),

    /// Initialization failed (instance, device, surface, swapchain)
    InitializationFailed(String),

    /// Operation called in a lifecycle state that does not allow it
    InvalidState(String),

    /// The logical device was lost
    DeviceLost,

    /// The presentation surface was lost
    SurfaceLost,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::DeviceLost => write!(f, "Device lost"),
            Error::SurfaceLost => write!(f, "Surface lost"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
