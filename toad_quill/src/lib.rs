/*!
# Toad Quill

Core types for the Toad Quill presentation demo.

This crate holds everything that does not depend on a particular graphics API:

- **Swapchain**: lifecycle manager for the chain of presentable images
  (construct, acquire, submit fence, present, rebuild, cleanup)
- **PresentationBackend**: the trait a graphics backend implements so the
  swapchain manager can drive it
- **Selection rules**: extent, present mode, image count, transform and
  surface format negotiation
- **Queue family selection**: the best-fit heuristic used at device bring-up

Backend implementations (Vulkan) live in their own crates.
*/

// Internal modules
mod error;
mod config;
pub mod log;
pub mod present;

// Main quill namespace module
pub mod quill {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{Config, DebugSeverity};

    // Global log dispatch
    pub use crate::log::Log;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Presentation sub-module with the swapchain manager and surface types
    pub mod present {
        pub use crate::present::*;
    }
}

// Re-export math library at crate root
pub use glam;
