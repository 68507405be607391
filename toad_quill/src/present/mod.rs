/// Presentation module - swapchain lifecycle and surface negotiation

// Module declarations
pub mod surface;
pub mod backend;
pub mod selection;
pub mod queue;
pub mod swapchain;

// Re-export the data model and the backend seam
pub use surface::*;
pub use backend::*;

// Re-export the manager and the queue heuristic
pub use swapchain::{AcquireOutcome, PresentableImage, Swapchain, SwapchainState};
pub use queue::find_queue_family;

// Mock presentation backend for tests (no GPU required)
#[cfg(test)]
pub mod mock_presentation;
