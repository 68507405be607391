/*!
# Toad Quill - Vulkan Backend

Vulkan implementation of the toad_quill presentation traits.

This crate brings up a Vulkan instance, surface and device for a window
(`VulkanContext`) and implements `PresentationBackend` on top of it
(`VulkanPresentation`) so the core `Swapchain` manager can drive a real chain.

# Example

```no_run
use std::sync::Arc;
use toad_quill::quill::Config;
use toad_quill::quill::present::{Extent2D, Swapchain};
use toad_quill_renderer_vulkan::quill::{VulkanContext, VulkanPresentation};
# fn run(window: &impl toad_quill_renderer_vulkan::WindowHandles) -> toad_quill::quill::Result<()> {

let context = Arc::new(VulkanContext::new(window, &Config::default())?);
context.log_diagnostic_info();

let mut swapchain = Swapchain::new(VulkanPresentation::new(Arc::clone(&context)))?;
swapchain.construct(Extent2D::new(640, 480))?;
# Ok(())
# }
```
*/

// Vulkan implementation modules
mod vulkan_context;
mod vulkan_presentation;
mod debug;

pub use vulkan_context::{VulkanContext, WindowHandles};
pub use vulkan_presentation::{format_to_vk, FramebufferTemplate, VulkanPresentation};

// Re-export debug utilities
pub use debug::{validation_stats, print_validation_stats_report, ValidationStats};

/// Namespace mirroring `toad_quill::quill`
pub mod quill {
    pub use crate::vulkan_context::{VulkanContext, WindowHandles};
    pub use crate::vulkan_presentation::{format_to_vk, FramebufferTemplate, VulkanPresentation};
    pub use crate::debug::{validation_stats, print_validation_stats_report, ValidationStats};
}

// Re-export ash so callers record commands with the same bindings
pub use ash;
