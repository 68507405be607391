/// PresentationBackend trait - what the swapchain manager needs from a graphics API

use std::fmt::Debug;

use crate::error::Result;
use crate::present::{
    PresentMode, SurfaceCapabilities, SurfaceFormat, SwapchainConfiguration, TextureFormat,
};

/// Outcome of asking the backend for the next image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireStatus {
    /// An image is available (possibly no longer matching the surface exactly)
    Acquired { index: u32, suboptimal: bool },
    /// No image became available within the timeout
    Timeout,
    /// No image available and the call did not wait
    NotReady,
    /// The chain no longer matches the surface and must be rebuilt
    OutOfDate,
    SurfaceLost,
    DeviceLost,
    /// Any other backend result code
    Failed(i32),
}

/// Outcome of queueing an image for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    Success,
    Suboptimal,
    OutOfDate,
    SurfaceLost,
    DeviceLost,
    /// Any other backend result code
    Failed(i32),
}

impl PresentStatus {
    /// The image was queued (optimal or not)
    pub fn is_presented(&self) -> bool {
        matches!(self, PresentStatus::Success | PresentStatus::Suboptimal)
    }

    /// The caller should rebuild the chain before the next frame
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, PresentStatus::Suboptimal | PresentStatus::OutOfDate)
    }
}

/// Outcome of a fence wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceWait {
    Signaled,
    Timeout,
}

/// Graphics API seam for `Swapchain`
///
/// Implemented by the Vulkan backend and by the test mock. Handles are plain
/// copyable values; the swapchain manager decides when each one is destroyed.
/// Every method is a direct, possibly blocking, call into the API.
pub trait PresentationBackend {
    /// Chain of presentable images
    type Chain: Copy + PartialEq + Debug;
    /// Image owned by a chain
    type Image: Copy + PartialEq + Debug;
    /// View over one chain image
    type ImageView: Copy + PartialEq + Debug;
    /// GPU-to-CPU synchronization primitive
    type Fence: Copy + PartialEq + Debug;
    /// GPU-to-GPU synchronization primitive
    type Semaphore: Copy + PartialEq + Debug;
    /// Framebuffer built over one chain image
    type Framebuffer;
    /// Framebuffer description whose attachment 0 is replaced per image
    type FramebufferTemplate;

    // ===== SURFACE QUERIES =====

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>>;

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities>;

    fn present_modes(&self) -> Result<Vec<PresentMode>>;

    // ===== CHAIN =====

    /// Create a chain, optionally handing over the chain it replaces
    fn create_chain(
        &mut self,
        config: &SwapchainConfiguration,
        old_chain: Option<Self::Chain>,
    ) -> Result<Self::Chain>;

    fn destroy_chain(&mut self, chain: Self::Chain);

    /// Images owned by `chain`, in index order
    fn chain_images(&self, chain: Self::Chain) -> Result<Vec<Self::Image>>;

    /// 2D color view, one mip level, one layer
    fn create_image_view(
        &mut self,
        image: Self::Image,
        format: TextureFormat,
    ) -> Result<Self::ImageView>;

    fn destroy_image_view(&mut self, view: Self::ImageView);

    // ===== ACQUIRE / PRESENT =====

    fn acquire_next_image(
        &mut self,
        chain: Self::Chain,
        timeout_ns: u64,
        signal: Option<Self::Semaphore>,
    ) -> AcquireStatus;

    fn queue_present(
        &mut self,
        chain: Self::Chain,
        image_index: u32,
        wait: Option<Self::Semaphore>,
    ) -> PresentStatus;

    // ===== FENCES =====

    fn create_fence(&mut self, signaled: bool) -> Result<Self::Fence>;

    fn wait_for_fence(&mut self, fence: Self::Fence, timeout_ns: u64) -> Result<FenceWait>;

    fn reset_fence(&mut self, fence: Self::Fence) -> Result<()>;

    fn destroy_fence(&mut self, fence: Self::Fence);

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(
        &mut self,
        template: &Self::FramebufferTemplate,
        color_view: Self::ImageView,
    ) -> Result<Self::Framebuffer>;

    fn destroy_framebuffer(&mut self, framebuffer: Self::Framebuffer);

    // ===== SURFACE =====

    /// Destroy the surface the chains were built for
    fn destroy_surface(&mut self);
}
