/// Surface data model - what a presentation surface reports and what a swapchain is built with

use bitflags::bitflags;
use std::fmt;

/// Two-dimensional size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    /// Sentinel reported by surfaces whose size is decided by the swapchain
    pub const UNDEFINED: Extent2D = Extent2D { width: u32::MAX, height: u32::MAX };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when the surface leaves the extent to the application
    pub fn is_undefined(&self) -> bool {
        self.width == u32::MAX
    }

    /// True when either side is zero (minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<glam::UVec2> for Extent2D {
    fn from(size: glam::UVec2) -> Self {
        Self::new(size.x, size.y)
    }
}

impl From<Extent2D> for glam::UVec2 {
    fn from(extent: Extent2D) -> Self {
        glam::UVec2::new(extent.width, extent.height)
    }
}

impl fmt::Display for Extent2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Color formats a surface can report
///
/// Formats the demo never names explicitly travel as `Other(raw)` so a
/// backend can hand them back unchanged.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// The surface has no preferred format
    Undefined,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    /// Backend-specific raw value
    Other(i32),
}

/// Color spaces a surface can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    /// Backend-specific raw value
    Other(i32),
}

/// Format/color-space pair supported by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: TextureFormat,
    pub color_space: ColorSpace,
}

/// Presentation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// No queue, may tear, lowest latency
    Immediate,
    /// Single-entry queue replaced by newer images, no tearing
    Mailbox,
    /// Vsync queue, always supported
    Fifo,
    /// Vsync queue that tears when late
    FifoRelaxed,
}

impl fmt::Display for PresentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresentMode::Immediate => "IMMEDIATE",
            PresentMode::Mailbox => "MAILBOX",
            PresentMode::Fifo => "FIFO",
            PresentMode::FifoRelaxed => "FIFO_RELAXED",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Surface pre-transforms (bit values match VkSurfaceTransformFlagBitsKHR)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceTransformFlags: u32 {
        const IDENTITY = 0x001;
        const ROTATE_90 = 0x002;
        const ROTATE_180 = 0x004;
        const ROTATE_270 = 0x008;
        const HORIZONTAL_MIRROR = 0x010;
        const HORIZONTAL_MIRROR_ROTATE_90 = 0x020;
        const HORIZONTAL_MIRROR_ROTATE_180 = 0x040;
        const HORIZONTAL_MIRROR_ROTATE_270 = 0x080;
        const INHERIT = 0x100;
    }
}

bitflags! {
    /// Queue family capabilities (bit values match VkQueueFlagBits)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueueFlags: u32 {
        const GRAPHICS = 0x001;
        const COMPUTE = 0x002;
        const TRANSFER = 0x004;
        const SPARSE_BINDING = 0x008;
        const PROTECTED = 0x010;
        const VIDEO_DECODE = 0x020;
        const VIDEO_ENCODE = 0x040;
        const OPTICAL_FLOW = 0x100;
    }
}

/// Capabilities reported by a surface for one physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// `Extent2D::UNDEFINED` when the swapchain decides
    pub current_extent: Extent2D,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
    pub supported_transforms: SurfaceTransformFlags,
    pub current_transform: SurfaceTransformFlags,
}

/// One queue family of a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamily {
    pub flags: QueueFlags,
    pub queue_count: u32,
}

/// Everything a chain is created with
///
/// Recomputed from the surface on every (re)construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainConfiguration {
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    /// Minimum number of images requested from the backend
    pub image_count: u32,
    pub pre_transform: SurfaceTransformFlags,
}

impl fmt::Display for SwapchainConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?}/{:?} {} x{} images",
            self.extent,
            self.surface_format.format,
            self.surface_format.color_space,
            self.present_mode,
            self.image_count
        )
    }
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
