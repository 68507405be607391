/// Swapchain negotiation rules
///
/// Pure functions from what the surface reports to what the chain is built with.

use crate::error::{Error, Result};
use crate::present::{
    Extent2D, PresentMode, SurfaceCapabilities, SurfaceFormat, SurfaceTransformFlags,
    TextureFormat,
};

/// Format used when the surface reports no preference
pub const FALLBACK_FORMAT: TextureFormat = TextureFormat::B8G8R8A8_UNORM;

/// Pick the color format and color space
///
/// A single `Undefined` entry means any format is fine and `FALLBACK_FORMAT` is
/// used. Otherwise the first entry wins. The color space always comes from the
/// first entry.
pub fn choose_surface_format(formats: &[SurfaceFormat]) -> Result<SurfaceFormat> {
    let first = formats.first().ok_or_else(|| {
        Error::InitializationFailed("Surface reports no supported formats".to_string())
    })?;

    let format = if formats.len() == 1 && first.format == TextureFormat::Undefined {
        FALLBACK_FORMAT
    } else {
        first.format
    };

    Ok(SurfaceFormat { format, color_space: first.color_space })
}

/// Pick the image extent
///
/// `target` is only used when the surface reports `Extent2D::UNDEFINED`;
/// otherwise the reported extent is used exactly.
pub fn choose_extent(capabilities: &SurfaceCapabilities, target: Extent2D) -> Extent2D {
    if capabilities.current_extent.is_undefined() {
        target
    } else {
        capabilities.current_extent
    }
}

/// Pick the present mode: MAILBOX, then IMMEDIATE, then FIFO
///
/// Order of `modes` does not matter.
pub fn choose_present_mode(modes: &[PresentMode]) -> PresentMode {
    if modes.contains(&PresentMode::Mailbox) {
        PresentMode::Mailbox
    } else if modes.contains(&PresentMode::Immediate) {
        PresentMode::Immediate
    } else {
        PresentMode::Fifo
    }
}

/// One image above the minimum, capped by a nonzero maximum
pub fn choose_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let desired = capabilities.min_image_count.saturating_add(1);
    if capabilities.max_image_count > 0 && desired > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        desired
    }
}

/// Identity when supported, otherwise whatever the surface currently uses
pub fn choose_pre_transform(capabilities: &SurfaceCapabilities) -> SurfaceTransformFlags {
    if capabilities.supported_transforms.contains(SurfaceTransformFlags::IDENTITY) {
        SurfaceTransformFlags::IDENTITY
    } else {
        capabilities.current_transform
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
