//! Unit tests for Vulkan presentation conversions
//!
//! Tests pure conversion functions without requiring GPU.
//! Validates the mapping between core presentation types and Vulkan types.

use super::*;
use ash::vk::Handle;

// ============================================================================
// FORMAT CONVERSION TESTS
// ============================================================================

#[test]
fn test_format_to_vk_named_formats() {
    assert_eq!(format_to_vk(TextureFormat::B8G8R8A8_UNORM), vk::Format::B8G8R8A8_UNORM);
    assert_eq!(format_to_vk(TextureFormat::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(format_to_vk(TextureFormat::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(TextureFormat::R8G8B8A8_SRGB), vk::Format::R8G8B8A8_SRGB);
    assert_eq!(format_to_vk(TextureFormat::A2B10G10R10_UNORM), vk::Format::A2B10G10R10_UNORM_PACK32);
    assert_eq!(format_to_vk(TextureFormat::R16G16B16A16_SFLOAT), vk::Format::R16G16B16A16_SFLOAT);
    assert_eq!(format_to_vk(TextureFormat::Undefined), vk::Format::UNDEFINED);
}

#[test]
fn test_format_from_vk_unknown_kept_raw() {
    let raw = vk::Format::R5G6B5_UNORM_PACK16;
    assert_eq!(format_from_vk(raw), TextureFormat::Other(raw.as_raw()));
    assert_eq!(format_to_vk(format_from_vk(raw)), raw);
}

#[test]
fn test_surface_format_from_vk() {
    let format = vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };
    assert_eq!(
        surface_format_from_vk(&format),
        SurfaceFormat { format: TextureFormat::B8G8R8A8_SRGB, color_space: ColorSpace::SrgbNonlinear }
    );
}

#[test]
fn test_color_space_other_kept_raw() {
    let hdr = vk::ColorSpaceKHR::HDR10_ST2084_EXT;
    assert_eq!(color_space_from_vk(hdr), ColorSpace::Other(hdr.as_raw()));
    assert_eq!(color_space_to_vk(ColorSpace::Other(hdr.as_raw())), hdr);
    assert_eq!(color_space_to_vk(ColorSpace::SrgbNonlinear), vk::ColorSpaceKHR::SRGB_NONLINEAR);
}

// ============================================================================
// PRESENT MODE / TRANSFORM / EXTENT TESTS
// ============================================================================

#[test]
fn test_present_mode_mapping() {
    for mode in [PresentMode::Immediate, PresentMode::Mailbox, PresentMode::Fifo, PresentMode::FifoRelaxed] {
        assert_eq!(present_mode_from_vk(present_mode_to_vk(mode)), Some(mode));
    }
    assert_eq!(present_mode_to_vk(PresentMode::Mailbox), vk::PresentModeKHR::MAILBOX);
    assert_eq!(present_mode_from_vk(vk::PresentModeKHR::SHARED_DEMAND_REFRESH), None);
}

#[test]
fn test_transform_bits_match() {
    assert_eq!(transform_to_vk(SurfaceTransformFlags::IDENTITY), vk::SurfaceTransformFlagsKHR::IDENTITY);
    assert_eq!(transform_to_vk(SurfaceTransformFlags::ROTATE_270), vk::SurfaceTransformFlagsKHR::ROTATE_270);
    assert_eq!(
        transform_from_vk(vk::SurfaceTransformFlagsKHR::INHERIT | vk::SurfaceTransformFlagsKHR::ROTATE_90),
        SurfaceTransformFlags::INHERIT | SurfaceTransformFlags::ROTATE_90
    );
}

#[test]
fn test_capabilities_from_vk_undefined_extent() {
    let capabilities = vk::SurfaceCapabilitiesKHR {
        min_image_count: 2,
        max_image_count: 0,
        current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
        min_image_extent: vk::Extent2D { width: 1, height: 1 },
        max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
        supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
        current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
        ..Default::default()
    };

    let converted = capabilities_from_vk(&capabilities);

    assert!(converted.current_extent.is_undefined());
    assert_eq!(converted.min_image_count, 2);
    assert_eq!(converted.max_image_count, 0);
    assert_eq!(converted.max_image_extent, Extent2D::new(4096, 4096));
    assert_eq!(converted.supported_transforms, SurfaceTransformFlags::IDENTITY);
}

// ============================================================================
// STATUS MAPPING TESTS
// ============================================================================

#[test]
fn test_acquire_status_mapping() {
    assert_eq!(acquire_status(Ok((2, false))), AcquireStatus::Acquired { index: 2, suboptimal: false });
    assert_eq!(acquire_status(Ok((0, true))), AcquireStatus::Acquired { index: 0, suboptimal: true });
    assert_eq!(acquire_status(Err(vk::Result::TIMEOUT)), AcquireStatus::Timeout);
    assert_eq!(acquire_status(Err(vk::Result::NOT_READY)), AcquireStatus::NotReady);
    assert_eq!(acquire_status(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)), AcquireStatus::OutOfDate);
    assert_eq!(acquire_status(Err(vk::Result::ERROR_SURFACE_LOST_KHR)), AcquireStatus::SurfaceLost);
    assert_eq!(acquire_status(Err(vk::Result::ERROR_DEVICE_LOST)), AcquireStatus::DeviceLost);
    assert_eq!(
        acquire_status(Err(vk::Result::ERROR_OUT_OF_HOST_MEMORY)),
        AcquireStatus::Failed(vk::Result::ERROR_OUT_OF_HOST_MEMORY.as_raw())
    );
}

#[test]
fn test_present_status_mapping() {
    assert_eq!(present_status(Ok(false)), PresentStatus::Success);
    assert_eq!(present_status(Ok(true)), PresentStatus::Suboptimal);
    assert_eq!(present_status(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)), PresentStatus::OutOfDate);
    assert_eq!(present_status(Err(vk::Result::ERROR_SURFACE_LOST_KHR)), PresentStatus::SurfaceLost);
    assert_eq!(present_status(Err(vk::Result::ERROR_DEVICE_LOST)), PresentStatus::DeviceLost);
    assert_eq!(
        present_status(Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)),
        PresentStatus::Failed(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY.as_raw())
    );
}

#[test]
fn test_device_error_mapping() {
    assert_eq!(device_error("alloc", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY), Error::OutOfMemory);
    assert_eq!(device_error("wait", vk::Result::ERROR_DEVICE_LOST), Error::DeviceLost);
    assert_eq!(surface_error("caps", vk::Result::ERROR_SURFACE_LOST_KHR), Error::SurfaceLost);
    assert!(matches!(device_error("view", vk::Result::ERROR_UNKNOWN), Error::BackendError(_)));
}

// ============================================================================
// FRAMEBUFFER TEMPLATE TESTS
// ============================================================================

#[test]
fn test_template_replaces_slot_zero() {
    let depth = vk::ImageView::from_raw(0xD);
    let color = vk::ImageView::from_raw(0xC);
    let template = FramebufferTemplate {
        render_pass: vk::RenderPass::null(),
        attachments: vec![vk::ImageView::null(), depth],
        width: 640,
        height: 480,
        layers: 1,
    };

    assert_eq!(template.attachments_for(color), vec![color, depth]);
    // The template itself is reused for every image
    assert_eq!(template.attachments[0], vk::ImageView::null());
}

#[test]
fn test_template_color_only() {
    let template = FramebufferTemplate::color_only(vk::RenderPass::null(), Extent2D::new(800, 600));
    let color = vk::ImageView::from_raw(7);

    assert_eq!(template.attachments_for(color), vec![color]);
    assert_eq!((template.width, template.height, template.layers), (800, 600, 1));
}
