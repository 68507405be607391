//! Unit tests for selection.rs

use crate::error::Error;
use crate::present::selection::*;
use crate::present::{
    ColorSpace, Extent2D, PresentMode, SurfaceCapabilities, SurfaceFormat, SurfaceTransformFlags,
    TextureFormat,
};

fn capabilities(min: u32, max: u32, current: Extent2D) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: min,
        max_image_count: max,
        current_extent: current,
        min_image_extent: Extent2D::new(1, 1),
        max_image_extent: Extent2D::new(4096, 4096),
        supported_transforms: SurfaceTransformFlags::IDENTITY,
        current_transform: SurfaceTransformFlags::IDENTITY,
    }
}

// ============================================================================
// EXTENT
// ============================================================================

#[test]
fn test_undefined_extent_uses_target() {
    let caps = capabilities(2, 0, Extent2D::UNDEFINED);
    assert_eq!(choose_extent(&caps, Extent2D::new(640, 480)), Extent2D::new(640, 480));
}

#[test]
fn test_undefined_extent_target_is_not_clamped() {
    let caps = capabilities(2, 0, Extent2D::UNDEFINED);
    assert_eq!(choose_extent(&caps, Extent2D::new(9000, 1)), Extent2D::new(9000, 1));
}

#[test]
fn test_reported_extent_wins_over_target() {
    let caps = capabilities(2, 0, Extent2D::new(1920, 1080));
    assert_eq!(choose_extent(&caps, Extent2D::new(640, 480)), Extent2D::new(1920, 1080));
}

// ============================================================================
// PRESENT MODE
// ============================================================================

#[test]
fn test_mailbox_wins_even_after_immediate() {
    let modes = [PresentMode::Fifo, PresentMode::Immediate, PresentMode::Mailbox];
    assert_eq!(choose_present_mode(&modes), PresentMode::Mailbox);
}

#[test]
fn test_mailbox_wins_when_listed_first() {
    let modes = [PresentMode::Mailbox, PresentMode::Immediate];
    assert_eq!(choose_present_mode(&modes), PresentMode::Mailbox);
}

#[test]
fn test_immediate_without_mailbox() {
    let modes = [PresentMode::FifoRelaxed, PresentMode::Immediate, PresentMode::Fifo];
    assert_eq!(choose_present_mode(&modes), PresentMode::Immediate);
}

#[test]
fn test_fifo_fallback() {
    assert_eq!(choose_present_mode(&[PresentMode::FifoRelaxed]), PresentMode::Fifo);
    assert_eq!(choose_present_mode(&[]), PresentMode::Fifo);
}

// ============================================================================
// IMAGE COUNT
// ============================================================================

#[test]
fn test_image_count_one_above_minimum() {
    assert_eq!(choose_image_count(&capabilities(2, 8, Extent2D::UNDEFINED)), 3);
}

#[test]
fn test_image_count_capped_by_maximum() {
    assert_eq!(choose_image_count(&capabilities(2, 2, Extent2D::UNDEFINED)), 2);
}

#[test]
fn test_image_count_at_u32_max_does_not_overflow() {
    assert_eq!(choose_image_count(&capabilities(u32::MAX, u32::MAX, Extent2D::UNDEFINED)), u32::MAX);
    assert_eq!(choose_image_count(&capabilities(u32::MAX, 0, Extent2D::UNDEFINED)), u32::MAX);
}

#[test]
fn test_image_count_uncapped_when_maximum_is_zero() {
    assert_eq!(choose_image_count(&capabilities(7, 0, Extent2D::UNDEFINED)), 8);
}

// ============================================================================
// PRE-TRANSFORM
// ============================================================================

#[test]
fn test_identity_transform_preferred() {
    let mut caps = capabilities(2, 0, Extent2D::UNDEFINED);
    caps.supported_transforms = SurfaceTransformFlags::IDENTITY | SurfaceTransformFlags::ROTATE_90;
    caps.current_transform = SurfaceTransformFlags::ROTATE_90;
    assert_eq!(choose_pre_transform(&caps), SurfaceTransformFlags::IDENTITY);
}

#[test]
fn test_current_transform_when_identity_unsupported() {
    let mut caps = capabilities(2, 0, Extent2D::UNDEFINED);
    caps.supported_transforms = SurfaceTransformFlags::ROTATE_270;
    caps.current_transform = SurfaceTransformFlags::ROTATE_270;
    assert_eq!(choose_pre_transform(&caps), SurfaceTransformFlags::ROTATE_270);
}

// ============================================================================
// SURFACE FORMAT
// ============================================================================

#[test]
fn test_single_undefined_format_falls_back() {
    let formats = [SurfaceFormat {
        format: TextureFormat::Undefined,
        color_space: ColorSpace::SrgbNonlinear,
    }];
    let chosen = choose_surface_format(&formats).unwrap();
    assert_eq!(chosen.format, TextureFormat::B8G8R8A8_UNORM);
    assert_eq!(chosen.color_space, ColorSpace::SrgbNonlinear);
}

#[test]
fn test_first_format_is_used() {
    let formats = [
        SurfaceFormat { format: TextureFormat::R8G8B8A8_SRGB, color_space: ColorSpace::Other(1000104002) },
        SurfaceFormat { format: TextureFormat::B8G8R8A8_UNORM, color_space: ColorSpace::SrgbNonlinear },
    ];
    let chosen = choose_surface_format(&formats).unwrap();
    assert_eq!(chosen, formats[0]);
}

#[test]
fn test_undefined_among_several_is_kept() {
    let formats = [
        SurfaceFormat { format: TextureFormat::Undefined, color_space: ColorSpace::SrgbNonlinear },
        SurfaceFormat { format: TextureFormat::B8G8R8A8_SRGB, color_space: ColorSpace::SrgbNonlinear },
    ];
    assert_eq!(choose_surface_format(&formats).unwrap().format, TextureFormat::Undefined);
}

#[test]
fn test_empty_format_list_is_an_error() {
    match choose_surface_format(&[]) {
        Err(Error::InitializationFailed(msg)) => assert!(msg.contains("no supported formats")),
        other => panic!("unexpected result: {:?}", other),
    }
}
