/// VulkanPresentation - Vulkan implementation of the PresentationBackend trait
///
/// Thin layer over `VK_KHR_surface` / `VK_KHR_swapchain`: every method is one
/// Vulkan call plus the conversion between `vk` types and the core value types.

use ash::prelude::VkResult;
use ash::vk;
use std::sync::Arc;
use toad_quill::quill::present::{
    AcquireStatus, ColorSpace, Extent2D, FenceWait, PresentMode, PresentStatus,
    PresentationBackend, SurfaceCapabilities, SurfaceFormat, SurfaceTransformFlags,
    SwapchainConfiguration, TextureFormat,
};
use toad_quill::quill::{Error, Result};
use toad_quill::{quill_err, quill_error, quill_warn};

use crate::vulkan_context::VulkanContext;

const SOURCE: &str = "quill::vulkan";

/// Framebuffer description for `Swapchain::create_framebuffers`
///
/// Attachment 0 is replaced by each chain image's view; the remaining
/// attachments (depth, resolve...) are shared by every framebuffer.
#[derive(Debug, Clone)]
pub struct FramebufferTemplate {
    pub render_pass: vk::RenderPass,
    pub attachments: Vec<vk::ImageView>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

impl FramebufferTemplate {
    /// Single color attachment covering `extent`
    pub fn color_only(render_pass: vk::RenderPass, extent: Extent2D) -> Self {
        Self {
            render_pass,
            attachments: vec![vk::ImageView::null()],
            width: extent.width,
            height: extent.height,
            layers: 1,
        }
    }

    /// Attachments with slot 0 set to `color_view`
    pub(crate) fn attachments_for(&self, color_view: vk::ImageView) -> Vec<vk::ImageView> {
        let mut attachments = self.attachments.clone();
        match attachments.first_mut() {
            Some(first) => *first = color_view,
            None => attachments.push(color_view),
        }
        attachments
    }
}

/// Presentation backend for one window surface
pub struct VulkanPresentation {
    context: Arc<VulkanContext>,
}

impl VulkanPresentation {
    pub fn new(context: Arc<VulkanContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<VulkanContext> {
        &self.context
    }

    fn surface(&self) -> Result<vk::SurfaceKHR> {
        if self.context.surface_alive() {
            Ok(self.context.surface())
        } else {
            quill_error!(SOURCE, "Surface used after it was destroyed");
            Err(Error::InvalidState("Surface already destroyed".to_string()))
        }
    }
}

impl PresentationBackend for VulkanPresentation {
    type Chain = vk::SwapchainKHR;
    type Image = vk::Image;
    type ImageView = vk::ImageView;
    type Fence = vk::Fence;
    type Semaphore = vk::Semaphore;
    type Framebuffer = vk::Framebuffer;
    type FramebufferTemplate = FramebufferTemplate;

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        let surface = self.surface()?;
        let formats = unsafe {
            self.context
                .surface_loader()
                .get_physical_device_surface_formats(self.context.physical_device(), surface)
                .map_err(|e| surface_error("Failed to get surface formats", e))?
        };
        Ok(formats.iter().map(surface_format_from_vk).collect())
    }

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        let surface = self.surface()?;
        let capabilities = unsafe {
            self.context
                .surface_loader()
                .get_physical_device_surface_capabilities(self.context.physical_device(), surface)
                .map_err(|e| surface_error("Failed to get surface capabilities", e))?
        };
        Ok(capabilities_from_vk(&capabilities))
    }

    fn present_modes(&self) -> Result<Vec<PresentMode>> {
        let surface = self.surface()?;
        let modes = unsafe {
            self.context
                .surface_loader()
                .get_physical_device_surface_present_modes(self.context.physical_device(), surface)
                .map_err(|e| surface_error("Failed to get present modes", e))?
        };
        // Modes without a core equivalent can never be picked
        Ok(modes.into_iter().filter_map(present_mode_from_vk).collect())
    }

    fn create_chain(
        &mut self,
        config: &SwapchainConfiguration,
        old_chain: Option<vk::SwapchainKHR>,
    ) -> Result<vk::SwapchainKHR> {
        let surface = self.surface()?;
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(config.image_count)
            .image_format(format_to_vk(config.surface_format.format))
            .image_color_space(color_space_to_vk(config.surface_format.color_space))
            .image_extent(extent_to_vk(config.extent))
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(transform_to_vk(config.pre_transform))
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode_to_vk(config.present_mode))
            .clipped(true)
            .old_swapchain(old_chain.unwrap_or(vk::SwapchainKHR::null()));

        unsafe {
            self.context
                .swapchain_loader()
                .create_swapchain(&create_info, None)
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to create swapchain: {:?}", e);
                    match e {
                        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => Error::OutOfMemory,
                        vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
                        vk::Result::ERROR_SURFACE_LOST_KHR => Error::SurfaceLost,
                        _ => Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e)),
                    }
                })
        }
    }

    fn destroy_chain(&mut self, chain: vk::SwapchainKHR) {
        unsafe {
            self.context.swapchain_loader().destroy_swapchain(chain, None);
        }
    }

    fn chain_images(&self, chain: vk::SwapchainKHR) -> Result<Vec<vk::Image>> {
        unsafe {
            self.context
                .swapchain_loader()
                .get_swapchain_images(chain)
                .map_err(|e| quill_err!(SOURCE, "Failed to get swapchain images: {:?}", e))
        }
    }

    fn create_image_view(&mut self, image: vk::Image, format: TextureFormat) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format_to_vk(format))
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.context
                .device()
                .create_image_view(&create_info, None)
                .map_err(|e| device_error("Failed to create image view", e))
        }
    }

    fn destroy_image_view(&mut self, view: vk::ImageView) {
        unsafe {
            self.context.device().destroy_image_view(view, None);
        }
    }

    fn acquire_next_image(
        &mut self,
        chain: vk::SwapchainKHR,
        timeout_ns: u64,
        signal: Option<vk::Semaphore>,
    ) -> AcquireStatus {
        let result = unsafe {
            self.context.swapchain_loader().acquire_next_image(
                chain,
                timeout_ns,
                signal.unwrap_or(vk::Semaphore::null()),
                vk::Fence::null(),
            )
        };
        acquire_status(result)
    }

    fn queue_present(
        &mut self,
        chain: vk::SwapchainKHR,
        image_index: u32,
        wait: Option<vk::Semaphore>,
    ) -> PresentStatus {
        let chains = [chain];
        let indices = [image_index];
        let wait_semaphores: Vec<vk::Semaphore> = wait.into_iter().collect();
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&chains)
            .image_indices(&indices);

        let result = unsafe {
            self.context
                .swapchain_loader()
                .queue_present(self.context.graphics_queue(), &present_info)
        };
        present_status(result)
    }

    fn create_fence(&mut self, signaled: bool) -> Result<vk::Fence> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let create_info = vk::FenceCreateInfo::default().flags(flags);
        unsafe {
            self.context
                .device()
                .create_fence(&create_info, None)
                .map_err(|e| device_error("Failed to create fence", e))
        }
    }

    fn wait_for_fence(&mut self, fence: vk::Fence, timeout_ns: u64) -> Result<FenceWait> {
        let result = unsafe { self.context.device().wait_for_fences(&[fence], true, timeout_ns) };
        match result {
            Ok(()) => Ok(FenceWait::Signaled),
            Err(vk::Result::TIMEOUT) => Ok(FenceWait::Timeout),
            Err(e) => Err(device_error("Failed to wait for fence", e)),
        }
    }

    fn reset_fence(&mut self, fence: vk::Fence) -> Result<()> {
        unsafe {
            self.context
                .device()
                .reset_fences(&[fence])
                .map_err(|e| device_error("Failed to reset fence", e))
        }
    }

    fn destroy_fence(&mut self, fence: vk::Fence) {
        unsafe {
            self.context.device().destroy_fence(fence, None);
        }
    }

    fn create_framebuffer(
        &mut self,
        template: &FramebufferTemplate,
        color_view: vk::ImageView,
    ) -> Result<vk::Framebuffer> {
        let attachments = template.attachments_for(color_view);
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(template.render_pass)
            .attachments(&attachments)
            .width(template.width)
            .height(template.height)
            .layers(template.layers);

        unsafe {
            self.context
                .device()
                .create_framebuffer(&create_info, None)
                .map_err(|e| device_error("Failed to create framebuffer", e))
        }
    }

    fn destroy_framebuffer(&mut self, framebuffer: vk::Framebuffer) {
        unsafe {
            self.context.device().destroy_framebuffer(framebuffer, None);
        }
    }

    fn destroy_surface(&mut self) {
        self.context.destroy_surface();
    }
}

// ===== ERROR MAPPING =====

fn device_error(what: &str, e: vk::Result) -> Error {
    match e {
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            quill_error!(SOURCE, "{}: {:?}", what, e);
            Error::OutOfMemory
        }
        vk::Result::ERROR_DEVICE_LOST => {
            quill_error!(SOURCE, "{}: device lost", what);
            Error::DeviceLost
        }
        _ => quill_err!(SOURCE, "{}: {:?}", what, e),
    }
}

fn surface_error(what: &str, e: vk::Result) -> Error {
    match e {
        vk::Result::ERROR_SURFACE_LOST_KHR => {
            quill_error!(SOURCE, "{}: surface lost", what);
            Error::SurfaceLost
        }
        _ => device_error(what, e),
    }
}

// ===== STATUS CONVERSION =====

/// Map the result of `vkAcquireNextImageKHR`
pub(crate) fn acquire_status(result: VkResult<(u32, bool)>) -> AcquireStatus {
    match result {
        Ok((index, suboptimal)) => AcquireStatus::Acquired { index, suboptimal },
        Err(vk::Result::TIMEOUT) => AcquireStatus::Timeout,
        Err(vk::Result::NOT_READY) => AcquireStatus::NotReady,
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => AcquireStatus::OutOfDate,
        Err(vk::Result::ERROR_SURFACE_LOST_KHR) => AcquireStatus::SurfaceLost,
        Err(vk::Result::ERROR_DEVICE_LOST) => AcquireStatus::DeviceLost,
        Err(e) => {
            quill_warn!(SOURCE, "vkAcquireNextImageKHR returned {:?}", e);
            AcquireStatus::Failed(e.as_raw())
        }
    }
}

/// Map the result of `vkQueuePresentKHR`
pub(crate) fn present_status(result: VkResult<bool>) -> PresentStatus {
    match result {
        Ok(false) => PresentStatus::Success,
        Ok(true) => PresentStatus::Suboptimal,
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => PresentStatus::OutOfDate,
        Err(vk::Result::ERROR_SURFACE_LOST_KHR) => PresentStatus::SurfaceLost,
        Err(vk::Result::ERROR_DEVICE_LOST) => PresentStatus::DeviceLost,
        Err(e) => PresentStatus::Failed(e.as_raw()),
    }
}

// ===== TYPE CONVERSION =====

/// Vulkan format for a core `TextureFormat`
pub fn format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::Undefined => vk::Format::UNDEFINED,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::A2B10G10R10_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::Other(raw) => vk::Format::from_raw(raw),
    }
}

pub(crate) fn format_from_vk(format: vk::Format) -> TextureFormat {
    match format {
        vk::Format::UNDEFINED => TextureFormat::Undefined,
        vk::Format::R8G8B8A8_UNORM => TextureFormat::R8G8B8A8_UNORM,
        vk::Format::R8G8B8A8_SRGB => TextureFormat::R8G8B8A8_SRGB,
        vk::Format::B8G8R8A8_UNORM => TextureFormat::B8G8R8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB => TextureFormat::B8G8R8A8_SRGB,
        vk::Format::A2B10G10R10_UNORM_PACK32 => TextureFormat::A2B10G10R10_UNORM,
        vk::Format::R16G16B16A16_SFLOAT => TextureFormat::R16G16B16A16_SFLOAT,
        other => TextureFormat::Other(other.as_raw()),
    }
}

pub(crate) fn color_space_to_vk(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::Other(raw) => vk::ColorSpaceKHR::from_raw(raw),
    }
}

pub(crate) fn color_space_from_vk(color_space: vk::ColorSpaceKHR) -> ColorSpace {
    match color_space {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => ColorSpace::SrgbNonlinear,
        other => ColorSpace::Other(other.as_raw()),
    }
}

pub(crate) fn surface_format_from_vk(format: &vk::SurfaceFormatKHR) -> SurfaceFormat {
    SurfaceFormat {
        format: format_from_vk(format.format),
        color_space: color_space_from_vk(format.color_space),
    }
}

pub(crate) fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

pub(crate) fn present_mode_from_vk(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        _ => None,
    }
}

pub(crate) fn extent_to_vk(extent: Extent2D) -> vk::Extent2D {
    vk::Extent2D { width: extent.width, height: extent.height }
}

pub(crate) fn extent_from_vk(extent: vk::Extent2D) -> Extent2D {
    Extent2D::new(extent.width, extent.height)
}

pub(crate) fn transform_to_vk(transform: SurfaceTransformFlags) -> vk::SurfaceTransformFlagsKHR {
    vk::SurfaceTransformFlagsKHR::from_raw(transform.bits())
}

pub(crate) fn transform_from_vk(transform: vk::SurfaceTransformFlagsKHR) -> SurfaceTransformFlags {
    SurfaceTransformFlags::from_bits_truncate(transform.as_raw())
}

pub(crate) fn capabilities_from_vk(capabilities: &vk::SurfaceCapabilitiesKHR) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: capabilities.min_image_count,
        max_image_count: capabilities.max_image_count,
        current_extent: extent_from_vk(capabilities.current_extent),
        min_image_extent: extent_from_vk(capabilities.min_image_extent),
        max_image_extent: extent_from_vk(capabilities.max_image_extent),
        supported_transforms: transform_from_vk(capabilities.supported_transforms),
        current_transform: transform_from_vk(capabilities.current_transform),
    }
}

#[cfg(test)]
#[path = "vulkan_presentation_tests.rs"]
mod tests;
