//! Clear-screen renderer driving the swapchain manager
//!
//! Owns everything the demo creates on top of the chain: one render pass,
//! one framebuffer, command buffer and semaphore pair per image plus a
//! spare acquire semaphore.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec4;
use toad_quill::quill::present::{AcquireOutcome, Extent2D, Swapchain};
use toad_quill::quill::{Config, Result};
use toad_quill::{quill_debug, quill_err, quill_error, quill_info, quill_trace};
use toad_quill_renderer_vulkan::ash::vk;
use toad_quill_renderer_vulkan::quill::{
    format_to_vk, FramebufferTemplate, VulkanContext, VulkanPresentation, WindowHandles,
};

const SOURCE: &str = "quill::demo";

/// Color the clear pulses toward, per frame
pub fn animated_clear_color(base: [f32; 4], seconds: f32) -> [f32; 4] {
    let base = Vec4::from_array(base);
    let inverse = Vec4::new(1.0 - base.x, 1.0 - base.y, 1.0 - base.z, base.w);
    let pulse = 0.5 - 0.5 * (seconds * 1.5).cos();
    base.lerp(inverse, pulse).to_array()
}

/// Outcome of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    Presented,
    /// The chain must be rebuilt before the next frame
    NeedsRebuild,
}

/// Acquire semaphores recycled through the image they signaled
///
/// The next acquire always uses the spare. Once an image is acquired, the
/// spare becomes that image's wait semaphore and the one the image held
/// before becomes the new spare. That semaphore was last waited on by the
/// image's previous submission, which `submit_fence` waits for before the
/// next acquire can reuse it.
#[derive(Debug)]
pub struct AcquireSemaphores<S: Copy> {
    spare: S,
    per_image: Vec<S>,
}

impl<S: Copy> AcquireSemaphores<S> {
    /// One semaphore per image plus the spare (taken from the end)
    pub fn from_handles(mut handles: Vec<S>) -> Option<Self> {
        let spare = handles.pop()?;
        Some(Self { spare, per_image: handles })
    }

    /// Semaphore to signal with the next acquire
    pub fn next(&self) -> S {
        self.spare
    }

    /// Hand the spare to image `index`; returns the semaphore its submission waits on
    pub fn acquired(&mut self, index: usize) -> S {
        std::mem::swap(&mut self.spare, &mut self.per_image[index]);
        self.per_image[index]
    }

    pub fn into_handles(self) -> impl Iterator<Item = S> {
        self.per_image.into_iter().chain(std::iter::once(self.spare))
    }
}

/// Per-image resources, recreated with the chain
struct ChainResources {
    framebuffers: Vec<vk::Framebuffer>,
    command_buffers: Vec<vk::CommandBuffer>,
    image_available: Option<AcquireSemaphores<vk::Semaphore>>,
    render_finished: Vec<vk::Semaphore>,
    extent: Extent2D,
}

pub struct DemoRenderer {
    context: Arc<VulkanContext>,
    swapchain: Swapchain<VulkanPresentation>,
    render_pass: vk::RenderPass,
    command_pool: vk::CommandPool,
    resources: Option<ChainResources>,
    clear_color: [f32; 4],
    started: Instant,
    frame: usize,
    destroyed: bool,
}

impl DemoRenderer {
    pub fn new<W: WindowHandles + ?Sized>(window: &W, config: &Config, extent: Extent2D) -> Result<Self> {
        let context = Arc::new(VulkanContext::new(window, config)?);
        context.log_diagnostic_info();

        let mut swapchain = Swapchain::new(VulkanPresentation::new(Arc::clone(&context)))?;
        swapchain.construct(extent)?;

        let device = context.device();
        let render_pass = create_render_pass(device, format_to_vk(swapchain.color_format()))?;

        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(context.graphics_queue_family())
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = match unsafe { device.create_command_pool(&pool_info, None) } {
            Ok(pool) => pool,
            Err(e) => {
                unsafe { device.destroy_render_pass(render_pass, None) };
                return Err(quill_err!(SOURCE, "Failed to create command pool: {:?}", e));
            }
        };

        let mut renderer = Self {
            context,
            swapchain,
            render_pass,
            command_pool,
            resources: None,
            clear_color: config.clear_color,
            started: Instant::now(),
            frame: 0,
            destroyed: false,
        };
        renderer.create_chain_resources()?;

        quill_info!(
            SOURCE,
            "Renderer ready: {} images, {:?}",
            renderer.swapchain.image_count(),
            renderer.swapchain.present_mode()
        );
        Ok(renderer)
    }

    pub fn swapchain(&self) -> &Swapchain<VulkanPresentation> {
        &self.swapchain
    }

    /// Acquire, record, submit and present one frame
    pub fn draw_frame(&mut self) -> Result<FrameResult> {
        let Some(resources) = self.resources.as_mut() else {
            return Ok(FrameResult::NeedsRebuild);
        };
        let Some(semaphores) = resources.image_available.as_mut() else {
            return Ok(FrameResult::NeedsRebuild);
        };

        let index = match self.swapchain.acquire_next_image(Some(semaphores.next()))? {
            AcquireOutcome::Acquired { index, .. } => index as usize,
            AcquireOutcome::NeedsRebuild => return Ok(FrameResult::NeedsRebuild),
        };
        let image_available = semaphores.acquired(index);
        let render_finished = resources.render_finished[index];
        let command_buffer = resources.command_buffers[index];
        let framebuffer = resources.framebuffers[index];
        let extent = resources.extent;

        let fence = self.swapchain.submit_fence()?;

        let color = animated_clear_color(self.clear_color, self.started.elapsed().as_secs_f32());
        let submitted = self
            .record_clear(command_buffer, framebuffer, extent, color)
            .and_then(|()| self.submit(command_buffer, image_available, render_finished, fence));
        if let Err(e) = submitted {
            // Nothing will signal the fence; do not leave it for cleanup to wait on
            self.swapchain.discard_submit_fence()?;
            return Err(e);
        }

        let status = self.swapchain.queue_present(Some(render_finished))?;
        quill_trace!(SOURCE, "Frame {} on image {}: {:?}", self.frame, index, status);
        self.frame += 1;

        if status.needs_rebuild() {
            return Ok(FrameResult::NeedsRebuild);
        }
        if !status.is_presented() {
            return Err(quill_err!(SOURCE, "Present failed: {:?}", status));
        }
        Ok(FrameResult::Presented)
    }

    /// Rebuild the chain and everything attached to it for a new size
    pub fn rebuild(&mut self, extent: Extent2D) -> Result<()> {
        self.context.wait_idle()?;
        self.destroy_chain_resources();
        self.swapchain.construct(extent)?;
        self.create_chain_resources()?;
        quill_debug!(SOURCE, "Rebuilt for {}x{}", extent.width, extent.height);
        Ok(())
    }

    /// Wait idle, destroy demo resources, then the chain and surface
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Err(e) = self.context.wait_idle() {
            quill_error!(SOURCE, "Wait idle before shutdown failed: {}", e);
        }
        self.destroy_chain_resources();
        unsafe {
            let device = self.context.device();
            device.destroy_command_pool(self.command_pool, None);
            device.destroy_render_pass(self.render_pass, None);
        }
        self.swapchain.cleanup();
        quill_info!(SOURCE, "Renderer destroyed after {} frames", self.frame);
    }

    fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()> {
        let wait_semaphores = [wait];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [signal];
        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.context
                .device()
                .queue_submit(self.context.graphics_queue(), &[submit_info], fence)
                .map_err(|e| quill_err!(SOURCE, "Failed to submit frame {}: {:?}", self.frame, e))
        }
    }

    fn record_clear(
        &self,
        command_buffer: vk::CommandBuffer,
        framebuffer: vk::Framebuffer,
        extent: Extent2D,
        color: [f32; 4],
    ) -> Result<()> {
        let device = self.context.device();
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        }];
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: extent.width, height: extent.height },
            })
            .clear_values(&clear_values);

        unsafe {
            device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| quill_err!(SOURCE, "Failed to reset command buffer: {:?}", e))?;
            device
                .begin_command_buffer(command_buffer, &vk::CommandBufferBeginInfo::default())
                .map_err(|e| quill_err!(SOURCE, "Failed to begin command buffer: {:?}", e))?;
            device.cmd_begin_render_pass(command_buffer, &begin_info, vk::SubpassContents::INLINE);
            device.cmd_end_render_pass(command_buffer);
            device
                .end_command_buffer(command_buffer)
                .map_err(|e| quill_err!(SOURCE, "Failed to end command buffer: {:?}", e))?;
        }
        Ok(())
    }

    fn create_chain_resources(&mut self) -> Result<()> {
        let extent = self
            .swapchain
            .extent()
            .ok_or_else(|| quill_err!(SOURCE, "Swapchain has no extent"))?;
        let image_count = self.swapchain.image_count();

        let template = FramebufferTemplate::color_only(self.render_pass, extent);
        let framebuffers = self.swapchain.create_framebuffers(&template)?;

        // Stored immediately so a partial failure below is released by destroy_chain_resources
        self.resources = Some(ChainResources {
            framebuffers,
            command_buffers: Vec::new(),
            image_available: None,
            render_finished: Vec::new(),
            extent,
        });

        let device = self.context.device();
        let Some(resources) = self.resources.as_mut() else {
            return Ok(());
        };

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(image_count as u32);
        resources.command_buffers = unsafe { device.allocate_command_buffers(&alloc_info) }
            .map_err(|e| quill_err!(SOURCE, "Failed to allocate command buffers: {:?}", e))?;

        // One acquire semaphore per image plus the spare
        let available = create_semaphores(device, image_count + 1)?;
        resources.image_available = AcquireSemaphores::from_handles(available);
        resources.render_finished = create_semaphores(device, image_count)?;
        Ok(())
    }

    fn destroy_chain_resources(&mut self) {
        let Some(resources) = self.resources.take() else {
            return;
        };
        let device = self.context.device();
        unsafe {
            for framebuffer in resources.framebuffers {
                device.destroy_framebuffer(framebuffer, None);
            }
            if !resources.command_buffers.is_empty() {
                device.free_command_buffers(self.command_pool, &resources.command_buffers);
            }
            let image_available = resources.image_available.into_iter().flat_map(AcquireSemaphores::into_handles);
            for semaphore in image_available.chain(resources.render_finished) {
                device.destroy_semaphore(semaphore, None);
            }
        }
    }
}

impl Drop for DemoRenderer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// `count` binary semaphores; on failure the ones already created are destroyed
fn create_semaphores(device: &toad_quill_renderer_vulkan::ash::Device, count: usize) -> Result<Vec<vk::Semaphore>> {
    let semaphore_info = vk::SemaphoreCreateInfo::default();
    let mut semaphores = Vec::with_capacity(count);
    for _ in 0..count {
        match unsafe { device.create_semaphore(&semaphore_info, None) } {
            Ok(semaphore) => semaphores.push(semaphore),
            Err(e) => {
                for semaphore in semaphores {
                    unsafe { device.destroy_semaphore(semaphore, None) };
                }
                return Err(quill_err!(SOURCE, "Failed to create semaphore: {:?}", e));
            }
        }
    }
    Ok(semaphores)
}

/// Single color attachment cleared on load and handed to the presentation engine
fn create_render_pass(device: &toad_quill_renderer_vulkan::ash::Device, format: vk::Format) -> Result<vk::RenderPass> {
    let color_attachment = vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

    let color_attachment_ref = vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(std::slice::from_ref(&color_attachment_ref));

    // Layout transition waits for the acquire semaphore stage
    let dependency = vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

    let render_pass_info = vk::RenderPassCreateInfo::default()
        .attachments(std::slice::from_ref(&color_attachment))
        .subpasses(std::slice::from_ref(&subpass))
        .dependencies(std::slice::from_ref(&dependency));

    unsafe { device.create_render_pass(&render_pass_info, None) }
        .map_err(|e| quill_err!(SOURCE, "Failed to create render pass: {:?}", e))
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
