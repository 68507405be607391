/// Swapchain - lifecycle manager for the chain of presentable images
///
/// Owns the chain, one view and one lazily created fence per image, and the
/// surface. Mediates acquire/present and rebuilds the chain on resize.

use crate::error::{Error, Result};
use crate::present::selection::{
    choose_extent, choose_image_count, choose_pre_transform, choose_present_mode,
    choose_surface_format,
};
use crate::present::{
    AcquireStatus, ColorSpace, Extent2D, FenceWait, PresentMode, PresentStatus,
    PresentationBackend, SurfaceFormat, SwapchainConfiguration, TextureFormat,
};
use crate::{quill_debug, quill_err, quill_error, quill_info, quill_trace, quill_warn};

const SOURCE: &str = "quill::swapchain";

/// Acquire and fence waits never time out
const NO_TIMEOUT: u64 = u64::MAX;

/// Lifecycle of a `Swapchain`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainState {
    /// Created, no chain yet (or the last construction failed)
    Unconstructed,
    /// A chain is live
    Ready,
    /// Inside `construct` while a previous chain is being replaced
    Rebuilding,
    /// `cleanup` ran; terminal
    Destroyed,
}

/// Result of `Swapchain::acquire_next_image`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// `index` is now the current image
    Acquired { index: u32, suboptimal: bool },
    /// The chain is out of date; call `construct` before rendering again
    NeedsRebuild,
}

/// One entry of the chain
pub struct PresentableImage<B: PresentationBackend> {
    pub image: B::Image,
    pub view: B::ImageView,
    /// Created on the slot's first `submit_fence`, reused afterwards
    pub fence: Option<B::Fence>,
}

/// Swapchain manager
///
/// # Example
///
/// ```ignore
/// let mut swapchain = Swapchain::new(backend)?;
/// swapchain.construct(Extent2D::new(640, 480))?;
///
/// loop {
///     match swapchain.acquire_next_image(Some(image_available))? {
///         AcquireOutcome::NeedsRebuild => { swapchain.construct(size)?; continue; }
///         AcquireOutcome::Acquired { .. } => {}
///     }
///     let fence = swapchain.submit_fence()?;
///     // submit work writing the current image, signaling `fence` and `render_finished`
///     let status = swapchain.queue_present(Some(render_finished))?;
/// }
///
/// swapchain.cleanup();
/// ```
pub struct Swapchain<B: PresentationBackend> {
    backend: B,
    surface_format: SurfaceFormat,
    chain: Option<B::Chain>,
    images: Vec<PresentableImage<B>>,
    configuration: Option<SwapchainConfiguration>,
    current_image: u32,
    state: SwapchainState,
}

impl<B: PresentationBackend> Swapchain<B> {
    /// Take ownership of `backend` and pick the color format
    ///
    /// No chain is created until `construct`.
    pub fn new(backend: B) -> Result<Self> {
        let formats = backend.surface_formats()?;
        let surface_format = choose_surface_format(&formats).map_err(|e| {
            quill_error!(SOURCE, "Cannot pick a surface format: {}", e);
            e
        })?;

        quill_debug!(
            SOURCE,
            "Surface format {:?} / {:?} ({} reported)",
            surface_format.format,
            surface_format.color_space,
            formats.len()
        );

        Ok(Self {
            backend,
            surface_format,
            chain: None,
            images: Vec::new(),
            configuration: None,
            current_image: 0,
            state: SwapchainState::Unconstructed,
        })
    }

    /// Build the chain, replacing the current one if any
    ///
    /// `target_extent` is used only when the surface leaves the size to the
    /// swapchain. The previous chain is handed to the backend, and destroyed
    /// only once the new one exists.
    pub fn construct(&mut self, target_extent: Extent2D) -> Result<()> {
        self.ensure_not_destroyed("construct")?;

        let capabilities = self.backend.surface_capabilities()?;
        let present_modes = self.backend.present_modes()?;

        let config = SwapchainConfiguration {
            surface_format: self.surface_format,
            present_mode: choose_present_mode(&present_modes),
            extent: choose_extent(&capabilities, target_extent),
            image_count: choose_image_count(&capabilities),
            pre_transform: choose_pre_transform(&capabilities),
        };

        let old_chain = self.chain;
        let previous_state = self.state;
        if old_chain.is_some() {
            self.state = SwapchainState::Rebuilding;
        }

        let new_chain = match self.backend.create_chain(&config, old_chain) {
            Ok(chain) => chain,
            Err(e) => {
                self.state = previous_state;
                quill_error!(SOURCE, "Swapchain creation failed: {}", e);
                return Err(e);
            }
        };

        // New chain is live; retire the old one
        self.chain = Some(new_chain);
        self.configuration = Some(config);
        self.current_image = 0;
        let retired = std::mem::take(&mut self.images);
        if let Some(old) = old_chain {
            destroy_images(&mut self.backend, retired);
            self.backend.destroy_chain(old);
            quill_debug!(SOURCE, "Retired previous chain {:?}", old);
        }

        match build_images(&mut self.backend, new_chain, config.surface_format.format) {
            Ok(images) => self.images = images,
            Err(e) => {
                self.backend.destroy_chain(new_chain);
                self.chain = None;
                self.configuration = None;
                self.state = SwapchainState::Unconstructed;
                quill_error!(SOURCE, "Swapchain image setup failed: {}", e);
                return Err(e);
            }
        }

        self.state = SwapchainState::Ready;
        quill_info!(
            SOURCE,
            "Swapchain {}: {} ({} images)",
            if old_chain.is_some() { "rebuilt" } else { "built" },
            config,
            self.images.len()
        );
        Ok(())
    }

    /// Wait (without timeout) for the next image
    ///
    /// On success the returned index becomes the current image. An out-of-date
    /// chain yields `AcquireOutcome::NeedsRebuild` and leaves the current image
    /// unchanged.
    pub fn acquire_next_image(&mut self, signal: Option<B::Semaphore>) -> Result<AcquireOutcome> {
        let chain = self.live_chain("acquire_next_image")?;

        loop {
            match self.backend.acquire_next_image(chain, NO_TIMEOUT, signal) {
                AcquireStatus::Acquired { index, suboptimal } => {
                    if index as usize >= self.images.len() {
                        quill_error!(
                            SOURCE,
                            "Backend acquired image {} but the chain has {}",
                            index,
                            self.images.len()
                        );
                        return Err(Error::InvalidResource(format!(
                            "Acquired image index {} out of range (count: {})",
                            index,
                            self.images.len()
                        )));
                    }
                    if suboptimal {
                        quill_debug!(SOURCE, "Acquired image {} from a suboptimal chain", index);
                    } else {
                        quill_trace!(SOURCE, "Acquired image {}", index);
                    }
                    self.current_image = index;
                    return Ok(AcquireOutcome::Acquired { index, suboptimal });
                }
                AcquireStatus::Timeout | AcquireStatus::NotReady => continue,
                AcquireStatus::OutOfDate => {
                    quill_warn!(SOURCE, "Swapchain out of date during acquire");
                    return Ok(AcquireOutcome::NeedsRebuild);
                }
                AcquireStatus::SurfaceLost => {
                    quill_error!(SOURCE, "Surface lost during acquire");
                    return Err(Error::SurfaceLost);
                }
                AcquireStatus::DeviceLost => {
                    quill_error!(SOURCE, "Device lost during acquire");
                    return Err(Error::DeviceLost);
                }
                AcquireStatus::Failed(code) => {
                    return Err(quill_err!(SOURCE, "Failed to acquire next image: result {}", code));
                }
            }
        }
    }

    /// Fence guarding the current image's resources
    ///
    /// Waits for and resets the fence left by the previous use of this slot,
    /// or creates it unsignaled on first use. The caller must signal the
    /// returned fence with the submission that writes the current image.
    pub fn submit_fence(&mut self) -> Result<B::Fence> {
        self.live_chain("submit_fence")?;

        let index = self.current_image as usize;
        let existing = self
            .images
            .get(index)
            .ok_or_else(|| Error::InvalidResource(format!("No image at index {}", index)))?
            .fence;

        match existing {
            Some(fence) => {
                wait_signaled(&mut self.backend, fence)?;
                self.backend.reset_fence(fence)?;
                Ok(fence)
            }
            None => {
                let fence = self.backend.create_fence(false)?;
                self.images[index].fence = Some(fence);
                quill_trace!(SOURCE, "Created fence for image {}", index);
                Ok(fence)
            }
        }
    }

    /// Drop the current image's fence after a frame was abandoned
    ///
    /// For use when `submit_fence` returned but no submission signaling the
    /// fence was made: the fence is destroyed without a wait so a later
    /// `cleanup` or `construct` does not block on it. The next `submit_fence`
    /// for the slot creates a fresh one.
    pub fn discard_submit_fence(&mut self) -> Result<()> {
        self.live_chain("discard_submit_fence")?;

        let index = self.current_image as usize;
        let slot = self
            .images
            .get_mut(index)
            .ok_or_else(|| Error::InvalidResource(format!("No image at index {}", index)))?;

        if let Some(fence) = slot.fence.take() {
            self.backend.destroy_fence(fence);
            quill_debug!(SOURCE, "Discarded unsubmitted fence of image {}", index);
        }
        Ok(())
    }

    /// Present the current image, waiting on `wait` if given
    ///
    /// The backend status is returned as is; rebuilding on `OutOfDate` or
    /// `Suboptimal` is up to the caller.
    pub fn queue_present(&mut self, wait: Option<B::Semaphore>) -> Result<PresentStatus> {
        let chain = self.live_chain("queue_present")?;
        let status = self.backend.queue_present(chain, self.current_image, wait);

        match status {
            PresentStatus::Success => {}
            PresentStatus::Suboptimal | PresentStatus::OutOfDate => {
                quill_debug!(SOURCE, "Present of image {} returned {:?}", self.current_image, status);
            }
            _ => {
                quill_warn!(SOURCE, "Present of image {} returned {:?}", self.current_image, status);
            }
        }
        Ok(status)
    }

    /// One framebuffer per image, with that image's view as attachment 0
    ///
    /// The caller owns the returned framebuffers and must destroy them before
    /// the next `construct` or `cleanup`.
    pub fn create_framebuffers(
        &mut self,
        template: &B::FramebufferTemplate,
    ) -> Result<Vec<B::Framebuffer>> {
        self.live_chain("create_framebuffers")?;

        let mut framebuffers = Vec::with_capacity(self.images.len());
        for image in &self.images {
            match self.backend.create_framebuffer(template, image.view) {
                Ok(framebuffer) => framebuffers.push(framebuffer),
                Err(e) => {
                    for framebuffer in framebuffers {
                        self.backend.destroy_framebuffer(framebuffer);
                    }
                    quill_error!(SOURCE, "Framebuffer creation failed: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(framebuffers)
    }

    /// Tear everything down: fences, views, chain, surface
    ///
    /// Waits on every outstanding fence first. A second call does nothing;
    /// every other operation fails with `Error::InvalidState` afterwards.
    pub fn cleanup(&mut self) {
        if self.state == SwapchainState::Destroyed {
            quill_warn!(SOURCE, "cleanup called on a destroyed swapchain");
            return;
        }

        let images = std::mem::take(&mut self.images);
        destroy_images(&mut self.backend, images);

        if let Some(chain) = self.chain.take() {
            self.backend.destroy_chain(chain);
        }
        self.backend.destroy_surface();

        self.configuration = None;
        self.state = SwapchainState::Destroyed;
        quill_info!(SOURCE, "Swapchain destroyed");
    }

    // ===== ACCESSORS =====

    pub fn state(&self) -> SwapchainState {
        self.state
    }

    /// Configuration of the live chain
    pub fn configuration(&self) -> Option<&SwapchainConfiguration> {
        self.configuration.as_ref()
    }

    /// Number of images in the live chain
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn images(&self) -> &[PresentableImage<B>] {
        &self.images
    }

    pub fn image_views(&self) -> Vec<B::ImageView> {
        self.images.iter().map(|image| image.view).collect()
    }

    pub fn current_image(&self) -> u32 {
        self.current_image
    }

    pub fn extent(&self) -> Option<Extent2D> {
        self.configuration.map(|config| config.extent)
    }

    pub fn present_mode(&self) -> Option<PresentMode> {
        self.configuration.map(|config| config.present_mode)
    }

    pub fn color_format(&self) -> TextureFormat {
        self.surface_format.format
    }

    pub fn color_space(&self) -> ColorSpace {
        self.surface_format.color_space
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // ===== INTERNAL =====

    fn ensure_not_destroyed(&self, operation: &str) -> Result<()> {
        if self.state == SwapchainState::Destroyed {
            quill_error!(SOURCE, "{} called after cleanup", operation);
            return Err(Error::InvalidState(format!("{} called after cleanup", operation)));
        }
        Ok(())
    }

    fn live_chain(&self, operation: &str) -> Result<B::Chain> {
        self.ensure_not_destroyed(operation)?;
        self.chain.ok_or_else(|| {
            quill_error!(SOURCE, "{} called before construct", operation);
            Error::InvalidState(format!("{} called before construct", operation))
        })
    }
}

impl<B: PresentationBackend> Drop for Swapchain<B> {
    fn drop(&mut self) {
        if self.state != SwapchainState::Destroyed {
            self.cleanup();
        }
    }
}

/// Block until `fence` signals, retrying on timeout
fn wait_signaled<B: PresentationBackend>(backend: &mut B, fence: B::Fence) -> Result<()> {
    loop {
        match backend.wait_for_fence(fence, NO_TIMEOUT)? {
            FenceWait::Signaled => return Ok(()),
            FenceWait::Timeout => continue,
        }
    }
}

/// Enumerate the chain's images and create one view per image
///
/// On failure the views created so far are destroyed.
fn build_images<B: PresentationBackend>(
    backend: &mut B,
    chain: B::Chain,
    format: TextureFormat,
) -> Result<Vec<PresentableImage<B>>> {
    let chain_images = backend.chain_images(chain)?;

    let mut images: Vec<PresentableImage<B>> = Vec::with_capacity(chain_images.len());
    for image in chain_images {
        match backend.create_image_view(image, format) {
            Ok(view) => images.push(PresentableImage { image, view, fence: None }),
            Err(e) => {
                destroy_images(backend, images);
                return Err(e);
            }
        }
    }
    Ok(images)
}

/// Wait on and destroy each image's fence, then destroy its view
///
/// Images themselves belong to the chain.
fn destroy_images<B: PresentationBackend>(backend: &mut B, images: Vec<PresentableImage<B>>) {
    for image in images {
        if let Some(fence) = image.fence {
            if let Err(e) = wait_signaled(backend, fence) {
                quill_warn!(SOURCE, "Destroying fence {:?} without a completed wait: {}", fence, e);
            }
            backend.destroy_fence(fence);
        }
        backend.destroy_image_view(image.view);
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
