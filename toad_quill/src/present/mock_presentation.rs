/// Mock presentation backend for unit tests (no GPU required)
///
/// Hands out integer handles, tracks which ones are alive, and records every
/// call in `events` so tests can check ordering. Acquire, present and fence
/// waits can be scripted; without a script they succeed.

use std::collections::{HashMap, VecDeque};

use crate::error::{Error, Result};
use crate::present::{
    AcquireStatus, ColorSpace, Extent2D, FenceWait, PresentMode, PresentStatus,
    PresentationBackend, SurfaceCapabilities, SurfaceFormat, SurfaceTransformFlags,
    SwapchainConfiguration, TextureFormat,
};

pub type Handle = u64;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    CreateChain { chain: Handle, old: Option<Handle>, image_count: u32 },
    DestroyChain(Handle),
    CreateView { view: Handle, image: Handle },
    DestroyView(Handle),
    Acquire { chain: Handle, signal: Option<Handle> },
    Present { chain: Handle, index: u32, wait: Option<Handle> },
    CreateFence { fence: Handle, signaled: bool },
    WaitFence(Handle),
    ResetFence(Handle),
    DestroyFence(Handle),
    CreateFramebuffer { framebuffer: Handle, color_view: Handle },
    DestroyFramebuffer(Handle),
    DestroySurface,
}

/// Framebuffer template: attachment 0 is replaced per image
#[derive(Debug, Clone)]
pub struct MockFramebufferTemplate {
    pub attachments: Vec<Handle>,
    pub extent: Extent2D,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockFramebuffer {
    pub handle: Handle,
    pub attachments: Vec<Handle>,
    pub extent: Extent2D,
}

pub struct MockPresentation {
    pub formats: Vec<SurfaceFormat>,
    pub capabilities: SurfaceCapabilities,
    pub present_modes: Vec<PresentMode>,
    /// Images handed out per chain; `None` means exactly the requested count
    pub images_per_chain: Option<u32>,

    pub acquire_script: VecDeque<AcquireStatus>,
    pub present_script: VecDeque<PresentStatus>,
    pub fence_wait_script: VecDeque<FenceWait>,

    pub fail_create_chain: bool,
    /// Fail the view creation after this many successful ones
    pub fail_view_after: Option<usize>,
    /// Fail the framebuffer creation after this many successful ones
    pub fail_framebuffer_after: Option<usize>,

    pub events: Vec<MockEvent>,
    pub last_config: Option<SwapchainConfiguration>,

    pub live_chains: HashMap<Handle, Vec<Handle>>,
    pub live_views: Vec<Handle>,
    /// Fence handle -> signaled
    pub live_fences: HashMap<Handle, bool>,
    pub live_framebuffers: Vec<Handle>,
    pub surface_alive: bool,

    next_handle: Handle,
    next_acquire: u32,
    views_created: usize,
    framebuffers_created: usize,
}

impl MockPresentation {
    /// Surface with an undefined extent, `min_image_count` 2, no maximum,
    /// one BGRA SRGB format and FIFO only
    pub fn new() -> Self {
        Self {
            formats: vec![SurfaceFormat {
                format: TextureFormat::B8G8R8A8_SRGB,
                color_space: ColorSpace::SrgbNonlinear,
            }],
            capabilities: SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 0,
                current_extent: Extent2D::UNDEFINED,
                min_image_extent: Extent2D::new(1, 1),
                max_image_extent: Extent2D::new(4096, 4096),
                supported_transforms: SurfaceTransformFlags::IDENTITY,
                current_transform: SurfaceTransformFlags::IDENTITY,
            },
            present_modes: vec![PresentMode::Fifo],
            images_per_chain: None,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            fence_wait_script: VecDeque::new(),
            fail_create_chain: false,
            fail_view_after: None,
            fail_framebuffer_after: None,
            events: Vec::new(),
            last_config: None,
            live_chains: HashMap::new(),
            live_views: Vec::new(),
            live_fences: HashMap::new(),
            live_framebuffers: Vec::new(),
            surface_alive: true,
            next_handle: 1,
            next_acquire: 0,
            views_created: 0,
            framebuffers_created: 0,
        }
    }

    fn allocate(&mut self) -> Handle {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    /// Simulate the GPU finishing the work that signals `fence`
    pub fn signal_fence(&mut self, fence: Handle) {
        if let Some(signaled) = self.live_fences.get_mut(&fence) {
            *signaled = true;
        }
    }

    pub fn fence_signaled(&self, fence: Handle) -> Option<bool> {
        self.live_fences.get(&fence).copied()
    }

    pub fn count(&self, matches: impl Fn(&MockEvent) -> bool) -> usize {
        self.events.iter().filter(|event| matches(event)).count()
    }

    pub fn position(&self, event: &MockEvent) -> Option<usize> {
        self.events.iter().position(|e| e == event)
    }
}

impl PresentationBackend for MockPresentation {
    type Chain = Handle;
    type Image = Handle;
    type ImageView = Handle;
    type Fence = Handle;
    type Semaphore = Handle;
    type Framebuffer = MockFramebuffer;
    type FramebufferTemplate = MockFramebufferTemplate;

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        Ok(self.formats.clone())
    }

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(self.capabilities)
    }

    fn present_modes(&self) -> Result<Vec<PresentMode>> {
        Ok(self.present_modes.clone())
    }

    fn create_chain(
        &mut self,
        config: &SwapchainConfiguration,
        old_chain: Option<Handle>,
    ) -> Result<Handle> {
        if self.fail_create_chain {
            return Err(Error::InitializationFailed("mock chain creation refused".to_string()));
        }
        let chain = self.allocate();
        let count = self.images_per_chain.unwrap_or(config.image_count);
        let images = (0..count).map(|_| self.allocate()).collect();
        self.live_chains.insert(chain, images);
        self.last_config = Some(*config);
        self.next_acquire = 0;
        self.events.push(MockEvent::CreateChain { chain, old: old_chain, image_count: count });
        Ok(chain)
    }

    fn destroy_chain(&mut self, chain: Handle) {
        assert!(self.live_chains.remove(&chain).is_some(), "chain {} destroyed twice", chain);
        self.events.push(MockEvent::DestroyChain(chain));
    }

    fn chain_images(&self, chain: Handle) -> Result<Vec<Handle>> {
        self.live_chains
            .get(&chain)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("unknown chain {}", chain)))
    }

    fn create_image_view(&mut self, image: Handle, _format: TextureFormat) -> Result<Handle> {
        if self.fail_view_after == Some(self.views_created) {
            return Err(Error::OutOfMemory);
        }
        self.views_created += 1;
        let view = self.allocate();
        self.live_views.push(view);
        self.events.push(MockEvent::CreateView { view, image });
        Ok(view)
    }

    fn destroy_image_view(&mut self, view: Handle) {
        let index = self
            .live_views
            .iter()
            .position(|&v| v == view)
            .unwrap_or_else(|| panic!("view {} destroyed twice", view));
        self.live_views.remove(index);
        self.events.push(MockEvent::DestroyView(view));
    }

    fn acquire_next_image(
        &mut self,
        chain: Handle,
        _timeout_ns: u64,
        signal: Option<Handle>,
    ) -> AcquireStatus {
        self.events.push(MockEvent::Acquire { chain, signal });
        if let Some(status) = self.acquire_script.pop_front() {
            return status;
        }
        let count = self.live_chains.get(&chain).map(|images| images.len()).unwrap_or(0) as u32;
        if count == 0 {
            return AcquireStatus::OutOfDate;
        }
        let index = self.next_acquire % count;
        self.next_acquire += 1;
        AcquireStatus::Acquired { index, suboptimal: false }
    }

    fn queue_present(&mut self, chain: Handle, image_index: u32, wait: Option<Handle>) -> PresentStatus {
        self.events.push(MockEvent::Present { chain, index: image_index, wait });
        self.present_script.pop_front().unwrap_or(PresentStatus::Success)
    }

    fn create_fence(&mut self, signaled: bool) -> Result<Handle> {
        let fence = self.allocate();
        self.live_fences.insert(fence, signaled);
        self.events.push(MockEvent::CreateFence { fence, signaled });
        Ok(fence)
    }

    fn wait_for_fence(&mut self, fence: Handle, _timeout_ns: u64) -> Result<FenceWait> {
        self.events.push(MockEvent::WaitFence(fence));
        if !self.live_fences.contains_key(&fence) {
            return Err(Error::InvalidResource(format!("unknown fence {}", fence)));
        }
        if let Some(result) = self.fence_wait_script.pop_front() {
            if result == FenceWait::Signaled {
                self.signal_fence(fence);
            }
            return Ok(result);
        }
        // Pending GPU work completes while we wait
        self.signal_fence(fence);
        Ok(FenceWait::Signaled)
    }

    fn reset_fence(&mut self, fence: Handle) -> Result<()> {
        match self.live_fences.get_mut(&fence) {
            Some(signaled) => {
                *signaled = false;
                self.events.push(MockEvent::ResetFence(fence));
                Ok(())
            }
            None => Err(Error::InvalidResource(format!("unknown fence {}", fence))),
        }
    }

    fn destroy_fence(&mut self, fence: Handle) {
        assert!(self.live_fences.remove(&fence).is_some(), "fence {} destroyed twice", fence);
        self.events.push(MockEvent::DestroyFence(fence));
    }

    fn create_framebuffer(
        &mut self,
        template: &MockFramebufferTemplate,
        color_view: Handle,
    ) -> Result<MockFramebuffer> {
        if self.fail_framebuffer_after == Some(self.framebuffers_created) {
            return Err(Error::OutOfMemory);
        }
        self.framebuffers_created += 1;
        let handle = self.allocate();
        let mut attachments = template.attachments.clone();
        match attachments.first_mut() {
            Some(first) => *first = color_view,
            None => attachments.push(color_view),
        }
        self.live_framebuffers.push(handle);
        self.events.push(MockEvent::CreateFramebuffer { framebuffer: handle, color_view });
        Ok(MockFramebuffer { handle, attachments, extent: template.extent })
    }

    fn destroy_framebuffer(&mut self, framebuffer: MockFramebuffer) {
        self.live_framebuffers.retain(|&f| f != framebuffer.handle);
        self.events.push(MockEvent::DestroyFramebuffer(framebuffer.handle));
    }

    fn destroy_surface(&mut self) {
        assert!(self.surface_alive, "surface destroyed twice");
        self.surface_alive = false;
        self.events.push(MockEvent::DestroySurface);
    }
}
