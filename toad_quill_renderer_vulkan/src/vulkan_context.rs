/// VulkanContext - instance, surface and device shared by the presentation backend
///
/// Contains everything the swapchain needs from Vulkan:
/// - Instance (plus the validation messenger when enabled)
/// - Window surface
/// - Logical device with graphics, compute and transfer queues
/// - Surface and swapchain extension loaders

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::sync::atomic::{AtomicBool, Ordering};
use toad_quill::quill::present::{find_queue_family, QueueFamily, QueueFlags};
use toad_quill::quill::{Config, DebugSeverity, Error, Result};
use toad_quill::{quill_debug, quill_error, quill_info, quill_warn};

const SOURCE: &str = "quill::vulkan";

/// Anything a Vulkan surface can be created for
pub trait WindowHandles: HasDisplayHandle + HasWindowHandle {}

impl<T: HasDisplayHandle + HasWindowHandle> WindowHandles for T {}

/// Shared Vulkan context.
///
/// Shared (via `Arc`) between the presentation backend and the application,
/// which records and submits its own command buffers on `graphics_queue()`.
/// Destroys the device, the surface (unless the swapchain already did) and the
/// instance when the last reference is dropped.
pub struct VulkanContext {
    _entry: ash::Entry,
    instance: ash::Instance,

    /// Debug utils loader (for validation layers)
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    /// Debug messenger handle
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,

    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    /// Cleared once `destroy_surface` ran
    surface_alive: AtomicBool,

    physical_device: vk::PhysicalDevice,
    queue_families: Vec<QueueFamily>,

    device: ash::Device,
    swapchain_loader: ash::khr::swapchain::Device,

    graphics_queue: vk::Queue,
    graphics_queue_family: u32,
    compute_queue_family: u32,
    transfer_queue_family: u32,
}

impl VulkanContext {
    /// Bring up Vulkan for `window`
    ///
    /// Picks the first physical device. The graphics family must be able to
    /// present to the window surface; compute and transfer fall back to the
    /// graphics family when no better match exists.
    pub fn new<W: WindowHandles + ?Sized>(window: &W, config: &Config) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            // Application Info
            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| {
                    quill_error!(SOURCE, "Invalid application name: {}", e);
                    Error::InitializationFailed(format!("Invalid application name: {}", e))
                })?;

            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Toad Quill")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_0);

            // Get required extensions
            let display_handle = window.display_handle()
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to get display handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get display handle: {}", e))
                })?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to get required extensions: {}", e);
                    Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
                })?
                .to_vec();

            // Add debug utils extension if validation is enabled
            if config.enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            // Validation layers
            let layer_names = if config.enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            // Undone in reverse if any later step fails
            let mut rollback = Rollback::new();
            {
                let instance = instance.clone();
                rollback.push("instance", move || instance.destroy_instance(None));
            }

            // Setup debug messenger if validation is enabled
            let (debug_utils_loader, debug_messenger) = if config.enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                rollback.push("debug config", crate::debug::cleanup_debug_config);
                let messenger = create_debug_messenger(&debug_utils, config.validation_severity)?;
                {
                    let debug_utils = debug_utils.clone();
                    rollback.push("debug messenger", move || {
                        debug_utils.destroy_debug_utils_messenger(messenger, None)
                    });
                }
                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            // Create Surface
            let window_handle = window.window_handle()
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to get window handle: {}", e);
                    Error::InitializationFailed(format!("Failed to get window handle: {}", e))
                })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                quill_error!(SOURCE, "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
            {
                let surface_loader = surface_loader.clone();
                rollback.push("surface", move || surface_loader.destroy_surface(surface, None));
            }

            // Pick Physical Device
            let physical_devices = instance
                .enumerate_physical_devices()
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
                })?;

            let physical_device = physical_devices
                .into_iter()
                .next()
                .ok_or_else(|| {
                    quill_error!(SOURCE, "No Vulkan-capable GPU found");
                    Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
                })?;

            // Find Queue Families
            let queue_families: Vec<QueueFamily> = instance
                .get_physical_device_queue_family_properties(physical_device)
                .iter()
                .map(queue_family_from_vk)
                .collect();

            let can_present = |index: u32| {
                surface_loader
                    .get_physical_device_surface_support(physical_device, index, surface)
                    .unwrap_or(false)
            };

            let graphics_family_index = find_queue_family(&queue_families, QueueFlags::GRAPHICS, Some(can_present))
                .ok_or_else(|| {
                    quill_error!(SOURCE, "No graphics queue family can present to the surface");
                    Error::InitializationFailed("No presentable graphics queue family found".to_string())
                })?;
            let compute_family_index =
                find_queue_family(&queue_families, QueueFlags::COMPUTE, None::<fn(u32) -> bool>)
                    .unwrap_or(graphics_family_index);
            let transfer_family_index =
                find_queue_family(&queue_families, QueueFlags::TRANSFER, None::<fn(u32) -> bool>)
                    .unwrap_or(graphics_family_index);

            // Create Logical Device (one queue per distinct family)
            let queue_priorities = [1.0];
            let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> =
                distinct_families(&[graphics_family_index, compute_family_index, transfer_family_index])
                    .into_iter()
                    .map(|family| {
                        vk::DeviceQueueCreateInfo::default()
                            .queue_family_index(family)
                            .queue_priorities(&queue_priorities)
                    })
                    .collect();

            let available_extensions = instance
                .enumerate_device_extension_properties(physical_device)
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to enumerate device extensions: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate device extensions: {:?}", e))
                })?;
            let has_extension = |name: &CStr| {
                available_extensions
                    .iter()
                    .any(|ext| ext.extension_name_as_c_str().map(|n| n == name).unwrap_or(false))
            };

            if !has_extension(ash::khr::swapchain::NAME) {
                quill_error!(SOURCE, "Device does not support VK_KHR_swapchain");
                return Err(Error::InitializationFailed("VK_KHR_swapchain not supported".to_string()));
            }

            let mut device_extension_names = vec![ash::khr::swapchain::NAME.as_ptr()];
            if has_extension(ash::ext::debug_marker::NAME) {
                device_extension_names.push(ash::ext::debug_marker::NAME.as_ptr());
                quill_debug!(SOURCE, "Enabling VK_EXT_debug_marker");
            }

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    quill_error!(SOURCE, "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            // The context owns everything from here on
            rollback.disarm();

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            quill_info!(
                SOURCE,
                "Vulkan device ready (graphics family {}, compute family {}, transfer family {})",
                graphics_family_index,
                compute_family_index,
                transfer_family_index
            );

            Ok(Self {
                _entry: entry,
                instance,
                debug_utils_loader,
                debug_messenger,
                surface_loader,
                surface,
                surface_alive: AtomicBool::new(true),
                physical_device,
                queue_families,
                device,
                swapchain_loader,
                graphics_queue,
                graphics_queue_family: graphics_family_index,
                compute_queue_family: compute_family_index,
                transfer_queue_family: transfer_family_index,
            })
        }
    }

    /// Log device name and type, memory heaps and queue families
    pub fn log_diagnostic_info(&self) {
        let (properties, memory) = unsafe {
            (
                self.instance.get_physical_device_properties(self.physical_device),
                self.instance.get_physical_device_memory_properties(self.physical_device),
            )
        };

        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unnamed>".to_string());
        quill_info!(
            SOURCE,
            "Device: {} ({:?}), Vulkan {}.{}.{}",
            name,
            properties.device_type,
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version),
            vk::api_version_patch(properties.api_version)
        );

        for (index, heap) in memory.memory_heaps_as_slice().iter().enumerate() {
            quill_info!(
                SOURCE,
                "Memory heap {}: {} MiB{}",
                index,
                heap.size / (1024 * 1024),
                if heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL) { " (device local)" } else { "" }
            );
        }

        for (index, family) in self.queue_families.iter().enumerate() {
            quill_info!(
                SOURCE,
                "Queue family {}: {} queue(s), {:?}",
                index,
                family.queue_count,
                family.flags
            );
        }
    }

    // ===== ACCESSORS =====

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn surface_loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }

    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    /// Queue used for rendering and presentation
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    pub fn compute_queue_family(&self) -> u32 {
        self.compute_queue_family
    }

    pub fn transfer_queue_family(&self) -> u32 {
        self.transfer_queue_family
    }

    pub fn queue_families(&self) -> &[QueueFamily] {
        &self.queue_families
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle().map_err(|e| match e {
                vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
                _ => toad_quill::quill_err!(SOURCE, "Failed to wait for device idle: {:?}", e),
            })
        }
    }

    /// Destroy the window surface (once)
    pub(crate) fn destroy_surface(&self) {
        if self.surface_alive.swap(false, Ordering::SeqCst) {
            unsafe {
                self.surface_loader.destroy_surface(self.surface, None);
            }
            quill_debug!(SOURCE, "Surface destroyed");
        }
    }

    pub(crate) fn surface_alive(&self) -> bool {
        self.surface_alive.load(Ordering::SeqCst)
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                quill_warn!(SOURCE, "device_wait_idle failed during shutdown: {:?}", e);
            }

            self.device.destroy_device(None);
            self.destroy_surface();

            // Stop routing callbacks before the messenger goes away
            crate::debug::cleanup_debug_config();
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
        quill_debug!(SOURCE, "Vulkan context destroyed");
    }
}

/// Create the validation messenger for `severity`
unsafe fn create_debug_messenger(
    debug_utils: &ash::ext::debug_utils::Instance,
    severity: DebugSeverity,
) -> Result<vk::DebugUtilsMessengerEXT> {
    crate::debug::init_debug_config(crate::debug::DebugConfig { severity });

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(crate::debug::severity_flags(severity))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

    debug_utils
        .create_debug_utils_messenger(&debug_info, None)
        .map_err(|e| {
            quill_error!(SOURCE, "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })
}

/// Teardown steps for a partially built context
///
/// Dropping an armed rollback runs the steps in reverse order of `push`.
pub(crate) struct Rollback {
    steps: Vec<(&'static str, Box<dyn FnOnce()>)>,
}

impl Rollback {
    pub(crate) fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// `step` must only reference handles that stay valid until it runs
    pub(crate) fn push(&mut self, name: &'static str, step: impl FnOnce() + 'static) {
        self.steps.push((name, Box::new(step)));
    }

    /// Ownership moved elsewhere; nothing is undone
    pub(crate) fn disarm(mut self) {
        self.steps.clear();
    }
}

impl Drop for Rollback {
    fn drop(&mut self) {
        while let Some((name, step)) = self.steps.pop() {
            quill_debug!(SOURCE, "Releasing {} after failed bring-up", name);
            step();
        }
    }
}

/// Core view of one `VkQueueFamilyProperties`
pub(crate) fn queue_family_from_vk(properties: &vk::QueueFamilyProperties) -> QueueFamily {
    QueueFamily {
        flags: QueueFlags::from_bits_truncate(properties.queue_flags.as_raw()),
        queue_count: properties.queue_count,
    }
}

/// Family indices in first-seen order without duplicates
pub(crate) fn distinct_families(families: &[u32]) -> Vec<u32> {
    let mut distinct = Vec::with_capacity(families.len());
    for &family in families {
        if !distinct.contains(&family) {
            distinct.push(family);
        }
    }
    distinct
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
