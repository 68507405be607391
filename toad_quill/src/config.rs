/// Application configuration shared by the Vulkan context and the demo

use crate::log::LogSeverity;
use crate::present::Extent2D;

/// Which validation-layer messages are forwarded to the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything including info and verbose
    All,
}

/// Configuration for the demo application
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (window title, VkApplicationInfo)
    pub app_name: String,
    /// Initial window size, also the fallback swapchain extent
    pub window_extent: Extent2D,
    /// Enable the Khronos validation layer and debug messenger
    pub enable_validation: bool,
    /// Validation messages forwarded to the logger
    pub validation_severity: DebugSeverity,
    /// Minimum severity printed by the logger
    pub log_severity: LogSeverity,
    /// Base clear color (RGBA)
    pub clear_color: [f32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Demo Toad Quill".to_string(),
            window_extent: Extent2D::new(640, 480),
            enable_validation: cfg!(debug_assertions),
            validation_severity: DebugSeverity::ErrorsAndWarnings,
            log_severity: LogSeverity::Info,
            clear_color: [0.1, 0.2, 0.3, 1.0],
        }
    }
}
