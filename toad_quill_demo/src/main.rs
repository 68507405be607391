//! Demo Toad Quill - clears the window to a pulsing color
//!
//! Drives the swapchain manager through its whole lifecycle: construct at the
//! configured size, per-frame acquire / fence / present, rebuild on resize or
//! out-of-date, cleanup on exit.

mod renderer;

use renderer::{DemoRenderer, FrameResult};
use toad_quill::quill::present::Extent2D;
use toad_quill::quill::{Config, Log, Result};
use toad_quill::{quill_debug, quill_error, quill_info, quill_warn};
use toad_quill_renderer_vulkan::quill::{print_validation_stats_report, validation_stats};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const SOURCE: &str = "quill::demo";

fn main() {
    let config = Config::default();
    Log::set_min_severity(config.log_severity);

    if let Err(e) = run(config) {
        quill_error!(SOURCE, "Demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<()> {
    let event_loop = EventLoop::new()
        .map_err(|e| toad_quill::quill_err!(SOURCE, "Failed to create event loop: {}", e))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let enable_validation = config.enable_validation;
    let mut app = App::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| toad_quill::quill_err!(SOURCE, "Event loop failed: {}", e))?;

    if enable_validation && validation_stats().total() > 0 {
        print_validation_stats_report();
    }

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Converts a window size into a swapchain target extent
fn window_extent(size: PhysicalSize<u32>) -> Extent2D {
    Extent2D::new(size.width, size.height)
}

struct App {
    config: Config,
    // Declared before the window so it is dropped first
    renderer: Option<DemoRenderer>,
    window: Option<Window>,
    needs_rebuild: bool,
    error: Option<toad_quill::quill::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            renderer: None,
            window: None,
            needs_rebuild: false,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let extent = self.config.window_extent;
        let window_attrs = Window::default_attributes()
            .with_title(self.config.app_name.clone())
            .with_inner_size(PhysicalSize::new(extent.width, extent.height));
        let window = event_loop
            .create_window(window_attrs)
            .map_err(|e| toad_quill::quill_err!(SOURCE, "Failed to create window: {}", e))?;

        let renderer = DemoRenderer::new(&window, &self.config, window_extent(window.inner_size()))?;
        quill_info!(
            SOURCE,
            "Window '{}' ready, swapchain {:?}",
            self.config.app_name,
            renderer.swapchain().extent()
        );

        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(renderer), Some(window)) = (self.renderer.as_mut(), self.window.as_ref()) else {
            return Ok(());
        };

        // Minimized: nothing to present until the window has an area again
        let extent = window_extent(window.inner_size());
        if extent.is_empty() {
            return Ok(());
        }

        if self.needs_rebuild {
            renderer.rebuild(extent)?;
            self.needs_rebuild = false;
        }

        if renderer.draw_frame()? == FrameResult::NeedsRebuild {
            quill_debug!(SOURCE, "Swapchain out of date, rebuilding next frame");
            self.needs_rebuild = true;
        }
        Ok(())
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }
        self.window = None;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: toad_quill::quill::Error) {
        quill_error!(SOURCE, "{}", error);
        self.error = Some(error);
        self.shutdown(event_loop);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                quill_info!(SOURCE, "Close requested");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                quill_debug!(SOURCE, "Window resized to {}x{}", size.width, size.height);
                self.needs_rebuild = true;
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut renderer) = self.renderer.take() {
            quill_warn!(SOURCE, "Event loop exiting with a live renderer, destroying it");
            renderer.destroy();
        }
    }
}
