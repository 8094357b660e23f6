// Window module - Native host built on winit and pixels
//
// The window owns the event loop; the presentation loop runs inside its
// callbacks. Each redraw that follows a scheduled refresh becomes one
// `LoopController::on_frame` call, with the timestamp measured from window
// creation. Closing the window (or pressing Escape) requests a stop; the
// frame that observes it ends the event loop after the blank frame.
// Dropping a file onto the window submits it as a ROM.

use crate::config::VideoConfig;
use crate::host::{Compositor, FrameScheduler, StatusSurface};
use crate::rom::{Emulator, HostBuffer, RomBridge};
use crate::session::{LoopController, LoopError, LoopState, StopHandle};
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const TITLE: &str = "gb-canvas";

/// Errors that end a windowed session
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Os(#[from] winit::error::OsError),

    #[error("pixel surface error: {0}")]
    Pixels(#[from] pixels::Error),

    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Window configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Pixel buffer width
    pub width: usize,
    /// Pixel buffer height
    pub height: usize,
    /// Scale factor (1x, 2x, 3x, 4x, etc.)
    pub scale: u32,
    /// Refresh rate used when VSync is off
    pub target_fps: u32,
    /// Whether to enable VSync
    pub vsync: bool,
}

impl WindowConfig {
    /// 3x scale, 60 FPS, VSync enabled
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            scale: 3,
            target_fps: 60,
            vsync: true,
        }
    }

    pub fn from_video(video: &VideoConfig) -> Self {
        Self::new(video.width, video.height)
            .with_scale(video.scale)
            .with_fps(video.target_fps)
            .with_vsync(video.vsync)
    }

    /// Set the scale factor
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale.clamp(1, 8); // Clamp between 1x and 8x
        self
    }

    /// Set the target frame rate
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps.max(1);
        self
    }

    /// Set VSync enabled or disabled
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Get the window width in pixels
    pub fn window_width(&self) -> u32 {
        u32::try_from(self.width)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.scale)
    }

    /// Get the window height in pixels
    pub fn window_height(&self) -> u32 {
        u32::try_from(self.height)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.scale)
    }

    /// Get the frame duration for the target FPS
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.target_fps as u64)
    }
}

/// Host side of a native window
///
/// Presented frames are copied into the pixels surface and rendered right
/// away. Status strings end up in the window title.
#[derive(Default)]
pub struct WindowHost {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    fps_text: String,
    status_text: String,
    redraw_pending: bool,
    render_error: Option<pixels::Error>,
}

impl WindowHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach(&mut self, window: Arc<Window>, pixels: Pixels<'static>) {
        window.set_title(&self.title());
        self.window = Some(window);
        self.pixels = Some(pixels);
    }

    /// Window title for the current status strings
    pub fn title(&self) -> String {
        let mut title = TITLE.to_string();
        for part in [&self.fps_text, &self.status_text] {
            if !part.is_empty() {
                title.push_str(" - ");
                title.push_str(part);
            }
        }
        title
    }

    pub fn fps_text(&self) -> &str {
        &self.fps_text
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Whether a refresh was requested and not yet delivered
    pub fn redraw_pending(&self) -> bool {
        self.redraw_pending
    }

    fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_pending)
    }

    fn take_render_error(&mut self) -> Option<pixels::Error> {
        self.render_error.take()
    }

    fn refresh_title(&self) {
        if let Some(window) = &self.window {
            window.set_title(&self.title());
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl Compositor for WindowHost {
    fn present_image(&mut self, rgba: &[u8], _width: usize) {
        let Some(pixels) = &mut self.pixels else {
            return;
        };

        let frame = pixels.frame_mut();
        let len = frame.len().min(rgba.len());
        frame[..len].copy_from_slice(&rgba[..len]);

        if let Err(err) = pixels.render() {
            tracing::error!(error = %err, "render failed");
            self.render_error = Some(err);
        }
    }
}

impl StatusSurface for WindowHost {
    fn set_fps_text(&mut self, text: &str) {
        if self.fps_text != text {
            self.fps_text = text.to_string();
            self.refresh_title();
        }
    }

    fn set_status_text(&mut self, text: &str) {
        tracing::info!(status = text, "status");
        self.status_text = text.to_string();
        self.refresh_title();
    }
}

impl FrameScheduler for WindowHost {
    fn schedule_next_frame(&mut self) {
        self.redraw_pending = true;
        self.request_redraw();
    }
}

/// Complete a pending stop, then report any render failure
///
/// The check runs after `finish_if_stopping` so a failure while rendering the
/// blank frame is reported too.
fn settle_loop(controller: &mut LoopController<WindowHost>) -> Result<LoopState, DisplayError> {
    let state = controller.finish_if_stopping()?;
    match controller.host_mut().take_render_error() {
        Some(err) => Err(err.into()),
        None => Ok(state),
    }
}

/// Event loop handler tying the window to the presentation loop
struct WindowApp<E: Emulator> {
    controller: LoopController<WindowHost>,
    bridge: RomBridge<E>,
    stop: StopHandle,
    config: WindowConfig,
    epoch: Instant,
    last_frame_time: Instant,
    error: Option<DisplayError>,
}

impl<E: Emulator> WindowApp<E> {
    fn new(
        controller: LoopController<WindowHost>,
        bridge: RomBridge<E>,
        config: WindowConfig,
    ) -> Self {
        let stop = controller.stop_handle();
        let now = Instant::now();
        Self {
            controller,
            bridge,
            stop,
            config,
            epoch: now,
            last_frame_time: now,
            error: None,
        }
    }

    fn create_surface(
        &self,
        event_loop: &ActiveEventLoop,
    ) -> Result<(Arc<Window>, Pixels<'static>), DisplayError> {
        let window_attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(
                self.config.window_width(),
                self.config.window_height(),
            ))
            .with_resizable(false);

        // Arc gives the surface texture a 'static handle to the window
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let window_size = window.inner_size();

        let surface_texture =
            SurfaceTexture::new(window_size.width, window_size.height, Arc::clone(&window));
        let pixels = PixelsBuilder::new(
            self.config.width as u32,
            self.config.height as u32,
            surface_texture,
        )
        .enable_vsync(self.config.vsync)
        .build()?;

        Ok((window, pixels))
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: DisplayError) {
        tracing::error!(%error, "window session failed");
        self.error = Some(error);
        event_loop.exit();
    }

    /// Check if enough time has passed for the next frame
    fn frame_due(&mut self) -> bool {
        if self.config.vsync {
            return true;
        }
        if self.last_frame_time.elapsed() >= self.config.frame_duration() {
            self.last_frame_time = Instant::now();
            true
        } else {
            false
        }
    }

    fn load_dropped_file(&mut self, path: &Path) {
        let status = match fs::read(path) {
            Ok(bytes) => {
                self.bridge.submit_rom(&[HostBuffer::uint8(bytes)]);
                self.bridge.last_status().unwrap_or_default()
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not read dropped file");
                format!("could not read {}: {}", path.display(), err)
            }
        };
        self.controller.host_mut().set_status_text(&status);
    }

    fn draw(&mut self, event_loop: &ActiveEventLoop) {
        if !self.controller.host().redraw_pending() {
            return;
        }
        if !self.frame_due() {
            self.controller.host().request_redraw();
            return;
        }
        self.controller.host_mut().take_redraw();

        let timestamp_ms = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.controller.on_frame(timestamp_ms);
        self.settle(event_loop);
    }

    /// Finish and exit once a stop was observed, or fail on a render error
    fn settle(&mut self, event_loop: &ActiveEventLoop) {
        match settle_loop(&mut self.controller) {
            Ok(LoopState::Stopped) => event_loop.exit(),
            Ok(_) => {}
            Err(err) => self.fail(event_loop, err),
        }
    }
}

impl<E: Emulator> ApplicationHandler for WindowApp<E> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.controller.host().window.is_some() {
            return;
        }

        let (window, pixels) = match self.create_surface(event_loop) {
            Ok(surface) => surface,
            Err(err) => return self.fail(event_loop, err),
        };
        self.controller.host_mut().attach(window, pixels);

        if let Some(status) = self.bridge.last_status() {
            self.controller.host_mut().set_status_text(&status);
        }

        self.epoch = Instant::now();
        self.controller.start();
        self.settle(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.stop.request_stop();
                self.controller.host().request_redraw();
            }
            WindowEvent::DroppedFile(path) => self.load_dropped_file(&path),
            WindowEvent::RedrawRequested => self.draw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.controller.state() == LoopState::Stopped {
            event_loop.exit();
            return;
        }
        // Stop requests from other threads need a frame to be observed
        if self.stop.is_stop_requested() {
            self.controller.host().request_redraw();
        }
    }
}

/// Open a window and run the presentation loop until it stops
///
/// Returns the number of frames drawn.
pub fn run_window<E: Emulator>(
    controller: LoopController<WindowHost>,
    bridge: RomBridge<E>,
    config: WindowConfig,
) -> Result<u64, DisplayError> {
    let event_loop = EventLoop::new()?;

    // Set control flow based on VSync setting
    if config.vsync {
        event_loop.set_control_flow(ControlFlow::Wait);
    } else {
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    tracing::info!(
        width = config.width,
        height = config.height,
        scale = config.scale,
        vsync = config.vsync,
        target_fps = config.target_fps,
        "opening window"
    );

    let mut app = WindowApp::new(controller, bridge, config);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.error.take() {
        return Err(err);
    }
    Ok(app.controller.frames_run())
}
