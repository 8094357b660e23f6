// Host module - Primitives the presentation loop needs from its surroundings
//
// The loop never talks to a window system or a browser directly. It asks
// the host to:
// - present a finished RGBA image at the surface origin
// - show short human-readable status strings (FPS, ROM status)
// - call back on the next display refresh
//
// Native hosts live in `display::window` and `session::headless`; the
// browser host is `host::web` (wasm32 only).

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Accepts finished frames for display
pub trait Compositor {
    /// Put an interleaved RGBA image at (0, 0)
    ///
    /// `rgba.len()` is always `width * height * 4`.
    fn present_image(&mut self, rgba: &[u8], width: usize);
}

/// Text surfaces next to the image
pub trait StatusSurface {
    fn set_fps_text(&mut self, text: &str);
    fn set_status_text(&mut self, text: &str);
}

/// Display refresh scheduling
pub trait FrameScheduler {
    /// Ask for one more frame callback on the next refresh
    ///
    /// The host answers by calling `LoopController::on_frame` with a
    /// timestamp in milliseconds.
    fn schedule_next_frame(&mut self);
}

/// Everything the loop controller needs from a host
pub trait Host: Compositor + StatusSurface + FrameScheduler {}

impl<T: Compositor + StatusSurface + FrameScheduler> Host for T {}

impl<T: Compositor + ?Sized> Compositor for &mut T {
    fn present_image(&mut self, rgba: &[u8], width: usize) {
        (**self).present_image(rgba, width);
    }
}

impl<T: StatusSurface + ?Sized> StatusSurface for &mut T {
    fn set_fps_text(&mut self, text: &str) {
        (**self).set_fps_text(text);
    }

    fn set_status_text(&mut self, text: &str) {
        (**self).set_status_text(text);
    }
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for &mut T {
    fn schedule_next_frame(&mut self) {
        (**self).schedule_next_frame();
    }
}
