// Presenter - Per-frame draw and hand-off
//
// Every tick:
// 1. advance the frame clock
// 2. redraw the static frame (border, then background)
// 3. fill the inset rectangle with the gradient color for the current phase
// 4. hand the finished RGBA bytes to the host compositor
// 5. report the instantaneous FPS on the host's text surface

use crate::clock::{format_fps, FrameClock, DEFAULT_CYCLE_SECONDS};
use crate::display::{GradientTable, PixelBuffer, Rect, Rgb};
use crate::host::{Compositor, StatusSurface};
use serde::{Deserialize, Serialize};

/// Static decoration drawn around the animated inset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameStyle {
    /// Outer border color
    pub border_color: Rgb,

    /// Color between the border and the inset
    pub background_color: Rgb,

    /// Color of the blank frame presented on shutdown
    pub clear_color: Rgb,

    /// Border thickness in pixels
    pub border_width: usize,

    /// Distance from the buffer edge to the animated inset, in pixels
    pub inset_margin: usize,
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self {
            border_color: Rgb::BLACK,
            background_color: Rgb::WHITE,
            clear_color: Rgb::WHITE,
            border_width: 1,
            inset_margin: 10,
        }
    }
}

/// What a single presented frame looked like
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Seconds since the previous frame
    pub delta_seconds: f64,
    /// Gradient phase the inset was drawn with
    pub progress: f64,
    /// Inset color
    pub inset_color: Rgb,
}

/// Owns all per-session drawing state
///
/// Frames are produced strictly one after another, so nothing here needs
/// interior mutability.
#[derive(Debug, Clone)]
pub struct Presenter {
    buffer: PixelBuffer,
    clock: FrameClock,
    gradient: GradientTable,
    style: FrameStyle,
    frames_presented: u64,
}

impl Presenter {
    pub fn new(
        buffer: PixelBuffer,
        clock: FrameClock,
        gradient: GradientTable,
        style: FrameStyle,
    ) -> Self {
        Self {
            buffer,
            clock,
            gradient,
            style,
            frames_presented: 0,
        }
    }

    /// 160×144 buffer, 3 second hue cycle, black border on white
    pub fn game_boy() -> Self {
        Self::new(
            PixelBuffer::game_boy(),
            FrameClock::new(DEFAULT_CYCLE_SECONDS),
            GradientTable::hue_cycle(),
            FrameStyle::default(),
        )
    }

    /// Draw and present one frame for the given host timestamp
    pub fn render_frame<H>(&mut self, timestamp_ms: f64, host: &mut H) -> FrameReport
    where
        H: Compositor + StatusSurface + ?Sized,
    {
        let delta_seconds = self.clock.advance(timestamp_ms);
        let progress = self.clock.progress();

        let bounds = self.buffer.bounds();
        self.buffer.fill_rect(bounds, self.style.border_color);
        self.buffer
            .fill_rect(bounds.inset(self.style.border_width), self.style.background_color);

        let inset_color = self.gradient.color_at(progress);
        self.buffer.fill_rect(self.inset_rect(), inset_color);

        self.present(host);
        host.set_fps_text(&format_fps(delta_seconds));

        tracing::trace!(
            timestamp_ms,
            delta_seconds,
            progress,
            color = %inset_color,
            "frame presented"
        );

        FrameReport {
            delta_seconds,
            progress,
            inset_color,
        }
    }

    /// Clear to the blank color and present once
    pub fn present_blank<H>(&mut self, host: &mut H)
    where
        H: Compositor + ?Sized,
    {
        self.buffer.clear(self.style.clear_color);
        self.present(host);
    }

    fn present<H>(&mut self, host: &mut H)
    where
        H: Compositor + ?Sized,
    {
        host.present_image(self.buffer.as_bytes(), self.buffer.width());
        self.frames_presented += 1;
    }

    /// Region animated by the gradient
    pub fn inset_rect(&self) -> Rect {
        self.buffer.bounds().inset(self.style.inset_margin)
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn gradient(&self) -> &GradientTable {
        &self.gradient
    }

    pub fn style(&self) -> &FrameStyle {
        &self.style
    }

    /// Number of images handed to the compositor, blank ones included
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::game_boy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sink {
        images: Vec<(Vec<u8>, usize)>,
        fps: Vec<String>,
    }

    impl Compositor for Sink {
        fn present_image(&mut self, rgba: &[u8], width: usize) {
            self.images.push((rgba.to_vec(), width));
        }
    }

    impl StatusSurface for Sink {
        fn set_fps_text(&mut self, text: &str) {
            self.fps.push(text.to_string());
        }

        fn set_status_text(&mut self, _text: &str) {}
    }

    fn pixel(bytes: &[u8], width: usize, x: usize, y: usize) -> &[u8] {
        let offset = (y * width + x) * 4;
        &bytes[offset..offset + 4]
    }

    #[test]
    fn test_frame_layout() {
        let mut presenter = Presenter::game_boy();
        let mut sink = Sink::default();
        presenter.render_frame(0.0, &mut sink);

        let (bytes, width) = &sink.images[0];
        assert_eq!(*width, 160);
        assert_eq!(bytes.len(), 160 * 144 * 4);

        // Border, background and inset (progress 0 is pure red)
        assert_eq!(pixel(bytes, 160, 0, 0), &[0, 0, 0, 255]);
        assert_eq!(pixel(bytes, 160, 159, 143), &[0, 0, 0, 255]);
        assert_eq!(pixel(bytes, 160, 5, 5), &[255, 255, 255, 255]);
        assert_eq!(pixel(bytes, 160, 10, 10), &[255, 0, 0, 255]);
        assert_eq!(pixel(bytes, 160, 149, 133), &[255, 0, 0, 255]);
        assert_eq!(pixel(bytes, 160, 150, 133), &[255, 255, 255, 255]);
    }

    #[test]
    fn test_first_frame_fps_is_not_a_number() {
        let mut presenter = Presenter::game_boy();
        let mut sink = Sink::default();
        presenter.render_frame(0.0, &mut sink);
        presenter.render_frame(20.0, &mut sink);

        assert_eq!(sink.fps, vec!["fps: n/a".to_string(), "fps: 50".to_string()]);
    }

    #[test]
    fn test_inset_follows_gradient() {
        let mut presenter = Presenter::game_boy();
        let mut sink = Sink::default();
        presenter.render_frame(0.0, &mut sink);
        // A third of the cycle lands on the green keypoint
        let report = presenter.render_frame(990.0, &mut sink);

        assert!((report.progress - 0.33).abs() < 1e-9);
        assert_eq!(report.inset_color, Rgb::GREEN);
        assert_eq!(presenter.buffer().get_pixel(80, 72), [0, 255, 0, 255]);
    }

    #[test]
    fn test_present_blank() {
        let mut presenter = Presenter::game_boy();
        let mut sink = Sink::default();
        presenter.render_frame(0.0, &mut sink);
        presenter.present_blank(&mut sink);

        assert_eq!(presenter.frames_presented(), 2);
        let (bytes, _) = sink.images.last().expect("blank frame");
        assert!(bytes.iter().all(|&b| b == 255));
    }

    #[test]
    fn test_custom_style() {
        let style = FrameStyle {
            border_color: Rgb::BLUE,
            background_color: Rgb::BLACK,
            clear_color: Rgb::BLACK,
            border_width: 2,
            inset_margin: 4,
        };
        let mut presenter = Presenter::new(
            PixelBuffer::new(16, 16),
            FrameClock::default(),
            GradientTable::hue_cycle(),
            style,
        );
        let mut sink = Sink::default();
        presenter.render_frame(0.0, &mut sink);

        let buf = presenter.buffer();
        assert_eq!(buf.get_pixel(1, 1), [0, 0, 255, 255]);
        assert_eq!(buf.get_pixel(2, 2), [0, 0, 0, 255]);
        assert_eq!(buf.get_pixel(4, 4), [255, 0, 0, 255]);
        assert_eq!(presenter.inset_rect(), Rect::new(4, 4, 12, 12));
    }
}
