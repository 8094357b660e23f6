// Pixel Buffer - Owned RGBA image handed to the host compositor
//
// The reference screen is the Game Boy's 160×144 LCD, but the dimensions
// are a runtime parameter. Pixels are stored row-major, top-to-bottom, so
// serialization is a straight copy into the host's image-data layout.

use super::color::Rgb;

/// Game Boy LCD width in pixels
pub const SCREEN_WIDTH: usize = 160;

/// Game Boy LCD height in pixels
pub const SCREEN_HEIGHT: usize = 144;

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Half-open pixel rectangle `[x0, x1) × [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Rect {
    pub const fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle covering a whole `width × height` surface
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Shrink by `margin` pixels on every side
    ///
    /// Collapses to an empty rectangle when the margin is too large.
    pub fn inset(self, margin: usize) -> Self {
        let x0 = self.x0.saturating_add(margin);
        let y0 = self.y0.saturating_add(margin);
        Self {
            x0,
            y0,
            x1: self.x1.saturating_sub(margin).max(x0),
            y1: self.y1.saturating_sub(margin).max(y0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.x0..self.x1).contains(&x) && (self.y0..self.y1).contains(&y)
    }
}

/// Fixed-size RGBA pixel grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    /// Interleaved R, G, B, A bytes, `width * 4` bytes per row, no padding
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a buffer of the given size, fully transparent black
    ///
    /// # Panics
    /// Panics if either dimension is zero
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "pixel buffer dimensions must be non-zero");
        Self {
            width,
            height,
            data: vec![0; width * height * BYTES_PER_PIXEL],
        }
    }

    /// Create a buffer with the Game Boy LCD dimensions
    pub fn game_boy() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Length of the serialized image in bytes (`width * height * 4`)
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn bounds(&self) -> Rect {
        Rect::full(self.width, self.height)
    }

    /// Overwrite every pixel of `rect` with an opaque `color`
    ///
    /// Existing content is replaced, not blended. The rectangle is clipped
    /// to the buffer; empty rectangles are a no-op.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        let x0 = rect.x0.min(self.width);
        let x1 = rect.x1.min(self.width);
        let y0 = rect.y0.min(self.height);
        let y1 = rect.y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let rgba = color.to_rgba();
        let stride = self.stride();
        let span = x0 * BYTES_PER_PIXEL..x1 * BYTES_PER_PIXEL;
        for row in self.data.chunks_exact_mut(stride).take(y1).skip(y0) {
            for pixel in row[span.clone()].chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&rgba);
            }
        }
    }

    /// Fill the whole buffer with an opaque `color`
    pub fn clear(&mut self, color: Rgb) {
        self.fill_rect(self.bounds(), color);
    }

    /// RGBA bytes of the pixel at (x, y)
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let offset = self.offset(x, y);
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.data[offset..offset + BYTES_PER_PIXEL]);
        rgba
    }

    /// Set the pixel at (x, y) to raw RGBA bytes
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let offset = self.offset(x, y);
        self.data[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Borrow the interleaved RGBA bytes without copying
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy the image out as interleaved RGBA bytes
    ///
    /// Always exactly `width * height * 4` bytes; pixel (x, y) starts at
    /// `(y * width + x) * 4`.
    pub fn to_interleaved_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// Write the interleaved RGBA bytes into an existing buffer
    ///
    /// # Panics
    /// Panics if output buffer is too small
    pub fn write_interleaved(&self, output: &mut [u8]) {
        assert!(
            output.len() >= self.data.len(),
            "Output buffer too small for RGBA conversion"
        );
        output[..self.data.len()].copy_from_slice(&self.data);
    }

    #[inline]
    fn stride(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(x < self.width, "X coordinate {} out of bounds", x);
        assert!(y < self.height, "Y coordinate {} out of bounds", y);
        (y * self.width + x) * BYTES_PER_PIXEL
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::game_boy()
    }
}
