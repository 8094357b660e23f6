// Display module - Everything between the frame loop and the pixels on screen
//
// This module provides:
// - sRGB colors with perceptual (hue/chroma/lightness) blending
// - Gradient keypoint tables for the animated inset
// - The RGBA pixel buffer handed to the host compositor
// - PNG snapshots of presented frames
// - A native window host built on winit + pixels

pub mod color;
pub mod framebuffer;
pub mod gradient;
pub mod screenshot;
#[cfg(not(target_arch = "wasm32"))]
pub mod window;

pub use color::{ColorParseError, Hcl, Rgb};
pub use framebuffer::{PixelBuffer, Rect, BYTES_PER_PIXEL, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use gradient::{ColorKeypoint, GradientTable};
pub use screenshot::{save_png, snapshot_path, ScreenshotError};
#[cfg(not(target_arch = "wasm32"))]
pub use window::{run_window, DisplayError, WindowConfig, WindowHost};
