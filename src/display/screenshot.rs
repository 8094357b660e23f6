// Frame snapshots
//
// Writes presented frames (interleaved RGBA) to PNG files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing a snapshot
#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    #[error("expected {expected} bytes of RGBA data, got {actual}")]
    Size { expected: usize, actual: usize },
}

/// Default file name for a snapshot taken now, inside `directory`
///
/// Names look like `frame_20240131_235959.png`.
pub fn snapshot_path<P: AsRef<Path>>(directory: P) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    directory.as_ref().join(format!("frame_{}.png", timestamp))
}

/// Save interleaved RGBA bytes as a PNG file
///
/// Parent directories are created as needed.
pub fn save_png<P: AsRef<Path>>(
    path: P,
    rgba: &[u8],
    width: usize,
    height: usize,
) -> Result<(), ScreenshotError> {
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(ScreenshotError::Size {
            expected,
            actual: rgba.len(),
        });
    }

    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = fs::File::create(path)?;
    let w = io::BufWriter::new(file);

    let mut encoder = png::Encoder::new(w, width as u32, height as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;

    Ok(())
}
