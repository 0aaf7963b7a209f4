//! Writing vision sensor frames to disk.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbImage};
use quadcap_core::SensorImage;

/// Path of the `idx`-th frame: `dir/<prefix><idx>.<ext>`.
///
/// The extension may be given with or without its leading dot.
pub fn frame_path(dir: &Path, prefix: &str, idx: usize, extension: &str) -> PathBuf {
    let ext = extension.trim_start_matches('.');
    if ext.is_empty() {
        dir.join(format!("{prefix}{idx}"))
    } else {
        dir.join(format!("{prefix}{idx}.{ext}"))
    }
}

/// Image format written for `extension`, with or without its leading dot.
///
/// Fails if the extension is unknown or this build cannot encode it.
pub fn frame_format(extension: &str) -> Result<ImageFormat> {
    let ext = extension.trim_start_matches('.');
    let format = ImageFormat::from_extension(ext)
        .with_context(|| format!("Unsupported image extension {extension:?}"))?;
    if !format.writing_enabled() {
        bail!("Writing {format:?} images is not supported");
    }
    Ok(format)
}

/// Save a sensor frame as an image file, format chosen by extension.
///
/// Sensor rows arrive bottom-up, so the frame is flipped before writing.
pub fn save_frame(frame: &SensorImage, path: &Path) -> Result<()> {
    if frame.rgb.len() != frame.expected_len() {
        bail!(
            "Frame buffer holds {} bytes, expected {} for {}x{} RGB",
            frame.rgb.len(),
            frame.expected_len(),
            frame.width,
            frame.height
        );
    }

    let upside_down = RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone())
        .context("Frame buffer does not match its resolution")?;
    let upright = image::imageops::flip_vertical(&upside_down);

    upright
        .save(path)
        .with_context(|| format!("Failed to write image {}", path.display()))?;
    Ok(())
}
