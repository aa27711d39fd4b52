// SPDX-License-Identifier: GPL-3.0-only

//! Overlay image loading
//!
//! Only PNG files are accepted. The check is on content, not name: the
//! 8-byte PNG signature is verified before decoding, so a JPEG renamed to
//! `.png` is rejected the same way a wrong MIME type was in a browser.

use crate::errors::OverlayError;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Magic bytes at the start of every PNG file
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A loaded overlay image
#[derive(Debug, Clone)]
pub struct OverlayImage {
    path: PathBuf,
    image: Arc<RgbaImage>,
}

impl OverlayImage {
    /// Load an overlay, enforcing PNG content
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let bytes = std::fs::read(path)?;

        if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
            return Err(OverlayError::NotPng);
        }

        let image = image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
            .map_err(|e| OverlayError::Decode(e.to_string()))?
            .to_rgba8();

        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Loaded overlay"
        );

        Ok(Self {
            path: path.to_path_buf(),
            image: Arc::new(image),
        })
    }

    /// Path the overlay was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The decoded overlay pixels
    pub fn image(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("photobooth-overlay-{}-{}", std::process::id(), name))
    }

    fn png_bytes() -> Vec<u8> {
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 128, 0, 200]));
        let mut bytes = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Png,
            )
            .unwrap();
        bytes
    }

    #[test]
    fn test_valid_png_loads() {
        let path = temp_file("valid.png");
        std::fs::write(&path, png_bytes()).unwrap();

        let overlay = OverlayImage::load(&path).unwrap();
        assert_eq!(overlay.image().dimensions(), (4, 4));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_jpeg_behind_png_name_rejected() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 128, 0, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Jpeg,
            )
            .unwrap();

        let path = temp_file("fake.png");
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            OverlayImage::load(&path),
            Err(OverlayError::NotPng)
        ));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_corrupt_png_body_rejected() {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&[0u8; 32]);

        let path = temp_file("corrupt.png");
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            OverlayImage::load(&path),
            Err(OverlayError::Decode(_))
        ));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            OverlayImage::load(Path::new("/nonexistent/overlay.png")),
            Err(OverlayError::Io(_))
        ));
    }
}
