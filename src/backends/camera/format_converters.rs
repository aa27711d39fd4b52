// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion to RGBA
//!
//! Webcams deliver tightly packed buffers in the negotiated format; each
//! converter here produces RGBA for the preview and the compositor.
//! YUV conversion uses BT.601 coefficients.

use super::types::PixelFormat;

/// Convert a packed frame buffer to RGBA
///
/// For MJPG the decoded image's own dimensions win over the negotiated ones;
/// the returned tuple carries the final (width, height).
pub fn convert_to_rgba(
    data: &[u8],
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<(Vec<u8>, u32, u32), String> {
    match format {
        PixelFormat::YUYV => Ok((yuyv_to_rgba(data, width, height), width, height)),
        PixelFormat::UYVY => Ok((uyvy_to_rgba(data, width, height), width, height)),
        PixelFormat::RGB24 => Ok((rgb24_to_rgba(data, width, height), width, height)),
        PixelFormat::Gray8 => Ok((gray8_to_rgba(data, width, height), width, height)),
        PixelFormat::MJPG => decode_mjpeg(data),
    }
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U Y1 V - each 4-byte group encodes 2 pixels.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            push_yuv_pixel(&mut rgba, y, u, v);
            if rgba.len() >= pixel_count * 4 {
                return rgba;
            }
        }
    }

    rgba
}

/// Convert UYVY (YUV 4:2:2) to RGBA
///
/// UYVY format: U Y0 V Y1 - each 4-byte group encodes 2 pixels.
pub fn uyvy_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let u = chunk[0] as f32 - 128.0;
        let y0 = chunk[1] as f32;
        let v = chunk[2] as f32 - 128.0;
        let y1 = chunk[3] as f32;

        for y in [y0, y1] {
            push_yuv_pixel(&mut rgba, y, u, v);
            if rgba.len() >= pixel_count * 4 {
                return rgba;
            }
        }
    }

    rgba
}

/// Convert RGB24 to RGBA
pub fn rgb24_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(3).take(pixel_count) {
        rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
    }

    rgba
}

/// Convert 8-bit grayscale to RGBA
pub fn gray8_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for &v in data.iter().take(pixel_count) {
        rgba.extend_from_slice(&[v, v, v, 255]);
    }

    rgba
}

/// Decode one MJPG frame to RGBA
pub fn decode_mjpeg(data: &[u8]) -> Result<(Vec<u8>, u32, u32), String> {
    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| format!("MJPG decode failed: {}", e))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((rgba.into_raw(), width, height))
}

fn push_yuv_pixel(rgba: &mut Vec<u8>, y: f32, u: f32, v: f32) {
    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    rgba.extend_from_slice(&[r, g, b, 255]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_neutral_chroma_is_grayscale() {
        // Two pixels, Y = 100 and 200, U = V = 128 (no chroma)
        let data = [100u8, 128, 200, 128];
        let rgba = yuyv_to_rgba(&data, 2, 1);

        assert_eq!(rgba.len(), 8);
        assert_eq!(&rgba[0..4], &[100, 100, 100, 255]);
        assert_eq!(&rgba[4..8], &[200, 200, 200, 255]);
    }

    #[test]
    fn test_uyvy_matches_yuyv_on_swapped_bytes() {
        let yuyv = [90u8, 110, 150, 140];
        let uyvy = [110u8, 90, 140, 150];

        assert_eq!(yuyv_to_rgba(&yuyv, 2, 1), uyvy_to_rgba(&uyvy, 2, 1));
    }

    #[test]
    fn test_rgb24_adds_opaque_alpha() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let rgba = rgb24_to_rgba(&data, 2, 1);

        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_gray8_replicates_channels() {
        let rgba = gray8_to_rgba(&[7u8, 200], 2, 1);
        assert_eq!(rgba, vec![7, 7, 7, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_mjpeg_rejects_garbage() {
        assert!(decode_mjpeg(&[0u8; 16]).is_err());
    }
}
