// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera backend

use std::sync::Arc;
use std::time::Instant;

/// A single frame from the camera, converted to RGBA
///
/// Pixel data is reference-counted so frames can be handed to the preview
/// and to the capture sequence without copying.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels
    pub data: Arc<[u8]>,
    /// Row stride in bytes (width * 4)
    pub stride: u32,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a frame from raw RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Sample one pixel, clamped to the frame bounds
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let idx = (y * self.stride + x * 4) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }
}

/// Pixel format delivered by the capture device
///
/// Every format here is converted to RGBA on the capture thread before
/// frames leave the backend. MJPG is compressed and decoded per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// YUYV - packed 4:2:2 (Y0 U Y1 V), the common raw webcam format
    YUYV,
    /// UYVY - packed 4:2:2 (U Y0 V Y1)
    UYVY,
    /// RGB24 - 3 bytes per pixel, no alpha
    RGB24,
    /// Gray8 - 8-bit grayscale
    Gray8,
    /// MJPG - motion JPEG, one JPEG image per frame
    MJPG,
}

impl PixelFormat {
    /// Map a V4L2 FourCC to a supported pixel format
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"YUYV" => Some(Self::YUYV),
            b"UYVY" => Some(Self::UYVY),
            b"RGB3" => Some(Self::RGB24),
            b"GREY" => Some(Self::Gray8),
            b"MJPG" => Some(Self::MJPG),
            _ => None,
        }
    }

    /// The FourCC code for this format
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            Self::YUYV => *b"YUYV",
            Self::UYVY => *b"UYVY",
            Self::RGB24 => *b"RGB3",
            Self::Gray8 => *b"GREY",
            Self::MJPG => *b"MJPG",
        }
    }

    /// Average bytes per pixel on the wire (MJPG varies per frame)
    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            Self::YUYV | Self::UYVY => 2.0,
            Self::RGB24 => 3.0,
            Self::Gray8 => 1.0,
            Self::MJPG => 0.0,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fourcc = self.fourcc();
        write!(f, "{}", String::from_utf8_lossy(&fourcc))
    }
}

/// Framerate as a fraction (numerator/denominator)
///
/// Stores the exact framerate to handle NTSC rates like 59.94fps (60000/1001).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a new framerate from numerator and denominator
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Get the rounded integer framerate
    pub fn as_int(&self) -> u32 {
        self.num / self.denom
    }

    /// Get the framerate as a floating point value
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<Framerate>,
    pub pixel_format: PixelFormat,
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(
                f,
                "{}x{} {} @ {}fps",
                self.width, self.height, self.pixel_format, fps
            )
        } else {
            write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)
        }
    }
}

/// Device information from the V4L2 capability query
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    /// Driver name (V4L2 driver)
    pub driver: String,
    /// Device path (e.g., /dev/video0)
    pub path: String,
    /// Real device path (resolved symlinks)
    pub real_path: String,
}

/// Represents a camera device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,
    pub device_info: DeviceInfo,
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_roundtrip() {
        for format in [
            PixelFormat::YUYV,
            PixelFormat::UYVY,
            PixelFormat::RGB24,
            PixelFormat::Gray8,
            PixelFormat::MJPG,
        ] {
            assert_eq!(PixelFormat::from_fourcc(&format.fourcc()), Some(format));
        }
        assert_eq!(PixelFormat::from_fourcc(b"H264"), None);
    }

    #[test]
    fn test_framerate_display() {
        assert_eq!(Framerate::new(30, 1).to_string(), "30");
        assert_eq!(Framerate::new(60000, 1001).to_string(), "59.94");
        // Zero denominator is normalised
        assert_eq!(Framerate::new(30, 0).as_int(), 30);
    }

    #[test]
    fn test_frame_pixel_sampling() {
        let mut data = vec![0u8; 2 * 2 * 4];
        // Pixel (1, 0) = red
        data[4] = 255;
        data[7] = 255;
        let frame = CameraFrame::from_rgba(2, 2, data);

        assert_eq!(frame.pixel_rgb(1, 0), (255, 0, 0));
        assert_eq!(frame.pixel_rgb(0, 0), (0, 0, 0));
        // Out-of-bounds coordinates clamp
        assert_eq!(frame.pixel_rgb(9, 0), (255, 0, 0));
    }
}
