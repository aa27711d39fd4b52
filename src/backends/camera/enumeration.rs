// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera discovery
//!
//! Scans `/dev/video*`, queries each node's capabilities via the
//! `VIDIOC_QUERYCAP` ioctl and keeps the ones that can actually capture
//! video (metadata nodes of the same physical camera are filtered out).

use super::types::{CameraDevice, CameraFormat, DeviceInfo, Framerate, PixelFormat};
use std::os::unix::io::{AsRawFd, RawFd};
use tracing::debug;
use v4l::prelude::*;
use v4l::video::Capture;

/// VIDIOC_QUERYCAP ioctl number
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

/// V4L2 capability flag for single-planar video capture
const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x00000001;

/// V4L2 capability structure for VIDIOC_QUERYCAP ioctl
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

/// Query V4L2 capabilities for an open file descriptor.
fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

fn cap_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).to_string()
}

/// Build DeviceInfo for a V4L2 device path
///
/// Resolves symlinks to get the real device path and queries the card and
/// driver names. Returns None when the node cannot be opened or queried.
fn build_device_info(v4l2_path: &str) -> Option<(DeviceInfo, u32)> {
    let file = std::fs::File::open(v4l2_path).ok()?;
    let cap = query_v4l2_cap(file.as_raw_fd())?;

    let real_path = std::fs::canonicalize(v4l2_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| v4l2_path.to_string());

    // Use device_caps if available, otherwise capabilities
    let caps = if cap.device_caps != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    let info = DeviceInfo {
        card: cap_string(&cap.card),
        driver: cap_string(&cap.driver),
        path: v4l2_path.to_string(),
        real_path,
    };

    Some((info, caps))
}

/// List all camera devices able to capture video
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut paths: Vec<(u32, String)> = Vec::new();

    let entries = match std::fs::read_dir("/dev") {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if let Some(index) = name_str.strip_prefix("video")
            && let Ok(index) = index.parse::<u32>()
        {
            paths.push((index, format!("/dev/{}", name_str)));
        }
    }

    // video10 sorts after video9
    paths.sort_by_key(|(index, _)| *index);

    let mut cameras = Vec::new();
    for (_, path) in paths {
        let Some((info, caps)) = build_device_info(&path) else {
            continue;
        };

        if caps & V4L2_CAP_VIDEO_CAPTURE == 0 {
            debug!(path = %path, "Skipping non-capture node");
            continue;
        }

        // Metadata nodes report the capture flag on some drivers but offer
        // no capturable formats
        if get_formats(&path).is_empty() {
            debug!(path = %path, "Skipping node without supported formats");
            continue;
        }

        let name = if info.card.is_empty() {
            format!("Camera ({})", path)
        } else {
            info.card.clone()
        };

        debug!(path = %path, name = %name, driver = %info.driver, "Found camera");

        cameras.push(CameraDevice {
            name,
            path,
            device_info: info,
        });
    }

    cameras
}

/// Query the supported capture formats of a device
///
/// Only formats the booth can convert to RGBA are reported.
pub fn get_formats(device_path: &str) -> Vec<CameraFormat> {
    let dev = match Device::with_path(device_path) {
        Ok(d) => d,
        Err(_) => return Vec::new(),
    };

    let mut formats = Vec::new();

    if let Ok(descriptions) = dev.enum_formats() {
        for desc in descriptions {
            let Some(pixel_format) = PixelFormat::from_fourcc(&desc.fourcc.repr) else {
                continue;
            };

            let Ok(frame_sizes) = dev.enum_framesizes(desc.fourcc) else {
                continue;
            };

            for size in frame_sizes {
                match size.size {
                    v4l::framesize::FrameSizeEnum::Discrete(discrete) => {
                        let framerate = best_framerate(&dev, desc.fourcc, discrete.width, discrete.height);
                        formats.push(CameraFormat {
                            width: discrete.width,
                            height: discrete.height,
                            framerate,
                            pixel_format,
                        });
                    }
                    v4l::framesize::FrameSizeEnum::Stepwise(step) => {
                        // Offer common resolutions within the stepwise range
                        for (w, h) in [(1920, 1080), (1280, 720), (640, 480)] {
                            if w >= step.min_width
                                && w <= step.max_width
                                && h >= step.min_height
                                && h <= step.max_height
                            {
                                formats.push(CameraFormat {
                                    width: w,
                                    height: h,
                                    framerate: Some(Framerate::default()),
                                    pixel_format,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    formats
}

fn best_framerate(dev: &Device, fourcc: v4l::FourCC, width: u32, height: u32) -> Option<Framerate> {
    let intervals = dev.enum_frameintervals(fourcc, width, height).ok()?;

    let mut best: Option<Framerate> = None;
    for interval in intervals {
        if let v4l::frameinterval::FrameIntervalEnum::Discrete(frac) = interval.interval
            && frac.numerator > 0
        {
            // Frame interval is seconds/frame, so fps = denominator/numerator
            let rate = Framerate::new(frac.denominator, frac.numerator);
            if best.map(|b| rate.as_f64() > b.as_f64()).unwrap_or(true) {
                best = Some(rate);
            }
        }
    }

    best
}

/// Select the capture format for the booth
///
/// Prefers the format closest to 1280x720 with a usable framerate: large
/// enough for the print slots without burning CPU converting 4K frames.
pub fn select_capture_format(formats: &[CameraFormat]) -> Option<CameraFormat> {
    let target_pixels: i64 = 1280 * 720;

    formats
        .iter()
        .min_by_key(|f| {
            let pixels = (f.width as i64) * (f.height as i64);
            let diff = (pixels - target_pixels).abs();
            // Prefer formats with a known framerate of at least 15fps
            let fps_penalty = match f.framerate {
                Some(fps) if fps.as_int() >= 15 => 0,
                Some(_) => 50_000_000,
                None => 100_000_000,
            };
            diff + fps_penalty
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(width: u32, height: u32, fps: u32, pixel_format: PixelFormat) -> CameraFormat {
        CameraFormat {
            width,
            height,
            framerate: Some(Framerate::new(fps, 1)),
            pixel_format,
        }
    }

    #[test]
    fn test_select_prefers_near_720p() {
        let formats = vec![
            format(320, 240, 30, PixelFormat::YUYV),
            format(1280, 720, 30, PixelFormat::MJPG),
            format(3840, 2160, 30, PixelFormat::MJPG),
        ];

        let selected = select_capture_format(&formats).unwrap();
        assert_eq!((selected.width, selected.height), (1280, 720));
    }

    #[test]
    fn test_select_penalises_slow_formats() {
        let formats = vec![
            format(1280, 720, 5, PixelFormat::YUYV),
            format(640, 480, 30, PixelFormat::YUYV),
        ];

        let selected = select_capture_format(&formats).unwrap();
        assert_eq!((selected.width, selected.height), (640, 480));
    }

    #[test]
    fn test_select_empty() {
        assert!(select_capture_format(&[]).is_none());
    }
}
