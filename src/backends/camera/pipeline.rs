// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture pipeline
//!
//! Opens the device on a dedicated thread, negotiates one of the
//! convertible formats and streams mmap buffers until stopped. Every frame
//! is converted to RGBA, stored in the shared latest-frame slot for the
//! capture sequence and pushed non-blockingly into the preview channel
//! (frames are dropped when the preview is behind).

use super::format_converters::convert_to_rgba;
use super::frame_loop::CaptureLoopController;
use super::types::{CameraDevice, CameraFormat, CameraFrame, FrameSender, PixelFormat};
use crate::errors::CameraError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

/// Preview channel depth before frames get dropped
const PREVIEW_CHANNEL_DEPTH: usize = 10;

/// A live camera stream bound to one device
pub struct CameraPipeline {
    device_name: String,
    device_path: String,
    format: CameraFormat,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    controller: CaptureLoopController,
}

impl CameraPipeline {
    /// Open the device and start streaming
    ///
    /// The returned receiver delivers preview frames. Open and format
    /// negotiation happen on the capture thread; their outcome is reported
    /// back before this function returns, so a denied or busy device
    /// surfaces as an error here.
    pub fn open(
        device: &CameraDevice,
        format: &CameraFormat,
    ) -> Result<(Self, super::types::FrameReceiver), CameraError> {
        let (sender, receiver) = futures::channel::mpsc::channel(PREVIEW_CHANNEL_DEPTH);
        let latest = Arc::new(Mutex::new(None));

        let path = device.path.clone();
        let requested = format.clone();
        let latest_clone = Arc::clone(&latest);

        // The capture thread reports whether open + negotiation worked
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<CameraFormat, String>>();

        let controller = CaptureLoopController::start("v4l2-capture", move |stop| {
            capture_loop(&path, &requested, stop, latest_clone, sender, ready_tx)
        });

        let negotiated = match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(negotiated)) => negotiated,
            Ok(Err(msg)) => return Err(CameraError::InitializationFailed(msg)),
            Err(_) => {
                return Err(CameraError::InitializationFailed(
                    "camera did not start in time".to_string(),
                ));
            }
        };

        info!(device = %device.name, format = %negotiated, "Camera stream started");

        Ok((
            Self {
                device_name: device.name.clone(),
                device_path: device.path.clone(),
                format: negotiated,
                latest,
                controller,
            },
            receiver,
        ))
    }

    /// The most recent frame captured, if any
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.latest.lock().ok()?.clone()
    }

    /// The negotiated capture format
    pub fn format(&self) -> &CameraFormat {
        &self.format
    }

    /// Name of the device this pipeline streams from
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Path of the device this pipeline streams from
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Whether the capture thread is still delivering frames
    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        debug!(device = %self.device_name, "Releasing camera stream");
        self.controller.stop();
    }
}

fn capture_loop(
    path: &str,
    requested: &CameraFormat,
    stop: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    mut sender: FrameSender,
    ready_tx: std::sync::mpsc::Sender<Result<CameraFormat, String>>,
) -> Result<(), String> {
    let setup = open_and_negotiate(path, requested);

    let (mut dev, negotiated) = match setup {
        Ok(pair) => pair,
        Err(msg) => {
            let _ = ready_tx.send(Err(msg.clone()));
            return Err(msg);
        }
    };

    let mut stream = match MmapStream::with_buffers(&mut dev, Type::VideoCapture, 4) {
        Ok(stream) => stream,
        Err(e) => {
            let msg = format!("Failed to create buffer stream: {}", e);
            let _ = ready_tx.send(Err(msg.clone()));
            return Err(msg);
        }
    };

    let _ = ready_tx.send(Ok(negotiated.clone()));

    let mut frame_counter: u64 = 0;
    let expected_size = expected_buffer_size(&negotiated);

    while !stop.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, _meta)) => {
                frame_counter += 1;

                if let Some(expected) = expected_size
                    && buf.len() < expected
                {
                    if frame_counter % 30 == 0 {
                        warn!(
                            frame = frame_counter,
                            got = buf.len(),
                            expected,
                            "Short buffer, skipping frame"
                        );
                    }
                    continue;
                }

                let converted = convert_to_rgba(
                    buf,
                    negotiated.pixel_format,
                    negotiated.width,
                    negotiated.height,
                );

                let (rgba, width, height) = match converted {
                    Ok(frame) => frame,
                    Err(e) => {
                        // MJPG frames right after stream start are sometimes truncated
                        if frame_counter % 30 == 0 {
                            warn!(frame = frame_counter, error = %e, "Frame conversion failed");
                        }
                        continue;
                    }
                };

                let frame = CameraFrame::from_rgba(width, height, rgba);

                if let Ok(mut slot) = latest.lock() {
                    *slot = Some(frame.clone());
                }

                if let Err(e) = sender.try_send(frame) {
                    if e.is_disconnected() {
                        debug!("Preview channel closed, stopping capture");
                        break;
                    }
                    // Channel full: preview is behind, drop the frame
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to capture frame");
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }

    Ok(())
}

fn open_and_negotiate(
    path: &str,
    requested: &CameraFormat,
) -> Result<(Device, CameraFormat), String> {
    info!(path, format = %requested, "Opening V4L2 device");

    let dev = Device::with_path(path).map_err(|e| format!("Failed to open {}: {}", path, e))?;

    let mut format = dev
        .format()
        .map_err(|e| format!("Failed to query format: {}", e))?;
    format.width = requested.width;
    format.height = requested.height;
    format.fourcc = v4l::FourCC::new(&requested.pixel_format.fourcc());

    let actual = dev
        .set_format(&format)
        .map_err(|e| format!("Failed to set format: {}", e))?;

    let Some(pixel_format) = PixelFormat::from_fourcc(&actual.fourcc.repr) else {
        return Err(format!(
            "Device switched to unsupported format {:?}",
            actual.fourcc
        ));
    };

    if pixel_format != requested.pixel_format {
        warn!(
            requested = %requested.pixel_format,
            got = %pixel_format,
            "Device did not accept the requested pixel format"
        );
    }

    let negotiated = CameraFormat {
        width: actual.width,
        height: actual.height,
        framerate: requested.framerate,
        pixel_format,
    };

    Ok((dev, negotiated))
}

fn expected_buffer_size(format: &CameraFormat) -> Option<usize> {
    let bpp = format.pixel_format.bytes_per_pixel();
    if bpp == 0.0 {
        // Compressed, size varies per frame
        return None;
    }
    Some((format.width as f32 * format.height as f32 * bpp) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::Framerate;

    #[test]
    fn test_expected_buffer_size() {
        let format = CameraFormat {
            width: 640,
            height: 480,
            framerate: Some(Framerate::default()),
            pixel_format: PixelFormat::YUYV,
        };
        assert_eq!(expected_buffer_size(&format), Some(640 * 480 * 2));

        let mjpg = CameraFormat {
            pixel_format: PixelFormat::MJPG,
            ..format
        };
        assert_eq!(expected_buffer_size(&mjpg), None);
    }
}
