// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera backend
//!
//! Device discovery, format negotiation and a threaded mmap capture
//! pipeline delivering RGBA frames.

pub mod enumeration;
pub mod format_converters;
pub mod frame_loop;
pub mod pipeline;
pub mod types;

pub use enumeration::{enumerate_cameras, get_formats, select_capture_format};
pub use pipeline::CameraPipeline;
pub use types::{CameraDevice, CameraFormat, CameraFrame, FrameReceiver, FrameSender, PixelFormat};
