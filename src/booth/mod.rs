// SPDX-License-Identifier: GPL-3.0-only

//! Capture controller
//!
//! The booth cycle: countdown, first shot, pause, countdown, second shot,
//! camera release, composite. `session` owns the state, `sequence` drives
//! one cycle and reports progress events, `countdown` and `overlay` are its
//! building blocks.

pub mod countdown;
pub mod overlay;
pub mod sequence;
pub mod session;

pub use overlay::OverlayImage;
pub use sequence::{
    CapturedPhoto, EventReceiver, EventSender, FinalComposite, FrameSource, PhotoSlot,
    SequenceEvent, event_channel, run_capture_sequence,
};
pub use session::BoothSession;
