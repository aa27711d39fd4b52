// SPDX-License-Identifier: GPL-3.0-only

//! The two-shot capture sequence
//!
//! One async flow drives a full booth cycle: lock the controls, count down,
//! capture the top photo, pause, count down again, capture the bottom
//! photo, release the camera, composite. Progress is reported on an event
//! channel so the terminal UI and the headless CLI share the same driver.
//!
//! There is no cancellation: once started, a sequence runs to completion or
//! to its first error.

use super::countdown::{self, CountdownEvent};
use crate::backends::camera::{CameraFrame, CameraPipeline};
use crate::compose::Compositor;
use crate::constants::timing::{BETWEEN_SHOTS_PAUSE, COUNTDOWN_SECONDS};
use crate::errors::{BoothError, BoothResult, CameraError};
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, info};

/// Which slot of the print template a photo fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSlot {
    /// First shot, upper slot
    Top,
    /// Second shot, lower slot
    Bottom,
}

/// A photo captured from the live stream
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    image: Arc<RgbaImage>,
}

impl CapturedPhoto {
    fn from_frame(frame: &CameraFrame) -> BoothResult<Self> {
        let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .ok_or_else(|| CameraError::InvalidFormat("frame buffer size mismatch".to_string()))?;

        Ok(Self {
            image: Arc::new(image),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.image)
    }
}

/// The encoded result of a completed sequence
#[derive(Debug, Clone)]
pub struct FinalComposite {
    png: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl FinalComposite {
    pub fn png_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.png)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Progress reports emitted while a sequence runs
#[derive(Debug, Clone)]
pub enum SequenceEvent {
    /// Start/download/retry are no longer available
    ControlsLocked,
    /// A countdown value became visible
    CountdownTick(u32),
    /// The countdown display was hidden
    CountdownHidden,
    /// A photo was captured and should be shown
    PhotoCaptured {
        slot: PhotoSlot,
        photo: CapturedPhoto,
    },
    /// The camera stream was stopped and released; the live preview is
    /// replaced by the second photo
    PreviewReleased,
    /// The composite is ready; download and retry become available
    CompositeReady(FinalComposite),
    /// The sequence failed; controls are restored
    Failed(String),
}

/// Sender half of the sequence event channel
pub type EventSender = futures::channel::mpsc::UnboundedSender<SequenceEvent>;

/// Receiver half of the sequence event channel
pub type EventReceiver = futures::channel::mpsc::UnboundedReceiver<SequenceEvent>;

/// Create a sequence event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    futures::channel::mpsc::unbounded()
}

/// Source of live frames for the sequence
///
/// The sequence owns its source and drops it to release the camera after
/// the second capture. `CameraPipeline` is the production implementation;
/// tests substitute a mock.
pub trait FrameSource: Send + 'static {
    /// The most recent frame, if the stream has delivered one
    fn latest_frame(&self) -> Option<CameraFrame>;
}

impl FrameSource for CameraPipeline {
    fn latest_frame(&self) -> Option<CameraFrame> {
        CameraPipeline::latest_frame(self)
    }
}

/// Run one full capture sequence
///
/// Consumes the frame source; the camera is released before the composite
/// is produced. Events mirror the return value: `CompositeReady` on
/// success, `Failed` on error.
pub async fn run_capture_sequence<S: FrameSource>(
    source: S,
    overlay: Option<Arc<RgbaImage>>,
    compositor: Arc<Compositor>,
    events: EventSender,
) -> BoothResult<FinalComposite> {
    match run_inner(source, overlay, compositor, &events).await {
        Ok(composite) => {
            let _ = events.unbounded_send(SequenceEvent::CompositeReady(composite.clone()));
            Ok(composite)
        }
        Err(err) => {
            let _ = events.unbounded_send(SequenceEvent::Failed(err.to_string()));
            Err(err)
        }
    }
}

async fn run_inner<S: FrameSource>(
    source: S,
    overlay: Option<Arc<RgbaImage>>,
    compositor: Arc<Compositor>,
    events: &EventSender,
) -> BoothResult<FinalComposite> {
    let _ = events.unbounded_send(SequenceEvent::ControlsLocked);
    info!("Capture sequence started");

    let top = capture_after_countdown(&source, events, PhotoSlot::Top).await?;

    tokio::time::sleep(BETWEEN_SHOTS_PAUSE).await;

    let bottom = capture_after_countdown(&source, events, PhotoSlot::Bottom).await?;

    // Stop and release the camera before the preview is replaced
    drop(source);
    let _ = events.unbounded_send(SequenceEvent::PreviewReleased);
    debug!("Camera released, compositing");

    let composite = compose(&top, &bottom, overlay, compositor).await?;

    info!(
        width = composite.width(),
        height = composite.height(),
        "Capture sequence complete"
    );
    Ok(composite)
}

async fn capture_after_countdown<S: FrameSource>(
    source: &S,
    events: &EventSender,
    slot: PhotoSlot,
) -> BoothResult<CapturedPhoto> {
    countdown::count_from(COUNTDOWN_SECONDS, |event| {
        let _ = events.unbounded_send(match event {
            CountdownEvent::Tick(value) => SequenceEvent::CountdownTick(value),
            CountdownEvent::Hidden => SequenceEvent::CountdownHidden,
        });
    })
    .await;

    let frame = source
        .latest_frame()
        .ok_or(CameraError::NoFrameAvailable)?;
    let photo = CapturedPhoto::from_frame(&frame)?;

    debug!(
        slot = ?slot,
        width = photo.width(),
        height = photo.height(),
        "Photo captured"
    );

    let _ = events.unbounded_send(SequenceEvent::PhotoCaptured {
        slot,
        photo: photo.clone(),
    });

    Ok(photo)
}

async fn compose(
    top: &CapturedPhoto,
    bottom: &CapturedPhoto,
    overlay: Option<Arc<RgbaImage>>,
    compositor: Arc<Compositor>,
) -> BoothResult<FinalComposite> {
    let top_image = top.image();
    let bottom_image = bottom.image();
    let (width, height) = (
        compositor.layout().canvas_width,
        compositor.layout().canvas_height,
    );

    // CPU-bound: scale, blend and encode off the async runtime
    let png = tokio::task::spawn_blocking(move || {
        compositor.compose_png(&top_image, &bottom_image, overlay.as_deref())
    })
    .await
    .map_err(|e| BoothError::Other(format!("Compositing task error: {}", e)))??;

    Ok(FinalComposite {
        png: Arc::from(png.into_boxed_slice()),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockFrameSource {
        frame: Option<CameraFrame>,
        released: Arc<AtomicBool>,
    }

    impl MockFrameSource {
        fn new(frame: Option<CameraFrame>) -> (Self, Arc<AtomicBool>) {
            let released = Arc::new(AtomicBool::new(false));
            (
                Self {
                    frame,
                    released: Arc::clone(&released),
                },
                released,
            )
        }
    }

    impl FrameSource for MockFrameSource {
        fn latest_frame(&self) -> Option<CameraFrame> {
            self.frame.clone()
        }
    }

    impl Drop for MockFrameSource {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    fn test_frame(width: u32, height: u32) -> CameraFrame {
        CameraFrame::from_rgba(width, height, vec![127u8; (width * height * 4) as usize])
    }

    fn drain(mut receiver: EventReceiver) -> Vec<SequenceEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = receiver.try_next() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_captures_two_photos_in_contract_order() {
        let (source, released) = MockFrameSource::new(Some(test_frame(64, 48)));
        let compositor = Arc::new(Compositor::with_footer_font(None));
        let (tx, rx) = event_channel();

        let composite = run_capture_sequence(source, None, compositor, tx)
            .await
            .unwrap();

        assert_eq!(composite.width(), 1200);
        assert_eq!(composite.height(), 1800);
        assert!(released.load(Ordering::SeqCst));

        let events = drain(rx);
        assert!(matches!(events[0], SequenceEvent::ControlsLocked));

        let photos: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SequenceEvent::PhotoCaptured { slot, photo } => Some((*slot, photo.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].0, PhotoSlot::Top);
        assert_eq!(photos[1].0, PhotoSlot::Bottom);
        // Photo dimensions equal the video feed dimensions at capture time
        assert_eq!((photos[0].1.width(), photos[0].1.height()), (64, 48));
        assert_eq!((photos[1].1.width(), photos[1].1.height()), (64, 48));

        let ticks: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SequenceEvent::CountdownTick(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![3, 2, 1, 3, 2, 1]);

        // The camera is released before the composite arrives
        let released_pos = events
            .iter()
            .position(|e| matches!(e, SequenceEvent::PreviewReleased))
            .unwrap();
        let ready_pos = events
            .iter()
            .position(|e| matches!(e, SequenceEvent::CompositeReady(_)))
            .unwrap();
        assert!(released_pos < ready_pos);
        assert!(matches!(events.last(), Some(SequenceEvent::CompositeReady(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequence_fails_without_frames() {
        let (source, released) = MockFrameSource::new(None);
        let compositor = Arc::new(Compositor::with_footer_font(None));
        let (tx, rx) = event_channel();

        let result = run_capture_sequence(source, None, compositor, tx).await;
        assert!(matches!(
            result,
            Err(BoothError::Camera(CameraError::NoFrameAvailable))
        ));
        // The source is still dropped on the error path
        assert!(released.load(Ordering::SeqCst));

        let events = drain(rx);
        assert!(
            events
                .iter()
                .all(|e| !matches!(e, SequenceEvent::PhotoCaptured { .. }))
        );
        assert!(matches!(events.last(), Some(SequenceEvent::Failed(_))));
    }
}
