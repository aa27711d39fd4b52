// SPDX-License-Identifier: GPL-3.0-only

//! Booth session state
//!
//! One explicit object owns everything a capture cycle touches: the current
//! overlay, both captured photos, the final composite and the in-flight
//! guard. It is created at startup and reset by retry; there is no other
//! mutable state in the booth.

use super::overlay::OverlayImage;
use super::sequence::{CapturedPhoto, FinalComposite, PhotoSlot, SequenceEvent};
use crate::compose::Compositor;
use crate::config::Config;
use crate::errors::OverlayError;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// State owned by one booth run
pub struct BoothSession {
    config: Config,
    compositor: Arc<Compositor>,
    overlay: Option<OverlayImage>,
    top_photo: Option<CapturedPhoto>,
    bottom_photo: Option<CapturedPhoto>,
    composite: Option<FinalComposite>,
    sequence_active: bool,
}

impl BoothSession {
    /// Create a session; font discovery for the compositor happens here
    pub fn new(config: Config) -> Self {
        Self {
            config,
            compositor: Arc::new(Compositor::new()),
            overlay: None,
            top_photo: None,
            bottom_photo: None,
            composite: None,
            sequence_active: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compositor(&self) -> Arc<Compositor> {
        Arc::clone(&self.compositor)
    }

    /// Replace the overlay from a file
    ///
    /// On failure the previous overlay stays active, mirroring the original
    /// behavior where a rejected upload changed nothing.
    pub fn set_overlay(&mut self, path: &Path) -> Result<(), OverlayError> {
        match OverlayImage::load(path) {
            Ok(overlay) => {
                info!(path = %path.display(), "Overlay replaced");
                self.overlay = Some(overlay);
                Ok(())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Overlay rejected, keeping previous");
                Err(err)
            }
        }
    }

    /// The current overlay pixels, if any
    pub fn overlay_image(&self) -> Option<Arc<RgbaImage>> {
        self.overlay.as_ref().map(|o| o.image())
    }

    /// Path of the current overlay, if any
    pub fn overlay_path(&self) -> Option<&Path> {
        self.overlay.as_ref().map(|o| o.path())
    }

    /// Mark a sequence as started
    ///
    /// Returns false while one is already active: invoking start mid-flight
    /// is deliberately a no-op.
    pub fn begin_sequence(&mut self) -> bool {
        if self.sequence_active {
            warn!("Capture sequence already active, ignoring start");
            return false;
        }

        self.sequence_active = true;
        self.top_photo = None;
        self.bottom_photo = None;
        self.composite = None;
        true
    }

    /// Whether a sequence is currently running
    pub fn sequence_active(&self) -> bool {
        self.sequence_active
    }

    /// Fold a sequence event into the session state
    pub fn apply_event(&mut self, event: &SequenceEvent) {
        match event {
            SequenceEvent::PhotoCaptured { slot, photo } => match slot {
                PhotoSlot::Top => self.top_photo = Some(photo.clone()),
                PhotoSlot::Bottom => self.bottom_photo = Some(photo.clone()),
            },
            SequenceEvent::CompositeReady(composite) => {
                self.composite = Some(composite.clone());
                self.sequence_active = false;
            }
            SequenceEvent::Failed(_) => {
                self.sequence_active = false;
            }
            _ => {}
        }
    }

    /// The finished composite, once a cycle completed
    pub fn composite(&self) -> Option<&FinalComposite> {
        self.composite.as_ref()
    }

    /// The captured photo for a slot
    pub fn photo(&self, slot: PhotoSlot) -> Option<&CapturedPhoto> {
        match slot {
            PhotoSlot::Top => self.top_photo.as_ref(),
            PhotoSlot::Bottom => self.bottom_photo.as_ref(),
        }
    }

    /// Whether a completed composite is ready to save
    pub fn ready_to_download(&self) -> bool {
        self.composite.is_some() && !self.sequence_active
    }

    /// Discard the cycle's photos and composite, restoring the pre-capture
    /// state (the caller re-acquires the camera)
    pub fn retry(&mut self) {
        info!("Retry: discarding photos and composite");
        self.top_photo = None;
        self.bottom_photo = None;
        self.composite = None;
        self.sequence_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::CameraFrame;
    use crate::booth::sequence::{FrameSource, event_channel, run_capture_sequence};

    struct StaticSource(CameraFrame);

    impl FrameSource for StaticSource {
        fn latest_frame(&self) -> Option<CameraFrame> {
            Some(self.0.clone())
        }
    }

    fn session() -> BoothSession {
        BoothSession::new(Config::default())
    }

    #[test]
    fn test_begin_sequence_ignores_reentry() {
        let mut session = session();

        assert!(session.begin_sequence());
        assert!(session.sequence_active());
        // Start pressed again mid-flight
        assert!(!session.begin_sequence());

        session.apply_event(&SequenceEvent::Failed("camera gone".to_string()));
        assert!(!session.sequence_active());
        assert!(session.begin_sequence());
    }

    #[test]
    fn test_missing_overlay_keeps_previous_state() {
        let mut session = session();

        assert!(session.set_overlay(Path::new("/nonexistent/frame.png")).is_err());
        assert!(session.overlay_image().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_restores_pre_capture_state() {
        let mut session = session();
        let frame = CameraFrame::from_rgba(32, 24, vec![40u8; 32 * 24 * 4]);

        assert!(session.begin_sequence());
        let (tx, mut rx) = event_channel();
        let compositor = Arc::new(Compositor::with_footer_font(None));
        run_capture_sequence(StaticSource(frame), None, compositor, tx)
            .await
            .unwrap();

        while let Ok(Some(event)) = rx.try_next() {
            session.apply_event(&event);
        }

        assert!(session.ready_to_download());
        assert!(session.photo(PhotoSlot::Top).is_some());
        assert!(session.photo(PhotoSlot::Bottom).is_some());

        session.retry();

        assert!(!session.ready_to_download());
        assert!(session.composite().is_none());
        assert!(session.photo(PhotoSlot::Top).is_none());
        assert!(session.photo(PhotoSlot::Bottom).is_none());
        assert!(!session.sequence_active());
    }
}
