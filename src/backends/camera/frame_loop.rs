// SPDX-License-Identifier: GPL-3.0-only

//! Thread lifecycle management for the capture loop
//!
//! `MmapStream` borrows the open device, so the whole device/stream scope
//! lives inside the thread body; the controller only owns the stop signal
//! and the join handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Controller for a capture loop running in a separate thread
pub struct CaptureLoopController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Signal to stop the loop
    stop_signal: Arc<AtomicBool>,
    /// Name for logging
    name: String,
}

impl CaptureLoopController {
    /// Start a capture loop in a separate thread
    ///
    /// The body receives the stop signal and must poll it between captures.
    /// Its result is logged when the thread exits.
    pub fn start<F>(name: &str, body: F) -> Self
    where
        F: FnOnce(Arc<AtomicBool>) -> Result<(), String> + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Capture loop thread started");

            match body(stop_signal_clone) {
                Ok(()) => info!(name = %name_clone, "Capture loop thread exiting"),
                Err(e) => error!(name = %name_clone, error = %e, "Capture loop failed"),
            }
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Signal the loop to stop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture loop to stop");
            if handle.join().is_err() {
                error!(name = %self.name, "Capture loop thread panicked");
            }
        }
    }

    /// Whether the capture thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for CaptureLoopController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    #[test]
    fn test_stop_terminates_loop() {
        let iterations = Arc::new(AtomicU32::new(0));
        let iterations_clone = Arc::clone(&iterations);

        let mut controller = CaptureLoopController::start("test-loop", move |stop| {
            while !stop.load(Ordering::SeqCst) {
                iterations_clone.fetch_add(1, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        });

        thread::sleep(Duration::from_millis(20));
        controller.stop();

        assert!(!controller.is_running());
        assert!(iterations.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_body_error_is_contained() {
        let mut controller =
            CaptureLoopController::start("failing-loop", |_stop| Err("boom".to_string()));
        thread::sleep(Duration::from_millis(10));
        controller.stop();
        assert!(!controller.is_running());
    }
}
