// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for application constants

use photobooth::constants::{template, timing};
use std::time::Duration;

#[test]
fn test_template_is_4x6_at_300_dpi() {
    assert_eq!(template::DPI, 300);
    assert_eq!(template::COMPOSITE_WIDTH, 1200);
    assert_eq!(template::COMPOSITE_HEIGHT, 1800);
}

#[test]
fn test_sequence_timing() {
    assert_eq!(timing::COUNTDOWN_SECONDS, 3);
    assert_eq!(timing::COUNTDOWN_TICK, Duration::from_secs(1));
    assert_eq!(timing::BETWEEN_SHOTS_PAUSE, Duration::from_millis(500));
    assert!(timing::CAMERA_WARMUP < timing::FIRST_FRAME_TIMEOUT);
}

#[test]
fn test_output_filename() {
    assert_eq!(photobooth::constants::OUTPUT_FILENAME, "photobooth.png");
}
