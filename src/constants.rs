// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Print template geometry (4x6" portrait at 300 DPI)
pub mod template {
    /// Output resolution in dots per inch
    pub const DPI: u32 = 300;

    /// Final composite width in pixels (4 inches)
    pub const COMPOSITE_WIDTH: u32 = 4 * DPI;

    /// Final composite height in pixels (6 inches)
    pub const COMPOSITE_HEIGHT: u32 = 6 * DPI;
}

/// Capture sequence timing
pub mod timing {
    use super::Duration;

    /// Countdown length before each of the two shots
    pub const COUNTDOWN_SECONDS: u32 = 3;

    /// Interval between visible countdown ticks
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

    /// Pause between the first capture and the second countdown
    pub const BETWEEN_SHOTS_PAUSE: Duration = Duration::from_millis(500);

    /// Frames within this window after stream start are not trusted yet
    pub const CAMERA_WARMUP: Duration = Duration::from_millis(500);

    /// How long to wait for a first frame before giving up
    pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Caption drawn near the bottom of every composite
pub const FOOTER_TEXT: &str = "Made with Photo Booth";

/// Footer glyph size in pixels
pub const FOOTER_SIZE_PX: f32 = 30.0;

/// Gap between the footer baseline and the bottom edge
pub const FOOTER_MARGIN_PX: u32 = 20;

/// Footer color (RGBA)
pub const FOOTER_COLOR: [u8; 4] = [0x33, 0x33, 0x33, 0xFF];

/// Filename of the downloadable composite
pub const OUTPUT_FILENAME: &str = "photobooth.png";

/// Default folder name for saving composites (under the pictures dir)
pub const DEFAULT_SAVE_FOLDER: &str = "PhotoBooth";

/// Footer font discovery
pub mod fonts {
    /// System font paths tried in order for the footer caption.
    ///
    /// A bold sans-serif face; the exact file varies by distribution.
    pub const FOOTER_FONT_PATHS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
        "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    ];

    /// Name of a user-provided footer font in the config directory
    pub const USER_FONT_FILENAME: &str = "footer.ttf";
}
