// SPDX-License-Identifier: GPL-3.0-only

//! Footer caption rasterization
//!
//! Glyphs are outlined with `ab_glyph` and blended into the canvas by
//! coverage. The face comes from a fixed list of system sans fonts, with an
//! optional user-dropped `footer.ttf` in the config directory taking
//! precedence.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use image::RgbaImage;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A loaded footer font
pub struct FooterFont {
    font: FontVec,
    source: PathBuf,
}

impl FooterFont {
    /// Discover and load the footer font
    ///
    /// Returns None when no usable font file exists; the compositor then
    /// skips the caption.
    pub fn discover() -> Option<Self> {
        for path in candidate_paths() {
            let Ok(data) = std::fs::read(&path) else {
                continue;
            };

            match FontVec::try_from_vec(data) {
                Ok(font) => {
                    debug!(path = %path.display(), "Loaded footer font");
                    return Some(Self { font, source: path });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unusable footer font");
                }
            }
        }

        warn!("No footer font found, composites will have no caption");
        None
    }

    /// Load a specific font file (used by tests)
    pub fn from_file(path: PathBuf) -> Option<Self> {
        let data = std::fs::read(&path).ok()?;
        let font = FontVec::try_from_vec(data).ok()?;
        Some(Self { font, source: path })
    }

    /// Path the font was loaded from
    pub fn source(&self) -> &PathBuf {
        &self.source
    }

    /// Advance width of `text` at `size` pixels
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));

        let mut width = 0.0;
        let mut last = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = last {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            last = Some(id);
        }

        width
    }

    /// Draw `text` centered horizontally on `center_x` with its baseline at
    /// `baseline_y`, blending by glyph coverage
    pub fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        color: [u8; 4],
        center_x: f32,
        baseline_y: f32,
    ) {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut caret = center_x - self.measure(text, size) / 2.0;
        let mut last = None;

        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = last {
                caret += scaled.kern(prev, id);
            }

            let mut glyph = scaled.scaled_glyph(c);
            glyph.position = point(caret, baseline_y);

            if let Some(outlined) = scaled.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let x = bounds.min.x as i64 + gx as i64;
                    let y = bounds.min.y as i64 + gy as i64;
                    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
                        return;
                    }

                    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
                    for channel in 0..3 {
                        pixel[channel] = blend(pixel[channel], color[channel], coverage);
                    }
                });
            }

            caret += scaled.h_advance(id);
            last = Some(id);
        }
    }
}

/// Linear blend of one channel by coverage
fn blend(background: u8, foreground: u8, coverage: f32) -> u8 {
    let coverage = coverage.clamp(0.0, 1.0);
    (background as f32 * (1.0 - coverage) + foreground as f32 * coverage).round() as u8
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = crate::config::Config::config_dir() {
        paths.push(config_dir.join(crate::constants::fonts::USER_FONT_FILENAME));
    }

    for path in crate::constants::fonts::FOOTER_FONT_PATHS {
        paths.push(PathBuf::from(path));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_extremes() {
        assert_eq!(blend(255, 51, 0.0), 255);
        assert_eq!(blend(255, 51, 1.0), 51);
    }

    #[test]
    fn test_measure_and_draw() {
        // Font availability depends on the host; everything else is covered
        // by the blend tests above
        let Some(font) = FooterFont::discover() else {
            return;
        };

        let width = font.measure("Made with Photo Booth", 30.0);
        assert!(width > 0.0);

        let mut canvas = RgbaImage::from_pixel(400, 60, image::Rgba([255, 255, 255, 255]));
        font.draw_centered(&mut canvas, "Booth", 30.0, [0x33, 0x33, 0x33, 0xFF], 200.0, 40.0);

        // Some pixel must have been darkened by a glyph
        assert!(canvas.pixels().any(|p| p[0] < 255));
    }
}
