// SPDX-License-Identifier: GPL-3.0-only

//! Final composite assembly
//!
//! Draw order matches the print template: white canvas, top photo, bottom
//! photo, optional full-canvas overlay, footer caption. Scaling uses a fixed
//! filter so identical inputs always produce identical bytes.

pub mod layout;
pub mod text;

pub use layout::TemplateLayout;
pub use text::FooterFont;

use crate::constants::{FOOTER_COLOR, FOOTER_MARGIN_PX, FOOTER_SIZE_PX, FOOTER_TEXT};
use crate::errors::ComposeError;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{debug, info};

/// Assembles the downloadable composite from the captured photos
pub struct Compositor {
    layout: TemplateLayout,
    footer_font: Option<FooterFont>,
}

impl Compositor {
    /// Create a compositor for the 4x6" print template
    ///
    /// Font discovery happens once here, not per composite.
    pub fn new() -> Self {
        Self {
            layout: TemplateLayout::print_4x6(),
            footer_font: FooterFont::discover(),
        }
    }

    /// Create a compositor with an explicit footer font (or none)
    pub fn with_footer_font(footer_font: Option<FooterFont>) -> Self {
        Self {
            layout: TemplateLayout::print_4x6(),
            footer_font,
        }
    }

    /// The template geometry in use
    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    /// Compose the final image
    ///
    /// Both photos are scaled into their fixed slots, top first. The
    /// overlay, when present, is scaled to the full canvas and
    /// alpha-composited over the photos; a fully opaque overlay hides them.
    /// The caption is drawn last.
    pub fn compose(
        &self,
        top: &RgbaImage,
        bottom: &RgbaImage,
        overlay: Option<&RgbaImage>,
    ) -> RgbaImage {
        let layout = &self.layout;
        let mut canvas = RgbaImage::from_pixel(
            layout.canvas_width,
            layout.canvas_height,
            Rgba([255, 255, 255, 255]),
        );

        let top_scaled = scale_to_slot(top, layout.photo_width, layout.photo_height);
        let bottom_scaled = scale_to_slot(bottom, layout.photo_width, layout.photo_height);

        imageops::replace(
            &mut canvas,
            &top_scaled,
            layout.photo_x as i64,
            layout.top_photo_y as i64,
        );
        imageops::replace(
            &mut canvas,
            &bottom_scaled,
            layout.photo_x as i64,
            layout.bottom_photo_y as i64,
        );

        if let Some(overlay) = overlay {
            let overlay_scaled =
                if overlay.dimensions() == (layout.canvas_width, layout.canvas_height) {
                    None
                } else {
                    Some(scale_to_slot(
                        overlay,
                        layout.canvas_width,
                        layout.canvas_height,
                    ))
                };
            imageops::overlay(&mut canvas, overlay_scaled.as_ref().unwrap_or(overlay), 0, 0);
        }

        if let Some(font) = &self.footer_font {
            font.draw_centered(
                &mut canvas,
                FOOTER_TEXT,
                FOOTER_SIZE_PX,
                FOOTER_COLOR,
                layout.canvas_width as f32 / 2.0,
                (layout.canvas_height - FOOTER_MARGIN_PX) as f32,
            );
        }

        debug!(
            width = canvas.width(),
            height = canvas.height(),
            overlay = overlay.is_some(),
            "Composite assembled"
        );

        canvas
    }

    /// Compose and encode to PNG in one step
    pub fn compose_png(
        &self,
        top: &RgbaImage,
        bottom: &RgbaImage,
        overlay: Option<&RgbaImage>,
    ) -> Result<Vec<u8>, ComposeError> {
        let composite = self.compose(top, bottom, overlay);
        let png = encode_png(&composite)?;

        info!(size = png.len(), "Composite encoded");
        Ok(png)
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode an image as PNG
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ComposeError> {
    let mut buffer = Vec::new();

    image
        .write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .map_err(|e| ComposeError::EncodingFailed(e.to_string()))?;

    Ok(buffer)
}

/// Scale an image to exact slot dimensions
///
/// Triangle filtering is cheap and fully deterministic, which keeps
/// identical inputs producing identical composites.
fn scale_to_slot(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    fn compositor() -> Compositor {
        // Captions depend on host fonts; geometry tests run without one
        Compositor::with_footer_font(None)
    }

    #[test]
    fn test_composite_dimensions_fixed() {
        let compositor = compositor();
        let photo = solid(640, 480, [10, 20, 30, 255]);

        let composite = compositor.compose(&photo, &photo, None);
        assert_eq!(composite.dimensions(), (1200, 1800));

        // Input sizes do not leak into the output
        let tiny = solid(2, 2, [0, 0, 0, 255]);
        assert_eq!(compositor.compose(&tiny, &tiny, None).dimensions(), (1200, 1800));
    }

    #[test]
    fn test_photos_land_in_their_slots() {
        let compositor = compositor();
        let layout = *compositor.layout();
        let top = solid(320, 240, [255, 0, 0, 255]);
        let bottom = solid(320, 240, [0, 0, 255, 255]);

        let composite = compositor.compose(&top, &bottom, None);

        let top_center = composite.get_pixel(
            layout.photo_x + layout.photo_width / 2,
            layout.top_photo_y + layout.photo_height / 2,
        );
        let bottom_center = composite.get_pixel(
            layout.photo_x + layout.photo_width / 2,
            layout.bottom_photo_y + layout.photo_height / 2,
        );

        assert_eq!(top_center.0, [255, 0, 0, 255]);
        assert_eq!(bottom_center.0, [0, 0, 255, 255]);

        // Margins stay white
        assert_eq!(composite.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(composite.get_pixel(1199, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_opaque_overlay_obscures_photos() {
        let compositor = compositor();
        let layout = *compositor.layout();
        let photo = solid(320, 240, [255, 0, 0, 255]);
        let overlay = solid(1200, 1800, [0, 255, 0, 255]);

        let composite = compositor.compose(&photo, &photo, Some(&overlay));

        for y in [
            layout.top_photo_y + layout.photo_height / 2,
            layout.bottom_photo_y + layout.photo_height / 2,
        ] {
            let pixel = composite.get_pixel(layout.photo_x + layout.photo_width / 2, y);
            assert_eq!(pixel.0, [0, 255, 0, 255]);
        }
    }

    #[test]
    fn test_transparent_overlay_leaves_photos_visible() {
        let compositor = compositor();
        let layout = *compositor.layout();
        let photo = solid(320, 240, [255, 0, 0, 255]);
        let overlay = solid(1200, 1800, [0, 255, 0, 0]);

        let composite = compositor.compose(&photo, &photo, Some(&overlay));

        let pixel = composite.get_pixel(
            layout.photo_x + layout.photo_width / 2,
            layout.top_photo_y + layout.photo_height / 2,
        );
        assert_eq!(pixel.0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_undersized_overlay_is_scaled_to_canvas() {
        let compositor = compositor();
        let photo = solid(320, 240, [255, 0, 0, 255]);
        let overlay = solid(60, 90, [0, 255, 0, 255]);

        let composite = compositor.compose(&photo, &photo, Some(&overlay));

        // Overlay covers the whole canvas after scaling
        assert_eq!(composite.get_pixel(0, 0).0, [0, 255, 0, 255]);
        assert_eq!(composite.get_pixel(1199, 1799).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let compositor = Compositor::new();
        let top = solid(640, 480, [120, 40, 70, 255]);
        let bottom = solid(800, 600, [10, 90, 160, 255]);
        let overlay = solid(600, 900, [0, 0, 0, 64]);

        let first = compositor.compose_png(&top, &bottom, Some(&overlay)).unwrap();
        let second = compositor.compose_png(&top, &bottom, Some(&overlay)).unwrap();

        assert_eq!(first, second);
    }
}
