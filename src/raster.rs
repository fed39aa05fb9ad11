/// Raster export pipeline
///
/// This module handles all encoded-bytes-to-encoded-bytes image work:
/// - Blank placeholder canvases sent to the model as a dimension anchor
/// - Stretch-resizing the generated poster for download
/// - The quality tiers offered in the download dialog

use std::io::Cursor;

use image::{imageops::FilterType, DynamicImage, ImageFormat, Rgb, RgbImage};
use thiserror::Error;

use crate::geometry::AspectRatio;
use crate::state::data::ImageObject;

/// Longest edge of the blank canvas sent to the model. Large enough for the
/// model to honor the aspect ratio, small enough to keep the request light.
pub const BLANK_CANVAS_EDGE: u32 = 1024;

/// Neutral mid-gray, less likely to bleed into the generated palette than
/// pure white or black.
const BLANK_GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Errors from the export pipeline. Decoding is the realistic failure;
/// the caller surfaces it in the download dialog only and may simply retry.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The poster bytes could not be decoded as an image.
    #[error("could not decode the poster image: {0}")]
    Decode(image::ImageError),
    /// Re-encoding the resized raster failed.
    #[error("could not encode the resized poster: {0}")]
    Encode(image::ImageError),
}

/// Named target export resolutions (longest edge in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    Normal,
    High,
    UltraHigh,
}

impl QualityTier {
    /// All tiers, in the order the download dialog lists them.
    pub const ALL: [QualityTier; 3] = [
        QualityTier::Normal,
        QualityTier::High,
        QualityTier::UltraHigh,
    ];

    /// Target longest edge in pixels.
    pub fn longest_edge(self) -> u32 {
        match self {
            QualityTier::Normal => 2000,
            QualityTier::High => 4000,
            QualityTier::UltraHigh => 6000,
        }
    }

    /// Human-readable tier name.
    pub fn label(self) -> &'static str {
        match self {
            QualityTier::Normal => "Normal",
            QualityTier::High => "High",
            QualityTier::UltraHigh => "Ultra High",
        }
    }

    /// Tier name as used in the export file name.
    pub fn file_slug(self) -> &'static str {
        match self {
            QualityTier::Normal => "normal",
            QualityTier::High => "high",
            QualityTier::UltraHigh => "ultra-high",
        }
    }

    /// Pixel dimensions this tier exports at for the given aspect ratio.
    pub fn dimensions(self, aspect_ratio: AspectRatio) -> (u32, u32) {
        aspect_ratio.dimensions_for(self.longest_edge())
    }
}

/// Produce a solid mid-gray PNG at the dimensions of the given aspect
/// ratio. Sent as the first image of a generation request so the model
/// anchors to the right output dimensions; never shown to the user.
pub fn blank_canvas(aspect_ratio: AspectRatio) -> ImageObject {
    let (width, height) = aspect_ratio.dimensions_for(BLANK_CANVAS_EDGE);
    let canvas = RgbImage::from_pixel(width, height, BLANK_GRAY);

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("PNG-encoding an in-memory RGB canvas cannot fail");

    ImageObject::png(bytes)
}

/// Decode `poster`, stretch it to exactly `width x height` (no
/// letterboxing) and re-encode it losslessly as PNG.
///
/// Deterministic for identical inputs, so callers may retry freely; this
/// function itself never retries.
pub fn resize(poster: &ImageObject, width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let decoded = image::load_from_memory(&poster.bytes).map_err(ExportError::Decode)?;
    let stretched = decoded.resize_exact(width, height, FilterType::Lanczos3);

    let mut bytes = Vec::new();
    stretched
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(ExportError::Encode)?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_canvas_dimensions_and_color() {
        for ratio in AspectRatio::ALL {
            let canvas = blank_canvas(ratio);
            assert_eq!(canvas.mime_type, "image/png");

            let decoded = image::load_from_memory(&canvas.bytes).unwrap();
            let (width, height) = ratio.dimensions_for(BLANK_CANVAS_EDGE);
            assert_eq!(decoded.width(), width);
            assert_eq!(decoded.height(), height);

            let rgb = decoded.to_rgb8();
            assert_eq!(*rgb.get_pixel(0, 0), BLANK_GRAY);
            assert_eq!(*rgb.get_pixel(width - 1, height - 1), BLANK_GRAY);
        }
    }

    #[test]
    fn test_resize_hits_exact_target_box() {
        let source = blank_canvas(AspectRatio::Square);
        // Stretch to a non-square box: no letterboxing, exact dimensions.
        let resized = resize(&source, 300, 120).unwrap();
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (300, 120));
    }

    #[test]
    fn test_resize_is_deterministic() {
        let source = blank_canvas(AspectRatio::Landscape16x9);
        let once = resize(&source, 640, 360).unwrap();
        let twice = resize(&source, 640, 360).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_resize_same_size_preserves_pixels() {
        let source = blank_canvas(AspectRatio::Square);
        let decoded_before = image::load_from_memory(&source.bytes).unwrap().to_rgb8();

        let (width, height) = (decoded_before.width(), decoded_before.height());
        let resized = resize(&source, width, height).unwrap();
        let decoded_after = image::load_from_memory(&resized).unwrap().to_rgb8();

        assert_eq!(decoded_before.as_raw(), decoded_after.as_raw());
    }

    #[test]
    fn test_resize_rejects_undecodable_bytes() {
        let garbage = ImageObject::png(vec![0xde, 0xad, 0xbe, 0xef]);
        match resize(&garbage, 100, 100) {
            Err(ExportError::Decode(_)) => {}
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_tier_dimension_table() {
        assert_eq!(
            QualityTier::High.dimensions(AspectRatio::Landscape16x9),
            (4000, 2250)
        );
        assert_eq!(
            QualityTier::Normal.dimensions(AspectRatio::Portrait9x16),
            (1125, 2000)
        );
        assert_eq!(
            QualityTier::UltraHigh.dimensions(AspectRatio::Square),
            (6000, 6000)
        );
    }
}
