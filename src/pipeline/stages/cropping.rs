//! Region cropping stage.
//!
//! Detector boxes usually hug a single glyph run tightly. Before recognition
//! the shorter side of the box is widened so adjoining text on the same line
//! is included, the box is clamped to the image, and the pixels are copied
//! into a fresh crop.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::OCRError;
use crate::core::config::{ConfigError, ConfigValidator};
use crate::processors::{PixelRect, RegionGeometry};
use crate::utils::crop_to_rect;

/// Configuration for region cropping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CroppingConfig {
    /// Factor applied to the shorter side of each box (default 3.0).
    #[serde(default = "CroppingConfig::default_expansion_ratio")]
    pub expansion_ratio: f32,
    /// Also pad the longer side by `(expansion_ratio - 1) * shorter side`.
    #[serde(default)]
    pub pad_long_side: bool,
}

impl CroppingConfig {
    /// Create a new CroppingConfig
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expansion ratio.
    pub fn with_expansion_ratio(mut self, ratio: f32) -> Self {
        self.expansion_ratio = ratio;
        self
    }

    /// Enable or disable long-side padding.
    pub fn with_pad_long_side(mut self, enabled: bool) -> Self {
        self.pad_long_side = enabled;
        self
    }

    fn default_expansion_ratio() -> f32 {
        3.0
    }
}

impl Default for CroppingConfig {
    fn default() -> Self {
        Self {
            expansion_ratio: Self::default_expansion_ratio(),
            pad_long_side: false,
        }
    }
}

impl ConfigValidator for CroppingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_f32_range(self.expansion_ratio, 1.0, 16.0, "expansion_ratio")
    }
}

/// Extracts expanded region crops from a source image.
#[derive(Debug, Clone, Default)]
pub struct RegionExtractor {
    config: CroppingConfig,
}

impl RegionExtractor {
    /// Creates an extractor with the given configuration.
    pub fn new(config: CroppingConfig) -> Self {
        Self { config }
    }

    /// The extractor's configuration.
    pub fn config(&self) -> &CroppingConfig {
        &self.config
    }

    /// Computes the pixel rectangle that will be cropped for a region.
    ///
    /// # Errors
    ///
    /// Returns `OCRError::InvalidRegion` when the geometry is degenerate, its
    /// origin lies outside the image, or the expanded rectangle collapses to
    /// zero pixels.
    pub fn crop_rect(
        &self,
        geometry: &RegionGeometry,
        image_width: u32,
        image_height: u32,
    ) -> Result<PixelRect, OCRError> {
        if image_width == 0 || image_height == 0 {
            return Err(OCRError::invalid_region("source image is empty"));
        }

        let rect = geometry
            .normalized_rect(image_width, image_height)
            .ok_or_else(|| OCRError::invalid_region("polygon has no points"))?;

        if rect.is_degenerate() {
            return Err(OCRError::invalid_region(format!(
                "degenerate box {:?}",
                rect
            )));
        }
        if rect.x < 0.0 || rect.y < 0.0 || rect.x >= 1.0 || rect.y >= 1.0 {
            return Err(OCRError::invalid_region(format!(
                "box origin ({}, {}) lies outside the image",
                rect.x, rect.y
            )));
        }

        let expanded = rect
            .expand_short_side(f64::from(self.config.expansion_ratio), self.config.pad_long_side)
            .clamp_to_unit();

        expanded
            .to_pixel_rect(image_width, image_height)
            .ok_or_else(|| {
                OCRError::invalid_region(format!(
                    "expanded box {:?} has no pixels in a {}x{} image",
                    expanded, image_width, image_height
                ))
            })
    }

    /// Crops the expanded region out of `image`.
    ///
    /// The crop is a new, independently owned buffer.
    pub fn extract(&self, image: &RgbImage, geometry: &RegionGeometry) -> Result<RgbImage, OCRError> {
        let (width, height) = image.dimensions();
        let rect = self.crop_rect(geometry, width, height)?;
        debug!(
            "Cropping region at ({}, {}) size {}x{}",
            rect.x, rect.y, rect.width, rect.height
        );
        crop_to_rect(image, rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::{BoundingBox, Rect};
    use image::Rgb;

    fn extractor() -> RegionExtractor {
        RegionExtractor::new(CroppingConfig::default())
    }

    #[test]
    fn test_wide_box_grows_vertically() {
        // Box centered on y = 0.5 in a 64x64 image.
        let geometry = RegionGeometry::Normalized(Rect::new(0.375, 0.4375, 0.25, 0.125));
        let rect = extractor().crop_rect(&geometry, 64, 64).unwrap();

        assert_eq!(rect.x, 24);
        assert_eq!(rect.width, 16);
        assert_eq!(rect.y, 20);
        assert_eq!(rect.height, 24);
    }

    #[test]
    fn test_tall_box_grows_horizontally() {
        let geometry = RegionGeometry::Normalized(Rect::new(0.4375, 0.375, 0.125, 0.25));
        let rect = extractor().crop_rect(&geometry, 64, 64).unwrap();

        assert_eq!((rect.x, rect.y), (20, 24));
        assert_eq!((rect.width, rect.height), (24, 16));
    }

    #[test]
    fn test_pad_long_side() {
        let extractor = RegionExtractor::new(CroppingConfig::new().with_pad_long_side(true));
        let geometry = RegionGeometry::Normalized(Rect::new(0.375, 0.4375, 0.25, 0.125));
        let rect = extractor.crop_rect(&geometry, 64, 64).unwrap();

        // Width grows by 2 * 0.125, height triples.
        assert_eq!((rect.x, rect.width), (16, 32));
        assert_eq!((rect.y, rect.height), (20, 24));
    }

    #[test]
    fn test_box_at_far_edge_is_cut_not_shifted() {
        let geometry = RegionGeometry::Normalized(Rect::new(0.75, 0.875, 0.25, 0.125));
        let rect = extractor().crop_rect(&geometry, 64, 64).unwrap();

        assert_eq!((rect.x, rect.y), (48, 48));
        assert_eq!(rect.x + rect.width, 64);
        assert_eq!(rect.y + rect.height, 64);
    }

    #[test]
    fn test_box_at_near_edge_is_clamped_to_zero() {
        let geometry = RegionGeometry::Normalized(Rect::new(0.0, 0.0, 0.25, 0.125));
        let rect = extractor().crop_rect(&geometry, 64, 64).unwrap();

        // Top edge moves from -0.125 to 0; the extent is kept.
        assert_eq!((rect.x, rect.y), (0, 0));
        assert_eq!((rect.width, rect.height), (16, 24));
    }

    #[test]
    fn test_pixel_and_polygon_geometry() {
        let pixel = RegionGeometry::Pixel(Rect::new(24.0, 28.0, 16.0, 8.0));
        let polygon = RegionGeometry::Polygon(BoundingBox::from_coords(24.0, 28.0, 40.0, 36.0));

        let a = extractor().crop_rect(&pixel, 64, 64).unwrap();
        let b = extractor().crop_rect(&polygon, 64, 64).unwrap();
        assert_eq!(a, b);
        assert_eq!((a.y, a.height), (20, 24));
    }

    #[test]
    fn test_pixel_box_keeps_whole_pixels() {
        let geometry = RegionGeometry::Pixel(Rect::new(0.0, 6.0, 7.0, 3.0));
        let rect = extractor().crop_rect(&geometry, 100, 100).unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 0,
                y: 3,
                width: 7,
                height: 9
            }
        );
    }

    /// Integer reference for the default 3x expansion on a `size`x`size` image.
    fn expected_crop(x: u32, y: u32, w: u32, h: u32, size: u32) -> PixelRect {
        if w > h {
            let top = y.saturating_sub(h);
            PixelRect {
                x,
                y: top,
                width: w,
                height: (3 * h).min(size - top),
            }
        } else {
            let left = x.saturating_sub(w);
            PixelRect {
                x: left,
                y,
                width: (3 * w).min(size - left),
                height: h,
            }
        }
    }

    #[test]
    fn test_integer_pixel_boxes_match_integer_arithmetic() {
        let size = 100;
        let extractor = extractor();
        let mut checked = 0;

        for x in (0..size).step_by(3) {
            for y in (0..size).step_by(3) {
                for w in 1..=12 {
                    for h in 1..=12 {
                        if x + w > size || y + h > size {
                            continue;
                        }
                        let geometry = RegionGeometry::Pixel(Rect::new(
                            x as f32, y as f32, w as f32, h as f32,
                        ));
                        let polygon = RegionGeometry::Polygon(BoundingBox::from_coords(
                            x as f32,
                            y as f32,
                            (x + w) as f32,
                            (y + h) as f32,
                        ));
                        let expected = expected_crop(x, y, w, h, size);

                        let rect = extractor.crop_rect(&geometry, size, size).unwrap();
                        assert_eq!(rect, expected, "box ({x}, {y}, {w}, {h})");
                        assert_eq!(extractor.crop_rect(&polygon, size, size).unwrap(), expected);
                        checked += 1;
                    }
                }
            }
        }
        assert!(checked > 10_000);
    }

    #[test]
    fn test_degenerate_boxes_are_invalid_regions() {
        let cases = [
            RegionGeometry::Normalized(Rect::new(0.1, 0.1, 0.0, 0.1)),
            RegionGeometry::Normalized(Rect::new(0.1, 0.1, 0.2, -0.1)),
            RegionGeometry::Normalized(Rect::new(f32::NAN, 0.1, 0.2, 0.1)),
            RegionGeometry::Normalized(Rect::new(-0.2, 0.1, 0.2, 0.1)),
            RegionGeometry::Normalized(Rect::new(1.2, 0.1, 0.2, 0.1)),
            RegionGeometry::Polygon(BoundingBox::new(Vec::new())),
            // Expands to well under one pixel.
            RegionGeometry::Normalized(Rect::new(0.5, 0.5, 0.001, 0.0001)),
        ];

        for geometry in cases {
            let result = extractor().crop_rect(&geometry, 100, 100);
            assert!(
                matches!(result, Err(OCRError::InvalidRegion { .. })),
                "{geometry:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_extract_returns_expected_pixels() {
        let mut image = RgbImage::new(64, 64);
        image.put_pixel(32, 32, Rgb([200, 10, 10]));

        let geometry = RegionGeometry::Normalized(Rect::new(0.375, 0.4375, 0.25, 0.125));
        let crop = extractor().extract(&image, &geometry).unwrap();

        assert_eq!(crop.dimensions(), (16, 24));
        assert_eq!(crop.get_pixel(8, 12), &Rgb([200, 10, 10]));
        assert_eq!(image.get_pixel(32, 32), &Rgb([200, 10, 10]));
    }

    #[test]
    fn test_cropping_config_validation_and_serde() {
        assert!(CroppingConfig::default().validate().is_ok());
        assert!(CroppingConfig::new().with_expansion_ratio(0.5).validate().is_err());

        let config: CroppingConfig = serde_json::from_str(r#"{"pad_long_side": true}"#).unwrap();
        assert_eq!(config.expansion_ratio, 3.0);
        assert!(config.pad_long_side);
    }
}
