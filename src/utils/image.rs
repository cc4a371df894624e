//! Utility functions for image handling.
//!
//! This module provides functions for loading and converting images and for
//! copying rectangular sub-images out of a source image.

use crate::core::OCRError;
use crate::processors::PixelRect;
use image::{DynamicImage, ImageBuffer, RgbImage, imageops};

/// Converts a DynamicImage to an RgbImage.
///
/// # Arguments
///
/// * `img` - The DynamicImage to convert
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `OCRError::ImageLoad` if the image cannot be opened or decoded.
pub fn load_image(path: &std::path::Path) -> Result<RgbImage, OCRError> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}

/// Loads several images, in parallel when there are more than `parallel_threshold`.
pub fn load_images<P: AsRef<std::path::Path> + Send + Sync>(
    paths: &[P],
    parallel_threshold: usize,
) -> Result<Vec<RgbImage>, OCRError> {
    if paths.len() > parallel_threshold {
        use rayon::prelude::*;
        paths.par_iter().map(|p| load_image(p.as_ref())).collect()
    } else {
        paths.iter().map(|p| load_image(p.as_ref())).collect()
    }
}

/// Creates an RgbImage from raw pixel data.
///
/// The data must be in RGB format (3 bytes per pixel).
///
/// # Returns
///
/// * `Some(RgbImage)` - The created RGB image if the data is valid
/// * `None` - If the data length doesn't match the specified dimensions
pub fn create_rgb_image(width: u32, height: u32, data: Vec<u8>) -> Option<RgbImage> {
    if data.len() != (width as usize) * (height as usize) * 3 {
        return None;
    }

    ImageBuffer::from_raw(width, height, data)
}

/// Copies the pixels under `rect` into a new image.
///
/// # Errors
///
/// Returns `OCRError::InvalidRegion` if the rectangle is empty or leaves the image.
pub fn crop_to_rect(image: &RgbImage, rect: PixelRect) -> Result<RgbImage, OCRError> {
    let (width, height) = image.dimensions();
    let fits = rect.width > 0
        && rect.height > 0
        && rect.x.checked_add(rect.width).is_some_and(|r| r <= width)
        && rect.y.checked_add(rect.height).is_some_and(|b| b <= height);

    if !fits {
        return Err(OCRError::invalid_region(format!(
            "crop {:?} does not fit in a {}x{} image",
            rect, width, height
        )));
    }

    Ok(imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_create_rgb_image_checks_length() {
        assert!(create_rgb_image(2, 2, vec![0; 12]).is_some());
        assert!(create_rgb_image(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_crop_to_rect_copies_pixels() {
        let mut image = RgbImage::new(10, 6);
        image.put_pixel(4, 3, Rgb([9, 8, 7]));

        let crop = crop_to_rect(
            &image,
            PixelRect {
                x: 3,
                y: 2,
                width: 4,
                height: 3,
            },
        )
        .unwrap();

        assert_eq!(crop.dimensions(), (4, 3));
        assert_eq!(crop.get_pixel(1, 1), &Rgb([9, 8, 7]));
    }

    #[test]
    fn test_crop_to_rect_rejects_out_of_bounds() {
        let image = RgbImage::new(10, 6);
        let rect = PixelRect {
            x: 8,
            y: 0,
            width: 4,
            height: 2,
        };
        assert!(matches!(
            crop_to_rect(&image, rect),
            Err(OCRError::InvalidRegion { .. })
        ));

        let empty = PixelRect {
            x: 0,
            y: 0,
            width: 0,
            height: 2,
        };
        assert!(crop_to_rect(&image, empty).is_err());
    }

    #[test]
    fn test_load_image_missing_file() {
        let result = load_image(std::path::Path::new("/nonexistent/region.png"));
        assert!(matches!(result, Err(OCRError::ImageLoad(_))));
    }

    #[test]
    fn test_load_images_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbImage::from_pixel(5, 4, Rgb([1, 2, 3])).save(&path).unwrap();

        let images = load_images(&[path.clone(), path], 1).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].dimensions(), (5, 4));
        assert_eq!(images[1].get_pixel(0, 0), &Rgb([1, 2, 3]));
    }
}
