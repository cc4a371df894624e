//! Utility functions for the OCR pipeline.

pub mod image;

// Re-export image processing functions
pub use image::{create_rgb_image, crop_to_rect, dynamic_to_rgb, load_image, load_images};
