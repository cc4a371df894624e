//! Geometric utilities for OCR processing.
//!
//! This module provides the geometric primitives used by the region pipeline:
//! points and polygonal bounding boxes as emitted by text detectors, axis-aligned
//! rectangles in normalized or pixel space, and the expansion/clamping math
//! that turns a tight detector box into a recognizer-friendly crop rectangle.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A bounding box represented by a collection of points.
///
/// Detectors that emit rotated or curved text regions produce polygons; the
/// pipeline crops their axis-aligned enclosing rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The points that define the bounding box.
    pub points: Vec<Point>,
}

impl BoundingBox {
    /// Creates a new bounding box from a vector of points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Creates a rectangular bounding box from corner coordinates.
    ///
    /// # Arguments
    ///
    /// * `x1` - The x-coordinate of the top-left corner.
    /// * `y1` - The y-coordinate of the top-left corner.
    /// * `x2` - The x-coordinate of the bottom-right corner.
    /// * `y2` - The y-coordinate of the bottom-right corner.
    pub fn from_coords(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        let points = vec![
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ];
        Self { points }
    }

    /// Returns the axis-aligned rectangle enclosing every point.
    ///
    /// Returns None for an empty polygon.
    pub fn enclosing_rect(&self) -> Option<Rect> {
        let (min_x, max_x) = self.points.iter().map(|p| p.x).minmax().into_option()?;
        let (min_y, max_y) = self.points.iter().map(|p| p.y).minmax().into_option()?;
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// An axis-aligned rectangle given by its top-left corner and extent.
///
/// The same type is used for normalized ([0,1]²) and pixel coordinates; which
/// one applies is carried by [`RegionGeometry`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Creates a new rectangle.
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Multiplies a normalized rectangle by the image extent.
    pub fn denormalize(&self, image_width: u32, image_height: u32) -> Rect {
        let w = image_width as f32;
        let h = image_height as f32;
        Rect::new(self.x * w, self.y * h, self.width * w, self.height * h)
    }
}

/// Pixel values this close to an integer are snapped onto it before truncation.
const SNAP_EPSILON: f64 = 1e-6;

fn snap_floor(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < SNAP_EPSILON {
        nearest
    } else {
        value.floor()
    }
}

/// A rectangle in normalized ([0,1]²) coordinates, held in double precision.
///
/// Crop expansion runs on this type so that boxes given in whole pixels come
/// back onto whole pixels after the normalize, expand, denormalize round trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl UnitRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Widens an already normalized single-precision rectangle.
    pub fn from_normalized(rect: &Rect) -> Self {
        Self::new(
            f64::from(rect.x),
            f64::from(rect.y),
            f64::from(rect.width),
            f64::from(rect.height),
        )
    }

    /// Divides a pixel rectangle by the image extent.
    pub fn from_pixels(rect: &Rect, image_width: u32, image_height: u32) -> Self {
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        Self::new(
            f64::from(rect.x) / w,
            f64::from(rect.y) / h,
            f64::from(rect.width) / w,
            f64::from(rect.height) / h,
        )
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when any component is non-finite or the extent is not positive.
    pub fn is_degenerate(&self) -> bool {
        !(self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Grows the shorter side around the center.
    ///
    /// The shorter dimension becomes `ratio` times its size, with the added
    /// padding split evenly on both sides of the center. When `width > height`
    /// the height grows; otherwise (ties included) the width grows. With
    /// `pad_long_side` the longer dimension also receives `(ratio - 1) * short`
    /// of padding.
    ///
    /// The result is not clamped; see [`UnitRect::clamp_to_unit`].
    pub fn expand_short_side(&self, ratio: f64, pad_long_side: bool) -> UnitRect {
        let (cx, cy) = (self.x + self.width / 2.0, self.y + self.height / 2.0);
        let (mut width, mut height) = (self.width, self.height);

        if width > height {
            if pad_long_side {
                width += height * (ratio - 1.0);
            }
            height *= ratio;
        } else {
            if pad_long_side {
                height += width * (ratio - 1.0);
            }
            width *= ratio;
        }

        UnitRect::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    /// Clamps into the unit square.
    ///
    /// The top-left corner is clamped to 0. A rectangle that runs past 1.0 is
    /// cut so that its far edge lands exactly on 1.0; it is never shifted back.
    pub fn clamp_to_unit(&self) -> UnitRect {
        let x = self.x.max(0.0);
        let y = self.y.max(0.0);
        let width = if x + self.width > 1.0 {
            1.0 - x
        } else {
            self.width
        };
        let height = if y + self.height > 1.0 {
            1.0 - y
        } else {
            self.height
        };
        UnitRect::new(x, y, width, height)
    }

    /// Converts to integer pixel bounds.
    ///
    /// Coordinates are multiplied by the image extent and truncated, after
    /// snapping values within rounding noise of an integer; the extent is
    /// clipped so the rectangle never leaves the image. Returns None when the
    /// resulting rectangle is empty.
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> Option<PixelRect> {
        let w = f64::from(image_width);
        let h = f64::from(image_height);
        let (x, y) = (snap_floor(self.x * w), snap_floor(self.y * h));
        let (width, height) = (snap_floor(self.width * w), snap_floor(self.height * h));
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite())
            || x < 0.0
            || y < 0.0
            || x >= w
            || y >= h
        {
            return None;
        }

        let (x, y) = (x as u32, y as u32);
        let width = width.clamp(0.0, w) as u32;
        let height = height.clamp(0.0, h) as u32;
        let width = width.min(image_width - x);
        let height = height.min(image_height - y);
        if width == 0 || height == 0 {
            return None;
        }

        Some(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}

/// An axis-aligned rectangle on the integer pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Geometry of a detected region as emitted by a detector.
///
/// `Polygon` points are in pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", content = "shape", rename_all = "snake_case")]
pub enum RegionGeometry {
    /// Rectangle relative to the image extent, in [0,1]².
    Normalized(Rect),
    /// Rectangle in pixel coordinates.
    Pixel(Rect),
    /// Polygon in pixel coordinates.
    Polygon(BoundingBox),
}

impl RegionGeometry {
    /// Returns the axis-aligned rectangle in normalized coordinates.
    ///
    /// Returns None for an empty polygon.
    pub fn normalized_rect(&self, image_width: u32, image_height: u32) -> Option<UnitRect> {
        match self {
            RegionGeometry::Normalized(rect) => Some(UnitRect::from_normalized(rect)),
            RegionGeometry::Pixel(rect) => {
                Some(UnitRect::from_pixels(rect, image_width, image_height))
            }
            RegionGeometry::Polygon(bbox) => bbox
                .enclosing_rect()
                .map(|rect| UnitRect::from_pixels(&rect, image_width, image_height)),
        }
    }

    /// Returns the axis-aligned rectangle in pixel coordinates.
    pub fn pixel_rect(&self, image_width: u32, image_height: u32) -> Option<Rect> {
        match self {
            RegionGeometry::Normalized(rect) => Some(rect.denormalize(image_width, image_height)),
            RegionGeometry::Pixel(rect) => Some(*rect),
            RegionGeometry::Polygon(bbox) => bbox.enclosing_rect(),
        }
    }
}
