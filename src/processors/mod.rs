//! Image processing primitives used by the pipeline stages.

pub mod geometry;

pub use geometry::{BoundingBox, PixelRect, Point, Rect, RegionGeometry, UnitRect};
