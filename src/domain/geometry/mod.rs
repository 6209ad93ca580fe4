//! Geometry resolution: crop rectangles and placement transforms

pub mod affine;
pub mod resolver;

pub use affine::{AffineTransform, Point, Rect, Size};
pub use resolver::{crop_rect, oriented_crop_rect, placement_transform};
