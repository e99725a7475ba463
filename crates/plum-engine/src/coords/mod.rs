//! Coordinate and geometry types shared by the canvas and the blit pipeline.
//!
//! Canonical space:
//! - pixels, origin top-left
//! - +X right, +Y down
//! - positive angles rotate clockwise on screen
//!
//! Points, vectors and affine transforms come from `kurbo`; pixel rectangles are
//! integer and inclusive.

mod align;
mod rect;
mod region;

pub use align::align;
pub use kurbo::{Affine, Point, Vec2};
pub use rect::Rect;
pub use region::{SourceRegion, UvRect};
