//! Paint model: the packed pixel color and the blend engine.
//!
//! Scope:
//! - color representation (straight alpha, 8 bits per channel, fixed RGBA order)
//! - blend modes and the per-pixel `compose` function
//!
//! Geometry types remain in `coords`.

pub mod blend;
pub mod color;

pub use blend::{compose, mul_div255, Blend, BlendMode};
pub use color::Color;
