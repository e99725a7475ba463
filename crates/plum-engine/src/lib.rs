//! Plum engine crate.
//!
//! 2D raster compositing: padded pixel canvases, a texture mirror per image, and
//! a family of blits (region, scale, rotate, transform) drawn through a pluggable
//! graphics device.

pub mod canvas;
pub mod coords;
pub mod device;
pub mod error;
pub mod image;
pub mod logging;
pub mod paint;
pub mod render;
pub mod sprite;
pub mod tileset;
pub mod transform;

pub use canvas::Canvas;
pub use error::{CanvasError, DeviceError, RenderError, TilesetError};
pub use image::Image;
pub use paint::{Blend, BlendMode, Color};
pub use render::RenderCtx;
pub use sprite::Sprite;
pub use tileset::{Config, Tileset};
pub use transform::Transform;
