//! CPU-side pixel buffers.
//!
//! A [`Canvas`] stores its pixels in a buffer padded to power-of-two dimensions so
//! it can be mirrored into a texture without resampling. Logical operations only
//! ever address the occupied area; padding stays transparent unless `clear` fills it.

mod canvas;
mod io;

pub use canvas::{Canvas, MAX_DIMENSION};
