//! GPU-mirrored images and the blit pipeline.
//!
//! An [`Image`] owns a [`Canvas`](crate::canvas::Canvas) and one device texture
//! of the canvas's padded size. Canvas edits mark the image stale; `refresh`
//! uploads the buffer. Every blit variant funnels into a single internal draw.

mod blit;
#[allow(clippy::module_inception)]
mod image;

pub use image::Image;
