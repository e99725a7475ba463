use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::coords::Point;
use crate::paint::{Blend, Color};

use super::DeviceError;

/// Opaque handle to a texture owned by a [`GraphicsDevice`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A textured quad in target pixel space.
///
/// Corner order follows the source rectangle: top-left, bottom-left,
/// bottom-right, top-right. `uvs[i]` is the texture coordinate of `corners[i]`.
/// Affine placement keeps the quad a parallelogram.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub corners: [Point; 4],
    pub uvs: [Point; 4],
}

/// The GPU collaborator behind every [`Image`](crate::image::Image).
///
/// Calls are issued in program order. An upload or destroy must not affect draws
/// issued before it.
pub trait GraphicsDevice {
    /// Creates a `width x height` RGBA8 texture initialized from `pixels`
    /// (row-major, `width * height` entries).
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[Color],
    ) -> Result<TextureId, DeviceError>;

    /// Replaces the full contents of a texture.
    fn upload_texture(&mut self, id: TextureId, pixels: &[Color]) -> Result<(), DeviceError>;

    /// Releases a texture. Unknown ids are ignored.
    fn destroy_texture(&mut self, id: TextureId);

    fn bind_texture(&mut self, id: TextureId) -> Result<(), DeviceError>;

    /// Sets blend function and vertex color for subsequent quads.
    fn set_draw_state(&mut self, blend: Blend, color: Color);

    /// Draws a quad sampling the bound texture.
    fn draw_quad(&mut self, quad: &Quad) -> Result<(), DeviceError>;
}

/// Single-threaded shared handle to the active device.
pub type SharedDevice = Rc<RefCell<dyn GraphicsDevice>>;
