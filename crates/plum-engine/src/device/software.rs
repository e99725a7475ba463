use std::collections::BTreeMap;

use crate::canvas::Canvas;
use crate::coords::{Point, Vec2};
use crate::paint::{mul_div255, Blend, Color};

use super::{DeviceError, GraphicsDevice, Quad, TextureId};

/// One issued draw, as recorded by [`SoftwareDevice`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawRecord {
    pub texture: TextureId,
    pub blend: Blend,
    pub color: Color,
    pub quad: Quad,
}

#[derive(Debug)]
struct SoftTexture {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

/// CPU reference backend.
///
/// Textures are plain pixel vectors. Quads are rasterized onto a target
/// [`Canvas`] with nearest sampling at pixel centers, modulated by the vertex
/// color and composed with the active blend. Coverage is half-open, so quads
/// sharing an edge never touch the same pixel twice.
#[derive(Debug)]
pub struct SoftwareDevice {
    target: Canvas,
    textures: BTreeMap<TextureId, SoftTexture>,
    next_id: u64,
    bound: Option<TextureId>,
    blend: Blend,
    color: Color,
    draws: Vec<DrawRecord>,
}

impl SoftwareDevice {
    /// Creates a device drawing into a transparent `width x height` target.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_target(Canvas::new(width, height))
    }

    pub fn with_target(target: Canvas) -> Self {
        Self {
            target,
            textures: BTreeMap::new(),
            next_id: 1,
            bound: None,
            blend: Blend::default(),
            color: Color::white(),
            draws: Vec::new(),
        }
    }

    #[inline]
    pub fn target(&self) -> &Canvas {
        &self.target
    }

    #[inline]
    pub fn target_mut(&mut self) -> &mut Canvas {
        &mut self.target
    }

    /// Number of textures created and not yet destroyed.
    #[inline]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Reads back the full contents of a texture.
    pub fn texture_pixels(&self, id: TextureId) -> Option<&[Color]> {
        self.textures.get(&id).map(|t| t.pixels.as_slice())
    }

    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&id).map(|t| (t.width, t.height))
    }

    /// Every draw issued since creation or the last [`clear_draw_log`](Self::clear_draw_log).
    #[inline]
    pub fn draw_log(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn clear_draw_log(&mut self) {
        self.draws.clear();
    }

    fn rasterize(&mut self, id: TextureId, quad: &Quad) {
        let Some(tex) = self.textures.get(&id) else { return };
        if tex.width == 0 || tex.height == 0 {
            return;
        }

        let [c0, c1, c2, c3] = quad.corners;
        let e1 = c3 - c0;
        let e2 = c1 - c0;
        let det = e1.x * e2.y - e1.y * e2.x;
        if det.abs() < f64::EPSILON {
            log::trace!("skipping degenerate quad {quad:?}");
            return;
        }

        let uv0 = quad.uvs[0].to_vec2();
        let du = quad.uvs[3] - quad.uvs[0];
        let dv = quad.uvs[1] - quad.uvs[0];

        let min_x = c0.x.min(c1.x).min(c2.x).min(c3.x).floor().max(0.0);
        let min_y = c0.y.min(c1.y).min(c2.y).min(c3.y).floor().max(0.0);
        let max_x = c0.x.max(c1.x).max(c2.x).max(c3.x).ceil();
        let max_y = c0.y.max(c1.y).max(c2.y).max(c3.y).ceil();
        let max_x = max_x.min(f64::from(self.target.width()));
        let max_y = max_y.min(f64::from(self.target.height()));
        if !(min_x < max_x && min_y < max_y) {
            return;
        }

        let (tw, th) = (tex.width, tex.height);
        for py in min_y as i32..max_y as i32 {
            for px in min_x as i32..max_x as i32 {
                let d = Point::new(f64::from(px) + 0.5, f64::from(py) + 0.5) - c0;
                let u = (d.x * e2.y - d.y * e2.x) / det;
                let v = (e1.x * d.y - e1.y * d.x) / det;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }

                let uv: Vec2 = uv0 + du * u + dv * v;
                let tx = texel(uv.x, tw);
                let ty = texel(uv.y, th);
                let src = modulate(tex.pixels[ty * tw as usize + tx], self.color);
                self.target.blend_pixel(px, py, src, self.blend, 255);
            }
        }
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[Color],
    ) -> Result<TextureId, DeviceError> {
        check_len(width, height, pixels)?;
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            id,
            SoftTexture {
                width,
                height,
                pixels: pixels.to_vec(),
            },
        );
        log::debug!("software texture {id} created ({width}x{height})");
        Ok(id)
    }

    fn upload_texture(&mut self, id: TextureId, pixels: &[Color]) -> Result<(), DeviceError> {
        let tex = self
            .textures
            .get_mut(&id)
            .ok_or(DeviceError::UnknownTexture(id))?;
        check_len(tex.width, tex.height, pixels)?;
        tex.pixels.copy_from_slice(pixels);
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            log::warn!("destroy of unknown texture {id}");
            return;
        }
        if self.bound == Some(id) {
            self.bound = None;
        }
        log::debug!("software texture {id} destroyed");
    }

    fn bind_texture(&mut self, id: TextureId) -> Result<(), DeviceError> {
        if !self.textures.contains_key(&id) {
            return Err(DeviceError::UnknownTexture(id));
        }
        self.bound = Some(id);
        Ok(())
    }

    fn set_draw_state(&mut self, blend: Blend, color: Color) {
        self.blend = blend;
        self.color = color;
    }

    fn draw_quad(&mut self, quad: &Quad) -> Result<(), DeviceError> {
        let id = self.bound.ok_or(DeviceError::NoBoundTexture)?;
        self.draws.push(DrawRecord {
            texture: id,
            blend: self.blend,
            color: self.color,
            quad: *quad,
        });
        self.rasterize(id, quad);
        Ok(())
    }
}

fn check_len(width: u32, height: u32, pixels: &[Color]) -> Result<(), DeviceError> {
    let expected = width as usize * height as usize;
    if pixels.len() != expected {
        return Err(DeviceError::SizeMismatch {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

#[inline]
fn texel(coord: f64, size: u32) -> usize {
    let max = f64::from(size - 1);
    (coord * f64::from(size)).floor().clamp(0.0, max) as usize
}

#[inline]
fn modulate(texel: Color, tint: Color) -> Color {
    Color::rgba(
        mul_div255(texel.r, tint.r),
        mul_div255(texel.g, tint.g),
        mul_div255(texel.b, tint.b),
        mul_div255(texel.a, tint.a),
    )
}
