//! Indexed frames over a sprite sheet image.

use crate::coords::{Point, Rect, SourceRegion};
use crate::error::RenderError;
use crate::image::Image;
use crate::paint::{BlendMode, Color};
use crate::render::RenderCtx;
use crate::transform::Transform;

/// A grid of equally sized frames laid out row-major on an [`Image`].
///
/// Frame `f` sits at column `f % columns`, row `f / columns`, with `padding`
/// pixels between neighbouring frames. A frame that does not fit entirely inside
/// the image is empty.
#[derive(Debug, Clone, Copy)]
pub struct Sprite<'a> {
    image: &'a Image,
    frame_width: u32,
    frame_height: u32,
    padding: u32,
    columns: u32,
}

impl<'a> Sprite<'a> {
    /// Column count defaults to as many frames as fit across the image.
    pub fn new(image: &'a Image, frame_width: u32, frame_height: u32) -> Self {
        let columns = image.width().checked_div(frame_width).unwrap_or(0).max(1);
        Self {
            image,
            frame_width,
            frame_height,
            padding: 0,
            columns,
        }
    }

    #[inline]
    pub fn image(&self) -> &'a Image {
        self.image
    }

    #[inline]
    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    #[inline]
    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    #[inline]
    pub fn padding(&self) -> u32 {
        self.padding
    }

    #[inline]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn set_frame_width(&mut self, frame_width: u32) {
        self.frame_width = frame_width;
    }

    pub fn set_frame_height(&mut self, frame_height: u32) {
        self.frame_height = frame_height;
    }

    pub fn set_padding(&mut self, padding: u32) {
        self.padding = padding;
    }

    /// Clamped to at least one column.
    pub fn set_columns(&mut self, columns: u32) {
        self.columns = columns.max(1);
    }

    /// Pixel rectangle of frame `f`, or `None` when it is empty or out of bounds.
    pub fn frame_rect(&self, f: u32) -> Option<SourceRegion> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return None;
        }
        let col = u64::from(f % self.columns);
        let row = u64::from(f / self.columns);
        let x = col * (u64::from(self.frame_width) + u64::from(self.padding));
        let y = row * (u64::from(self.frame_height) + u64::from(self.padding));
        let x1 = x + u64::from(self.frame_width);
        let y1 = y + u64::from(self.frame_height);
        if x1 > u64::from(self.image.width()) || y1 > u64::from(self.image.height()) {
            return None;
        }
        // Bounded by the image size, so the casts are lossless.
        Some(SourceRegion {
            x0: x as i32,
            y0: y as i32,
            x1: (x1 - 1) as i32,
            y1: (y1 - 1) as i32,
        })
    }

    /// Pixel `(x, y)` of frame `f`; transparent outside the frame.
    pub fn get_frame_pixel(&self, f: u32, x: i32, y: i32) -> Color {
        let Some(r) = self.frame_rect(f) else {
            return Color::transparent();
        };
        if x < 0 || y < 0 || x >= self.frame_width as i32 || y >= self.frame_height as i32 {
            return Color::transparent();
        }
        self.image.canvas().get_pixel(r.x0 + x, r.y0 + y)
    }

    /// Draws frame `f` with its top-left at `(x, y)`. Empty frames draw nothing.
    pub fn blit_frame(
        &self,
        ctx: &RenderCtx,
        x: f64,
        y: f64,
        f: u32,
        mode: BlendMode,
        tint: Color,
    ) -> Result<(), RenderError> {
        let Some(r) = self.frame_rect(f) else {
            log::trace!("sprite frame {f} out of range");
            return Ok(());
        };
        let transform = Transform::at(Point::new(x, y))
            .with_mode(mode)
            .with_tint(tint)
            .with_clip(Rect::new(
                f64::from(r.x0),
                f64::from(r.y0),
                f64::from(self.frame_width),
                f64::from(self.frame_height),
            ));
        self.image.transform_blit(ctx, &transform)
    }

    /// Binds the sheet for a run of [`raw_blit_frame`](Self::raw_blit_frame) calls.
    pub fn bind(&self, ctx: &RenderCtx, mode: BlendMode) -> Result<(), RenderError> {
        self.image.bind(ctx, mode)
    }

    pub fn raw_blit_frame(&self, x: f64, y: f64, f: u32, angle: f64, scale: f64) -> Result<(), RenderError> {
        let Some(r) = self.frame_rect(f) else {
            return Ok(());
        };
        self.image
            .raw_blit_region(r.x0, r.y0, r.x1, r.y1, x, y, angle, scale)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::canvas::Canvas;
    use crate::device::{SharedDevice, SoftwareDevice};
    use crate::paint::Blend;

    use super::*;

    fn sheet(w: u32, h: u32) -> (Rc<RefCell<SoftwareDevice>>, Image) {
        let px: Vec<Color> = (0..w * h)
            .map(|i| Color::rgb((i % w) as u8, (i / w) as u8, 0))
            .collect();
        let canvas = Canvas::from_pixels(w, h, &px).unwrap();
        let dev = Rc::new(RefCell::new(SoftwareDevice::new(32, 32)));
        let shared: SharedDevice = dev.clone();
        let img = Image::new(&shared, &canvas).unwrap();
        (dev, img)
    }

    // ── frame mapping ─────────────────────────────────────────────────────

    #[test]
    fn frame_five_of_four_columns() {
        let (_dev, img) = sheet(64, 64);
        let sprite = Sprite::new(&img, 16, 16);
        assert_eq!(sprite.columns(), 4);
        assert_eq!(sprite.padding(), 0);

        let r = sprite.frame_rect(5).unwrap();
        assert_eq!((r.x0, r.y0), (16, 16));
        assert_eq!((r.x1, r.y1), (31, 31));
    }

    #[test]
    fn padding_offsets_frames() {
        let (_dev, img) = sheet(64, 64);
        let mut sprite = Sprite::new(&img, 8, 8);
        sprite.set_padding(2);
        sprite.set_columns(3);
        let r = sprite.frame_rect(4).unwrap();
        assert_eq!((r.x0, r.y0), (10, 10));
    }

    #[test]
    fn frames_outside_image_are_empty() {
        let (_dev, img) = sheet(40, 16);
        let sprite = Sprite::new(&img, 16, 16);
        assert_eq!(sprite.columns(), 2);
        assert!(sprite.frame_rect(1).is_some());
        assert!(sprite.frame_rect(2).is_none());

        let mut wide = sprite;
        wide.set_columns(3);
        assert!(wide.frame_rect(2).is_none());
    }

    #[test]
    fn zero_sized_frames_are_empty() {
        let (_dev, img) = sheet(8, 8);
        let sprite = Sprite::new(&img, 0, 4);
        assert_eq!(sprite.columns(), 1);
        assert!(sprite.frame_rect(0).is_none());
    }

    #[test]
    fn set_columns_clamps_to_one() {
        let (_dev, img) = sheet(8, 8);
        let mut sprite = Sprite::new(&img, 4, 4);
        sprite.set_columns(0);
        assert_eq!(sprite.columns(), 1);
        sprite.set_frame_width(2);
        sprite.set_frame_height(3);
        assert_eq!((sprite.frame_width(), sprite.frame_height()), (2, 3));
    }

    // ── pixels ────────────────────────────────────────────────────────────

    #[test]
    fn frame_pixel_reads_through_mapping() {
        let (_dev, img) = sheet(8, 8);
        let sprite = Sprite::new(&img, 4, 4);
        assert_eq!(sprite.get_frame_pixel(3, 1, 2), Color::rgb(5, 6, 0));
        assert_eq!(sprite.get_frame_pixel(3, 4, 0), Color::transparent());
        assert_eq!(sprite.get_frame_pixel(3, -1, 0), Color::transparent());
        assert_eq!(sprite.get_frame_pixel(9, 0, 0), Color::transparent());
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn blit_frame_draws_frame_at_position() {
        let (dev, img) = sheet(8, 8);
        let sprite = Sprite::new(&img, 4, 4);
        let ctx = RenderCtx::default();
        sprite
            .blit_frame(&ctx, 10.0, 20.0, 3, BlendMode::Opaque, Color::white())
            .unwrap();

        let dev = dev.borrow();
        let rec = dev.draw_log()[0];
        assert_eq!(rec.blend, Blend::Opaque);
        assert_eq!(dev.target().get_pixel(10, 20), Color::rgb(4, 4, 0));
        assert_eq!(dev.target().get_pixel(13, 23), Color::rgb(7, 7, 0));
        assert_eq!(dev.target().get_pixel(14, 20), Color::transparent());
    }

    #[test]
    fn blit_frame_out_of_range_is_noop() {
        let (dev, img) = sheet(8, 8);
        let sprite = Sprite::new(&img, 4, 4);
        sprite
            .blit_frame(&RenderCtx::default(), 0.0, 0.0, 99, BlendMode::Unspecified, Color::white())
            .unwrap();
        assert!(dev.borrow().draw_log().is_empty());
    }

    #[test]
    fn raw_frames_after_bind() {
        let (dev, img) = sheet(8, 8);
        let sprite = Sprite::new(&img, 4, 4);
        sprite.bind(&RenderCtx::default(), BlendMode::Opaque).unwrap();
        sprite.raw_blit_frame(0.0, 0.0, 1, 0.0, 1.0).unwrap();
        sprite.raw_blit_frame(4.0, 0.0, 2, 0.0, 1.0).unwrap();

        let dev = dev.borrow();
        assert_eq!(dev.draw_log().len(), 2);
        assert_eq!(dev.target().get_pixel(0, 0), Color::rgb(4, 0, 0));
        assert_eq!(dev.target().get_pixel(4, 0), Color::rgb(0, 4, 0));
    }
}
