use crate::coords::{Affine, Point, SourceRegion, Vec2};
use crate::device::Quad;
use crate::error::RenderError;
use crate::paint::{mul_div255, Blend, BlendMode, Color};
use crate::render::RenderCtx;
use crate::transform::Transform;

use super::Image;

/// Resolved device state for one draw; `None` on the raw path keeps whatever
/// the last [`Image::bind`] set.
type DrawState = Option<(Blend, Color)>;

impl Image {
    /// Draws the whole image with its top-left at `(x, y)`.
    pub fn blit(&self, ctx: &RenderCtx, x: f64, y: f64, mode: BlendMode) -> Result<(), RenderError> {
        let region = self.full_region();
        self.draw(region, region_size(region), Affine::translate((x, y)), Some(self.plain(ctx, mode)))
    }

    /// Draws the whole image stretched to `width x height`.
    pub fn scale_blit(
        &self,
        ctx: &RenderCtx,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        self.draw(
            self.full_region(),
            Vec2::new(width, height),
            Affine::translate((x, y)),
            Some(self.plain(ctx, mode)),
        )
    }

    /// Draws the inclusive source rectangle `(sx, sy)..=(sx2, sy2)` at `(dx, dy)`.
    ///
    /// Inverted corners are swapped; coordinates are clamped to the image.
    #[allow(clippy::too_many_arguments)]
    pub fn blit_region(
        &self,
        ctx: &RenderCtx,
        sx: i32,
        sy: i32,
        sx2: i32,
        sy2: i32,
        dx: f64,
        dy: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        let region = self.region(sx, sy, sx2, sy2);
        self.draw(region, region_size(region), Affine::translate((dx, dy)), Some(self.plain(ctx, mode)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn scale_blit_region(
        &self,
        ctx: &RenderCtx,
        sx: i32,
        sy: i32,
        sx2: i32,
        sy2: i32,
        dx: f64,
        dy: f64,
        width: f64,
        height: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        self.draw(
            self.region(sx, sy, sx2, sy2),
            Vec2::new(width, height),
            Affine::translate((dx, dy)),
            Some(self.plain(ctx, mode)),
        )
    }

    /// Draws the whole image rotated `angle` degrees clockwise about its center.
    pub fn rotate_blit(
        &self,
        ctx: &RenderCtx,
        x: f64,
        y: f64,
        angle: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        self.rotate_scale_blit(ctx, x, y, angle, 1.0, mode)
    }

    pub fn rotate_scale_blit(
        &self,
        ctx: &RenderCtx,
        x: f64,
        y: f64,
        angle: f64,
        scale: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        let region = self.full_region();
        let (size, placement) = rotated(region, x, y, angle, scale);
        self.draw(region, size, placement, Some(self.plain(ctx, mode)))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rotate_blit_region(
        &self,
        ctx: &RenderCtx,
        sx: i32,
        sy: i32,
        sx2: i32,
        sy2: i32,
        dx: f64,
        dy: f64,
        angle: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        self.rotate_scale_blit_region(ctx, sx, sy, sx2, sy2, dx, dy, angle, 1.0, mode)
    }

    /// Draws a source rectangle scaled by `scale` and rotated about the center of the
    /// resulting quad. The unrotated quad's top-left sits at `(dx, dy)`.
    #[allow(clippy::too_many_arguments)]
    pub fn rotate_scale_blit_region(
        &self,
        ctx: &RenderCtx,
        sx: i32,
        sy: i32,
        sx2: i32,
        sy2: i32,
        dx: f64,
        dy: f64,
        angle: f64,
        scale: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        let region = self.region(sx, sy, sx2, sy2);
        let (size, placement) = rotated(region, dx, dy, angle, scale);
        self.draw(region, size, placement, Some(self.plain(ctx, mode)))
    }

    /// Binds the texture and draw state for a run of [`raw_blit_region`](Self::raw_blit_region) calls.
    pub fn bind(&self, ctx: &RenderCtx, mode: BlendMode) -> Result<(), RenderError> {
        self.ensure_fresh()?;
        let (blend, color) = self.plain(ctx, mode);
        let mut device = self.device_mut()?;
        device.bind_texture(self.texture())?;
        device.set_draw_state(blend, color);
        Ok(())
    }

    /// Rotate-scale region blit that reuses the state set by the last [`bind`](Self::bind).
    #[allow(clippy::too_many_arguments)]
    pub fn raw_blit_region(
        &self,
        sx: i32,
        sy: i32,
        sx2: i32,
        sy2: i32,
        dx: f64,
        dy: f64,
        angle: f64,
        scale: f64,
    ) -> Result<(), RenderError> {
        let region = self.region(sx, sy, sx2, sy2);
        let (size, placement) = rotated(region, dx, dy, angle, scale);
        self.draw(region, size, placement, None)
    }

    /// Draws the transform's clip (or the whole image) through its placement matrix,
    /// tinted and with the tint alpha scaled by the context opacity.
    pub fn transform_blit(&self, ctx: &RenderCtx, transform: &Transform) -> Result<(), RenderError> {
        let placement = transform.placement()?;
        let region = match transform.clip {
            Some(clip) => SourceRegion::from_clip(clip, self.width(), self.height()),
            None => self.full_region(),
        };
        let tint = transform.tint;
        let color = tint.with_alpha(mul_div255(tint.a, ctx.opacity));
        self.draw(
            region,
            region_size(region),
            placement,
            Some((ctx.resolve(transform.mode), color)),
        )
    }

    // ── pipeline ──────────────────────────────────────────────────────────

    /// The single draw every blit variant ends in.
    ///
    /// `size` is the local quad extent; `placement` maps local space to the target.
    fn draw(
        &self,
        region: Option<SourceRegion>,
        size: Vec2,
        placement: Affine,
        state: DrawState,
    ) -> Result<(), RenderError> {
        self.ensure_fresh()?;

        let Some(region) = region else {
            log::trace!("texture {}: empty source, draw skipped", self.texture());
            return Ok(());
        };
        let det = placement.determinant();
        if size.x == 0.0 || size.y == 0.0 || det == 0.0 || !det.is_finite() || !size.is_finite() {
            log::trace!("texture {}: degenerate quad, draw skipped", self.texture());
            return Ok(());
        }

        let uv = region.uv(self.true_width(), self.true_height());
        let (w, h) = (size.x, size.y);
        let quad = Quad {
            corners: [
                placement * Point::new(0.0, 0.0),
                placement * Point::new(0.0, h),
                placement * Point::new(w, h),
                placement * Point::new(w, 0.0),
            ],
            uvs: [
                Point::new(uv.s0, uv.t0),
                Point::new(uv.s0, uv.t1),
                Point::new(uv.s1, uv.t1),
                Point::new(uv.s1, uv.t0),
            ],
        };

        let mut device = self.device_mut()?;
        if let Some((blend, color)) = state {
            device.bind_texture(self.texture())?;
            device.set_draw_state(blend, color);
        }
        device.draw_quad(&quad)?;
        Ok(())
    }

    fn ensure_fresh(&self) -> Result<(), RenderError> {
        if self.is_stale() {
            return Err(RenderError::StaleTexture);
        }
        Ok(())
    }

    #[inline]
    fn full_region(&self) -> Option<SourceRegion> {
        SourceRegion::full(self.width(), self.height())
    }

    #[inline]
    fn region(&self, sx: i32, sy: i32, sx2: i32, sy2: i32) -> Option<SourceRegion> {
        SourceRegion::clamped(sx, sy, sx2, sy2, self.width(), self.height())
    }

    #[inline]
    fn plain(&self, ctx: &RenderCtx, mode: BlendMode) -> (Blend, Color) {
        (ctx.resolve(mode), Color::white().with_alpha(ctx.opacity))
    }
}

fn region_size(region: Option<SourceRegion>) -> Vec2 {
    region.map_or(Vec2::ZERO, |r| {
        Vec2::new(f64::from(r.width()), f64::from(r.height()))
    })
}

/// Quad size and placement for the rotate family: `region * scale`, rotated about
/// its own center, unrotated top-left at `(x, y)`.
fn rotated(region: Option<SourceRegion>, x: f64, y: f64, angle: f64, scale: f64) -> (Vec2, Affine) {
    let size = region_size(region) * scale;
    let half = size / 2.0;
    let placement = Affine::translate(Vec2::new(x, y) + half)
        * Affine::rotate(angle.to_radians())
        * Affine::translate(-half);
    (size, placement)
}
