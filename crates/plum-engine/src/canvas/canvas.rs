use crate::coords::{align, SourceRegion};
use crate::error::CanvasError;
use crate::paint::{compose, Blend, Color};

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

/// Padded RGBA pixel buffer with a clip region.
///
/// Invariants:
/// - `pixels.len() == true_width * true_height`, `true_* == align(*)`
/// - the clip region, when present, lies inside the occupied area
///
/// Cloning is a deep copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    true_width: u32,
    true_height: u32,
    pixels: Vec<Color>,
    clip: Option<SourceRegion>,
}

impl Canvas {
    /// Creates a transparent canvas with `width x height` occupied pixels.
    ///
    /// Dimensions above [`MAX_DIMENSION`] are clamped, so the occupied size can be
    /// smaller than requested. Use [`try_new`](Self::try_new) to reject them instead.
    pub fn new(width: u32, height: u32) -> Self {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            log::warn!("canvas {width}x{height} clamped to {MAX_DIMENSION}");
        }
        let width = width.min(MAX_DIMENSION);
        let height = height.min(MAX_DIMENSION);
        let true_width = align(width);
        let true_height = align(height);

        Self {
            width,
            height,
            true_width,
            true_height,
            pixels: vec![Color::transparent(); true_width as usize * true_height as usize],
            clip: SourceRegion::full(width, height),
        }
    }

    /// Like [`new`](Self::new), but fails with [`CanvasError::TooLarge`] instead
    /// of clamping.
    pub fn try_new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CanvasError::TooLarge { width, height });
        }
        Ok(Self::new(width, height))
    }

    /// Builds a canvas from row-major occupied pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: &[Color]) -> Result<Self, CanvasError> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CanvasError::TooLarge { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(CanvasError::PixelCount {
                expected,
                actual: pixels.len(),
            });
        }

        let mut canvas = Self::new(width, height);
        if width > 0 {
            let tw = canvas.true_width as usize;
            for (y, row) in pixels.chunks_exact(width as usize).enumerate() {
                canvas.pixels[y * tw..y * tw + row.len()].copy_from_slice(row);
            }
        }
        Ok(canvas)
    }

    // ── dimensions ────────────────────────────────────────────────────────

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn true_width(&self) -> u32 {
        self.true_width
    }

    #[inline]
    pub fn true_height(&self) -> u32 {
        self.true_height
    }

    /// The whole padded buffer, row-major with stride `true_width`.
    #[inline]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// The padded buffer as RGBA8 bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Row-major copy of the occupied area, without padding.
    pub fn occupied_pixels(&self) -> Vec<Color> {
        let tw = self.true_width as usize;
        let w = self.width as usize;
        (0..self.height as usize)
            .flat_map(|y| self.pixels[y * tw..y * tw + w].iter().copied())
            .collect()
    }

    // ── clip ──────────────────────────────────────────────────────────────

    /// Current clip region, `None` when empty.
    #[inline]
    pub fn clip_region(&self) -> Option<SourceRegion> {
        self.clip
    }

    /// Restricts writes and reads to `x0..=x1, y0..=y1`, clamped to the occupied area.
    ///
    /// Inverted bounds, or bounds entirely outside the occupied area, produce an
    /// empty region.
    pub fn set_clip_region(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.clip = if x0 > x1 || y0 > y1 {
            None
        } else {
            SourceRegion::clamped(x0, y0, x1, y1, self.width, self.height)
        };
    }

    pub fn restore_clip_region(&mut self) {
        self.clip = SourceRegion::full(self.width, self.height);
    }

    // ── pixels ────────────────────────────────────────────────────────────

    /// Fills the whole padded buffer, ignoring the clip region.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Returns the pixel at `(x, y)`, or transparent outside the clip region.
    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        self.index(x, y)
            .map_or(Color::transparent(), |i| self.pixels[i])
    }

    /// Writes `color` unblended. Outside the clip region this is a no-op.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Composes `color` onto the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color, blend: Blend, opacity: u8) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = compose(color, self.pixels[i], blend, opacity);
        }
    }

    /// Composites the occupied area of `self` into `dest` with its top-left at `(x, y)`.
    ///
    /// Pixels landing outside `dest`'s clip region are skipped.
    pub fn blit(&self, x: i32, y: i32, dest: &mut Canvas, blend: Blend, opacity: u8) {
        let Some(clip) = dest.clip else { return };
        if self.width == 0 || self.height == 0 {
            return;
        }

        let (x, y) = (i64::from(x), i64::from(y));
        let dx0 = x.max(i64::from(clip.x0));
        let dy0 = y.max(i64::from(clip.y0));
        let dx1 = (x + i64::from(self.width) - 1).min(i64::from(clip.x1));
        let dy1 = (y + i64::from(self.height) - 1).min(i64::from(clip.y1));
        if dx1 < dx0 || dy1 < dy0 {
            return;
        }

        let stw = self.true_width as usize;
        let dtw = dest.true_width as usize;
        for dy in dy0..=dy1 {
            let sy = (dy - y) as usize;
            for dx in dx0..=dx1 {
                let sx = (dx - x) as usize;
                let src = self.pixels[sy * stw + sx];
                let di = dy as usize * dtw + dx as usize;
                dest.pixels[di] = compose(src, dest.pixels[di], blend, opacity);
            }
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let clip = self.clip?;
        if x < clip.x0 || x > clip.x1 || y < clip.y0 || y > clip.y1 {
            return None;
        }
        Some(y as usize * self.true_width as usize + x as usize)
    }
}
