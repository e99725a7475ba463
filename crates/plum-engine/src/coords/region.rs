use super::Rect;

/// Inclusive pixel rectangle inside an image's occupied area.
///
/// Invariant: `0 <= x0 <= x1 < width` and `0 <= y0 <= y1 < height` for the
/// dimensions it was clamped against. Construct through the clamping functions only.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SourceRegion {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// Normalized texture coordinates of a [`SourceRegion`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UvRect {
    pub s0: f64,
    pub t0: f64,
    pub s1: f64,
    pub t1: f64,
}

impl SourceRegion {
    /// The whole occupied area, or `None` for an empty image.
    #[inline]
    pub fn full(width: u32, height: u32) -> Option<Self> {
        Self::clamped(0, 0, i32::MAX, i32::MAX, width, height)
    }

    /// Orders the corners, then clamps each coordinate independently to the
    /// occupied area.
    ///
    /// Returns `None` when the occupied area is empty or the rectangle lies
    /// entirely outside it.
    pub fn clamped(x0: i32, y0: i32, x1: i32, y1: i32, width: u32, height: u32) -> Option<Self> {
        let max_x = last_index(width)?;
        let max_y = last_index(height)?;

        let (x0, x1) = if x1 < x0 { (x1, x0) } else { (x0, x1) };
        let (y0, y1) = if y1 < y0 { (y1, y0) } else { (y0, y1) };
        if x1 < 0 || y1 < 0 || x0 > max_x || y0 > max_y {
            return None;
        }

        Some(Self {
            x0: x0.clamp(0, max_x),
            y0: y0.clamp(0, max_y),
            x1: x1.clamp(0, max_x),
            y1: y1.clamp(0, max_y),
        })
    }

    /// Region selected by a transform clip rectangle: the origin is clamped into the
    /// occupied area and the far edge is cut at the occupied bounds.
    ///
    /// Returns `None` when the clip selects nothing (non-positive size).
    pub fn from_clip(clip: Rect, width: u32, height: u32) -> Option<Self> {
        let max_x = last_index(width)?;
        let max_y = last_index(height)?;

        let x0 = (clip.x.floor() as i32).clamp(0, max_x);
        let y0 = (clip.y.floor() as i32).clamp(0, max_y);
        let x1 = (i64::from(x0) + clip.width.floor() as i64).min(i64::from(width)) - 1;
        let y1 = (i64::from(y0) + clip.height.floor() as i64).min(i64::from(height)) - 1;

        if x1 < i64::from(x0) || y1 < i64::from(y0) {
            return None;
        }

        Some(Self { x0, y0, x1: x1 as i32, y1: y1 as i32 })
    }

    #[inline]
    pub fn width(self) -> u32 {
        (self.x1 - self.x0) as u32 + 1
    }

    #[inline]
    pub fn height(self) -> u32 {
        (self.y1 - self.y0) as u32 + 1
    }

    /// Texture coordinates against the padded texture size.
    ///
    /// The far edge is exclusive (`x1 + 1`), so the UV rect covers exactly the
    /// region's texels and never touches padding.
    #[inline]
    pub fn uv(self, true_width: u32, true_height: u32) -> UvRect {
        let tw = f64::from(true_width.max(1));
        let th = f64::from(true_height.max(1));
        UvRect {
            s0: f64::from(self.x0) / tw,
            t0: f64::from(self.y0) / th,
            s1: f64::from(self.x1 + 1) / tw,
            t1: f64::from(self.y1 + 1) / th,
        }
    }
}

#[inline]
fn last_index(dim: u32) -> Option<i32> {
    if dim == 0 {
        None
    } else {
        Some(i32::try_from(dim - 1).unwrap_or(i32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    // ── clamped ───────────────────────────────────────────────────────────

    #[test]
    fn clamped_swaps_inverted_corners() {
        let r = SourceRegion::clamped(7, 9, 2, 3, 16, 16).unwrap();
        assert_eq!(r, SourceRegion { x0: 2, y0: 3, x1: 7, y1: 9 });
    }

    #[test]
    fn clamped_limits_to_occupied_area() {
        let r = SourceRegion::clamped(-5, -5, 100, 100, 10, 20).unwrap();
        assert_eq!(r, SourceRegion { x0: 0, y0: 0, x1: 9, y1: 19 });
        assert_eq!((r.width(), r.height()), (10, 20));
    }

    #[test]
    fn fully_outside_selects_nothing() {
        assert!(SourceRegion::clamped(50, 50, 60, 60, 10, 10).is_none());
        assert!(SourceRegion::clamped(-8, 0, -1, 5, 10, 10).is_none());
        assert!(SourceRegion::clamped(0, 12, 4, 10, 10, 10).is_none());
    }

    #[test]
    fn touching_the_edge_keeps_one_pixel() {
        let r = SourceRegion::clamped(9, -3, 40, 0, 10, 10).unwrap();
        assert_eq!(r, SourceRegion { x0: 9, y0: 0, x1: 9, y1: 0 });
    }

    #[test]
    fn empty_image_has_no_region() {
        assert!(SourceRegion::clamped(0, 0, 1, 1, 0, 4).is_none());
        assert!(SourceRegion::full(4, 0).is_none());
    }

    // ── from_clip ─────────────────────────────────────────────────────────

    #[test]
    fn clip_cuts_far_edge() {
        let r = SourceRegion::from_clip(Rect::new(6.0, 2.0, 10.0, 3.0), 8, 8).unwrap();
        assert_eq!(r, SourceRegion { x0: 6, y0: 2, x1: 7, y1: 4 });
    }

    #[test]
    fn clip_with_zero_size_selects_nothing() {
        assert!(SourceRegion::from_clip(Rect::new(1.0, 1.0, 0.0, 4.0), 8, 8).is_none());
        assert!(SourceRegion::from_clip(Rect::new(1.0, 1.0, 4.0, -2.0), 8, 8).is_none());
    }

    // ── uv ────────────────────────────────────────────────────────────────

    #[test]
    fn uv_uses_true_dimensions() {
        let uv = SourceRegion::full(3, 5).unwrap().uv(4, 8);
        assert_eq!(uv, UvRect { s0: 0.0, t0: 0.0, s1: 0.75, t1: 0.625 });
    }

    #[test]
    fn uv_of_inner_region() {
        let uv = SourceRegion::clamped(2, 4, 3, 7, 16, 16).unwrap().uv(16, 16);
        assert_eq!(uv, UvRect { s0: 0.125, t0: 0.25, s1: 0.25, t1: 0.5 });
    }

    proptest! {
        #[test]
        fn clamped_coordinates_are_ordered_and_in_bounds(
            x0 in any::<i32>(), y0 in any::<i32>(), x1 in any::<i32>(), y1 in any::<i32>(),
            w in 1u32..4096, h in 1u32..4096,
        ) {
            if let Some(r) = SourceRegion::clamped(x0, y0, x1, y1, w, h) {
                prop_assert!(0 <= r.x0 && r.x0 <= r.x1 && r.x1 <= w as i32 - 1);
                prop_assert!(0 <= r.y0 && r.y0 <= r.y1 && r.y1 <= h as i32 - 1);
            }
        }

        #[test]
        fn overlapping_rectangles_always_select_something(
            x0 in -64i32..64, y0 in -64i32..64, x1 in -64i32..64, y1 in -64i32..64,
            w in 1u32..32, h in 1u32..32,
        ) {
            let overlaps = x0.max(x1) >= 0 && x0.min(x1) < w as i32
                && y0.max(y1) >= 0 && y0.min(y1) < h as i32;
            prop_assert_eq!(SourceRegion::clamped(x0, y0, x1, y1, w, h).is_some(), overlaps);
        }

        #[test]
        fn clip_regions_stay_in_bounds(
            x in -1e6f64..1e6, y in -1e6f64..1e6, cw in -1e6f64..1e6, ch in -1e6f64..1e6,
            w in 1u32..512, h in 1u32..512,
        ) {
            if let Some(r) = SourceRegion::from_clip(Rect::new(x, y, cw, ch), w, h) {
                prop_assert!(0 <= r.x0 && r.x0 <= r.x1 && r.x1 < w as i32);
                prop_assert!(0 <= r.y0 && r.y0 <= r.y1 && r.y1 < h as i32);
            }
        }
    }
}
