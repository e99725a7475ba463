use bytemuck::{Pod, Zeroable};

/// Straight-alpha RGBA color, 8 bits per channel.
///
/// Invariant:
/// - memory order is always `r, g, b, a` (`#[repr(C)]`), so a `[Color]` slice can be
///   handed to a texture upload as RGBA8 bytes without conversion.
/// - the packed `u32` form is `r | g << 8 | b << 16 | a << 24` on every platform.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[inline]
    pub const fn transparent() -> Self {
        Self::rgba(0, 0, 0, 0)
    }

    #[inline]
    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Unpacks a color from its `u32` form.
    #[inline]
    pub const fn from_value(value: u32) -> Self {
        let [r, g, b, a] = value.to_le_bytes();
        Self { r, g, b, a }
    }

    /// Packs the color into its `u32` form.
    #[inline]
    pub const fn value(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    #[inline]
    pub const fn channels(self) -> (u8, u8, u8, u8) {
        (self.r, self.g, self.b, self.a)
    }

    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Builds a color from hue (degrees, wraps), saturation and value (`0..=255`,
    /// clamped) plus alpha.
    pub fn hsv(h: i32, s: i32, v: i32, a: u8) -> Self {
        let s = s.clamp(0, 255);
        let v = v.clamp(0, 255) as u8;
        if s == 0 {
            return Self::rgba(v, v, v, a);
        }

        let h = f64::from(h.rem_euclid(360)) / 60.0;
        let s = f64::from(s) / 255.0;
        let vf = f64::from(v) / 255.0;

        let sector = h.floor();
        let f = h - sector;

        let p = channel(vf * (1.0 - s));
        let q = channel(vf * (1.0 - s * f));
        let t = channel(vf * (1.0 - s * (1.0 - f)));

        let (r, g, b) = match sector as u8 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Self::rgba(r, g, b, a)
    }

    /// Returns `(hue, saturation, value)`: hue in `0..360` degrees, the others in `0..=255`.
    pub fn to_hsv(self) -> (i32, i32, i32) {
        let (r, g, b) = (i32::from(self.r), i32::from(self.g), i32::from(self.b));
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        if delta == 0 {
            return (0, 0, max);
        }

        let s = (f64::from(delta) * 255.0 / f64::from(max)).round() as i32;
        let d = f64::from(delta);
        let h = if max == r {
            60.0 * f64::from(g - b) / d
        } else if max == g {
            60.0 * f64::from(b - r) / d + 120.0
        } else {
            60.0 * f64::from(r - g) / d + 240.0
        };

        ((h.round() as i32).rem_euclid(360), s, max)
    }
}

impl From<u32> for Color {
    #[inline]
    fn from(value: u32) -> Self {
        Self::from_value(value)
    }
}

impl From<Color> for u32 {
    #[inline]
    fn from(c: Color) -> Self {
        c.value()
    }
}

#[inline]
fn channel(x: f64) -> u8 {
    (x * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn value_packs_red_in_low_byte() {
        assert_eq!(Color::rgba(0x11, 0x22, 0x33, 0x44).value(), 0x4433_2211);
    }

    #[test]
    fn value_round_trips() {
        for v in [0u32, 1, 0xFFFF_FFFF, 0x8000_0001, 0x1234_5678, 0xDEAD_BEEF] {
            assert_eq!(Color::from_value(v).value(), v);
        }
    }

    #[test]
    fn byte_layout_is_rgba() {
        let px = [Color::rgba(1, 2, 3, 4), Color::rgba(5, 6, 7, 8)];
        let bytes: &[u8] = bytemuck::cast_slice(&px);
        assert_eq!(bytes, &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn rgb_is_opaque() {
        assert_eq!(Color::rgb(9, 8, 7).a, 255);
    }

    // ── hsv ───────────────────────────────────────────────────────────────

    #[test]
    fn hsv_primaries() {
        assert_eq!(Color::hsv(0, 255, 255, 255), Color::rgb(255, 0, 0));
        assert_eq!(Color::hsv(120, 255, 255, 255), Color::rgb(0, 255, 0));
        assert_eq!(Color::hsv(240, 255, 255, 255), Color::rgb(0, 0, 255));
    }

    #[test]
    fn hsv_hue_wraps() {
        assert_eq!(Color::hsv(360, 255, 255, 255), Color::hsv(0, 255, 255, 255));
        assert_eq!(Color::hsv(-120, 255, 255, 255), Color::hsv(240, 255, 255, 255));
    }

    #[test]
    fn hsv_zero_saturation_is_grey() {
        assert_eq!(Color::hsv(200, 0, 77, 10), Color::rgba(77, 77, 77, 10));
    }

    #[test]
    fn hsv_round_trips_named_colors() {
        let colors = [
            Color::rgb(255, 0, 0),
            Color::rgb(0, 255, 0),
            Color::rgb(0, 0, 255),
            Color::rgb(255, 255, 0),
            Color::rgb(0, 255, 255),
            Color::rgb(255, 0, 255),
            Color::rgb(128, 128, 128),
            Color::black(),
            Color::white(),
            Color::rgba(255, 0, 0, 3),
        ];
        for c in colors {
            let (h, s, v) = c.to_hsv();
            assert_eq!(Color::hsv(h, s, v, c.a), c, "hsv round trip of {c:?}");
        }
    }

    #[test]
    fn to_hsv_of_orange() {
        let (h, s, v) = Color::rgb(255, 128, 0).to_hsv();
        assert_eq!((h, s, v), (30, 255, 255));
    }
}
