use crate::error::RenderError;

use super::Color;

/// Blend mode as requested by a caller.
///
/// `Unspecified` means "use the caller's default"; it is resolved against a
/// [`RenderCtx`](crate::render::RenderCtx) at the call boundary and never reaches
/// [`compose`] or a device.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendMode {
    /// Replace the destination, alpha ignored.
    Opaque,
    /// Straight-alpha compositing.
    Merge,
    /// Straight-alpha compositing with the global opacity applied to the source.
    Preserve,
    /// Additive, weighted by source alpha.
    Add,
    /// Subtractive, weighted by source alpha.
    Subtract,
    #[default]
    Unspecified,
}

impl BlendMode {
    /// Alias of [`BlendMode::Merge`].
    pub const ALPHA: BlendMode = BlendMode::Merge;

    /// Resolves `Unspecified` to `default`.
    #[inline]
    pub fn resolve(self, default: Blend) -> Blend {
        Blend::try_from(self).unwrap_or(default)
    }
}

/// A concrete blend function. This is the only form accepted by [`compose`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Blend {
    Opaque,
    Merge,
    #[default]
    Preserve,
    Add,
    Subtract,
}

impl Blend {
    pub const ALL: [Blend; 5] = [
        Blend::Opaque,
        Blend::Merge,
        Blend::Preserve,
        Blend::Add,
        Blend::Subtract,
    ];
}

impl TryFrom<BlendMode> for Blend {
    type Error = RenderError;

    fn try_from(mode: BlendMode) -> Result<Self, Self::Error> {
        match mode {
            BlendMode::Opaque => Ok(Blend::Opaque),
            BlendMode::Merge => Ok(Blend::Merge),
            BlendMode::Preserve => Ok(Blend::Preserve),
            BlendMode::Add => Ok(Blend::Add),
            BlendMode::Subtract => Ok(Blend::Subtract),
            BlendMode::Unspecified => Err(RenderError::UnresolvedBlendMode),
        }
    }
}

impl From<Blend> for BlendMode {
    fn from(blend: Blend) -> Self {
        match blend {
            Blend::Opaque => BlendMode::Opaque,
            Blend::Merge => BlendMode::Merge,
            Blend::Preserve => BlendMode::Preserve,
            Blend::Add => BlendMode::Add,
            Blend::Subtract => BlendMode::Subtract,
        }
    }
}

/// `a * b / 255`, rounded to nearest (ties down).
///
/// Every `/255` scaling in the engine goes through this function; golden images
/// depend on it.
#[inline]
pub const fn mul_div255(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}

/// Composes `src` over `dst`.
///
/// `opacity` only affects [`Blend::Preserve`].
pub fn compose(src: Color, dst: Color, blend: Blend, opacity: u8) -> Color {
    match blend {
        Blend::Opaque => src,
        Blend::Merge => merge(src, dst, src.a),
        Blend::Preserve => merge(src, dst, mul_div255(src.a, opacity)),
        Blend::Add => {
            let add = |s: u8, d: u8| d.saturating_add(mul_div255(s, src.a));
            Color::rgba(add(src.r, dst.r), add(src.g, dst.g), add(src.b, dst.b), dst.a)
        }
        Blend::Subtract => {
            let sub = |s: u8, d: u8| d.saturating_sub(mul_div255(s, src.a));
            Color::rgba(sub(src.r, dst.r), sub(src.g, dst.g), sub(src.b, dst.b), dst.a)
        }
    }
}

#[inline]
fn merge(src: Color, dst: Color, alpha: u8) -> Color {
    let inv = 255 - alpha;
    let mix = |s: u8, d: u8| mul_div255(s, alpha).saturating_add(mul_div255(d, inv));
    Color::rgba(
        mix(src.r, dst.r),
        mix(src.g, dst.g),
        mix(src.b, dst.b),
        alpha.saturating_add(mul_div255(dst.a, inv)),
    )
}
