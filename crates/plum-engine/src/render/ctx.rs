use crate::paint::{Blend, BlendMode};

/// Ambient inputs of a blit: the blend used for [`BlendMode::Unspecified`] and the
/// global opacity.
///
/// Passed explicitly to every drawing call; there is no process-wide state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RenderCtx {
    pub default_blend: Blend,
    pub opacity: u8,
}

impl Default for RenderCtx {
    fn default() -> Self {
        Self {
            default_blend: Blend::Preserve,
            opacity: 255,
        }
    }
}

impl RenderCtx {
    #[inline]
    pub fn new(default_blend: Blend, opacity: u8) -> Self {
        Self {
            default_blend,
            opacity,
        }
    }

    #[inline]
    pub fn with_opacity(self, opacity: u8) -> Self {
        Self { opacity, ..self }
    }

    #[inline]
    pub fn with_default_blend(self, default_blend: Blend) -> Self {
        Self {
            default_blend,
            ..self
        }
    }

    /// Resolves a requested mode against this context.
    #[inline]
    pub fn resolve(&self, mode: BlendMode) -> Blend {
        mode.resolve(self.default_blend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_preserve_at_full_opacity() {
        let ctx = RenderCtx::default();
        assert_eq!(ctx.default_blend, Blend::Preserve);
        assert_eq!(ctx.opacity, 255);
    }

    #[test]
    fn resolve_uses_default_only_for_unspecified() {
        let ctx = RenderCtx::default().with_default_blend(Blend::Add);
        assert_eq!(ctx.resolve(BlendMode::Unspecified), Blend::Add);
        assert_eq!(ctx.resolve(BlendMode::Opaque), Blend::Opaque);
    }
}
