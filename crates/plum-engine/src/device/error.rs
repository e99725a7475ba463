use thiserror::Error;

use super::TextureId;

/// Failure reported by a [`GraphicsDevice`](super::GraphicsDevice).
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("unknown texture {0}")]
    UnknownTexture(TextureId),

    #[error("texture data has {actual} pixels, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("draw issued with no texture bound")]
    NoBoundTexture,

    #[error("graphics backend: {0}")]
    Backend(String),
}
