//! Error types of the engine.
//!
//! Geometry never fails: degenerate draws are skipped. Errors are reserved for
//! resource problems (decode, I/O, device) and contract violations by the caller
//! (stale textures, incomplete transforms).

use std::path::PathBuf;

use thiserror::Error;

pub use crate::device::DeviceError;

/// Failure of a draw through an [`Image`](crate::image::Image).
#[derive(Debug, Error)]
pub enum RenderError {
    /// The image's canvas was modified after its last `refresh`.
    #[error("image canvas was modified since the last refresh")]
    StaleTexture,

    #[error("transform is missing required field `{0}`")]
    MissingTransformField(&'static str),

    #[error("blend mode is unspecified and was not resolved against a default")]
    UnresolvedBlendMode,

    /// The shared device handle is already borrowed further up the stack.
    #[error("graphics device is already in use")]
    DeviceBusy,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("expected {expected} pixels, got {actual}")]
    PixelCount { expected: usize, actual: usize },

    #[error("canvas of {width}x{height} exceeds the addressable size")]
    TooLarge { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum TilesetError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tileset config is missing key `{0}`")]
    MissingKey(&'static str),
}
