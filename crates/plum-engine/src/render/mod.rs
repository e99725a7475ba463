//! Rendering context shared by every blit.
//!
//! Convention:
//! - target geometry is in pixels (top-left origin, +Y down)
//! - blend mode and opacity are explicit inputs, never global state

mod ctx;

pub use ctx::RenderCtx;
