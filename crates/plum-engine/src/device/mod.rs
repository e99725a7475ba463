//! Graphics device seam.
//!
//! An [`Image`](crate::image::Image) mirrors its canvas into a texture owned by a
//! [`GraphicsDevice`] and draws through it with textured quads. Two backends:
//! - [`SoftwareDevice`]: CPU rasterizer onto a `Canvas` (reference and tests)
//! - [`WgpuDevice`]: hardware rendering on wgpu, bootstrapped by [`Gpu`]

mod error;
mod gpu;
mod init;
mod software;
mod traits;
mod wgpu_device;

pub use error::DeviceError;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use software::{DrawRecord, SoftwareDevice};
pub use traits::{GraphicsDevice, Quad, SharedDevice, TextureId};
pub use wgpu_device::WgpuDevice;
