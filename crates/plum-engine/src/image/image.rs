use std::cell::RefMut;
use std::path::Path;

use crate::canvas::Canvas;
use crate::device::{GraphicsDevice, SharedDevice, TextureId};
use crate::error::RenderError;
use crate::paint::{Blend, Color};

/// A canvas mirrored into a device texture.
///
/// Invariants:
/// - the texture has the canvas's true (padded) dimensions for the image's lifetime
/// - `generation == uploaded` iff the texture matches the canvas
///
/// Not `Clone`: build a second image from [`Image::canvas`] instead. Dropping the
/// image destroys its texture.
pub struct Image {
    device: SharedDevice,
    canvas: Canvas,
    texture: TextureId,
    generation: u64,
    uploaded: u64,
}

impl Image {
    /// Copies `source` into a fresh padded canvas and creates its texture.
    ///
    /// The copy has exactly the source's occupied size.
    pub fn new(device: &SharedDevice, source: &Canvas) -> Result<Self, RenderError> {
        let mut canvas = Canvas::try_new(source.width(), source.height())?;
        canvas.clear(Color::transparent());
        source.blit(0, 0, &mut canvas, Blend::Opaque, 255);

        let texture = device
            .try_borrow_mut()
            .map_err(|_| RenderError::DeviceBusy)?
            .create_texture(canvas.true_width(), canvas.true_height(), canvas.pixels())?;

        Ok(Self {
            device: device.clone(),
            canvas,
            texture,
            generation: 0,
            uploaded: 0,
        })
    }

    /// Decodes an image file and uploads it.
    pub fn load(device: &SharedDevice, path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let canvas = Canvas::load(path)?;
        Self::new(device, &canvas)
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Mutable canvas access. The image is stale until the next [`refresh`](Self::refresh).
    #[inline]
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        self.generation += 1;
        &mut self.canvas
    }

    #[inline]
    pub fn is_stale(&self) -> bool {
        self.generation != self.uploaded
    }

    /// Uploads the whole padded buffer to the texture.
    pub fn refresh(&mut self) -> Result<(), RenderError> {
        self.device_mut()?
            .upload_texture(self.texture, self.canvas.pixels())?;
        self.uploaded = self.generation;
        log::trace!("texture {} refreshed", self.texture);
        Ok(())
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    #[inline]
    pub fn device(&self) -> &SharedDevice {
        &self.device
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    #[inline]
    pub fn true_width(&self) -> u32 {
        self.canvas.true_width()
    }

    #[inline]
    pub fn true_height(&self) -> u32 {
        self.canvas.true_height()
    }

    pub(super) fn device_mut(&self) -> Result<RefMut<'_, dyn GraphicsDevice + 'static>, RenderError> {
        self.device
            .try_borrow_mut()
            .map_err(|_| RenderError::DeviceBusy)
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("texture", &self.texture)
            .field("stale", &self.is_stale())
            .finish()
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        match self.device.try_borrow_mut() {
            Ok(mut device) => device.destroy_texture(self.texture),
            Err(_) => log::warn!("device busy, texture {} leaked", self.texture),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::device::SoftwareDevice;

    use super::*;

    fn device() -> (Rc<RefCell<SoftwareDevice>>, SharedDevice) {
        let dev = Rc::new(RefCell::new(SoftwareDevice::new(8, 8)));
        let shared: SharedDevice = dev.clone();
        (dev, shared)
    }

    fn gradient(w: u32, h: u32) -> Canvas {
        let px: Vec<Color> = (0..w * h)
            .map(|i| Color::rgb((i * 10) as u8, 255 - i as u8, 7))
            .collect();
        Canvas::from_pixels(w, h, &px).unwrap()
    }

    // ── texture mirror ────────────────────────────────────────────────────

    #[test]
    fn texture_mirrors_source_with_transparent_padding() {
        let (dev, shared) = device();
        let src = gradient(3, 5);
        let img = Image::new(&shared, &src).unwrap();
        assert_eq!((img.true_width(), img.true_height()), (4, 8));

        let dev = dev.borrow();
        assert_eq!(dev.texture_size(img.texture()), Some((4, 8)));
        let tex = dev.texture_pixels(img.texture()).unwrap();
        for y in 0..8 {
            for x in 0..4 {
                let expected = if x < 3 && y < 5 {
                    src.get_pixel(x, y)
                } else {
                    Color::transparent()
                };
                assert_eq!(tex[(y * 4 + x) as usize], expected, "texel ({x}, {y})");
            }
        }
    }

    #[test]
    fn refresh_uploads_canvas_edits() {
        let (dev, shared) = device();
        let mut img = Image::new(&shared, &gradient(2, 2)).unwrap();
        assert!(!img.is_stale());

        img.canvas_mut().set_pixel(1, 1, Color::rgba(1, 2, 3, 4));
        assert!(img.is_stale());
        img.refresh().unwrap();
        assert!(!img.is_stale());

        let dev = dev.borrow();
        let tex = dev.texture_pixels(img.texture()).unwrap();
        assert_eq!(tex[3], Color::rgba(1, 2, 3, 4));
        assert_eq!(tex, img.canvas().pixels());
    }

    #[test]
    fn copies_source_not_its_padding() {
        let (_dev, shared) = device();
        let mut src = Canvas::new(3, 3);
        src.clear(Color::white());
        let img = Image::new(&shared, &src).unwrap();
        assert_eq!(img.canvas().pixels()[3], Color::transparent());
        assert_eq!(img.canvas().get_pixel(2, 2), Color::white());
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn drop_destroys_texture() {
        let (dev, shared) = device();
        let a = Image::new(&shared, &gradient(2, 2)).unwrap();
        let b = Image::new(&shared, &gradient(1, 1)).unwrap();
        assert_eq!(dev.borrow().live_textures(), 2);
        drop(a);
        assert_eq!(dev.borrow().live_textures(), 1);
        drop(b);
        assert_eq!(dev.borrow().live_textures(), 0);
    }

    #[test]
    fn busy_device_is_an_error() {
        let (dev, shared) = device();
        let mut img = Image::new(&shared, &gradient(2, 2)).unwrap();
        let guard = dev.borrow_mut();
        assert!(matches!(img.refresh(), Err(RenderError::DeviceBusy)));
        assert!(matches!(
            Image::new(&shared, &gradient(1, 1)),
            Err(RenderError::DeviceBusy)
        ));
        drop(guard);
        img.refresh().unwrap();
    }

    #[test]
    fn empty_image_is_valid() {
        let (dev, shared) = device();
        let img = Image::new(&shared, &Canvas::new(0, 0)).unwrap();
        assert_eq!((img.width(), img.height()), (0, 0));
        assert_eq!(dev.borrow().live_textures(), 1);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.png");
        gradient(3, 2).save(&path).unwrap();

        let (_dev, shared) = device();
        let img = Image::load(&shared, &path).unwrap();
        assert_eq!(img.canvas().occupied_pixels(), gradient(3, 2).occupied_pixels());
    }

    #[test]
    fn load_missing_file_fails() {
        let (_dev, shared) = device();
        assert!(matches!(
            Image::load(&shared, "/nonexistent/plum.png"),
            Err(RenderError::Canvas(_))
        ));
    }
}
