use std::path::Path;

use crate::error::CanvasError;
use crate::paint::Color;

use super::{Canvas, MAX_DIMENSION};

impl Canvas {
    /// Reads and decodes an image file into a canvas.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CanvasError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CanvasError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let canvas = Self::decode(&bytes)?;
        log::debug!(
            "loaded {} ({}x{})",
            path.display(),
            canvas.width(),
            canvas.height()
        );
        Ok(canvas)
    }

    /// Decodes any format supported by the `image` crate, converting to RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, CanvasError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CanvasError::TooLarge { width, height });
        }
        let pixels: &[Color] = bytemuck::cast_slice(rgba.as_raw());
        Self::from_pixels(width, height, pixels)
    }

    /// Encodes the occupied area. The format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CanvasError> {
        let path = path.as_ref();
        let pixels = self.occupied_pixels();
        let actual = pixels.len();
        let raw: Vec<u8> = bytemuck::cast_slice(&pixels).to_vec();
        let img = image::RgbaImage::from_raw(self.width(), self.height(), raw).ok_or(
            CanvasError::PixelCount {
                expected: self.width() as usize * self.height() as usize,
                actual,
            },
        )?;
        img.save(path)?;
        log::debug!("saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_preserves_occupied_pixels() {
        let px = [
            Color::rgb(255, 0, 0),
            Color::rgba(0, 255, 0, 128),
            Color::rgb(0, 0, 255),
            Color::transparent(),
            Color::white(),
            Color::rgba(1, 2, 3, 4),
        ];
        let canvas = Canvas::from_pixels(3, 2, &px).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.png");
        canvas.save(&path).unwrap();

        let loaded = Canvas::load(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
        assert_eq!((loaded.true_width(), loaded.true_height()), (4, 2));
        assert_eq!(loaded.occupied_pixels(), px.to_vec());
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Canvas::decode(b"not an image").unwrap_err();
        assert!(matches!(err, CanvasError::Decode(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let err = Canvas::load(&missing).unwrap_err();
        assert!(matches!(&err, CanvasError::Io { path, .. } if *path == missing));
        assert!(err.to_string().contains("missing.png"));
    }
}
