use std::path::{Path, PathBuf};

use crate::coords::SourceRegion;
use crate::device::SharedDevice;
use crate::error::{RenderError, TilesetError};
use crate::image::Image;
use crate::paint::{BlendMode, Color};
use crate::render::RenderCtx;
use crate::sprite::Sprite;

use super::Config;

pub const DEFAULT_TILE_SIZE: u32 = 16;

/// A tile sheet, its obstruction sheet and their configuration.
///
/// Both sheets share the tile grid: tile `i` of the obstruction image describes
/// tile `i` of the tile image. Replacing a sheet drops the previous [`Image`],
/// which destroys its texture; the borrow checker rules out replacement while a
/// [`Sprite`] or a draw still refers to it.
#[derive(Debug)]
pub struct Tileset {
    tiles: Image,
    obs: Image,
    config: Config,
    tile_width: u32,
    tile_height: u32,
    external_tiles: Option<PathBuf>,
    external_obs: Option<PathBuf>,
}

impl Tileset {
    /// Tile size comes from the `tile_width` / `tile_height` config keys.
    pub fn new(tiles: Image, obs: Image, config: Config) -> Self {
        let tile_width = config.get("tile_width", DEFAULT_TILE_SIZE);
        let tile_height = config.get("tile_height", DEFAULT_TILE_SIZE);
        Self {
            tiles,
            obs,
            config,
            tile_width,
            tile_height,
            external_tiles: None,
            external_obs: None,
        }
    }

    /// Loads a tileset config; `tiles` and `obs` name image files relative to it.
    pub fn load(device: &SharedDevice, config_path: impl AsRef<Path>) -> Result<Self, TilesetError> {
        let config_path = config_path.as_ref();
        let config = Config::load(config_path)?;
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));

        let tiles_key = config.get_str("tiles").ok_or(TilesetError::MissingKey("tiles"))?;
        let obs_key = config.get_str("obs").ok_or(TilesetError::MissingKey("obs"))?;
        let tiles_path = absolute(&base.join(tiles_key))?;
        let obs_path = absolute(&base.join(obs_key))?;

        let tiles = Image::load(device, &tiles_path)?;
        let obs = Image::load(device, &obs_path)?;

        let mut tileset = Self::new(tiles, obs, config);
        tileset.external_tiles = Some(tiles_path);
        tileset.external_obs = Some(obs_path);
        log::debug!(
            "tileset {} loaded ({}x{} tiles)",
            config_path.display(),
            tileset.tile_width,
            tileset.tile_height
        );
        Ok(tileset)
    }

    #[inline]
    pub fn tiles(&self) -> &Image {
        &self.tiles
    }

    /// Mutable sheet access, e.g. to edit the canvas and `refresh`.
    #[inline]
    pub fn tiles_mut(&mut self) -> &mut Image {
        &mut self.tiles
    }

    #[inline]
    pub fn obs(&self) -> &Image {
        &self.obs
    }

    #[inline]
    pub fn obs_mut(&mut self) -> &mut Image {
        &mut self.obs
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    #[inline]
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    #[inline]
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// File the tile sheet was loaded from, if it was.
    #[inline]
    pub fn external_tiles(&self) -> Option<&Path> {
        self.external_tiles.as_deref()
    }

    #[inline]
    pub fn external_obs(&self) -> Option<&Path> {
        self.external_obs.as_deref()
    }

    // ── replacement ───────────────────────────────────────────────────────

    /// The new image is loaded before the old one is dropped, so a failed load
    /// leaves the tileset unchanged.
    ///
    /// The path is recorded in absolute form.
    pub fn replace_tiles_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), TilesetError> {
        let path = absolute(path.as_ref())?;
        self.tiles = Image::load(self.tiles.device(), &path)?;
        self.external_tiles = Some(path);
        Ok(())
    }

    /// Copies `source`'s pixels into a new tile sheet.
    pub fn replace_tiles_from_image(&mut self, source: &Image) -> Result<(), TilesetError> {
        self.tiles = Image::new(self.tiles.device(), source.canvas())?;
        self.external_tiles = None;
        Ok(())
    }

    pub fn replace_obs_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), TilesetError> {
        let path = absolute(path.as_ref())?;
        self.obs = Image::load(self.obs.device(), &path)?;
        self.external_obs = Some(path);
        Ok(())
    }

    pub fn replace_obs_from_image(&mut self, source: &Image) -> Result<(), TilesetError> {
        self.obs = Image::new(self.obs.device(), source.canvas())?;
        self.external_obs = None;
        Ok(())
    }

    // ── tiles ─────────────────────────────────────────────────────────────

    /// Frame view of the tile sheet.
    pub fn tile_sprite(&self) -> Sprite<'_> {
        Sprite::new(&self.tiles, self.tile_width, self.tile_height)
    }

    pub fn tile_rect(&self, index: u32) -> Option<SourceRegion> {
        self.tile_sprite().frame_rect(index)
    }

    /// Obstruction pixel `(x, y)` of tile `index`.
    pub fn obstruction_pixel(&self, index: u32, x: i32, y: i32) -> Color {
        Sprite::new(&self.obs, self.tile_width, self.tile_height).get_frame_pixel(index, x, y)
    }

    pub fn blit_tile(
        &self,
        ctx: &RenderCtx,
        index: u32,
        x: f64,
        y: f64,
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        self.tile_sprite()
            .blit_frame(ctx, x, y, index, mode, Color::white())
    }

    /// Draws a row-major grid of tiles, `columns` per row, top-left at `(x, y)`.
    ///
    /// Binds once and issues raw blits; `None` cells are left empty.
    pub fn blit_tiles(
        &self,
        ctx: &RenderCtx,
        x: f64,
        y: f64,
        columns: usize,
        indices: &[Option<u32>],
        mode: BlendMode,
    ) -> Result<(), RenderError> {
        let sprite = self.tile_sprite();
        sprite.bind(ctx, mode)?;

        let columns = columns.max(1);
        let (tw, th) = (f64::from(self.tile_width), f64::from(self.tile_height));
        for (i, cell) in indices.iter().enumerate() {
            let Some(index) = *cell else { continue };
            let cx = x + (i % columns) as f64 * tw;
            let cy = y + (i / columns) as f64 * th;
            sprite.raw_blit_frame(cx, cy, index, 0.0, 1.0)?;
        }
        Ok(())
    }

    // ── persistence ───────────────────────────────────────────────────────

    /// Writes the config to `config_path`. Sheets without an external file are
    /// saved as PNG beside it; image paths are stored relative to the config.
    pub fn save(&self, config_path: impl AsRef<Path>) -> Result<(), TilesetError> {
        let config_path = config_path.as_ref();
        let dir = config_path.parent().unwrap_or_else(|| Path::new(""));
        let stem = config_path
            .file_stem()
            .map_or_else(|| "tileset".into(), |s| s.to_string_lossy());

        let mut config = self.config.clone();
        let tiles_ref = sheet_reference(
            &self.tiles,
            self.external_tiles.as_deref(),
            dir,
            &format!("{stem}.tiles.png"),
        )?;
        let obs_ref = sheet_reference(
            &self.obs,
            self.external_obs.as_deref(),
            dir,
            &format!("{stem}.obs.png"),
        )?;
        config.set("tiles", tiles_ref.display());
        config.set("obs", obs_ref.display());
        config.set("tile_width", self.tile_width);
        config.set("tile_height", self.tile_height);
        config.save(config_path)?;

        log::debug!("tileset saved to {}", config_path.display());
        Ok(())
    }
}

/// Path to store for a sheet: its external file (relative to `dir` when it lies
/// below it, absolute otherwise), or a freshly written PNG.
fn sheet_reference(
    image: &Image,
    external: Option<&Path>,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, TilesetError> {
    match external {
        Some(path) => {
            let path = absolute(path)?;
            let dir = absolute(dir)?;
            Ok(path
                .strip_prefix(&dir)
                .map_or_else(|_| path.clone(), Path::to_path_buf))
        }
        None => {
            image.canvas().save(dir.join(file_name))?;
            Ok(PathBuf::from(file_name))
        }
    }
}

/// Lexically absolute form of `path`; an empty path is the working directory.
fn absolute(path: &Path) -> Result<PathBuf, TilesetError> {
    let resolved = if path.as_os_str().is_empty() {
        std::env::current_dir()
    } else {
        std::path::absolute(path)
    };
    resolved.map_err(|source| TilesetError::Io {
        path: path.to_path_buf(),
        source,
    })
}
