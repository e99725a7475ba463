//! Tile and obstruction image pairs with their key/value configuration.

mod config;
#[allow(clippy::module_inception)]
mod tileset;

pub use config::Config;
pub use tileset::{Tileset, DEFAULT_TILE_SIZE};
