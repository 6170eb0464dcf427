//! Asset loading for projected textures

pub mod texture_loader;

pub use texture_loader::{
    ImageTextureLoader, TextureLoadEvent, TextureLoader, TextureOptions, TextureRequest,
};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to load or decode asset
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
