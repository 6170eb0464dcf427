//! Asynchronous texture loading
//!
//! The host asset system is callback driven: a load is requested now and the
//! result arrives on some later tick. [`TextureLoader`] models that as a
//! request queue plus a drain of completed loads, which the frame loop polls.
//! Nothing here cancels a load; stale results are filtered by the receiver.

use std::path::{Path, PathBuf};

use crate::assets::AssetError;
use crate::render::texture::{ColorSpace, Texture};
use crate::scene::ObjectId;

/// Options passed along with a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureOptions {
    /// Encoding of the stored image data
    pub color_space: ColorSpace,
    /// Flip rows so the first row of the file ends up at v = 1
    pub flip_y: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Srgb,
            flip_y: false,
        }
    }
}

/// A request to load `source` on behalf of the spotlight `light`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    /// Spotlight whose binding asked for the texture
    pub light: ObjectId,
    /// Source identifier as given to the binding
    pub source: String,
    /// Decoding options
    pub options: TextureOptions,
}

/// A finished load, successful or not
#[derive(Debug)]
pub struct TextureLoadEvent {
    /// Spotlight whose binding asked for the texture
    pub light: ObjectId,
    /// Source identifier that was requested
    pub source: String,
    /// Decoded texture, still in its stored colour space
    pub result: Result<Texture, AssetError>,
}

/// Host texture loading service
pub trait TextureLoader {
    /// Start loading. Completion is reported by a later [`drain_completed`](Self::drain_completed).
    fn load(&mut self, request: TextureRequest);

    /// Take every load that finished since the previous call
    fn drain_completed(&mut self) -> Vec<TextureLoadEvent>;
}

/// Loader decoding image files with the `image` crate.
///
/// Requests are decoded when the next drain happens, so completions always
/// arrive on a tick after the request, like the host's callback loader.
/// The file read and decode run synchronously inside that drain, on the
/// caller's thread: a large image stalls the frame that drains it. Hosts
/// with a frame budget should supply their own [`TextureLoader`] backed by
/// their asset threads.
pub struct ImageTextureLoader {
    search_paths: Vec<PathBuf>,
    pending: Vec<TextureRequest>,
}

impl ImageTextureLoader {
    /// Create a loader resolving relative sources against `search_paths` in order
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
            pending: Vec::new(),
        }
    }

    /// Number of requests not yet decoded
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn resolve(&self, source: &str) -> Option<PathBuf> {
        let direct = Path::new(source);
        if direct.is_absolute() {
            return direct.exists().then(|| direct.to_path_buf());
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(source))
            .find(|candidate| candidate.exists())
    }

    fn decode(&self, request: &TextureRequest) -> Result<Texture, AssetError> {
        let path = self
            .resolve(&request.source)
            .ok_or_else(|| AssetError::NotFound(request.source.clone()))?;

        log::debug!("Decoding gobo texture from {:?}", path);
        let bytes = std::fs::read(&path)?;
        decode_image(&bytes, request.options).map(|texture| texture.with_name(request.source.clone()))
    }
}

impl TextureLoader for ImageTextureLoader {
    fn load(&mut self, request: TextureRequest) {
        log::debug!("Queued texture load '{}' for light {:?}", request.source, request.light);
        self.pending.push(request);
    }

    fn drain_completed(&mut self) -> Vec<TextureLoadEvent> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .map(|request| {
                let result = self.decode(&request);
                TextureLoadEvent {
                    light: request.light,
                    source: request.source,
                    result,
                }
            })
            .collect()
    }
}

/// Decode an encoded image (PNG) into an RGBA texture
pub fn decode_image(bytes: &[u8], options: TextureOptions) -> Result<Texture, AssetError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| AssetError::LoadFailed(format!("Failed to decode image: {}", e)))?;
    let image = if options.flip_y { image.flipv() } else { image };
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    log::info!("Decoded gobo texture {}x{}", width, height);

    Texture::from_rgba8(width, height, rgba.as_raw(), options.color_space)
        .ok_or_else(|| AssetError::LoadFailed(format!("Empty image {}x{}", width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn light_id() -> ObjectId {
        let mut ids: SlotMap<ObjectId, ()> = SlotMap::with_key();
        ids.insert(())
    }

    fn encode_png(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        image::RgbaImage::from_raw(width, height, pixels.to_vec())
            .unwrap()
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png_keeps_srgb_encoding() {
        let png = encode_png(2, 1, &[255, 0, 0, 255, 0, 0, 255, 255]);
        let texture = decode_image(&png, TextureOptions::default()).unwrap();
        assert_eq!(texture.width(), 2);
        assert_eq!(texture.height(), 1);
        assert_eq!(texture.color_space(), ColorSpace::Srgb);
        assert_eq!(texture.texel(0, 0).x, 1.0);
        assert_eq!(texture.texel(1, 0).z, 1.0);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_image(b"not an image", TextureOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::LoadFailed(_)));
    }

    #[test]
    fn test_completion_arrives_on_drain() {
        let dir = std::env::temp_dir().join(format!("gobo_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("dot.png"), encode_png(1, 1, &[10, 20, 30, 255])).unwrap();

        let mut loader = ImageTextureLoader::new([dir.clone()]);
        let light = light_id();
        loader.load(TextureRequest {
            light,
            source: "dot.png".to_string(),
            options: TextureOptions::default(),
        });
        loader.load(TextureRequest {
            light,
            source: "missing.png".to_string(),
            options: TextureOptions::default(),
        });
        assert_eq!(loader.pending(), 2);

        let events = loader.drain_completed();
        assert_eq!(events.len(), 2);
        assert!(events[0].result.is_ok());
        assert!(matches!(events[1].result, Err(AssetError::NotFound(_))));
        assert!(loader.drain_completed().is_empty());

        std::fs::remove_dir_all(dir).ok();
    }
}
