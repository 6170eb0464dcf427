//! Textures for projected spotlights
//!
//! CPU-side texture storage and sampling. The host's GPU upload is out of
//! scope; what matters here is the colour-space handling of loaded images
//! and a sampler with the same clamp-to-edge bilinear behaviour the shader
//! relies on.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Vec2, Vec4};

new_key_type! {
    /// Handle for a texture owned by the [`TextureManager`]
    pub struct TextureHandle;
}

/// Encoding of texel values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    /// Gamma-encoded sRGB, as image files are authored
    Srgb,
    /// Linear light, as the lighting maths expects
    Linear,
}

/// RGBA texture with floating point texels, row-major, first row at v = 0
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Vec4>,
    color_space: ColorSpace,
    /// Source identifier or debug name
    pub name: Option<String>,
}

impl Texture {
    /// Build from 8-bit RGBA bytes (`width * height * 4` of them)
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8], color_space: ColorSpace) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || bytes.len() != expected {
            return None;
        }
        let texels = bytes
            .chunks_exact(4)
            .map(|px| {
                Vec4::new(
                    f32::from(px[0]) / 255.0,
                    f32::from(px[1]) / 255.0,
                    f32::from(px[2]) / 255.0,
                    f32::from(px[3]) / 255.0,
                )
            })
            .collect();
        Some(Self {
            width,
            height,
            texels,
            color_space,
            name: None,
        })
    }

    /// 1x1 texture of a single colour
    pub fn solid(color: Vec4, color_space: ColorSpace) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
            color_space,
            name: None,
        }
    }

    /// Attach a name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Width in texels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current texel encoding
    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Texel at integer coordinates, clamped to the edge
    pub fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        self.texels[y * self.width as usize + x]
    }

    /// Bilinear sample with clamp-to-edge addressing.
    ///
    /// Coordinates outside [0, 1] return the nearest edge texels.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0).lerp(&self.texel(x0 + 1, y0), tx);
        let bottom = self.texel(x0, y0 + 1).lerp(&self.texel(x0 + 1, y0 + 1), tx);
        top.lerp(&bottom, ty)
    }
}

/// sRGB transfer function decode for one channel
pub fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.040_45 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

/// Colour-correction step applied to loaded textures.
///
/// Gamma-encoded textures are converted to linear light; alpha is left as is.
/// Linear textures pass through untouched.
pub fn color_correct(mut texture: Texture) -> Texture {
    if texture.color_space == ColorSpace::Srgb {
        for texel in &mut texture.texels {
            texel.x = srgb_to_linear(texel.x);
            texel.y = srgb_to_linear(texel.y);
            texel.z = srgb_to_linear(texel.z);
        }
        texture.color_space = ColorSpace::Linear;
    }
    texture
}

/// Owner of all textures bound to spotlights
///
/// Keeps a placeholder texture alive for the whole lifetime of the manager
/// so sampler arrays can always be fully populated.
pub struct TextureManager {
    textures: SlotMap<TextureHandle, Texture>,
    placeholder: TextureHandle,
}

impl TextureManager {
    /// Create a manager whose placeholder is a 1x1 texture of `color`
    pub fn new(placeholder_color: [u8; 4]) -> Self {
        let mut textures = SlotMap::with_key();
        let placeholder = Texture::from_rgba8(1, 1, &placeholder_color, ColorSpace::Srgb)
            .map(color_correct)
            .unwrap_or_else(|| Texture::solid(Vec4::new(1.0, 1.0, 1.0, 1.0), ColorSpace::Linear))
            .with_name("placeholder");
        let placeholder = textures.insert(placeholder);
        Self { textures, placeholder }
    }

    /// Store a texture
    pub fn insert(&mut self, texture: Texture) -> TextureHandle {
        let handle = self.textures.insert(texture);
        log::debug!("Stored texture {:?} ({} live)", handle, self.textures.len());
        handle
    }

    /// Release a texture. The placeholder cannot be released.
    pub fn remove(&mut self, handle: TextureHandle) -> Option<Texture> {
        if handle == self.placeholder {
            return None;
        }
        self.textures.remove(handle)
    }

    /// Texture by handle
    pub fn get(&self, handle: TextureHandle) -> Option<&Texture> {
        self.textures.get(handle)
    }

    /// Texture by handle, or the placeholder if the handle is stale
    pub fn get_or_placeholder(&self, handle: TextureHandle) -> &Texture {
        self.textures
            .get(handle)
            .unwrap_or_else(|| &self.textures[self.placeholder])
    }

    /// Handle of the placeholder texture
    pub fn placeholder(&self) -> TextureHandle {
        self.placeholder
    }

    /// Number of live textures, placeholder included
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Always false: the placeholder is always present
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

impl Default for TextureManager {
    fn default() -> Self {
        Self::new([255, 255, 255, 255])
    }
}
