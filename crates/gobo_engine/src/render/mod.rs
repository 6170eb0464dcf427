//! Rendering-side models and the projected-texture lighting system

pub mod light_uniforms;
pub mod program;
pub mod shader_patch;
pub mod systems;
pub mod texture;

pub use light_uniforms::LightUniforms;
pub use program::{ProgramKey, ProgramStore, ShaderProgram};
pub use shader_patch::{patched_library, ShaderLibrary, ShaderPatchError};
pub use texture::{Texture, TextureHandle, TextureManager};
