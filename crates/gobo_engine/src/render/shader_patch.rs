//! Shader source patching
//!
//! The host pipeline's lighting routine has a fixed signature and a fixed
//! call site, so projected textures are added by substituting text in a
//! versioned copy of the host's shader chunks. The substitutions are
//! declarative ([`ShaderPatch`]) and applied once at startup. Every marker
//! must occur exactly once in its chunk; if the host chunks ever change
//! shape, [`ShaderLibrary::apply`] fails instead of producing a program that
//! silently disagrees with itself.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Host pipeline revision the bundled chunks were copied from
pub const HOST_CHUNK_REVISION: &str = "r150";

/// Shader chunks the extension touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderChunk {
    /// Light structs, uniform arrays and per-light evaluation routines
    LightsParsBegin,
    /// Physically based fragment light loop
    LightsFragmentBegin,
    /// Lambert per-vertex light loop
    LightsLambertVertex,
}

impl ShaderChunk {
    /// Every chunk, in include order
    pub const ALL: [ShaderChunk; 3] = [
        ShaderChunk::LightsParsBegin,
        ShaderChunk::LightsFragmentBegin,
        ShaderChunk::LightsLambertVertex,
    ];

    /// Chunk name as used by the host's `#include <...>` directives
    pub fn name(self) -> &'static str {
        match self {
            ShaderChunk::LightsParsBegin => "lights_pars_begin",
            ShaderChunk::LightsFragmentBegin => "lights_fragment_begin",
            ShaderChunk::LightsLambertVertex => "lights_lambert_vertex",
        }
    }

    fn host_source(self) -> &'static str {
        match self {
            ShaderChunk::LightsParsBegin => include_str!("chunks/host/lights_pars_begin.glsl"),
            ShaderChunk::LightsFragmentBegin => include_str!("chunks/host/lights_fragment_begin.glsl"),
            ShaderChunk::LightsLambertVertex => include_str!("chunks/host/lights_lambert_vertex.glsl"),
        }
    }
}

impl fmt::Display for ShaderChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shader patching and preprocessing errors
#[derive(Error, Debug)]
pub enum ShaderPatchError {
    /// A marker was not found in its chunk
    #[error("Marker not found in {chunk}: {marker:?}")]
    MarkerNotFound {
        /// Chunk searched
        chunk: ShaderChunk,
        /// Expected text
        marker: String,
    },

    /// A marker occurs more than once, so the substitution site is unclear
    #[error("Marker occurs {count} times in {chunk}: {marker:?}")]
    MarkerAmbiguous {
        /// Chunk searched
        chunk: ShaderChunk,
        /// Expected text
        marker: String,
        /// Number of occurrences
        count: usize,
    },

    /// The library has no source for a chunk
    #[error("Unknown shader chunk: {0}")]
    UnknownChunk(ShaderChunk),

    /// An unrolled loop header could not be parsed
    #[error("Cannot unroll loop: {0}")]
    Unroll(String),
}

/// What to do at a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    /// Replace the marker with the text
    Replace,
    /// Keep the marker and insert the text right after it
    InsertAfter,
}

/// One substitution against one chunk
#[derive(Debug, Clone)]
pub struct ShaderPatch {
    /// Chunk to edit
    pub chunk: ShaderChunk,
    /// Text that must occur exactly once
    pub marker: &'static str,
    /// Substitution mode
    pub action: PatchAction,
    /// Text to substitute or insert
    pub text: &'static str,
}

/// Set of shader chunk sources
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    chunks: HashMap<ShaderChunk, String>,
}

impl ShaderLibrary {
    /// The unmodified chunks bundled from the host pipeline
    pub fn host() -> Self {
        Self {
            chunks: ShaderChunk::ALL
                .iter()
                .map(|&chunk| (chunk, chunk.host_source().to_string()))
                .collect(),
        }
    }

    /// Library from explicit chunk sources
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (ShaderChunk, S)>,
        S: Into<String>,
    {
        Self {
            chunks: sources.into_iter().map(|(chunk, src)| (chunk, src.into())).collect(),
        }
    }

    /// Source of a chunk
    pub fn chunk(&self, chunk: ShaderChunk) -> Result<&str, ShaderPatchError> {
        self.chunks
            .get(&chunk)
            .map(String::as_str)
            .ok_or(ShaderPatchError::UnknownChunk(chunk))
    }

    /// Apply every patch, or none of them.
    ///
    /// Patches run in order against the progressively edited text, on a
    /// scratch copy that only replaces `self` once all of them succeeded.
    pub fn apply(&mut self, patches: &[ShaderPatch]) -> Result<(), ShaderPatchError> {
        let mut scratch = self.chunks.clone();
        for patch in patches {
            let source = scratch
                .get_mut(&patch.chunk)
                .ok_or(ShaderPatchError::UnknownChunk(patch.chunk))?;
            *source = apply_one(source, patch)?;
        }
        self.chunks = scratch;
        log::debug!("Applied {} shader patches", patches.len());
        Ok(())
    }
}

fn apply_one(source: &str, patch: &ShaderPatch) -> Result<String, ShaderPatchError> {
    let count = source.matches(patch.marker).count();
    let at = match count {
        0 => {
            return Err(ShaderPatchError::MarkerNotFound {
                chunk: patch.chunk,
                marker: patch.marker.to_string(),
            })
        }
        1 => source.find(patch.marker).unwrap_or_default(),
        _ => {
            return Err(ShaderPatchError::MarkerAmbiguous {
                chunk: patch.chunk,
                marker: patch.marker.to_string(),
                count,
            })
        }
    };

    let end = at + patch.marker.len();
    let mut out = String::with_capacity(source.len() + patch.text.len());
    out.push_str(&source[..at]);
    match patch.action {
        PatchAction::Replace => out.push_str(patch.text),
        PatchAction::InsertAfter => {
            out.push_str(patch.marker);
            out.push_str(patch.text);
        }
    }
    out.push_str(&source[end..]);
    Ok(out)
}

/// Substitutions that add projected textures to the spotlight routine.
///
/// The extended declaration and its call site are edited together; the
/// Lambert path's spotlight loop body is removed entirely.
pub fn gobo_patches() -> Vec<ShaderPatch> {
    vec![
        ShaderPatch {
            chunk: ShaderChunk::LightsParsBegin,
            marker: "uniform SpotLight spotLights[ NUM_SPOT_LIGHTS ];",
            action: PatchAction::InsertAfter,
            text: include_str!("chunks/gobo/spot_light_gobo_pars.glsl"),
        },
        ShaderPatch {
            chunk: ShaderChunk::LightsParsBegin,
            marker: "void getSpotLightInfo( const in SpotLight spotLight, const in GeometricContext geometry, out IncidentLight light ) {",
            action: PatchAction::Replace,
            text: "void getSpotLightInfo( const in SpotLight spotLight, const in GeometricContext geometry, out IncidentLight light, const in SpotLightGobo gobo, const in sampler2D goboMap ) {",
        },
        ShaderPatch {
            chunk: ShaderChunk::LightsParsBegin,
            marker: "light.color = spotLight.color * spotAttenuation;",
            action: PatchAction::Replace,
            text: "light.color = getSpotLightGoboColor( spotLight, gobo, goboMap, light.direction ) * spotAttenuation;",
        },
        ShaderPatch {
            chunk: ShaderChunk::LightsFragmentBegin,
            marker: "getSpotLightInfo( spotLight, geometry, directLight );",
            action: PatchAction::Replace,
            text: "getSpotLightInfo( spotLight, geometry, directLight, spotLightGobos[ i ], spotLightMaps[ i ] );",
        },
        ShaderPatch {
            chunk: ShaderChunk::LightsLambertVertex,
            marker: "getSpotLightInfo( spotLights[ i ], geometry, directLight );\n\t\tdotNL = dot( geometry.normal, directLight.direction );\n\t\tdirectLightColor_Diffuse = directLight.color;\n\t\tvLightFront += saturate( dotNL ) * directLightColor_Diffuse;",
            action: PatchAction::Replace,
            text: "// spotlights only light per-fragment shading",
        },
    ]
}

/// Host chunks with [`gobo_patches`] applied
pub fn patched_library() -> Result<ShaderLibrary, ShaderPatchError> {
    let mut library = ShaderLibrary::host();
    library.apply(&gobo_patches())?;
    log::info!("Patched spotlight shading chunks (host revision {})", HOST_CHUNK_REVISION);
    Ok(library)
}
