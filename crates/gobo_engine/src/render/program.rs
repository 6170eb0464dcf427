//! Shader programs as seen by the lighting extension
//!
//! A program here is the host's compiled shading program reduced to what
//! the extension interacts with: its light-count defines, its preprocessed
//! sources and its uniform table. "Compiling" runs the host preprocessor
//! steps that matter for the light loop: light counts are substituted and
//! `#pragma unroll_loop_start` regions are expanded with literal indices.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::render::shader_patch::{ShaderChunk, ShaderLibrary, ShaderPatchError};
use crate::render::systems::lighting::AuxLightData;
use crate::render::texture::TextureHandle;

new_key_type! {
    /// Handle of a compiled program
    pub struct ProgramKey;
}

/// Programs owned by the host, keyed by [`ProgramKey`]
pub type ProgramStore = SlotMap<ProgramKey, ShaderProgram>;

/// Uniform name of the per-slot gobo struct array
pub const SPOT_LIGHT_GOBOS: &str = "spotLightGobos";

/// Uniform name of the per-slot sampler array
pub const SPOT_LIGHT_MAPS: &str = "spotLightMaps";

/// Light counts baked into a program as preprocessor constants
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightDefines {
    /// `NUM_DIR_LIGHTS`
    pub num_dir_lights: usize,
    /// `NUM_POINT_LIGHTS`
    pub num_point_lights: usize,
    /// `NUM_SPOT_LIGHTS`
    pub num_spot_lights: usize,
}

/// Value stored in a program's uniform table
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Per-slot gobo data
    GoboArray(Vec<AuxLightData>),
    /// Per-slot textures
    TextureArray(Vec<TextureHandle>),
}

/// Compiled program
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    defines: LightDefines,
    fragment_lights: String,
    vertex_lights: String,
    uniforms: HashMap<String, UniformValue>,
}

impl ShaderProgram {
    /// Preprocess the lighting chunks of `library` for the given light counts
    pub fn compile(library: &ShaderLibrary, defines: LightDefines) -> Result<Self, ShaderPatchError> {
        let pars = library.chunk(ShaderChunk::LightsParsBegin)?;
        let fragment = format!("{}\n{}", pars, library.chunk(ShaderChunk::LightsFragmentBegin)?);
        let vertex = format!("{}\n{}", pars, library.chunk(ShaderChunk::LightsLambertVertex)?);

        let program = Self {
            defines,
            fragment_lights: unroll_loops(&replace_light_nums(&fragment, &defines))?,
            vertex_lights: unroll_loops(&replace_light_nums(&vertex, &defines))?,
            uniforms: HashMap::new(),
        };
        log::debug!("Compiled lighting program with {:?}", defines);
        Ok(program)
    }

    /// Light counts this program was built for
    pub fn defines(&self) -> LightDefines {
        self.defines
    }

    /// Preprocessed fragment lighting source
    pub fn fragment_source(&self) -> &str {
        &self.fragment_lights
    }

    /// Preprocessed vertex lighting source
    pub fn vertex_source(&self) -> &str {
        &self.vertex_lights
    }

    /// Set or replace a uniform
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_string(), value);
    }

    /// Uniform by name
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    /// The published gobo array, if any
    pub fn gobo_uniforms(&self) -> Option<&[AuxLightData]> {
        match self.uniform(SPOT_LIGHT_GOBOS) {
            Some(UniformValue::GoboArray(entries)) => Some(entries),
            _ => None,
        }
    }

    /// The published sampler array, if any
    pub fn map_uniforms(&self) -> Option<&[TextureHandle]> {
        match self.uniform(SPOT_LIGHT_MAPS) {
            Some(UniformValue::TextureArray(maps)) => Some(maps),
            _ => None,
        }
    }
}

fn replace_light_nums(source: &str, defines: &LightDefines) -> String {
    source
        .replace("NUM_DIR_LIGHTS", &defines.num_dir_lights.to_string())
        .replace("NUM_POINT_LIGHTS", &defines.num_point_lights.to_string())
        .replace("NUM_SPOT_LIGHTS", &defines.num_spot_lights.to_string())
}

const UNROLL_START: &str = "#pragma unroll_loop_start";
const UNROLL_END: &str = "#pragma unroll_loop_end";

/// Expand `for ( int i = A; i < B; i ++ ) { ... }` loops between unroll
/// pragmas into B - A copies of the body with `[ i ]` and
/// `UNROLLED_LOOP_INDEX` replaced by the literal index.
pub fn unroll_loops(source: &str) -> Result<String, ShaderPatchError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find(UNROLL_START) {
        out.push_str(&rest[..start]);
        let region_start = start + UNROLL_START.len();
        let end = rest[region_start..]
            .find(UNROLL_END)
            .map(|offset| region_start + offset)
            .ok_or_else(|| ShaderPatchError::Unroll("missing unroll_loop_end".to_string()))?;
        let region = &rest[region_start..end];

        let (open, close) = match (region.find('{'), region.rfind('}')) {
            (Some(open), Some(close)) if open < close => (open, close),
            _ => return Err(ShaderPatchError::Unroll(format!("no loop body in {:?}", region.trim()))),
        };
        let (first, bound) = parse_loop_header(&region[..open])?;
        let body = &region[open + 1..close];

        for index in first..bound {
            out.push_str("{");
            out.push_str(
                &body
                    .replace("[ i ]", &format!("[ {} ]", index))
                    .replace("UNROLLED_LOOP_INDEX", &index.to_string()),
            );
            out.push_str("}\n");
        }
        rest = &rest[end + UNROLL_END.len()..];
    }

    out.push_str(rest);
    Ok(out)
}

fn parse_loop_header(header: &str) -> Result<(usize, usize), ShaderPatchError> {
    let bad = || ShaderPatchError::Unroll(format!("unsupported loop header {:?}", header.trim()));
    let field = |after: char| -> Option<usize> {
        let (_, tail) = header.split_once(after)?;
        tail.split(';').next()?.trim().parse().ok()
    };
    let first = field('=').ok_or_else(bad)?;
    let bound = field('<').ok_or_else(bad)?;
    Ok((first, bound))
}
