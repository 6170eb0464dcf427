//! Math utilities and types
//!
//! Provides the math types used by the scene model and the shading routines.
//! Scalar helpers mirror the GLSL built-ins of the same name so the CPU
//! reference of the lighting routine reads like the shader it stands in for.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Local transform of a scene node: position, rotation and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation relative to the parent
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform at `eye` whose local -Z axis points at `target`
    ///
    /// Spotlights and cameras both look down their local -Z, so this is the
    /// one constructor the scene needs for aiming them.
    pub fn looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = target - eye;
        let rotation = if forward.norm_squared() <= f32::EPSILON {
            Quat::identity()
        } else {
            // face_towards aligns local +Z with the given direction
            Quat::face_towards(&(-forward), &up)
        };
        Self::from_position_rotation(eye, rotation)
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Rotate a direction by the upper 3x3 of `matrix` and renormalize.
///
/// Translation is ignored. A degenerate result falls back to the input.
pub fn transform_direction(matrix: &Mat4, direction: &Vec3) -> Vec3 {
    matrix
        .transform_vector(direction)
        .try_normalize(f32::EPSILON)
        .unwrap_or(*direction)
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Clamp to [0, 1]
    pub fn saturate(value: f32) -> f32 {
        value.clamp(0.0, 1.0)
    }

    /// Hermite interpolation between two edges, as GLSL `smoothstep`.
    ///
    /// GLSL leaves `edge0 == edge1` undefined; here it degrades to a step.
    pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
        if (edge1 - edge0).abs() <= f32::EPSILON {
            return if x < edge0 { 0.0 } else { 1.0 };
        }
        let t = saturate((x - edge0) / (edge1 - edge0));
        t * t * (3.0 - 2.0 * t)
    }

    /// Arccosine with the argument clamped into its domain.
    ///
    /// Dot products of unit vectors drift slightly past +-1 in floating point.
    pub fn safe_acos(value: f32) -> f32 {
        value.clamp(-1.0, 1.0).acos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_looking_at_points_negative_z_at_target() {
        let transform = Transform::looking_at(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -1.0),
        );
        let forward = transform_direction(&transform.to_matrix(), &Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(forward, Vec3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_transform_direction_ignores_translation() {
        let matrix = Transform::from_position(Vec3::new(10.0, -3.0, 2.0)).to_matrix();
        let dir = transform_direction(&matrix, &Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(dir, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(utils::smoothstep(0.5, 0.9, 0.4), 0.0);
        assert_eq!(utils::smoothstep(0.5, 0.9, 1.0), 1.0);
        assert_relative_eq!(utils::smoothstep(0.0, 1.0, 0.5), 0.5);
        // Degenerate edges act as a step
        assert_eq!(utils::smoothstep(0.7, 0.7, 0.69), 0.0);
        assert_eq!(utils::smoothstep(0.7, 0.7, 0.7), 1.0);
    }

    #[test]
    fn test_safe_acos_never_nan() {
        assert_eq!(utils::safe_acos(1.000_001), 0.0);
        assert_relative_eq!(utils::safe_acos(-1.000_001), constants::PI);
    }
}
