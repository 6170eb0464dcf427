//! # Camera
//!
//! Only the parts of a camera the lighting code reads: its world transform
//! (and therefore its view matrix) and its layer mask. Projection is the
//! host's business.

use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::scene::Layers;

/// Viewing camera looking down its local -Z axis
#[derive(Debug, Clone)]
pub struct Camera {
    /// World transform
    pub transform: Transform,
    /// Layers this camera renders
    pub layers: Layers,
}

impl Camera {
    /// Camera at `position` looking at `target` with the given up vector
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            transform: Transform::looking_at(position, target, up),
            layers: Layers::DEFAULT,
        }
    }

    /// Set the layer mask
    pub fn with_layers(mut self, layers: Layers) -> Self {
        self.layers = layers;
        self
    }

    /// Camera-to-world matrix
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// World-to-camera matrix, the inverse of [`Camera::world_matrix`]
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix()
            .try_inverse()
            .unwrap_or_else(|| {
                log::warn!("Camera world matrix is singular, using identity view");
                Mat4::identity()
            })
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            layers: Layers::DEFAULT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use approx::assert_relative_eq;

    #[test]
    fn test_view_matrix_moves_target_onto_negative_z() {
        let camera = Camera::look_at(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let target_in_view = camera.view_matrix().transform_point(&Point3::origin());
        assert_relative_eq!(target_in_view.coords, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
    }
}
