use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use super::geometry::Geometry;
use super::material::Material;

/// Geometry paired with the material it is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Material,
}

/// Drawable scene node with a world transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Local-to-world matrix.
    pub transform: Mat4,
    pub mesh: Mesh,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Node {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            mesh,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Matrix for transforming normals (inverse transpose of the upper 3x3).
    pub fn normal_matrix(&self) -> Mat4 {
        let det = self.transform.determinant();
        if det.abs() <= f32::EPSILON {
            return Mat4::IDENTITY;
        }
        self.transform.inverse().transpose()
    }
}

/// Uniform scale, rotation about +Y and translation applied to a whole model.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub rotation_y: f32,
    pub translation: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self { scale: 1.0, rotation_y: 0.0, translation: Vec3::ZERO }
    }
}

impl Placement {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.rotation_y),
            self.translation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Geometry;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn placement_scales_then_rotates() {
        let p = Placement { scale: 2.0, rotation_y: FRAC_PI_2, translation: Vec3::ZERO };
        let v = p.matrix().transform_point3(Vec3::X);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(v.z, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let mesh = Mesh { geometry: Arc::new(Geometry::quad(1.0)), material: Material::default() };
        let node = Node::new("n", mesh).with_transform(Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        let n = node.normal_matrix().transform_vector3(Vec3::X);
        assert_relative_eq!(n.x, 0.5, epsilon = 1e-6);
    }
}
