use glam::{Mat4, Vec3};

use crate::mesh::Placement;

/// Fixed camera looking at the origin. The scene turns, the camera does not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye_height: f32,
    pub eye_distance: f32,
    pub target: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            fov_degrees: 55.0,
            near: 0.01,
            far: 100.0,
            eye_height: 1.5,
            eye_distance: 4.0,
            target: Vec3::ZERO,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, self.eye_height, self.eye_distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// A zero-height viewport falls back to a square aspect.
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, width: u32, height: u32) -> Mat4 {
        self.projection_matrix(width, height) * self.view_matrix()
    }
}

/// rotate(angle around Y) · scale · translate
pub fn model_matrix(angle: f32, placement: &Placement) -> Mat4 {
    Mat4::from_rotation_y(angle)
        * Mat4::from_scale(placement.scale)
        * Mat4::from_translation(placement.translation)
}
