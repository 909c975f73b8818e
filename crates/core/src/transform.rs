//! Matrix helpers for uniform setup.
//!
//! Composition follows the post-multiply convention of gl-matrix style
//! code: each step is applied on the right, so `orbit_model` translates
//! first in world space and rotates about the object's own axes.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projection {
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_radians: std::f32::consts::FRAC_PI_4,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    /// Right-handed perspective matrix mapping depth to GL's [-1, 1] clip range.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect, self.near, self.far)
    }
}

/// Pushes an object `distance` units down -Z, then tilts it about X and
/// turns it about Y.
pub fn orbit_model(distance: f32, tilt_x: f32, yaw_y: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, -distance))
        * Mat4::from_rotation_x(tilt_x)
        * Mat4::from_rotation_y(yaw_y)
}

/// Rotates a part of `model` about an X-parallel axis through `pivot`
/// (in model space), e.g. a lid swinging on its back edge.
pub fn hinged(model: Mat4, pivot: Vec3, angle_x: f32) -> Mat4 {
    model * Mat4::from_translation(pivot) * Mat4::from_rotation_x(angle_x) * Mat4::from_translation(-pivot)
}

/// Inverse transpose of `model`, for transforming normals.
pub fn normal_matrix(model: Mat4) -> Mat4 {
    model.inverse().transpose()
}

pub fn mvp(projection: Mat4, model: Mat4) -> Mat4 {
    projection * model
}

/// Column-major array for `uniformMatrix4fv` with `transpose = false`.
pub fn to_uniform(m: &Mat4) -> [f32; 16] {
    m.to_cols_array()
}
