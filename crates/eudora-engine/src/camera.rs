//! Camera producing view and projection matrices.
//!
//! The text engine uses an orthographic camera spanning NDC (`2 × 2`, origin at
//! the center) so layout coordinates pass through unchanged in x/y.

use crate::coords::{Mat4, Vec3};

/// Default vertical field of view for perspective cameras (75°).
pub const DEFAULT_FOV_Y: f32 = 75.0 * std::f32::consts::PI / 180.0;

/// Position used by 2D cameras.
pub const DEFAULT_POSITION_2D: Vec3 = Vec3::new(0.0, 0.0, 2.0);

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    target: Vec3,
    projection: Mat4,
    view: Mat4,
}

impl Camera {
    /// Creates a camera at `position` looking at the origin.
    pub fn new(projection: Mat4, position: Vec3) -> Self {
        let mut cam = Self {
            position,
            target: Vec3::default(),
            projection,
            view: Mat4::IDENTITY,
        };
        cam.recompute_view();
        cam
    }

    /// Orthographic camera covering `scale_x × scale_y` units.
    ///
    /// With `origin_center` the box is centered on the origin; otherwise it starts
    /// at the origin with +Y down.
    pub fn orthographic(scale_x: f32, scale_y: f32, origin_center: bool) -> Self {
        Self::new(ortho_box(scale_x, scale_y, origin_center), DEFAULT_POSITION_2D)
    }

    /// Perspective camera for a `width × height` target.
    pub fn perspective(fov_y: f32, width: u32, height: u32, near: f32, far: f32) -> Self {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Self::new(
            Mat4::perspective(fov_y, aspect, near, far),
            Vec3::new(0.0, 0.3, 3.0),
        )
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recompute_view();
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
        self.recompute_view();
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    fn recompute_view(&mut self) {
        self.view = Mat4::look_at(self.position, self.target, Vec3::UP);
    }
}

fn ortho_box(scale_x: f32, scale_y: f32, origin_center: bool) -> Mat4 {
    let (left, right) = if origin_center { (-scale_x / 2.0, scale_x / 2.0) } else { (0.0, scale_x) };
    let (top, bottom) = if origin_center { (scale_y / 2.0, -scale_y / 2.0) } else { (0.0, scale_y) };
    Mat4::ortho(left, right, bottom, top, 10.0, -100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_ortho_keeps_ndc_xy() {
        let cam = Camera::orthographic(2.0, 2.0, true);
        let p = cam.view_projection().transform_point(Vec3::new(0.5, -0.25, 0.0));
        assert!((p.x - 0.5).abs() < 1e-5);
        assert!((p.y + 0.25).abs() < 1e-5);
    }

    #[test]
    fn corner_ortho_flips_y() {
        let cam = Camera::orthographic(100.0, 50.0, false);
        let p = cam.view_projection().transform_point(Vec3::new(0.0, 0.0, 0.0));
        assert!((p.x + 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn moving_camera_updates_view() {
        let mut cam = Camera::orthographic(2.0, 2.0, true);
        let before = cam.view();
        cam.set_position(Vec3::new(0.5, 0.0, 2.0));
        assert_ne!(before, cam.view());
    }
}
