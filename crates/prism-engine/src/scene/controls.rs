use std::f32::consts::PI;

use glam::Vec3;

use crate::coords::Viewport;
use crate::input::{InputFrame, InputState, MouseButton, MouseWheelDelta};

use super::camera::PerspectiveCamera;

const EPS: f32 = 1e-6;
const MOVE_EPS: f32 = 1e-5;

/// Orbit controls with inertial damping.
///
/// Left drag rotates around `target`, right drag pans, the wheel dollies.
/// Input accumulates into pending deltas; [`OrbitControls::update`] applies a
/// `damping_factor` share of them to the camera each step and decays the rest,
/// so motion eases out over following frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self { target, ..Self::default() }
    }

    /// Feeds one frame of pointer input. Does not move the camera by itself.
    pub fn handle_input(
        &mut self,
        input: &InputState,
        frame: &InputFrame,
        viewport: Viewport,
        camera: &PerspectiveCamera,
    ) {
        let height = viewport.height.max(1.0);
        let (dx, dy) = frame.pointer_delta;

        if input.button_down(MouseButton::Left) && (dx != 0.0 || dy != 0.0) {
            self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
            self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
        } else if input.button_down(MouseButton::Right) && (dx != 0.0 || dy != 0.0) {
            self.pan(dx, dy, height, camera);
        }

        if frame.wheel_delta != 0.0 {
            let notches = frame.wheel_delta / MouseWheelDelta::LINE_HEIGHT;
            // Scrolling away from the user moves the camera closer.
            self.scale *= self.zoom_scale().powf(notches);
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Pans by a screen-space delta in logical pixels.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov_y * 0.5).tan();

        let view = camera.view().inverse();
        let right = view.x_axis.truncate();
        let up = view.y_axis.truncate();

        let scale = 2.0 * target_distance / viewport_height.max(1.0) * self.pan_speed;
        self.pan_offset += -right * dx * scale + up * dy * scale;
    }

    /// Multiplies the pending distance scale; values below 1 move closer.
    pub fn dolly(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// True while damped motion is still being applied.
    pub fn is_settling(&self) -> bool {
        self.delta_theta.abs() > EPS
            || self.delta_phi.abs() > EPS
            || self.pan_offset.length_squared() > EPS * EPS
            || (self.scale - 1.0).abs() > EPS
    }

    /// Applies pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let offset = camera.position - self.target;

        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 { (offset.y / radius).clamp(-1.0, 1.0).acos() } else { 0.0 };

        let share = if self.enable_damping { self.damping_factor } else { 1.0 };
        theta += self.delta_theta * share;
        phi += self.delta_phi * share;

        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * share;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );

        camera.position = self.target + offset;
        camera.target = self.target;

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.delta_theta *= keep;
            self.delta_phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > MOVE_EPS * MOVE_EPS
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::CameraConfig;
    use approx::assert_relative_eq;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), 1.0)
    }

    #[test]
    fn idle_update_keeps_camera_still() {
        let mut cam = camera();
        let before = cam.position;
        let mut controls = OrbitControls::new(Vec3::ZERO);
        assert!(!controls.update(&mut cam));
        assert_relative_eq!(cam.position.x, before.x, epsilon = 1e-4);
        assert_relative_eq!(cam.position.y, before.y, epsilon = 1e-4);
        assert_relative_eq!(cam.position.z, before.z, epsilon = 1e-4);
    }

    #[test]
    fn damping_applies_a_share_per_step() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let start = cam.position.x.atan2(cam.position.z);

        controls.rotate_left(-1.0);
        controls.update(&mut cam);
        let after_one = cam.position.x.atan2(cam.position.z);
        assert_relative_eq!(after_one - start, 0.05, epsilon = 1e-4);

        // The remaining motion decays geometrically.
        assert!(controls.is_settling());
        for _ in 0..400 {
            controls.update(&mut cam);
        }
        assert!(!controls.is_settling());
    }

    #[test]
    fn rotation_preserves_distance() {
        let mut cam = camera();
        let radius = cam.position.length();
        let mut controls = OrbitControls { enable_damping: false, ..OrbitControls::default() };
        controls.rotate_left(0.7);
        controls.rotate_up(0.3);
        assert!(controls.update(&mut cam));
        assert_relative_eq!(cam.position.length(), radius, epsilon = 1e-4);
    }

    #[test]
    fn dolly_changes_distance_once() {
        let mut cam = camera();
        let radius = cam.position.length();
        let mut controls = OrbitControls { enable_damping: false, ..OrbitControls::default() };
        controls.dolly(0.5);
        controls.update(&mut cam);
        assert_relative_eq!(cam.position.length(), radius * 0.5, epsilon = 1e-4);
        controls.update(&mut cam);
        assert_relative_eq!(cam.position.length(), radius * 0.5, epsilon = 1e-4);
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut cam = camera();
        let mut controls = OrbitControls { enable_damping: false, ..OrbitControls::default() };
        controls.rotate_up(10.0);
        controls.update(&mut cam);
        assert!(cam.position.y > 0.0);
        assert!(cam.position.x.abs() > 0.0 || cam.position.z.abs() > 0.0);
    }

    #[test]
    fn wheel_input_dollies_in() {
        let mut cam = camera();
        let radius = cam.position.length();
        let mut controls = OrbitControls { enable_damping: false, ..OrbitControls::default() };

        let state = InputState::default();
        let frame = InputFrame { wheel_delta: MouseWheelDelta::LINE_HEIGHT, ..InputFrame::default() };
        controls.handle_input(&state, &frame, Viewport::new(800.0, 600.0, 1.0), &cam);
        controls.update(&mut cam);
        assert_relative_eq!(cam.position.length(), radius * 0.95, epsilon = 1e-4);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut cam = camera();
        let mut controls = OrbitControls { enable_damping: false, ..OrbitControls::default() };
        let offset_before = cam.position - controls.target;
        controls.pan(50.0, 0.0, 600.0, &cam);
        controls.update(&mut cam);
        assert!(controls.target.length() > 0.0);
        let offset_after = cam.position - controls.target;
        assert_relative_eq!(offset_after.length(), offset_before.length(), epsilon = 1e-4);
        assert_eq!(cam.target, controls.target);
    }
}
