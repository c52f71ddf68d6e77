use std::collections::HashSet;
use std::f32::consts::{FRAC_PI_4, TAU};

use crate::input::{Direction, InputEvent, Key, KeyBindings};
use crate::math::{ClipDepth, Mat4, Vec3};
use crate::shader::{UniformBlock, UniformValue};

use super::Projection;

pub const VIEW: &str = "view";
pub const PROJECTION: &str = "projection";
pub const CAMERA_POSITION: &str = "camera.position";

#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// World translation applied by the view matrix (the eye sits at `-position`).
    pub position: Vec3,
    /// Radians.
    pub pitch: f32,
    /// Radians.
    pub yaw: f32,
    /// Units per second.
    pub speed: f32,
    /// Radians per pixel of mouse drag.
    pub sensitivity: f32,
    /// Vertical field of view, radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -3.0),
            pitch: 0.0,
            yaw: 0.0,
            speed: 2.5,
            sensitivity: 0.005,
            fov_y: FRAC_PI_4,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Free-flying camera with pitch and yaw, no roll.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    pitch: f32,
    yaw: f32,
    speed: f32,
    sensitivity: f32,
    moving: [bool; 4],
    /// Bound keys currently down, per direction.
    held: [HashSet<Key>; 4],
    view: Mat4,
    projection: Projection,
    uniforms: UniformBlock,
}

impl Camera {
    pub fn new(config: &CameraConfig, width: u32, height: u32, depth: ClipDepth) -> Self {
        let projection = Projection::new(config.fov_y, config.near, config.far, width, height, depth);
        let mut camera = Self {
            position: config.position,
            pitch: wrap_angle(config.pitch),
            yaw: wrap_angle(config.yaw),
            speed: config.speed,
            sensitivity: config.sensitivity,
            moving: [false; 4],
            held: Default::default(),
            view: Mat4::IDENTITY,
            projection,
            uniforms: UniformBlock::new()
                .with(VIEW, Mat4::IDENTITY)
                .with(PROJECTION, projection.matrix())
                .with(CAMERA_POSITION, -config.position),
        };
        camera.update_view_matrix(0.0);
        camera
    }

    /// Unit displacement axis for forward motion at the current orientation.
    pub fn forward_axis(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(-sy * cp, sp, cy * cp)
    }

    /// Unit displacement axis for motion to the right.
    ///
    /// Unit X rotated by the inverse orientation, then negated: the view
    /// translation moves the world, not the eye.
    pub fn strafe_axis(&self) -> Vec3 {
        let orientation = Mat4::IDENTITY.rotate_y(-self.yaw).rotate_x(-self.pitch);
        -orientation.transform_vector(Vec3::X)
    }

    /// Applies `elapsed` seconds of movement for the active directions and
    /// rebuilds the view matrix.
    pub fn update_view_matrix(&mut self, elapsed: f32) {
        let step = self.speed * elapsed;
        if step != 0.0 && self.moving.iter().any(|&m| m) {
            let forward = self.forward_axis();
            let strafe = self.strafe_axis();
            let mut displacement = Vec3::ZERO;
            if self.is_moving(Direction::Forward) {
                displacement += forward * step;
            }
            if self.is_moving(Direction::Backward) {
                displacement += -(forward * step);
            }
            if self.is_moving(Direction::Right) {
                displacement += strafe * step;
            }
            if self.is_moving(Direction::Left) {
                displacement += -(strafe * step);
            }
            self.position += displacement;
        }

        let p = self.position;
        self.view = Mat4::IDENTITY
            .rotate_x(self.pitch)
            .rotate_y(self.yaw)
            .translate(p.x, p.y, p.z);
        self.publish(VIEW, self.view);
        self.publish(CAMERA_POSITION, -self.position);
    }

    /// Adds to pitch and yaw, wrapping both into `[0, 2π)`.
    pub fn rotate(&mut self, d_pitch: f32, d_yaw: f32) {
        self.pitch = wrap_angle(self.pitch + d_pitch);
        self.yaw = wrap_angle(self.yaw + d_yaw);
    }

    /// Forces a direction on or off, forgetting any keys held for it.
    pub fn set_direction(&mut self, direction: Direction, active: bool) {
        let slot = slot(direction);
        self.moving[slot] = active;
        self.held[slot].clear();
    }

    pub fn is_moving(&self, direction: Direction) -> bool {
        self.moving[slot(direction)]
    }

    /// Applies one input event. Returns whether the camera consumed it.
    pub fn handle_input(&mut self, event: &InputEvent, bindings: &KeyBindings) -> bool {
        match *event {
            InputEvent::KeyDown(key) | InputEvent::KeyUp(key) => {
                let Some(direction) = bindings.direction(key) else {
                    return false;
                };
                // A direction stays active while any key bound to it is down.
                let slot = slot(direction);
                if matches!(event, InputEvent::KeyDown(_)) {
                    self.held[slot].insert(key);
                } else {
                    self.held[slot].remove(&key);
                }
                self.moving[slot] = !self.held[slot].is_empty();
                true
            }
            InputEvent::MouseDrag { dx, dy } => {
                self.rotate(dy * self.sensitivity, dx * self.sensitivity);
                true
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.projection.resize(width, height) {
            log::debug!("camera projection rebuilt for {width}x{height}");
            self.publish(PROJECTION, self.projection.matrix());
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformBlock {
        &mut self.uniforms
    }

    fn publish(&mut self, name: &str, value: impl Into<UniformValue>) {
        // Every name published here is declared in `new`.
        if let Err(e) = self.uniforms.set(name, value) {
            log::error!("camera uniform: {e}");
        }
    }
}

fn slot(direction: Direction) -> usize {
    match direction {
        Direction::Forward => 0,
        Direction::Backward => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

/// `rem_euclid` can round up to exactly `TAU` for tiny negative inputs.
fn wrap_angle(radians: f32) -> f32 {
    let wrapped = radians.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn camera_at_origin() -> Camera {
        let config = CameraConfig { position: Vec3::ZERO, speed: 2.0, ..CameraConfig::default() };
        Camera::new(&config, 800, 600, ClipDepth::NegativeOneToOne)
    }

    // ── movement ──────────────────────────────────────────────────────────

    #[test]
    fn forward_for_one_second_moves_speed_along_z() {
        let mut cam = camera_at_origin();
        cam.set_direction(Direction::Forward, true);
        cam.update_view_matrix(1.0);
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn backward_cancels_forward() {
        let mut cam = camera_at_origin();
        cam.set_direction(Direction::Forward, true);
        cam.set_direction(Direction::Backward, true);
        cam.update_view_matrix(0.5);
        assert!(cam.position().approx_eq(Vec3::ZERO, EPS));
    }

    #[test]
    fn strafe_is_perpendicular_to_forward() {
        let mut cam = camera_at_origin();
        cam.rotate(0.3, 1.1);
        assert!(cam.forward_axis().dot(cam.strafe_axis()).abs() < EPS);
        assert!((cam.strafe_axis().length() - 1.0).abs() < EPS);

        let mut cam = camera_at_origin();
        cam.set_direction(Direction::Right, true);
        cam.update_view_matrix(1.0);
        assert!(cam.position().approx_eq(Vec3::new(-2.0, 0.0, 0.0), EPS));

        cam.set_direction(Direction::Right, false);
        cam.set_direction(Direction::Left, true);
        cam.update_view_matrix(2.0);
        assert!(cam.position().approx_eq(Vec3::new(2.0, 0.0, 0.0), EPS));
    }

    #[test]
    fn view_translates_by_position_at_zero_orientation() {
        let mut cam = camera_at_origin();
        cam.set_position(Vec3::new(1.0, 2.0, 3.0));
        cam.update_view_matrix(0.0);
        assert!(cam.view().approx_eq(&Mat4::translation(1.0, 2.0, 3.0), EPS));
        assert_eq!(
            cam.uniforms().get(CAMERA_POSITION),
            Some(&UniformValue::from(Vec3::new(-1.0, -2.0, -3.0)))
        );
    }

    // ── orientation ───────────────────────────────────────────────────────

    #[test]
    fn rotation_wraps_into_full_turn() {
        let mut cam = camera_at_origin();
        cam.rotate(-0.25, TAU + 0.5);
        assert!((cam.pitch() - (TAU - 0.25)).abs() < EPS);
        assert!((cam.yaw() - 0.5).abs() < EPS);
        assert!((0.0..TAU).contains(&cam.pitch()));
        assert!(wrap_angle(-1e-9) < TAU);
    }

    // ── input ─────────────────────────────────────────────────────────────

    #[test]
    fn bound_keys_toggle_directions() {
        let mut cam = camera_at_origin();
        let bindings = KeyBindings::default();

        assert!(cam.handle_input(&InputEvent::KeyDown(Key::W), &bindings));
        assert!(cam.is_moving(Direction::Forward));
        assert!(cam.handle_input(&InputEvent::KeyUp(Key::W), &bindings));
        assert!(!cam.is_moving(Direction::Forward));
        assert!(!cam.handle_input(&InputEvent::KeyDown(Key::Q), &bindings));
    }

    #[test]
    fn direction_holds_while_any_bound_key_is_down() {
        let mut cam = camera_at_origin();
        let bindings = KeyBindings::default();

        cam.handle_input(&InputEvent::KeyDown(Key::W), &bindings);
        cam.handle_input(&InputEvent::KeyDown(Key::ArrowUp), &bindings);
        cam.handle_input(&InputEvent::KeyUp(Key::ArrowUp), &bindings);
        assert!(cam.is_moving(Direction::Forward));
        cam.update_view_matrix(1.0);
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 2.0));

        cam.handle_input(&InputEvent::KeyUp(Key::W), &bindings);
        assert!(!cam.is_moving(Direction::Forward));
    }

    #[test]
    fn key_repeat_does_not_stick_a_direction() {
        let mut cam = camera_at_origin();
        let bindings = KeyBindings::default();

        cam.handle_input(&InputEvent::KeyDown(Key::D), &bindings);
        cam.handle_input(&InputEvent::KeyDown(Key::D), &bindings);
        cam.handle_input(&InputEvent::KeyUp(Key::D), &bindings);
        assert!(!cam.is_moving(Direction::Right));
    }

    #[test]
    fn forced_stop_forgets_held_keys() {
        let mut cam = camera_at_origin();
        let bindings = KeyBindings::default();

        cam.handle_input(&InputEvent::KeyDown(Key::S), &bindings);
        cam.set_direction(Direction::Backward, false);
        assert!(!cam.is_moving(Direction::Backward));
        cam.handle_input(&InputEvent::KeyDown(Key::ArrowDown), &bindings);
        cam.handle_input(&InputEvent::KeyUp(Key::ArrowDown), &bindings);
        assert!(!cam.is_moving(Direction::Backward));
    }

    #[test]
    fn drag_rotates_by_sensitivity() {
        let mut cam = camera_at_origin();
        cam.handle_input(&InputEvent::MouseDrag { dx: 100.0, dy: 20.0 }, &KeyBindings::default());
        assert!((cam.yaw() - 0.5).abs() < EPS);
        assert!((cam.pitch() - 0.1).abs() < EPS);
    }

    #[test]
    fn resize_updates_projection_uniform() {
        let mut cam = camera_at_origin();
        let before = cam.projection().matrix();
        cam.resize(1920, 1080);
        let after = cam.projection().matrix();
        assert_ne!(before, after);
        assert_eq!(cam.uniforms().get(PROJECTION), Some(&UniformValue::from(after)));
    }
}
