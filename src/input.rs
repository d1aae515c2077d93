//! Keyboard state and the fly-camera controls of the demo.

use std::collections::HashSet;

use glam::{Quat, Vec3};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::Camera;
use crate::config::CameraConfig;

/// Tracks which keys are held, and which went down this frame.
#[derive(Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the start of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                self.set_key(key, event.state == ElementState::Pressed);
            }
        }
    }

    /// Records a key transition.
    pub fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            if self.keys_down.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else {
            self.keys_down.remove(&key);
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// -1, 0 or 1 from a pair of opposing keys; `negative` wins ties.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        if self.key_down(negative) {
            -1.0
        } else if self.key_down(positive) {
            1.0
        } else {
            0.0
        }
    }
}

/// Keyboard fly controls.
///
/// | Keys        | Action                 |
/// |-------------|------------------------|
/// | A / D       | strafe left / right    |
/// | Shift / Space | down / up            |
/// | S / W       | back / forward         |
/// | Q / E       | turn left / right      |
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraControls {
    /// Units per second.
    pub move_speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
}

impl From<&CameraConfig> for CameraControls {
    fn from(config: &CameraConfig) -> Self {
        Self {
            move_speed: config.move_speed,
            turn_speed: config.turn_speed,
        }
    }
}

impl CameraControls {
    /// Moves and turns `camera` for `dt` seconds of input.
    ///
    /// Movement is in the camera's own frame. Returns whether anything
    /// changed; the camera's view is refreshed when it did.
    pub fn apply(&self, input: &Input, camera: &mut Camera, dt: f32) -> bool {
        let step = self.move_speed * dt;
        let local = Vec3::new(
            input.axis(KeyCode::KeyA, KeyCode::KeyD),
            input.axis(KeyCode::ShiftLeft, KeyCode::Space),
            input.axis(KeyCode::KeyS, KeyCode::KeyW),
        ) * step;
        let turn = input.axis(KeyCode::KeyE, KeyCode::KeyQ);

        if local == Vec3::ZERO && turn == 0.0 {
            return false;
        }

        let transform = &mut camera.transform;
        if turn != 0.0 {
            transform.rotation *= Quat::from_rotation_y(turn * self.turn_speed * dt);
        }
        transform.position += transform.rotation.inverse() * local;
        camera.update();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn controls() -> CameraControls {
        CameraControls {
            move_speed: 2.0,
            turn_speed: 1.0,
        }
    }

    #[test]
    fn presses_last_one_frame() {
        let mut input = Input::new();
        input.set_key(KeyCode::KeyB, true);
        assert!(input.key_pressed(KeyCode::KeyB));
        assert!(input.key_down(KeyCode::KeyB));

        input.begin_frame();
        input.set_key(KeyCode::KeyB, true);
        assert!(!input.key_pressed(KeyCode::KeyB), "repeat is not a press");

        input.set_key(KeyCode::KeyB, false);
        assert!(!input.key_down(KeyCode::KeyB));
        input.begin_frame();
        input.set_key(KeyCode::KeyB, true);
        assert!(input.key_pressed(KeyCode::KeyB), "press after release counts again");
    }

    #[test]
    fn idle_input_leaves_camera_alone() {
        let mut camera = Camera::new(800, 600, 0.1, 100.0);
        assert!(!controls().apply(&Input::new(), &mut camera, 0.5));
        assert_eq!(camera.transform.position, Vec3::ZERO);
    }

    #[test]
    fn forward_follows_the_look_direction() {
        let mut camera = Camera::new(800, 600, 0.1, 100.0);
        camera.transform.rotation = Quat::from_rotation_y(0.7);
        camera.update();
        let forward = camera.forward();

        let mut input = Input::new();
        input.set_key(KeyCode::KeyW, true);
        assert!(controls().apply(&input, &mut camera, 0.5));

        assert!(camera.transform.position.abs_diff_eq(forward, 1e-5));
    }

    #[test]
    fn turning_changes_heading_not_position() {
        let mut camera = Camera::new(800, 600, 0.1, 100.0);
        let before = camera.forward();

        let mut input = Input::new();
        input.set_key(KeyCode::KeyQ, true);
        controls().apply(&input, &mut camera, 0.25);

        assert_eq!(camera.transform.position, Vec3::ZERO);
        assert_relative_eq!(before.angle_between(camera.forward()), 0.25, epsilon = 1e-5);
    }
}
