use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::orbit_camera::OrbitCamera;
use crate::config::CameraConfig;

/// Residual rotation below which damping stops.
const DAMPING_EPSILON: f32 = 1e-5;

pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Fraction of the pending rotation applied per frame, `None` for immediate.
    pub damping_factor: Option<f32>,
    pending_yaw: f32,
    pending_pitch: f32,
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            damping_factor: None,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        let mut controller = Self::new(config.rotate_speed, config.zoom_speed);
        controller.pan_speed = config.pan_speed;
        if config.damping {
            controller.damping_factor = Some(config.damping_factor.clamp(0.0, 1.0));
        }
        controller
    }

    pub fn process_events(
        &mut self,
        event: &DeviceEvent,
        window: &Window,
        camera: &mut OrbitCamera,
    ) {
        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
            }
            DeviceEvent::MouseWheel { delta, .. } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                camera.add_distance(scroll_amount * self.zoom_speed);
                window.request_redraw();
            }
            DeviceEvent::MouseMotion { delta } => {
                if self.is_mouse_pressed {
                    if self.is_shift_held {
                        // SHIFT + DRAG = PAN (move focus point)
                        camera.pan((
                            -delta.0 as f32 * self.pan_speed,
                            delta.1 as f32 * self.pan_speed,
                        ));
                    } else {
                        // NORMAL DRAG = ROTATE (orbit around focus)
                        self.rotate(
                            camera,
                            -delta.0 as f32 * self.rotate_speed,
                            delta.1 as f32 * self.rotate_speed,
                        );
                    }
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.is_shift_held = *state == ElementState::Pressed;
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } => {
                // Shift+C resets the camera
                if self.is_shift_held {
                    log::info!("resetting camera to its initial position");
                    self.pending_yaw = 0.0;
                    self.pending_pitch = 0.0;
                    camera.reset_to_default();
                }
            }
            _ => (),
        }
    }

    fn rotate(&mut self, camera: &mut OrbitCamera, yaw: f32, pitch: f32) {
        if self.damping_factor.is_some() {
            self.pending_yaw += yaw;
            self.pending_pitch += pitch;
        } else {
            camera.add_yaw(yaw);
            camera.add_pitch(pitch);
        }
    }

    /// Applies a share of the pending rotation. Call once per frame.
    pub fn update(&mut self, camera: &mut OrbitCamera) {
        let Some(factor) = self.damping_factor else {
            return;
        };
        if self.pending_yaw.abs() < DAMPING_EPSILON && self.pending_pitch.abs() < DAMPING_EPSILON {
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
            return;
        }

        camera.add_yaw(self.pending_yaw * factor);
        camera.add_pitch(self.pending_pitch * factor);
        self.pending_yaw *= 1.0 - factor;
        self.pending_pitch *= 1.0 - factor;
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    /// Returns true if the camera is still settling after a drag
    pub fn is_damping(&self) -> bool {
        self.pending_yaw != 0.0 || self.pending_pitch != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::{Vector3, Zero};

    #[test]
    fn test_damped_rotation_converges_to_full_delta() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        let mut controller = CameraController::from_config(&CameraConfig::default());

        controller.rotate(&mut camera, 0.5, 0.0);
        controller.update(&mut camera);
        assert_abs_diff_eq!(camera.yaw, 0.5 * 0.05, epsilon = 1e-6);

        for _ in 0..1000 {
            controller.update(&mut camera);
        }
        assert_abs_diff_eq!(camera.yaw, 0.5, epsilon = 1e-4);
        assert!(!controller.is_damping());
    }

    #[test]
    fn test_undamped_rotation_is_immediate() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        let config = CameraConfig {
            damping: false,
            ..CameraConfig::default()
        };
        let mut controller = CameraController::from_config(&config);

        controller.rotate(&mut camera, 0.25, 0.1);
        assert_abs_diff_eq!(camera.yaw, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(camera.pitch, 0.1, epsilon = 1e-6);
    }
}
