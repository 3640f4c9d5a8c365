use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::engine::core::Timestep;
use crate::engine::events::{Event, EventDispatcher, MouseScrolledEvent, WindowResizeEvent};
use crate::engine::graphics::camera::{Camera, OrthographicCamera};
use crate::engine::input::InputHandler;

const MIN_ZOOM: f32 = 0.25;
const ZOOM_STEP: f32 = 0.25;

/// Drives an `OrthographicCamera` from polled input: WASD pans, Q/E rotates
/// (when enabled), the scroll wheel zooms and window resizes keep the
/// aspect ratio.
pub struct OrthographicCameraController {
    aspect_ratio: f32,
    zoom_level: f32,
    camera: OrthographicCamera,
    rotation: bool,
    position: Vec3,
    rotation_degrees: f32,
    translation_speed: f32,
    rotation_speed: f32,
}

impl OrthographicCameraController {
    pub fn new(aspect_ratio: f32, rotation: bool) -> Self {
        let zoom_level = 1.0;
        Self {
            aspect_ratio,
            zoom_level,
            camera: OrthographicCamera::new(-aspect_ratio * zoom_level, aspect_ratio * zoom_level, -zoom_level, zoom_level),
            rotation,
            position: Vec3::ZERO,
            rotation_degrees: 0.0,
            translation_speed: 5.0,
            rotation_speed: 180.0,
        }
    }

    pub fn on_update(&mut self, ts: Timestep, input: &InputHandler) {
        let step = input.wasd_axis() * self.translation_speed * ts.seconds();
        if step != glam::Vec2::ZERO {
            // Pan in screen space so movement follows the rotated camera.
            let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
            self.position.x += step.x * cos - step.y * sin;
            self.position.y += step.x * sin + step.y * cos;
            self.camera.set_position(self.position);
        }

        if self.rotation {
            let mut turn = 0.0;
            if input.is_key_pressed(KeyCode::KeyQ) {
                turn += 1.0;
            }
            if input.is_key_pressed(KeyCode::KeyE) {
                turn -= 1.0;
            }
            if turn != 0.0 {
                self.rotation_degrees = (self.rotation_degrees + turn * self.rotation_speed * ts.seconds()).rem_euclid(360.0);
                self.camera.set_rotation(self.rotation_degrees);
            }
        }

        // Keep the on-screen pan speed constant across zoom levels.
        self.translation_speed = self.zoom_level * 5.0;
    }

    pub fn on_event(&mut self, event: &mut Event) {
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<MouseScrolledEvent>(|e| self.on_mouse_scrolled(e));
        dispatcher.dispatch::<WindowResizeEvent>(|e| self.on_window_resized(e));
    }

    fn on_mouse_scrolled(&mut self, e: &MouseScrolledEvent) -> bool {
        self.zoom_level = (self.zoom_level - e.y_offset * ZOOM_STEP).max(MIN_ZOOM);
        self.update_projection();
        false
    }

    fn on_window_resized(&mut self, e: &WindowResizeEvent) -> bool {
        if e.height > 0 {
            self.aspect_ratio = e.width as f32 / e.height as f32;
            self.update_projection();
        }
        false
    }

    fn update_projection(&mut self) {
        let (w, h) = (self.aspect_ratio * self.zoom_level, self.zoom_level);
        self.camera.set_projection(-w, w, -h, h);
    }

    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Converts a cursor position in window pixels to world coordinates.
    pub fn screen_to_world(&self, cursor: glam::Vec2, window_size: (u32, u32)) -> glam::Vec2 {
        let (width, height) = (window_size.0.max(1) as f32, window_size.1.max(1) as f32);
        let ndc = glam::Vec2::new(cursor.x / width * 2.0 - 1.0, 1.0 - cursor.y / height * 2.0);
        let world = self.camera.view_projection().inverse() * glam::Vec4::new(ndc.x, ndc.y, 0.5, 1.0);
        glam::Vec2::new(world.x, world.y) / world.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::KeyPressedEvent;

    #[test]
    fn scrolling_zooms_with_a_floor() {
        let mut controller = OrthographicCameraController::new(16.0 / 9.0, false);
        let mut event = Event::from(MouseScrolledEvent { x_offset: 0.0, y_offset: 2.0 });
        controller.on_event(&mut event);
        assert!((controller.zoom_level() - 0.5).abs() < 1e-6);
        assert!(!event.handled);

        let mut event = Event::from(MouseScrolledEvent { x_offset: 0.0, y_offset: 10.0 });
        controller.on_event(&mut event);
        assert_eq!(controller.zoom_level(), MIN_ZOOM);
    }

    #[test]
    fn resize_updates_aspect_ratio() {
        let mut controller = OrthographicCameraController::new(1.0, false);
        controller.on_event(&mut Event::from(WindowResizeEvent { width: 800, height: 400 }));
        assert_eq!(controller.aspect_ratio(), 2.0);
        // Minimized windows leave the ratio alone.
        controller.on_event(&mut Event::from(WindowResizeEvent { width: 0, height: 0 }));
        assert_eq!(controller.aspect_ratio(), 2.0);
    }

    #[test]
    fn wasd_pans_camera() {
        let mut controller = OrthographicCameraController::new(1.0, true);
        let mut input = InputHandler::new();
        input.on_event(&KeyPressedEvent { key: KeyCode::KeyD, repeat_count: 0 }.into());
        controller.on_update(Timestep::new(0.5), &input);
        assert!((controller.camera().position().x - 2.5).abs() < 1e-5);
        assert_eq!(controller.camera().position().y, 0.0);
    }

    #[test]
    fn screen_center_maps_to_camera_position() {
        let controller = OrthographicCameraController::new(2.0, false);
        let world = controller.screen_to_world(glam::Vec2::new(400.0, 200.0), (800, 400));
        assert!(world.abs_diff_eq(glam::Vec2::ZERO, 1e-5));
        let corner = controller.screen_to_world(glam::Vec2::new(800.0, 0.0), (800, 400));
        assert!(corner.abs_diff_eq(glam::Vec2::new(2.0, 1.0), 1e-5));
    }
}
