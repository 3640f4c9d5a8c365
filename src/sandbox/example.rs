use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use crate::engine::core::{Context, Layer, Timestep};
use crate::engine::error::Result;
use crate::engine::events::Event;
use crate::engine::graphics::builtin;
use crate::engine::graphics::{
    BufferLayout, IndexBuffer, Material, OrthographicCameraController, Shader, ShaderDataType, ShaderLibrary,
    VertexArray, VertexBuffer,
};
use crate::sandbox::close_on_escape;

const VERTEX_COLOR_SOURCE: &str = include_str!("shaders/vertex_color.wgsl");
const GRID_SIZE: i32 = 20;

#[rustfmt::skip]
const TRIANGLE_VERTICES: [f32; 21] = [
    -0.5, -0.5, 0.0,   0.8, 0.2, 0.8, 1.0,
     0.5, -0.5, 0.0,   0.2, 0.3, 0.8, 1.0,
     0.0,  0.5, 0.0,   0.8, 0.8, 0.2, 1.0,
];

struct Scene {
    shaders: ShaderLibrary,
    triangle: Arc<VertexArray>,
    square: Arc<VertexArray>,
}

/// Vertex-colored triangle over a grid of flat-colored squares, viewed
/// through an orthographic camera controller.
pub struct ExampleLayer {
    camera_controller: OrthographicCameraController,
    square_color: Vec4,
    scene: Option<Scene>,
}

impl ExampleLayer {
    pub fn new() -> Self {
        Self {
            camera_controller: OrthographicCameraController::new(16.0 / 9.0, true),
            square_color: Vec4::new(0.2, 0.3, 0.8, 1.0),
            scene: None,
        }
    }
}

impl Default for ExampleLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Transform of the square at grid cell `(x, y)`.
pub fn grid_transform(x: i32, y: i32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x as f32 * 0.11, y as f32 * 0.11, 0.0)) * Mat4::from_scale(Vec3::splat(0.1))
}

impl Layer for ExampleLayer {
    fn name(&self) -> &str {
        "Sandbox"
    }

    fn on_attach(&mut self, ctx: &mut Context) -> Result<()> {
        let device = ctx.device();
        let mut shaders = builtin::shader_library(device)?;
        shaders.add_named("VertexColor", Shader::from_source(device, "VertexColor", VERTEX_COLOR_SOURCE)?)?;

        let layout = BufferLayout::from([(ShaderDataType::Float3, "a_Position"), (ShaderDataType::Float4, "a_Color")]);
        let mut triangle = VertexArray::new();
        triangle.add_vertex_buffer(Arc::new(VertexBuffer::from_data(device, &TRIANGLE_VERTICES, layout)))?;
        triangle.set_index_buffer(Arc::new(IndexBuffer::new(device, &[0, 1, 2])));

        self.camera_controller = OrthographicCameraController::new(ctx.aspect_ratio(), true);
        self.scene = Some(Scene {
            shaders,
            triangle: Arc::new(triangle),
            square: Arc::new(builtin::quad(device)?),
        });
        Ok(())
    }

    fn on_detach(&mut self) {
        self.scene = None;
    }

    fn on_update(&mut self, ts: Timestep, ctx: &mut Context) -> Result<()> {
        let Some(scene) = &self.scene else {
            return Ok(());
        };
        self.camera_controller.on_update(ts, ctx.input);

        let renderer = &mut *ctx.renderer;
        renderer.set_clear_color(Vec4::new(0.1, 0.1, 0.1, 1.0))?;
        renderer.clear()?;

        renderer.begin_scene(self.camera_controller.camera())?;
        let flat_color = scene.shaders.get(builtin::FLAT_COLOR)?;
        let material = Material::color(self.square_color);
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                renderer.submit_with(&flat_color, &scene.square, grid_transform(x, y), &material)?;
            }
        }
        renderer.submit(&scene.shaders.get("VertexColor")?, &scene.triangle, Mat4::IDENTITY)?;
        renderer.end_scene()
    }

    fn on_event(&mut self, event: &mut Event, ctx: &mut Context) {
        self.camera_controller.on_event(event);
        close_on_escape(event, ctx);
    }

    fn on_ui_render(&mut self, ui: &mut egui::Ui) {
        let mut rgb = self.square_color.truncate().to_array();
        ui.horizontal(|ui| {
            ui.label("Square color");
            if ui.color_edit_button_rgb(&mut rgb).changed() {
                self.square_color = Vec3::from_array(rgb).extend(self.square_color.w);
            }
        });
        ui.label(format!("Zoom: {:.2}", self.camera_controller.zoom_level()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_cells_do_not_overlap() {
        let a = grid_transform(0, 0).transform_point3(Vec3::new(0.5, 0.5, 0.0));
        let b = grid_transform(1, 1).transform_point3(Vec3::new(-0.5, -0.5, 0.0));
        assert!(a.x < b.x && a.y < b.y);
        assert!((b.x - a.x - 0.01).abs() < 1e-5);
    }
}
