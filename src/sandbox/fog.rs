use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use log::info;
use winit::keyboard::KeyCode;

use crate::engine::core::{Context, Layer, Timestep};
use crate::engine::error::Result;
use crate::engine::events::{Event, EventDispatcher, KeyPressedEvent, WindowResizeEvent};
use crate::engine::graphics::{
    BufferLayout, IndexBuffer, Material, PerspectiveCamera, Shader, ShaderDataType, VertexArray, VertexBuffer,
};
use crate::sandbox::close_on_escape;

const FOG_SOURCE: &str = include_str!("shaders/fog.wgsl");

const TEAL: Vec4 = Vec4::new(0.0, 0.5, 0.5, 1.0);
const CAMERA_DISTANCE: f32 = 2.0;

#[rustfmt::skip]
const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0,
     0.5, -0.5, 0.0,
     0.0,  0.5, 0.0,
];

/// Triangles receding from the camera so the fog gradient is visible.
const TRIANGLE_OFFSETS: [Vec3; 4] = [
    Vec3::new(-1.2, 0.0, 0.0),
    Vec3::new(-0.4, 0.0, -1.0),
    Vec3::new(0.4, 0.0, -2.0),
    Vec3::new(1.2, 0.0, -3.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FogMode {
    #[default]
    None,
    Linear,
    Exp,
    Exp2,
}

impl FogMode {
    pub const ALL: [FogMode; 4] = [FogMode::None, FogMode::Linear, FogMode::Exp, FogMode::Exp2];

    pub fn next(self) -> Self {
        match self {
            FogMode::None => FogMode::Linear,
            FogMode::Linear => FogMode::Exp,
            FogMode::Exp => FogMode::Exp2,
            FogMode::Exp2 => FogMode::None,
        }
    }

    /// Value of the mode parameter read by the fog shader.
    pub fn index(self) -> u32 {
        match self {
            FogMode::None => 0,
            FogMode::Linear => 1,
            FogMode::Exp => 2,
            FogMode::Exp2 => 3,
        }
    }
}

impl fmt::Display for FogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FogMode::None => "none",
            FogMode::Linear => "linear",
            FogMode::Exp => "exp",
            FogMode::Exp2 => "exp2",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSettings {
    pub mode: FogMode,
    pub density: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            mode: FogMode::None,
            density: 0.25,
            near: 1.0,
            far: 5.0,
        }
    }
}

impl FogSettings {
    /// How much of the fog color replaces the surface color at view-space
    /// `depth`, in `[0, 1]`. Mirrors the fog shader.
    pub fn factor(&self, depth: f32) -> f32 {
        match self.mode {
            FogMode::None => 0.0,
            FogMode::Linear => ((depth - self.near) / (self.far - self.near).max(0.0001)).clamp(0.0, 1.0),
            FogMode::Exp => 1.0 - (-self.density * depth).exp(),
            FogMode::Exp2 => 1.0 - (-(self.density * depth).powi(2)).exp(),
        }
    }

    pub fn params(&self) -> Vec4 {
        Vec4::new(self.mode.index() as f32, self.density, self.near, self.far)
    }
}

struct Scene {
    shader: Arc<Shader>,
    triangle: Arc<VertexArray>,
}

/// Teal triangles under selectable distance fog. F cycles the fog mode.
pub struct FogLayer {
    fog: FogSettings,
    camera: PerspectiveCamera,
    scene: Option<Scene>,
}

impl FogLayer {
    pub fn new() -> Self {
        let mut camera = PerspectiveCamera::new(60.0, 16.0 / 9.0, 0.1, 10.0);
        camera.set_view(Mat4::from_translation(Vec3::new(0.0, 0.0, -CAMERA_DISTANCE)));
        Self {
            fog: FogSettings::default(),
            camera,
            scene: None,
        }
    }

    pub fn fog(&self) -> &FogSettings {
        &self.fog
    }

    fn on_key_pressed(&mut self, e: &KeyPressedEvent) -> bool {
        if e.key != KeyCode::KeyF {
            return false;
        }
        self.fog.mode = self.fog.mode.next();
        info!("Fog mode: {}", self.fog.mode);
        true
    }
}

impl Default for FogLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for FogLayer {
    fn name(&self) -> &str {
        "Fog"
    }

    fn on_attach(&mut self, ctx: &mut Context) -> Result<()> {
        let device = ctx.device();
        let mut triangle = VertexArray::new();
        let layout = BufferLayout::from([(ShaderDataType::Float3, "a_Position")]);
        triangle.add_vertex_buffer(Arc::new(VertexBuffer::from_data(device, &TRIANGLE_VERTICES, layout)))?;
        triangle.set_index_buffer(Arc::new(IndexBuffer::new(device, &[0, 1, 2])));

        self.camera.set_aspect_ratio(ctx.aspect_ratio());
        self.scene = Some(Scene {
            shader: Arc::new(Shader::from_source(device, "Fog", FOG_SOURCE)?),
            triangle: Arc::new(triangle),
        });
        Ok(())
    }

    fn on_detach(&mut self) {
        self.scene = None;
    }

    fn on_update(&mut self, _ts: Timestep, ctx: &mut Context) -> Result<()> {
        let Some(scene) = &self.scene else {
            return Ok(());
        };

        let renderer = &mut *ctx.renderer;
        renderer.set_clear_color(Vec4::new(0.08, 0.08, 0.09, 1.0))?;
        renderer.clear()?;
        // Fog reads view-space depth: transforms are model-view matrices.
        renderer.begin_scene_with(self.camera.projection())?;
        let material = Material::color(TEAL).with_params(self.fog.params());
        for offset in TRIANGLE_OFFSETS {
            let model_view = self.camera.view() * Mat4::from_translation(offset);
            renderer.submit_with(&scene.shader, &scene.triangle, model_view, &material)?;
        }
        renderer.end_scene()
    }

    fn on_event(&mut self, event: &mut Event, ctx: &mut Context) {
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<KeyPressedEvent>(|e| self.on_key_pressed(e));
        dispatcher.dispatch::<WindowResizeEvent>(|e| {
            if e.height > 0 {
                self.camera.set_aspect_ratio(e.width as f32 / e.height as f32);
            }
            false
        });
        close_on_escape(event, ctx);
    }

    fn on_ui_render(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Fog");
            for mode in FogMode::ALL {
                ui.selectable_value(&mut self.fog.mode, mode, mode.to_string());
            }
        });
        ui.add(egui::Slider::new(&mut self.fog.density, 0.0..=1.0).text("Density"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_cycle_back_to_none() {
        let mut mode = FogMode::None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.next();
            seen.push(mode.index());
        }
        assert_eq!(seen, [1, 2, 3, 0]);

        let listed: Vec<u32> = FogMode::ALL.iter().map(|m| m.index()).collect();
        assert_eq!(listed, [0, 1, 2, 3]);
    }

    #[test]
    fn linear_fog_ramps_between_near_and_far() {
        let fog = FogSettings {
            mode: FogMode::Linear,
            ..Default::default()
        };
        assert_eq!(fog.factor(0.5), 0.0);
        assert!((fog.factor(CAMERA_DISTANCE) - 0.25).abs() < 1e-6);
        assert_eq!(fog.factor(9.0), 1.0);
    }

    #[test]
    fn exponential_modes_thicken_with_depth() {
        let exp = FogSettings {
            mode: FogMode::Exp,
            ..Default::default()
        };
        let exp2 = FogSettings {
            mode: FogMode::Exp2,
            ..Default::default()
        };
        assert!((exp.factor(2.0) - (1.0 - (-0.5f32).exp())).abs() < 1e-6);
        assert!((exp2.factor(2.0) - (1.0 - (-0.25f32).exp())).abs() < 1e-6);
        assert!(exp.factor(4.0) > exp.factor(2.0));
        assert_eq!(FogSettings::default().factor(4.0), 0.0);
    }

    #[test]
    fn f_key_cycles_mode() {
        let mut layer = FogLayer::new();
        let handled = layer.on_key_pressed(&KeyPressedEvent {
            key: KeyCode::KeyF,
            repeat_count: 0,
        });
        assert!(handled);
        assert_eq!(layer.fog().mode, FogMode::Linear);
        assert_eq!(layer.fog().params(), Vec4::new(1.0, 0.25, 1.0, 5.0));
    }

    #[test]
    fn camera_sits_two_units_back() {
        let layer = FogLayer::new();
        let view_position = layer.camera.view() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(-view_position.z, CAMERA_DISTANCE);
    }
}
