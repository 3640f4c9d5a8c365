use std::collections::VecDeque;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec4};
use log::debug;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::engine::core::{Context, Layer, Timestep};
use crate::engine::error::Result;
use crate::engine::events::{Event, EventDispatcher, KeyPressedEvent, MouseScrolledEvent, WindowResizeEvent};
use crate::engine::graphics::{
    BufferLayout, IndexBuffer, Material, OrthographicCameraController, Shader, ShaderDataType, VertexArray,
    VertexBuffer,
};
use crate::sandbox::close_on_escape;

const BRUSH_SOURCE: &str = include_str!("shaders/brush.wgsl");

pub const MAX_STAMPS: usize = 4096;
pub const STAMP_LIFETIME: f32 = 2.0;
const MIN_SIZE: f32 = 0.02;
const MAX_SIZE: f32 = 1.0;
/// Stamps are laid this fraction of the brush size apart.
const SPACING: f32 = 0.25;
const HUE_STEP: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamp {
    pub position: Vec2,
    pub size: f32,
    pub color: Vec4,
    pub age: f32,
}

impl Stamp {
    /// Fraction of the lifetime already spent, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        (self.age / STAMP_LIFETIME).clamp(0.0, 1.0)
    }

    /// Fades out and shrinks to half size over the lifetime.
    pub fn current_color(&self) -> Vec4 {
        self.color * Vec4::new(1.0, 1.0, 1.0, 1.0 - self.progress())
    }

    pub fn current_size(&self) -> f32 {
        self.size * (1.0 - 0.5 * self.progress())
    }
}

/// Stroke state and the live stamps it produced.
#[derive(Debug)]
pub struct Brush {
    size: f32,
    hue: f32,
    last_stamp: Option<Vec2>,
    stamps: VecDeque<Stamp>,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            size: 0.1,
            hue: 0.0,
            last_stamp: None,
            stamps: VecDeque::with_capacity(MAX_STAMPS),
        }
    }
}

impl Brush {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size.clamp(MIN_SIZE, MAX_SIZE);
    }

    pub fn spacing(&self) -> f32 {
        self.size * SPACING
    }

    pub fn stamps(&self) -> &VecDeque<Stamp> {
        &self.stamps
    }

    pub fn is_stroking(&self) -> bool {
        self.last_stamp.is_some()
    }

    pub fn begin_stroke(&mut self, position: Vec2) {
        self.place(position);
    }

    /// Extends the stroke to `position`, stamping every `spacing` units along
    /// the way. Starts a new stroke when none is active.
    pub fn drag_to(&mut self, position: Vec2) {
        let Some(mut last) = self.last_stamp else {
            self.begin_stroke(position);
            return;
        };
        let spacing = self.spacing();
        let mut remaining = position.distance(last);
        if remaining < spacing {
            return;
        }
        let direction = (position - last) / remaining;
        while remaining >= spacing {
            last += direction * spacing;
            remaining -= spacing;
            self.place(last);
        }
    }

    pub fn end_stroke(&mut self) {
        self.last_stamp = None;
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
        self.last_stamp = None;
    }

    /// Ages every stamp and drops the expired ones.
    pub fn update(&mut self, ts: Timestep) {
        for stamp in &mut self.stamps {
            stamp.age += ts.seconds();
        }
        self.stamps.retain(|s| s.age < STAMP_LIFETIME);
    }

    fn place(&mut self, position: Vec2) {
        if self.stamps.len() == MAX_STAMPS {
            self.stamps.pop_front();
        }
        self.stamps.push_back(Stamp {
            position,
            size: self.size,
            color: hue_to_rgb(self.hue).extend(1.0),
            age: 0.0,
        });
        self.hue = (self.hue + HUE_STEP).fract();
        self.last_stamp = Some(position);
    }
}

/// Fully saturated color for a hue in `[0, 1)`.
pub fn hue_to_rgb(hue: f32) -> glam::Vec3 {
    let h = hue.rem_euclid(1.0) * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    match h as u32 {
        0 => glam::Vec3::new(1.0, x, 0.0),
        1 => glam::Vec3::new(x, 1.0, 0.0),
        2 => glam::Vec3::new(0.0, 1.0, x),
        3 => glam::Vec3::new(0.0, x, 1.0),
        4 => glam::Vec3::new(x, 0.0, 1.0),
        _ => glam::Vec3::new(1.0, 0.0, x),
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BrushVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub tex_coord: [f32; 2],
}

/// Four vertices per stamp, oldest first so newer stamps paint over them.
pub fn stamp_vertices(stamps: &VecDeque<Stamp>) -> Vec<BrushVertex> {
    const CORNERS: [(f32, f32); 4] = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
    let mut vertices = Vec::with_capacity(stamps.len() * 4);
    for stamp in stamps {
        let size = stamp.current_size();
        let color = stamp.current_color().to_array();
        for (x, y) in CORNERS {
            vertices.push(BrushVertex {
                position: [stamp.position.x + x * size, stamp.position.y + y * size, 0.0],
                color,
                tex_coord: [x + 0.5, y + 0.5],
            });
        }
    }
    vertices
}

fn quad_indices(quads: usize) -> Vec<u32> {
    (0..quads as u32)
        .flat_map(|q| {
            let base = q * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect()
}

fn brush_layout() -> BufferLayout {
    BufferLayout::from([
        (ShaderDataType::Float3, "a_Position"),
        (ShaderDataType::Float4, "a_Color"),
        (ShaderDataType::Float2, "a_TexCoord"),
    ])
}

struct Scene {
    shader: Arc<Shader>,
    vertices: Arc<VertexBuffer>,
    vertex_array: Arc<VertexArray>,
}

/// Particle-like painting: hold the left mouse button and drag to lay down
/// stamps that fade and shrink. Scroll resizes the brush, C clears.
pub struct BrushLayer {
    brush: Brush,
    camera_controller: OrthographicCameraController,
    scene: Option<Scene>,
}

impl BrushLayer {
    pub fn new() -> Self {
        Self {
            brush: Brush::new(),
            camera_controller: OrthographicCameraController::new(16.0 / 9.0, false),
            scene: None,
        }
    }

    fn on_mouse_scrolled(&mut self, e: &MouseScrolledEvent) -> bool {
        self.brush.set_size(self.brush.size() * 1.1f32.powf(e.y_offset));
        debug!("Brush size: {:.3}", self.brush.size());
        true
    }

    fn on_key_pressed(&mut self, e: &KeyPressedEvent) -> bool {
        if e.key != KeyCode::KeyC {
            return false;
        }
        self.brush.clear();
        true
    }
}

impl Default for BrushLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for BrushLayer {
    fn name(&self) -> &str {
        "Brush"
    }

    fn on_attach(&mut self, ctx: &mut Context) -> Result<()> {
        let device = ctx.device();
        let layout = brush_layout();
        let capacity = (MAX_STAMPS * 4) as u64 * layout.stride() as u64;
        let vertices = Arc::new(VertexBuffer::with_capacity(device, capacity, layout));

        let mut vertex_array = VertexArray::new();
        vertex_array.add_vertex_buffer(Arc::clone(&vertices))?;
        vertex_array.set_index_buffer(Arc::new(IndexBuffer::new(device, &quad_indices(MAX_STAMPS))));

        self.camera_controller = OrthographicCameraController::new(ctx.aspect_ratio(), false);
        self.scene = Some(Scene {
            shader: Arc::new(Shader::from_source(device, "Brush", BRUSH_SOURCE)?),
            vertices,
            vertex_array: Arc::new(vertex_array),
        });
        Ok(())
    }

    fn on_detach(&mut self) {
        self.scene = None;
    }

    fn on_update(&mut self, ts: Timestep, ctx: &mut Context) -> Result<()> {
        self.camera_controller.on_update(ts, ctx.input);
        self.brush.update(ts);

        if ctx.input.is_mouse_button_pressed(MouseButton::Left) {
            let cursor = self.camera_controller.screen_to_world(ctx.input.mouse_position(), ctx.window_size());
            self.brush.drag_to(cursor);
        } else {
            self.brush.end_stroke();
        }

        let Some(scene) = &self.scene else {
            return Ok(());
        };
        scene.vertices.set_data(ctx.queue(), &stamp_vertices(self.brush.stamps()))?;

        let renderer = &mut *ctx.renderer;
        renderer.set_clear_color(Vec4::new(0.05, 0.05, 0.07, 1.0))?;
        renderer.clear()?;
        renderer.begin_scene(self.camera_controller.camera())?;
        let index_count = (self.brush.stamps().len() * 6) as u32;
        if index_count > 0 {
            renderer.submit_indexed(&scene.shader, &scene.vertex_array, Mat4::IDENTITY, &Material::default(), index_count)?;
        }
        renderer.end_scene()
    }

    fn on_event(&mut self, event: &mut Event, ctx: &mut Context) {
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<MouseScrolledEvent>(|e| self.on_mouse_scrolled(e));
        dispatcher.dispatch::<KeyPressedEvent>(|e| self.on_key_pressed(e));
        if event.get::<WindowResizeEvent>().is_some() {
            self.camera_controller.on_event(event);
        }
        close_on_escape(event, ctx);
    }

    fn on_ui_render(&mut self, ui: &mut egui::Ui) {
        ui.label(format!("Stamps: {}", self.brush.stamps().len()));
        let mut size = self.brush.size();
        if ui
            .add(egui::Slider::new(&mut size, MIN_SIZE..=MAX_SIZE).logarithmic(true).text("Brush size"))
            .changed()
        {
            self.brush.set_size(size);
        }
        if ui.button("Clear").clicked() {
            self.brush.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_stamps_at_fixed_spacing() {
        let mut brush = Brush::new();
        brush.set_size(0.4);
        brush.begin_stroke(Vec2::ZERO);
        brush.drag_to(Vec2::new(0.35, 0.0));

        let xs: Vec<f32> = brush.stamps().iter().map(|s| s.position.x).collect();
        assert_eq!(xs.len(), 4);
        for (i, x) in xs.iter().enumerate() {
            assert!((x - i as f32 * 0.1).abs() < 1e-5);
        }

        // Short moves accumulate from the last stamp.
        brush.drag_to(Vec2::new(0.38, 0.0));
        assert_eq!(brush.stamps().len(), 4);
        brush.drag_to(Vec2::new(0.41, 0.0));
        assert_eq!(brush.stamps().len(), 5);
    }

    #[test]
    fn drag_without_stroke_starts_one() {
        let mut brush = Brush::new();
        assert!(!brush.is_stroking());
        brush.drag_to(Vec2::ONE);
        assert!(brush.is_stroking());
        assert_eq!(brush.stamps()[0].position, Vec2::ONE);
        brush.end_stroke();
        assert!(!brush.is_stroking());
    }

    #[test]
    fn stamps_fade_shrink_and_expire() {
        let mut brush = Brush::new();
        brush.begin_stroke(Vec2::ZERO);
        brush.update(Timestep::new(STAMP_LIFETIME / 2.0));

        let stamp = brush.stamps()[0];
        assert!((stamp.current_color().w - 0.5).abs() < 1e-6);
        assert!((stamp.current_size() - stamp.size * 0.75).abs() < 1e-6);

        brush.update(Timestep::new(STAMP_LIFETIME));
        assert!(brush.stamps().is_empty());
    }

    #[test]
    fn size_is_clamped() {
        let mut brush = Brush::new();
        brush.set_size(10.0);
        assert_eq!(brush.size(), MAX_SIZE);
        brush.set_size(0.0);
        assert_eq!(brush.size(), MIN_SIZE);
    }

    #[test]
    fn oldest_stamp_is_dropped_at_capacity() {
        let mut brush = Brush::new();
        for i in 0..=MAX_STAMPS {
            brush.begin_stroke(Vec2::new(i as f32, 0.0));
        }
        assert_eq!(brush.stamps().len(), MAX_STAMPS);
        assert_eq!(brush.stamps()[0].position.x, 1.0);

        for i in 0..10 {
            brush.begin_stroke(Vec2::new(-(i as f32), 0.0));
        }
        assert_eq!(brush.stamps().len(), MAX_STAMPS);
        assert_eq!(brush.stamps().front().map(|s| s.position.x), Some(11.0));
        assert_eq!(brush.stamps().back().map(|s| s.position.x), Some(-9.0));
    }

    #[test]
    fn vertices_cover_each_stamp() {
        let mut brush = Brush::new();
        brush.set_size(0.2);
        brush.begin_stroke(Vec2::new(1.0, 1.0));
        let vertices = stamp_vertices(brush.stamps());
        assert_eq!(vertices.len(), 4);
        let corner = glam::Vec3::from_array(vertices[0].position);
        assert!(corner.abs_diff_eq(glam::Vec3::new(0.9, 0.9, 0.0), 1e-6));
        assert_eq!(vertices[2].tex_coord, [1.0, 1.0]);
        assert_eq!(std::mem::size_of::<BrushVertex>() as u32, brush_layout().stride());
        assert_eq!(&quad_indices(2)[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn hues_cover_primaries() {
        assert_eq!(hue_to_rgb(0.0), glam::Vec3::new(1.0, 0.0, 0.0));
        assert!(hue_to_rgb(1.0 / 3.0).abs_diff_eq(glam::Vec3::new(0.0, 1.0, 0.0), 1e-5));
        assert!(hue_to_rgb(2.0 / 3.0).abs_diff_eq(glam::Vec3::new(0.0, 0.0, 1.0), 1e-5));
    }
}
