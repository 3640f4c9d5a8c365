use std::sync::Arc;

use glam::{Mat3, Mat4, Vec3, Vec4};
use winit::keyboard::KeyCode;

use crate::engine::core::{Context, Layer, Timestep};
use crate::engine::error::Result;
use crate::engine::events::{Event, EventDispatcher, MouseScrolledEvent, WindowResizeEvent};
use crate::engine::graphics::{
    builtin, BufferLayout, IndexBuffer, Material, PerspectiveCamera, Shader, ShaderDataType, ShaderLibrary,
    VertexArray, VertexBuffer,
};
use crate::sandbox::close_on_escape;

const SECTION_SOURCE: &str = include_str!("shaders/section.wgsl");

const HALF_EXTENT: f32 = 0.5;
/// A plane cuts a cube in at most six points.
const MAX_CUT_POINTS: usize = 6;
const SCROLL_STEP: f32 = 0.05;
const TILT_SPEED: f32 = 45.0;

const CUBE_COLOR: Vec4 = Vec4::new(0.3, 0.6, 0.9, 1.0);
const CAP_COLOR: Vec4 = Vec4::new(0.9, 0.5, 0.2, 1.0);
const OUTLINE_COLOR: Vec4 = Vec4::ONE;

/// Section plane `dot(normal, p) == offset`, oriented by yaw (around Y) and
/// pitch (around Z) from +X.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPlane {
    pub yaw: f32,
    pub pitch: f32,
    pub offset: f32,
}

impl Default for SectionPlane {
    fn default() -> Self {
        Self {
            yaw: 30.0,
            pitch: 20.0,
            offset: 0.0,
        }
    }
}

impl SectionPlane {
    pub fn normal(&self) -> Vec3 {
        Mat3::from_rotation_y(self.yaw.to_radians()) * Mat3::from_rotation_z(self.pitch.to_radians()) * Vec3::X
    }

    /// Moves the plane along its normal, never past the cube's corners.
    pub fn shift(&mut self, amount: f32) {
        let limit = Self::offset_limit();
        self.offset = (self.offset + amount).clamp(-limit, limit);
    }

    /// Largest offset that still touches the cube.
    pub fn offset_limit() -> f32 {
        HALF_EXTENT * 3f32.sqrt()
    }

    pub fn tilt(&mut self, yaw: f32, pitch: f32) {
        self.yaw = (self.yaw + yaw).rem_euclid(360.0);
        self.pitch = (self.pitch + pitch).clamp(-89.0, 89.0);
    }

    /// Shader parameters: normal in xyz, offset in w.
    pub fn params(&self) -> Vec4 {
        self.normal().extend(self.offset)
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal().dot(point) - self.offset
    }
}

fn cube_corner(index: usize, half: f32) -> Vec3 {
    let pick = |bit: usize| if index & bit != 0 { half } else { -half };
    Vec3::new(pick(1), pick(2), pick(4))
}

/// Intersection of `plane` with the axis-aligned cube of half size `half`,
/// ordered around the polygon. Empty when the plane misses the cube or only
/// touches an edge or corner.
pub fn cut_polygon(plane: &SectionPlane, half: f32) -> Vec<Vec3> {
    let normal = plane.normal();
    let mut points: Vec<Vec3> = Vec::with_capacity(MAX_CUT_POINTS);
    let mut add = |p: Vec3| {
        if !points.iter().any(|q| q.distance_squared(p) < 1e-10) {
            points.push(p);
        }
    };

    for i in 0..8 {
        for bit in [1, 2, 4] {
            if i & bit != 0 {
                continue;
            }
            let (a, b) = (cube_corner(i, half), cube_corner(i | bit, half));
            let (da, db) = (plane.signed_distance(a), plane.signed_distance(b));
            if da == 0.0 {
                add(a);
            }
            if db == 0.0 {
                add(b);
            }
            if da * db < 0.0 {
                add(a + (b - a) * (da / (da - db)));
            }
        }
    }

    if points.len() < 3 {
        return Vec::new();
    }

    let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    let u = normal.any_orthonormal_vector();
    let v = normal.cross(u);
    points.sort_by(|a, b| {
        let angle = |p: &Vec3| (*p - center).dot(v).atan2((*p - center).dot(u));
        angle(a).total_cmp(&angle(b))
    });
    points
}

/// Triangle fan indices for a convex polygon with `points` vertices.
pub fn fan_indices(points: usize) -> Vec<u32> {
    (1..points.saturating_sub(1) as u32).flat_map(|i| [0, i, i + 1]).collect()
}

#[rustfmt::skip]
fn cube_vertices(half: f32) -> Vec<f32> {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];
    let mut vertices = Vec::with_capacity(6 * 4 * 6);
    for (normal, s, t) in faces {
        for (a, b) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (normal + s * a + t * b) * half;
            vertices.extend_from_slice(&[p.x, p.y, p.z, normal.x, normal.y, normal.z]);
        }
    }
    vertices
}

fn cube_indices() -> Vec<u32> {
    (0..6u32).flat_map(|f| [0, 1, 2, 2, 3, 0].map(|i| f * 4 + i)).collect()
}

struct Scene {
    shaders: ShaderLibrary,
    cube: Arc<VertexArray>,
    cap_vertices: Arc<VertexBuffer>,
    cap: Arc<VertexArray>,
    outline_vertices: Arc<VertexBuffer>,
    outline: Arc<VertexArray>,
}

/// A unit cube sliced by a movable plane. Scroll moves the plane, the arrow
/// keys tilt it.
pub struct CrossSectionLayer {
    plane: SectionPlane,
    camera: PerspectiveCamera,
    cut: Vec<Vec3>,
    scene: Option<Scene>,
}

impl CrossSectionLayer {
    pub fn new() -> Self {
        let mut camera = PerspectiveCamera::new(45.0, 16.0 / 9.0, 0.1, 100.0);
        camera.set_position(Vec3::new(2.0, 1.6, 2.4));
        let plane = SectionPlane::default();
        Self {
            cut: cut_polygon(&plane, HALF_EXTENT),
            plane,
            camera,
            scene: None,
        }
    }

    pub fn plane(&self) -> &SectionPlane {
        &self.plane
    }

    fn on_mouse_scrolled(&mut self, e: &MouseScrolledEvent) -> bool {
        self.plane.shift(e.y_offset * SCROLL_STEP);
        self.cut = cut_polygon(&self.plane, HALF_EXTENT);
        true
    }
}

impl Default for CrossSectionLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for CrossSectionLayer {
    fn name(&self) -> &str {
        "Cross Section"
    }

    fn on_attach(&mut self, ctx: &mut Context) -> Result<()> {
        let device = ctx.device();
        let mut shaders = builtin::shader_library(device)?;
        shaders.add(Shader::from_source(device, "Section", SECTION_SOURCE)?)?;

        let cube_layout = BufferLayout::from([(ShaderDataType::Float3, "a_Position"), (ShaderDataType::Float3, "a_Normal")]);
        let mut cube = VertexArray::new();
        cube.add_vertex_buffer(Arc::new(VertexBuffer::from_data(device, &cube_vertices(HALF_EXTENT), cube_layout)))?;
        cube.set_index_buffer(Arc::new(IndexBuffer::new(device, &cube_indices())));

        let point_layout = || BufferLayout::from([(ShaderDataType::Float3, "a_Position")]);
        let point_size = std::mem::size_of::<[f32; 3]>() as u64;

        let cap_vertices = Arc::new(VertexBuffer::with_capacity(device, MAX_CUT_POINTS as u64 * point_size, point_layout()));
        let mut cap = VertexArray::new();
        cap.add_vertex_buffer(Arc::clone(&cap_vertices))?;
        cap.set_index_buffer(Arc::new(IndexBuffer::new(device, &fan_indices(MAX_CUT_POINTS))));

        // Closed loop: the first point is repeated at the end.
        let outline_vertices =
            Arc::new(VertexBuffer::with_capacity(device, (MAX_CUT_POINTS as u64 + 1) * point_size, point_layout()));
        let loop_indices: Vec<u32> = (0..=MAX_CUT_POINTS as u32).collect();
        let mut outline = VertexArray::new();
        outline.add_vertex_buffer(Arc::clone(&outline_vertices))?;
        outline.set_index_buffer(Arc::new(IndexBuffer::new(device, &loop_indices)));
        outline.set_topology(wgpu::PrimitiveTopology::LineStrip);

        self.camera.set_aspect_ratio(ctx.aspect_ratio());
        self.scene = Some(Scene {
            shaders,
            cube: Arc::new(cube),
            cap_vertices,
            cap: Arc::new(cap),
            outline_vertices,
            outline: Arc::new(outline),
        });
        Ok(())
    }

    fn on_detach(&mut self) {
        self.scene = None;
    }

    fn on_update(&mut self, ts: Timestep, ctx: &mut Context) -> Result<()> {
        let input = ctx.input;
        let axis = |negative: KeyCode, positive: KeyCode| {
            (input.is_key_pressed(positive) as i32 - input.is_key_pressed(negative) as i32) as f32
        };
        let yaw = axis(KeyCode::ArrowLeft, KeyCode::ArrowRight);
        let pitch = axis(KeyCode::ArrowDown, KeyCode::ArrowUp);
        if yaw != 0.0 || pitch != 0.0 {
            let step = TILT_SPEED * ts.seconds();
            self.plane.tilt(yaw * step, pitch * step);
            self.cut = cut_polygon(&self.plane, HALF_EXTENT);
        }

        let Some(scene) = &self.scene else {
            return Ok(());
        };
        let cut: Vec<[f32; 3]> = self.cut.iter().map(|p| p.to_array()).collect();
        scene.cap_vertices.set_data(ctx.queue(), &cut)?;
        let mut outline = cut.clone();
        outline.extend(cut.first().copied());
        scene.outline_vertices.set_data(ctx.queue(), &outline)?;

        let renderer = &mut *ctx.renderer;
        renderer.set_clear_color(Vec4::new(0.1, 0.1, 0.12, 1.0))?;
        renderer.clear()?;
        renderer.begin_scene(&self.camera)?;

        let section = scene.shaders.get("Section")?;
        let cube_material = Material::color(CUBE_COLOR).with_params(self.plane.params());
        renderer.submit_with(&section, &scene.cube, Mat4::IDENTITY, &cube_material)?;

        if !cut.is_empty() {
            let flat_color = scene.shaders.get(builtin::FLAT_COLOR)?;
            let cap_count = fan_indices(cut.len()).len() as u32;
            renderer.submit_indexed(&flat_color, &scene.cap, Mat4::IDENTITY, &Material::color(CAP_COLOR), cap_count)?;
            renderer.submit_indexed(
                &flat_color,
                &scene.outline,
                Mat4::IDENTITY,
                &Material::color(OUTLINE_COLOR),
                outline.len() as u32,
            )?;
        }
        renderer.end_scene()
    }

    fn on_event(&mut self, event: &mut Event, ctx: &mut Context) {
        let mut dispatcher = EventDispatcher::new(event);
        dispatcher.dispatch::<MouseScrolledEvent>(|e| self.on_mouse_scrolled(e));
        dispatcher.dispatch::<WindowResizeEvent>(|e| {
            if e.height > 0 {
                self.camera.set_aspect_ratio(e.width as f32 / e.height as f32);
            }
            false
        });
        close_on_escape(event, ctx);
    }

    fn on_ui_render(&mut self, ui: &mut egui::Ui) {
        let limit = SectionPlane::offset_limit();
        let mut plane = self.plane;
        ui.add(egui::Slider::new(&mut plane.yaw, 0.0..=360.0).text("Yaw"));
        ui.add(egui::Slider::new(&mut plane.pitch, -89.0..=89.0).text("Pitch"));
        ui.add(egui::Slider::new(&mut plane.offset, -limit..=limit).text("Offset"));
        if plane != self.plane {
            self.plane = plane;
            self.cut = cut_polygon(&self.plane, HALF_EXTENT);
        }
        ui.label(format!("Cut: {}-gon", self.cut.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_plane(offset: f32) -> SectionPlane {
        SectionPlane {
            yaw: 0.0,
            pitch: 0.0,
            offset,
        }
    }

    fn area(points: &[Vec3]) -> f32 {
        let mut sum = Vec3::ZERO;
        for i in 1..points.len() - 1 {
            sum += (points[i] - points[0]).cross(points[i + 1] - points[0]);
        }
        sum.length() * 0.5
    }

    #[test]
    fn axis_aligned_cut_is_a_unit_square() {
        let cut = cut_polygon(&axis_plane(0.2), HALF_EXTENT);
        assert_eq!(cut.len(), 4);
        assert!(cut.iter().all(|p| (p.x - 0.2).abs() < 1e-5));
        assert!((area(&cut) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn diagonal_cut_through_center_is_a_hexagon() {
        let plane = SectionPlane {
            yaw: -45.0,
            pitch: 35.264_39,
            offset: 0.0,
        };
        assert!(plane.normal().abs_diff_eq(Vec3::ONE.normalize(), 1e-4));
        let cut = cut_polygon(&plane, HALF_EXTENT);
        assert_eq!(cut.len(), 6);
    }

    #[test]
    fn points_are_ordered_around_the_polygon() {
        let plane = SectionPlane::default();
        let cut = cut_polygon(&plane, HALF_EXTENT);
        assert!(cut.len() >= 3);
        let normal = plane.normal();
        for i in 0..cut.len() {
            let (a, b, c) = (cut[i], cut[(i + 1) % cut.len()], cut[(i + 2) % cut.len()]);
            assert!((b - a).cross(c - b).dot(normal) > -1e-5);
        }
        for p in &cut {
            assert!(plane.signed_distance(*p).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_outside_the_cube_cuts_nothing() {
        assert!(cut_polygon(&axis_plane(0.8), HALF_EXTENT).is_empty());
        let mut plane = axis_plane(0.0);
        plane.shift(10.0);
        assert!((plane.offset - HALF_EXTENT * 3f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn fan_covers_polygon() {
        assert_eq!(fan_indices(4), [0, 1, 2, 0, 2, 3]);
        assert_eq!(fan_indices(6).len(), 12);
        assert!(fan_indices(2).is_empty());
    }

    #[test]
    fn cube_faces_point_outward() {
        let vertices = cube_vertices(HALF_EXTENT);
        assert_eq!(vertices.len(), 24 * 6);
        for vertex in vertices.chunks(6) {
            let position = Vec3::new(vertex[0], vertex[1], vertex[2]);
            let normal = Vec3::new(vertex[3], vertex[4], vertex[5]);
            assert!((position.dot(normal) - HALF_EXTENT).abs() < 1e-6);
        }
        assert_eq!(cube_indices().len(), 36);
        assert!(cube_indices().iter().all(|&i| i < 24));
    }
}
