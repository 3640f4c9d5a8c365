use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use crate::engine::core::{Context, Layer, Timestep};
use crate::engine::error::Result;
use crate::engine::events::{Event, EventDispatcher, WindowResizeEvent};
use crate::engine::graphics::texture::checkerboard;
use crate::engine::graphics::{builtin, Material, PerspectiveCamera, Shader, Texture2D, VertexArray};
use crate::sandbox::close_on_escape;

const TEXTURE_SIZE: u32 = 256;
const CHECK_SIZE: u32 = 16;
const CHECKER_FILTER: wgpu::FilterMode = wgpu::FilterMode::Linear;
const REPEAT: f32 = 2.0;
/// 0.5 degrees every 16 ms.
const DEGREES_PER_SECOND: f32 = 0.5 / 0.016;
const NEAR_CLIP: f32 = 1.5;
const FAR_CLIP: f32 = 100.0;

/// Advances the quad's angle by `ts`, wrapping into `[0, 360)`.
pub fn advance_angle(angle: f32, ts: Timestep) -> f32 {
    (angle + DEGREES_PER_SECOND * ts.seconds()).rem_euclid(360.0)
}

/// Spins around Y, and around X at half the rate, four units in front of
/// the camera. The unit quad is scaled to span `[-1, 1]`.
pub fn quad_transform(angle: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, -4.0))
        * Mat4::from_rotation_y(angle.to_radians())
        * Mat4::from_rotation_x((angle * 0.5).to_radians())
        * Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0))
}

/// Vertical field of view of a frustum with a half-height of 1 at `near`.
fn frustum_fov(near: f32) -> f32 {
    2.0 * (1.0 / near).atan().to_degrees()
}

struct Scene {
    shader: Arc<Shader>,
    quad: Arc<VertexArray>,
    texture: Arc<Texture2D>,
}

/// A procedural checkerboard repeated twice over a rotating quad.
pub struct TexturedQuadLayer {
    angle: f32,
    camera: PerspectiveCamera,
    scene: Option<Scene>,
}

impl TexturedQuadLayer {
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            camera: PerspectiveCamera::new(frustum_fov(NEAR_CLIP), 16.0 / 9.0, NEAR_CLIP, FAR_CLIP),
            scene: None,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl Default for TexturedQuadLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for TexturedQuadLayer {
    fn name(&self) -> &str {
        "Textured Quad"
    }

    fn on_attach(&mut self, ctx: &mut Context) -> Result<()> {
        let device = ctx.device();
        let shaders = builtin::shader_library(device)?;

        let texture = Texture2D::with_filter(device, TEXTURE_SIZE, TEXTURE_SIZE, CHECKER_FILTER);
        texture.set_data(ctx.queue(), &checkerboard(TEXTURE_SIZE, TEXTURE_SIZE, CHECK_SIZE))?;

        self.camera.set_aspect_ratio(ctx.aspect_ratio());
        self.scene = Some(Scene {
            shader: shaders.get(builtin::TEXTURE)?,
            quad: Arc::new(builtin::quad(device)?),
            texture: Arc::new(texture),
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
        self.angle = advance_angle(self.angle, ts);

        let renderer = &mut *ctx.renderer;
        renderer.set_clear_color(Vec4::new(0.1, 0.12, 0.15, 1.0))?;
        renderer.clear()?;
        renderer.begin_scene(&self.camera)?;
        let material = Material::textured(Arc::clone(&scene.texture)).with_params(Vec4::new(REPEAT, 0.0, 0.0, 0.0));
        renderer.submit_with(&scene.shader, &scene.quad, quad_transform(self.angle), &material)?;
        renderer.end_scene()
    }

    fn on_event(&mut self, event: &mut Event, ctx: &mut Context) {
        EventDispatcher::new(event).dispatch::<WindowResizeEvent>(|e| {
            if e.height > 0 {
                self.camera.set_aspect_ratio(e.width as f32 / e.height as f32);
            }
            false
        });
        close_on_escape(event, ctx);
    }

    fn on_ui_render(&mut self, ui: &mut egui::Ui) {
        ui.label(format!("Angle: {:.1}°", self.angle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4Swizzles;

    #[test]
    fn angle_advances_half_a_degree_per_tick() {
        let angle = advance_angle(0.0, Timestep::new(0.016));
        assert!((angle - 0.5).abs() < 1e-4);
        let wrapped = advance_angle(359.9, Timestep::new(0.016));
        assert!((wrapped - 0.4).abs() < 1e-3);
    }

    #[test]
    fn quad_sits_four_units_ahead() {
        let center = quad_transform(0.0) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(center.xyz().abs_diff_eq(Vec3::new(0.0, 0.0, -4.0), 1e-5));
        let corner = quad_transform(0.0).transform_point3(Vec3::new(0.5, 0.5, 0.0));
        assert!(corner.abs_diff_eq(Vec3::new(1.0, 1.0, -4.0), 1e-5));
    }

    #[test]
    fn checkerboard_is_smoothed_when_magnified() {
        assert_eq!(CHECKER_FILTER, wgpu::FilterMode::Linear);
    }

    #[test]
    fn fov_matches_unit_frustum() {
        let projection = Mat4::perspective_rh(frustum_fov(NEAR_CLIP).to_radians(), 1.0, NEAR_CLIP, FAR_CLIP);
        // A point at the top edge of the near plane projects to y = 1.
        let clip = projection * Vec4::new(0.0, 1.0, -NEAR_CLIP, 1.0);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-4);
    }
}
