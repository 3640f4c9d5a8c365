use glam::{Mat4, Vec3};

/// Anything that can supply a view-projection matrix to `begin_scene`.
pub trait Camera {
    fn view_projection(&self) -> Mat4;
}

/// 2D camera: orthographic projection, position and rotation about Z.
#[derive(Debug, Clone)]
pub struct OrthographicCamera {
    projection: Mat4,
    view: Mat4,
    view_projection: Mat4,
    position: Vec3,
    /// Degrees, counter-clockwise.
    rotation: f32,
}

impl OrthographicCamera {
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        let projection = Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0);
        Self {
            projection,
            view: Mat4::IDENTITY,
            view_projection: projection,
            position: Vec3::ZERO,
            rotation: 0.0,
        }
    }

    pub fn set_projection(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.projection = Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0);
        self.view_projection = self.projection * self.view;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_view_matrix();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
        self.recalculate_view_matrix();
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    fn recalculate_view_matrix(&mut self) {
        let transform = Mat4::from_translation(self.position) * Mat4::from_rotation_z(self.rotation.to_radians());
        self.view = transform.inverse();
        self.view_projection = self.projection * self.view;
    }
}

impl Camera for OrthographicCamera {
    fn view_projection(&self) -> Mat4 {
        self.view_projection
    }
}

/// 3D camera with a perspective projection. Until `look_at` is called the
/// camera looks at the origin; placed at the origin itself it looks down -Z.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    projection: Mat4,
    view: Mat4,
    view_projection: Mat4,
    position: Vec3,
    /// Vertical field of view in degrees.
    fov: f32,
    aspect_ratio: f32,
    near_clip: f32,
    far_clip: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(45.0, 16.0 / 9.0, 0.1, 100.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect_ratio: f32, near_clip: f32, far_clip: f32) -> Self {
        let mut camera = Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
            fov,
            aspect_ratio,
            near_clip,
            far_clip,
        };
        camera.recalculate_projection_matrix();
        camera.recalculate_view_matrix();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Moves the camera and re-aims it at the origin.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_view_matrix();
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        self.view_projection = self.projection * self.view;
    }

    /// Replaces the view matrix directly, e.g. for a model-view transform.
    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.view_projection = self.projection * self.view;
    }

    pub fn set_projection(&mut self, fov: f32, aspect_ratio: f32, near_clip: f32, far_clip: f32) {
        self.fov = fov;
        self.aspect_ratio = aspect_ratio;
        self.near_clip = near_clip;
        self.far_clip = far_clip;
        self.recalculate_projection_matrix();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
        self.recalculate_projection_matrix();
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    fn recalculate_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect_ratio, self.near_clip, self.far_clip);
        self.view_projection = self.projection * self.view;
    }

    fn recalculate_view_matrix(&mut self) {
        self.view = if self.position.length_squared() > f32::EPSILON {
            Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
        } else {
            Mat4::IDENTITY
        };
        self.view_projection = self.projection * self.view;
    }
}

impl Camera for PerspectiveCamera {
    fn view_projection(&self) -> Mat4 {
        self.view_projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn project(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * Vec4::new(p.x, p.y, p.z, 1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn orthographic_maps_bounds_to_ndc() {
        let camera = OrthographicCamera::new(-2.0, 2.0, -1.0, 1.0);
        let ndc = project(camera.view_projection(), Vec3::new(2.0, 1.0, 0.0));
        assert!(ndc.abs_diff_eq(Vec3::new(1.0, 1.0, 0.5), 1e-5));
    }

    #[test]
    fn orthographic_view_is_inverse_of_camera_transform() {
        let mut camera = OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0);
        camera.set_position(Vec3::new(0.5, 0.0, 0.0));
        let ndc = project(camera.view_projection(), Vec3::new(0.5, 0.0, 0.0));
        assert!(ndc.truncate().abs_diff_eq(glam::Vec2::ZERO, 1e-5));

        camera.set_position(Vec3::ZERO);
        camera.set_rotation(90.0);
        // Rotating the camera left makes world +Y appear to the right.
        let ndc = project(camera.view_projection(), Vec3::new(0.0, 1.0, 0.0));
        assert!(ndc.truncate().abs_diff_eq(glam::Vec2::new(1.0, 0.0), 1e-5));
    }

    #[test]
    fn set_projection_keeps_view() {
        let mut camera = OrthographicCamera::new(-1.0, 1.0, -1.0, 1.0);
        camera.set_position(Vec3::new(1.0, 1.0, 0.0));
        camera.set_projection(-4.0, 4.0, -2.0, 2.0);
        assert_eq!(camera.view_projection(), camera.projection() * camera.view());
    }

    #[test]
    fn perspective_defaults_to_looking_at_origin() {
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 4.0));
        let ndc = project(camera.view_projection(), Vec3::ZERO);
        assert!(ndc.truncate().abs_diff_eq(glam::Vec2::ZERO, 1e-5));
        assert!(ndc.z > 0.0 && ndc.z < 1.0);

        camera.look_at(Vec3::new(1.0, 0.0, 0.0));
        let ndc = project(camera.view_projection(), Vec3::new(1.0, 0.0, 0.0));
        assert!(ndc.truncate().abs_diff_eq(glam::Vec2::ZERO, 1e-5));
    }

    #[test]
    fn camera_at_origin_looks_down_negative_z() {
        let camera = PerspectiveCamera::default();
        assert_eq!(camera.view(), Mat4::IDENTITY);
        assert!(!camera.view_projection().is_nan());
    }

    #[test]
    fn aspect_ratio_changes_projection_only() {
        let mut camera = PerspectiveCamera::default();
        camera.set_position(Vec3::new(0.0, 2.0, 5.0));
        let view = camera.view();
        camera.set_aspect_ratio(2.0);
        assert_eq!(camera.view(), view);
        assert_eq!(camera.aspect_ratio(), 2.0);
        assert_eq!(camera.view_projection(), camera.projection() * view);
    }
}
