//! Camera and its first-person controller.

use glam::{EulerRot, Mat4, Quat, Vec3};
use ripples_platform::{InputState, KeyCode, MouseButton};

/// Perspective projection parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Perspective {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// A perspective camera looking down its local -Z axis.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Camera rotation
    pub rotation: Quat,
    /// Projection settings
    pub projection: Perspective,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            rotation: Quat::IDENTITY,
            projection: Perspective {
                fov_y: 70.0_f32.to_radians(),
                aspect: 1280.0 / 920.0,
                near: 0.1,
                far: 1000.0,
            },
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the perspective projection. `fov_y` is in radians.
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.projection = Perspective {
            fov_y,
            aspect,
            near,
            far,
        };
    }

    /// Update the aspect ratio, e.g. after a resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.projection.aspect = aspect;
        }
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        let target = self.position + self.forward();
        Mat4::look_at_rh(self.position, target, Vec3::Y)
    }

    /// Get the projection matrix (with Vulkan Y-flip).
    pub fn projection_matrix(&self) -> Mat4 {
        let Perspective {
            fov_y,
            aspect,
            near,
            far,
        } = self.projection;
        let mut proj = Mat4::perspective_rh(fov_y, aspect, near, far);
        // Vulkan clip space has +Y pointing down
        proj.y_axis.y *= -1.0;
        proj
    }

    /// Get the view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

/// Largest pitch magnitude, just short of straight up or down.
const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Largest mouse delta (pixels) accepted in one frame.
const MAX_MOUSE_DELTA: f32 = 100.0;

/// First-person controller: WASD to move, Q/E for up/down, right mouse
/// button held to look around.
#[derive(Clone, Debug)]
pub struct FpsController {
    yaw: f32,
    pitch: f32,
    /// Units per second.
    pub move_speed: f32,
    /// Radians per pixel of mouse movement.
    pub mouse_sensitivity: f32,
    movement: Vec3,
}

impl Default for FpsController {
    fn default() -> Self {
        Self::with_settings(3.0, 0.002)
    }
}

impl FpsController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(move_speed: f32, mouse_sensitivity: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            move_speed,
            mouse_sensitivity,
            movement: Vec3::ZERO,
        }
    }

    /// Current yaw and pitch in radians.
    pub fn angles(&self) -> (f32, f32) {
        (self.yaw, self.pitch)
    }

    /// Apply a mouse delta in pixels.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.mouse_sensitivity;
        self.pitch = (self.pitch - dy * self.mouse_sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Set the movement direction in camera space. Each axis is in [-1, 1].
    pub fn set_movement_input(&mut self, forward: f32, right: f32, up: f32) {
        self.movement = Vec3::new(right, up, forward).clamp(Vec3::NEG_ONE, Vec3::ONE);
    }

    /// Write orientation into `camera` and move it by the current input.
    pub fn update_camera(&self, camera: &mut Camera, delta_time: f32) {
        camera.rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0);

        if self.movement == Vec3::ZERO || delta_time <= 0.0 {
            return;
        }

        let direction = camera.forward() * self.movement.z
            + camera.right() * self.movement.x
            + Vec3::Y * self.movement.y;
        camera.position += direction.normalize_or_zero() * self.move_speed * delta_time;
    }

    /// Read `input`, update `camera` and return its view-projection matrix.
    pub fn compute_view_projection(
        &mut self,
        camera: &mut Camera,
        input: &InputState,
        delta_time: f32,
    ) -> Mat4 {
        // The first frame of a press carries the jump from wherever the cursor was.
        if input.is_mouse_pressed(MouseButton::Right)
            && !input.is_mouse_just_pressed(MouseButton::Right)
        {
            let (dx, dy) = input.mouse_delta();
            self.process_mouse_movement(
                dx.clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA),
                dy.clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA),
            );
        }

        let forward = input.axis(KeyCode::KeyW, KeyCode::KeyS);
        let right = input.axis(KeyCode::KeyD, KeyCode::KeyA);
        let up = input.axis(KeyCode::KeyQ, KeyCode::KeyE);
        self.set_movement_input(forward, right, up);

        self.update_camera(camera, delta_time);
        camera.view_projection_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_camera_looks_down_neg_z() {
        let camera = Camera::new();
        assert_vec3_near(camera.forward(), Vec3::NEG_Z);
        assert_vec3_near(camera.position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_projection_flips_y() {
        let camera = Camera::new();
        let proj = camera.projection_matrix();
        assert!(proj.y_axis.y < 0.0);
    }

    #[test]
    fn test_origin_projects_to_screen_centre() {
        let camera = Camera::new();
        let clip = camera.view_projection_matrix() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_set_aspect_ignores_degenerate_values() {
        let mut camera = Camera::new();
        camera.set_aspect(2.0);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.projection.aspect, 2.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut controller = FpsController::with_settings(1.0, 1.0);
        controller.process_mouse_movement(0.0, -1_000.0);
        assert!((controller.angles().1 - MAX_PITCH).abs() < 1e-6);
        controller.process_mouse_movement(0.0, 1_000.0);
        assert!((controller.angles().1 + MAX_PITCH).abs() < 1e-6);
    }

    #[test]
    fn test_forward_movement() {
        let controller = {
            let mut c = FpsController::with_settings(2.0, 0.0);
            c.set_movement_input(1.0, 0.0, 0.0);
            c
        };
        let mut camera = Camera::new();
        controller.update_camera(&mut camera, 0.5);
        assert_vec3_near(camera.position, Vec3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn test_no_movement_without_time() {
        let mut controller = FpsController::with_settings(2.0, 0.0);
        controller.set_movement_input(1.0, 1.0, 1.0);
        let mut camera = Camera::new();
        controller.update_camera(&mut camera, 0.0);
        assert_vec3_near(camera.position, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_keys_drive_view_projection() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyW);
        input.on_key_pressed(KeyCode::KeyD);

        let mut controller = FpsController::with_settings(1.0, 0.0);
        let mut camera = Camera::new();
        let vp = controller.compute_view_projection(&mut camera, &input, 1.0);

        let diagonal = std::f32::consts::FRAC_1_SQRT_2;
        assert_vec3_near(camera.position, Vec3::new(diagonal, 0.0, 5.0 - diagonal));
        assert_eq!(vp, camera.view_projection_matrix());
    }

    #[test]
    fn test_mouse_look_skips_first_pressed_frame() {
        let mut input = InputState::new();
        input.on_mouse_pressed(MouseButton::Right);
        input.on_mouse_moved(50.0, 0.0);

        let mut controller = FpsController::with_settings(1.0, 0.01);
        let mut camera = Camera::new();
        controller.compute_view_projection(&mut camera, &input, 0.016);
        assert_eq!(controller.angles().0, 0.0);

        input.begin_frame();
        input.on_mouse_moved(60.0, 0.0);
        controller.compute_view_projection(&mut camera, &input, 0.016);
        assert!((controller.angles().0 + 0.1).abs() < 1e-6);
    }
}
