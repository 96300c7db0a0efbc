//! Camera types, orbit controller and uniforms for view/projection.

use std::time::Duration;

use cgmath::{perspective, Deg, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// The pose a reset returns to: the raised three-quarter view.
pub const HOME_YAW: Deg<f32> = Deg(58.0);
pub const HOME_PITCH: Deg<f32> = Deg(17.6);
pub const HOME_DISTANCE: f32 = 9.9;

const MIN_DISTANCE: f32 = 3.0;
const MAX_DISTANCE: f32 = 15.0;
const MIN_PITCH: f32 = 0.0;
// Just short of the pole so the view basis stays well defined.
const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.02;

/// An orbit camera: a point on a sphere around `target`, looking inward.
#[derive(Debug)]
pub struct Camera {
    pub target: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub distance: f32,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        target: V,
        yaw: Y,
        pitch: P,
        distance: f32,
    ) -> Self {
        Self {
            target: target.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
            distance,
        }
    }

    pub fn home() -> Self {
        Self::new((0.0, 0.0, 0.0), HOME_YAW, HOME_PITCH, HOME_DISTANCE)
    }

    pub fn position(&self) -> Point3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        self.target
            + Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw) * self.distance
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }
}

/// Orbit input state. Mouse drags accumulate into deltas that
/// [`update`](Self::update) eases onto the camera with damping, the way a
/// turntable control glides to a stop.
#[derive(Debug)]
pub struct CameraController {
    rotate_speed: f32,
    zoom_speed: f32,
    damping: f32,
    yaw_delta: f32,
    pitch_delta: f32,
    scale: f32,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            damping: 0.05,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            scale: 1.0,
        }
    }

    /// Feed a mouse drag. Positive `dx` orbits the camera leftward around
    /// the target, positive `dy` lowers it.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.yaw_delta -= dx as f32 * self.rotate_speed;
        self.pitch_delta -= dy as f32 * self.rotate_speed;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            let notches = match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(position) => (position.y / 100.0) as f32,
            };
            self.scale *= 0.95_f32.powf(notches * self.zoom_speed);
        }
    }

    /// Apply the eased share of the pending motion and decay the rest.
    /// The damping factor is tuned at a 60 Hz reference; `dt` keeps the
    /// glide identical at other refresh rates.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let frames = dt.as_secs_f32() * 60.0;
        let blend = 1.0 - (1.0 - self.damping).powf(frames);

        camera.yaw += Rad(self.yaw_delta * blend);
        camera.pitch += Rad(self.pitch_delta * blend);
        self.yaw_delta *= 1.0 - blend;
        self.pitch_delta *= 1.0 - blend;

        camera.pitch = Rad(camera.pitch.0.clamp(MIN_PITCH, MAX_PITCH));

        camera.distance = (camera.distance * self.scale).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.scale = 1.0;
    }

    /// Drop any motion still in flight.
    pub fn reset(&mut self) {
        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;
        self.scale = 1.0;
    }
}

pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/**
The camera uniform as the shaders see it. Carries the inverse of the
view-projection matrix so the sky pass can unproject screen corners back
into world directions.
*/
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        let position = camera.position();
        self.view_position = [position.x, position.y, position.z, 1.0];
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj.invert().unwrap_or_else(Matrix4::identity).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything camera-shaped the context owns: state, controller, and the
/// GPU-side uniform plumbing.
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_pose_sits_at_the_showroom_vantage() {
        let camera = Camera::home();
        let position = camera.position();
        assert!((position.x - 5.0).abs() < 0.05);
        assert!((position.y - 3.0).abs() < 0.05);
        assert!((position.z - 8.0).abs() < 0.05);
    }

    #[test]
    fn pitch_never_dips_below_the_horizon() {
        let mut camera = Camera::home();
        let mut controller = CameraController::new(0.005, 1.0);
        controller.handle_mouse(0.0, 10_000.0);
        for _ in 0..200 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!(camera.pitch.0 >= MIN_PITCH);
    }

    #[test]
    fn pitch_stops_short_of_the_pole() {
        let mut camera = Camera::home();
        let mut controller = CameraController::new(0.005, 1.0);
        controller.handle_mouse(0.0, -10_000.0);
        for _ in 0..200 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!(camera.pitch.0 <= MAX_PITCH);
    }

    #[test]
    fn zoom_clamps_to_the_distance_band() {
        let mut camera = Camera::home();
        let mut controller = CameraController::new(0.005, 1.0);

        for _ in 0..100 {
            controller.handle_window_events(&WindowEvent::MouseWheel {
                device_id: winit::event::DeviceId::dummy(),
                delta: MouseScrollDelta::LineDelta(0.0, 5.0),
                phase: winit::event::TouchPhase::Moved,
            });
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!((camera.distance - MIN_DISTANCE).abs() < f32::EPSILON);

        for _ in 0..100 {
            controller.handle_window_events(&WindowEvent::MouseWheel {
                device_id: winit::event::DeviceId::dummy(),
                delta: MouseScrollDelta::LineDelta(0.0, -5.0),
                phase: winit::event::TouchPhase::Moved,
            });
            controller.update(&mut camera, Duration::from_millis(16));
        }
        assert!((camera.distance - MAX_DISTANCE).abs() < f32::EPSILON);
    }

    #[test]
    fn damped_motion_converges_on_the_full_drag() {
        let mut camera = Camera::home();
        let start = camera.yaw;
        let mut controller = CameraController::new(0.005, 1.0);
        controller.handle_mouse(-100.0, 0.0);
        for _ in 0..600 {
            controller.update(&mut camera, Duration::from_millis(16));
        }
        // 100 px at 0.005 rad/px, fully eased in.
        assert!((camera.yaw.0 - start.0 - 0.5).abs() < 1e-3);
    }

    #[test]
    fn reset_drops_motion_in_flight() {
        let mut camera = Camera::home();
        let mut controller = CameraController::new(0.005, 1.0);
        controller.handle_mouse(500.0, 500.0);
        controller.reset();
        let yaw = camera.yaw;
        let pitch = camera.pitch;
        controller.update(&mut camera, Duration::from_millis(16));
        assert_eq!(camera.yaw, yaw);
        assert_eq!(camera.pitch, pitch);
    }

    #[test]
    fn uniform_tracks_the_camera_position() {
        let camera = Camera::home();
        let projection = Projection::new(800, 600, Deg(45.0), 0.1, 1000.0);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);
        let position = camera.position();
        assert!((uniform.view_position[0] - position.x).abs() < f32::EPSILON);
        assert!((uniform.view_position[1] - position.y).abs() < f32::EPSILON);
        assert!((uniform.view_position[2] - position.z).abs() < f32::EPSILON);
    }
}
