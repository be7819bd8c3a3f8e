//! Yaw/pitch fly camera.
//!
//! Angles are stored in degrees. Yaw -90° with pitch 0° looks down -Z. The
//! front/right/up basis is recomputed whenever the orientation changes, so it
//! is always orthonormal.

use glam::{Mat4, Vec3};

/// Pitch is clamped to this many degrees either side of the horizon.
pub const PITCH_LIMIT: f32 = 89.0;

/// Direction of a discrete keyboard movement step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// A first-person camera for the scene viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    world_up: Vec3,
    /// Degrees, unbounded.
    yaw: f32,
    /// Degrees, within `[-PITCH_LIMIT, PITCH_LIMIT]`.
    pitch: f32,
    /// World units per movement step.
    pub speed: f32,
    /// Degrees per unit of mouse movement.
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0), Vec3::Y, -90.0, 0.0)
    }
}

impl Camera {
    pub fn new(position: Vec3, world_up: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            world_up,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            speed: 0.05,
            sensitivity: 0.1,
            fov: 100.0,
            near: 0.1,
            far: 100.0,
        };
        camera.update_vectors();
        camera
    }

    pub fn with_position(mut self, position: impl Into<Vec3>) -> Self {
        self.position = position.into();
        self
    }

    pub fn with_world_up(mut self, world_up: impl Into<Vec3>) -> Self {
        self.world_up = world_up.into();
        self.update_vectors();
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Points the camera along `direction`.
    ///
    /// A zero vector leaves the orientation unchanged.
    pub fn look_toward(&mut self, direction: impl Into<Vec3>) {
        let dir = direction.into().normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.yaw = dir.z.atan2(dir.x).to_degrees();
        self.pitch = dir
            .y
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    /// Moves one fixed step along the front or right axis.
    pub fn process_keyboard(&mut self, movement: CameraMovement) {
        match movement {
            CameraMovement::Forward => self.position += self.front * self.speed,
            CameraMovement::Backward => self.position -= self.front * self.speed,
            CameraMovement::Left => self.position -= self.right * self.speed,
            CameraMovement::Right => self.position += self.right * self.speed,
        }
    }

    /// Applies a mouse delta. Positive `dy` looks up.
    pub fn process_mouse_movement(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch + dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
        let mut right = self.front.cross(self.world_up);
        if right.length_squared() < 1e-8 {
            log::warn!(
                "world up {} is parallel to the view direction, using +Y",
                self.world_up
            );
            self.world_up = Vec3::Y;
            right = self.front.cross(self.world_up);
        }
        self.right = right.normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.front, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near, self.far)
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}
