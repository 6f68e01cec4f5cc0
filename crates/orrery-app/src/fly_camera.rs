//! Free-fly viewer camera: WASD to move, right-drag to look.

use glam::{Quat, Vec2, Vec3};
use orrery_config::CameraConfig;
use orrery_render::Camera;

/// Pitch stops short of vertical so the view basis stays defined.
pub const PITCH_LIMIT_DEG: f32 = 89.0;

#[derive(Clone, Debug, PartialEq)]
pub struct FlyCamera {
    pub position: Vec3,
    yaw_deg: f32,
    pitch_deg: f32,
    move_speed: f32,
    sensitivity: f32,
    fov_y_deg: f32,
    near: f32,
    far: f32,
}

impl FlyCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::from_array(config.start_position),
            yaw_deg: config.start_yaw_deg,
            pitch_deg: config.start_pitch_deg.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG),
            move_speed: config.move_speed,
            sensitivity: config.mouse_sensitivity,
            fov_y_deg: config.fov_y_deg,
            near: config.near,
            far: config.far,
        }
    }

    pub fn yaw_deg(&self) -> f32 {
        self.yaw_deg
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    /// Unit view direction. Yaw -90 with zero pitch looks down -Z.
    pub fn forward(&self) -> Vec3 {
        let (sy, cy) = self.yaw_deg.to_radians().sin_cos();
        let (sp, cp) = self.pitch_deg.to_radians().sin_cos();
        Vec3::new(cy * cp, sp, sy * cp).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    /// Apply a mouse delta in pixels. Moving the mouse down looks down.
    pub fn look(&mut self, delta: Vec2) {
        self.yaw_deg += delta.x * self.sensitivity;
        self.pitch_deg =
            (self.pitch_deg - delta.y * self.sensitivity).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
    }

    /// Move along the view direction (`axes.z`) and the right vector (`axes.x`).
    pub fn translate(&mut self, axes: Vec3, dt: f32) {
        let step = self.move_speed * dt;
        self.position += (self.forward() * axes.z + self.right() * axes.x) * step;
    }

    pub fn camera(&self, aspect_ratio: f32) -> Camera {
        let rotation = Quat::from_rotation_y(-(self.yaw_deg + 90.0).to_radians())
            * Quat::from_rotation_x(self.pitch_deg.to_radians());
        Camera {
            position: self.position,
            rotation,
            fov_y: self.fov_y_deg.to_radians(),
            aspect_ratio,
            near: self.near,
            far: self.far,
        }
    }
}
