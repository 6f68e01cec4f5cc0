use glam::{Mat4, Vec3};
use orrery_math::Aabb;

use crate::body::normalising_scale;
use crate::error::AnimationError;

/// The body at the focus of the orbit.
///
/// Scaled to a target size and recentred horizontally so it spins about its
/// own vertical midline. Its vertical placement is left as authored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CentralBody {
    scale: f32,
    recenter: Vec3,
    world_bounds: Aabb,
}

impl CentralBody {
    pub fn from_bounds(bounds: &Aabb, target_size: f32) -> Result<Self, AnimationError> {
        let scale = normalising_scale("central body", bounds, target_size)?;
        let c = bounds.center();
        let recenter = Vec3::new(-c.x, 0.0, -c.z);
        let placement = Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_translation(recenter);
        Ok(Self {
            scale,
            recenter,
            world_bounds: bounds.transformed(&placement),
        })
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Bounds at rotation angle zero.
    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    /// Half the world-space bounding diagonal: the tightest orbit radius
    /// that still clears the body.
    pub fn min_radius(&self) -> f32 {
        self.world_bounds.diagonal() * 0.5
    }

    /// World-space vertical midpoint; satellites tilt through this height.
    pub fn center_height(&self) -> f32 {
        self.world_bounds.center().y
    }

    /// `Ry(angle) * S(scale) * T(recenter)`.
    pub fn transform(&self, rotation_angle: f32) -> Mat4 {
        Mat4::from_rotation_y(rotation_angle)
            * Mat4::from_scale(Vec3::splat(self.scale))
            * Mat4::from_translation(self.recenter)
    }
}
