//! Per-frame placement of every body.

use std::f64::consts::TAU as TAU64;

use glam::{Mat4, Quat, Vec3};
use orrery_math::wrap_pi;

use crate::body::OrbitingBody;
use crate::central::CentralBody;
use crate::state::AnimationState;

/// One body's placement for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyPose {
    /// Orbital angle after this frame's advance, in `(-PI, PI]`.
    pub angle: f32,
    /// Position on the untilted orbit plane, relative to the orbit centre.
    pub planar_position: Vec3,
    /// Tilted world position of the body.
    pub world_position: Vec3,
    /// Where this body's point light sits; the same point as `world_position`.
    pub light_position: Vec3,
    pub transform: Mat4,
}

/// Frame-local output of [`OrbitLayout::compute`].
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitSnapshot {
    pub poses: Vec<BodyPose>,
    pub central_transform: Mat4,
    /// Height of the orbit centre, the central body's vertical midpoint.
    pub center_height: f32,
    pub tilt: f32,
}

impl OrbitSnapshot {
    /// Light positions of the first `count` bodies.
    pub fn light_positions(&self, count: usize) -> Vec<Vec3> {
        self.poses
            .iter()
            .take(count)
            .map(|pose| pose.light_position)
            .collect()
    }

    pub fn body_transforms(&self) -> impl Iterator<Item = Mat4> + '_ {
        self.poses.iter().map(|pose| pose.transform)
    }
}

/// Owns each body's accumulated orbital angle.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitLayout {
    angles: Vec<f32>,
    center_height: f32,
}

impl OrbitLayout {
    pub fn new(bodies: &[OrbitingBody], central: &CentralBody) -> Self {
        Self {
            angles: bodies.iter().map(|b| wrap_pi(b.phase_offset)).collect(),
            center_height: central.center_height(),
        }
    }

    pub fn angles(&self) -> &[f32] {
        &self.angles
    }

    /// Advance every body's angle by `orbit_frequency * speed * dt` and
    /// build the frame's transforms.
    ///
    /// `bodies` must be the slice the layout was created from.
    pub fn compute(
        &mut self,
        state: &AnimationState,
        bodies: &[OrbitingBody],
        central: &CentralBody,
        dt: f32,
    ) -> OrbitSnapshot {
        debug_assert_eq!(bodies.len(), self.angles.len());
        let dt = dt.max(0.0);
        let speed = state.speed_scale();
        let radius = state.current_radius();
        let tilt = state.tilt();
        let (sin_t, cos_t) = tilt.sin_cos();

        let poses = bodies
            .iter()
            .zip(self.angles.iter_mut())
            .map(|(body, angle)| {
                *angle = wrap_pi(*angle + body.orbit_frequency * speed * dt);
                let (sin_a, cos_a) = angle.sin_cos();
                let planar = Vec3::new(radius * cos_a, 0.0, radius * sin_a);
                let world = Vec3::new(
                    planar.x * cos_t,
                    planar.x * sin_t + self.center_height,
                    planar.z,
                );

                let spin_angle = ((f64::from(body.phase_offset)
                    + f64::from(body.spin_frequency) * state.elapsed())
                    % TAU64) as f32;
                let rotation = Quat::from_rotation_y(-*angle)
                    * body.correction.rotation()
                    * body.spin_axis().rotation(spin_angle);
                let transform = Mat4::from_scale_rotation_translation(
                    Vec3::splat(body.scale_factor),
                    rotation,
                    world,
                );

                BodyPose {
                    angle: *angle,
                    planar_position: planar,
                    world_position: world,
                    light_position: world,
                    transform,
                }
            })
            .collect();

        OrbitSnapshot {
            poses,
            central_transform: central.transform(state.central_rotation_angle()),
            center_height: self.center_height,
            tilt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{RingSpec, satellite_ring};
    use crate::params::AnimationParams;
    use crate::state::SpeedInput;
    use orrery_math::Aabb;
    use std::f32::consts::FRAC_PI_4;

    fn scene() -> (CentralBody, Vec<OrbitingBody>, AnimationParams) {
        let central =
            CentralBody::from_bounds(&Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0)), 2.0)
                .unwrap();
        let ring = satellite_ring(
            &Aabb::new(Vec3::splat(-0.5), Vec3::new(0.5, 0.5, 2.0)),
            &RingSpec {
                count: 4,
                target_size: 0.5,
                orbit_frequency: 1.0,
                orbit_frequency_spread: 0.5,
                spin_frequency: 1.0,
            },
        )
        .unwrap();
        let params = AnimationParams::with_min_radius(central.min_radius());
        (central, ring, params)
    }

    #[test]
    fn test_initial_angles_are_phase_offsets() {
        let (central, ring, _) = scene();
        let layout = OrbitLayout::new(&ring, &central);
        for (a, b) in layout.angles().iter().zip(&ring) {
            assert!((a - wrap_pi(b.phase_offset)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_positions_lie_on_tilted_circle() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        let mut state = AnimationState::with_speed(&params, 2.0);
        for _ in 0..90 {
            state.advance(&params, 1.0 / 60.0, SpeedInput::Hold);
            let snap = layout.compute(&state, &ring, &central, state.last_dt());
            let h = central.center_height();
            assert_eq!(snap.center_height, h);
            for pose in &snap.poses {
                let rel = pose.world_position - Vec3::new(0.0, h, 0.0);
                assert!((rel.length() - state.current_radius()).abs() < 1e-3);
                assert!((pose.planar_position.length() - state.current_radius()).abs() < 1e-3);
                assert_eq!(pose.light_position, pose.world_position);
            }
        }
    }

    #[test]
    fn test_tilt_formula() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        // Below the tilt floor the phase stays at zero: tilt is PI/4.
        let state = AnimationState::with_speed(&params, 0.0);
        let snap = layout.compute(&state, &ring, &central, 0.0);
        assert!((snap.tilt - FRAC_PI_4).abs() < 1e-6);
        let first = snap.poses[0];
        let p = first.planar_position;
        let expected = Vec3::new(
            p.x * FRAC_PI_4.cos(),
            p.x * FRAC_PI_4.sin() + central.center_height(),
            p.z,
        );
        assert!((first.world_position - expected).length() < 1e-5);
    }

    #[test]
    fn test_angles_advance_by_frequency() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        let state = AnimationState::with_speed(&params, 2.0);
        let before: Vec<f32> = layout.angles().to_vec();
        layout.compute(&state, &ring, &central, 0.1);
        for ((b, a), body) in before.iter().zip(layout.angles()).zip(&ring) {
            let expected = wrap_pi(b + body.orbit_frequency * 2.0 * 0.1);
            assert!((a - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_zero_speed_freezes_orbit() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        let state = AnimationState::with_speed(&params, 0.0);
        let before = layout.angles().to_vec();
        layout.compute(&state, &ring, &central, 0.5);
        assert_eq!(before, layout.angles());
    }

    #[test]
    fn test_bodies_desynchronise() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        let state = AnimationState::with_speed(&params, 1.0);
        let gap0 = layout.angles()[1] - layout.angles()[0];
        for _ in 0..30 {
            layout.compute(&state, &ring, &central, 0.02);
        }
        let gap1 = layout.angles()[1] - layout.angles()[0];
        assert!((gap1 - gap0).abs() > 1e-3);
    }

    #[test]
    fn test_transform_faces_centre_and_stands_upright() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        let state = AnimationState::with_speed(&params, 0.0);
        let snap = layout.compute(&state, &ring, &central, 0.0);
        for (pose, body) in snap.poses.iter().zip(&ring) {
            // Translation column is the world position.
            assert!((pose.transform.w_axis.truncate() - pose.world_position).length() < 1e-5);
            // Satellite mesh is Z-longest; its long axis must point straight up
            // (before the orbit's yaw, which keeps up as up).
            let up = pose.transform.transform_vector3(Vec3::Z).normalize();
            assert!((up - Vec3::Y).length() < 1e-4, "up {up:?}");
            let scaled = pose.transform.transform_vector3(Vec3::Z).length();
            assert!((scaled - body.scale_factor).abs() < 1e-5);
        }
    }

    #[test]
    fn test_central_transform_follows_rotation() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        let mut state = AnimationState::with_speed(&params, 6.0);
        for _ in 0..60 {
            state.advance(&params, 1.0 / 60.0, SpeedInput::Hold);
        }
        let snap = layout.compute(&state, &ring, &central, state.last_dt());
        assert_eq!(
            snap.central_transform,
            central.transform(state.central_rotation_angle())
        );
    }

    #[test]
    fn test_light_positions_truncate() {
        let (central, ring, params) = scene();
        let mut layout = OrbitLayout::new(&ring, &central);
        let state = AnimationState::new(&params);
        let snap = layout.compute(&state, &ring, &central, 0.0);
        assert_eq!(snap.light_positions(2).len(), 2);
        assert_eq!(snap.light_positions(10).len(), 4);
        assert_eq!(snap.light_positions(0).len(), 0);
    }
}
