//! Static per-body attributes, fixed once at scene setup.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Quat, Vec3};
use orrery_math::{Aabb, Axis};

use crate::error::AnimationError;

/// Local axis that ends up vertical after orientation correction, and so the
/// axis self-spin turns around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinAxis {
    X,
    Y,
    Z,
}

impl SpinAxis {
    /// Rotation by `angle` about this local axis.
    pub fn rotation(self, angle: f32) -> Quat {
        let axis = match self {
            SpinAxis::X => Vec3::X,
            SpinAxis::Y => Vec3::Y,
            SpinAxis::Z => Vec3::Z,
        };
        Quat::from_axis_angle(axis, angle)
    }
}

/// Fixed rotation that stands a mesh's longest axis upright.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientationCorrection {
    /// Radians about X, applied after `z`.
    pub x: f32,
    /// Radians about Z, applied first.
    pub z: f32,
    pub spin_axis: SpinAxis,
}

impl OrientationCorrection {
    pub const UPRIGHT: Self = Self {
        x: 0.0,
        z: 0.0,
        spin_axis: SpinAxis::Y,
    };

    /// Pure function of the box dimensions. Ties favour Y, then X, then Z.
    pub fn for_bounds(bounds: &Aabb) -> Self {
        match bounds.longest_axis().0 {
            Axis::Y => Self::UPRIGHT,
            // +90 degrees about Z carries +X onto +Y.
            Axis::X => Self {
                x: 0.0,
                z: FRAC_PI_2,
                spin_axis: SpinAxis::X,
            },
            // -90 degrees about X carries +Z onto +Y.
            Axis::Z => Self {
                x: -FRAC_PI_2,
                z: 0.0,
                spin_axis: SpinAxis::Z,
            },
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_x(self.x) * Quat::from_rotation_z(self.z)
    }
}

/// Immutable record for one orbiting body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitingBody {
    pub correction: OrientationCorrection,
    /// Uniform scale that brings the longest edge to the target size.
    pub scale_factor: f32,
    /// Multiplier on `speed_scale` for the orbital angular speed.
    pub orbit_frequency: f32,
    /// Self-spin rate in rad/s of animation time.
    pub spin_frequency: f32,
    /// Initial orbital angle, also the initial spin angle.
    pub phase_offset: f32,
}

impl OrbitingBody {
    pub fn from_bounds(
        bounds: &Aabb,
        target_size: f32,
        orbit_frequency: f32,
        spin_frequency: f32,
        phase_offset: f32,
    ) -> Result<Self, AnimationError> {
        Ok(Self {
            correction: OrientationCorrection::for_bounds(bounds),
            scale_factor: normalising_scale("satellite", bounds, target_size)?,
            orbit_frequency,
            spin_frequency,
            phase_offset,
        })
    }

    pub fn spin_axis(&self) -> SpinAxis {
        self.correction.spin_axis
    }
}

/// Scale that maps the longest edge of `bounds` to `target_size`.
pub(crate) fn normalising_scale(
    name: &'static str,
    bounds: &Aabb,
    target_size: f32,
) -> Result<f32, AnimationError> {
    if !(target_size.is_finite() && target_size > 0.0) {
        return Err(AnimationError::InvalidTargetSize {
            name,
            size: target_size,
        });
    }
    let (_, longest) = bounds.longest_axis();
    if !(longest.is_finite() && longest > f32::EPSILON) {
        return Err(AnimationError::DegenerateBounds {
            name,
            size: bounds.size().to_array(),
        });
    }
    Ok(target_size / longest)
}

/// How a ring of identical satellites is spread out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingSpec {
    pub count: usize,
    pub target_size: f32,
    pub orbit_frequency: f32,
    /// Fractional orbit-frequency increase from the first to the last body.
    pub orbit_frequency_spread: f32,
    pub spin_frequency: f32,
}

/// `count` satellites sharing one mesh, evenly spaced around the ring.
///
/// Orbit frequencies rise linearly across the ring so the formation drifts
/// apart over time. Spin rates cycle through three values.
pub fn satellite_ring(bounds: &Aabb, spec: &RingSpec) -> Result<Vec<OrbitingBody>, AnimationError> {
    let n = spec.count.max(1) as f32;
    (0..spec.count)
        .map(|i| {
            let fi = i as f32;
            OrbitingBody::from_bounds(
                bounds,
                spec.target_size,
                spec.orbit_frequency * (1.0 + spec.orbit_frequency_spread * fi / n),
                spec.spin_frequency * (1.0 + 0.5 * (i % 3) as f32),
                TAU * fi / n,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, z: f32) -> Aabb {
        Aabb::new(Vec3::new(-x, -y, -z) * 0.5, Vec3::new(x, y, z) * 0.5)
    }

    fn assert_vec_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-5, "expected {b:?}, got {a:?}");
    }

    #[test]
    fn test_y_longest_needs_no_correction() {
        let c = OrientationCorrection::for_bounds(&boxed(1.0, 3.0, 2.0));
        assert_eq!(c, OrientationCorrection::UPRIGHT);
    }

    #[test]
    fn test_x_longest_rotates_x_onto_vertical() {
        let c = OrientationCorrection::for_bounds(&boxed(4.0, 1.0, 2.0));
        assert_eq!(c.spin_axis, SpinAxis::X);
        assert_vec_near(c.rotation() * Vec3::X, Vec3::Y);
    }

    #[test]
    fn test_z_longest_rotates_z_onto_vertical() {
        let c = OrientationCorrection::for_bounds(&boxed(1.0, 2.0, 6.0));
        assert_eq!(c.spin_axis, SpinAxis::Z);
        assert_vec_near(c.rotation() * Vec3::Z, Vec3::Y);
    }

    #[test]
    fn test_correction_is_deterministic() {
        let b = boxed(2.5, 0.7, 1.1);
        assert_eq!(
            OrientationCorrection::for_bounds(&b),
            OrientationCorrection::for_bounds(&b)
        );
        // Translation does not change the choice.
        let shifted = Aabb::new(b.min + Vec3::splat(10.0), b.max + Vec3::splat(10.0));
        assert_eq!(
            OrientationCorrection::for_bounds(&b),
            OrientationCorrection::for_bounds(&shifted)
        );
    }

    #[test]
    fn test_spin_keeps_corrected_axis_vertical() {
        // Spinning about the local spin axis, then correcting, must leave
        // that axis pointing up for any spin angle.
        for dims in [(4.0, 1.0, 2.0), (1.0, 4.0, 2.0), (1.0, 2.0, 4.0)] {
            let c = OrientationCorrection::for_bounds(&boxed(dims.0, dims.1, dims.2));
            let local_up = match c.spin_axis {
                SpinAxis::X => Vec3::X,
                SpinAxis::Y => Vec3::Y,
                SpinAxis::Z => Vec3::Z,
            };
            for k in 0..8 {
                let spin = c.spin_axis.rotation(k as f32 * 0.7);
                assert_vec_near(c.rotation() * spin * local_up, Vec3::Y);
            }
        }
    }

    #[test]
    fn test_scale_normalises_longest_edge() {
        let body = OrbitingBody::from_bounds(&boxed(4.0, 1.0, 2.0), 0.5, 1.0, 1.0, 0.0).unwrap();
        assert!((body.scale_factor - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        let flat = Aabb::new(Vec3::ZERO, Vec3::ZERO);
        assert!(matches!(
            OrbitingBody::from_bounds(&flat, 1.0, 1.0, 1.0, 0.0),
            Err(AnimationError::DegenerateBounds { .. })
        ));
        assert!(matches!(
            OrbitingBody::from_bounds(&Aabb::EMPTY, 1.0, 1.0, 1.0, 0.0),
            Err(AnimationError::DegenerateBounds { .. })
        ));
    }

    #[test]
    fn test_non_positive_target_rejected() {
        assert!(matches!(
            OrbitingBody::from_bounds(&boxed(1.0, 1.0, 1.0), 0.0, 1.0, 1.0, 0.0),
            Err(AnimationError::InvalidTargetSize { .. })
        ));
    }

    #[test]
    fn test_ring_spacing_and_frequencies() {
        let spec = RingSpec {
            count: 8,
            target_size: 0.5,
            orbit_frequency: 1.0,
            orbit_frequency_spread: 0.4,
            spin_frequency: 2.0,
        };
        let ring = satellite_ring(&boxed(1.0, 2.0, 1.0), &spec).unwrap();
        assert_eq!(ring.len(), 8);
        for (i, body) in ring.iter().enumerate() {
            let expected = TAU * i as f32 / 8.0;
            assert!((body.phase_offset - expected).abs() < 1e-6);
        }
        // Strictly increasing orbit frequencies: no two bodies stay locked together.
        assert!(ring.windows(2).all(|w| w[1].orbit_frequency > w[0].orbit_frequency));
        assert_eq!(ring[0].spin_frequency, 2.0);
        assert_eq!(ring[1].spin_frequency, 3.0);
        assert_eq!(ring[3].spin_frequency, 2.0);
    }
}
