use orrery_config::AnimationConfig;
use orrery_math::{inverse_lerp_clamped, lerp};

/// Orbit radius range derived from the central body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitRadii {
    pub min: f32,
    pub max: f32,
}

impl OrbitRadii {
    /// `max = factor * min`.
    pub fn from_min(min: f32, max_radius_factor: f32) -> Self {
        let min = min.max(0.0);
        Self {
            min,
            max: min * max_radius_factor.max(1.0),
        }
    }
}

/// Immutable constants the controller steps with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationParams {
    pub speed_floor: f32,
    pub speed_ceiling: f32,
    pub speed_step: f32,
    pub initial_speed: f32,
    pub contraction_speed: f32,
    pub absorb_enter_speed: f32,
    pub absorb_exit_speed: f32,
    pub collapse_end_speed: f32,
    pub radius_rate: f32,
    pub omega_rate: f32,
    pub reflect_rate: f32,
    pub tilt_gain: f32,
    pub tilt_speed_floor: f32,
    pub tilt_speed_ceiling: f32,
    pub rotation_speed_floor: f32,
    pub rotation_speed_ceiling: f32,
    pub max_omega: f32,
    pub min_dt: f32,
    pub max_dt: f32,
    pub radii: OrbitRadii,
    /// Radius at or below which the orbit counts as collapsed.
    pub absorb_epsilon: f32,
}

impl AnimationParams {
    pub fn from_config(config: &AnimationConfig, min_radius: f32) -> Self {
        let radii = OrbitRadii::from_min(min_radius, config.max_radius_factor);
        Self {
            speed_floor: config.speed_floor,
            speed_ceiling: config.speed_ceiling,
            speed_step: config.speed_step,
            initial_speed: config.initial_speed,
            contraction_speed: config.contraction_speed,
            absorb_enter_speed: config.absorb_enter_speed,
            absorb_exit_speed: config.absorb_exit_speed,
            collapse_end_speed: config.collapse_end_speed,
            radius_rate: config.radius_rate,
            omega_rate: config.omega_rate,
            reflect_rate: config.reflect_rate,
            tilt_gain: config.tilt_gain,
            tilt_speed_floor: config.tilt_speed_floor,
            tilt_speed_ceiling: config.tilt_speed_ceiling,
            rotation_speed_floor: config.rotation_speed_floor,
            rotation_speed_ceiling: config.rotation_speed_ceiling,
            max_omega: config.max_omega,
            min_dt: config.min_dt,
            max_dt: config.max_dt,
            radii,
            absorb_epsilon: config.absorb_epsilon_fraction * radii.min,
        }
    }

    /// Default constants around a given minimum radius.
    pub fn with_min_radius(min_radius: f32) -> Self {
        Self::from_config(&AnimationConfig::default(), min_radius)
    }

    pub fn clamp_speed(&self, speed: f32) -> f32 {
        if speed.is_nan() {
            return self.speed_floor;
        }
        speed.clamp(self.speed_floor, self.speed_ceiling)
    }

    /// Guarded frame delta. Non-finite input is treated as the floor.
    pub fn clamp_dt(&self, dt: f32) -> f32 {
        if !dt.is_finite() {
            return self.min_dt;
        }
        dt.clamp(self.min_dt, self.max_dt)
    }

    /// Piecewise-linear target radius for a speed.
    ///
    /// Below the absorb-enter speed the orbit contracts from `max` at the
    /// floor to `min` at the contraction speed. From the enter speed it
    /// collapses from `min` to zero at the collapse-end speed.
    pub fn radius_target(&self, speed: f32) -> f32 {
        if speed < self.absorb_enter_speed {
            let t = inverse_lerp_clamped(speed, self.speed_floor, self.contraction_speed);
            lerp(self.radii.max, self.radii.min, t)
        } else {
            let t =
                inverse_lerp_clamped(speed, self.absorb_enter_speed, self.collapse_end_speed);
            lerp(self.radii.min, 0.0, t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AnimationParams {
        AnimationParams::with_min_radius(2.0)
    }

    #[test]
    fn test_radii_and_epsilon() {
        let p = params();
        assert_eq!(p.radii.min, 2.0);
        assert_eq!(p.radii.max, 10.0);
        assert!((p.absorb_epsilon - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_radius_target_bands() {
        let p = params();
        assert_eq!(p.radius_target(p.speed_floor), p.radii.max);
        assert!((p.radius_target(1.5) - 6.0).abs() < 1e-5);
        assert_eq!(p.radius_target(p.contraction_speed), p.radii.min);
        assert_eq!(p.radius_target(4.0), p.radii.min);
        assert_eq!(p.radius_target(p.absorb_enter_speed), p.radii.min);
        assert!((p.radius_target(5.5) - 1.0).abs() < 1e-5);
        assert_eq!(p.radius_target(p.collapse_end_speed), 0.0);
        assert_eq!(p.radius_target(p.speed_ceiling), 0.0);
    }

    #[test]
    fn test_radius_target_is_non_increasing() {
        let p = params();
        let mut prev = f32::INFINITY;
        for i in 0..=400 {
            let s = i as f32 * 0.025;
            let r = p.radius_target(s);
            assert!(r <= prev, "target rose at speed {s}");
            assert!((0.0..=p.radii.max).contains(&r));
            prev = r;
        }
    }

    #[test]
    fn test_clamp_speed() {
        let p = params();
        assert_eq!(p.clamp_speed(-3.0), 0.0);
        assert_eq!(p.clamp_speed(42.0), 10.0);
        assert_eq!(p.clamp_speed(f32::NAN), 0.0);
    }

    #[test]
    fn test_clamp_dt() {
        let p = params();
        assert_eq!(p.clamp_dt(0.0), p.min_dt);
        assert_eq!(p.clamp_dt(-1.0), p.min_dt);
        assert_eq!(p.clamp_dt(5.0), p.max_dt);
        assert_eq!(p.clamp_dt(f32::INFINITY), p.min_dt);
        assert_eq!(p.clamp_dt(1.0 / 60.0), 1.0 / 60.0);
    }
}
