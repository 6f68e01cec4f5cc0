//! The continuous controller.

use std::f32::consts::FRAC_PI_4;

use orrery_math::{damped_approach, smoothstep, wrap_pi, wrap_signed_tau};

use crate::params::AnimationParams;

/// Speed control for one advance.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum SpeedInput {
    #[default]
    Hold,
    /// Net number of increase (positive) or decrease (negative) commands.
    Step(i32),
    /// Absolute speed, clamped into range.
    Set(f32),
}

impl SpeedInput {
    pub const INCREASE: Self = Self::Step(1);
    pub const DECREASE: Self = Self::Step(-1);
}

/// Latch transition reported by an advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbsorptionEvent {
    Entered,
    Exited,
}

/// Which texture the central body wears.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialVariant {
    Primary,
    Absorbed,
}

/// Result of [`AnimationState::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    pub state: AnimationState,
    pub event: Option<AbsorptionEvent>,
}

/// Everything that changes frame to frame, as one value.
///
/// Invariants kept by every advance:
/// - `speed_scale` in `[speed_floor, speed_ceiling]`
/// - `current_radius` in `[0, max_radius]`
/// - `tilt_phase` in `(-PI, PI]`
/// - `central_rotation_angle` in `(-TAU, TAU)`
/// - `reflect_strength` is 0 unless absorbed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    speed_scale: f32,
    current_radius: f32,
    tilt_phase: f32,
    central_rotation_angle: f32,
    central_angular_velocity: f32,
    absorbed: bool,
    reflect_strength: f32,
    elapsed: f64,
    last_dt: f32,
}

impl AnimationState {
    /// Fresh state at the widest orbit, starting at the configured initial speed.
    pub fn new(params: &AnimationParams) -> Self {
        Self::with_speed(params, params.initial_speed)
    }

    pub fn with_speed(params: &AnimationParams, speed: f32) -> Self {
        Self {
            speed_scale: params.clamp_speed(speed),
            current_radius: params.radii.max,
            tilt_phase: 0.0,
            central_rotation_angle: 0.0,
            central_angular_velocity: 0.0,
            absorbed: false,
            reflect_strength: 0.0,
            elapsed: 0.0,
            last_dt: 0.0,
        }
    }

    pub fn speed_scale(&self) -> f32 {
        self.speed_scale
    }

    pub fn current_radius(&self) -> f32 {
        self.current_radius
    }

    pub fn tilt_phase(&self) -> f32 {
        self.tilt_phase
    }

    /// Inclination of the orbital plane, in `[-PI/4, PI/4]`.
    pub fn tilt(&self) -> f32 {
        self.tilt_phase.cos() * FRAC_PI_4
    }

    pub fn central_rotation_angle(&self) -> f32 {
        self.central_rotation_angle
    }

    pub fn central_angular_velocity(&self) -> f32 {
        self.central_angular_velocity
    }

    pub fn is_absorbed(&self) -> bool {
        self.absorbed
    }

    pub fn reflect_strength(&self) -> f32 {
        self.reflect_strength
    }

    /// Reflection and glow are only shaded while absorbed.
    pub fn reflect_enabled(&self) -> bool {
        self.absorbed
    }

    /// Accumulated guarded animation time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Guarded delta used by the most recent advance; zero before the first.
    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    pub fn material_variant(&self) -> MaterialVariant {
        if self.absorbed {
            MaterialVariant::Absorbed
        } else {
            MaterialVariant::Primary
        }
    }

    /// Lights (and shadow casters) to drive this frame: none while absorbed.
    pub fn active_light_count(&self, body_count: usize, cap: usize) -> usize {
        if self.absorbed { 0 } else { body_count.min(cap) }
    }

    pub fn glow_intensity(&self, glow_max: f32) -> f32 {
        if self.absorbed {
            self.reflect_strength * glow_max
        } else {
            0.0
        }
    }

    /// Value-returning advance: the previous state is left untouched.
    pub fn step(mut self, params: &AnimationParams, dt: f32, input: SpeedInput) -> Step {
        let event = self.advance(params, dt, input);
        Step { state: self, event }
    }

    /// Apply `input` to the speed and integrate every field over `dt`.
    ///
    /// Returns the absorption transition, if any. At most one per call.
    pub fn advance(
        &mut self,
        params: &AnimationParams,
        dt: f32,
        input: SpeedInput,
    ) -> Option<AbsorptionEvent> {
        let dt = params.clamp_dt(dt);
        self.last_dt = dt;
        self.elapsed += f64::from(dt);

        self.speed_scale = match input {
            SpeedInput::Hold => self.speed_scale,
            SpeedInput::Step(n) => self.speed_scale + n as f32 * params.speed_step,
            SpeedInput::Set(s) => s,
        };
        self.speed_scale = params.clamp_speed(self.speed_scale);
        let speed = self.speed_scale;

        let target = params.radius_target(speed);
        self.current_radius = damped_approach(self.current_radius, target, params.radius_rate, dt)
            .clamp(0.0, params.radii.max);

        if speed >= params.tilt_speed_floor {
            let rate = params.tilt_gain
                * (speed.min(params.tilt_speed_ceiling) - params.tilt_speed_floor).max(0.0);
            self.tilt_phase = wrap_pi(self.tilt_phase + rate * dt);
        }

        let omega_target = params.max_omega
            * smoothstep(
                speed,
                params.rotation_speed_floor,
                params.rotation_speed_ceiling,
            );
        self.central_angular_velocity = damped_approach(
            self.central_angular_velocity,
            omega_target,
            params.omega_rate,
            dt,
        );
        self.central_rotation_angle =
            wrap_signed_tau(self.central_rotation_angle + self.central_angular_velocity * dt);

        let event = self.update_latch(params);
        match event {
            Some(_) => self.reflect_strength = 0.0,
            None if self.absorbed => {
                self.reflect_strength =
                    damped_approach(self.reflect_strength, 1.0, params.reflect_rate, dt)
                        .clamp(0.0, 1.0);
            }
            None => self.reflect_strength = 0.0,
        }
        event
    }

    /// Two-sided hysteresis: enter at `speed >= enter && radius <= eps`,
    /// leave at `speed <= exit && radius >= eps`, with `exit < enter`.
    fn update_latch(&mut self, params: &AnimationParams) -> Option<AbsorptionEvent> {
        let eps = params.absorb_epsilon;
        if !self.absorbed
            && self.speed_scale >= params.absorb_enter_speed
            && self.current_radius <= eps
        {
            self.absorbed = true;
            log::info!(
                "absorbed at speed {:.2}, radius {:.4}",
                self.speed_scale,
                self.current_radius
            );
            Some(AbsorptionEvent::Entered)
        } else if self.absorbed
            && self.speed_scale <= params.absorb_exit_speed
            && self.current_radius >= eps
        {
            self.absorbed = false;
            log::info!(
                "released at speed {:.2}, radius {:.4}",
                self.speed_scale,
                self.current_radius
            );
            Some(AbsorptionEvent::Exited)
        } else {
            None
        }
    }
}
