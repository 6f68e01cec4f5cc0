//! Scalar helpers for continuous-time animation.

use std::f32::consts::{PI, TAU};

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_pi(angle: f32) -> f32 {
    let y = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if y > PI { y - TAU } else { y }
}

/// Truncated remainder by `TAU`: the result keeps the sign of the input and
/// stays strictly inside `(-TAU, TAU)`.
pub fn wrap_signed_tau(angle: f32) -> f32 {
    angle % TAU
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// `(x - e0) / (e1 - e0)` clamped to `[0, 1]`. A degenerate band acts as a step at `e0`.
pub fn inverse_lerp_clamped(x: f32, e0: f32, e1: f32) -> f32 {
    let span = e1 - e0;
    if span.abs() <= f32::EPSILON {
        return if x >= e0 { 1.0 } else { 0.0 };
    }
    ((x - e0) / span).clamp(0.0, 1.0)
}

/// Hermite smoothstep `t^2 (3 - 2t)` of `x` normalised into `[e0, e1]`.
pub fn smoothstep(x: f32, e0: f32, e1: f32) -> f32 {
    let t = inverse_lerp_clamped(x, e0, e1);
    t * t * (3.0 - 2.0 * t)
}

/// Critically damped step of `value` toward `target`:
/// `value + (target - value) * (1 - exp(-rate * dt))`.
///
/// Never overshoots for non-negative `rate` and `dt`.
pub fn damped_approach(value: f32, target: f32, rate: f32, dt: f32) -> f32 {
    let alpha = 1.0 - (-rate.max(0.0) * dt.max(0.0)).exp();
    value + (target - value) * alpha
}
