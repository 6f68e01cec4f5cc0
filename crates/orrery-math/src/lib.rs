//! Bounding boxes and the scalar helpers shared by the animation controller
//! and the renderer: angle wrapping, smoothstep and damped exponential approach.

mod aabb;
mod scalar;

pub use aabb::{Aabb, Axis};
pub use scalar::{damped_approach, inverse_lerp_clamped, lerp, smoothstep, wrap_pi, wrap_signed_tau};
