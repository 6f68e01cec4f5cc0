//! Speed-driven orbital animation.
//!
//! A single scalar speed drives the orbit radius, the wobble of the orbital
//! plane, the spin of the central body and a latched "absorbed" mode. All of
//! it lives in one [`AnimationState`] value so the controller can be stepped
//! and tested without a GPU. [`OrbitLayout`] turns a state into per-body
//! transforms and light positions for one frame.

mod body;
mod central;
mod error;
mod layout;
mod params;
mod state;

pub use body::{OrbitingBody, OrientationCorrection, RingSpec, SpinAxis, satellite_ring};
pub use central::CentralBody;
pub use error::AnimationError;
pub use layout::{BodyPose, OrbitLayout, OrbitSnapshot};
pub use params::{AnimationParams, OrbitRadii};
pub use state::{AbsorptionEvent, AnimationState, MaterialVariant, SpeedInput, Step};
