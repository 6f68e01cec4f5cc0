//! Point lights carried by the satellites and the omnidirectional shadow
//! math that goes with them: cube-face matrices, caster slot bookkeeping
//! and the GPU layouts shared with the shaders.

mod point;
mod shadow;

pub use point::{
    LightSet, LightsUniform, MAX_POINT_LIGHTS, NO_SHADOW_SLOT, PointLight, PointLightGpu,
    SceneLightParams, WARM_WHITE,
};
pub use shadow::{
    CasterSlots, CubeFace, MAX_SHADOW_CASTERS, PointShadowConfig, ShadowFaceUniform,
    aligned_stride, cube_face_view_projections,
};
