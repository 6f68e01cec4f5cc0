//! Omnidirectional shadows: six 90-degree views per light into a depth cubemap.
//!
//! Each face stores `distance(light, fragment) / far` rather than projected
//! depth, so the shading stage can compare against the same linear value it
//! computes from the light-to-fragment vector.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Number of cubemap bindings the scene shader declares.
pub const MAX_SHADOW_CASTERS: usize = 8;

/// Cubemap face in layer order `+X, -X, +Y, -Y, +Z, -Z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Array layer of this face in a cube texture.
    pub fn layer(self) -> u32 {
        self as u32
    }

    pub fn forward(self) -> Vec3 {
        match self {
            CubeFace::PosX => Vec3::X,
            CubeFace::NegX => Vec3::NEG_X,
            CubeFace::PosY => Vec3::Y,
            CubeFace::NegY => Vec3::NEG_Y,
            CubeFace::PosZ => Vec3::Z,
            CubeFace::NegZ => Vec3::NEG_Z,
        }
    }

    /// Up vectors of the cubemap face convention; with them the six faces
    /// meet without seams.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PosY => Vec3::Z,
            CubeFace::NegY => Vec3::NEG_Z,
            _ => Vec3::NEG_Y,
        }
    }
}

/// View-projection per face, indexed by [`CubeFace::layer`].
///
/// 90 degree field of view, unit aspect. The projection is mirrored in Y
/// because render targets put NDC +Y in texel row 0 while cube sampling
/// addresses row 0 with the face's `-t` direction.
pub fn cube_face_view_projections(light: Vec3, near: f32, far: f32) -> [Mat4; 6] {
    let proj = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far);
    CubeFace::ALL.map(|face| proj * Mat4::look_at_rh(light, light + face.forward(), face.up()))
}

/// Fixed parameters of every shadow cubemap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointShadowConfig {
    /// Face edge length in texels.
    pub resolution: u32,
    pub near: f32,
    /// Distance normalisation and projection far plane.
    pub far: f32,
    /// Subtracted from the stored normalised distance before comparing.
    pub depth_bias: f32,
}

impl PointShadowConfig {
    /// Far plane that covers the whole scene from any light position: the
    /// widest orbit plus the central body's full extent.
    pub fn far_for_orbit(max_radius: f32, min_radius: f32) -> f32 {
        max_radius + 2.0 * min_radius
    }
}

/// Per (light, face) draw data, 160 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShadowFaceUniform {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    /// xyz = light position, w = far plane.
    pub light_pos_far: [f32; 4],
    pub _padding: [f32; 4],
}

impl ShadowFaceUniform {
    pub fn new(view_proj: Mat4, model: Mat4, light: Vec3, far: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            light_pos_far: light.extend(far).to_array(),
            _padding: [0.0; 4],
        }
    }
}

/// Round `size` up to a multiple of `alignment` (a power of two).
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// Fixed pool of caster slots, of which a prefix is active each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CasterSlots {
    capacity: usize,
    active: usize,
}

impl CasterSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            active: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Activate the first `requested` slots. Requests beyond capacity are
    /// clamped; the excess is reported once per call at debug level.
    pub fn activate(&mut self, requested: usize) -> usize {
        if requested > self.capacity {
            log::debug!(
                "{} shadow casters requested, {} slots available",
                requested,
                self.capacity
            );
        }
        self.active = requested.min(self.capacity);
        self.active
    }
}
