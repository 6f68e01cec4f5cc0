//! Point lights: one per satellite, fixed warm-white colour.
//!
//! [`LightSet`] decides which lights exist this frame and which of them get
//! a shadow cubemap; [`LightsUniform`] is the std140 block the scene shader reads.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Size of the light array in the scene shader.
pub const MAX_POINT_LIGHTS: usize = 8;

/// Linear RGB shared by every satellite light.
pub const WARM_WHITE: Vec3 = Vec3::new(1.0, 0.86, 0.68);

/// Written into `PointLightGpu::position[3]` for lights without a cubemap.
pub const NO_SHADOW_SLOT: f32 = -1.0;

/// CPU-side point light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    /// Linear RGB.
    pub color: Vec3,
    pub intensity: f32,
    /// Index of the shadow cubemap this light renders into, if any.
    pub shadow_slot: Option<usize>,
}

/// Per-light GPU data, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointLightGpu {
    /// xyz = world position, w = shadow slot or [`NO_SHADOW_SLOT`].
    pub position: [f32; 4],
    /// xyz = linear RGB, w = intensity.
    pub color: [f32; 4],
}

impl From<&PointLight> for PointLightGpu {
    fn from(light: &PointLight) -> Self {
        let slot = light.shadow_slot.map_or(NO_SHADOW_SLOT, |s| s as f32);
        Self {
            position: light.position.extend(slot).to_array(),
            color: light.color.extend(light.intensity).to_array(),
        }
    }
}

/// Lights active this frame, in body order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightSet {
    lights: Vec<PointLight>,
}

impl LightSet {
    /// No lights, as while absorbed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// One warm-white light per position, at most `light_cap` (and never more
    /// than [`MAX_POINT_LIGHTS`]). The first `caster_cap` lights get shadow
    /// slots `0..caster_cap`; any beyond that are lit but unshadowed.
    pub fn build(positions: &[Vec3], light_cap: usize, caster_cap: usize) -> Self {
        let lights = positions
            .iter()
            .take(light_cap.min(MAX_POINT_LIGHTS))
            .enumerate()
            .map(|(i, &position)| PointLight {
                position,
                color: WARM_WHITE,
                intensity: 1.0,
                shadow_slot: (i < caster_cap).then_some(i),
            })
            .collect();
        Self { lights }
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Positions of the shadowed lights, indexed by slot.
    pub fn caster_positions(&self) -> Vec<Vec3> {
        self.lights
            .iter()
            .filter(|l| l.shadow_slot.is_some())
            .map(|l| l.position)
            .collect()
    }

    pub fn caster_count(&self) -> usize {
        self.lights.iter().filter(|l| l.shadow_slot.is_some()).count()
    }
}

/// Frame-wide scalars that travel with the light array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLightParams {
    pub shadows_enabled: bool,
    pub shadow_far_plane: f32,
    pub shadow_depth_bias: f32,
    pub reflect_enabled: bool,
    pub reflect_strength: f32,
    pub glow_intensity: f32,
    pub ambient: f32,
}

/// std140 uniform block, 304 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightsUniform {
    /// x = light count, y = shadows enabled, z = reflect enabled, w = unused.
    pub counts: [u32; 4],
    /// x = shadow far plane, y = shadow depth bias, z = reflect strength, w = glow.
    pub shadow_reflect: [f32; 4],
    /// rgb = ambient colour, w = unused.
    pub ambient: [f32; 4],
    pub lights: [PointLightGpu; MAX_POINT_LIGHTS],
}

impl LightsUniform {
    pub fn new(set: &LightSet, params: &SceneLightParams) -> Self {
        let mut lights = [PointLightGpu::zeroed(); MAX_POINT_LIGHTS];
        for (dst, src) in lights.iter_mut().zip(set.lights()) {
            *dst = src.into();
        }
        let shadows = params.shadows_enabled && set.caster_count() > 0;
        Self {
            counts: [
                set.len() as u32,
                u32::from(shadows),
                u32::from(params.reflect_enabled),
                0,
            ],
            shadow_reflect: [
                params.shadow_far_plane,
                params.shadow_depth_bias,
                if params.reflect_enabled { params.reflect_strength } else { 0.0 },
                if params.reflect_enabled { params.glow_intensity } else { 0.0 },
            ],
            ambient: [params.ambient, params.ambient, params.ambient, 0.0],
            lights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32, 1.0, 0.0)).collect()
    }

    fn params() -> SceneLightParams {
        SceneLightParams {
            shadows_enabled: true,
            shadow_far_plane: 20.0,
            shadow_depth_bias: 0.01,
            reflect_enabled: false,
            reflect_strength: 0.7,
            glow_intensity: 1.2,
            ambient: 0.1,
        }
    }

    #[test]
    fn test_gpu_struct_sizes() {
        assert_eq!(std::mem::size_of::<PointLightGpu>(), 32);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 304);
        assert_eq!(std::mem::size_of::<LightsUniform>() % 16, 0);
    }

    #[test]
    fn test_build_assigns_slots_in_order() {
        let set = LightSet::build(&positions(5), 8, 8);
        assert_eq!(set.len(), 5);
        for (i, light) in set.lights().iter().enumerate() {
            assert_eq!(light.shadow_slot, Some(i));
            assert_eq!(light.color, WARM_WHITE);
        }
    }

    #[test]
    fn test_excess_lights_are_unshadowed() {
        let set = LightSet::build(&positions(8), 8, 3);
        assert_eq!(set.len(), 8);
        assert_eq!(set.caster_count(), 3);
        assert_eq!(set.lights()[2].shadow_slot, Some(2));
        assert_eq!(set.lights()[3].shadow_slot, None);
        assert_eq!(set.caster_positions(), positions(3));
    }

    #[test]
    fn test_light_cap_truncates() {
        assert_eq!(LightSet::build(&positions(8), 4, 8).len(), 4);
        assert_eq!(LightSet::build(&positions(12), 12, 12).len(), MAX_POINT_LIGHTS);
        assert!(LightSet::build(&positions(8), 0, 8).is_empty());
    }

    #[test]
    fn test_gpu_slot_encoding() {
        let set = LightSet::build(&positions(2), 8, 1);
        let gpu: Vec<PointLightGpu> = set.lights().iter().map(PointLightGpu::from).collect();
        assert_eq!(gpu[0].position, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(gpu[1].position[3], NO_SHADOW_SLOT);
        assert_eq!(gpu[1].color[3], 1.0);
    }

    #[test]
    fn test_uniform_flags() {
        let set = LightSet::build(&positions(3), 8, 8);
        let u = LightsUniform::new(&set, &params());
        assert_eq!(u.counts, [3, 1, 0, 0]);
        assert_eq!(u.shadow_reflect[0], 20.0);
        // Reflection disabled: strength and glow are zeroed.
        assert_eq!(u.shadow_reflect[2], 0.0);
        assert_eq!(u.shadow_reflect[3], 0.0);
        assert_eq!(u.lights[3], PointLightGpu::zeroed());
    }

    #[test]
    fn test_uniform_absorbed_frame() {
        let mut p = params();
        p.reflect_enabled = true;
        let u = LightsUniform::new(&LightSet::empty(), &p);
        assert_eq!(u.counts, [0, 0, 1, 0]);
        assert_eq!(u.shadow_reflect[2], 0.7);
        assert_eq!(u.shadow_reflect[3], 1.2);
    }
}
