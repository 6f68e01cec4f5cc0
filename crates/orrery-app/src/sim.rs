//! CPU side of a frame: advance the controller, place the bodies, derive
//! lights and draw items. No GPU access, so the whole frame contract is
//! testable headless.

use orrery_animation::{
    AbsorptionEvent, AnimationError, AnimationParams, AnimationState, CentralBody, MaterialVariant,
    OrbitLayout, OrbitSnapshot, OrbitingBody, RingSpec, SpeedInput, satellite_ring,
};
use orrery_config::Config;
use orrery_lighting::{LightSet, MAX_POINT_LIGHTS, MAX_SHADOW_CASTERS, PointShadowConfig, SceneLightParams};
use orrery_math::Aabb;
use orrery_render::{DrawItem, FrameParams, MaterialSlot, ShadingMode};
use tracing::{debug, info};

/// Per-frame constants that do not belong to the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimSettings {
    /// Lights driven while not absorbed, at most [`MAX_POINT_LIGHTS`].
    pub light_cap: usize,
    /// Lights that also get a shadow cube, at most [`MAX_SHADOW_CASTERS`].
    pub caster_cap: usize,
    pub shadow_near: f32,
    pub shadow_far: f32,
    pub shadow_depth_bias: f32,
    pub ambient: f32,
    pub glow_max: f32,
    pub trace_speed: bool,
}

pub struct OrrerySim {
    params: AnimationParams,
    state: AnimationState,
    bodies: Vec<OrbitingBody>,
    layout: OrbitLayout,
    central: CentralBody,
    settings: SimSettings,
    last_event: Option<AbsorptionEvent>,
    last_speed_change: Option<(f32, f32)>,
}

impl OrrerySim {
    pub fn new(
        params: AnimationParams,
        bodies: Vec<OrbitingBody>,
        central: CentralBody,
        settings: SimSettings,
    ) -> Self {
        let layout = OrbitLayout::new(&bodies, &central);
        Self {
            state: AnimationState::new(&params),
            params,
            bodies,
            layout,
            central,
            settings,
            last_event: None,
            last_speed_change: None,
        }
    }

    /// Normalise both meshes from their model-space bounds and build the
    /// satellite ring the config describes.
    pub fn from_config(
        config: &Config,
        central_bounds: &Aabb,
        satellite_bounds: &Aabb,
    ) -> Result<Self, AnimationError> {
        let scene = &config.scene;
        let central = CentralBody::from_bounds(central_bounds, scene.central_target_size)?;
        let params = AnimationParams::from_config(&config.animation, central.min_radius());
        let bodies = satellite_ring(
            satellite_bounds,
            &RingSpec {
                count: scene.satellite_count as usize,
                target_size: scene.satellite_target_size,
                orbit_frequency: scene.orbit_frequency,
                orbit_frequency_spread: scene.orbit_frequency_spread,
                spin_frequency: scene.spin_frequency,
            },
        )?;

        let settings = SimSettings {
            light_cap: bodies.len().min(MAX_POINT_LIGHTS),
            caster_cap: (config.render.max_shadow_casters as usize).min(MAX_SHADOW_CASTERS),
            shadow_near: config.render.shadow_near,
            shadow_far: PointShadowConfig::far_for_orbit(params.radii.max, params.radii.min),
            shadow_depth_bias: config.render.shadow_depth_bias,
            ambient: config.render.ambient,
            glow_max: config.render.glow_max,
            trace_speed: config.debug.trace_speed,
        };

        info!(
            "Orbit radii {:.3}..{:.3}, absorb epsilon {:.4}, {} satellites, {} lights, {} casters",
            params.radii.min,
            params.radii.max,
            params.absorb_epsilon,
            bodies.len(),
            settings.light_cap,
            settings.caster_cap
        );

        Ok(Self::new(params, bodies, central, settings))
    }

    pub fn params(&self) -> &AnimationParams {
        &self.params
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Transition reported by the most recent frame.
    pub fn last_event(&self) -> Option<AbsorptionEvent> {
        self.last_event
    }

    /// Speed before and after the most recent frame's speed command.
    pub fn last_speed_change(&self) -> Option<(f32, f32)> {
        self.last_speed_change
    }

    pub fn shadow_config(&self, resolution: u32) -> PointShadowConfig {
        PointShadowConfig {
            resolution,
            near: self.settings.shadow_near,
            far: self.settings.shadow_far,
            depth_bias: self.settings.shadow_depth_bias,
        }
    }

    /// Advance one frame and describe what to draw.
    pub fn frame(&mut self, dt: f32, input: SpeedInput) -> FrameParams {
        let speed_before = self.state.speed_scale();
        let event = self.state.advance(&self.params, dt, input);
        self.last_event = event;
        self.last_speed_change = match input {
            SpeedInput::Hold => None,
            _ => {
                let speed_after = self.state.speed_scale();
                debug!(from = speed_before, to = speed_after, ?input, "speed changed");
                Some((speed_before, speed_after))
            }
        };
        match event {
            Some(AbsorptionEvent::Entered) => info!(
                "Absorption entered at speed {:.2}: lights off, absorbed material",
                self.state.speed_scale()
            ),
            Some(AbsorptionEvent::Exited) => info!(
                "Absorption exited at speed {:.2}: lights restored",
                self.state.speed_scale()
            ),
            None => {}
        }
        if self.settings.trace_speed {
            debug!(
                speed = self.state.speed_scale(),
                radius = self.state.current_radius(),
                tilt = self.state.tilt(),
                omega = self.state.central_angular_velocity(),
                reflect = self.state.reflect_strength(),
                "animation state"
            );
        }

        let snapshot =
            self.layout
                .compute(&self.state, &self.bodies, &self.central, self.state.last_dt());
        self.frame_params(&snapshot)
    }

    fn frame_params(&self, snapshot: &OrbitSnapshot) -> FrameParams {
        let state = &self.state;
        let active = state.active_light_count(self.bodies.len(), self.settings.light_cap);
        let lights = LightSet::build(
            &snapshot.light_positions(active),
            active,
            self.settings.caster_cap,
        );

        let light_params = SceneLightParams {
            shadows_enabled: lights.caster_count() > 0,
            shadow_far_plane: self.settings.shadow_far,
            shadow_depth_bias: self.settings.shadow_depth_bias,
            reflect_enabled: state.reflect_enabled(),
            reflect_strength: state.reflect_strength(),
            glow_intensity: state.glow_intensity(self.settings.glow_max),
            ambient: self.settings.ambient,
        };

        let central = DrawItem {
            model: snapshot.central_transform,
            mode: ShadingMode::Lit,
            material: match state.material_variant() {
                MaterialVariant::Primary => MaterialSlot::CentralPrimary,
                MaterialVariant::Absorbed => MaterialSlot::CentralAbsorbed,
            },
        };
        let satellites = snapshot
            .body_transforms()
            .map(|model| DrawItem {
                model,
                mode: ShadingMode::Emissive,
                material: MaterialSlot::Satellite,
            })
            .collect();

        FrameParams {
            lights,
            light_params,
            central,
            satellites,
            absorbed: state.is_absorbed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    fn sim(satellites: u32, casters: u32) -> OrrerySim {
        let mut config = Config::default();
        config.scene.satellite_count = satellites;
        config.render.max_shadow_casters = casters;
        OrrerySim::from_config(&config, &unit_box(), &unit_box()).unwrap()
    }

    /// Drive the speed to the ceiling and run until absorbed.
    fn absorb(sim: &mut OrrerySim) {
        let ceiling = sim.params().speed_ceiling;
        sim.frame(0.016, SpeedInput::Set(ceiling));
        for _ in 0..2000 {
            if sim.state().is_absorbed() {
                return;
            }
            sim.frame(0.016, SpeedInput::Hold);
        }
        panic!("never absorbed");
    }

    #[test]
    fn test_initial_frame_lights_every_satellite() {
        let mut sim = sim(6, 8);
        let frame = sim.frame(0.016, SpeedInput::Hold);
        assert_eq!(frame.lights.len(), 6);
        assert_eq!(frame.lights.caster_count(), 6);
        assert_eq!(frame.satellites.len(), 6);
        assert!(frame.light_params.shadows_enabled);
        assert!(!frame.light_params.reflect_enabled);
        assert_eq!(frame.central.material, MaterialSlot::CentralPrimary);
        assert_eq!(frame.draw_items().count(), 7);
    }

    #[test]
    fn test_lights_sit_on_satellites() {
        let mut sim = sim(4, 4);
        let frame = sim.frame(0.016, SpeedInput::Hold);
        for (light, item) in frame.lights.lights().iter().zip(&frame.satellites) {
            let body_position = item.model.w_axis.truncate();
            assert!((light.position - body_position).length() < 1e-5);
        }
    }

    #[test]
    fn test_caster_cap_leaves_extra_lights_unshadowed() {
        let mut sim = sim(8, 3);
        let frame = sim.frame(0.016, SpeedInput::Hold);
        assert_eq!(frame.lights.len(), 8);
        assert_eq!(frame.lights.caster_count(), 3);
        assert_eq!(frame.lights.lights()[3].shadow_slot, None);
    }

    #[test]
    fn test_absorption_disables_lights_and_satellites() {
        let mut sim = sim(8, 8);
        absorb(&mut sim);
        assert_eq!(sim.last_event(), Some(AbsorptionEvent::Entered));

        let frame = sim.frame(0.016, SpeedInput::Hold);
        assert!(frame.lights.is_empty());
        assert!(!frame.light_params.shadows_enabled);
        assert!(frame.light_params.reflect_enabled);
        assert!(frame.light_params.reflect_strength > 0.0);
        assert_eq!(frame.central.material, MaterialSlot::CentralAbsorbed);
        assert_eq!(frame.draw_items().count(), 1);
    }

    #[test]
    fn test_glow_ramps_while_absorbed() {
        let mut sim = sim(8, 8);
        absorb(&mut sim);
        let first = sim.frame(0.016, SpeedInput::Hold).light_params.glow_intensity;
        for _ in 0..200 {
            sim.frame(0.016, SpeedInput::Hold);
        }
        let later = sim.frame(0.016, SpeedInput::Hold).light_params.glow_intensity;
        assert!(later > first);
        assert!(later <= sim.settings().glow_max + 1e-6);
    }

    #[test]
    fn test_release_restores_lights() {
        let mut sim = sim(5, 8);
        absorb(&mut sim);
        sim.frame(0.016, SpeedInput::Set(0.0));
        let mut restored = None;
        for _ in 0..2000 {
            let frame = sim.frame(0.016, SpeedInput::Hold);
            if !sim.state().is_absorbed() {
                restored = Some(frame);
                break;
            }
        }
        let frame = restored.expect("never released");
        assert_eq!(frame.lights.len(), 5);
        assert_eq!(frame.central.material, MaterialSlot::CentralPrimary);
        assert!(!frame.light_params.reflect_enabled);
        assert_eq!(frame.light_params.glow_intensity, 0.0);
    }

    #[test]
    fn test_speed_commands_are_recorded() {
        let mut sim = sim(3, 3);
        let start = sim.state().speed_scale();
        let step = sim.params().speed_step;

        sim.frame(0.016, SpeedInput::INCREASE);
        let (from, to) = sim.last_speed_change().unwrap();
        assert_eq!(from, start);
        assert!((to - (start + step)).abs() < 1e-6);

        sim.frame(0.016, SpeedInput::Hold);
        assert_eq!(sim.last_speed_change(), None);
    }

    #[test]
    fn test_speed_command_at_ceiling_still_recorded() {
        let mut sim = sim(3, 3);
        let ceiling = sim.params().speed_ceiling;
        sim.frame(0.016, SpeedInput::Set(ceiling));
        sim.frame(0.016, SpeedInput::INCREASE);
        assert_eq!(sim.last_speed_change(), Some((ceiling, ceiling)));
    }

    #[test]
    fn test_shadow_far_covers_widest_orbit() {
        let sim = sim(3, 3);
        let radii = sim.params().radii;
        let config = sim.shadow_config(512);
        assert_eq!(config.resolution, 512);
        assert!(config.far >= radii.max + radii.min);
    }

    #[test]
    fn test_degenerate_mesh_is_rejected() {
        let flat = Aabb::new(Vec3::ZERO, Vec3::ZERO);
        let result = OrrerySim::from_config(&Config::default(), &flat, &unit_box());
        assert!(result.is_err());
    }
}
