//! Scene construction: config checks, asset loading and GPU resources.
//!
//! Any failure here is fatal; the caller logs it and exits.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use orrery_animation::{AnimationError, SpeedInput};
use orrery_assets::{
    AssetError, CubemapImages, ImageData, MeshData, load_cubemap_faces, load_image_rgba,
    load_obj_mesh,
};
use orrery_config::{Config, ConfigError, SceneConfig};
use orrery_lighting::{MAX_POINT_LIGHTS, MAX_SHADOW_CASTERS};
use orrery_render::{
    BufferAllocator, DepthBuffer, FrameEncoder, GpuCubemap, GpuTexture, MainPassShaders,
    MainRenderPass, MeshBuffer, RenderContext, RenderContextError, SAMPLED_TEXTURES_PER_STAGE,
    SCENE_SHADER_SOURCE, SHADOW_SHADER_SOURCE, SKYBOX_SHADER_SOURCE, SceneTextures, ShaderError,
    ShaderLibrary, ShadowPassManager, SurfaceError, init_render_context_blocking,
};
use tracing::{info, warn};
use winit::window::Window;

use crate::fly_camera::FlyCamera;
use crate::platform::PlatformError;
use crate::sim::OrrerySim;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{count} satellites requested, the scene shader supports at most {max}")]
    TooManySatellites { count: u32, max: usize },

    #[error("{count} shadow casters requested, the scene shader binds at most {max}")]
    TooManyShadowCasters { count: u32, max: usize },

    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("scene layout error: {0}")]
    Animation(#[from] AnimationError),

    #[error("GPU initialization failed: {0}")]
    RenderContext(#[from] RenderContextError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Limits that follow from the GPU-side layouts rather than from the
/// config's own consistency.
pub fn check_caps(config: &Config) -> Result<(), SetupError> {
    let satellites = config.scene.satellite_count;
    if satellites as usize > MAX_POINT_LIGHTS {
        return Err(SetupError::TooManySatellites {
            count: satellites,
            max: MAX_POINT_LIGHTS,
        });
    }
    let casters = config.render.max_shadow_casters;
    if casters as usize > MAX_SHADOW_CASTERS {
        return Err(SetupError::TooManyShadowCasters {
            count: casters,
            max: MAX_SHADOW_CASTERS,
        });
    }
    if satellites > casters {
        warn!(
            "{} satellites but only {} shadow casters; the remaining lights cast no shadows",
            satellites, casters
        );
    }
    Ok(())
}

/// Decoded scene inputs, loaded before any GPU work.
pub struct SceneAssets {
    pub central_mesh: MeshData,
    pub satellite_mesh: MeshData,
    pub central_texture: ImageData,
    pub central_absorbed_texture: ImageData,
    pub satellite_texture: ImageData,
    pub skybox: CubemapImages,
}

impl SceneAssets {
    pub fn load(scene: &SceneConfig) -> Result<Self, SetupError> {
        let central_mesh = load_obj_mesh(&scene.resolve(&scene.central_mesh))?;
        let satellite_mesh = load_obj_mesh(&scene.resolve(&scene.satellite_mesh))?;
        info!(
            "Meshes loaded: central {} triangles, satellite {} triangles",
            central_mesh.triangle_count(),
            satellite_mesh.triangle_count()
        );

        Ok(Self {
            central_mesh,
            satellite_mesh,
            central_texture: load_image_rgba(&scene.resolve(&scene.central_texture))?,
            central_absorbed_texture: load_image_rgba(
                &scene.resolve(&scene.central_absorbed_texture),
            )?,
            satellite_texture: load_image_rgba(&scene.resolve(&scene.satellite_texture))?,
            skybox: load_cubemap_faces(&scene.resolve(&scene.skybox_dir))?,
        })
    }
}

/// Everything a frame needs once the window exists.
pub struct Scene {
    gpu: RenderContext,
    depth: DepthBuffer,
    shadows: ShadowPassManager,
    main_pass: MainRenderPass,
    central_mesh: MeshBuffer,
    satellite_mesh: MeshBuffer,
    sim: OrrerySim,
    fly: FlyCamera,
}

impl Scene {
    pub fn new(window: Arc<Window>, config: &Config, assets: SceneAssets) -> Result<Self, SetupError> {
        let sim = OrrerySim::from_config(
            config,
            &assets.central_mesh.bounds,
            &assets.satellite_mesh.bounds,
        )?;

        let gpu = init_render_context_blocking(
            window,
            config.window.vsync,
            SAMPLED_TEXTURES_PER_STAGE,
        )?;
        let device = &gpu.device;
        let queue = &gpu.queue;

        let mut shaders = ShaderLibrary::new();
        let shadow_shader = shaders.load_from_source(device, "shadow", SHADOW_SHADER_SOURCE)?;
        let scene_shader = shaders.load_from_source(device, "scene", SCENE_SHADER_SOURCE)?;
        let skybox_shader = shaders.load_from_source(device, "skybox", SKYBOX_SHADER_SOURCE)?;

        let allocator = BufferAllocator::new(device);
        let central_mesh = allocator.upload_mesh("central-mesh", &assets.central_mesh);
        let satellite_mesh = allocator.upload_mesh("satellite-mesh", &assets.satellite_mesh);

        let central_texture = GpuTexture::from_image(device, queue, "central", &assets.central_texture);
        let absorbed_texture = GpuTexture::from_image(
            device,
            queue,
            "central-absorbed",
            &assets.central_absorbed_texture,
        );
        let satellite_texture =
            GpuTexture::from_image(device, queue, "satellite", &assets.satellite_texture);
        let environment = GpuCubemap::from_faces(device, queue, &assets.skybox);

        let shadows = ShadowPassManager::new(
            device,
            &shadow_shader,
            sim.shadow_config(config.render.shadow_resolution),
            sim.settings().caster_cap,
        );

        let fly = FlyCamera::from_config(&config.camera);
        let camera = fly.camera(gpu.aspect_ratio());
        let main_pass = MainRenderPass::new(
            device,
            MainPassShaders {
                scene: &scene_shader,
                skybox: &skybox_shader,
            },
            gpu.surface_format,
            &camera,
            &shadows,
            &environment,
            SceneTextures {
                central_primary: &central_texture,
                central_absorbed: &absorbed_texture,
                satellite: &satellite_texture,
            },
            1 + sim.body_count(),
        );

        let depth = DepthBuffer::new(
            device,
            gpu.surface_config.width,
            gpu.surface_config.height,
        );

        info!(
            "Scene ready: {} satellites, shadow far plane {:.2}",
            sim.body_count(),
            shadows.far_plane()
        );

        Ok(Self {
            gpu,
            depth,
            shadows,
            main_pass,
            central_mesh,
            satellite_mesh,
            sim,
            fly,
        })
    }

    pub fn sim(&self) -> &OrrerySim {
        &self.sim
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.depth.resize(&self.gpu.device, width, height);
    }

    /// Advance the simulation and camera by `dt`, then draw and present.
    pub fn render_frame(
        &mut self,
        dt: f32,
        input: SpeedInput,
        look: Vec2,
        movement: Vec3,
    ) -> Result<(), SurfaceError> {
        self.fly.look(look);
        self.fly.translate(movement, dt);
        let frame = self.sim.frame(dt, input);
        let camera = self.fly.camera(self.gpu.aspect_ratio());

        let surface_texture = self.gpu.get_current_texture()?;
        let queue = self.gpu.queue.clone();
        let mut frame_encoder = FrameEncoder::new(&self.gpu.device, queue.clone(), surface_texture);
        if let Some((encoder, view)) = frame_encoder.parts() {
            self.shadows.render(
                encoder,
                &queue,
                &frame.lights.caster_positions(),
                frame.central.model,
                &self.central_mesh,
            );
            self.main_pass.render(
                encoder,
                &queue,
                view,
                &self.depth,
                &camera,
                &frame,
                &self.central_mesh,
                &self.satellite_mesh,
            );
        }
        frame_encoder.submit();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caps_pass() {
        assert!(check_caps(&Config::default()).is_ok());
    }

    #[test]
    fn test_too_many_satellites_is_fatal() {
        let mut config = Config::default();
        config.scene.satellite_count = MAX_POINT_LIGHTS as u32 + 1;
        assert!(matches!(
            check_caps(&config),
            Err(SetupError::TooManySatellites { count: 9, max: 8 })
        ));
    }

    #[test]
    fn test_too_many_casters_is_fatal() {
        let mut config = Config::default();
        config.render.max_shadow_casters = 12;
        assert!(matches!(
            check_caps(&config),
            Err(SetupError::TooManyShadowCasters { count: 12, .. })
        ));
    }

    #[test]
    fn test_fewer_casters_than_satellites_is_allowed() {
        let mut config = Config::default();
        config.scene.satellite_count = 8;
        config.render.max_shadow_casters = 2;
        assert!(check_caps(&config).is_ok());
    }

    #[test]
    fn test_missing_assets_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let mut scene = SceneConfig::default();
        scene.asset_root = tmp.path().to_path_buf();
        let err = SceneAssets::load(&scene).err().unwrap();
        assert!(matches!(err, SetupError::Asset(AssetError::NotFound(_))));
    }
}
