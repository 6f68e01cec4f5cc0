//! The main colour pass: environment, central body, satellites.

use glam::Mat4;
use orrery_lighting::{LightSet, LightsUniform, SceneLightParams, WARM_WHITE};

use crate::buffer::MeshBuffer;
use crate::camera::{Camera, CameraBinding};
use crate::depth::DepthBuffer;
use crate::pass::RenderPassBuilder;
use crate::scene_pipeline::{ObjectUniform, ScenePipeline};
use crate::shadow_pass::ShadowPassManager;
use crate::skybox::SkyboxRenderer;
use crate::texture::{GpuCubemap, GpuTexture};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadingMode {
    /// Ambient, point lights with shadows, reflection and glow.
    Lit,
    /// Texture tinted warm white, no lighting.
    Emissive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialSlot {
    CentralPrimary,
    CentralAbsorbed,
    Satellite,
}

impl MaterialSlot {
    /// Central materials are drawn with the central mesh.
    pub fn is_central(self) -> bool {
        !matches!(self, MaterialSlot::Satellite)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub model: Mat4,
    pub mode: ShadingMode,
    pub material: MaterialSlot,
}

impl DrawItem {
    pub fn object_uniform(&self) -> ObjectUniform {
        match self.mode {
            ShadingMode::Lit => ObjectUniform::lit(self.model),
            ShadingMode::Emissive => ObjectUniform::emissive(self.model, WARM_WHITE),
        }
    }
}

/// Everything the renderer needs from the simulation for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameParams {
    pub lights: LightSet,
    pub light_params: SceneLightParams,
    pub central: DrawItem,
    pub satellites: Vec<DrawItem>,
    /// Satellites are not drawn while absorbed.
    pub absorbed: bool,
}

impl FrameParams {
    /// Draw order after the skybox: central body first, then satellites.
    pub fn draw_items(&self) -> impl Iterator<Item = &DrawItem> {
        let satellites: &[DrawItem] = if self.absorbed { &[] } else { &self.satellites };
        std::iter::once(&self.central).chain(satellites)
    }

    pub fn object_uniforms(&self) -> Vec<ObjectUniform> {
        self.draw_items().map(DrawItem::object_uniform).collect()
    }

    pub fn lights_uniform(&self) -> LightsUniform {
        LightsUniform::new(&self.lights, &self.light_params)
    }
}

/// Material bind groups, one per [`MaterialSlot`].
pub struct SceneMaterials {
    central_primary: wgpu::BindGroup,
    central_absorbed: wgpu::BindGroup,
    satellite: wgpu::BindGroup,
}

impl SceneMaterials {
    pub fn new(
        device: &wgpu::Device,
        pipeline: &ScenePipeline,
        central_primary: &GpuTexture,
        central_absorbed: &GpuTexture,
        satellite: &GpuTexture,
    ) -> Self {
        Self {
            central_primary: pipeline.material_bind_group(device, "central-material", central_primary),
            central_absorbed: pipeline.material_bind_group(device, "central-absorbed-material", central_absorbed),
            satellite: pipeline.material_bind_group(device, "satellite-material", satellite),
        }
    }

    pub fn get(&self, slot: MaterialSlot) -> &wgpu::BindGroup {
        match slot {
            MaterialSlot::CentralPrimary => &self.central_primary,
            MaterialSlot::CentralAbsorbed => &self.central_absorbed,
            MaterialSlot::Satellite => &self.satellite,
        }
    }
}

/// The three material textures uploaded at startup.
pub struct SceneTextures<'a> {
    pub central_primary: &'a GpuTexture,
    pub central_absorbed: &'a GpuTexture,
    pub satellite: &'a GpuTexture,
}

/// Owns the camera binding and the two pipelines of the colour pass.
pub struct MainRenderPass {
    camera: CameraBinding,
    skybox: SkyboxRenderer,
    scene: ScenePipeline,
    materials: SceneMaterials,
}

pub struct MainPassShaders<'a> {
    pub scene: &'a wgpu::ShaderModule,
    pub skybox: &'a wgpu::ShaderModule,
}

impl MainRenderPass {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        shaders: MainPassShaders<'_>,
        surface_format: wgpu::TextureFormat,
        camera: &Camera,
        shadows: &ShadowPassManager,
        environment: &GpuCubemap,
        textures: SceneTextures<'_>,
        max_objects: usize,
    ) -> Self {
        let camera = CameraBinding::new(device, camera);
        let skybox = SkyboxRenderer::new(device, shaders.skybox, surface_format, &camera, environment);
        let scene = ScenePipeline::new(
            device,
            shaders.scene,
            surface_format,
            &camera,
            shadows,
            environment,
            max_objects,
        );
        let materials = SceneMaterials::new(
            device,
            &scene,
            textures.central_primary,
            textures.central_absorbed,
            textures.satellite,
        );

        Self {
            camera,
            skybox,
            scene,
            materials,
        }
    }

    /// Encode the colour pass into `target`.
    ///
    /// Shadow cubes must already be encoded earlier in the same command buffer.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        depth: &DepthBuffer,
        camera: &Camera,
        frame: &FrameParams,
        central_mesh: &MeshBuffer,
        satellite_mesh: &MeshBuffer,
    ) {
        self.camera.update(queue, camera);
        let objects = frame.object_uniforms();
        let written = self.scene.write_frame(queue, &frame.lights_uniform(), &objects);

        let mut pass = RenderPassBuilder::new()
            .depth_clear(DepthBuffer::CLEAR_VALUE)
            .label("main-pass")
            .begin(encoder, Some(target), Some(&depth.view));

        self.skybox.render(&mut pass, &self.camera);

        pass.set_bind_group(0, &self.camera.bind_group, &[]);
        for (index, item) in frame.draw_items().take(written).enumerate() {
            let mesh = if item.material.is_central() {
                central_mesh
            } else {
                satellite_mesh
            };
            self.scene
                .draw(&mut pass, index, self.materials.get(item.material), mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn frame(absorbed: bool, satellites: usize) -> FrameParams {
        let positions: Vec<Vec3> = (0..satellites).map(|i| Vec3::X * (i as f32 + 1.0)).collect();
        FrameParams {
            lights: if absorbed {
                LightSet::empty()
            } else {
                LightSet::build(&positions, satellites, satellites)
            },
            light_params: SceneLightParams {
                shadows_enabled: !absorbed,
                shadow_far_plane: 20.0,
                shadow_depth_bias: 0.015,
                reflect_enabled: absorbed,
                reflect_strength: 0.5,
                glow_intensity: 0.75,
                ambient: 0.08,
            },
            central: DrawItem {
                model: Mat4::IDENTITY,
                mode: ShadingMode::Lit,
                material: if absorbed {
                    MaterialSlot::CentralAbsorbed
                } else {
                    MaterialSlot::CentralPrimary
                },
            },
            satellites: positions
                .iter()
                .map(|&p| DrawItem {
                    model: Mat4::from_translation(p),
                    mode: ShadingMode::Emissive,
                    material: MaterialSlot::Satellite,
                })
                .collect(),
            absorbed,
        }
    }

    #[test]
    fn test_central_is_drawn_before_satellites() {
        let frame = frame(false, 3);
        let items: Vec<_> = frame.draw_items().collect();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].mode, ShadingMode::Lit);
        assert!(items[0].material.is_central());
        assert!(items[1..].iter().all(|i| i.mode == ShadingMode::Emissive));
    }

    #[test]
    fn test_satellites_skipped_while_absorbed() {
        let frame = frame(true, 3);
        let items: Vec<_> = frame.draw_items().collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].material, MaterialSlot::CentralAbsorbed);
        assert_eq!(frame.lights_uniform().counts[0], 0);
    }

    #[test]
    fn test_object_uniforms_follow_draw_order() {
        let frame = frame(false, 2);
        let objects = frame.object_uniforms();
        assert_eq!(objects.len(), 3);
        assert!(!objects[0].is_emissive());
        assert!(objects[2].is_emissive());
        assert_eq!(objects[2].model, Mat4::from_translation(Vec3::X * 2.0).to_cols_array_2d());
    }

    #[test]
    fn test_lights_uniform_carries_reflect_while_absorbed() {
        let uniform = frame(true, 2).lights_uniform();
        assert_eq!(uniform.counts[2], 1);
        assert!((uniform.shadow_reflect[2] - 0.5).abs() < 1e-6);
        let lit = frame(false, 2).lights_uniform();
        assert_eq!(lit.counts, [2, 1, 0, 0]);
    }
}
