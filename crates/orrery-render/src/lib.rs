//! wgpu rendering for the orrery: device and surface setup, the per-light
//! shadow cubemap pass, the skybox and the main scene pass.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod main_pass;
pub mod pass;
pub mod scene_pipeline;
pub mod shader;
pub mod shadow_pass;
pub mod skybox;
pub mod texture;

pub use buffer::{BufferAllocator, IndexData, MeshBuffer, VertexPositionNormalUv};
pub use camera::{Camera, CameraBinding, CameraUniform};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use main_pass::{
    DrawItem, FrameParams, MainPassShaders, MainRenderPass, MaterialSlot, SceneMaterials,
    SceneTextures, ShadingMode,
};
pub use pass::{FrameEncoder, RenderPassBuilder, SPACE_BLACK};
pub use scene_pipeline::{ObjectUniform, SAMPLED_TEXTURES_PER_STAGE, SCENE_SHADER_SOURCE, ScenePipeline};
pub use shader::{ShaderError, ShaderLibrary};
pub use shadow_pass::{SHADOW_SHADER_SOURCE, ShadowPassManager};
pub use skybox::{SKYBOX_SHADER_SOURCE, SkyboxRenderer};
pub use texture::{GpuCubemap, GpuTexture, placeholder_depth_cube};
