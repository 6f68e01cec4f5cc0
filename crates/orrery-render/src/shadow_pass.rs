//! Per-light depth cubemaps.
//!
//! Each caster slot owns a six-layer depth texture. Every frame the active
//! slots are redrawn from their light's position, one pass per face, with
//! the face's matrices selected from a single uniform buffer by dynamic
//! offset. Stored values are linear light distance divided by the far plane.

use std::num::NonZeroU64;

use glam::{Mat4, Vec3};
use orrery_lighting::{
    CasterSlots, CubeFace, PointShadowConfig, ShadowFaceUniform, aligned_stride,
    cube_face_view_projections,
};

use crate::buffer::{MeshBuffer, VertexPositionNormalUv};
use crate::pass::RenderPassBuilder;

pub const SHADOW_SHADER_SOURCE: &str = r#"
struct FaceUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    light_pos_far: vec4<f32>,
    _padding: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> face: FaceUniform;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
};

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> VertexOutput {
    let world = face.model * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    out.clip_position = face.view_proj * world;
    out.world_position = world.xyz;
    return out;
}

@fragment
fn fs_shadow(in: VertexOutput) -> @builtin(frag_depth) f32 {
    let dist = length(in.world_position - face.light_pos_far.xyz);
    return clamp(dist / face.light_pos_far.w, 0.0, 1.0);
}
"#;

const FACE_UNIFORM_SIZE: u64 = size_of::<ShadowFaceUniform>() as u64;

/// Linear depth is cleared to the far plane.
const SHADOW_CLEAR_DEPTH: f32 = 1.0;

struct ShadowCube {
    face_views: [wgpu::TextureView; 6],
    cube_view: wgpu::TextureView,
}

impl ShadowCube {
    fn new(device: &wgpu::Device, slot: usize, resolution: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow-cube"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ShadowPassManager::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let face_views = CubeFace::ALL.map(|face| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("shadow-cube-face"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: face.layer(),
                array_layer_count: Some(1),
                ..Default::default()
            })
        });
        let cube_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("shadow-cube-view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        log::trace!("Allocated shadow cube for slot {}", slot);

        Self {
            face_views,
            cube_view,
        }
    }
}

/// Owns the shadow cubemaps and the depth pipeline that fills them.
pub struct ShadowPassManager {
    config: PointShadowConfig,
    slots: CasterSlots,
    cubes: Vec<ShadowCube>,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    compare_sampler: wgpu::Sampler,
}

impl ShadowPassManager {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Allocate `caster_cap` cubemaps of `config.resolution` texels per face.
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        config: PointShadowConfig,
        caster_cap: usize,
    ) -> Self {
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = aligned_stride(FACE_UNIFORM_SIZE, alignment);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("shadow-face-uniforms"),
            size: (caster_cap.max(1) * CubeFace::ALL.len()) as u64 * stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow-face-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(FACE_UNIFORM_SIZE),
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow-face-bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(FACE_UNIFORM_SIZE),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow-cube-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_shadow"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // The Y-mirrored face projection flips winding.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Self::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_shadow"),
                targets: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let compare_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow-compare-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let cubes = (0..caster_cap)
            .map(|slot| ShadowCube::new(device, slot, config.resolution))
            .collect();

        log::info!(
            "Shadow cubes: {} slots at {}x{} per face, far plane {:.2}",
            caster_cap,
            config.resolution,
            config.resolution,
            config.far
        );

        Self {
            config,
            slots: CasterSlots::new(caster_cap),
            cubes,
            pipeline,
            uniform_buffer,
            bind_group,
            stride,
            compare_sampler,
        }
    }

    pub fn config(&self) -> &PointShadowConfig {
        &self.config
    }

    pub fn far_plane(&self) -> f32 {
        self.config.far
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Slots rendered by the most recent [`ShadowPassManager::render`].
    pub fn active_count(&self) -> usize {
        self.slots.active_count()
    }

    pub fn cube_view(&self, slot: usize) -> Option<&wgpu::TextureView> {
        self.cubes.get(slot).map(|c| &c.cube_view)
    }

    pub fn compare_sampler(&self) -> &wgpu::Sampler {
        &self.compare_sampler
    }

    /// Redraw the cubemap of every caster in `light_positions` (slot order)
    /// with `occluder` placed by `occluder_model`. Positions beyond capacity
    /// get no shadows. With no casters nothing is encoded.
    pub fn render(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        light_positions: &[Vec3],
        occluder_model: Mat4,
        occluder: &MeshBuffer,
    ) {
        let active = self.slots.activate(light_positions.len());
        if active == 0 {
            return;
        }

        let data = pack_face_uniforms(
            &light_positions[..active],
            occluder_model,
            &self.config,
            self.stride,
        );
        queue.write_buffer(&self.uniform_buffer, 0, &data);

        let builder = RenderPassBuilder::new()
            .no_color()
            .depth_clear(SHADOW_CLEAR_DEPTH)
            .label("shadow-cube-face");
        for (slot, cube) in self.cubes.iter().take(active).enumerate() {
            for face in CubeFace::ALL {
                let offset = face_offset(slot, face, self.stride) as u32;
                let mut pass =
                    builder.begin(encoder, None, Some(&cube.face_views[face.layer() as usize]));
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[offset]);
                occluder.bind(&mut pass);
                occluder.draw(&mut pass);
            }
        }
    }
}

fn face_offset(slot: usize, face: CubeFace, stride: u64) -> u64 {
    (slot as u64 * CubeFace::ALL.len() as u64 + u64::from(face.layer())) * stride
}

/// Face uniforms for every light, each at its dynamic offset.
fn pack_face_uniforms(
    lights: &[Vec3],
    model: Mat4,
    config: &PointShadowConfig,
    stride: u64,
) -> Vec<u8> {
    let mut data = vec![0u8; lights.len() * CubeFace::ALL.len() * stride as usize];
    for (slot, &light) in lights.iter().enumerate() {
        let view_projs = cube_face_view_projections(light, config.near, config.far);
        for face in CubeFace::ALL {
            let uniform = ShadowFaceUniform::new(
                view_projs[face.layer() as usize],
                model,
                light,
                config.far,
            );
            let start = face_offset(slot, face, stride) as usize;
            data[start..start + FACE_UNIFORM_SIZE as usize]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    fn config() -> PointShadowConfig {
        PointShadowConfig {
            resolution: 16,
            near: 0.05,
            far: 20.0,
            depth_bias: 0.015,
        }
    }

    #[test]
    fn test_face_offsets_are_stride_aligned() {
        assert_eq!(face_offset(0, CubeFace::PosX, 256), 0);
        assert_eq!(face_offset(0, CubeFace::NegZ, 256), 5 * 256);
        assert_eq!(face_offset(2, CubeFace::NegX, 256), 13 * 256);
    }

    #[test]
    fn test_packed_uniforms_carry_light_and_far() {
        let lights = [Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -3.0)];
        let data = pack_face_uniforms(&lights, Mat4::IDENTITY, &config(), 256);
        assert_eq!(data.len(), 2 * 6 * 256);

        let start = face_offset(1, CubeFace::PosY, 256) as usize;
        let uniform: ShadowFaceUniform =
            bytemuck::pod_read_unaligned(&data[start..start + FACE_UNIFORM_SIZE as usize]);
        assert_eq!(uniform.light_pos_far, [0.0, 0.0, -3.0, 20.0]);
        assert_eq!(uniform.model, Mat4::IDENTITY.to_cols_array_2d());

        let expected = cube_face_view_projections(lights[1], 0.05, 20.0)[2];
        assert_eq!(uniform.view_proj, expected.to_cols_array_2d());
    }

    #[test]
    fn test_gaps_between_faces_stay_zeroed() {
        let data = pack_face_uniforms(&[Vec3::ONE], Mat4::IDENTITY, &config(), 256);
        assert!(data[FACE_UNIFORM_SIZE as usize..256].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_render_activates_at_most_capacity() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow"),
            source: wgpu::ShaderSource::Wgsl(SHADOW_SHADER_SOURCE.into()),
        });
        let mut shadows = ShadowPassManager::new(&device, &shader, config(), 2);
        assert!(shadows.cube_view(1).is_some());
        assert!(shadows.cube_view(2).is_none());

        let buffer = crate::buffer::BufferAllocator::new(&device)
            .upload_mesh("tri", &crate::buffer::triangle());
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        let lights = [Vec3::X * 3.0, Vec3::NEG_X * 3.0, Vec3::Z * 3.0];
        shadows.render(&mut encoder, &queue, &lights, Mat4::IDENTITY, &buffer);
        assert_eq!(shadows.active_count(), 2);
        queue.submit(Some(encoder.finish()));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        shadows.render(&mut encoder, &queue, &[], Mat4::IDENTITY, &buffer);
        assert_eq!(shadows.active_count(), 0);
    }
}
