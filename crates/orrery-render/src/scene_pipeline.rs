//! Forward pipeline for the central body and the satellites.
//!
//! One shader covers both shading modes. Lit geometry takes ambient plus
//! per-light diffuse with distance attenuation, each light masked by its
//! shadow cube, then the environment reflection and glow while absorbed.
//! Emissive geometry outputs its texture tinted warm and ignores lighting.
//!
//! Bind groups: 0 camera, 1 lights + shadow cubes + environment,
//! 2 per-object uniform (dynamic offset), 3 material texture.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use orrery_lighting::{LightsUniform, MAX_SHADOW_CASTERS, aligned_stride};

use crate::buffer::{MeshBuffer, VertexPositionNormalUv};
use crate::camera::CameraBinding;
use crate::depth::DepthBuffer;
use crate::shadow_pass::ShadowPassManager;
use crate::texture::{GpuCubemap, GpuTexture, placeholder_depth_cube};

pub const SCENE_SHADER_SOURCE: &str = r#"
const MAX_LIGHTS: u32 = 8u;

struct CameraUniform {
    view_proj: mat4x4<f32>,
    inv_sky_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct PointLight {
    // w = shadow slot, negative when unshadowed
    position: vec4<f32>,
    // w = intensity
    color: vec4<f32>,
};

struct Lights {
    // x = count, y = shadows enabled, z = reflect enabled
    counts: vec4<u32>,
    // x = shadow far plane, y = depth bias, z = reflect strength, w = glow
    shadow_reflect: vec4<f32>,
    ambient: vec4<f32>,
    lights: array<PointLight, 8>,
};

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    // rgb = emissive tint, w = 1 for emissive
    tint_mode: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;

@group(1) @binding(0) var<uniform> lights: Lights;
@group(1) @binding(1) var shadow_cube_0: texture_depth_cube;
@group(1) @binding(2) var shadow_cube_1: texture_depth_cube;
@group(1) @binding(3) var shadow_cube_2: texture_depth_cube;
@group(1) @binding(4) var shadow_cube_3: texture_depth_cube;
@group(1) @binding(5) var shadow_cube_4: texture_depth_cube;
@group(1) @binding(6) var shadow_cube_5: texture_depth_cube;
@group(1) @binding(7) var shadow_cube_6: texture_depth_cube;
@group(1) @binding(8) var shadow_cube_7: texture_depth_cube;
@group(1) @binding(9) var shadow_sampler: sampler_comparison;
@group(1) @binding(10) var environment: texture_cube<f32>;
@group(1) @binding(11) var environment_sampler: sampler;

@group(2) @binding(0) var<uniform> object: ObjectUniform;

@group(3) @binding(0) var material_texture: texture_2d<f32>;
@group(3) @binding(1) var material_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_position = world.xyz;
    out.normal = (object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

fn attenuation(dist: f32) -> f32 {
    return 1.0 / (1.0 + 0.09 * dist + 0.032 * dist * dist);
}

fn sample_shadow_cube(slot: i32, dir: vec3<f32>, reference: f32) -> f32 {
    switch slot {
        case 0: { return textureSampleCompareLevel(shadow_cube_0, shadow_sampler, dir, reference); }
        case 1: { return textureSampleCompareLevel(shadow_cube_1, shadow_sampler, dir, reference); }
        case 2: { return textureSampleCompareLevel(shadow_cube_2, shadow_sampler, dir, reference); }
        case 3: { return textureSampleCompareLevel(shadow_cube_3, shadow_sampler, dir, reference); }
        case 4: { return textureSampleCompareLevel(shadow_cube_4, shadow_sampler, dir, reference); }
        case 5: { return textureSampleCompareLevel(shadow_cube_5, shadow_sampler, dir, reference); }
        case 6: { return textureSampleCompareLevel(shadow_cube_6, shadow_sampler, dir, reference); }
        case 7: { return textureSampleCompareLevel(shadow_cube_7, shadow_sampler, dir, reference); }
        default: { return 1.0; }
    }
}

fn shadow_factor(slot: i32, light_to_fragment: vec3<f32>) -> f32 {
    if lights.counts.y == 0u || slot < 0 {
        return 1.0;
    }
    let current = length(light_to_fragment) / lights.shadow_reflect.x;
    return sample_shadow_cube(slot, light_to_fragment, current - lights.shadow_reflect.y);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = textureSample(material_texture, material_sampler, in.uv);
    let n = normalize(in.normal);
    let view_dir = normalize(camera.camera_pos.xyz - in.world_position);
    let env = textureSample(environment, environment_sampler, reflect(-view_dir, n)).rgb;

    if object.tint_mode.w > 0.5 {
        return vec4<f32>(base.rgb * object.tint_mode.rgb, 1.0);
    }

    var color = lights.ambient.rgb * base.rgb;
    let count = min(lights.counts.x, MAX_LIGHTS);
    for (var i = 0u; i < count; i++) {
        let light = lights.lights[i];
        let light_to_fragment = in.world_position - light.position.xyz;
        let dist = max(length(light_to_fragment), 1e-4);
        let l = -light_to_fragment / dist;
        let diffuse = max(dot(n, l), 0.0);
        let shadow = shadow_factor(i32(round(light.position.w)), light_to_fragment);
        color += base.rgb * light.color.rgb * (light.color.w * diffuse * attenuation(dist) * shadow);
    }

    if lights.counts.z != 0u {
        let strength = clamp(lights.shadow_reflect.z, 0.0, 1.0);
        color = mix(color, env, strength * 0.85);
        color += base.rgb * vec3<f32>(1.0, 0.86, 0.68) * (lights.shadow_reflect.w * strength);
    }

    return vec4<f32>(color, 1.0);
}
"#;

/// Per-draw data at group 2, 144 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model's linear part.
    pub normal_matrix: [[f32; 4]; 4],
    /// rgb = emissive tint, w = 1.0 for emissive, 0.0 for lit.
    pub tint_mode: [f32; 4],
}

impl ObjectUniform {
    pub fn lit(model: Mat4) -> Self {
        Self::with_mode(model, Vec3::ONE, 0.0)
    }

    pub fn emissive(model: Mat4, tint: Vec3) -> Self {
        Self::with_mode(model, tint, 1.0)
    }

    fn with_mode(model: Mat4, tint: Vec3, mode: f32) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: Mat4::from_mat3(normal).to_cols_array_2d(),
            tint_mode: tint.extend(mode).to_array(),
        }
    }

    pub fn is_emissive(&self) -> bool {
        self.tint_mode[3] > 0.5
    }
}

const OBJECT_UNIFORM_SIZE: u64 = size_of::<ObjectUniform>() as u64;
const LIGHTS_UNIFORM_SIZE: u64 = size_of::<LightsUniform>() as u64;

/// Bindings 1..=8 of group 1 hold the shadow cubes.
const FIRST_SHADOW_BINDING: u32 = 1;
const SHADOW_SAMPLER_BINDING: u32 = FIRST_SHADOW_BINDING + MAX_SHADOW_CASTERS as u32;
const ENVIRONMENT_BINDING: u32 = SHADOW_SAMPLER_BINDING + 1;
const ENVIRONMENT_SAMPLER_BINDING: u32 = ENVIRONMENT_BINDING + 1;

/// Textures the fragment stage samples: material, environment and every shadow cube.
pub const SAMPLED_TEXTURES_PER_STAGE: u32 = 2 + MAX_SHADOW_CASTERS as u32;

pub struct ScenePipeline {
    pipeline: wgpu::RenderPipeline,
    material_layout: wgpu::BindGroupLayout,
    lights_buffer: wgpu::Buffer,
    lights_bind_group: wgpu::BindGroup,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_stride: u64,
    max_objects: usize,
}

impl ScenePipeline {
    /// Slots past the shadow manager's capacity are bound to a placeholder
    /// cube; no light references them.
    pub fn new(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        camera: &CameraBinding,
        shadows: &ShadowPassManager,
        environment: &GpuCubemap,
        max_objects: usize,
    ) -> Self {
        let lights_layout = create_lights_layout(device);

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-object-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(OBJECT_UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene-material-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&camera.layout, &lights_layout, &object_layout, &material_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::opaque_state()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-lights"),
            size: LIGHTS_UNIFORM_SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let placeholder = placeholder_depth_cube(device);
        let shadow_views: Vec<&wgpu::TextureView> = (0..MAX_SHADOW_CASTERS)
            .map(|slot| shadows.cube_view(slot).unwrap_or(&placeholder))
            .collect();

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: lights_buffer.as_entire_binding(),
        }];
        entries.extend(shadow_views.iter().enumerate().map(|(slot, view)| {
            wgpu::BindGroupEntry {
                binding: FIRST_SHADOW_BINDING + slot as u32,
                resource: wgpu::BindingResource::TextureView(view),
            }
        }));
        entries.extend([
            wgpu::BindGroupEntry {
                binding: SHADOW_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(shadows.compare_sampler()),
            },
            wgpu::BindGroupEntry {
                binding: ENVIRONMENT_BINDING,
                resource: wgpu::BindingResource::TextureView(&environment.view),
            },
            wgpu::BindGroupEntry {
                binding: ENVIRONMENT_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&environment.sampler),
            },
        ]);
        let lights_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-lights-bg"),
            layout: &lights_layout,
            entries: &entries,
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let object_stride = aligned_stride(OBJECT_UNIFORM_SIZE, alignment);
        let max_objects = max_objects.max(1);
        let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("scene-objects"),
            size: max_objects as u64 * object_stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene-object-bg"),
            layout: &object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &object_buffer,
                    offset: 0,
                    size: NonZeroU64::new(OBJECT_UNIFORM_SIZE),
                }),
            }],
        });

        log::debug!(
            "Scene pipeline created: {} object slots, stride {}",
            max_objects,
            object_stride
        );

        Self {
            pipeline,
            material_layout,
            lights_buffer,
            lights_bind_group,
            object_buffer,
            object_bind_group,
            object_stride,
            max_objects,
        }
    }

    pub fn max_objects(&self) -> usize {
        self.max_objects
    }

    pub fn material_bind_group(&self, device: &wgpu::Device, label: &str, texture: &GpuTexture) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        })
    }

    /// Upload this frame's lights and object uniforms. Objects past
    /// [`ScenePipeline::max_objects`] are dropped with a warning.
    pub fn write_frame(&self, queue: &wgpu::Queue, lights: &LightsUniform, objects: &[ObjectUniform]) -> usize {
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(lights));

        if objects.len() > self.max_objects {
            log::warn!(
                "{} objects submitted, only {} fit the object buffer",
                objects.len(),
                self.max_objects
            );
        }
        let written = objects.len().min(self.max_objects);
        if written > 0 {
            let data = pack_objects(&objects[..written], self.object_stride);
            queue.write_buffer(&self.object_buffer, 0, &data);
        }
        written
    }

    /// Bind everything except the camera, which the caller sets once per pass.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        object_index: usize,
        material: &wgpu::BindGroup,
        mesh: &MeshBuffer,
    ) {
        let offset = (object_index as u64 * self.object_stride) as u32;
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.lights_bind_group, &[]);
        pass.set_bind_group(2, &self.object_bind_group, &[offset]);
        pass.set_bind_group(3, material, &[]);
        mesh.bind(pass);
        mesh.draw(pass);
    }
}

fn create_lights_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(LIGHTS_UNIFORM_SIZE),
        },
        count: None,
    }];
    entries.extend((0..MAX_SHADOW_CASTERS as u32).map(|slot| wgpu::BindGroupLayoutEntry {
        binding: FIRST_SHADOW_BINDING + slot,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::Cube,
            multisampled: false,
        },
        count: None,
    }));
    entries.extend([
        wgpu::BindGroupLayoutEntry {
            binding: SHADOW_SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: ENVIRONMENT_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::Cube,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: ENVIRONMENT_SAMPLER_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("scene-lights-bgl"),
        entries: &entries,
    })
}

fn pack_objects(objects: &[ObjectUniform], stride: u64) -> Vec<u8> {
    let mut data = vec![0u8; objects.len() * stride as usize];
    for (i, object) in objects.iter().enumerate() {
        let start = i * stride as usize;
        data[start..start + OBJECT_UNIFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(object));
    }
    data
}
