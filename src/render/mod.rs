//! wgpu scene renderer.
//!
//! Draws the entity registry as instanced meshes (cube / bauble / candy
//! cane), each photo as a framed textured quad, and the dust field as
//! additive point sprites, all into a depth-tested forward pass. The
//! renderer only reads transforms computed by the scene; it owns every GPU
//! resource.

pub mod geometry;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use image::RgbaImage;

use crate::config::Config;
use crate::scene::entity::{DecorStyle, EntityKind};
use crate::scene::Scene;
use geometry::{MeshData, Vertex};

/// Ornament palette.
const COLOR_GOLD: [f32; 4] = [0.831, 0.686, 0.216, 1.0];
const COLOR_GREEN: [f32; 4] = [0.039, 0.267, 0.133, 1.0];
const COLOR_RED: [f32; 4] = [0.667, 0.0, 0.0, 1.0];
const COLOR_CANDY: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Fixed camera placement; Focus mode's pull point sits in front of it.
const CAMERA_EYE: Vec3 = Vec3::new(0.0, 2.0, 50.0);
const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 2.0, 0.0);
const CAMERA_FOV_Y: f32 = 45.0 * std::f32::consts::PI / 180.0;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    right: [f32; 4],
    up: [f32; 4],
}

/// Per-instance data for the ornament pipeline (matches scene.wgsl).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct MeshInstance {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    style: u32,
    _pad: [u32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PhotoUniform {
    model: [[f32; 4]; 4],
}

/// Shading styles understood by scene.wgsl.
mod style {
    pub const GOLD: u32 = 0;
    pub const MATTE: u32 = 1;
    pub const GLOSSY: u32 = 2;
    pub const CANDY: u32 = 3;
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (mesh.vertices.len() * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));

        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (mesh.indices.len() * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(&mesh.indices));

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
        }
    }
}

/// One instance batch per mesh shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shape {
    Cube = 0,
    Sphere = 1,
    Cane = 2,
}

const SHAPE_COUNT: usize = 3;

struct MeshBatch {
    buffer: wgpu::Buffer,
    capacity: usize,
    staging: Vec<MeshInstance>,
}

struct PhotoResources {
    // Kept alive for the bind group.
    _texture: wgpu::Texture,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct SceneRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    photo_pipeline: wgpu::RenderPipeline,
    dust_pipeline: wgpu::RenderPipeline,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    instance_layout: wgpu::BindGroupLayout,
    photo_layout: wgpu::BindGroupLayout,

    meshes: [GpuMesh; SHAPE_COUNT],
    quad: GpuMesh,
    batches: [MeshBatch; SHAPE_COUNT],

    dust_buffer: wgpu::Buffer,
    dust_bind_group: wgpu::BindGroup,
    dust_capacity: usize,
    dust_staging: Vec<[f32; 4]>,

    photos: Vec<PhotoResources>,
    sampler: wgpu::Sampler,
    depth_view: wgpu::TextureView,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: &Config,
    ) -> Self {
        // Camera uniform
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        // Instance storage layout shared by ornaments and dust.
        let instance_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Instance Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let photo_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Photo Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
        };

        // Ornament pipeline
        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &instance_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout.clone()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Photo pipeline
        let photo_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Photo Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/photo.wgsl").into()),
        });

        let photo_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Photo Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &photo_layout],
            push_constant_ranges: &[],
        });

        let photo_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Photo Pipeline"),
            layout: Some(&photo_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &photo_shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout.clone()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &photo_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Dust pipeline: additive, no depth writes.
        let dust_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Dust Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/dust.wgsl").into()),
        });

        let dust_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Dust Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &instance_layout],
            push_constant_ranges: &[],
        });

        let dust_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Dust Pipeline"),
            layout: Some(&dust_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &dust_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &dust_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Geometry
        let meshes = [
            GpuMesh::upload(device, queue, "Cube Mesh", &geometry::cube(Vec3::splat(0.5))),
            GpuMesh::upload(device, queue, "Sphere Mesh", &geometry::uv_sphere(0.3, 16, 12)),
            GpuMesh::upload(device, queue, "Cane Mesh", &geometry::candy_cane(0.08, 20, 8)),
        ];
        let quad = GpuMesh::upload(device, queue, "Photo Quad", &geometry::quad(0.55, 0.55));

        // Instance batches sized for the full registry in one shape (worst
        // case), grown on demand when photos push past it.
        let initial_capacity = (config.decoration_count + 16).next_power_of_two();
        let batches = std::array::from_fn(|i| MeshBatch {
            buffer: create_instance_buffer(device, i, initial_capacity),
            capacity: initial_capacity,
            staging: Vec::with_capacity(initial_capacity),
        });

        let dust_capacity = config.dust_count.max(1);
        let dust_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Dust Buffer"),
            size: (dust_capacity * std::mem::size_of::<[f32; 4]>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let dust_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Dust Bind Group"),
            layout: &instance_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: dust_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Photo Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let depth_view = create_depth_view(device, width, height);

        Self {
            mesh_pipeline,
            photo_pipeline,
            dust_pipeline,
            camera_buffer,
            camera_bind_group,
            instance_layout,
            photo_layout,
            meshes,
            quad,
            batches,
            dust_buffer,
            dust_bind_group,
            dust_capacity,
            dust_staging: Vec::with_capacity(dust_capacity),
            photos: Vec::new(),
            sampler,
            depth_view,
        }
    }

    /// Recreate the depth buffer for a new surface size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_view = create_depth_view(device, width.max(1), height.max(1));
    }

    /// Upload a photo texture and return its id for the scene's entity.
    pub fn add_photo(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
    ) -> u32 {
        let (width, height) = image.dimensions();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Photo Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Photo Uniform"),
            size: std::mem::size_of::<PhotoUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Photo Bind Group"),
            layout: &self.photo_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.photos.push(PhotoResources {
            _texture: texture,
            uniform_buffer,
            bind_group,
        });
        (self.photos.len() - 1) as u32
    }

    /// Build instance data from the scene and draw the frame.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        config: &Config,
        aspect: f32,
    ) {
        self.write_camera(queue, aspect);
        self.stage_entities(scene);
        self.stage_dust(scene, config);
        self.upload_batches(device, queue);

        let bind_groups: Vec<wgpu::BindGroup> = self
            .batches
            .iter()
            .map(|batch| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Instance Bind Group"),
                    layout: &self.instance_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: batch.buffer.as_entire_binding(),
                    }],
                })
            })
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.004,
                        g: 0.004,
                        b: 0.008,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // Ornaments
        pass.set_pipeline(&self.mesh_pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for (i, batch) in self.batches.iter().enumerate() {
            if batch.staging.is_empty() {
                continue;
            }
            let mesh = &self.meshes[i];
            pass.set_bind_group(1, &bind_groups[i], &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..batch.staging.len() as u32);
        }

        // Photos
        pass.set_pipeline(&self.photo_pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad.vertex_buffer.slice(..));
        pass.set_index_buffer(self.quad.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        let group_matrix = Mat4::from_quat(scene.group_rotation());
        for entity in scene.entities() {
            if let EntityKind::Photo(photo_id) = entity.kind {
                let Some(photo) = self.photos.get(photo_id as usize) else {
                    continue;
                };
                let local = Mat4::from_scale_rotation_translation(
                    entity.scale,
                    entity.rotation,
                    entity.position,
                ) * Mat4::from_translation(Vec3::new(0.0, 0.0, 0.06));
                let uniform = PhotoUniform {
                    model: (group_matrix * local).to_cols_array_2d(),
                };
                queue.write_buffer(&photo.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
                pass.set_bind_group(1, &photo.bind_group, &[]);
                pass.draw_indexed(0..self.quad.index_count, 0, 0..1);
            }
        }

        // Dust last: additive over everything, depth-tested read-only.
        if !self.dust_staging.is_empty() {
            pass.set_pipeline(&self.dust_pipeline);
            pass.set_bind_group(0, &self.camera_bind_group, &[]);
            pass.set_bind_group(1, &self.dust_bind_group, &[]);
            pass.draw(0..6, 0..self.dust_staging.len() as u32);
        }
    }

    fn write_camera(&self, queue: &wgpu::Queue, aspect: f32) {
        let view = Mat4::look_at_rh(CAMERA_EYE, CAMERA_TARGET, Vec3::Y);
        let proj = Mat4::perspective_rh(CAMERA_FOV_Y, aspect.max(0.01), 0.1, 1000.0);

        // World-space camera basis, for billboarding.
        let right = Vec3::new(view.x_axis.x, view.y_axis.x, view.z_axis.x);
        let up = Vec3::new(view.x_axis.y, view.y_axis.y, view.z_axis.y);

        let uniform = CameraUniform {
            view_proj: (proj * view).to_cols_array_2d(),
            eye: CAMERA_EYE.extend(1.0).to_array(),
            right: right.extend(0.0).to_array(),
            up: up.extend(0.0).to_array(),
        };
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    fn stage_entities(&mut self, scene: &Scene) {
        for batch in &mut self.batches {
            batch.staging.clear();
        }

        let group_matrix = Mat4::from_quat(scene.group_rotation());

        for entity in scene.entities() {
            let local = Mat4::from_scale_rotation_translation(
                entity.scale,
                entity.rotation,
                entity.position,
            );

            let (shape, inner_scale, color, shading) = match entity.kind {
                EntityKind::Decoration(DecorStyle::GoldBox) => {
                    (Shape::Cube, Vec3::splat(0.5), COLOR_GOLD, style::GOLD)
                }
                EntityKind::Decoration(DecorStyle::GreenBauble) => {
                    (Shape::Sphere, Vec3::ONE, COLOR_GREEN, style::MATTE)
                }
                EntityKind::Decoration(DecorStyle::RedBauble) => {
                    (Shape::Sphere, Vec3::ONE, COLOR_RED, style::GLOSSY)
                }
                EntityKind::Decoration(DecorStyle::CandyCane) => {
                    (Shape::Cane, Vec3::ONE, COLOR_CANDY, style::CANDY)
                }
                EntityKind::Photo(_) => {
                    // Gold frame behind the textured quad.
                    (
                        Shape::Cube,
                        Vec3::new(1.2, 1.2, 0.1),
                        COLOR_GOLD,
                        style::GOLD,
                    )
                }
            };

            let model = group_matrix * local * Mat4::from_scale(inner_scale);
            self.batches[shape as usize].staging.push(MeshInstance {
                model: model.to_cols_array_2d(),
                color,
                style: shading,
                _pad: [0; 3],
            });
        }
    }

    fn stage_dust(&mut self, scene: &Scene, config: &Config) {
        self.dust_staging.clear();
        let dust = scene.dust();
        let (sin, cos) = dust.yaw().sin_cos();
        let size = config.dust.point_size;

        for p in dust.points().iter().take(self.dust_capacity) {
            // Field yaw applied here; the dust is not part of the hand-
            // rotated group.
            let x = cos * p.x + sin * p.z;
            let z = -sin * p.x + cos * p.z;
            self.dust_staging.push([x, p.y, z, size]);
        }
    }

    fn upload_batches(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for (i, batch) in self.batches.iter_mut().enumerate() {
            if batch.staging.len() > batch.capacity {
                batch.capacity = batch.staging.len().next_power_of_two();
                batch.buffer = create_instance_buffer(device, i, batch.capacity);
            }
            if !batch.staging.is_empty() {
                queue.write_buffer(&batch.buffer, 0, bytemuck::cast_slice(&batch.staging));
            }
        }
        if !self.dust_staging.is_empty() {
            queue.write_buffer(&self.dust_buffer, 0, bytemuck::cast_slice(&self.dust_staging));
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, shape: usize, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("Instance Buffer {}", shape)),
        size: (capacity * std::mem::size_of::<MeshInstance>()) as u64,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
