use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use image::{Rgba, RgbaImage};
use wgpu::util::DeviceExt;

use crate::assets::CubeMapData;
use crate::fx::pass::{Pass, PassCtx, PassIo, PassSlot, SceneView};
use crate::fx::uniform::{UniformSet, UniformValue};
use crate::render::{upload_cube, upload_rgba, util, TextureSource};
use crate::scene::{Material, Node, Vertex};

const SCENE_WGSL: &str = include_str!("../shaders/scene.wgsl");
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    light_dir: [f32; 4],
    light_radiance: [f32; 4],
    env: [f32; 4],
}

impl Globals {
    fn new(view: &SceneView<'_>, exposure: f32) -> Self {
        let view_proj = view.camera.view_projection();
        let (light_dir, radiance) = match view.scene.lights().first() {
            Some(light) => (light.direction(), light.radiance()),
            None => (glam::Vec3::Y, glam::Vec3::ZERO),
        };
        let has_env = if view.scene.environment().is_some() { 1.0 } else { 0.0 };

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            camera_pos: view.camera.position.extend(1.0).to_array(),
            light_dir: light_dir.extend(0.0).to_array(),
            light_radiance: radiance.extend(0.0).to_array(),
            env: [has_env, exposure, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MeshUniform {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    base_color: [f32; 4],
    material: [f32; 4],
}

impl MeshUniform {
    fn new(node: &Node) -> Self {
        let material = &node.mesh.material;
        let params = match material {
            Material::Standard(m) => Vec4::new(m.metallic, m.roughness, m.env_map_intensity, 0.0),
            Material::Basic(_) => Vec4::new(0.0, 1.0, 0.0, 1.0),
        };
        Self {
            model: node.transform.to_cols_array_2d(),
            normal_matrix: node.normal_matrix().to_cols_array_2d(),
            base_color: material.color().to_array(),
            material: params.to_array(),
        }
    }
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct CachedTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct DepthTarget {
    size: (u32, u32),
    samples: u32,
    view: wgpu::TextureView,
}

struct ScenePipelines {
    format: wgpu::TextureFormat,
    samples: u32,
    mesh: wgpu::RenderPipeline,
    sky: wgpu::RenderPipeline,
}

struct SceneGpu {
    module: wgpu::ShaderModule,
    globals_layout: wgpu::BindGroupLayout,
    mesh_layout: wgpu::BindGroupLayout,
    mesh_pipeline_layout: wgpu::PipelineLayout,
    sky_pipeline_layout: wgpu::PipelineLayout,
    pipelines: Vec<ScenePipelines>,
    globals: wgpu::Buffer,
    globals_group: wgpu::BindGroup,
    env_sampler: wgpu::Sampler,
    base_sampler: wgpu::Sampler,
    white: CachedTexture,
    black_cube: CachedTexture,
}

impl SceneGpu {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prism scene"),
            source: wgpu::ShaderSource::Wgsl(SCENE_WGSL.into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism scene globals"),
            entries: &[
                util::uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                util::sampler_entry(2),
            ],
        });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism scene mesh"),
            entries: &[
                util::uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                util::texture_entry(1),
                util::sampler_entry(2),
            ],
        });

        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism scene mesh"),
            bind_group_layouts: &[&globals_layout, &mesh_layout],
            immediate_size: 0,
        });
        let sky_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism scene sky"),
            bind_group_layouts: &[&globals_layout],
            immediate_size: 0,
        });

        let globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prism scene globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let env_sampler = util::linear_sampler(device, "prism scene env sampler");
        let base_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("prism scene base sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = {
            let image = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
            let texture = upload_rgba(device, queue, &image, wgpu::TextureFormat::Rgba8UnormSrgb, "prism white");
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            CachedTexture { _texture: texture, view }
        };

        let black_cube = {
            let face = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
            let faces: [RgbaImage; 6] = std::array::from_fn(|_| face.clone());
            cube_texture(device, queue, &faces, "prism empty environment")
        };

        let globals_group = globals_bind_group(device, &globals_layout, &globals, &black_cube.view, &env_sampler);

        Self {
            module,
            globals_layout,
            mesh_layout,
            mesh_pipeline_layout,
            sky_pipeline_layout,
            pipelines: Vec::new(),
            globals,
            globals_group,
            env_sampler,
            base_sampler,
            white,
            black_cube,
        }
    }

    fn pipeline_index(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, samples: u32) -> usize {
        if let Some(index) = self.pipelines.iter().position(|p| p.format == format && p.samples == samples) {
            return index;
        }
        let mesh = self.create_pipeline(device, format, samples, PipelineKind::Mesh);
        let sky = self.create_pipeline(device, format, samples, PipelineKind::Sky);
        self.pipelines.push(ScenePipelines { format, samples, mesh, sky });
        self.pipelines.len() - 1
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        samples: u32,
        kind: PipelineKind,
    ) -> wgpu::RenderPipeline {
        let vertex_layout = [Vertex::layout()];
        let (label, layout, vs, fs, buffers, depth_write): (_, _, _, _, &[wgpu::VertexBufferLayout<'_>], _) =
            match kind {
                PipelineKind::Mesh => {
                    ("prism scene mesh", &self.mesh_pipeline_layout, "vs_mesh", "fs_mesh", &vertex_layout, true)
                }
                PipelineKind::Sky => ("prism scene sky", &self.sky_pipeline_layout, "vs_sky", "fs_sky", &[], false),
            };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some(vs),
                compilation_options: Default::default(),
                buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some(fs),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: samples,
                ..Default::default()
            },
            multiview_mask: None,
            cache: None,
        })
    }
}

#[derive(Copy, Clone)]
enum PipelineKind {
    Mesh,
    Sky,
}

fn globals_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    globals: &wgpu::Buffer,
    env: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("prism scene globals"),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: globals.as_entire_binding() },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(env) },
            wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    })
}

fn cube_texture(device: &wgpu::Device, queue: &wgpu::Queue, faces: &[RgbaImage; 6], label: &str) -> CachedTexture {
    let texture = upload_cube(device, queue, faces, wgpu::TextureFormat::Rgba8UnormSrgb, label);
    let view = texture.create_view(&wgpu::TextureViewDescriptor {
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    });
    CachedTexture { _texture: texture, view }
}

/// Renders the scene: lit meshes first, then the environment background
/// behind them. Output is tone mapped (Reinhard, scaled by `exposure`) and
/// stays linear; gamma is applied by a later pass.
pub struct ScenePass {
    enabled: bool,
    uniforms: UniformSet,
    gpu: Option<SceneGpu>,
    meshes: Vec<GpuMesh>,
    textures: HashMap<usize, CachedTexture>,
    environment: Option<(usize, CachedTexture)>,
    uploaded_revision: Option<u64>,
    depth: Option<DepthTarget>,
}

impl ScenePass {
    pub fn new(exposure: f32) -> Self {
        Self {
            enabled: true,
            uniforms: UniformSet::new().with("exposure", UniformValue::Float(exposure)),
            gpu: None,
            meshes: Vec::new(),
            textures: HashMap::new(),
            environment: None,
            uploaded_revision: None,
            depth: None,
        }
    }

    pub fn exposure(&self) -> f32 {
        self.uniforms.float("exposure").unwrap_or(1.0)
    }

    /// Re-uploads meshes and the environment when the scene changed.
    fn sync_scene(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view: &SceneView<'_>) {
        let revision = view.scene.revision();
        if self.uploaded_revision == Some(revision) {
            return;
        }
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        sync_environment(gpu, &mut self.environment, device, queue, view.scene.environment());

        self.meshes.clear();
        let mut live = Vec::new();
        for node in view.scene.nodes() {
            let geometry = &node.mesh.geometry;
            if geometry.is_empty() {
                continue;
            }

            let texture_view = match node.mesh.material.texture() {
                Some(source) => {
                    live.push(source.id());
                    &self
                        .textures
                        .entry(source.id())
                        .or_insert_with(|| base_texture(device, queue, source))
                        .view
                }
                None => &gpu.white.view,
            };

            let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism mesh vertices"),
                contents: bytemuck::cast_slice(&geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism mesh indices"),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism mesh uniform"),
                contents: bytemuck::bytes_of(&MeshUniform::new(node)),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("prism mesh"),
                layout: &gpu.mesh_layout,
                entries: &[
                    wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() },
                    wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(texture_view) },
                    wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&gpu.base_sampler) },
                ],
            });

            self.meshes.push(GpuMesh {
                vertices,
                indices,
                index_count: geometry.index_count() as u32,
                uniform,
                bind_group,
            });
        }
        self.textures.retain(|id, _| live.contains(id));

        log::debug!("scene uploaded: {} meshes, revision {revision}", self.meshes.len());
        self.uploaded_revision = Some(revision);
    }

    fn ensure_depth(&mut self, device: &wgpu::Device, size: (u32, u32), samples: u32) {
        if self.depth.as_ref().is_some_and(|d| d.size == size && d.samples == samples) {
            return;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("prism scene depth"),
            size: wgpu::Extent3d {
                width: size.0.max(1),
                height: size.1.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: samples,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget { size, samples, view });
    }
}

fn sync_environment(
    gpu: &mut SceneGpu,
    cached: &mut Option<(usize, CachedTexture)>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    environment: Option<&Arc<CubeMapData>>,
) {
    let wanted = environment.map(|env| Arc::as_ptr(env) as usize);
    if cached.as_ref().map(|(id, _)| *id) == wanted {
        return;
    }

    *cached = environment.map(|env| {
        let texture = cube_texture(device, queue, env.faces(), "prism environment");
        (Arc::as_ptr(env) as usize, texture)
    });

    let view = match cached {
        Some((_, texture)) => &texture.view,
        None => &gpu.black_cube.view,
    };
    gpu.globals_group = globals_bind_group(device, &gpu.globals_layout, &gpu.globals, view, &gpu.env_sampler);
}

fn base_texture(device: &wgpu::Device, queue: &wgpu::Queue, source: &TextureSource) -> CachedTexture {
    let texture = upload_rgba(device, queue, source.image(), wgpu::TextureFormat::Rgba8UnormSrgb, "prism base color");
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    CachedTexture { _texture: texture, view }
}

impl Pass for ScenePass {
    fn slot(&self) -> PassSlot {
        PassSlot::Scene
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    fn uniforms_mut(&mut self) -> &mut UniformSet {
        &mut self.uniforms
    }

    fn render(&mut self, ctx: &PassCtx<'_>, encoder: &mut wgpu::CommandEncoder, io: &PassIo<'_>) {
        if self.gpu.is_none() {
            self.gpu = Some(SceneGpu::new(ctx.device, ctx.queue));
        }
        self.sync_scene(ctx.device, ctx.queue, &ctx.view);

        let samples = io.output.multisample.map_or(1, |(_, samples)| samples);
        self.ensure_depth(ctx.device, io.output.size, samples);

        let globals = Globals::new(&ctx.view, self.exposure());
        for (mesh, node) in self.meshes.iter().zip(ctx.view.scene.nodes().iter().filter(|n| !n.mesh.geometry.is_empty())) {
            ctx.queue.write_buffer(&mesh.uniform, 0, bytemuck::bytes_of(&MeshUniform::new(node)));
        }

        let (Some(gpu), Some(depth)) = (self.gpu.as_mut(), self.depth.as_ref()) else {
            return;
        };
        ctx.queue.write_buffer(&gpu.globals, 0, bytemuck::bytes_of(&globals));

        let index = gpu.pipeline_index(ctx.device, io.output.format, samples);
        let pipelines = &gpu.pipelines[index];
        let globals_group = &gpu.globals_group;

        let (view, resolve_target, store) = match io.output.multisample {
            Some((msaa, _)) => (msaa, Some(io.output.view), wgpu::StoreOp::Discard),
            None => (io.output.view, None, wgpu::StoreOp::Store),
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism scene"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_bind_group(0, globals_group, &[]);

        rpass.set_pipeline(&pipelines.mesh);
        for mesh in &self.meshes {
            rpass.set_bind_group(1, &mesh.bind_group, &[]);
            rpass.set_vertex_buffer(0, mesh.vertices.slice(..));
            rpass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        rpass.set_pipeline(&pipelines.sky);
        rpass.draw(0..3, 0..1);
    }
}
