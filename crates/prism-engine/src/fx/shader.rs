//! Full-screen shader passes.
//!
//! A [`ShaderPass`] pairs a WGSL fragment stage with a [`UniformSet`] and runs
//! it over the previous pass's output. Binding layout of group 0:
//!
//! - 0: input texture (`t_diffuse`)
//! - 1: sampler
//! - 2: numeric uniforms, packed as [`UniformSet::to_bytes`] describes
//! - 3..: texture uniforms in declaration order

use glam::{Vec2, Vec4};

use crate::render::{upload_rgba, util, TextureSource};

use super::pass::{Pass, PassCtx, PassIo, PassSlot};
use super::params::ParamSpec;
use super::uniform::UniformSet;

/// WGSL fragment module with an `fs_main(in: VsOut) -> @location(0) vec4<f32>` entry.
#[derive(Debug, Copy, Clone)]
pub struct FragmentShader {
    pub label: &'static str,
    pub source: &'static str,
}

/// CPU-side texture lookup in pass coordinates (y-up, [0, 1]).
///
/// Used to evaluate the reference form of a fragment shader.
pub trait Sampler {
    fn sample(&self, uv: Vec2) -> Vec4;
}

impl<F: Fn(Vec2) -> Vec4> Sampler for F {
    fn sample(&self, uv: Vec2) -> Vec4 {
        self(uv)
    }
}

/// Nearest-texel lookup with clamp-to-edge addressing.
impl Sampler for TextureSource {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let image = self.image();
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            return Vec4::ZERO;
        }
        let x = ((uv.x.clamp(0.0, 1.0) * w as f32) as u32).min(w - 1);
        let y = (((1.0 - uv.y).clamp(0.0, 1.0) * h as f32) as u32).min(h - 1);
        let [r, g, b, a] = image.get_pixel(x, y).0;
        Vec4::new(r as f32, g as f32, b as f32, a as f32) / 255.0
    }
}

struct BoundTexture {
    source: usize,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct ShaderGpu {
    module: wgpu::ShaderModule,
    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    /// One pipeline per output format (offscreen target vs. surface).
    pipelines: Vec<(wgpu::TextureFormat, wgpu::RenderPipeline)>,
    params: wgpu::Buffer,
    textures: Vec<Option<BoundTexture>>,
}

pub struct ShaderPass {
    slot: PassSlot,
    shader: FragmentShader,
    enabled: bool,
    uniforms: UniformSet,
    params: &'static [ParamSpec],
    gpu: Option<ShaderGpu>,
}

impl ShaderPass {
    pub fn new(slot: PassSlot, shader: FragmentShader, uniforms: UniformSet) -> Self {
        Self {
            slot,
            shader,
            enabled: true,
            uniforms,
            params: &[],
            gpu: None,
        }
    }

    pub fn with_params(mut self, params: &'static [ParamSpec]) -> Self {
        self.params = params;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn shader(&self) -> &FragmentShader {
        &self.shader
    }

    fn ensure_gpu(&mut self, device: &wgpu::Device) -> &mut ShaderGpu {
        let label = self.shader.label;
        let texture_count = self.uniforms.texture_count();
        let params_size = self.uniforms.to_bytes().len() as u64;

        self.gpu.get_or_insert_with(|| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(util::fullscreen_source(self.shader.source).into()),
            });

            let mut entries = vec![
                util::texture_entry(0),
                util::sampler_entry(1),
                util::uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ];
            entries.extend((0..texture_count).map(|i| util::texture_entry(3 + i as u32)));

            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &entries,
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&layout],
                immediate_size: 0,
            });

            let params = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: params_size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            ShaderGpu {
                module,
                layout,
                pipeline_layout,
                pipelines: Vec::new(),
                params,
                textures: (0..texture_count).map(|_| None).collect(),
            }
        })
    }

    /// Uploads texture uniforms whose source changed since the last frame.
    fn sync_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        for ((name, source), slot) in self.uniforms.textures().zip(gpu.textures.iter_mut()) {
            let Some(source) = source else {
                *slot = None;
                continue;
            };
            if slot.as_ref().is_some_and(|b| b.source == source.id()) {
                continue;
            }
            let texture = upload_rgba(
                device,
                queue,
                source.image(),
                wgpu::TextureFormat::Rgba8Unorm,
                name,
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            *slot = Some(BoundTexture { source: source.id(), _texture: texture, view });
        }
    }

    /// Runs the fragment shader over `io.input` into `io.output`.
    pub fn draw(&mut self, ctx: &PassCtx<'_>, encoder: &mut wgpu::CommandEncoder, io: &PassIo<'_>) {
        if let Some(name) = self.uniforms.missing().next() {
            log::error!("{}: texture uniform '{name}' has no source; skipping", self.shader.label);
            return;
        }

        self.ensure_gpu(ctx.device);
        self.sync_textures(ctx.device, ctx.queue);

        let label = self.shader.label;
        let bytes = self.uniforms.to_bytes();
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        ctx.queue.write_buffer(&gpu.params, 0, &bytes);

        let format = io.output.format;
        if !gpu.pipelines.iter().any(|(f, _)| *f == format) {
            let pipeline = util::fullscreen_pipeline(
                ctx.device,
                label,
                &gpu.module,
                &gpu.pipeline_layout,
                "fs_main",
                format,
            );
            gpu.pipelines.push((format, pipeline));
        }
        let Some((_, pipeline)) = gpu.pipelines.iter().find(|(f, _)| *f == format) else {
            return;
        };

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(io.input),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(io.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: gpu.params.as_entire_binding(),
            },
        ];
        for (i, bound) in gpu.textures.iter().enumerate() {
            let Some(bound) = bound else {
                return;
            };
            entries.push(wgpu::BindGroupEntry {
                binding: 3 + i as u32,
                resource: wgpu::BindingResource::TextureView(&bound.view),
            });
        }

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &gpu.layout,
            entries: &entries,
        });

        util::draw_fullscreen(encoder, label, io.output.view, pipeline, &[&bind_group]);
    }
}

impl Pass for ShaderPass {
    fn slot(&self) -> PassSlot {
        self.slot
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

    fn params(&self) -> &[ParamSpec] {
        self.params
    }

    fn render(&mut self, ctx: &PassCtx<'_>, encoder: &mut wgpu::CommandEncoder, io: &PassIo<'_>) {
        self.draw(ctx, encoder, io);
    }
}
