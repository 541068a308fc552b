use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};

use crate::fx::params::{ParamRange, ParamSpec};
use crate::fx::pass::{Pass, PassCtx, PassIo, PassSlot};
use crate::fx::uniform::{UniformSet, UniformValue};
use crate::render::{create_color_target, util};

pub const MIP_COUNT: usize = 5;
const KERNEL_SIZES: [u32; MIP_COUNT] = [3, 5, 7, 9, 11];
const BLOOM_FACTORS: [f32; MIP_COUNT] = [1.0, 0.8, 0.6, 0.4, 0.2];
const SMOOTH_WIDTH: f32 = 0.01;
const MIP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const LUMA: Vec3 = Vec3::new(0.299, 0.587, 0.114);

const HIGH_PASS_WGSL: &str = include_str!("../shaders/bloom_high_pass.wgsl");
const BLUR_WGSL: &str = include_str!("../shaders/bloom_blur.wgsl");
const COMPOSITE_WGSL: &str = include_str!("../shaders/bloom_composite.wgsl");

pub static PARAMS: [ParamSpec; 3] = [
    ParamSpec::folder_scalar("strength", "UnrealBloomPassProperties", "strength", ParamRange::new(0.0, 2.0, 0.001)),
    ParamSpec::folder_scalar("radius", "UnrealBloomPassProperties", "radius", ParamRange::new(0.0, 2.0, 0.001)),
    ParamSpec::folder_scalar("threshold", "UnrealBloomPassProperties", "threshold", ParamRange::new(0.0, 1.0, 0.001)),
];

// ── reference math ────────────────────────────────────────────────────────

/// Luminosity high pass: pixels below `threshold` become transparent black.
pub fn high_pass(color: Vec4, threshold: f32, smooth_width: f32) -> Vec4 {
    let v = color.truncate().dot(LUMA);
    let alpha = smoothstep(threshold, threshold + smooth_width, v);
    Vec4::ZERO.lerp(color, alpha)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blend factor for a blur level; `radius` mirrors small and large levels.
pub fn lerp_factor(factor: f32, radius: f32) -> f32 {
    factor + (1.2 - factor - factor) * radius
}

/// Adds the weighted blur levels to `input`.
pub fn composite(input: Vec4, levels: [Vec3; MIP_COUNT], strength: f32, radius: f32) -> Vec4 {
    let bloom = levels
        .iter()
        .zip(BLOOM_FACTORS)
        .fold(Vec3::ZERO, |acc, (level, factor)| acc + *level * lerp_factor(factor, radius));
    (input.truncate() + bloom * strength).extend(input.w)
}

/// Sizes of the blur levels: each half of the previous, starting at half resolution.
pub fn mip_sizes(width: u32, height: u32) -> [(u32, u32); MIP_COUNT] {
    let mut size = (width.div_ceil(2).max(1), height.div_ceil(2).max(1));
    std::array::from_fn(|_| {
        let current = size;
        size = (size.0.div_ceil(2).max(1), size.1.div_ceil(2).max(1));
        current
    })
}

// ── GPU ───────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct HighPassParams {
    threshold: f32,
    smooth_width: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct BlurParams {
    direction: [f32; 2],
    inv_size: [f32; 2],
    kernel_radius: f32,
    sigma: f32,
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CompositeParams {
    strength: f32,
    radius: f32,
    factor_4: f32,
    _pad: f32,
    factors: [f32; 4],
}

struct ColorTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ColorTarget {
    fn new(device: &wgpu::Device, size: (u32, u32), label: &str) -> Self {
        let texture = create_color_target(device, size, MIP_FORMAT, 1, label);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { _texture: texture, view }
    }
}

struct BlurLevel {
    horizontal: ColorTarget,
    vertical: ColorTarget,
    _params: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
}

/// Size-dependent resources; rebuilt when the output size changes.
struct BloomTargets {
    size: (u32, u32),
    bright: ColorTarget,
    levels: Vec<BlurLevel>,
}

struct BloomGpu {
    sampler: wgpu::Sampler,
    stage_layout: wgpu::BindGroupLayout,
    high_pass: wgpu::RenderPipeline,
    high_pass_params: wgpu::Buffer,
    blur: wgpu::RenderPipeline,
    composite_layout: wgpu::BindGroupLayout,
    composite_module: wgpu::ShaderModule,
    composite_pipeline_layout: wgpu::PipelineLayout,
    composite_pipelines: Vec<(wgpu::TextureFormat, wgpu::RenderPipeline)>,
    composite_params: wgpu::Buffer,
}

impl BloomGpu {
    fn new(device: &wgpu::Device) -> Self {
        let sampler = util::linear_sampler(device, "prism bloom sampler");

        let stage_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism bloom stage"),
            entries: &[
                util::texture_entry(0),
                util::sampler_entry(1),
                util::uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let stage_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism bloom stage"),
            bind_group_layouts: &[&stage_layout],
            immediate_size: 0,
        });

        let high_pass_module = shader_module(device, "prism bloom high pass", HIGH_PASS_WGSL);
        let high_pass = util::fullscreen_pipeline(
            device,
            "prism bloom high pass",
            &high_pass_module,
            &stage_pipeline_layout,
            "fs_main",
            MIP_FORMAT,
        );

        let blur_module = shader_module(device, "prism bloom blur", BLUR_WGSL);
        let blur = util::fullscreen_pipeline(
            device,
            "prism bloom blur",
            &blur_module,
            &stage_pipeline_layout,
            "fs_main",
            MIP_FORMAT,
        );

        let mut composite_entries = vec![
            util::texture_entry(0),
            util::sampler_entry(1),
            util::uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
        ];
        composite_entries.extend((0..MIP_COUNT as u32).map(|i| util::texture_entry(3 + i)));
        let composite_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism bloom composite"),
            entries: &composite_entries,
        });
        let composite_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism bloom composite"),
            bind_group_layouts: &[&composite_layout],
            immediate_size: 0,
        });

        Self {
            sampler,
            stage_layout,
            high_pass,
            high_pass_params: uniform_buffer::<HighPassParams>(device, "prism bloom high pass"),
            blur,
            composite_layout,
            composite_module: shader_module(device, "prism bloom composite", COMPOSITE_WGSL),
            composite_pipeline_layout,
            composite_pipelines: Vec::new(),
            composite_params: uniform_buffer::<CompositeParams>(device, "prism bloom composite"),
        }
    }

    fn stage_bind_group(
        &self,
        device: &wgpu::Device,
        input: &wgpu::TextureView,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism bloom stage"),
            layout: &self.stage_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(input) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: params.as_entire_binding() },
            ],
        })
    }

    fn create_targets(&self, device: &wgpu::Device, queue: &wgpu::Queue, size: (u32, u32)) -> BloomTargets {
        let bright = ColorTarget::new(device, size, "prism bloom bright");
        let mut levels: Vec<BlurLevel> = Vec::with_capacity(MIP_COUNT);

        for (i, level_size) in mip_sizes(size.0, size.1).into_iter().enumerate() {
            let horizontal = ColorTarget::new(device, level_size, "prism bloom blur h");
            let vertical = ColorTarget::new(device, level_size, "prism bloom blur v");

            let kernel = KERNEL_SIZES[i];
            let inv_size = [1.0 / level_size.0 as f32, 1.0 / level_size.1 as f32];
            let params = [[1.0, 0.0], [0.0, 1.0]].map(|direction| {
                let buffer = uniform_buffer::<BlurParams>(device, "prism bloom blur");
                let data = BlurParams {
                    direction,
                    inv_size,
                    kernel_radius: kernel as f32,
                    sigma: kernel as f32,
                    _pad: [0.0; 2],
                };
                queue.write_buffer(&buffer, 0, bytemuck::bytes_of(&data));
                buffer
            });

            let source = match levels.last() {
                Some(prev) => &prev.vertical.view,
                None => &bright.view,
            };
            let bind_groups = [
                self.stage_bind_group(device, source, &params[0]),
                self.stage_bind_group(device, &horizontal.view, &params[1]),
            ];

            levels.push(BlurLevel { horizontal, vertical, _params: params, bind_groups });
        }

        log::debug!("bloom targets allocated for {}x{}", size.0, size.1);
        BloomTargets { size, bright, levels }
    }

    fn composite_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) -> usize {
        if let Some(index) = self.composite_pipelines.iter().position(|(f, _)| *f == format) {
            return index;
        }
        let pipeline = util::fullscreen_pipeline(
            device,
            "prism bloom composite",
            &self.composite_module,
            &self.composite_pipeline_layout,
            "fs_main",
            format,
        );
        self.composite_pipelines.push((format, pipeline));
        self.composite_pipelines.len() - 1
    }
}

fn shader_module(device: &wgpu::Device, label: &str, fragment: &str) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(util::fullscreen_source(fragment).into()),
    })
}

fn uniform_buffer<T: Pod>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Multi-level bloom: luminosity high pass, five progressively smaller
/// separable blurs, then a weighted additive composite over the input.
pub struct BloomPass {
    enabled: bool,
    uniforms: UniformSet,
    gpu: Option<BloomGpu>,
    targets: Option<BloomTargets>,
}

impl BloomPass {
    pub fn new(strength: f32, radius: f32, threshold: f32) -> Self {
        Self {
            enabled: true,
            uniforms: UniformSet::new()
                .with("strength", UniformValue::Float(strength))
                .with("radius", UniformValue::Float(radius))
                .with("threshold", UniformValue::Float(threshold)),
            gpu: None,
            targets: None,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn value(&self, name: &str) -> f32 {
        self.uniforms.float(name).unwrap_or_default()
    }
}

impl Pass for BloomPass {
    fn slot(&self) -> PassSlot {
        PassSlot::Bloom
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
        &PARAMS
    }

    fn set_size(&mut self, _width: u32, _height: u32) {
        // Reallocated at the next render, sized from the actual output.
        self.targets = None;
    }

    fn render(&mut self, ctx: &PassCtx<'_>, encoder: &mut wgpu::CommandEncoder, io: &PassIo<'_>) {
        let size = io.output.size;
        let high_pass_params = HighPassParams {
            threshold: self.value("threshold"),
            smooth_width: SMOOTH_WIDTH,
            _pad: [0.0; 2],
        };
        let composite_params = CompositeParams {
            strength: self.value("strength"),
            radius: self.value("radius"),
            factor_4: BLOOM_FACTORS[4],
            _pad: 0.0,
            factors: [BLOOM_FACTORS[0], BLOOM_FACTORS[1], BLOOM_FACTORS[2], BLOOM_FACTORS[3]],
        };

        let gpu = self.gpu.get_or_insert_with(|| BloomGpu::new(ctx.device));
        if self.targets.as_ref().is_none_or(|t| t.size != size) {
            self.targets = Some(gpu.create_targets(ctx.device, ctx.queue, size));
        }
        let Some(targets) = self.targets.as_ref() else {
            return;
        };

        ctx.queue.write_buffer(&gpu.high_pass_params, 0, bytemuck::bytes_of(&high_pass_params));
        ctx.queue.write_buffer(&gpu.composite_params, 0, bytemuck::bytes_of(&composite_params));

        let bright_input = gpu.stage_bind_group(ctx.device, io.input, &gpu.high_pass_params);
        util::draw_fullscreen(encoder, "prism bloom high pass", &targets.bright.view, &gpu.high_pass, &[&bright_input]);

        for level in &targets.levels {
            util::draw_fullscreen(encoder, "prism bloom blur h", &level.horizontal.view, &gpu.blur, &[&level.bind_groups[0]]);
            util::draw_fullscreen(encoder, "prism bloom blur v", &level.vertical.view, &gpu.blur, &[&level.bind_groups[1]]);
        }

        let pipeline_index = gpu.composite_pipeline(ctx.device, io.output.format);

        let mut entries = vec![
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(io.input) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&gpu.sampler) },
            wgpu::BindGroupEntry { binding: 2, resource: gpu.composite_params.as_entire_binding() },
        ];
        for (i, level) in targets.levels.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: 3 + i as u32,
                resource: wgpu::BindingResource::TextureView(&level.vertical.view),
            });
        }
        let composite = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism bloom composite"),
            layout: &gpu.composite_layout,
            entries: &entries,
        });

        let (_, pipeline) = &gpu.composite_pipelines[pipeline_index];
        util::draw_fullscreen(encoder, "prism bloom composite", io.output.view, pipeline, &[&composite]);
    }
}
