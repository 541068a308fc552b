//! Offscreen render target selection.
//!
//! The target strategy depends only on the rendered pixel density and on
//! whether the adapter can multisample. At density 1 exactly one antialiasing
//! mechanism is used: hardware multisampling when available, otherwise a
//! full-screen antialias pass. Denser displays get neither.

use crate::coords::Viewport;
use crate::device::{GpuCapabilities, MSAA_SAMPLES};
use crate::render::{create_color_target, util};

/// Color format of the offscreen targets.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SamplingMode {
    Single,
    Multisample { samples: u32 },
}

impl SamplingMode {
    pub fn sample_count(self) -> u32 {
        match self {
            SamplingMode::Single => 1,
            SamplingMode::Multisample { samples } => samples,
        }
    }
}

/// Description of the target the composer renders into.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderTargetDesc {
    /// Size in physical pixels.
    pub width: u32,
    pub height: u32,
    pub sampling: SamplingMode,
    pub min_filter: wgpu::FilterMode,
    pub mag_filter: wgpu::FilterMode,
    pub format: wgpu::TextureFormat,
}

impl RenderTargetDesc {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_multisampled(&self) -> bool {
        self.sampling != SamplingMode::Single
    }
}

fn is_unit_density(pixel_density: f32) -> bool {
    (pixel_density - 1.0).abs() <= f32::EPSILON
}

/// Picks the offscreen target for `viewport` and the adapter's capabilities.
pub fn select_target(viewport: Viewport, caps: GpuCapabilities) -> RenderTargetDesc {
    let (width, height) = viewport.physical_size();
    let sampling = if is_unit_density(viewport.pixel_density) && caps.multisample {
        SamplingMode::Multisample { samples: MSAA_SAMPLES }
    } else {
        SamplingMode::Single
    };

    RenderTargetDesc {
        width,
        height,
        sampling,
        min_filter: wgpu::FilterMode::Linear,
        mag_filter: wgpu::FilterMode::Linear,
        format: TARGET_FORMAT,
    }
}

/// Whether the pipeline needs a post-process antialias pass.
pub fn antialias_pass_required(pixel_density: f32, caps: GpuCapabilities) -> bool {
    is_unit_density(pixel_density) && !caps.multisample
}

struct TargetBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl TargetBuffer {
    fn new(device: &wgpu::Device, desc: &RenderTargetDesc, samples: u32, label: &str) -> Self {
        let texture = create_color_target(device, desc.size(), desc.format, samples, label);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { _texture: texture, view }
    }
}

/// GPU realization of a [`RenderTargetDesc`]: two single-sampled buffers that
/// passes alternate between, plus a multisampled attachment resolved into
/// them when the description asks for multisampling.
///
/// Never resized in place; a new size means a new `TargetChain`.
pub struct TargetChain {
    desc: RenderTargetDesc,
    buffers: [TargetBuffer; 2],
    multisample: Option<TargetBuffer>,
    sampler: wgpu::Sampler,
}

impl TargetChain {
    pub fn new(device: &wgpu::Device, desc: RenderTargetDesc) -> Self {
        let buffers = [
            TargetBuffer::new(device, &desc, 1, "prism target a"),
            TargetBuffer::new(device, &desc, 1, "prism target b"),
        ];
        let multisample = match desc.sampling {
            SamplingMode::Single => None,
            SamplingMode::Multisample { samples } => {
                Some(TargetBuffer::new(device, &desc, samples, "prism target msaa"))
            }
        };
        let sampler = util::filtered_sampler(device, "prism target sampler", desc.min_filter, desc.mag_filter);

        log::debug!("allocated render targets {}x{} ({:?})", desc.width, desc.height, desc.sampling);

        Self { desc, buffers, multisample, sampler }
    }

    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }

    pub fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.buffers[index % 2].view
    }

    pub fn multisample_view(&self) -> Option<&wgpu::TextureView> {
        self.multisample.as_ref().map(|b| &b.view)
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSAA: GpuCapabilities = GpuCapabilities { multisample: true };
    const NO_MSAA: GpuCapabilities = GpuCapabilities { multisample: false };

    fn vp(density: f32) -> Viewport {
        Viewport::new(800.0, 600.0, density)
    }

    #[test]
    fn unit_density_with_msaa_is_multisampled_without_aa_pass() {
        let desc = select_target(vp(1.0), MSAA);
        assert_eq!(desc.sampling, SamplingMode::Multisample { samples: MSAA_SAMPLES });
        assert!(!antialias_pass_required(1.0, MSAA));
    }

    #[test]
    fn unit_density_without_msaa_needs_aa_pass() {
        let desc = select_target(vp(1.0), NO_MSAA);
        assert_eq!(desc.sampling, SamplingMode::Single);
        assert!(antialias_pass_required(1.0, NO_MSAA));
    }

    #[test]
    fn dense_display_uses_neither_mechanism() {
        for caps in [MSAA, NO_MSAA] {
            let desc = select_target(vp(2.0), caps);
            assert_eq!(desc.sampling, SamplingMode::Single);
            assert!(!antialias_pass_required(2.0, caps));
        }
    }

    #[test]
    fn sub_unit_density_uses_neither_mechanism() {
        let viewport = Viewport::from_window((600, 450), 0.75, 2.0);
        assert_eq!(viewport.pixel_density, 0.75);
        for caps in [MSAA, NO_MSAA] {
            assert_eq!(select_target(viewport, caps).sampling, SamplingMode::Single);
            assert!(!antialias_pass_required(viewport.pixel_density, caps));
        }
    }

    #[test]
    fn never_both_mechanisms() {
        for density in [1.0, 1.25, 1.5, 2.0] {
            for caps in [MSAA, NO_MSAA] {
                let msaa = select_target(vp(density), caps).is_multisampled();
                let pass = antialias_pass_required(density, caps);
                assert!(!(msaa && pass), "density {density} caps {caps:?}");
                if density == 1.0 {
                    assert!(msaa ^ pass, "exactly one mechanism at unit density");
                }
            }
        }
    }

    #[test]
    fn target_matches_physical_size_with_linear_filtering() {
        let desc = select_target(vp(2.0), MSAA);
        assert_eq!(desc.size(), (1600, 1200));
        assert_eq!(desc.min_filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.format, TARGET_FORMAT);
    }
}
