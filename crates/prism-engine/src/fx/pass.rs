use crate::scene::{PerspectiveCamera, Scene};

use super::params::ParamSpec;
use super::uniform::UniformSet;

/// Position of a pass in the fixed pipeline order.
///
/// The declaration order is the execution order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PassSlot {
    Scene,
    DotScreen,
    Glitch,
    RgbShift,
    Bloom,
    Tint,
    Futuristic,
    GammaCorrection,
    AntiAlias,
}

impl PassSlot {
    pub const ORDER: [PassSlot; 9] = [
        PassSlot::Scene,
        PassSlot::DotScreen,
        PassSlot::Glitch,
        PassSlot::RgbShift,
        PassSlot::Bloom,
        PassSlot::Tint,
        PassSlot::Futuristic,
        PassSlot::GammaCorrection,
        PassSlot::AntiAlias,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PassSlot::Scene => "scene",
            PassSlot::DotScreen => "dotScreen",
            PassSlot::Glitch => "glitch",
            PassSlot::RgbShift => "rgbShift",
            PassSlot::Bloom => "unrealBloom",
            PassSlot::Tint => "tint",
            PassSlot::Futuristic => "futuristic",
            PassSlot::GammaCorrection => "gammaCorrection",
            PassSlot::AntiAlias => "antialias",
        }
    }

    /// Passes that can be switched on and off at runtime.
    pub fn is_toggleable(self) -> bool {
        matches!(
            self,
            PassSlot::DotScreen | PassSlot::Glitch | PassSlot::RgbShift | PassSlot::Bloom
        )
    }
}

/// What the scene pass draws this frame.
#[derive(Copy, Clone)]
pub struct SceneView<'a> {
    pub scene: &'a Scene,
    pub camera: &'a PerspectiveCamera,
    /// Seconds since the driver started.
    pub elapsed: f32,
}

/// GPU handles and frame data shared by every pass in one composer run.
pub struct PassCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub view: SceneView<'a>,
}

/// Where a pass writes.
pub struct PassOutput<'a> {
    pub view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// Size in physical pixels.
    pub size: (u32, u32),
    /// Multisampled attachment that resolves into `view`. Only the scene pass uses it.
    pub multisample: Option<(&'a wgpu::TextureView, u32)>,
}

/// Input and output of one pass execution.
pub struct PassIo<'a> {
    /// Result of the previous pass.
    pub input: &'a wgpu::TextureView,
    /// Sampler matching the offscreen target's filtering.
    pub sampler: &'a wgpu::Sampler,
    pub output: PassOutput<'a>,
}

/// One stage of the post-processing pipeline.
///
/// Passes allocate GPU resources lazily on their first `render`, so they can be
/// constructed, configured and inspected without a device.
pub trait Pass {
    fn slot(&self) -> PassSlot;

    fn name(&self) -> &'static str {
        self.slot().name()
    }

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn uniforms(&self) -> &UniformSet;

    fn uniforms_mut(&mut self) -> &mut UniformSet;

    /// Tunable uniforms exposed to the control surface.
    fn params(&self) -> &[ParamSpec] {
        &[]
    }

    /// Called with the render size in physical pixels whenever the viewport changes.
    fn set_size(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Records this pass. Must write every pixel of `io.output`.
    fn render(&mut self, ctx: &PassCtx<'_>, encoder: &mut wgpu::CommandEncoder, io: &PassIo<'_>);
}
