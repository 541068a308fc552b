//! Ordered pass execution over a ping-pong pair of offscreen targets.

use crate::coords::Viewport;
use crate::render::{FrameTarget, RenderCtx};

use super::error::PipelineError;
use super::pass::{Pass, PassCtx, PassIo, PassOutput, PassSlot, SceneView};
use super::target::{RenderTargetDesc, TargetChain};

/// Where a plan step writes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Destination {
    /// One of the two offscreen buffers.
    Buffer(usize),
    /// The visible framebuffer.
    Screen,
}

/// One enabled pass in a frame's execution plan.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlanStep {
    /// Index into [`Composer::passes`].
    pub pass: usize,
    pub slot: PassSlot,
    /// Buffer holding the previous pass's result. `None` for the first step.
    pub read: Option<usize>,
    pub write: Destination,
}

/// Owns the passes in fixed order plus the offscreen targets they share.
///
/// Each frame every enabled pass runs in order, reading the previous enabled
/// pass's output; the last enabled pass writes to the screen.
pub struct Composer {
    passes: Vec<Box<dyn Pass>>,
    desc: RenderTargetDesc,
    viewport: Viewport,
    chain: Option<TargetChain>,
}

impl Composer {
    pub fn new(desc: RenderTargetDesc, viewport: Viewport) -> Self {
        Self {
            passes: Vec::new(),
            desc,
            viewport,
            chain: None,
        }
    }

    /// Appends `pass`. Passes must arrive in [`PassSlot::ORDER`], scene first,
    /// each slot at most once.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> Result<(), PipelineError> {
        let slot = pass.slot();
        match self.passes.last() {
            None if slot != PassSlot::Scene => return Err(PipelineError::SceneNotFirst { got: slot }),
            None => {}
            Some(_) if self.pass(slot).is_some() => return Err(PipelineError::DuplicatePass { pass: slot }),
            Some(last) if last.slot() > slot => {
                return Err(PipelineError::OutOfOrder { pass: slot, after: last.slot() });
            }
            Some(_) => {}
        }

        let mut pass = pass;
        pass.set_size(self.desc.width, self.desc.height);
        self.passes.push(Box::new(pass));
        Ok(())
    }

    pub fn passes(&self) -> impl Iterator<Item = &dyn Pass> + '_ {
        self.passes.iter().map(|p| &**p as &dyn Pass)
    }

    pub fn slots(&self) -> Vec<PassSlot> {
        self.passes.iter().map(|p| p.slot()).collect()
    }

    pub fn pass(&self, slot: PassSlot) -> Option<&dyn Pass> {
        for pass in &self.passes {
            if pass.slot() == slot {
                return Some(pass.as_ref());
            }
        }
        None
    }

    pub fn pass_mut(&mut self, slot: PassSlot) -> Option<&mut dyn Pass> {
        for pass in &mut self.passes {
            if pass.slot() == slot {
                return Some(pass.as_mut());
            }
        }
        None
    }

    pub fn target(&self) -> &RenderTargetDesc {
        &self.desc
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Checks the pipeline before the first frame: scene first, every uniform
    /// bound, and exactly one antialiasing mechanism at unit density.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let first = self.passes.first().ok_or(PipelineError::Empty)?;
        if first.slot() != PassSlot::Scene {
            return Err(PipelineError::SceneNotFirst { got: first.slot() });
        }

        for pass in &self.passes {
            if let Some(uniform) = pass.uniforms().missing().next() {
                return Err(PipelineError::MissingUniform { pass: pass.slot(), uniform });
            }
        }

        let has_antialias = self.pass(PassSlot::AntiAlias).is_some();
        if self.desc.is_multisampled() && has_antialias {
            return Err(PipelineError::DoubleAntialias);
        }
        let unit_density = (self.viewport.pixel_density - 1.0).abs() <= f32::EPSILON;
        if unit_density && !self.desc.is_multisampled() && !has_antialias {
            return Err(PipelineError::MissingPass { pass: PassSlot::AntiAlias });
        }
        Ok(())
    }

    /// Execution plan for the current enabled flags.
    ///
    /// Steps alternate between buffers 0 and 1; the last step writes to the screen.
    pub fn plan(&self) -> Vec<PlanStep> {
        let enabled: Vec<usize> = (0..self.passes.len()).filter(|&i| self.passes[i].enabled()).collect();
        let last = enabled.len().saturating_sub(1);

        let mut read = None;
        let mut steps = Vec::with_capacity(enabled.len());
        for (n, &pass) in enabled.iter().enumerate() {
            let write = if n == last {
                Destination::Screen
            } else {
                Destination::Buffer(n % 2)
            };
            steps.push(PlanStep { pass, slot: self.passes[pass].slot(), read, write });
            if let Destination::Buffer(i) = write {
                read = Some(i);
            }
        }
        steps
    }

    /// Applies a new viewport to the composer and every pass. Order, enabled
    /// flags and uniform values are untouched; repeated identical calls are no-ops.
    pub fn resize(&mut self, viewport: Viewport) {
        let (width, height) = viewport.physical_size();
        if viewport == self.viewport && (width, height) == self.desc.size() {
            return;
        }

        self.viewport = viewport;
        self.desc.width = width;
        self.desc.height = height;
        for pass in &mut self.passes {
            pass.set_size(width, height);
        }
        self.chain = None;

        log::info!(
            "composer resized to {}x{} @{} ({width}x{height} physical)",
            viewport.width,
            viewport.height,
            viewport.pixel_density
        );
    }

    /// Records every enabled pass into `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut FrameTarget<'_>,
        view: SceneView<'_>,
    ) -> Result<(), PipelineError> {
        if self.passes.is_empty() {
            return Err(PipelineError::Empty);
        }
        if self.chain.as_ref().is_none_or(|c| c.desc() != &self.desc) {
            self.chain = Some(TargetChain::new(ctx.device, self.desc));
        }
        let Some(chain) = self.chain.as_ref() else {
            return Ok(());
        };

        let pass_ctx = PassCtx { device: ctx.device, queue: ctx.queue, view };
        let samples = self.desc.sampling.sample_count();

        for step in self.plan() {
            let output = match step.write {
                Destination::Buffer(i) => PassOutput {
                    view: chain.view(i),
                    format: self.desc.format,
                    size: self.desc.size(),
                    multisample: match step.slot {
                        PassSlot::Scene => chain.multisample_view().map(|v| (v, samples)),
                        _ => None,
                    },
                },
                Destination::Screen => PassOutput {
                    view: target.color_view,
                    format: ctx.surface_format,
                    size: ctx.surface_size,
                    multisample: None,
                },
            };
            // The first pass ignores its input; hand it the buffer it does not write.
            let io = PassIo {
                input: chain.view(step.read.unwrap_or(1)),
                sampler: chain.sampler(),
                output,
            };
            self.passes[step.pass].render(&pass_ctx, target.encoder, &io);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::passes::{dot_screen_pass, gamma_pass, rgb_shift_pass, tint_pass, AntiAliasPass, BloomPass, ScenePass};
    use crate::fx::target::SamplingMode;
    use glam::Vec3;

    fn desc(sampling: SamplingMode) -> RenderTargetDesc {
        RenderTargetDesc {
            width: 800,
            height: 600,
            sampling,
            min_filter: wgpu::FilterMode::Linear,
            mag_filter: wgpu::FilterMode::Linear,
            format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    fn composer() -> Composer {
        let mut c = Composer::new(desc(SamplingMode::Multisample { samples: 4 }), Viewport::new(800.0, 600.0, 1.0));
        c.add_pass(ScenePass::new(1.5)).unwrap();
        c.add_pass(dot_screen_pass().with_enabled(false)).unwrap();
        c.add_pass(rgb_shift_pass(0.005, 0.0)).unwrap();
        c.add_pass(BloomPass::new(0.3, 1.0, 0.6).with_enabled(false)).unwrap();
        c.add_pass(tint_pass(Vec3::ZERO)).unwrap();
        c.add_pass(gamma_pass()).unwrap();
        c
    }

    // ── construction ─────────────────────────────────────────────────────

    #[test]
    fn scene_must_come_first() {
        let mut c = Composer::new(desc(SamplingMode::Single), Viewport::new(10.0, 10.0, 2.0));
        assert_eq!(
            c.add_pass(gamma_pass()),
            Err(PipelineError::SceneNotFirst { got: PassSlot::GammaCorrection })
        );
        assert_eq!(c.validate(), Err(PipelineError::Empty));
    }

    #[test]
    fn rejects_out_of_order_and_duplicates() {
        let mut c = composer();
        assert_eq!(
            c.add_pass(rgb_shift_pass(0.0, 0.0)),
            Err(PipelineError::DuplicatePass { pass: PassSlot::RgbShift })
        );
        assert_eq!(
            c.add_pass(dot_screen_pass()),
            Err(PipelineError::DuplicatePass { pass: PassSlot::DotScreen })
        );
        let mut c = Composer::new(desc(SamplingMode::Single), Viewport::new(10.0, 10.0, 2.0));
        c.add_pass(ScenePass::new(1.0)).unwrap();
        c.add_pass(gamma_pass()).unwrap();
        assert_eq!(
            c.add_pass(tint_pass(Vec3::ZERO)),
            Err(PipelineError::OutOfOrder { pass: PassSlot::Tint, after: PassSlot::GammaCorrection })
        );
    }

    #[test]
    fn antialias_is_never_doubled() {
        let mut c = composer();
        c.add_pass(AntiAliasPass::new(800, 600)).unwrap();
        assert_eq!(c.validate(), Err(PipelineError::DoubleAntialias));
    }

    #[test]
    fn antialias_is_never_missing_at_unit_density() {
        let mut c = Composer::new(desc(SamplingMode::Single), Viewport::new(800.0, 600.0, 1.0));
        c.add_pass(ScenePass::new(1.0)).unwrap();
        c.add_pass(gamma_pass()).unwrap();
        assert_eq!(c.validate(), Err(PipelineError::MissingPass { pass: PassSlot::AntiAlias }));
        c.add_pass(AntiAliasPass::new(800, 600)).unwrap();
        assert_eq!(c.validate(), Ok(()));
    }

    // ── plan ─────────────────────────────────────────────────────────────

    #[test]
    fn plan_skips_disabled_passes() {
        let c = composer();
        let slots: Vec<_> = c.plan().iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![PassSlot::Scene, PassSlot::RgbShift, PassSlot::Tint, PassSlot::GammaCorrection]);
    }

    #[test]
    fn plan_order_is_invariant_under_toggles() {
        let mut c = composer();
        for mask in 0..4u8 {
            c.pass_mut(PassSlot::DotScreen).unwrap().set_enabled(mask & 1 != 0);
            c.pass_mut(PassSlot::Bloom).unwrap().set_enabled(mask & 2 != 0);

            let slots: Vec<_> = c.plan().iter().map(|s| s.slot).collect();
            assert_eq!(slots.first(), Some(&PassSlot::Scene));
            assert_eq!(slots.last(), Some(&PassSlot::GammaCorrection));
            assert!(slots.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn exactly_one_step_writes_to_screen() {
        let mut c = composer();
        c.pass_mut(PassSlot::Bloom).unwrap().set_enabled(true);
        let plan = c.plan();
        let screen: Vec<_> = plan.iter().filter(|s| s.write == Destination::Screen).collect();
        assert_eq!(screen.len(), 1);
        assert_eq!(plan.last().map(|s| s.write), Some(Destination::Screen));
    }

    #[test]
    fn each_step_reads_what_the_previous_wrote() {
        let plan = composer().plan();
        assert_eq!(plan[0].read, None);
        for pair in plan.windows(2) {
            let Destination::Buffer(written) = pair[0].write else {
                panic!("only the last step writes to the screen");
            };
            assert_eq!(pair[1].read, Some(written));
            assert_ne!(pair[1].write, Destination::Buffer(written));
        }
    }

    #[test]
    fn only_enabled_scene_writes_straight_to_screen() {
        let mut c = Composer::new(desc(SamplingMode::Single), Viewport::new(10.0, 10.0, 2.0));
        c.add_pass(ScenePass::new(1.0)).unwrap();
        assert_eq!(
            c.plan(),
            vec![PlanStep { pass: 0, slot: PassSlot::Scene, read: None, write: Destination::Screen }]
        );
    }

    // ── resize ───────────────────────────────────────────────────────────

    #[test]
    fn resize_is_idempotent() {
        let mut c = composer();
        c.pass_mut(PassSlot::Bloom).unwrap().set_enabled(true);
        let vp = Viewport::new(1024.0, 512.0, 2.0);

        c.resize(vp);
        let once = (*c.target(), c.viewport(), c.slots());
        c.resize(vp);
        assert_eq!((*c.target(), c.viewport(), c.slots()), once);

        assert_eq!(c.target().size(), (2048, 1024));
        assert!(c.pass(PassSlot::Bloom).unwrap().enabled());
        assert!(!c.pass(PassSlot::DotScreen).unwrap().enabled());
    }

    #[test]
    fn resize_preserves_uniforms_and_updates_antialias_resolution() {
        let mut c = Composer::new(desc(SamplingMode::Single), Viewport::new(800.0, 600.0, 1.0));
        c.add_pass(ScenePass::new(1.0)).unwrap();
        c.add_pass(tint_pass(Vec3::new(0.1, 0.0, 0.0))).unwrap();
        c.add_pass(AntiAliasPass::new(1, 1)).unwrap();

        c.resize(Viewport::new(320.0, 200.0, 1.0));
        let tint = c.pass(PassSlot::Tint).unwrap().uniforms().vec3("tint").unwrap();
        assert_eq!(tint, Vec3::new(0.1, 0.0, 0.0));
        let resolution = c.pass(PassSlot::AntiAlias).unwrap().uniforms().vec2("resolution").unwrap();
        assert_eq!((resolution.x, resolution.y), (1.0 / 320.0, 1.0 / 200.0));
    }
}
