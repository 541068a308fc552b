use std::f32::consts::PI;

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::fx::pass::{Pass, PassCtx, PassIo, PassSlot};
use crate::fx::shader::{FragmentShader, ShaderPass};
use crate::fx::uniform::{UniformSet, UniformValue};
use crate::render::TextureSource;

pub const SHADER: FragmentShader = FragmentShader {
    label: "prism glitch",
    source: include_str!("../shaders/glitch.wgsl"),
};

const HEIGHTMAP_SIZE: u32 = 64;

/// What the glitch schedule did on a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GlitchPhase {
    /// Large displacement; starts a new cycle.
    Strong,
    /// Small displacement early in a cycle.
    Weak,
    /// Image passes through untouched.
    Bypass,
}

/// Randomized digital glitch.
///
/// Each cycle starts with a strong glitch, jitters weakly for the first fifth
/// of the cycle, then bypasses until the next trigger 120 to 240 frames later.
/// With `go_wild` every frame is a strong glitch.
pub struct GlitchPass {
    shader: ShaderPass,
    rng: StdRng,
    frame: u32,
    trigger: u32,
    go_wild: bool,
}

impl GlitchPass {
    pub fn new(go_wild: bool) -> Self {
        Self::with_rng(StdRng::from_entropy(), go_wild)
    }

    /// Deterministic schedule for a given seed.
    pub fn seeded(seed: u64, go_wild: bool) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), go_wild)
    }

    fn with_rng(mut rng: StdRng, go_wild: bool) -> Self {
        let heightmap = heightmap(&mut rng, HEIGHTMAP_SIZE);
        let trigger = rng.gen_range(120..=240);

        let uniforms = UniformSet::new()
            .with("byp", UniformValue::Float(0.0))
            .with("amount", UniformValue::Float(0.08))
            .with("angle", UniformValue::Float(0.02))
            .with("seed", UniformValue::Float(0.02))
            .with("seed_x", UniformValue::Float(0.02))
            .with("seed_y", UniformValue::Float(0.02))
            .with("distortion_x", UniformValue::Float(0.5))
            .with("distortion_y", UniformValue::Float(0.6))
            .with("col_s", UniformValue::Float(0.05))
            .with("disp", UniformValue::Texture(Some(TextureSource::new(heightmap))));

        Self {
            shader: ShaderPass::new(PassSlot::Glitch, SHADER, uniforms),
            rng,
            frame: 0,
            trigger,
            go_wild,
        }
    }

    pub fn go_wild(&self) -> bool {
        self.go_wild
    }

    pub fn set_go_wild(&mut self, go_wild: bool) {
        self.go_wild = go_wild;
    }

    /// Advances the schedule by one frame and writes the resulting uniforms.
    pub fn advance(&mut self) -> GlitchPhase {
        let rng = &mut self.rng;
        let u = self.shader.uniforms_mut();

        u.set_float("seed", rng.r#gen::<f32>());
        u.set_float("byp", 0.0);

        let phase = if self.frame % self.trigger == 0 || self.go_wild {
            u.set_float("amount", rng.r#gen::<f32>() / 30.0);
            u.set_float("angle", rng.gen_range(-PI..PI));
            u.set_float("seed_x", rng.gen_range(-1.0..1.0));
            u.set_float("seed_y", rng.gen_range(-1.0..1.0));
            u.set_float("distortion_x", rng.gen_range(0.0..1.0));
            u.set_float("distortion_y", rng.gen_range(0.0..1.0));
            self.frame = 0;
            self.trigger = rng.gen_range(120..=240);
            GlitchPhase::Strong
        } else if self.frame % self.trigger < self.trigger / 5 {
            u.set_float("amount", rng.r#gen::<f32>() / 90.0);
            u.set_float("angle", rng.gen_range(-PI..PI));
            u.set_float("distortion_x", rng.gen_range(0.0..1.0));
            u.set_float("distortion_y", rng.gen_range(0.0..1.0));
            u.set_float("seed_x", rng.gen_range(-0.3..0.3));
            u.set_float("seed_y", rng.gen_range(-0.3..0.3));
            GlitchPhase::Weak
        } else {
            u.set_float("byp", 1.0);
            GlitchPhase::Bypass
        };

        self.frame += 1;
        phase
    }
}

/// Random displacement values in the red channel.
fn heightmap(rng: &mut StdRng, size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |_, _| Rgba([rng.r#gen::<u8>(), 0, 0, 255]))
}

impl Pass for GlitchPass {
    fn slot(&self) -> PassSlot {
        PassSlot::Glitch
    }

    fn enabled(&self) -> bool {
        self.shader.enabled()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.shader.set_enabled(enabled);
    }

    fn uniforms(&self) -> &UniformSet {
        self.shader.uniforms()
    }

    fn uniforms_mut(&mut self) -> &mut UniformSet {
        self.shader.uniforms_mut()
    }

    fn render(&mut self, ctx: &PassCtx<'_>, encoder: &mut wgpu::CommandEncoder, io: &PassIo<'_>) {
        self.advance();
        self.shader.draw(ctx, encoder, io);
    }
}
