use glam::Vec2;

use crate::fx::pass::{Pass, PassCtx, PassIo, PassSlot};
use crate::fx::shader::{FragmentShader, ShaderPass};
use crate::fx::uniform::{UniformSet, UniformValue};

pub const SHADER: FragmentShader = FragmentShader {
    label: "prism antialias",
    source: include_str!("../shaders/fxaa.wgsl"),
};

/// Post-process edge antialiasing, used when the offscreen target cannot multisample.
pub struct AntiAliasPass {
    shader: ShaderPass,
}

impl AntiAliasPass {
    pub fn new(width: u32, height: u32) -> Self {
        let uniforms = UniformSet::new().with("resolution", UniformValue::Vec2(texel(width, height)));
        Self { shader: ShaderPass::new(PassSlot::AntiAlias, SHADER, uniforms) }
    }
}

fn texel(width: u32, height: u32) -> Vec2 {
    Vec2::new(1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32)
}

impl Pass for AntiAliasPass {
    fn slot(&self) -> PassSlot {
        PassSlot::AntiAlias
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

    fn set_size(&mut self, width: u32, height: u32) {
        self.shader.uniforms_mut().set("resolution", UniformValue::Vec2(texel(width, height)));
    }

    fn render(&mut self, ctx: &PassCtx<'_>, encoder: &mut wgpu::CommandEncoder, io: &PassIo<'_>) {
        self.shader.draw(ctx, encoder, io);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_tracks_size() {
        let mut pass = AntiAliasPass::new(800, 600);
        assert_eq!(pass.uniforms().vec2("resolution"), Some(Vec2::new(1.0 / 800.0, 1.0 / 600.0)));
        pass.set_size(1600, 1200);
        assert_eq!(pass.uniforms().vec2("resolution"), Some(Vec2::new(1.0 / 1600.0, 1.0 / 1200.0)));
        assert!(pass.enabled());
    }
}
