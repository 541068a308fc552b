use glam::Vec2;

use crate::fx::pass::PassSlot;
use crate::fx::shader::{FragmentShader, ShaderPass};
use crate::fx::uniform::{UniformSet, UniformValue};

pub const SHADER: FragmentShader = FragmentShader {
    label: "prism dot screen",
    source: include_str!("../shaders/dot_screen.wgsl"),
};

/// Halftone pattern centred at (0.5, 0.5), rotated 1.57 rad, over a 256×256 grid.
pub fn dot_screen_pass() -> ShaderPass {
    let uniforms = UniformSet::new()
        .with("center", UniformValue::Vec2(Vec2::splat(0.5)))
        .with("angle", UniformValue::Float(1.57))
        .with("scale", UniformValue::Float(1.0))
        .with("t_size", UniformValue::Vec2(Vec2::splat(256.0)));
    ShaderPass::new(PassSlot::DotScreen, SHADER, uniforms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_layout_matches_wgsl_struct() {
        let pass = dot_screen_pass();
        let bytes = crate::fx::pass::Pass::uniforms(&pass).to_bytes();
        // center(8) angle(4) scale(4) t_size(8), padded.
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[16..20], &256f32.to_ne_bytes());
    }
}
