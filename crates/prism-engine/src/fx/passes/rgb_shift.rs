use crate::fx::pass::PassSlot;
use crate::fx::shader::{FragmentShader, ShaderPass};
use crate::fx::uniform::{UniformSet, UniformValue};

pub const SHADER: FragmentShader = FragmentShader {
    label: "prism rgb shift",
    source: include_str!("../shaders/rgb_shift.wgsl"),
};

/// Chromatic offset of `amount` (in texture space) along `angle` radians.
pub fn rgb_shift_pass(amount: f32, angle: f32) -> ShaderPass {
    let uniforms = UniformSet::new()
        .with("amount", UniformValue::Float(amount))
        .with("angle", UniformValue::Float(angle));
    ShaderPass::new(PassSlot::RgbShift, SHADER, uniforms)
}
