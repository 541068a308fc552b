use glam::{Vec3, Vec4};

use crate::fx::pass::PassSlot;
use crate::fx::shader::{FragmentShader, ShaderPass};
use crate::fx::uniform::UniformSet;

pub const SHADER: FragmentShader = FragmentShader {
    label: "prism gamma correction",
    source: include_str!("../shaders/gamma.wgsl"),
};

/// Always-on linear to sRGB conversion.
pub fn gamma_pass() -> ShaderPass {
    ShaderPass::new(PassSlot::GammaCorrection, SHADER, UniformSet::new())
}

/// Reference form of the fragment stage.
pub fn linear_to_srgb(color: Vec4) -> Vec4 {
    let encode = |c: f32| {
        if c <= 0.003_130_8 {
            c * 12.92
        } else {
            c.powf(0.41666) * 1.055 - 0.055
        }
    };
    Vec3::new(encode(color.x), encode(color.y), encode(color.z)).extend(color.w)
}
