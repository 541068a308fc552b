use glam::{Vec2, Vec3, Vec4};

use crate::fx::params::{ParamRange, ParamSpec};
use crate::fx::pass::PassSlot;
use crate::fx::shader::{FragmentShader, Sampler, ShaderPass};
use crate::fx::uniform::{UniformSet, UniformValue};

pub const SHADER: FragmentShader = FragmentShader {
    label: "prism tint",
    source: include_str!("../shaders/tint.wgsl"),
};

const TINT_RANGE: ParamRange = ParamRange::new(-1.0, 1.0, 0.01);

pub static PARAMS: [ParamSpec; 3] = [
    ParamSpec::component("x", "Tint Color", "tint", 0, TINT_RANGE),
    ParamSpec::component("y", "Tint Color", "tint", 1, TINT_RANGE),
    ParamSpec::component("z", "Tint Color", "tint", 2, TINT_RANGE),
];

/// Always-on pass adding `tint` to every pixel's color channels. Alpha is untouched.
pub fn tint_pass(tint: Vec3) -> ShaderPass {
    let uniforms = UniformSet::new().with("tint", UniformValue::Vec3(tint));
    ShaderPass::new(PassSlot::Tint, SHADER, uniforms).with_params(&PARAMS)
}

/// Reference form of the fragment stage.
pub fn shade(tint: Vec3, input: &impl Sampler, uv: Vec2) -> Vec4 {
    let color = input.sample(uv);
    (color.truncate() + tint).extend(color.w)
}
