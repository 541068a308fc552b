use glam::{Vec2, Vec3, Vec4};
use serde::Deserialize;

use crate::assets::NormalMap;
use crate::fx::params::{ParamRange, ParamSpec};
use crate::fx::pass::PassSlot;
use crate::fx::shader::{FragmentShader, Sampler, ShaderPass};
use crate::fx::uniform::{UniformSet, UniformValue};

pub const SHADER: FragmentShader = FragmentShader {
    label: "prism futuristic",
    source: include_str!("../shaders/futuristic.wgsl"),
};

const STRENGTH_RANGE: ParamRange = ParamRange::new(-3.0, 3.0, 0.01);

pub static PARAMS: [ParamSpec; 2] = [
    ParamSpec::scalar("Hexagon Strength", "hexagon_strength", STRENGTH_RANGE),
    ParamSpec::scalar("Lightness Strength", "light_strength", STRENGTH_RANGE),
];

/// Direction the pseudo-light shines from: normalize(-1, 1, 0).
pub fn light_direction() -> Vec3 {
    Vec3::new(-1.0, 1.0, 0.0).normalize()
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FuturisticParams {
    pub hexagon_strength: f32,
    pub light_strength: f32,
}

impl Default for FuturisticParams {
    fn default() -> Self {
        Self { hexagon_strength: 0.1, light_strength: 0.15 }
    }
}

/// Always-on pass refracting the image through `normal_map`.
pub fn futuristic_pass(params: FuturisticParams, normal_map: &NormalMap) -> ShaderPass {
    let uniforms = UniformSet::new()
        .with("hexagon_strength", UniformValue::Float(params.hexagon_strength))
        .with("light_strength", UniformValue::Float(params.light_strength))
        .with("normal_map", UniformValue::Texture(Some(normal_map.texture().clone())));
    ShaderPass::new(PassSlot::Futuristic, SHADER, uniforms).with_params(&PARAMS)
}

/// Reference form of the fragment stage.
pub fn shade(
    params: FuturisticParams,
    input: &impl Sampler,
    normal_map: &impl Sampler,
    uv: Vec2,
) -> Vec4 {
    let normal = normal_map.sample(uv).truncate() * 2.0 - Vec3::ONE;
    let displaced = uv + normal.truncate() * params.hexagon_strength;
    let color = input.sample(displaced);

    let lightness = normal.dot(light_direction()).clamp(0.0, 1.0);
    (color.truncate() + Vec3::splat(lightness * params.light_strength)).extend(color.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::pass::Pass;
    use approx::assert_relative_eq;
    use image::{Rgba, RgbaImage};

    fn gradient(uv: Vec2) -> Vec4 {
        Vec4::new(uv.x, uv.y, 0.5, 1.0)
    }

    /// Normal tilted toward the light: decodes to roughly (-0.5, 0.5, 0.7).
    fn tilted(_uv: Vec2) -> Vec4 {
        Vec4::new(0.25, 0.75, 0.85, 1.0)
    }

    #[test]
    fn zero_hexagon_strength_samples_in_place() {
        let params = FuturisticParams { hexagon_strength: 0.0, light_strength: 0.0 };
        let uv = Vec2::new(0.3, 0.6);
        assert_eq!(shade(params, &gradient, &tilted, uv), gradient(uv));
    }

    #[test]
    fn zero_hexagon_strength_still_relights() {
        let params = FuturisticParams { hexagon_strength: 0.0, light_strength: 0.15 };
        let uv = Vec2::new(0.3, 0.6);
        let normal = Vec3::new(-0.5, 0.5, 0.7);
        let lift = normal.dot(light_direction()) * 0.15;
        assert!(lift > 0.1);

        let out = shade(params, &gradient, &tilted, uv);
        let base = gradient(uv);
        assert_relative_eq!(out.x, base.x + lift, epsilon = 1e-5);
        assert_relative_eq!(out.y, base.y + lift, epsilon = 1e-5);
        assert_relative_eq!(out.z, base.z + lift, epsilon = 1e-5);
        assert_eq!(out.w, base.w);
    }

    #[test]
    fn zero_light_strength_adds_nothing() {
        let params = FuturisticParams { hexagon_strength: 0.1, light_strength: 0.0 };
        let uv = Vec2::new(0.5, 0.5);
        let displaced = uv + Vec2::new(-0.5, 0.5) * 0.1;
        let out = shade(params, &gradient, &tilted, uv);
        assert_relative_eq!(out.x, gradient(displaced).x, epsilon = 1e-6);
        assert_relative_eq!(out.y, gradient(displaced).y, epsilon = 1e-6);
        assert_relative_eq!(out.z, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn lightness_is_clamped_to_unit_range() {
        // Normal facing away from the light contributes nothing.
        let away = |_uv: Vec2| Vec4::new(1.0, 0.0, 0.5, 1.0);
        let params = FuturisticParams { hexagon_strength: 0.0, light_strength: 3.0 };
        let out = shade(params, &gradient, &away, Vec2::splat(0.5));
        assert_eq!(out, gradient(Vec2::splat(0.5)));
    }

    #[test]
    fn pass_binds_the_normal_map() {
        let map = NormalMap::from_image(RgbaImage::from_pixel(1, 1, Rgba([128, 128, 255, 255])));
        let pass = futuristic_pass(FuturisticParams::default(), &map);
        assert_eq!(pass.uniforms().float("hexagon_strength"), Some(0.1));
        assert_eq!(pass.uniforms().float("light_strength"), Some(0.15));
        assert_eq!(pass.uniforms().missing().count(), 0);
        assert_eq!(pass.params().len(), 2);
    }
}
