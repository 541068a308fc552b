//! Builds the standard effect pipeline from configuration.

use glam::Vec3;
use serde::Deserialize;

use crate::assets::NormalMap;
use crate::coords::Viewport;
use crate::device::GpuCapabilities;

use super::composer::Composer;
use super::error::PipelineError;
use super::pass::Pass;
use super::passes::{
    dot_screen_pass, futuristic_pass, gamma_pass, rgb_shift_pass, tint_pass, AntiAliasPass, BloomPass,
    FuturisticParams, GlitchPass, ScenePass,
};
use super::target::{antialias_pass_required, select_target};

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlitchConfig {
    pub enabled: bool,
    pub go_wild: bool,
}

impl Default for GlitchConfig {
    fn default() -> Self {
        Self { enabled: false, go_wild: false }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RgbShiftConfig {
    pub enabled: bool,
    pub amount: f32,
    pub angle: f32,
}

impl Default for RgbShiftConfig {
    fn default() -> Self {
        Self { enabled: true, amount: 0.005, angle: 0.0 }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub enabled: bool,
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self { enabled: false, strength: 0.3, radius: 1.0, threshold: 0.6 }
    }
}

/// Initial pass settings. Everything here stays tunable at runtime through
/// the parameter registry.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Scene tone-mapping exposure.
    pub exposure: f32,
    pub dot_screen: bool,
    pub glitch: GlitchConfig,
    pub rgb_shift: RgbShiftConfig,
    pub bloom: BloomConfig,
    pub tint: [f32; 3],
    pub futuristic: FuturisticParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            exposure: 1.5,
            dot_screen: false,
            glitch: GlitchConfig::default(),
            rgb_shift: RgbShiftConfig::default(),
            bloom: BloomConfig::default(),
            tint: [0.0; 3],
            futuristic: FuturisticParams::default(),
        }
    }
}

/// Assembles the fixed pipeline for `viewport` on an adapter with `caps`.
///
/// Without a normal map the futuristic pass is left out; every other pass is
/// always present, optional ones carrying their configured enabled flag.
pub fn build_pipeline(
    config: &PipelineConfig,
    viewport: Viewport,
    caps: GpuCapabilities,
    normal_map: Option<&NormalMap>,
) -> Result<Composer, PipelineError> {
    let desc = select_target(viewport, caps);
    let mut composer = Composer::new(desc, viewport);

    composer.add_pass(ScenePass::new(config.exposure))?;
    composer.add_pass(dot_screen_pass().with_enabled(config.dot_screen))?;

    let mut glitch = GlitchPass::new(config.glitch.go_wild);
    glitch.set_enabled(config.glitch.enabled);
    composer.add_pass(glitch)?;

    composer.add_pass(
        rgb_shift_pass(config.rgb_shift.amount, config.rgb_shift.angle).with_enabled(config.rgb_shift.enabled),
    )?;
    composer.add_pass(
        BloomPass::new(config.bloom.strength, config.bloom.radius, config.bloom.threshold)
            .with_enabled(config.bloom.enabled),
    )?;
    composer.add_pass(tint_pass(Vec3::from_array(config.tint)))?;

    match normal_map {
        Some(map) => composer.add_pass(futuristic_pass(config.futuristic, map))?,
        None => log::warn!("no normal map; futuristic pass omitted"),
    }

    composer.add_pass(gamma_pass())?;

    let antialias = antialias_pass_required(viewport.pixel_density, caps);
    if antialias {
        composer.add_pass(AntiAliasPass::new(desc.width, desc.height))?;
    }

    composer.validate()?;

    log::info!(
        "pipeline: {}x{} target, {:?}, antialias pass: {}",
        desc.width,
        desc.height,
        desc.sampling,
        if antialias { "yes" } else { "no" }
    );
    log::info!(
        "passes: {}",
        composer.slots().iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
    );

    Ok(composer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::pass::PassSlot;
    use crate::fx::target::SamplingMode;
    use image::{Rgba, RgbaImage};

    const MSAA: GpuCapabilities = GpuCapabilities { multisample: true };
    const NO_MSAA: GpuCapabilities = GpuCapabilities { multisample: false };

    fn normal_map() -> NormalMap {
        NormalMap::from_image(RgbaImage::from_pixel(4, 4, Rgba([128, 128, 255, 255])))
    }

    fn build(density: f32, caps: GpuCapabilities) -> Composer {
        let viewport = Viewport::new(800.0, 600.0, density);
        build_pipeline(&PipelineConfig::default(), viewport, caps, Some(&normal_map())).unwrap()
    }

    // ── target scenarios ─────────────────────────────────────────────────

    #[test]
    fn unit_density_with_msaa_uses_multisampled_target() {
        let c = build(1.0, MSAA);
        assert_eq!(c.target().sampling, SamplingMode::Multisample { samples: 4 });
        assert!(c.pass(PassSlot::AntiAlias).is_none());
    }

    #[test]
    fn unit_density_without_msaa_appends_antialias_after_gamma() {
        let c = build(1.0, NO_MSAA);
        assert_eq!(c.target().sampling, SamplingMode::Single);
        let slots = c.slots();
        assert_eq!(&slots[slots.len() - 2..], &[PassSlot::GammaCorrection, PassSlot::AntiAlias]);
        assert!(c.pass(PassSlot::AntiAlias).unwrap().enabled());
    }

    #[test]
    fn high_density_needs_no_antialiasing() {
        for caps in [MSAA, NO_MSAA] {
            let c = build(2.0, caps);
            assert_eq!(c.target().sampling, SamplingMode::Single);
            assert!(c.pass(PassSlot::AntiAlias).is_none());
            assert_eq!(c.target().size(), (1600, 1200));
        }
    }

    // ── pass defaults ────────────────────────────────────────────────────

    #[test]
    fn default_enabled_flags() {
        let c = build(2.0, MSAA);
        let enabled = |slot| c.pass(slot).unwrap().enabled();
        assert!(enabled(PassSlot::Scene));
        assert!(!enabled(PassSlot::DotScreen));
        assert!(!enabled(PassSlot::Glitch));
        assert!(enabled(PassSlot::RgbShift));
        assert!(!enabled(PassSlot::Bloom));
        assert!(enabled(PassSlot::Tint));
        assert!(enabled(PassSlot::Futuristic));
        assert!(enabled(PassSlot::GammaCorrection));
    }

    #[test]
    fn configured_values_reach_the_passes() {
        let config = PipelineConfig {
            bloom: BloomConfig { enabled: true, strength: 1.2, ..BloomConfig::default() },
            tint: [0.1, 0.2, 0.3],
            ..PipelineConfig::default()
        };
        let c = build_pipeline(&config, Viewport::new(100.0, 100.0, 2.0), MSAA, Some(&normal_map())).unwrap();
        let bloom = c.pass(PassSlot::Bloom).unwrap();
        assert!(bloom.enabled());
        assert_eq!(bloom.uniforms().float("strength"), Some(1.2));
        assert_eq!(bloom.uniforms().float("threshold"), Some(0.6));
        assert_eq!(c.pass(PassSlot::Tint).unwrap().uniforms().vec3("tint"), Some(Vec3::new(0.1, 0.2, 0.3)));
    }

    #[test]
    fn missing_normal_map_drops_only_the_futuristic_pass() {
        let c = build_pipeline(&PipelineConfig::default(), Viewport::new(100.0, 100.0, 2.0), MSAA, None).unwrap();
        assert!(c.pass(PassSlot::Futuristic).is_none());
        assert_eq!(
            c.slots(),
            vec![
                PassSlot::Scene,
                PassSlot::DotScreen,
                PassSlot::Glitch,
                PassSlot::RgbShift,
                PassSlot::Bloom,
                PassSlot::Tint,
                PassSlot::GammaCorrection,
            ]
        );
    }
}
