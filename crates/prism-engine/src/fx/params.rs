//! Parameter bindings between the pipeline and an external control surface.
//!
//! The registry is a flat, ordered list: for every toggleable pass an enable
//! toggle followed by that pass's numeric parameters, then the numeric
//! parameters of the always-on passes, all in pipeline order. Bindings hold
//! no values; reads and writes go straight to the pass.

use thiserror::Error;

use super::composer::Composer;
use super::pass::{Pass, PassSlot};

/// Numeric constraints of one binding.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    /// Snaps `value` to the step grid, then clamps it into `[min, max]`.
    pub fn apply(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.min;
        }
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }
}

/// Declares one tunable float: a scalar uniform, or one component of a vector uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParamSpec {
    pub label: &'static str,
    pub folder: Option<&'static str>,
    pub uniform: &'static str,
    pub component: usize,
    pub range: ParamRange,
}

impl ParamSpec {
    pub const fn scalar(label: &'static str, uniform: &'static str, range: ParamRange) -> Self {
        Self { label, folder: None, uniform, component: 0, range }
    }

    pub const fn folder_scalar(
        label: &'static str,
        folder: &'static str,
        uniform: &'static str,
        range: ParamRange,
    ) -> Self {
        Self { label, folder: Some(folder), uniform, component: 0, range }
    }

    pub const fn component(
        label: &'static str,
        folder: &'static str,
        uniform: &'static str,
        component: usize,
        range: ParamRange,
    ) -> Self {
        Self { label, folder: Some(folder), uniform, component, range }
    }

    /// `folder/label`, or just `label` outside a folder.
    pub fn path(&self) -> String {
        match self.folder {
            Some(folder) => format!("{folder}/{}", self.label),
            None => self.label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("no binding at index {0}")]
    UnknownBinding(usize),

    #[error("binding '{label}' does not accept that kind of value")]
    KindMismatch { label: String },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Number(f32),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(on) => write!(f, "{}", if *on { "on" } else { "off" }),
            ParamValue::Number(v) => write!(f, "{v:.3}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BindingKind {
    Toggle,
    Number(ParamSpec),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamBinding {
    pub slot: PassSlot,
    pub label: String,
    pub kind: BindingKind,
}

impl ParamBinding {
    pub fn range(&self) -> Option<ParamRange> {
        match self.kind {
            BindingKind::Toggle => None,
            BindingKind::Number(spec) => Some(spec.range),
        }
    }

    fn read(&self, pass: &dyn Pass) -> Option<ParamValue> {
        match self.kind {
            BindingKind::Toggle => Some(ParamValue::Bool(pass.enabled())),
            BindingKind::Number(spec) => pass
                .uniforms()
                .component(spec.uniform, spec.component)
                .map(ParamValue::Number),
        }
    }

    fn kind_mismatch(&self) -> ParamError {
        ParamError::KindMismatch { label: self.label.clone() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParamRegistry {
    bindings: Vec<ParamBinding>,
}

impl ParamRegistry {
    pub fn from_composer(composer: &Composer) -> Self {
        let mut bindings = Vec::new();
        for pass in composer.passes() {
            let slot = pass.slot();
            if slot.is_toggleable() {
                bindings.push(ParamBinding {
                    slot,
                    label: format!("{}Pass", slot.name()),
                    kind: BindingKind::Toggle,
                });
            }
            for spec in pass.params() {
                bindings.push(ParamBinding { slot, label: spec.path(), kind: BindingKind::Number(*spec) });
            }
        }
        Self { bindings }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[ParamBinding] {
        &self.bindings
    }

    pub fn find(&self, label: &str) -> Option<usize> {
        self.bindings.iter().position(|b| b.label == label)
    }

    fn binding(&self, index: usize) -> Result<&ParamBinding, ParamError> {
        self.bindings.get(index).ok_or(ParamError::UnknownBinding(index))
    }

    pub fn get(&self, composer: &Composer, index: usize) -> Result<ParamValue, ParamError> {
        let binding = self.binding(index)?;
        let pass = composer.pass(binding.slot).ok_or(ParamError::UnknownBinding(index))?;
        binding.read(pass).ok_or_else(|| binding.kind_mismatch())
    }

    /// Writes `value` through to the pass. Numbers are snapped and clamped to
    /// the binding's range; the value actually stored is returned.
    pub fn set(&self, composer: &mut Composer, index: usize, value: ParamValue) -> Result<ParamValue, ParamError> {
        let binding = self.binding(index)?;
        let pass = composer.pass_mut(binding.slot).ok_or(ParamError::UnknownBinding(index))?;

        let stored = match (binding.kind, value) {
            (BindingKind::Toggle, ParamValue::Bool(on)) => {
                pass.set_enabled(on);
                ParamValue::Bool(on)
            }
            (BindingKind::Number(spec), ParamValue::Number(v)) => {
                let v = spec.range.apply(v);
                if !pass.uniforms_mut().set_component(spec.uniform, spec.component, v) {
                    return Err(binding.kind_mismatch());
                }
                ParamValue::Number(v)
            }
            _ => return Err(binding.kind_mismatch()),
        };

        log::debug!("{} = {stored}", binding.label);
        Ok(stored)
    }

    /// Flips a toggle, or moves a number by `steps` of its step size.
    pub fn nudge(&self, composer: &mut Composer, index: usize, steps: i32) -> Result<ParamValue, ParamError> {
        let binding = self.binding(index)?;
        let next = match (binding.kind, self.get(composer, index)?) {
            (BindingKind::Toggle, ParamValue::Bool(on)) => ParamValue::Bool(!on),
            (BindingKind::Number(spec), ParamValue::Number(v)) => {
                ParamValue::Number(v + spec.range.step * steps as f32)
            }
            _ => return Err(binding.kind_mismatch()),
        };
        self.set(composer, index, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NormalMap;
    use crate::coords::Viewport;
    use crate::device::GpuCapabilities;
    use crate::fx::pipeline::{build_pipeline, PipelineConfig};
    use approx::assert_relative_eq;
    use image::{Rgba, RgbaImage};

    fn composer() -> Composer {
        let viewport = Viewport::new(640.0, 480.0, 1.0);
        let normal_map = NormalMap::from_image(RgbaImage::from_pixel(2, 2, Rgba([128, 128, 255, 255])));
        build_pipeline(
            &PipelineConfig::default(),
            viewport,
            GpuCapabilities { multisample: true },
            Some(&normal_map),
        )
        .unwrap()
    }

    // ── ranges ───────────────────────────────────────────────────────────

    #[test]
    fn apply_snaps_then_clamps() {
        let range = ParamRange::new(-1.0, 1.0, 0.01);
        assert_relative_eq!(range.apply(0.123), 0.12, epsilon = 1e-6);
        assert_relative_eq!(range.apply(0.126), 0.13, epsilon = 1e-6);
        assert_eq!(range.apply(4.0), 1.0);
        assert_eq!(range.apply(-4.0), -1.0);
        assert_eq!(range.apply(f32::NAN), -1.0);
    }

    #[test]
    fn zero_step_only_clamps() {
        let range = ParamRange::new(0.0, 1.0, 0.0);
        assert_eq!(range.apply(0.1234), 0.1234);
    }

    // ── registry layout ──────────────────────────────────────────────────

    #[test]
    fn toggles_precede_their_params_in_pipeline_order() {
        let registry = ParamRegistry::from_composer(&composer());
        let labels: Vec<_> = registry.bindings().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "dotScreenPass",
                "glitchPass",
                "rgbShiftPass",
                "unrealBloomPass",
                "UnrealBloomPassProperties/strength",
                "UnrealBloomPassProperties/radius",
                "UnrealBloomPassProperties/threshold",
                "Tint Color/x",
                "Tint Color/y",
                "Tint Color/z",
                "Hexagon Strength",
                "Lightness Strength",
            ]
        );
    }

    #[test]
    fn every_optional_pass_has_a_toggle() {
        let registry = ParamRegistry::from_composer(&composer());
        let toggled: Vec<_> = registry
            .bindings()
            .iter()
            .filter(|b| b.kind == BindingKind::Toggle)
            .map(|b| b.slot)
            .collect();
        assert_eq!(toggled, vec![PassSlot::DotScreen, PassSlot::Glitch, PassSlot::RgbShift, PassSlot::Bloom]);
    }

    #[test]
    fn numeric_bindings_carry_declared_ranges() {
        let registry = ParamRegistry::from_composer(&composer());
        let strength = registry.find("UnrealBloomPassProperties/strength").unwrap();
        assert_eq!(registry.bindings()[strength].range(), Some(ParamRange::new(0.0, 2.0, 0.001)));
        let hex = registry.find("Hexagon Strength").unwrap();
        assert_eq!(registry.bindings()[hex].range(), Some(ParamRange::new(-3.0, 3.0, 0.01)));
        let dot = registry.find("dotScreenPass").unwrap();
        assert_eq!(registry.bindings()[dot].range(), None);
    }

    // ── read / write ─────────────────────────────────────────────────────

    #[test]
    fn reads_reflect_pass_state() {
        let composer = composer();
        let registry = ParamRegistry::from_composer(&composer);
        let get = |label| registry.get(&composer, registry.find(label).unwrap()).unwrap();

        assert_eq!(get("dotScreenPass"), ParamValue::Bool(false));
        assert_eq!(get("rgbShiftPass"), ParamValue::Bool(true));
        assert_eq!(get("UnrealBloomPassProperties/threshold"), ParamValue::Number(0.6));
        assert_eq!(get("Tint Color/y"), ParamValue::Number(0.0));
    }

    #[test]
    fn set_writes_through_to_the_pass() {
        let mut composer = composer();
        let registry = ParamRegistry::from_composer(&composer);

        let bloom = registry.find("unrealBloomPass").unwrap();
        registry.set(&mut composer, bloom, ParamValue::Bool(true)).unwrap();
        assert!(composer.pass(PassSlot::Bloom).unwrap().enabled());

        let tint_z = registry.find("Tint Color/z").unwrap();
        let stored = registry.set(&mut composer, tint_z, ParamValue::Number(7.0)).unwrap();
        assert_eq!(stored, ParamValue::Number(1.0));
        let tint = composer.pass(PassSlot::Tint).unwrap().uniforms().vec3("tint").unwrap();
        assert_eq!(tint.z, 1.0);
        assert_eq!(tint.x, 0.0);
    }

    #[test]
    fn nudge_flips_toggles_and_steps_numbers() {
        let mut composer = composer();
        let registry = ParamRegistry::from_composer(&composer);

        let glitch = registry.find("glitchPass").unwrap();
        assert_eq!(registry.nudge(&mut composer, glitch, 1).unwrap(), ParamValue::Bool(true));
        assert_eq!(registry.nudge(&mut composer, glitch, 1).unwrap(), ParamValue::Bool(false));

        let hex = registry.find("Hexagon Strength").unwrap();
        let ParamValue::Number(v) = registry.nudge(&mut composer, hex, -3).unwrap() else {
            panic!("expected a number");
        };
        assert_relative_eq!(v, 0.07, epsilon = 1e-6);
    }

    #[test]
    fn kind_and_index_errors() {
        let mut composer = composer();
        let registry = ParamRegistry::from_composer(&composer);

        let dot = registry.find("dotScreenPass").unwrap();
        assert_eq!(
            registry.set(&mut composer, dot, ParamValue::Number(1.0)),
            Err(ParamError::KindMismatch { label: "dotScreenPass".into() })
        );
        assert_eq!(registry.get(&composer, 999), Err(ParamError::UnknownBinding(999)));
    }
}
