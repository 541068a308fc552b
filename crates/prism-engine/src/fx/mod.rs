//! Post-processing core.
//!
//! A [`Composer`] runs a fixed sequence of [`Pass`]es over a pair of offscreen
//! targets chosen by [`select_target`]. [`build_pipeline`] assembles the
//! standard sequence and [`ParamRegistry`] exposes its tunables.

mod composer;
mod error;
mod params;
mod pass;
pub mod passes;
mod pipeline;
mod shader;
mod target;
mod uniform;

pub use composer::{Composer, Destination, PlanStep};
pub use error::PipelineError;
pub use params::{BindingKind, ParamBinding, ParamError, ParamRange, ParamRegistry, ParamSpec, ParamValue};
pub use pass::{Pass, PassCtx, PassIo, PassOutput, PassSlot, SceneView};
pub use pipeline::{build_pipeline, BloomConfig, GlitchConfig, PipelineConfig, RgbShiftConfig};
pub use shader::{FragmentShader, Sampler, ShaderPass};
pub use target::{antialias_pass_required, select_target, RenderTargetDesc, SamplingMode, TargetChain, TARGET_FORMAT};
pub use uniform::{UniformSet, UniformValue};
