//! GPU rendering primitives shared by the scene renderer and post-processing passes.
//!
//! Conventions:
//! - full-screen passes draw one triangle with no vertex buffers
//! - pass coordinates are y-up in [0, 1]; `to_tex` converts them for sampling
//! - CPU images are RGBA8 and shared through [`TextureSource`]

mod ctx;
mod texture;
pub mod util;

pub use ctx::{FrameTarget, RenderCtx};
pub use texture::{create_color_target, upload_cube, upload_rgba, TextureSource};
