//! Viewport geometry shared by the runtime, the camera and the composer.
//!
//! Sizes are logical pixels; `pixel_density` maps them to render pixels.

mod viewport;

pub use viewport::{clamp_pixel_density, Viewport};
