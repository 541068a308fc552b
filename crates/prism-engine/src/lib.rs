//! Prism engine crate.
//!
//! Platform runtime (window, GPU, input, timing), the scene model, asset
//! loading, and the post-processing core with its frame driver.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod scene;
pub mod assets;
pub mod fx;
pub mod driver;
