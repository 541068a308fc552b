//! Asset loading: glTF models, cube maps and normal maps.
//!
//! Loads run on background threads through [`Pending`]; a failed load is
//! reported as an [`AssetError`] and never stops the frame loop.

mod cube;
mod error;
mod images;
mod model;
mod pending;

pub use cube::{CubeMapData, CUBE_FACES};
pub use error::AssetError;
pub use images::{load_rgba, NormalMap};
pub use model::{load_gltf, ModelData};
pub use pending::Pending;
