use std::path::PathBuf;

use thiserror::Error;

/// Failure to load an external asset.
///
/// Asset failures are never fatal to the frame loop; callers log them and
/// render without the asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read image '{path}'")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to import glTF '{path}'")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("'{path}' contains no triangle meshes")]
    NoMeshes { path: PathBuf },

    #[error("cube face {face} is {width}x{height}; faces must be square")]
    NonSquareFace { face: &'static str, width: u32, height: u32 },

    #[error("cube face {face} is {got}px wide, expected {expected}px")]
    FaceSizeMismatch { face: &'static str, expected: u32, got: u32 },

    #[error("loader for {label} exited without a result")]
    Disconnected { label: String },
}
