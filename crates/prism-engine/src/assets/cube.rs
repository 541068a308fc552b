use std::path::Path;

use image::RgbaImage;

use super::images::load_rgba;
use super::AssetError;

/// Face order shared by file lists and GPU array layers: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// Six square, equally sized RGBA8 faces.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeMapData {
    faces: [RgbaImage; 6],
}

impl CubeMapData {
    /// Loads faces from `dir`, one file per entry of `files` in [`CUBE_FACES`] order.
    pub fn load(dir: impl AsRef<Path>, files: &[String; 6]) -> Result<Self, AssetError> {
        let dir = dir.as_ref();
        let [px, nx, py, ny, pz, nz] = files;
        let faces = [
            load_rgba(dir.join(px))?,
            load_rgba(dir.join(nx))?,
            load_rgba(dir.join(py))?,
            load_rgba(dir.join(ny))?,
            load_rgba(dir.join(pz))?,
            load_rgba(dir.join(nz))?,
        ];
        let cube = Self::from_faces(faces)?;
        log::info!("environment loaded from {} ({}px faces)", dir.display(), cube.face_size());
        Ok(cube)
    }

    pub fn from_faces(faces: [RgbaImage; 6]) -> Result<Self, AssetError> {
        let expected = faces[0].width();
        for (&face, image) in CUBE_FACES.iter().zip(faces.iter()) {
            let (width, height) = image.dimensions();
            if width != height {
                return Err(AssetError::NonSquareFace { face, width, height });
            }
            if width != expected {
                return Err(AssetError::FaceSizeMismatch { face, expected, got: width });
            }
        }
        Ok(Self { faces })
    }

    pub fn faces(&self) -> &[RgbaImage; 6] {
        &self.faces
    }

    pub fn face_size(&self) -> u32 {
        self.faces[0].width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(size: u32) -> RgbaImage {
        RgbaImage::new(size, size)
    }

    #[test]
    fn accepts_matching_square_faces() {
        let cube = CubeMapData::from_faces(std::array::from_fn(|_| face(4))).unwrap();
        assert_eq!(cube.face_size(), 4);
    }

    #[test]
    fn rejects_mismatched_face() {
        let mut faces: [RgbaImage; 6] = std::array::from_fn(|_| face(4));
        faces[3] = face(8);
        let err = CubeMapData::from_faces(faces).unwrap_err();
        assert!(matches!(err, AssetError::FaceSizeMismatch { face: "ny", expected: 4, got: 8 }));
    }

    #[test]
    fn rejects_non_square_face() {
        let mut faces: [RgbaImage; 6] = std::array::from_fn(|_| face(4));
        faces[0] = RgbaImage::new(4, 2);
        assert!(matches!(
            CubeMapData::from_faces(faces),
            Err(AssetError::NonSquareFace { face: "px", .. })
        ));
    }
}
