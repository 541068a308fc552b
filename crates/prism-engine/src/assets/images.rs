use std::path::Path;

use image::RgbaImage;

use crate::render::TextureSource;

use super::AssetError;

/// Decodes any supported image file into RGBA8.
pub fn load_rgba(path: impl AsRef<Path>) -> Result<RgbaImage, AssetError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgba8())
}

/// Tangent-space normal map used by the futuristic pass.
///
/// Stored as raw RGBA8 (not color-space converted); channels decode to a
/// normal via `rgb * 2 - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMap {
    texture: TextureSource,
}

impl NormalMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let image = load_rgba(path)?;
        log::info!("normal map loaded: {} ({}x{})", path.display(), image.width(), image.height());
        Ok(Self::from_image(image))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { texture: TextureSource::new(image) }
    }

    pub fn texture(&self) -> &TextureSource {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let err = NormalMap::load("does/not/exist.png").unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
        assert!(err.to_string().contains("does/not/exist.png"));
    }

    #[test]
    fn from_image_keeps_pixels() {
        let map = NormalMap::from_image(RgbaImage::from_pixel(2, 2, image::Rgba([128, 128, 255, 255])));
        assert_eq!(map.texture().size(), (2, 2));
        assert_eq!(map.texture().image().get_pixel(1, 1).0, [128, 128, 255, 255]);
    }
}
