use glam::Vec4;

use crate::render::TextureSource;

/// Discriminant used to select materials without downcasting.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MaterialKind {
    /// Lit, physically based material that reflects the environment.
    Standard,
    /// Unlit flat color.
    Basic,
}

/// Metallic-roughness material lit by directional lights and the environment map.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub base_color: Vec4,
    pub base_color_texture: Option<TextureSource>,
    pub metallic: f32,
    pub roughness: f32,
    /// Scale applied to environment reflections.
    pub env_map_intensity: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            base_color_texture: None,
            metallic: 0.0,
            roughness: 1.0,
            env_map_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterial {
    pub color: Vec4,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self { color: Vec4::ONE }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Standard(StandardMaterial),
    Basic(BasicMaterial),
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard(StandardMaterial::default())
    }
}

impl Material {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Material::Standard(_) => MaterialKind::Standard,
            Material::Basic(_) => MaterialKind::Basic,
        }
    }

    pub fn as_standard(&self) -> Option<&StandardMaterial> {
        match self {
            Material::Standard(m) => Some(m),
            Material::Basic(_) => None,
        }
    }

    pub fn as_standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            Material::Standard(m) => Some(m),
            Material::Basic(_) => None,
        }
    }

    /// Base color factor regardless of kind.
    pub fn color(&self) -> Vec4 {
        match self {
            Material::Standard(m) => m.base_color,
            Material::Basic(m) => m.color,
        }
    }

    pub fn texture(&self) -> Option<&TextureSource> {
        match self {
            Material::Standard(m) => m.base_color_texture.as_ref(),
            Material::Basic(_) => None,
        }
    }
}
