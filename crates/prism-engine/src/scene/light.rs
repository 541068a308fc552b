use glam::Vec3;
use serde::Deserialize;

/// Shadow parameters carried by a light. The forward renderer does not
/// rasterize shadow maps; these are kept so scenes round-trip their setup.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub map_size: u32,
    pub camera_far: f32,
    pub normal_bias: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self { map_size: 1024, camera_far: 15.0, normal_bias: 0.05 }
    }
}

/// Directional light shining from `position` toward the origin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub cast_shadow: bool,
    pub shadow: ShadowConfig,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 3.0,
            position: [0.25, 3.0, -2.25],
            cast_shadow: true,
            shadow: ShadowConfig::default(),
        }
    }
}

impl DirectionalLight {
    /// Unit vector from the lit surface toward the light.
    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.position).try_normalize().unwrap_or(Vec3::Y)
    }

    /// Color premultiplied by intensity.
    pub fn radiance(&self) -> Vec3 {
        Vec3::from_array(self.color) * self.intensity
    }
}
