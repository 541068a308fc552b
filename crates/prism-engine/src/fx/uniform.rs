//! Named shader parameters and their uniform-buffer layout.

use glam::{Vec2, Vec3};

use crate::render::TextureSource;

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    /// A sampled texture; `None` until a source is supplied.
    Texture(Option<TextureSource>),
}

impl UniformValue {
    /// Scalar component `index` of a numeric value.
    pub fn component(&self, index: usize) -> Option<f32> {
        match self {
            UniformValue::Float(v) if index == 0 => Some(*v),
            UniformValue::Vec2(v) if index < 2 => Some(v[index]),
            UniformValue::Vec3(v) if index < 3 => Some(v[index]),
            _ => None,
        }
    }

    fn set_component(&mut self, index: usize, value: f32) -> bool {
        match self {
            UniformValue::Float(v) if index == 0 => *v = value,
            UniformValue::Vec2(v) if index < 2 => v[index] = value,
            UniformValue::Vec3(v) if index < 3 => v[index] = value,
            _ => return false,
        }
        true
    }

    fn same_kind(&self, other: &UniformValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// (alignment, size) in a WGSL uniform struct; `None` for textures.
    fn layout(&self) -> Option<(usize, usize)> {
        match self {
            UniformValue::Float(_) => Some((4, 4)),
            UniformValue::Vec2(_) => Some((8, 8)),
            UniformValue::Vec3(_) => Some((16, 12)),
            UniformValue::Texture(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Uniform {
    name: &'static str,
    value: UniformValue,
}

/// Ordered set of named uniforms belonging to one pass.
///
/// Numeric uniforms are packed into one uniform buffer in declaration order,
/// matching a WGSL struct with the same fields. Textures bind after it, also
/// in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    uniforms: Vec<Uniform>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: UniformValue) -> Self {
        self.uniforms.push(Uniform { name, value });
        self
    }

    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.uniforms.iter().map(|u| u.name)
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.iter().find(|u| u.name == name).map(|u| &u.value)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<Vec2> {
        match self.get(name)? {
            UniformValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.get(name)? {
            UniformValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Replaces the value of an existing uniform of the same kind.
    ///
    /// Returns `false` (and changes nothing) for unknown names or kind mismatches.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        match self.uniforms.iter_mut().find(|u| u.name == name) {
            Some(u) if u.value.same_kind(&value) => {
                u.value = value;
                true
            }
            _ => false,
        }
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> bool {
        self.set(name, UniformValue::Float(value))
    }

    pub fn component(&self, name: &str, index: usize) -> Option<f32> {
        self.get(name)?.component(index)
    }

    pub fn set_component(&mut self, name: &str, index: usize, value: f32) -> bool {
        self.uniforms
            .iter_mut()
            .find(|u| u.name == name)
            .is_some_and(|u| u.value.set_component(index, value))
    }

    /// Texture uniforms in binding order.
    pub fn textures(&self) -> impl Iterator<Item = (&'static str, Option<&TextureSource>)> + '_ {
        self.uniforms.iter().filter_map(|u| match &u.value {
            UniformValue::Texture(t) => Some((u.name, t.as_ref())),
            _ => None,
        })
    }

    pub fn texture_count(&self) -> usize {
        self.textures().count()
    }

    /// Names of texture uniforms that have no source yet.
    pub fn missing(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.textures().filter(|(_, t)| t.is_none()).map(|(name, _)| name)
    }

    /// Numeric uniforms packed with WGSL uniform-buffer alignment.
    ///
    /// The result is padded to a multiple of 16 bytes and is never empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for u in &self.uniforms {
            let Some((align, _)) = u.value.layout() else {
                continue;
            };
            bytes.resize(bytes.len().next_multiple_of(align), 0);
            match &u.value {
                UniformValue::Float(v) => bytes.extend_from_slice(bytemuck::bytes_of(v)),
                UniformValue::Vec2(v) => bytes.extend_from_slice(bytemuck::bytes_of(v)),
                UniformValue::Vec3(v) => bytes.extend_from_slice(bytemuck::bytes_of(v)),
                UniformValue::Texture(_) => {}
            }
        }
        let padded = bytes.len().next_multiple_of(16).max(16);
        bytes.resize(padded, 0);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    // ── access ────────────────────────────────────────────────────────────

    #[test]
    fn set_rejects_kind_mismatch_and_unknown_names() {
        let mut set = UniformSet::new().with("amount", UniformValue::Float(0.5));
        assert!(!set.set("amount", UniformValue::Vec3(Vec3::ONE)));
        assert!(!set.set("missing", UniformValue::Float(1.0)));
        assert_eq!(set.float("amount"), Some(0.5));
        assert!(set.set_float("amount", 0.25));
        assert_eq!(set.float("amount"), Some(0.25));
    }

    #[test]
    fn components_address_vector_lanes() {
        let mut set = UniformSet::new().with("tint", UniformValue::Vec3(Vec3::ZERO));
        assert!(set.set_component("tint", 2, 0.75));
        assert_eq!(set.vec3("tint"), Some(Vec3::new(0.0, 0.0, 0.75)));
        assert!(!set.set_component("tint", 3, 1.0));
        assert_eq!(set.component("tint", 2), Some(0.75));
    }

    #[test]
    fn missing_lists_unset_textures() {
        let set = UniformSet::new()
            .with("normal_map", UniformValue::Texture(None))
            .with("strength", UniformValue::Float(1.0));
        assert_eq!(set.missing().collect::<Vec<_>>(), vec!["normal_map"]);
        assert_eq!(set.texture_count(), 1);
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn vec3_is_aligned_to_sixteen_bytes() {
        let set = UniformSet::new()
            .with("a", UniformValue::Float(1.0))
            .with("b", UniformValue::Vec3(Vec3::new(2.0, 3.0, 4.0)))
            .with("c", UniformValue::Float(5.0));
        let bytes = set.to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(floats(&bytes), vec![1.0, 0.0, 0.0, 0.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn vec2_is_aligned_to_eight_bytes() {
        let set = UniformSet::new()
            .with("a", UniformValue::Float(1.0))
            .with("b", UniformValue::Vec2(Vec2::new(2.0, 3.0)));
        assert_eq!(floats(&set.to_bytes()), vec![1.0, 0.0, 2.0, 3.0]);
    }

    #[test]
    fn textures_take_no_buffer_space() {
        let set = UniformSet::new().with("t", UniformValue::Texture(None));
        assert_eq!(set.to_bytes(), vec![0u8; 16]);
    }
}
