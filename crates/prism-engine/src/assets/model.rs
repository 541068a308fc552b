use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec4};
use image::RgbaImage;

use crate::render::TextureSource;
use crate::scene::{Geometry, Material, Mesh, Node, StandardMaterial};

use super::AssetError;

/// Meshes imported from a glTF file, flattened to world space.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub nodes: Vec<Node>,
}

impl ModelData {
    /// Prepends `root` to every node transform.
    pub fn place(mut self, root: Mat4) -> Self {
        for node in &mut self.nodes {
            node.transform = root * node.transform;
        }
        self
    }
}

/// Imports every triangle primitive of the default scene.
///
/// Materials become [`StandardMaterial`]s carrying base color, metallic and
/// roughness factors and the base color texture when it is 8-bit.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<ModelData, AssetError> {
    let path = path.as_ref();
    let (doc, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut textures = TextureCache { images: &images, converted: HashMap::new() };
    let mut nodes = Vec::new();

    let scene = doc.default_scene().or_else(|| doc.scenes().next());
    if let Some(scene) = scene {
        for root in scene.nodes() {
            visit(&root, Mat4::IDENTITY, &buffers, &mut textures, &mut nodes);
        }
    }

    if nodes.is_empty() {
        return Err(AssetError::NoMeshes { path: path.to_path_buf() });
    }

    log::info!("model loaded: {} ({} meshes)", path.display(), nodes.len());
    Ok(ModelData { nodes })
}

fn visit(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    textures: &mut TextureCache<'_>,
    out: &mut Vec<Node>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = mesh.name().or(node.name()).unwrap_or("mesh");
        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("skipping non-triangle primitive in '{name}'");
                continue;
            }

            let material = read_material(&prim.material(), textures);
            let Some(geometry) = read_geometry(&prim, buffers, material.1) else {
                continue;
            };

            out.push(
                Node::new(name, Mesh { geometry: Arc::new(geometry), material: material.0 })
                    .with_transform(world),
            );
        }
    }

    for child in node.children() {
        visit(&child, world, buffers, textures, out);
    }
}

fn read_geometry(
    prim: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    uv_set: u32,
) -> Option<Geometry> {
    let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
    let uvs = reader
        .read_tex_coords(uv_set)
        .map(|uv| uv.into_f32().collect())
        .unwrap_or_default();

    let indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None if positions.len() % 3 == 0 => (0..positions.len() as u32).collect(),
        None => return None,
    };

    let geometry = Geometry { positions, normals, uvs, indices };
    (!geometry.is_empty()).then_some(geometry)
}

fn read_material(material: &gltf::Material<'_>, textures: &mut TextureCache<'_>) -> (Material, u32) {
    let pbr = material.pbr_metallic_roughness();
    let (texture, uv_set) = match pbr.base_color_texture() {
        Some(info) => (textures.get(info.texture().source().index()), info.tex_coord()),
        None => (None, 0),
    };

    let standard = StandardMaterial {
        base_color: Vec4::from_array(pbr.base_color_factor()),
        base_color_texture: texture,
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        ..StandardMaterial::default()
    };
    (Material::Standard(standard), uv_set)
}

/// Converts each referenced glTF image once so meshes share one texture.
struct TextureCache<'a> {
    images: &'a [gltf::image::Data],
    converted: HashMap<usize, Option<TextureSource>>,
}

impl TextureCache<'_> {
    fn get(&mut self, index: usize) -> Option<TextureSource> {
        let images = self.images;
        self.converted
            .entry(index)
            .or_insert_with(|| images.get(index).and_then(to_rgba).map(TextureSource::new))
            .clone()
    }
}

fn to_rgba(data: &gltf::image::Data) -> Option<RgbaImage> {
    use gltf::image::Format;

    let pixels: Vec<u8> = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => {
            log::warn!("unsupported glTF texture format {other:?}; using untextured material");
            return None;
        }
    };
    RgbaImage::from_raw(data.width, data.height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn missing_file_is_an_import_error() {
        let err = load_gltf("missing/model.glb").unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }

    #[test]
    fn placement_applies_before_node_transform() {
        let mesh = Mesh { geometry: Arc::new(Geometry::quad(1.0)), material: Material::default() };
        let local = Mat4::from_translation(Vec3::X);
        let model = ModelData { nodes: vec![Node::new("a", mesh).with_transform(local)] }
            .place(Mat4::from_scale(Vec3::splat(2.0)));

        let p = model.nodes[0].transform.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn rgb_textures_gain_opaque_alpha() {
        let data = gltf::image::Data {
            pixels: vec![10, 20, 30],
            format: gltf::image::Format::R8G8B8,
            width: 1,
            height: 1,
        };
        let image = to_rgba(&data).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }
}
