//! Scene data model: meshes with typed materials, lights, camera and orbit controls.
//!
//! The scene is plain data. GPU resources for it are owned by the scene render
//! pass, which re-uploads whenever [`Scene::revision`] changes.

mod camera;
mod controls;
mod geometry;
mod light;
mod material;
mod node;

use std::sync::Arc;

pub use camera::{CameraConfig, PerspectiveCamera};
pub use controls::OrbitControls;
pub use geometry::{Geometry, Vertex};
pub use light::{DirectionalLight, ShadowConfig};
pub use material::{BasicMaterial, Material, MaterialKind, StandardMaterial};
pub use node::{Mesh, Node, Placement};

use crate::assets::CubeMapData;

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    lights: Vec<DirectionalLight>,
    environment: Option<Arc<CubeMapData>>,
    revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremented on every structural change (nodes, environment).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add(&mut self, node: Node) {
        self.nodes.push(node);
        self.revision += 1;
    }

    pub fn extend(&mut self, nodes: impl IntoIterator<Item = Node>) {
        self.nodes.extend(nodes);
        self.revision += 1;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn add_light(&mut self, light: DirectionalLight) {
        self.lights.push(light);
    }

    pub fn lights(&self) -> &[DirectionalLight] {
        &self.lights
    }

    /// The cube map used for both the background and reflections.
    pub fn environment(&self) -> Option<&Arc<CubeMapData>> {
        self.environment.as_ref()
    }

    pub fn set_environment(&mut self, environment: Option<Arc<CubeMapData>>) {
        self.environment = environment;
        self.revision += 1;
    }

    /// Nodes whose material is of `kind`.
    pub fn nodes_of_kind(&self, kind: MaterialKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.mesh.material.kind() == kind)
    }

    /// Sets environment-reflection intensity on every standard material and
    /// marks those nodes as shadow casters and receivers.
    ///
    /// Other material kinds are left untouched. Returns the number of materials updated.
    pub fn update_all_materials(&mut self, env_map_intensity: f32) -> usize {
        let mut updated = 0;
        for node in &mut self.nodes {
            if let Some(material) = node.mesh.material.as_standard_mut() {
                material.env_map_intensity = env_map_intensity;
                node.cast_shadow = true;
                node.receive_shadow = true;
                updated += 1;
            }
        }
        if updated > 0 {
            self.revision += 1;
        }
        updated
    }
}
