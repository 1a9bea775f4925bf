//! A scene backed directly by a glTF document.
//!
//! Handles are [`SceneObject`]s naming an entry of the document's arrays.
//! This lets the pipelines run against files without a host engine.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::anyhow;
use bytes::Bytes;
use gltf::json;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use crate::container::Container;
use crate::error::{ReferenceKind, StructuralError, VrmError};
use crate::pipeline::{BoxedFuture, ExportedScene, ExportedSkin, SceneExporter, SceneLoader};

mod buffers;

/// An entry of one of the document's `nodes`, `meshes`, `textures` or
/// `scenes` arrays.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SceneObject {
    pub index: u32,
    pub name: Option<String>,
}

pub struct GltfScene {
    /// Kept verbatim so export writes back every extension and extra.
    document: Value,
    root: json::Root,
    buffers: Vec<Bytes>,
    loaded: Mutex<HashMap<(ReferenceKind, u32), SceneObject>>,
}

/// Parses the typed glTF model. Indices are not validated, so partial
/// documents still load.
fn parse_root(document: &Value) -> Result<json::Root, VrmError> {
    Ok(json::Root::deserialize(document).map_err(StructuralError::Malformed)?)
}

impl GltfScene {
    pub fn new(document: Value, buffers: Vec<Bytes>) -> Result<Self, VrmError> {
        let root = parse_root(&document)?;
        Ok(Self::from_parts(document, root, buffers))
    }

    /// `base` is the directory external buffer URIs are relative to.
    pub fn from_container(container: Container, base: Option<&Path>) -> Result<Self, VrmError> {
        let root = parse_root(&container.document)?;
        let buffers = buffers::load_buffers(&root, container.bin.as_ref(), base)?;
        Ok(Self::from_parts(container.document, root, buffers))
    }

    pub fn from_slice(src: &[u8], base: Option<&Path>) -> Result<Self, VrmError> {
        Self::from_container(Container::from_slice(src)?, base)
    }

    fn from_parts(document: Value, root: json::Root, buffers: Vec<Bytes>) -> Self {
        Self {
            document,
            root,
            buffers,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    fn object(&self, kind: ReferenceKind, index: u32) -> Option<SceneObject> {
        let i = index as usize;
        let name = match kind {
            ReferenceKind::Node => self.root.nodes.get(i)?.name.clone(),
            ReferenceKind::Mesh => self.root.meshes.get(i)?.name.clone(),
            ReferenceKind::Texture => self.root.textures.get(i)?.name.clone(),
        };
        Some(SceneObject { index, name })
    }

    fn load(&self, kind: ReferenceKind, index: u32) -> anyhow::Result<SceneObject> {
        if let Some(object) = self.loaded.lock().get(&(kind, index)) {
            return Ok(object.clone());
        }

        let object = self
            .object(kind, index)
            .ok_or_else(|| anyhow!("{} {} is out of range", kind, index))?;
        self.loaded.lock().insert((kind, index), object.clone());
        Ok(object)
    }

    fn root_scene(&self) -> SceneObject {
        let index = self.root.scene.map_or(0, |scene| scene.value());
        let name = self.root.scenes.get(index).and_then(|scene| scene.name.clone());
        SceneObject {
            // `json::Index` holds a u32.
            index: index as u32,
            name,
        }
    }

    /// Root nodes of `scene`, or every parentless node if the document
    /// declares no such scene.
    fn scene_roots(&self, scene: usize) -> Vec<usize> {
        if let Some(scene) = self.root.scenes.get(scene) {
            return scene.nodes.iter().map(json::Index::value).collect();
        }

        let children: BTreeSet<usize> = self.root.nodes.iter().flat_map(children).collect();
        (0..self.root.nodes.len())
            .filter(|node| !children.contains(node))
            .collect()
    }

    fn reachable_nodes(&self, scene: usize) -> BTreeSet<usize> {
        let mut reachable = BTreeSet::new();
        let mut pending = self.scene_roots(scene);
        while let Some(index) = pending.pop() {
            let Some(node) = self.root.nodes.get(index) else {
                continue;
            };
            if reachable.insert(index) {
                pending.extend(children(node));
            }
        }
        reachable
    }
}

fn children(node: &json::Node) -> impl Iterator<Item = usize> + '_ {
    node.children.iter().flatten().map(json::Index::value)
}

impl SceneExporter for GltfScene {
    type Root = SceneObject;
    type Node = SceneObject;
    type Mesh = SceneObject;
    type Texture = SceneObject;

    fn export(
        &self,
        root: &SceneObject,
    ) -> anyhow::Result<ExportedScene<SceneObject, SceneObject>> {
        let mut document = self.document.clone();
        let buffers = buffers::merge_buffers(&mut document, &self.root, &self.buffers)?;

        let mut node_indices = HashMap::new();
        for index in self.reachable_nodes(root.index as usize) {
            let Ok(index) = u32::try_from(index) else {
                continue;
            };
            if let Some(node) = self.object(ReferenceKind::Node, index) {
                node_indices.insert(node, index);
            }
        }

        // The document's meshes are written back unchanged, so each mesh is
        // listed as the skinned instance at its own index. Mesh references
        // resolved through skins then keep their original indices.
        let skins = (0..self.root.meshes.len())
            .filter_map(|mesh| u32::try_from(mesh).ok())
            .filter_map(|mesh| self.object(ReferenceKind::Mesh, mesh))
            .map(|mesh| ExportedSkin { meshes: vec![mesh] })
            .collect();

        Ok(ExportedScene {
            document,
            buffers,
            node_indices,
            skins,
        })
    }
}

impl SceneLoader for GltfScene {
    type Node = SceneObject;
    type Mesh = SceneObject;
    type Texture = SceneObject;
    type Scene = SceneObject;

    fn get_node(&self, index: u32) -> BoxedFuture<'_, anyhow::Result<SceneObject>> {
        Box::pin(async move { self.load(ReferenceKind::Node, index) })
    }

    fn get_mesh(&self, index: u32) -> BoxedFuture<'_, anyhow::Result<SceneObject>> {
        Box::pin(async move { self.load(ReferenceKind::Mesh, index) })
    }

    fn get_texture(&self, index: u32) -> BoxedFuture<'_, anyhow::Result<SceneObject>> {
        Box::pin(async move { self.load(ReferenceKind::Texture, index) })
    }

    fn default_scene(&self) -> BoxedFuture<'_, anyhow::Result<SceneObject>> {
        Box::pin(async move { Ok(self.root_scene()) })
    }
}
