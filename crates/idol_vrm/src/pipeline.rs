use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::codec::{
    self, referenced_indices, Conversion, ExportContext, ImportContext, ReferencedIndices,
};
use crate::container::write_container;
use crate::error::{ReferenceKind, StructuralError, UnresolvedReference, VrmError};
use crate::extensions::{VrmExtension, WireExtension, EXTENSION_NAME};

pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A skinned mesh instance as listed by the scene exporter.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedSkin<M> {
    pub meshes: Vec<M>,
}

/// The output of the scene exporter, before the extension is attached.
#[derive(Clone, Debug)]
pub struct ExportedScene<N, M> {
    pub document: Value,
    pub buffers: Vec<Bytes>,
    pub node_indices: HashMap<N, u32>,
    pub skins: Vec<ExportedSkin<M>>,
}

/// Writes a host scene graph out as glTF JSON plus raw buffers.
pub trait SceneExporter {
    type Root: ?Sized;
    type Node: Eq + Hash + Debug;
    type Mesh: PartialEq + Debug;
    type Texture: Debug;

    fn export(&self, root: &Self::Root) -> anyhow::Result<ExportedScene<Self::Node, Self::Mesh>>;
}

/// Resolves document indices to live host objects.
///
/// Lookups may be issued concurrently and should be memoized by the loader.
pub trait SceneLoader: Send + Sync + 'static {
    type Node: Clone + Send + 'static;
    type Mesh: Clone + Send + 'static;
    type Texture: Clone + Send + 'static;
    type Scene;

    fn get_node(&self, index: u32) -> BoxedFuture<'_, anyhow::Result<Self::Node>>;
    fn get_mesh(&self, index: u32) -> BoxedFuture<'_, anyhow::Result<Self::Mesh>>;
    fn get_texture(&self, index: u32) -> BoxedFuture<'_, anyhow::Result<Self::Texture>>;
    fn default_scene(&self) -> BoxedFuture<'_, anyhow::Result<Self::Scene>>;
}

#[derive(Clone, Debug)]
pub struct ExportedVrm {
    pub bytes: Bytes,
    pub warnings: Vec<UnresolvedReference>,
}

pub struct ImportedVrm<N, M, T, S> {
    pub extension: VrmExtension<N, M, T>,
    pub scene: S,
    pub warnings: Vec<UnresolvedReference>,
}

/// Exports `root` with `extension` attached, framed as a binary container.
pub fn export_vrm<E: SceneExporter>(
    exporter: &E,
    root: &E::Root,
    extension: &VrmExtension<E::Node, E::Mesh, E::Texture>,
) -> Result<ExportedVrm, VrmError> {
    let ExportedScene {
        mut document,
        buffers,
        node_indices,
        skins,
    } = exporter.export(root).map_err(VrmError::Exporter)?;

    let material_count = document
        .get("materials")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let context = ExportContext {
        node_indices: &node_indices,
        skins: &skins,
        material_count,
    };
    let Conversion { document: wire, warnings } = codec::to_wire(extension, &context)?;

    attach_extension(&mut document, &wire)?;
    let bytes = write_container(&document, &buffers)?;
    debug!(
        "exported VRM: {} bytes, {} buffers, {} unresolved references",
        bytes.len(),
        buffers.len(),
        warnings.len()
    );

    Ok(ExportedVrm { bytes, warnings })
}

/// Stores `wire` under `extensions.VRM` and declares it in `extensionsUsed`.
///
/// Calling this again replaces the extension without duplicating the
/// declaration.
pub fn attach_extension(document: &mut Value, wire: &WireExtension) -> Result<(), VrmError> {
    let value = serde_json::to_value(wire).map_err(VrmError::Encoding)?;
    let root = document.as_object_mut().ok_or(StructuralError::NotAnObject)?;

    root.entry("extensions")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or(StructuralError::UnexpectedType("extensions"))?
        .insert(EXTENSION_NAME.to_owned(), value);

    let used = root
        .entry("extensionsUsed")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or(StructuralError::UnexpectedType("extensionsUsed"))?;
    if !used.iter().any(|name| name.as_str() == Some(EXTENSION_NAME)) {
        used.push(Value::from(EXTENSION_NAME));
    }
    Ok(())
}

/// Reads the wire extension out of a glTF document.
pub fn parse_extension(document: &Value) -> Result<WireExtension, VrmError> {
    let value = document
        .get("extensions")
        .and_then(|extensions| extensions.get(EXTENSION_NAME))
        .ok_or(StructuralError::MissingExtension(EXTENSION_NAME))?;
    Ok(WireExtension::deserialize(value).map_err(StructuralError::Malformed)?)
}

/// Imports the extension of an already parsed document.
///
/// Every referenced node, mesh and texture is requested from `loader`
/// concurrently; conversion starts once all of them have completed.
/// Must be called from within a tokio runtime.
pub async fn import_vrm<L: SceneLoader>(
    document: &Value,
    loader: Arc<L>,
) -> Result<ImportedVrm<L::Node, L::Mesh, L::Texture, L::Scene>, VrmError> {
    let wire = parse_extension(document)?;
    let indices = referenced_indices(&wire)?;
    debug!(
        "resolving {} nodes, {} meshes, {} textures",
        indices.nodes.len(),
        indices.meshes.len(),
        indices.textures.len()
    );

    let context = resolve_all(&loader, &indices).await?;
    let Conversion { document: extension, warnings } = codec::from_wire(&wire, &context)?;
    let scene = loader.default_scene().await.map_err(VrmError::Loader)?;

    Ok(ImportedVrm {
        extension,
        scene,
        warnings,
    })
}

enum Loaded<L: SceneLoader> {
    Node(L::Node),
    Mesh(L::Mesh),
    Texture(L::Texture),
}

async fn resolve_all<L: SceneLoader>(
    loader: &Arc<L>,
    indices: &ReferencedIndices,
) -> Result<ImportContext<L::Node, L::Mesh, L::Texture>, VrmError> {
    let mut tasks = JoinSet::new();
    for &index in &indices.nodes {
        let loader = loader.clone();
        tasks.spawn(async move {
            let result = loader.get_node(index).await.map(Loaded::<L>::Node);
            (ReferenceKind::Node, index, result)
        });
    }
    for &index in &indices.meshes {
        let loader = loader.clone();
        tasks.spawn(async move {
            let result = loader.get_mesh(index).await.map(Loaded::<L>::Mesh);
            (ReferenceKind::Mesh, index, result)
        });
    }
    for &index in &indices.textures {
        let loader = loader.clone();
        tasks.spawn(async move {
            let result = loader.get_texture(index).await.map(Loaded::<L>::Texture);
            (ReferenceKind::Texture, index, result)
        });
    }

    let mut context = ImportContext::default();
    while let Some(joined) = tasks.join_next().await {
        let (kind, index, result) = joined.map_err(|err| VrmError::Loader(err.into()))?;
        match result {
            Ok(Loaded::Node(node)) => {
                context.nodes.insert(index, node);
            }
            Ok(Loaded::Mesh(mesh)) => {
                context.meshes.insert(index, mesh);
            }
            Ok(Loaded::Texture(texture)) => {
                context.textures.insert(index, texture);
            }
            // Left out of the context; the reference falls back during conversion.
            Err(err) => warn!("failed to load {} {}: {:#}", kind, index, err),
        }
    }
    Ok(context)
}
