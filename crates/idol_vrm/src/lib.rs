//! Reading and writing VRM 0.x avatars as binary glTF.
//!
//! The `VRM` extension refers to nodes, meshes and textures. In a document
//! those are indices; in memory they are host handles. [`ReferenceMapper`]
//! converts between the two, and [`export_vrm`]/[`import_vrm`] drive the
//! host's scene exporter and loader around it.

pub use codec::{
    from_wire, referenced_indices, to_wire, Conversion, ExportContext, ImportContext,
    ReferencedIndices, FALLBACK_INDEX, PLACEHOLDER_TEXTURE_INDEX,
};
pub use container::{write_container, Container};
pub use error::{ReferenceKind, StructuralError, UnresolvedReference, VrmError};
pub use extensions::{VrmExtension, WireExtension, EXTENSION_NAME};
pub use mapper::{ReferenceMapper, Resolve};
pub use pipeline::{
    attach_extension, export_vrm, import_vrm, parse_extension, BoxedFuture, ExportedScene,
    ExportedSkin, ExportedVrm, ImportedVrm, SceneExporter, SceneLoader,
};
pub use scene::{GltfScene, SceneObject};

pub mod codec;
pub mod container;
pub mod error;
pub mod extensions;
pub mod mapper;
pub mod padded;
pub mod pipeline;
pub mod scene;
