use std::fmt;

use thiserror::Error;

use crate::extensions::HumanoidBone;

/// An error that aborts an import or export.
#[derive(Error, Debug)]
pub enum VrmError {
    #[error("failed to encode JSON chunk: {0}")]
    Encoding(#[source] serde_json::Error),
    #[error("invalid VRM document: {0}")]
    Structural(#[from] StructuralError),
    #[error("container of {0} bytes exceeds the 32-bit length field")]
    TooLarge(usize),
    #[error("invalid glTF container: {0}")]
    Container(#[from] gltf::Error),
    #[error("binary blob is missing")]
    MissingBlob,
    #[error("failed to decode base64 buffer data")]
    Base64Decode(#[from] base64::DecodeError),
    #[error("unsupported buffer format")]
    BufferFormatUnsupported,
    #[error("failed to read buffer: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene exporter failed: {0}")]
    Exporter(#[source] anyhow::Error),
    #[error("scene loader failed: {0}")]
    Loader(#[source] anyhow::Error),
}

/// The document is missing data the extension schema cannot do without.
#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("document root is not a JSON object")]
    NotAnObject,
    #[error("`{0}` has an unexpected type")]
    UnexpectedType(&'static str),
    #[error("document has no `{0}` extension")]
    MissingExtension(&'static str),
    #[error("malformed extension: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("humanoid bone {0:?} is mapped more than once")]
    DuplicateBone(HumanoidBone),
    #[error("{actual} material properties for {expected} exported materials")]
    MaterialCountMismatch { expected: usize, actual: usize },
    #[error("unresolved {kind} reference at {path} has no fallback")]
    NoFallback { kind: ReferenceKind, path: String },
}

/// Which collection a reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Node,
    Mesh,
    Texture,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Node => "node",
            ReferenceKind::Mesh => "mesh",
            ReferenceKind::Texture => "texture",
        })
    }
}

/// A single reference that could not be resolved.
///
/// This is a warning: the field is replaced by the fallback value, or left
/// out when there is none, and the conversion carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unresolved {kind} reference {reference} at {path}")]
pub struct UnresolvedReference {
    pub kind: ReferenceKind,
    pub path: String,
    pub reference: String,
    /// No fallback existed, so the entry holding the reference was omitted.
    pub dropped: bool,
}
