use std::fmt::Debug;

use tracing::warn;

use crate::error::{ReferenceKind, StructuralError, UnresolvedReference, VrmError};
use crate::extensions::VrmExtension;

/// Turns one kind of reference into another.
///
/// Implementations exist for both directions: handle to wire index on export,
/// wire index to handle on import.
pub trait Resolve<R: ?Sized> {
    type Output;

    /// Returns `None` when `reference` has no match.
    fn resolve(&mut self, reference: &R) -> Option<Self::Output>;

    /// Substituted for references that could not be resolved.
    fn fallback(&mut self) -> Option<Self::Output> {
        None
    }
}

/// Walks an extension document and rewrites every node, mesh and texture
/// reference through the matching resolver.
///
/// The same traversal serves import and export; only the resolvers differ.
/// Unresolvable references are recorded as warnings and replaced with the
/// resolver's fallback. Without a fallback the entry holding the reference is
/// left out, except for slots the schema cannot do without.
pub struct ReferenceMapper<RN, RM, RT> {
    node: RN,
    mesh: RM,
    texture: RT,
    warnings: Vec<UnresolvedReference>,
}

impl<RN, RM, RT> ReferenceMapper<RN, RM, RT> {
    pub fn new(node: RN, mesh: RM, texture: RT) -> Self {
        Self {
            node,
            mesh,
            texture,
            warnings: Vec::new(),
        }
    }

    /// Deep-copies `extension`, rewriting its references.
    ///
    /// The input is left untouched.
    pub fn convert<N, M, T>(
        &mut self,
        extension: &VrmExtension<N, M, T>,
    ) -> Result<VrmExtension<RN::Output, RM::Output, RT::Output>, VrmError>
    where
        N: Debug,
        M: Debug,
        T: Debug,
        RN: Resolve<N>,
        RM: Resolve<M>,
        RT: Resolve<T>,
    {
        self.map_extension(extension)
    }

    pub fn into_warnings(self) -> Vec<UnresolvedReference> {
        self.warnings
    }

    pub fn into_resolvers(self) -> (RN, RM, RT) {
        (self.node, self.mesh, self.texture)
    }

    pub(crate) fn node<N>(
        &mut self,
        node: &N,
        path: impl FnOnce() -> String,
    ) -> Option<RN::Output>
    where
        N: Debug,
        RN: Resolve<N>,
    {
        resolve_one(&mut self.node, &mut self.warnings, ReferenceKind::Node, node, path)
    }

    /// Like [`Self::node`], for slots that cannot be left out.
    pub(crate) fn required_node<N>(
        &mut self,
        node: &N,
        path: impl FnOnce() -> String,
    ) -> Result<RN::Output, VrmError>
    where
        N: Debug,
        RN: Resolve<N>,
    {
        let path = path();
        self.node(node, || path.clone()).ok_or_else(|| {
            StructuralError::NoFallback {
                kind: ReferenceKind::Node,
                path,
            }
            .into()
        })
    }

    pub(crate) fn mesh<M>(
        &mut self,
        mesh: &M,
        path: impl FnOnce() -> String,
    ) -> Option<RM::Output>
    where
        M: Debug,
        RM: Resolve<M>,
    {
        resolve_one(&mut self.mesh, &mut self.warnings, ReferenceKind::Mesh, mesh, path)
    }

    pub(crate) fn texture<T>(
        &mut self,
        texture: &T,
        path: impl FnOnce() -> String,
    ) -> Option<RT::Output>
    where
        T: Debug,
        RT: Resolve<T>,
    {
        resolve_one(&mut self.texture, &mut self.warnings, ReferenceKind::Texture, texture, path)
    }
}

fn resolve_one<R, X>(
    resolver: &mut R,
    warnings: &mut Vec<UnresolvedReference>,
    kind: ReferenceKind,
    reference: &X,
    path: impl FnOnce() -> String,
) -> Option<R::Output>
where
    R: Resolve<X>,
    X: Debug + ?Sized,
{
    if let Some(resolved) = resolver.resolve(reference) {
        return Some(resolved);
    }

    let fallback = resolver.fallback();
    let warning = UnresolvedReference {
        kind,
        path: path(),
        reference: format!("{:?}", reference),
        dropped: fallback.is_none(),
    };
    if warning.dropped {
        warn!("{}, leaving it out", warning);
    } else {
        warn!("{}, using fallback", warning);
    }
    warnings.push(warning);
    fallback
}
