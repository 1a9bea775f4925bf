use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{StructuralError, UnresolvedReference, VrmError};
use crate::extensions::{
    BlendShapeBind, BlendShapeGroup, BlendShapeMaster, FirstPerson, HumanBone, Humanoid,
    MaterialProperties, MeshAnnotation, SecondaryAnimation, VrmExtension, WireExtension,
};
use crate::mapper::{ReferenceMapper, Resolve};
use crate::pipeline::ExportedSkin;

/// Index written for references that could not be resolved.
pub const FALLBACK_INDEX: u32 = 0;

/// Every texture reference is exported as this index.
///
/// Texture export is incomplete: the host exporter does not yet report which
/// index each texture was written to.
pub const PLACEHOLDER_TEXTURE_INDEX: u32 = 0;

/// A converted document and the references that had to fall back.
#[derive(Clone, Debug)]
pub struct Conversion<D> {
    pub document: D,
    pub warnings: Vec<UnresolvedReference>,
}

/// What the scene exporter reported about the document being written.
pub struct ExportContext<'a, N, M> {
    pub node_indices: &'a HashMap<N, u32>,
    pub skins: &'a [ExportedSkin<M>],
    pub material_count: usize,
}

/// Objects the scene loader resolved for the indices used by the extension.
pub struct ImportContext<N, M, T> {
    pub nodes: HashMap<u32, N>,
    pub meshes: HashMap<u32, M>,
    pub textures: HashMap<u32, T>,
}

impl<N, M, T> Default for ImportContext<N, M, T> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
        }
    }
}

/// Converts an in-memory extension into its wire form.
///
/// Secondary animation is always written empty.
pub fn to_wire<N, M, T>(
    extension: &VrmExtension<N, M, T>,
    context: &ExportContext<'_, N, M>,
) -> Result<Conversion<WireExtension>, VrmError>
where
    N: Eq + Hash + Debug,
    M: PartialEq + Debug,
    T: Debug,
{
    if extension.material_properties.len() != context.material_count {
        return Err(StructuralError::MaterialCountMismatch {
            expected: context.material_count,
            actual: extension.material_properties.len(),
        }
        .into());
    }

    let mut mapper = ReferenceMapper::new(
        NodeIndexResolver(context.node_indices),
        SkinMeshResolver(context.skins),
        PlaceholderTextureResolver,
    );
    let mut document = mapper.convert(extension)?;

    if !document.secondary_animation.is_empty() {
        debug!("secondary animation is not exported, writing it empty");
    }
    document.secondary_animation = SecondaryAnimation::default();

    Ok(Conversion {
        document,
        warnings: mapper.into_warnings(),
    })
}

/// Converts a wire extension into handles resolved by the scene loader.
pub fn from_wire<N, M, T>(
    wire: &WireExtension,
    context: &ImportContext<N, M, T>,
) -> Result<Conversion<VrmExtension<N, M, T>>, VrmError>
where
    N: Clone,
    M: Clone,
    T: Clone,
{
    let mut mapper = ReferenceMapper::new(
        LoadedResolver(&context.nodes),
        LoadedResolver(&context.meshes),
        LoadedResolver(&context.textures),
    );
    let document = mapper.convert(wire)?;
    Ok(Conversion {
        document,
        warnings: mapper.into_warnings(),
    })
}

/// Indices referenced by a wire extension, per collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferencedIndices {
    pub nodes: BTreeSet<u32>,
    pub meshes: BTreeSet<u32>,
    pub textures: BTreeSet<u32>,
}

/// Collects every index referenced by `wire`.
///
/// The fallback index is included for each collection that is referenced at
/// all, so dangling indices can be substituted on import.
pub fn referenced_indices(wire: &WireExtension) -> Result<ReferencedIndices, VrmError> {
    let mut mapper = ReferenceMapper::new(
        IndexCollector::default(),
        IndexCollector::default(),
        IndexCollector::default(),
    );
    mapper.convert(wire)?;
    let (nodes, meshes, textures) = mapper.into_resolvers();
    Ok(ReferencedIndices {
        nodes: nodes.finish(),
        meshes: meshes.finish(),
        textures: textures.finish(),
    })
}

struct NodeIndexResolver<'a, N>(&'a HashMap<N, u32>);

impl<'a, N: Eq + Hash> Resolve<N> for NodeIndexResolver<'a, N> {
    type Output = u32;

    fn resolve(&mut self, node: &N) -> Option<u32> {
        self.0.get(node).copied()
    }

    fn fallback(&mut self) -> Option<u32> {
        Some(FALLBACK_INDEX)
    }
}

/// Resolves a mesh to the index of the first skin whose first mesh is that
/// mesh, not to the mesh's own index.
///
/// This mirrors how existing VRM 0.x exporters fill in mesh references. It
/// only agrees with the mesh index when skins are listed in mesh order. Keep
/// it until there is evidence of which index readers actually expect.
struct SkinMeshResolver<'a, M>(&'a [ExportedSkin<M>]);

impl<'a, M: PartialEq> Resolve<M> for SkinMeshResolver<'a, M> {
    type Output = u32;

    fn resolve(&mut self, mesh: &M) -> Option<u32> {
        self.0
            .iter()
            .position(|skin| skin.meshes.first() == Some(mesh))
            .and_then(|index| u32::try_from(index).ok())
    }

    fn fallback(&mut self) -> Option<u32> {
        Some(FALLBACK_INDEX)
    }
}

struct PlaceholderTextureResolver;

impl<T: ?Sized> Resolve<T> for PlaceholderTextureResolver {
    type Output = u32;

    fn resolve(&mut self, _texture: &T) -> Option<u32> {
        Some(PLACEHOLDER_TEXTURE_INDEX)
    }
}

struct LoadedResolver<'a, O>(&'a HashMap<u32, O>);

impl<'a, O: Clone> Resolve<u32> for LoadedResolver<'a, O> {
    type Output = O;

    fn resolve(&mut self, index: &u32) -> Option<O> {
        self.0.get(index).cloned()
    }

    fn fallback(&mut self) -> Option<O> {
        self.0.get(&FALLBACK_INDEX).cloned()
    }
}

#[derive(Default)]
struct IndexCollector(BTreeSet<u32>);

impl IndexCollector {
    fn finish(mut self) -> BTreeSet<u32> {
        if !self.0.is_empty() {
            self.0.insert(FALLBACK_INDEX);
        }
        self.0
    }
}

impl Resolve<u32> for IndexCollector {
    type Output = u32;

    fn resolve(&mut self, index: &u32) -> Option<u32> {
        self.0.insert(*index);
        Some(*index)
    }
}

impl<RN, RM, RT> ReferenceMapper<RN, RM, RT> {
    pub(crate) fn map_extension<N, M, T>(
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
        let material_properties = extension
            .material_properties
            .iter()
            .enumerate()
            .map(|(index, material)| self.map_material(index, material))
            .collect();

        Ok(VrmExtension {
            exporter_version: extension.exporter_version.clone(),
            spec_version: extension.spec_version.clone(),
            blend_shape_master: self.map_blend_shape_master(&extension.blend_shape_master),
            humanoid: self.map_humanoid(&extension.humanoid)?,
            first_person: self.map_first_person(&extension.first_person)?,
            material_properties,
            meta: extension.meta.clone(),
            secondary_animation: extension.secondary_animation.clone(),
        })
    }

    fn map_blend_shape_master<M>(
        &mut self,
        master: &BlendShapeMaster<M>,
    ) -> BlendShapeMaster<RM::Output>
    where
        M: Debug,
        RM: Resolve<M>,
    {
        let mut blend_shape_groups = Vec::with_capacity(master.blend_shape_groups.len());
        for (g, group) in master.blend_shape_groups.iter().enumerate() {
            let mut binds = Vec::with_capacity(group.binds.len());
            for (b, bind) in group.binds.iter().enumerate() {
                let Some(mesh) = self.mesh(&bind.mesh, || {
                    format!("blendShapeMaster.blendShapeGroups[{g}].binds[{b}].mesh")
                }) else {
                    continue;
                };
                binds.push(BlendShapeBind {
                    mesh,
                    index: bind.index,
                    weight: bind.weight,
                });
            }

            blend_shape_groups.push(BlendShapeGroup {
                name: group.name.clone(),
                preset_name: group.preset_name,
                binds,
                material_values: group.material_values.clone(),
                is_binary: group.is_binary,
            });
        }
        BlendShapeMaster { blend_shape_groups }
    }

    fn map_humanoid<N>(&mut self, humanoid: &Humanoid<N>) -> Result<Humanoid<RN::Output>, VrmError>
    where
        N: Debug,
        RN: Resolve<N>,
    {
        let mut seen = HashSet::new();
        let mut human_bones = Vec::with_capacity(humanoid.human_bones.len());
        for (i, bone) in humanoid.human_bones.iter().enumerate() {
            if !seen.insert(bone.bone) {
                return Err(StructuralError::DuplicateBone(bone.bone).into());
            }

            let Some(node) = self.node(&bone.node, || format!("humanoid.humanBones[{i}].node"))
            else {
                continue;
            };
            human_bones.push(HumanBone {
                bone: bone.bone,
                node,
                use_default_values: bone.use_default_values,
                min: bone.min,
                max: bone.max,
                center: bone.center,
                axis_length: bone.axis_length,
            });
        }

        Ok(Humanoid {
            human_bones,
            arm_stretch: humanoid.arm_stretch,
            leg_stretch: humanoid.leg_stretch,
            upper_arm_twist: humanoid.upper_arm_twist,
            lower_arm_twist: humanoid.lower_arm_twist,
            upper_leg_twist: humanoid.upper_leg_twist,
            lower_leg_twist: humanoid.lower_leg_twist,
            feet_spacing: humanoid.feet_spacing,
            has_translation_dof: humanoid.has_translation_dof,
        })
    }

    fn map_first_person<N, M>(
        &mut self,
        first_person: &FirstPerson<N, M>,
    ) -> Result<FirstPerson<RN::Output, RM::Output>, VrmError>
    where
        N: Debug,
        M: Debug,
        RN: Resolve<N>,
        RM: Resolve<M>,
    {
        let first_person_bone = self.required_node(&first_person.first_person_bone, || {
            "firstPerson.firstPersonBone".to_owned()
        })?;

        let mut mesh_annotations = Vec::with_capacity(first_person.mesh_annotations.len());
        for (i, annotation) in first_person.mesh_annotations.iter().enumerate() {
            let Some(mesh) = self.mesh(&annotation.mesh, || {
                format!("firstPerson.meshAnnotations[{i}].mesh")
            }) else {
                continue;
            };
            mesh_annotations.push(MeshAnnotation {
                mesh,
                first_person_flag: annotation.first_person_flag.clone(),
            });
        }

        Ok(FirstPerson {
            first_person_bone,
            first_person_bone_offset: first_person.first_person_bone_offset,
            mesh_annotations,
            look_at_type_name: first_person.look_at_type_name.clone(),
            look_at_horizontal_inner: first_person.look_at_horizontal_inner.clone(),
            look_at_horizontal_outer: first_person.look_at_horizontal_outer.clone(),
            look_at_vertical_down: first_person.look_at_vertical_down.clone(),
            look_at_vertical_up: first_person.look_at_vertical_up.clone(),
        })
    }

    fn map_material<T>(
        &mut self,
        index: usize,
        material: &MaterialProperties<T>,
    ) -> MaterialProperties<RT::Output>
    where
        T: Debug,
        RT: Resolve<T>,
    {
        let mut texture_properties = IndexMap::with_capacity(material.texture_properties.len());
        for (property, texture) in &material.texture_properties {
            let Some(texture) = self.texture(texture, || {
                format!("materialProperties[{index}].textureProperties.{property}")
            }) else {
                continue;
            };
            texture_properties.insert(property.clone(), texture);
        }

        MaterialProperties {
            name: material.name.clone(),
            shader: material.shader.clone(),
            render_queue: material.render_queue,
            float_properties: material.float_properties.clone(),
            vector_properties: material.vector_properties.clone(),
            texture_properties,
            keyword_map: material.keyword_map.clone(),
            tag_map: material.tag_map.clone(),
        }
    }
}
