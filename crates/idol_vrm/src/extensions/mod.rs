use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use blend_shape::{BlendShapeBind, BlendShapeGroup, BlendShapeMaster, BlendShapePreset};
pub use first_person::{DegreeMap, FirstPerson, MeshAnnotation};
pub use humanoid::{HumanBone, Humanoid, HumanoidBone, REQUIRED_BONES};
pub use material::MaterialProperties;

pub mod blend_shape;
pub mod first_person;
pub mod humanoid;
pub mod material;

/// Key of the extension in the glTF `extensions` object.
pub const EXTENSION_NAME: &str = "VRM";

/// The `VRM` root extension.
///
/// `N`, `M` and `T` are the node, mesh and texture reference types. On the
/// wire they are indices into the document's arrays (see [`WireExtension`]);
/// in memory they are whatever handles the host scene uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VrmExtension<N, M, T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exporter_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    pub blend_shape_master: BlendShapeMaster<M>,
    pub humanoid: Humanoid<N>,
    pub first_person: FirstPerson<N, M>,
    pub material_properties: Vec<MaterialProperties<T>>,
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub secondary_animation: SecondaryAnimation,
}

/// The extension as stored in the document.
pub type WireExtension = VrmExtension<u32, u32, u32>;

/// Spring bone configuration, carried without interpretation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryAnimation {
    #[serde(default)]
    pub bone_groups: Vec<Value>,
    #[serde(default)]
    pub collider_groups: Vec<Value>,
}

impl SecondaryAnimation {
    pub fn is_empty(&self) -> bool {
        self.bone_groups.is_empty() && self.collider_groups.is_empty()
    }
}

/// VRM 0.x vectors are `{x, y, z}` objects rather than arrays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vector3> for Vec3 {
    fn from(value: Vector3) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}
