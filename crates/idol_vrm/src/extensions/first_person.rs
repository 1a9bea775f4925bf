use serde::{Deserialize, Serialize};

use crate::extensions::Vector3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstPerson<N, M> {
    pub first_person_bone: N,
    #[serde(default)]
    pub first_person_bone_offset: Vector3,
    #[serde(default = "Vec::new")]
    pub mesh_annotations: Vec<MeshAnnotation<M>>,
    #[serde(default = "default_look_at_type")]
    pub look_at_type_name: String,
    #[serde(default)]
    pub look_at_horizontal_inner: DegreeMap,
    #[serde(default)]
    pub look_at_horizontal_outer: DegreeMap,
    #[serde(default)]
    pub look_at_vertical_down: DegreeMap,
    #[serde(default)]
    pub look_at_vertical_up: DegreeMap,
}

impl<N, M> FirstPerson<N, M> {
    pub fn new(first_person_bone: N) -> Self {
        Self {
            first_person_bone,
            first_person_bone_offset: Vector3::default(),
            mesh_annotations: Vec::new(),
            look_at_type_name: default_look_at_type(),
            look_at_horizontal_inner: DegreeMap::default(),
            look_at_horizontal_outer: DegreeMap::default(),
            look_at_vertical_down: DegreeMap::default(),
            look_at_vertical_up: DegreeMap::default(),
        }
    }
}

/// Controls whether a mesh renders in first person, third person, or both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshAnnotation<M> {
    pub mesh: M,
    pub first_person_flag: String,
}

/// Look-at limit: `x_range` is the input angle in degrees, `y_range` the
/// output range.
///
/// A bare number is read as a limit mapping that angle onto itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DegreeMapRepr")]
pub struct DegreeMap {
    #[serde(default)]
    pub curve: Vec<f32>,
    #[serde(default = "default_range")]
    pub x_range: f32,
    #[serde(default = "default_range")]
    pub y_range: f32,
}

impl Default for DegreeMap {
    fn default() -> Self {
        Self {
            curve: Vec::new(),
            x_range: default_range(),
            y_range: default_range(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DegreeMapRepr {
    Limit(f32),
    #[serde(rename_all = "camelCase")]
    Map {
        #[serde(default)]
        curve: Vec<f32>,
        #[serde(default = "default_range")]
        x_range: f32,
        #[serde(default = "default_range")]
        y_range: f32,
    },
}

impl From<DegreeMapRepr> for DegreeMap {
    fn from(repr: DegreeMapRepr) -> Self {
        match repr {
            DegreeMapRepr::Limit(degrees) => Self {
                curve: Vec::new(),
                x_range: degrees,
                y_range: degrees,
            },
            DegreeMapRepr::Map {
                curve,
                x_range,
                y_range,
            } => Self {
                curve,
                x_range,
                y_range,
            },
        }
    }
}

fn default_look_at_type() -> String {
    "Bone".to_owned()
}

fn default_range() -> f32 {
    90.
}
