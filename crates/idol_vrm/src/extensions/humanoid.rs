use serde::{Deserialize, Serialize};

use crate::extensions::Vector3;

pub static REQUIRED_BONES: &'static [HumanoidBone] = &[
    HumanoidBone::Hips,
    HumanoidBone::Spine,
    HumanoidBone::Head,
    HumanoidBone::LeftUpperLeg,
    HumanoidBone::LeftLowerLeg,
    HumanoidBone::LeftFoot,
    HumanoidBone::RightUpperLeg,
    HumanoidBone::RightLowerLeg,
    HumanoidBone::RightFoot,
    HumanoidBone::LeftUpperArm,
    HumanoidBone::LeftLowerArm,
    HumanoidBone::LeftHand,
    HumanoidBone::RightUpperArm,
    HumanoidBone::RightLowerArm,
    HumanoidBone::RightHand,
];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HumanoidBone {
    Hips,
    LeftUpperLeg,
    RightUpperLeg,
    LeftLowerLeg,
    RightLowerLeg,
    LeftFoot,
    RightFoot,
    Spine,
    Chest,
    Neck,
    Head,
    LeftShoulder,
    RightShoulder,
    LeftUpperArm,
    RightUpperArm,
    LeftLowerArm,
    RightLowerArm,
    LeftHand,
    RightHand,
    LeftToes,
    RightToes,
    LeftEye,
    RightEye,
    Jaw,
    LeftThumbProximal,
    LeftThumbIntermediate,
    LeftThumbDistal,
    LeftIndexProximal,
    LeftIndexIntermediate,
    LeftIndexDistal,
    LeftMiddleProximal,
    LeftMiddleIntermediate,
    LeftMiddleDistal,
    LeftRingProximal,
    LeftRingIntermediate,
    LeftRingDistal,
    LeftLittleProximal,
    LeftLittleIntermediate,
    LeftLittleDistal,
    RightThumbProximal,
    RightThumbIntermediate,
    RightThumbDistal,
    RightIndexProximal,
    RightIndexIntermediate,
    RightIndexDistal,
    RightMiddleProximal,
    RightMiddleIntermediate,
    RightMiddleDistal,
    RightRingProximal,
    RightRingIntermediate,
    RightRingDistal,
    RightLittleProximal,
    RightLittleIntermediate,
    RightLittleDistal,
    UpperChest,
}

/// Maps one humanoid bone onto a scene node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanBone<N> {
    pub bone: HumanoidBone,
    pub node: N,
    #[serde(default = "default_true")]
    pub use_default_values: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Vector3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Vector3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Vector3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis_length: Option<f32>,
}

impl<N> HumanBone<N> {
    pub fn new(bone: HumanoidBone, node: N) -> Self {
        Self {
            bone,
            node,
            use_default_values: true,
            min: None,
            max: None,
            center: None,
            axis_length: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Humanoid<N> {
    #[serde(default = "Vec::new")]
    pub human_bones: Vec<HumanBone<N>>,
    #[serde(default = "default_stretch")]
    pub arm_stretch: f32,
    #[serde(default = "default_stretch")]
    pub leg_stretch: f32,
    #[serde(default = "default_twist")]
    pub upper_arm_twist: f32,
    #[serde(default = "default_twist")]
    pub lower_arm_twist: f32,
    #[serde(default = "default_twist")]
    pub upper_leg_twist: f32,
    #[serde(default = "default_twist")]
    pub lower_leg_twist: f32,
    #[serde(default)]
    pub feet_spacing: f32,
    #[serde(default, rename = "hasTranslationDoF")]
    pub has_translation_dof: bool,
}

impl<N> Default for Humanoid<N> {
    fn default() -> Self {
        Self {
            human_bones: Vec::new(),
            arm_stretch: default_stretch(),
            leg_stretch: default_stretch(),
            upper_arm_twist: default_twist(),
            lower_arm_twist: default_twist(),
            upper_leg_twist: default_twist(),
            lower_leg_twist: default_twist(),
            feet_spacing: 0.,
            has_translation_dof: false,
        }
    }
}

impl<N> Humanoid<N> {
    pub fn bone(&self, bone: HumanoidBone) -> Option<&HumanBone<N>> {
        self.human_bones.iter().find(|b| b.bone == bone)
    }

    pub fn missing_required_bones(&self) -> Vec<HumanoidBone> {
        REQUIRED_BONES
            .iter()
            .copied()
            .filter(|&bone| self.bone(bone).is_none())
            .collect()
    }
}

fn default_true() -> bool {
    true
}

fn default_stretch() -> f32 {
    0.05
}

fn default_twist() -> f32 {
    0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bone_names_are_camel_case() {
        let bone: HumanoidBone = serde_json::from_str(r#""leftThumbIntermediate""#).unwrap();
        assert_eq!(bone, HumanoidBone::LeftThumbIntermediate);
        assert_eq!(
            serde_json::to_string(&HumanoidBone::UpperChest).unwrap(),
            r#""upperChest""#
        );
    }

    #[test]
    fn humanoid_defaults_fill_missing_fields() {
        let humanoid: Humanoid<u32> = serde_json::from_str(
            r#"{"humanBones": [{"bone": "hips", "node": 3}], "hasTranslationDoF": true}"#,
        )
        .unwrap();

        assert_eq!(humanoid.arm_stretch, 0.05);
        assert_eq!(humanoid.lower_leg_twist, 0.5);
        assert!(humanoid.has_translation_dof);
        assert!(humanoid.human_bones[0].use_default_values);
        assert_eq!(humanoid.bone(HumanoidBone::Hips).unwrap().node, 3);
    }

    #[test]
    fn missing_required_bones_are_listed() {
        let mut humanoid = Humanoid::default();
        for &bone in REQUIRED_BONES.iter().skip(1) {
            humanoid.human_bones.push(HumanBone::new(bone, 0u32));
        }
        assert_eq!(humanoid.missing_required_bones(), vec![HumanoidBone::Hips]);
    }

    #[test]
    fn unset_limits_are_not_serialized() {
        let json = serde_json::to_value(HumanBone::new(HumanoidBone::Head, 7u32)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"bone": "head", "node": 7, "useDefaultValues": true})
        );
    }
}
