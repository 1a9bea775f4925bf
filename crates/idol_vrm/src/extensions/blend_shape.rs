use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendShapeMaster<M> {
    /// Groups in display order.
    #[serde(default = "Vec::new")]
    pub blend_shape_groups: Vec<BlendShapeGroup<M>>,
}

impl<M> Default for BlendShapeMaster<M> {
    fn default() -> Self {
        Self {
            blend_shape_groups: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendShapeGroup<M> {
    pub name: String,
    #[serde(default)]
    pub preset_name: BlendShapePreset,
    #[serde(default = "Vec::new")]
    pub binds: Vec<BlendShapeBind<M>>,
    #[serde(default)]
    pub material_values: Vec<Value>,
    #[serde(default)]
    pub is_binary: bool,
}

/// One morph target of a mesh driven by a group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendShapeBind<M> {
    pub mesh: M,
    pub index: u32,
    /// Passed through unscaled.
    pub weight: f32,
}

/// Known VRM 0.x expression presets.
///
/// Any other name parses as [`BlendShapePreset::Unknown`], and several
/// groups may share it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum BlendShapePreset {
    #[default]
    Unknown,
    Neutral,
    A,
    I,
    U,
    E,
    O,
    Blink,
    Joy,
    Angry,
    Sorrow,
    Fun,
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
    BlinkL,
    BlinkR,
}

impl BlendShapePreset {
    pub const ALL: [BlendShapePreset; 18] = [
        BlendShapePreset::Unknown,
        BlendShapePreset::Neutral,
        BlendShapePreset::A,
        BlendShapePreset::I,
        BlendShapePreset::U,
        BlendShapePreset::E,
        BlendShapePreset::O,
        BlendShapePreset::Blink,
        BlendShapePreset::Joy,
        BlendShapePreset::Angry,
        BlendShapePreset::Sorrow,
        BlendShapePreset::Fun,
        BlendShapePreset::LookUp,
        BlendShapePreset::LookDown,
        BlendShapePreset::LookLeft,
        BlendShapePreset::LookRight,
        BlendShapePreset::BlinkL,
        BlendShapePreset::BlinkR,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlendShapePreset::Unknown => "unknown",
            BlendShapePreset::Neutral => "neutral",
            BlendShapePreset::A => "a",
            BlendShapePreset::I => "i",
            BlendShapePreset::U => "u",
            BlendShapePreset::E => "e",
            BlendShapePreset::O => "o",
            BlendShapePreset::Blink => "blink",
            BlendShapePreset::Joy => "joy",
            BlendShapePreset::Angry => "angry",
            BlendShapePreset::Sorrow => "sorrow",
            BlendShapePreset::Fun => "fun",
            BlendShapePreset::LookUp => "lookup",
            BlendShapePreset::LookDown => "lookdown",
            BlendShapePreset::LookLeft => "lookleft",
            BlendShapePreset::LookRight => "lookright",
            BlendShapePreset::BlinkL => "blink_l",
            BlendShapePreset::BlinkR => "blink_r",
        }
    }

    /// Looks up a preset by its wire name, falling back to `Unknown`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == name)
            .unwrap_or(BlendShapePreset::Unknown)
    }
}

impl From<String> for BlendShapePreset {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl From<&str> for BlendShapePreset {
    fn from(value: &str) -> Self {
        Self::from_name(value)
    }
}

impl From<BlendShapePreset> for &'static str {
    fn from(value: BlendShapePreset) -> Self {
        value.as_str()
    }
}
