use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-material shader parameters.
///
/// Property names are defined by the shader and are not validated here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialProperties<T> {
    pub name: String,
    #[serde(default = "default_shader")]
    pub shader: String,
    #[serde(default = "default_render_queue")]
    pub render_queue: i32,
    #[serde(default)]
    pub float_properties: Map<String, Value>,
    #[serde(default)]
    pub vector_properties: Map<String, Value>,
    #[serde(default = "IndexMap::new")]
    pub texture_properties: IndexMap<String, T>,
    #[serde(default)]
    pub keyword_map: Map<String, Value>,
    #[serde(default)]
    pub tag_map: Map<String, Value>,
}

impl<T> MaterialProperties<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: default_shader(),
            render_queue: default_render_queue(),
            float_properties: Map::new(),
            vector_properties: Map::new(),
            texture_properties: IndexMap::new(),
            keyword_map: Map::new(),
            tag_map: Map::new(),
        }
    }
}

/// Materials without a VRM shader fall back to this.
fn default_shader() -> String {
    "VRM_USE_GLTFSHADER".to_owned()
}

fn default_render_queue() -> i32 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_order_is_preserved() {
        let material: MaterialProperties<u32> = serde_json::from_str(
            r#"{
                "name": "Skin",
                "shader": "VRM/MToon",
                "renderQueue": 2450,
                "floatProperties": {"_Cutoff": 0.5, "_BumpScale": 1.0, "_ShadeShift": -0.1},
                "textureProperties": {"_MainTex": 3, "_ShadeTexture": 1, "_BumpMap": 2},
                "keywordMap": {"_NORMALMAP": true},
                "tagMap": {"RenderType": "Opaque"}
            }"#,
        )
        .unwrap();

        let floats: Vec<_> = material.float_properties.keys().map(String::as_str).collect();
        assert_eq!(floats, ["_Cutoff", "_BumpScale", "_ShadeShift"]);
        let textures: Vec<_> = material.texture_properties.keys().map(String::as_str).collect();
        assert_eq!(textures, ["_MainTex", "_ShadeTexture", "_BumpMap"]);

        let out = serde_json::to_string(&material).unwrap();
        assert!(out.find("_MainTex").unwrap() < out.find("_BumpMap").unwrap());
        assert_eq!(material.render_queue, 2450);
    }
}
