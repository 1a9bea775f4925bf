use std::sync::Arc;

use serde_json::{json, Value};

use idol_vrm::extensions::{BlendShapePreset, HumanoidBone, SecondaryAnimation};
use idol_vrm::{
    export_vrm, import_vrm, parse_extension, Container, GltfScene, ReferenceKind, SceneObject,
    PLACEHOLDER_TEXTURE_INDEX,
};

fn object(index: u32, name: &str) -> SceneObject {
    SceneObject {
        index,
        name: Some(name.to_owned()),
    }
}

fn avatar_document() -> Value {
    json!({
        "asset": { "version": "2.0" },
        "extensionsUsed": ["VRM"],
        "scene": 0,
        "scenes": [{ "name": "Avatar", "nodes": [0] }],
        "nodes": [
            { "name": "Root", "children": [1, 4, 5] },
            { "name": "Hips", "children": [2] },
            { "name": "Spine", "children": [3] },
            { "name": "Head" },
            { "name": "Body", "mesh": 0 },
            { "name": "Face", "mesh": 1 },
        ],
        "meshes": [{ "name": "Body", "primitives": [] }, { "name": "Face", "primitives": [] }],
        "materials": [{ "name": "Skin" }],
        "textures": [{ "name": "Albedo", "source": 0 }],
        "buffers": [{ "byteLength": 4, "uri": "data:application/octet-stream;base64,AAECAw==" }],
        "bufferViews": [{ "buffer": 0, "byteLength": 4 }],
        "extensions": {
            "VRM": {
                "exporterVersion": "UniVRM-0.99",
                "meta": { "title": "Test", "version": "1", "texture": 0 },
                "humanoid": {
                    "humanBones": [
                        { "bone": "hips", "node": 1, "useDefaultValues": true },
                        { "bone": "spine", "node": 2, "useDefaultValues": true },
                        { "bone": "head", "node": 3, "useDefaultValues": false,
                          "min": { "x": -1.0, "y": 0.0, "z": 0.0 } },
                    ],
                    "armStretch": 0.1,
                    "hasTranslationDoF": false,
                },
                "firstPerson": {
                    "firstPersonBone": 3,
                    "firstPersonBoneOffset": { "x": 0.0, "y": 0.06, "z": 0.0 },
                    "meshAnnotations": [
                        { "mesh": 0, "firstPersonFlag": "Auto" },
                        { "mesh": 1, "firstPersonFlag": "ThirdPersonOnly" },
                    ],
                    "lookAtTypeName": "Bone",
                    "lookAtHorizontalInner": {
                        "curve": [0, 0, 0, 1, 1, 1, 1, 0],
                        "xRange": 90,
                        "yRange": 10,
                    },
                },
                "blendShapeMaster": {
                    "blendShapeGroups": [
                        {
                            "name": "Smile",
                            "presetName": "joy",
                            "binds": [{ "mesh": 1, "index": 5, "weight": 100 }],
                            "materialValues": [],
                        },
                        {
                            "name": "Smirk",
                            "presetName": "smirk",
                            "binds": [{ "mesh": 7, "index": 0, "weight": 50 }],
                            "materialValues": [],
                        },
                    ],
                },
                "materialProperties": [{
                    "name": "Skin",
                    "shader": "VRM/MToon",
                    "renderQueue": 2000,
                    "floatProperties": { "_Cutoff": 0.5, "_BumpScale": 1.0 },
                    "vectorProperties": { "_Color": [1, 1, 1, 1] },
                    "textureProperties": { "_MainTex": 0 },
                    "keywordMap": {},
                    "tagMap": { "RenderType": "Opaque" },
                }],
                "secondaryAnimation": {
                    "boneGroups": [{ "bones": [2], "stiffiness": 1.0 }],
                    "colliderGroups": [],
                },
            },
        },
    })
}

fn scene_of(document: Value) -> Arc<GltfScene> {
    let container = Container {
        document,
        bin: None,
    };
    Arc::new(GltfScene::from_container(container, None).unwrap())
}

fn avatar_scene() -> Arc<GltfScene> {
    scene_of(avatar_document())
}

#[tokio::test]
async fn import_resolves_every_reference() {
    let scene = avatar_scene();
    let imported = import_vrm(scene.document(), scene.clone()).await.unwrap();
    let extension = &imported.extension;

    assert_eq!(imported.scene, object(0, "Avatar"));
    assert_eq!(
        extension.humanoid.bone(HumanoidBone::Head).unwrap().node,
        object(3, "Head")
    );
    assert_eq!(extension.humanoid.arm_stretch, 0.1);
    assert_eq!(extension.first_person.first_person_bone, object(3, "Head"));

    let groups = &extension.blend_shape_master.blend_shape_groups;
    assert_eq!(groups[0].binds[0].mesh, object(1, "Face"));
    assert_eq!(groups[0].binds[0].weight, 100.);
    assert_eq!(groups[1].preset_name, BlendShapePreset::Unknown);

    // Mesh 7 does not exist, so it falls back to mesh 0.
    assert_eq!(groups[1].binds[0].mesh, object(0, "Body"));
    assert_eq!(imported.warnings.len(), 1);
    assert_eq!(imported.warnings[0].kind, ReferenceKind::Mesh);
    assert_eq!(
        imported.warnings[0].path,
        "blendShapeMaster.blendShapeGroups[1].binds[0].mesh"
    );

    assert_eq!(
        extension.material_properties[0].texture_properties["_MainTex"],
        object(0, "Albedo")
    );
    assert_eq!(extension.secondary_animation.bone_groups.len(), 1);
}

#[tokio::test]
async fn export_frames_extension_and_buffers() {
    let scene = avatar_scene();
    let imported = import_vrm(scene.document(), scene.clone()).await.unwrap();
    let exported = export_vrm(scene.as_ref(), &imported.scene, &imported.extension).unwrap();
    assert!(exported.warnings.is_empty());

    let bytes = &exported.bytes;
    assert_eq!(&bytes[0..4], b"glTF");
    assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize, bytes.len());

    let container = Container::from_slice(bytes).unwrap();
    let document = &container.document;
    assert_eq!(document["extensionsUsed"], json!(["VRM"]));
    assert_eq!(document["buffers"], json!([{ "byteLength": 4 }]));
    assert_eq!(&container.bin.as_ref().unwrap()[..], &[0, 1, 2, 3]);

    let wire = parse_extension(document).unwrap();
    let nodes: Vec<_> = wire.humanoid.human_bones.iter().map(|b| b.node).collect();
    assert_eq!(nodes, [1, 2, 3]);
    assert_eq!(wire.first_person.first_person_bone, 3);

    let binds: Vec<_> = wire
        .blend_shape_master
        .blend_shape_groups
        .iter()
        .map(|g| (g.binds[0].mesh, g.binds[0].index, g.binds[0].weight))
        .collect();
    assert_eq!(binds, [(1, 5, 100.), (0, 0, 50.)]);

    let annotations: Vec<_> = wire.first_person.mesh_annotations.iter().map(|a| a.mesh).collect();
    assert_eq!(annotations, [0, 1]);

    assert_eq!(
        wire.material_properties[0].texture_properties["_MainTex"],
        PLACEHOLDER_TEXTURE_INDEX
    );
    assert_eq!(wire.secondary_animation, SecondaryAnimation::default());
    assert_eq!(wire.meta["texture"], 0);
    assert_eq!(wire.exporter_version.as_deref(), Some("UniVRM-0.99"));

    let raw = &document["extensions"]["VRM"];
    assert_eq!(raw["blendShapeMaster"]["blendShapeGroups"][1]["presetName"], "unknown");
    let float_keys: Vec<_> = raw["materialProperties"][0]["floatProperties"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(float_keys, ["_Cutoff", "_BumpScale"]);
}

#[tokio::test]
async fn reimport_matches_except_secondary_animation() {
    let scene = avatar_scene();
    let mut first = import_vrm(scene.document(), scene.clone()).await.unwrap();
    let exported = export_vrm(scene.as_ref(), &first.scene, &first.extension).unwrap();

    let reloaded = Arc::new(GltfScene::from_slice(&exported.bytes, None).unwrap());
    let second = import_vrm(reloaded.document(), reloaded.clone()).await.unwrap();
    assert!(second.warnings.is_empty());

    first.extension.secondary_animation = SecondaryAnimation::default();
    assert_eq!(second.extension, first.extension);
    assert_eq!(second.scene, first.scene);
}

#[tokio::test]
async fn document_without_extension_fails() {
    let mut document = avatar_document();
    document.as_object_mut().unwrap().remove("extensions");
    let scene = Arc::new(GltfScene::new(document, Vec::new()).unwrap());

    let result = import_vrm(scene.document(), scene.clone()).await;
    assert!(matches!(
        result,
        Err(idol_vrm::VrmError::Structural(idol_vrm::StructuralError::MissingExtension(_)))
    ));
}

#[tokio::test]
async fn texture_reference_without_textures_is_left_out() {
    let mut document = avatar_document();
    document.as_object_mut().unwrap().remove("textures");
    document["extensions"]["VRM"]["materialProperties"][0]["textureProperties"] =
        json!({ "_MainTex": 3 });
    let scene = scene_of(document);

    let imported = import_vrm(scene.document(), scene.clone()).await.unwrap();
    let material = &imported.extension.material_properties[0];
    assert!(material.texture_properties.is_empty());
    assert_eq!(material.shader, "VRM/MToon");

    let dropped: Vec<_> = imported.warnings.iter().filter(|w| w.dropped).collect();
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].kind, ReferenceKind::Texture);
    assert_eq!(dropped[0].path, "materialProperties[0].textureProperties._MainTex");

    // Everything else still came through.
    assert_eq!(
        imported.extension.blend_shape_master.blend_shape_groups[0].binds[0].mesh,
        object(1, "Face")
    );
}

#[tokio::test]
async fn mesh_references_survive_nodes_out_of_mesh_order() {
    let mut document = avatar_document();
    document["nodes"][4] = json!({ "name": "FaceNode", "mesh": 1 });
    document["nodes"][5] = json!({ "name": "BodyNode", "mesh": 0 });
    let scene = scene_of(document);

    let first = import_vrm(scene.document(), scene.clone()).await.unwrap();
    let exported = export_vrm(scene.as_ref(), &first.scene, &first.extension).unwrap();
    let reloaded = Arc::new(GltfScene::from_slice(&exported.bytes, None).unwrap());
    let second = import_vrm(reloaded.document(), reloaded.clone()).await.unwrap();

    let bind = |extension: &idol_vrm::VrmExtension<SceneObject, SceneObject, SceneObject>| {
        extension.blend_shape_master.blend_shape_groups[0].binds[0].mesh.clone()
    };
    assert_eq!(bind(&first.extension), object(1, "Face"));
    assert_eq!(bind(&second.extension), object(1, "Face"));

    let annotations: Vec<_> = second
        .extension
        .first_person
        .mesh_annotations
        .iter()
        .map(|annotation| annotation.mesh.index)
        .collect();
    assert_eq!(annotations, [0, 1]);
}
