use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing::{info, warn};

use idol_vrm::{export_vrm, import_vrm, GltfScene, ImportedVrm, SceneObject};

#[derive(Parser)]
#[command(about = "Inspect and repack VRM avatars")]
struct Options {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log a summary of an avatar's VRM extension.
    Inspect { input: PathBuf },
    /// Import an avatar and write it back out as a binary VRM.
    Convert { input: PathBuf, output: PathBuf },
}

type Avatar = ImportedVrm<SceneObject, SceneObject, SceneObject, SceneObject>;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let options = Options::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match options.command {
        Command::Inspect { input } => {
            let (_, avatar) = runtime.block_on(load(&input))?;
            summarize(&avatar);
        }
        Command::Convert { input, output } => {
            let (scene, avatar) = runtime.block_on(load(&input))?;
            let exported = export_vrm(scene.as_ref(), &avatar.scene, &avatar.extension)
                .with_context(|| format!("failed to export {}", input.display()))?;
            std::fs::write(&output, &exported.bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            info!(
                "wrote {} ({} bytes, {} unresolved references)",
                output.display(),
                exported.bytes.len(),
                exported.warnings.len()
            );
        }
    }
    Ok(())
}

async fn load(path: &Path) -> anyhow::Result<(Arc<GltfScene>, Avatar)> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let scene = Arc::new(GltfScene::from_slice(&bytes, path.parent())?);
    let avatar = import_vrm(scene.document(), scene.clone())
        .await
        .with_context(|| format!("failed to import {}", path.display()))?;
    Ok((scene, avatar))
}

fn describe(object: &SceneObject) -> String {
    match &object.name {
        Some(name) => format!("{} (#{})", name, object.index),
        None => format!("#{}", object.index),
    }
}

fn summarize(avatar: &Avatar) {
    let extension = &avatar.extension;
    info!("scene {}", describe(&avatar.scene));

    for group in &extension.blend_shape_master.blend_shape_groups {
        info!(
            "blend shape {:?} [{}]: {} binds",
            group.name,
            group.preset_name.as_str(),
            group.binds.len()
        );
    }

    info!("{} humanoid bones", extension.humanoid.human_bones.len());
    let missing = extension.humanoid.missing_required_bones();
    if !missing.is_empty() {
        warn!("missing required bones: {:?}", missing);
    }

    let first_person = &extension.first_person;
    let offset = Vec3::from(first_person.first_person_bone_offset);
    info!(
        "first person bone {} offset {}, {} mesh annotations",
        describe(&first_person.first_person_bone),
        offset,
        first_person.mesh_annotations.len()
    );

    for material in &extension.material_properties {
        info!(
            "material {:?}: {} ({} textures)",
            material.name,
            material.shader,
            material.texture_properties.len()
        );
    }

    if !avatar.warnings.is_empty() {
        warn!("{} references could not be resolved", avatar.warnings.len());
    }
}
