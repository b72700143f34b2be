//! Scene loading.
//!
//! Two inputs are understood:
//! - Wavefront `.obj` meshes (via `tobj`), one `Mesh` per model
//! - JSON scene descriptions listing materials, objects and render
//!   settings, with OBJ paths resolved relative to the description file

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ember_math::{Transform, Vec3};
use serde::Deserialize;
use thiserror::Error;

use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::Scene;
use crate::settings::SceneSettings;

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("Scene description error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No geometry found in {0}")]
    NoGeometry(PathBuf),

    #[error("Unknown material: {0}")]
    UnknownMaterial(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

fn obj_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}

/// Load every model of an OBJ file as a separate mesh.
///
/// Materials referenced by the file are ignored; shading comes from the
/// scene. Meshes without normals get smooth ones.
pub fn load_obj<P: AsRef<Path>>(path: P) -> LoadResult<Vec<Mesh>> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(path, &obj_options())?;

    let meshes = convert_models(models);
    if meshes.is_empty() {
        return Err(LoadError::NoGeometry(path.to_path_buf()));
    }

    log::info!(
        "Loaded {} mesh(es), {} triangles from {}",
        meshes.len(),
        meshes.iter().map(Mesh::triangle_count).sum::<usize>(),
        path.display()
    );
    Ok(meshes)
}

/// Parse OBJ data from a reader. `mtllib` statements are ignored.
pub fn parse_obj<R: BufRead>(reader: &mut R) -> LoadResult<Vec<Mesh>> {
    let (models, _materials) =
        tobj::load_obj_buf(reader, &obj_options(), |_| Err(tobj::LoadError::OpenFileFailed))?;

    let meshes = convert_models(models);
    if meshes.is_empty() {
        return Err(LoadError::NoGeometry(PathBuf::from("<buffer>")));
    }
    Ok(meshes)
}

fn convert_models(models: Vec<tobj::Model>) -> Vec<Mesh> {
    models
        .into_iter()
        .filter_map(|model| {
            let data = model.mesh;
            if data.indices.is_empty() {
                log::debug!("Skipping empty OBJ model '{}'", model.name);
                return None;
            }

            let positions: Vec<Vec3> = data.positions.chunks_exact(3).map(Vec3::from_slice).collect();
            let normals = if data.normals.is_empty() {
                None
            } else {
                Some(data.normals.chunks_exact(3).map(Vec3::from_slice).collect())
            };

            let mut mesh = Mesh::new(positions, data.indices, normals);
            mesh.ensure_normals();
            Some(mesh)
        })
        .collect()
}

/// On-disk shape of a scene description.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SceneDescription {
    name: Option<String>,
    #[serde(flatten)]
    settings: SceneSettings,
    materials: Vec<Material>,
    objects: Vec<ObjectDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum GeometryDescription {
    Obj { path: PathBuf },
    Cube,
    Quad,
    Sphere { center: Vec3, radius: f32 },
}

#[derive(Debug, Deserialize)]
struct ObjectDescription {
    #[serde(default)]
    name: Option<String>,
    geometry: GeometryDescription,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    translate: Vec3,
    /// Euler degrees
    #[serde(default)]
    rotate: Vec3,
    #[serde(default = "unit_scale")]
    scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

/// Load a JSON scene description from disk.
///
/// The scene is named after the file unless the description names it.
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<(Scene, SceneSettings)> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let (mut scene, settings) = parse_scene(&json, base_dir)?;
    if scene.name.is_empty() {
        scene.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();
    }

    log::info!(
        "Loaded scene '{}': {} objects, {} materials, {} triangles",
        scene.name,
        scene.objects.len(),
        scene.materials.len(),
        scene.total_triangle_count()
    );
    Ok((scene, settings))
}

/// Build a scene from a JSON description. OBJ paths are relative to `base_dir`.
pub fn parse_scene(json: &str, base_dir: &Path) -> LoadResult<(Scene, SceneSettings)> {
    let description: SceneDescription = serde_json::from_str(json)?;
    let mut scene = Scene::new(description.name.unwrap_or_default());

    for material in description.materials {
        validate_material(&material)?;
        if scene.material_index(&material.name).is_some() {
            return Err(LoadError::InvalidScene(format!(
                "duplicate material '{}'",
                material.name
            )));
        }
        scene.add_material(material);
    }

    for (index, object) in description.objects.into_iter().enumerate() {
        let name = object.name.unwrap_or_else(|| format!("object{}", index));
        let material = match &object.material {
            Some(material) => scene
                .material_index(material)
                .ok_or_else(|| LoadError::UnknownMaterial(material.clone()))?,
            None => default_material(&mut scene),
        };
        let transform = Transform::from_translation(object.translate)
            .with_rotation(object.rotate)
            .with_scale(object.scale);

        match object.geometry {
            GeometryDescription::Obj { path } => {
                let meshes = load_obj(base_dir.join(&path))?;
                let single = meshes.len() == 1;
                for (part, mesh) in meshes.into_iter().enumerate() {
                    let part_name = if single {
                        name.clone()
                    } else {
                        format!("{}.{}", name, part)
                    };
                    scene.add_mesh(part_name, Arc::new(mesh), material, transform);
                }
            }
            GeometryDescription::Cube => {
                scene.add_mesh(name, Arc::new(Mesh::cube()), material, transform)
            }
            GeometryDescription::Quad => {
                scene.add_mesh(name, Arc::new(Mesh::quad()), material, transform)
            }
            GeometryDescription::Sphere { center, radius } => {
                if radius <= 0.0 {
                    return Err(LoadError::InvalidScene(format!(
                        "sphere '{}' has non-positive radius {}",
                        name, radius
                    )));
                }
                scene.add_sphere(name, center, radius, material);
                if let Some(last) = scene.objects.last_mut() {
                    last.transform = transform;
                }
            }
        }
    }

    if scene.objects.is_empty() {
        return Err(LoadError::InvalidScene("scene has no objects".to_string()));
    }

    Ok((scene, description.settings))
}

/// Index of the implicit grey material, added on first use.
fn default_material(scene: &mut Scene) -> usize {
    const NAME: &str = "default";
    match scene.material_index(NAME) {
        Some(index) => index,
        None => scene.add_material(Material {
            name: NAME.to_string(),
            ..Default::default()
        }),
    }
}

fn validate_material(material: &Material) -> LoadResult<()> {
    if material.name.is_empty() {
        return Err(LoadError::InvalidScene("material without a name".to_string()));
    }
    if material.eta <= 0.0 {
        return Err(LoadError::InvalidScene(format!(
            "material '{}' has non-positive eta {}",
            material.name, material.eta
        )));
    }
    if material.color.min_element() < 0.0 {
        return Err(LoadError::InvalidScene(format!(
            "material '{}' has a negative color component",
            material.name
        )));
    }
    Ok(())
}
