use std::path::Path;

use cgmath::{Deg, Rad, Vector3, Zero};
use wgpu::Device;

use super::object::{Mesh, Object};
use crate::{
    config::DemoConfig,
    effect::VertexEffect,
    error::{Result, SwayError},
    gfx::{
        camera::{CameraController, CameraManager, OrbitCamera},
        geometry::{generate_plane, generate_slab, GeometryData},
        resources::material::{Material, ObjectBindings},
    },
};

/// Name of the swaying model in the demo scene
pub const MODEL_NAME: &str = "model";
/// Name of the wall plane that receives the model's shadow
pub const WALL_NAME: &str = "wall";

/// Main scene containing objects and the camera
pub struct Scene {
    pub camera_manager: CameraManager,
    pub objects: Vec<Object>,
}

impl Scene {
    /// Creates a new empty scene with the given camera manager
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            objects: Vec::new(),
        }
    }

    /// Builds the demo scene: a swaying model in front of a wall plane.
    ///
    /// Without a configured model path a flat slab stands in for the model.
    /// A shape symmetric about Y would map onto itself under the sway. No GPU resources are created here.
    pub fn from_config(config: &DemoConfig, aspect: f32) -> Result<Self> {
        let camera = OrbitCamera::looking_at(
            Vector3::from(config.camera.position),
            Vector3::from(config.camera.target),
            aspect,
        )
        .with_projection(
            Deg(config.camera.fov_degrees),
            config.camera.near,
            config.camera.far,
        );
        let controller = CameraController::from_config(&config.camera);
        let mut scene = Self::new(CameraManager::new(camera, controller));

        let model = &config.model;
        let model_material = Material::new(
            MODEL_NAME,
            model.base_color,
            model.metallic,
            model.roughness,
        );
        let object = match &model.path {
            Some(path) => scene.add_obj(path, model_material)?,
            None => scene.add_geometry(
                MODEL_NAME,
                &generate_slab(1.2, 3.0, 0.3, 48),
                model_material,
            ),
        };
        object.name = MODEL_NAME.to_string();
        object.effect = Some(VertexEffect::Sway);
        object.set_transform_trs(Vector3::zero(), Rad(model.rotation_y), model.scale);

        let ground = &config.ground;
        let wall = scene.add_geometry(
            WALL_NAME,
            &generate_plane(
                ground.width,
                ground.height,
                ground.width_segments,
                ground.height_segments,
            ),
            Material::new(WALL_NAME, ground.base_color, 0.0, ground.roughness),
        );
        wall.set_transform_trs(Vector3::from(ground.position), Rad(ground.rotation_y), 1.0);

        log::info!(
            "scene ready: {} objects, {} triangles",
            scene.objects.len(),
            scene.statistics().total_triangles
        );
        Ok(scene)
    }

    /// Updates the scene (camera damping and matrices)
    pub fn update(&mut self) {
        self.camera_manager.update();
    }

    /// Loads an OBJ file as a single object
    ///
    /// Faces are triangulated and normals are computed when the file has
    /// none. MTL materials are ignored in favour of `material`.
    pub fn add_obj(&mut self, path: &Path, material: Material) -> Result<&mut Object> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| SwayError::ModelLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let meshes: Vec<Mesh> = models
            .into_iter()
            .filter(|m| !m.mesh.indices.is_empty())
            .map(|m| {
                let mesh = m.mesh;
                // Use normals from OBJ if available, otherwise calculate them
                let normals = if mesh.normals.len() == mesh.positions.len() {
                    mesh.normals
                } else {
                    log::debug!("'{}' has no normals", m.name);
                    Mesh::calculate_smooth_normals(&mesh.positions, &mesh.indices)
                };
                Mesh::new(mesh.positions, normals, mesh.indices)
            })
            .collect();

        if meshes.is_empty() {
            return Err(SwayError::EmptyModel(path.to_path_buf()));
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "obj".to_string());
        log::info!("loaded '{}' ({} meshes)", path.display(), meshes.len());

        Ok(self.push(Object::new(&name, meshes).with_material(material)))
    }

    /// Adds procedurally generated geometry as a new object
    pub fn add_geometry(
        &mut self,
        name: &str,
        geometry: &GeometryData,
        material: Material,
    ) -> &mut Object {
        let (vertices, indices) = geometry.to_scene_format();
        let mesh = Mesh::from_vertices(vertices, indices);
        self.push(Object::new(name, vec![mesh]).with_material(material))
    }

    fn push(&mut self, object: Object) -> &mut Object {
        let index = self.objects.len();
        self.objects.push(object);
        &mut self.objects[index]
    }

    /// Gets an object by name
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|obj| obj.name == name)
    }

    /// Initializes GPU resources for all objects
    ///
    /// Must be called after the GPU context is available and before rendering.
    pub fn init_gpu_resources(&mut self, device: &Device, bindings: &ObjectBindings) {
        for object in self.objects.iter_mut() {
            object.init_gpu_resources(device, bindings);
        }
    }

    /// Syncs object transforms and materials to the GPU
    pub fn update_gpu_resources(&mut self, queue: &wgpu::Queue) {
        for object in self.objects.iter_mut().filter(|obj| obj.visible) {
            object.update_gpu_resources(queue);
        }
    }

    /// Gets statistics about the scene
    pub fn statistics(&self) -> SceneStatistics {
        SceneStatistics {
            object_count: self.objects.len(),
            total_triangles: self.objects.iter().map(Object::triangle_count).sum(),
            total_vertices: self.objects.iter().map(Object::vertex_count).sum(),
        }
    }
}

/// Scene statistics for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub total_triangles: u32,
    pub total_vertices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{sway_depth_position, SwayParams};
    use approx::assert_abs_diff_eq;
    use std::path::PathBuf;

    fn temp_obj(name: &str, content: &str) -> PathBuf {
        let file = format!("sway-{}-{}.obj", std::process::id(), name);
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_scene_has_swaying_model_and_plain_wall() {
        let scene = Scene::from_config(&DemoConfig::default(), 16.0 / 9.0).unwrap();
        assert_eq!(scene.objects.len(), 2);

        let model = scene.object(MODEL_NAME).unwrap();
        assert_eq!(model.effect, Some(VertexEffect::Sway));
        assert!(model.cast_shadow && model.receive_shadow);

        let wall = scene.object(WALL_NAME).unwrap();
        assert_eq!(wall.effect, None);
        assert!(wall.cast_shadow && wall.receive_shadow);
        assert_eq!(wall.triangle_count(), 15 * 2);
        assert_abs_diff_eq!(wall.transform.w.z, 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(wall.transform.w.y, -5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_default_model_visibly_sways() {
        let scene = Scene::from_config(&DemoConfig::default(), 1.0).unwrap();
        let model = scene.object(MODEL_NAME).unwrap();
        let params = SwayParams::new(1.3, 0.4);

        let max_abs_z =
            |points: &[[f32; 3]]| points.iter().map(|p| p[2].abs()).fold(0.0, f32::max);
        let rest: Vec<[f32; 3]> = model.meshes[0]
            .vertices()
            .iter()
            .map(|v| v.position)
            .collect();
        let swayed: Vec<[f32; 3]> = rest
            .iter()
            .map(|&p| sway_depth_position(p, params))
            .collect();

        // The thin side turns towards Z, widening the silhouette seen from the wall
        assert_abs_diff_eq!(max_abs_z(&rest), 0.15, epsilon = 1e-6);
        assert!(max_abs_z(&swayed) > 0.3);

        let moved = rest
            .iter()
            .zip(&swayed)
            .map(|(a, b)| (a[0] - b[0]).abs() + (a[2] - b[2]).abs())
            .fold(0.0, f32::max);
        assert!(moved > 0.1);
    }

    #[test]
    fn test_default_scene_camera() {
        let scene = Scene::from_config(&DemoConfig::default(), 1.0).unwrap();
        let camera = &scene.camera_manager.camera;
        assert_abs_diff_eq!(camera.eye.x, 4.0, epsilon = 1e-4);
        assert_abs_diff_eq!(camera.eye.z, -4.0, epsilon = 1e-4);
        assert_abs_diff_eq!(camera.znear, 0.1);
        assert!(scene.camera_manager.controller.damping_factor.is_some());
    }

    #[test]
    fn test_missing_model_file() {
        let mut config = DemoConfig::default();
        config.model.path = Some(PathBuf::from("does/not/exist.obj"));
        let err = Scene::from_config(&config, 1.0).err().unwrap();
        assert!(matches!(err, SwayError::ModelLoad { .. }));
    }

    #[test]
    fn test_add_obj_computes_missing_normals() {
        let path = temp_obj(
            "triangle",
            "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 4 3\n",
        );
        let mut scene = Scene::new(CameraManager::new(
            OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0),
            CameraController::new(0.01, 0.1),
        ));
        let object = scene.add_obj(&path, Material::default()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(object.triangle_count(), 2);
        for vertex in object.meshes[0].vertices() {
            assert_abs_diff_eq!(vertex.normal[2], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_obj_without_faces_is_empty() {
        let path = temp_obj("points", "v 0 0 0\nv 1 0 0\n");
        let mut scene = Scene::new(CameraManager::new(
            OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0),
            CameraController::new(0.01, 0.1),
        ));
        let err = scene.add_obj(&path, Material::default()).err().unwrap();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, SwayError::EmptyModel(_)));
    }

    #[test]
    fn test_statistics() {
        let scene = Scene::from_config(&DemoConfig::default(), 1.0).unwrap();
        let stats = scene.statistics();
        assert_eq!(stats.object_count, 2);
        assert_eq!(
            stats.total_triangles,
            scene.objects.iter().map(|o| o.triangle_count()).sum::<u32>()
        );
    }
}
