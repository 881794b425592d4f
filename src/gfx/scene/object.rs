use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};
use wgpu::{util::DeviceExt, Device};

use super::vertex::Vertex3D;
use crate::{
    effect::VertexEffect,
    gfx::resources::material::{Material, MaterialUBO, ObjectBindings, ObjectUBO, ObjectUniform},
};

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
}

impl Mesh {
    /// Builds a mesh from flat position/normal arrays as produced by tobj
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let vertices = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .map(|(p, n)| Vertex3D {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
            })
            .collect();

        Self::from_vertices(vertices, indices)
    }

    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    pub fn vertices(&self) -> &[Vertex3D] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Smooth per-vertex normals for meshes loaded without any.
    ///
    /// Face normals are accumulated unnormalized, so larger triangles weigh
    /// more, then each vertex sum is normalized.
    pub fn calculate_smooth_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        log::debug!("computing normals for {} vertices", positions.len() / 3);
        let mut normals = vec![0.0; positions.len()];
        let vertex = |i: usize| [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let (v0, v1, v2) = (vertex(i0), vertex(i1), vertex(i2));

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for vertex_idx in [i0, i1, i2] {
                for axis in 0..3 {
                    normals[vertex_idx * 3 + axis] += face_normal[axis];
                }
            }
        }

        for normal in normals.chunks_exact_mut(3) {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal.iter_mut().for_each(|c| *c /= length);
            }
        }

        normals
    }

    fn init_gpu_resources(&mut self, device: &Device, label: &str) {
        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

// Uniform buffers and the group 1 bind group of one object
pub struct ObjectGpuResources {
    object_ubo: ObjectUBO,
    material_ubo: MaterialUBO,
    bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>, // cgmath 4x4 transformation matrix
    pub material: Material,
    pub effect: Option<VertexEffect>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
    gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    /// Create a new Object with identity transformation and the default material
    pub fn new(name: &str, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.to_string(),
            meshes,
            transform: Matrix4::identity(),
            material: Material::default(),
            effect: None,
            cast_shadow: true,
            receive_shadow: true,
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_effect(mut self, effect: VertexEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Create a complete transform from translation, rotation about Y, and scale
    pub fn set_transform_trs(
        &mut self,
        translation: Vector3<f32>,
        rotation_y: Rad<f32>,
        scale: f32,
    ) {
        let t = Matrix4::from_translation(translation);
        let r = Matrix4::from_angle_y(rotation_y);
        let s = Matrix4::from_scale(scale);
        self.transform = t * r * s; // Order matters: T * R * S
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> u32 {
        self.meshes.iter().map(|m| m.index_count() / 3).sum()
    }

    pub fn has_gpu_resources(&self) -> bool {
        self.gpu_resources.is_some()
    }

    /// Get the group 1 bind group for rendering
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|res| &res.bind_group)
    }

    pub fn init_gpu_resources(&mut self, device: &Device, bindings: &ObjectBindings) {
        for mesh in self.meshes.iter_mut() {
            mesh.init_gpu_resources(device, &self.name);
        }

        let object_ubo =
            ObjectUBO::new_with_data(device, &ObjectUniform::from_transform(self.transform));
        let material_ubo =
            MaterialUBO::new_with_data(device, &self.material.uniform(self.receive_shadow));
        let bind_group = bindings.create_bind_group(
            device,
            &object_ubo,
            &material_ubo,
            &format!("{} Bind Group", self.name),
        );

        log::debug!(
            "uploaded '{}': {} meshes, {} triangles",
            self.name,
            self.meshes.len(),
            self.triangle_count()
        );

        self.gpu_resources = Some(ObjectGpuResources {
            object_ubo,
            material_ubo,
            bind_group,
        });
    }

    /// Syncs transform and material to the GPU. Unchanged values are skipped.
    pub fn update_gpu_resources(&mut self, queue: &wgpu::Queue) {
        if let Some(resources) = &mut self.gpu_resources {
            resources
                .object_ubo
                .update_content(queue, ObjectUniform::from_transform(self.transform));
            resources
                .material_ubo
                .update_content(queue, self.material.uniform(self.receive_shadow));
        }
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count(), 0, 0..1);
    }

    fn draw_object(&mut self, object: &'b Object) {
        for mesh in &object.meshes {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::{Point3, Transform};
    use std::f32::consts::FRAC_1_SQRT_2;

    #[test]
    fn test_mesh_from_flat_arrays() {
        let mesh = Mesh::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        );
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.vertices()[1].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_smooth_normals_are_unit_length() {
        // Two triangles folded along the X axis
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let indices = [0, 1, 2, 0, 3, 1];
        let normals = Mesh::calculate_smooth_normals(&positions, &indices);

        for n in normals.chunks_exact(3) {
            let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert_abs_diff_eq!(length, 1.0, epsilon = 1e-6);
        }
        // Vertices on the shared edge average both faces
        let expected = [0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2];
        for axis in 0..3 {
            assert_abs_diff_eq!(normals[axis], expected[axis], epsilon = 1e-6);
            assert_abs_diff_eq!(normals[3 + axis], expected[axis], epsilon = 1e-6);
        }
        assert_eq!(normals[6..9], [0.0f32, 0.0, 1.0]);
    }

    #[test]
    fn test_transform_order_is_trs() {
        let mut object = Object::new("o", Vec::new());
        object.set_transform_trs(
            Vector3::new(0.0, -5.0, 5.0),
            Rad(std::f32::consts::PI),
            2.0,
        );
        let p = object.transform.transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(p.x, -2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, -5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_objects_start_without_gpu_resources() {
        let object = Object::new("o", Vec::new()).with_effect(VertexEffect::Sway);
        assert!(!object.has_gpu_resources());
        assert!(object.bind_group().is_none());
        assert_eq!(object.effect, Some(VertexEffect::Sway));
        assert!(object.cast_shadow && object.receive_shadow);
    }
}
