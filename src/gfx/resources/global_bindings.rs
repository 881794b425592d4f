//! Global uniform bindings for camera and scene data
//!
//! Manages the uniform buffer and bind group for per-frame state shared by
//! every object in the scene: camera matrices, the directional light and the
//! shadow camera that renders the depth map.

use cgmath::{ortho, InnerSpace, Matrix4, Point3, Vector3};

use crate::{
    config::{LightConfig, RenderConfig},
    gfx::camera::{camera_utils::CameraUniform, orbit_camera::OPENGL_TO_WGPU_MATRIX},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// xyz: direction towards the light, w: intensity
    pub light_direction: [f32; 4],
    /// rgb: light colour, w: shadow normal bias
    pub light_color: [f32; 4],
    /// rgb: ambient colour, w: exposure
    pub ambient: [f32; 4],
    /// x: shadow map texel size
    pub shadow_params: [f32; 4],
}

impl GlobalUniform {
    /// `shadow_map_size` is the resolution of the shadow map actually in use,
    /// which may be smaller than the configured one.
    pub fn new(
        camera: &CameraUniform,
        light: &LightConfig,
        render: &RenderConfig,
        shadow_map_size: u32,
    ) -> Self {
        let to_light = Vector3::from(light.position) - Vector3::from(light.target);
        let direction = if to_light.magnitude2() > 0.0 {
            to_light.normalize()
        } else {
            Vector3::unit_y()
        };
        let [r, g, b] = light.color;
        let [ar, ag, ab] = light.ambient;

        Self {
            view_proj: camera.view_proj,
            light_view_proj: light_view_proj(light).into(),
            camera_position: camera.view_position,
            light_direction: [direction.x, direction.y, direction.z, light.intensity],
            light_color: [r, g, b, light.shadow.normal_bias],
            ambient: [ar, ag, ab, render.exposure],
            shadow_params: [1.0 / shadow_map_size.max(1) as f32, 0.0, 0.0, 0.0],
        }
    }
}

/// View-projection of the orthographic shadow camera
///
/// The camera sits at the light position looking at the light target, with a
/// square frustum of half extent `shadow.extent`.
pub fn light_view_proj(light: &LightConfig) -> Matrix4<f32> {
    let eye = Point3::from(light.position);
    let target = Point3::from(light.target);
    let forward = target - eye;

    // look_at degenerates when looking straight along the up vector
    let up = if forward.normalize().y.abs() > 0.999 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };

    let view = Matrix4::look_at_rh(eye, target, up);
    let e = light.shadow.extent;
    let proj = ortho(-e, e, -e, e, light.shadow.near, light.shadow.far);
    OPENGL_TO_WGPU_MATRIX * proj * view
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Global uniforms and their bind group, bound to slot 0 in all pipelines
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
    ubo: GlobalUBO,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");
        let ubo = GlobalUBO::new(device);
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
            ubo,
        }
    }

    /// Writes the frame's global data. Unchanged content is not re-uploaded.
    pub fn update(&mut self, queue: &wgpu::Queue, content: GlobalUniform) {
        self.ubo.update_content(queue, content);
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::Vector4;

    fn project(matrix: Matrix4<f32>, p: [f32; 3]) -> Vector4<f32> {
        let clip = matrix * Vector4::new(p[0], p[1], p[2], 1.0);
        clip / clip.w
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 208);
    }

    #[test]
    fn test_light_target_projects_to_centre() {
        let light = LightConfig::default();
        let ndc = project(light_view_proj(&light), light.target);
        assert_abs_diff_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_default_model_fits_shadow_camera() {
        let light = LightConfig::default();
        let matrix = light_view_proj(&light);
        // Bounds of the swaying model at any phase, plus margin
        for x in [-0.8, 0.8] {
            for y in [-1.5, 1.5] {
                for z in [-0.8, 0.8] {
                    let ndc = project(matrix, [x, y, z]);
                    assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0, "{:?}", ndc);
                    assert!(ndc.z > 0.0 && ndc.z < 1.0, "corner {:?} clipped", [x, y, z]);
                }
            }
        }
        let origin = project(matrix, [0.0, 0.0, 0.0]);
        assert!(origin.z > 0.0 && origin.z < 1.0);
    }

    #[test]
    fn test_near_and_far_planes_map_to_depth_range() {
        let light = LightConfig::default();
        let matrix = light_view_proj(&light);
        let eye = Vector3::from(light.position);
        let forward = (Vector3::from(light.target) - eye).normalize();
        let at = |distance: f32| {
            let p = eye + forward * distance;
            project(matrix, [p.x, p.y, p.z]).z
        };
        assert_abs_diff_eq!(at(light.shadow.near), 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(at(light.shadow.far), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_texel_size_follows_shadow_map_in_use() {
        let light = LightConfig::default();
        let uniform = GlobalUniform::new(
            &CameraUniform::default(),
            &light,
            &RenderConfig::default(),
            512,
        );
        assert_eq!(uniform.shadow_params[0], 1.0 / 512.0);
    }

    #[test]
    fn test_closer_points_have_smaller_depth() {
        let light = LightConfig::default();
        let matrix = light_view_proj(&light);
        let near = project(matrix, [0.2, 1.6, -1.8]);
        let far = project(matrix, [0.0, 0.0, 0.0]);
        assert!(near.z < far.z);
    }

    #[test]
    fn test_vertical_light_has_valid_matrix() {
        let mut light = LightConfig::default();
        light.position = [0.0, 5.0, 0.0];
        let ndc = project(light_view_proj(&light), [0.0, 0.0, 0.0]);
        assert!(ndc.z.is_finite());
    }

    #[test]
    fn test_packs_light_and_render_settings() {
        let light = LightConfig::default();
        let render = RenderConfig::default();
        let uniform = GlobalUniform::new(
            &CameraUniform::default(),
            &light,
            &render,
            light.shadow.map_size,
        );

        let d = Vector3::new(
            uniform.light_direction[0],
            uniform.light_direction[1],
            uniform.light_direction[2],
        );
        assert_abs_diff_eq!(d.magnitude(), 1.0, epsilon = 1e-6);
        assert_eq!(uniform.light_direction[3], 3.0);
        assert_eq!(uniform.light_color[3], 0.05);
        assert_eq!(uniform.ambient[3], 1.0);
        assert_eq!(uniform.shadow_params[0], 1.0 / 1024.0);
    }
}
