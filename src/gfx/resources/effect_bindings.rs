//! Uniform bindings for vertex effects
//!
//! Patched programs read their parameters from bind group
//! [`EXTENSION_GROUP`](crate::gfx::shaders::EXTENSION_GROUP). The buffer is
//! written once per frame from the [`FrameContext`], so the lit and the
//! shadow-depth pass see identical values.

use crate::{
    effect::{FrameContext, SwayUniform},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

pub type SwayUBO = UniformBuffer<SwayUniform>;

pub struct EffectBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
    sway_ubo: SwayUBO,
}

impl EffectBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Effect Bind Group Layout");
        let sway_ubo = SwayUBO::new_with_data(device, &SwayUniform::default());
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(sway_ubo.binding_resource())
            .create(device, "Effect Bind Group");

        Self {
            bind_group_layout,
            bind_group,
            sway_ubo,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, frame: &FrameContext) {
        self.sway_ubo.update_content(queue, frame.uniform());
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
