//! Render pipeline management system for wgpu
//!
//! Registers pipeline configurations and creates them in one batch. Shaders are
//! composed from [`ShaderProgram`]s, so each material variant and vertex
//! effect combination gets its own shader module and pipeline.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::{
    effect::VertexEffect,
    error::{Result, SwayError},
    gfx::{
        scene::vertex::Vertex3D,
        shaders::{MaterialVariant, ShaderProgram},
    },
};

/// Pipeline (and shader) name for a material variant with an optional effect
///
/// `standard`, `depth`, or the variant name followed by the effect name,
/// e.g. `standard_sway`.
pub fn pipeline_key(variant: MaterialVariant, effect: Option<VertexEffect>) -> String {
    let base = match variant {
        MaterialVariant::Standard => "standard",
        MaterialVariant::Depth => "depth",
    };
    match effect {
        Some(effect) => format!("{}_{}", base, effect.name()),
        None => base.to_string(),
    }
}

/// The program for a material variant with the effect's patch applied
pub fn variant_program(
    variant: MaterialVariant,
    effect: Option<VertexEffect>,
) -> Result<ShaderProgram> {
    let program = variant.program();
    match effect {
        Some(effect) => program.with_patch(effect.patch()),
        None => Ok(program),
    }
}

/// Configuration for creating a render pipeline
///
/// Defines all parameters needed to create a wgpu render pipeline,
/// including shaders, bind group layouts, and render state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub depth_bias: DepthBiasState,
    pub multisample: MultisampleState,
    pub color_targets: Vec<Option<ColorTargetState>>,
    pub vertex_only: bool, // for shadow pass
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "standard".to_string(),
            bind_group_layouts: Vec::new(),
            cull_mode: Some(Face::Back),
            depth_format: None,
            depth_bias: DepthBiasState::default(),
            multisample: MultisampleState::default(),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            vertex_only: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    /// Drops the fragment stage and all colour targets
    pub fn with_vertex_only(mut self) -> Self {
        self.vertex_only = true;
        self.color_targets.clear();
        self
    }

    /// Sets the shader for this pipeline (builder pattern)
    pub fn with_shader(mut self, shader: &str) -> Self {
        self.shader = shader.to_string();
        self
    }

    /// Sets all bind group layouts at once (builder pattern)
    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a texture of the given format
    pub fn with_depth_format(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Sets a depth bias, used by the shadow pass against acne
    pub fn with_depth_bias(mut self, bias: DepthBiasState) -> Self {
        self.depth_bias = bias;
        self
    }

    /// Sets color targets for this pipeline (builder pattern)
    pub fn with_color_targets(mut self, targets: Vec<Option<ColorTargetState>>) -> Self {
        self.color_targets = targets;
        self
    }

    /// Sets the MSAA sample count of the pipeline's attachments
    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.multisample = MultisampleState {
            count,
            ..MultisampleState::default()
        };
        self
    }
}

/// Manages render pipelines and the shader modules they are built from
///
/// - Deferred creation: pipelines are registered, then created in one batch
/// - Shader modules composed from shader programs
/// - Pipeline statistics for logging
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    /// Creates a new pipeline manager
    ///
    /// # Arguments
    /// * `device` - Shared wgpu device for creating resources
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a pipeline configuration without creating it
    ///
    /// Registered pipelines are created together by `create_all_pipelines()`.
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Loads and compiles a shader module
    ///
    /// # Arguments
    /// * `name` - Shader identifier
    /// * `source` - WGSL shader source code
    pub fn load_shader(&mut self, name: &str, source: &str) {
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        log::debug!("loaded shader '{}' ({} bytes)", name, source.len());
        self.shader_modules.insert(name.to_string(), shader_module);
    }

    /// Composes a shader program and loads it under `name`
    pub fn load_program(&mut self, name: &str, program: &ShaderProgram) {
        let source = program.compose();
        if !program.patches().is_empty() {
            log::debug!("shader '{}' uses patches {:?}", name, program.patches());
        }
        self.load_shader(name, &source);
    }

    /// Gets a created pipeline
    pub fn pipeline(&self, name: &str) -> Result<&RenderPipeline> {
        self.pipelines
            .get(name)
            .ok_or_else(|| SwayError::MissingPipeline(name.to_string()))
    }

    /// Creates all pending pipelines immediately
    ///
    /// Pipelines that fail are logged and stay pending; the first error is
    /// returned after every pipeline has been attempted.
    pub fn create_all_pipelines(&mut self) -> Result<()> {
        let mut first_error = None;
        let pending = std::mem::take(&mut self.pending_pipelines);

        for name in pending {
            let Some(config) = self.pipeline_configs.get(&name).cloned() else {
                continue;
            };
            match self.create_pipeline_from_config(&name, &config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name, pipeline);
                }
                Err(e) => {
                    log::error!("failed to create pipeline '{}': {}", name, e);
                    self.pending_pipelines.push(name);
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Creates a render pipeline from configuration
    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline> {
        let shader = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| SwayError::MissingShader(config.shader.clone()))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let fragment_state = if config.vertex_only {
            None
        } else {
            Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &config.color_targets,
                compilation_options: PipelineCompilationOptions::default(),
            })
        };

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: config.depth_bias,
        });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3D::desc()],
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: fragment_state,
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            });

        log::debug!("created pipeline '{}'", name);
        Ok(pipeline)
    }

    /// Returns pipeline manager statistics
    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            total_pipelines: self.pipelines.len(),
            pending_pipelines: self.pending_pipelines.len(),
            loaded_shaders: self.shader_modules.len(),
        }
    }
}

/// Statistics about pipeline manager state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub total_pipelines: usize,
    pub pending_pipelines: usize,
    pub loaded_shaders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_keys() {
        assert_eq!(pipeline_key(MaterialVariant::Standard, None), "standard");
        assert_eq!(
            pipeline_key(MaterialVariant::Standard, Some(VertexEffect::Sway)),
            "standard_sway"
        );
        assert_eq!(pipeline_key(MaterialVariant::Depth, None), "depth");
        assert_eq!(
            pipeline_key(MaterialVariant::Depth, Some(VertexEffect::Sway)),
            "depth_sway"
        );
    }

    #[test]
    fn test_variant_programs() {
        let plain = variant_program(MaterialVariant::Depth, None).unwrap();
        assert!(plain.patches().is_empty());

        let swaying = variant_program(MaterialVariant::Depth, Some(VertexEffect::Sway)).unwrap();
        assert_eq!(swaying.patches(), ["sway"]);
        assert_eq!(swaying.label(), "depth");
    }

    #[test]
    fn test_sample_count() {
        let config = PipelineConfig::default().with_sample_count(4);
        assert_eq!(config.multisample.count, 4);
        assert_eq!(config.multisample.mask, !0);
        assert_eq!(PipelineConfig::default().multisample.count, 1);
    }

    #[test]
    fn test_vertex_only_config_has_no_targets() {
        let config = PipelineConfig::default().with_vertex_only();
        assert!(config.vertex_only);
        assert!(config.color_targets.is_empty());
    }
}
