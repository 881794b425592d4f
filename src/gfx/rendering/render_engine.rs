//! WGPU-based rendering engine
//!
//! Owns the surface, device and every GPU resource that is not per-object.
//! A frame is two passes: the shadow-depth pass renders shadow casters from
//! the light into the shadow map, then the main pass draws the lit scene and
//! samples that map. Objects with a vertex effect use the patched variant of
//! the pipeline in both passes.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    config::{DemoConfig, LightConfig, RenderConfig},
    effect::{FrameContext, VertexEffect},
    error::Result,
    gfx::{
        camera::camera_utils::CameraUniform,
        resources::{
            effect_bindings::EffectBindings,
            global_bindings::{GlobalBindings, GlobalUniform},
            material::ObjectBindings,
            texture_resource::{create_multisampled_framebuffer, ShadowMap, TextureResource},
        },
        scene::{object::DrawObject, scene::Scene},
        shaders::{MaterialVariant, EXTENSION_GROUP},
    },
};

use super::pipeline_manager::{pipeline_key, variant_program, PipelineConfig, PipelineManager};

const GLOBAL_GROUP: u32 = 0;
const OBJECT_GROUP: u32 = 1;
const SHADOW_GROUP: u32 = 3;

/// Constant and slope-scaled bias applied while rendering the shadow map
const SHADOW_DEPTH_BIAS: wgpu::DepthBiasState = wgpu::DepthBiasState {
    constant: 2,
    slope_scale: 2.0,
    clamp: 0.0,
};

/// Core rendering engine managing GPU resources and draw calls
///
/// The RenderEngine handles all low-level graphics operations including:
/// - Surface and device management
/// - Pipeline creation for every material variant and vertex effect
/// - Depth buffer and shadow map handling
/// - Global and effect uniform updates
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    depth_texture: TextureResource,
    msaa_view: Option<wgpu::TextureView>,
    pub pipeline_manager: PipelineManager,
    global_bindings: GlobalBindings,
    object_bindings: ObjectBindings,
    effect_bindings: EffectBindings,
    shadow_map: ShadowMap,
    light: LightConfig,
    render: RenderConfig,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Initializes wgpu, creates the depth buffer and shadow map, and builds
    /// the lit and shadow-depth pipelines with and without each vertex effect.
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `demo` - Light, shadow and presentation settings
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        demo: &DemoConfig,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Shading is linear, so let the surface do the sRGB encoding
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .unwrap_or(TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(&surface_capabilities.present_modes, demo.render.vsync),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let format_features = adapter.get_texture_format_features(format);
        let sample_count = msaa_sample_count(demo.render.msaa_samples, |count| {
            format_features.flags.sample_count_supported(count)
        });
        if sample_count != demo.render.msaa_samples {
            log::warn!(
                "{}x MSAA unavailable for {:?}, using {}x",
                demo.render.msaa_samples,
                format,
                sample_count
            );
        }

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, sample_count, "depth_texture");
        let msaa_view = create_multisampled_framebuffer(&device, &config, sample_count);

        let max_size = device.limits().max_texture_dimension_2d;
        let shadow_size = demo.light.shadow.map_size.clamp(1, max_size);
        if shadow_size != demo.light.shadow.map_size {
            log::warn!(
                "shadow map size {} clamped to {}",
                demo.light.shadow.map_size,
                shadow_size
            );
        }
        let shadow_map = ShadowMap::new(&device, shadow_size);

        let global_bindings = GlobalBindings::new(&device);
        let object_bindings = ObjectBindings::new(&device);
        let effect_bindings = EffectBindings::new(&device);

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        let lit_layouts = vec![
            global_bindings.bind_group_layout().clone(),
            object_bindings.bind_group_layout().clone(),
            effect_bindings.bind_group_layout().clone(),
            shadow_map.bind_group_layout().clone(),
        ];
        let depth_layouts = lit_layouts[..=EXTENSION_GROUP as usize].to_vec();

        for effect in [None, Some(VertexEffect::Sway)] {
            let standard = pipeline_key(MaterialVariant::Standard, effect);
            pipeline_manager.load_program(
                &standard,
                &variant_program(MaterialVariant::Standard, effect)?,
            );
            pipeline_manager.register_pipeline(
                &standard,
                PipelineConfig::default()
                    .with_label(&standard)
                    .with_shader(&standard)
                    .with_depth_format(TextureResource::DEPTH_FORMAT)
                    .with_sample_count(sample_count)
                    .with_bind_group_layouts(lit_layouts.clone())
                    .with_color_targets(vec![Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })]),
            );

            let depth = pipeline_key(MaterialVariant::Depth, effect);
            pipeline_manager
                .load_program(&depth, &variant_program(MaterialVariant::Depth, effect)?);
            pipeline_manager.register_pipeline(
                &depth,
                PipelineConfig::default()
                    .with_label(&depth)
                    .with_shader(&depth)
                    .with_depth_format(TextureResource::DEPTH_FORMAT)
                    .with_depth_bias(SHADOW_DEPTH_BIAS)
                    .with_cull_mode(None) // The wall is single sided
                    .with_bind_group_layouts(depth_layouts.clone())
                    .with_vertex_only(),
            );
        }

        pipeline_manager.create_all_pipelines()?;
        log::info!(
            "render engine ready: {:?}, {}x MSAA",
            pipeline_manager.get_stats(),
            sample_count
        );

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            sample_count,
            depth_texture,
            msaa_view,
            pipeline_manager,
            global_bindings,
            object_bindings,
            effect_bindings,
            shadow_map,
            light: demo.light.clone(),
            render: demo.render.clone(),
        })
    }

    /// Writes the frame's global and effect uniforms
    ///
    /// Call exactly once per frame before [`render_frame`](Self::render_frame),
    /// so both passes read the same values.
    pub fn update(&mut self, camera: &CameraUniform, frame: &FrameContext) {
        self.global_bindings.update(
            &self.queue,
            GlobalUniform::new(camera, &self.light, &self.render, self.shadow_map.size),
        );
        self.effect_bindings.update(&self.queue, frame);
    }

    /// Renders the shadow map, then the lit scene, and presents the frame
    pub fn render_frame(&mut self, scene: &Scene) -> std::result::Result<(), wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: Shadow depth from the light
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.shadow_map.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_bind_group(GLOBAL_GROUP, self.global_bindings.bind_group(), &[]);
            shadow_pass.set_bind_group(EXTENSION_GROUP, self.effect_bindings.bind_group(), &[]);

            for object in scene.objects.iter().filter(|o| o.visible && o.cast_shadow) {
                let key = pipeline_key(MaterialVariant::Depth, object.effect);
                let (Ok(pipeline), Some(bind_group)) =
                    (self.pipeline_manager.pipeline(&key), object.bind_group())
                else {
                    continue;
                };
                shadow_pass.set_pipeline(pipeline);
                shadow_pass.set_bind_group(OBJECT_GROUP, bind_group, &[]);
                shadow_pass.draw_object(object);
            }
        }

        // PASS 2: Main rendering with shadows
        {
            let [r, g, b, a] = self.render.clear_color;
            // With MSAA the samples are resolved into the surface and discarded
            let (view, resolve_target, store) = match &self.msaa_view {
                Some(msaa_view) => (
                    msaa_view,
                    Some(&surface_texture_view),
                    wgpu::StoreOp::Discard,
                ),
                None => (&surface_texture_view, None, wgpu::StoreOp::Store),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(GLOBAL_GROUP, self.global_bindings.bind_group(), &[]);
            render_pass.set_bind_group(EXTENSION_GROUP, self.effect_bindings.bind_group(), &[]);
            render_pass.set_bind_group(SHADOW_GROUP, self.shadow_map.bind_group(), &[]);

            for object in scene.objects.iter().filter(|o| o.visible) {
                let key = pipeline_key(MaterialVariant::Standard, object.effect);
                let (Ok(pipeline), Some(bind_group)) =
                    (self.pipeline_manager.pipeline(&key), object.bind_group())
                else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(OBJECT_GROUP, bind_group, &[]);
                render_pass.draw_object(object);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Resizes the render engine surface and recreates the depth and MSAA targets
    ///
    /// Zero sizes (minimized windows) are ignored. The shadow map keeps its
    /// fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            self.sample_count,
            "depth_texture",
        );
        self.msaa_view =
            create_multisampled_framebuffer(&self.device, &self.config, self.sample_count);
    }

    /// Reconfigures the surface at its current size, after it was lost or outdated
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    /// Returns reference to the wgpu device
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns reference to the wgpu command queue
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Layout objects build their group 1 bind group against
    pub fn object_bindings(&self) -> &ObjectBindings {
        &self.object_bindings
    }
}

/// 4x when more than one sample is requested and supported, otherwise 1
fn msaa_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    if requested > 1 && supported(4) {
        4
    } else {
        1
    }
}

/// Fifo with vsync. Without it, Immediate when the surface supports it.
fn present_mode(supported: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if !vsync && supported.contains(&wgpu::PresentMode::Immediate) {
        wgpu::PresentMode::Immediate
    } else {
        wgpu::PresentMode::Fifo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_mode_falls_back_to_fifo() {
        use wgpu::PresentMode::{Fifo, Immediate, Mailbox};

        assert_eq!(present_mode(&[Fifo, Immediate], true), Fifo);
        assert_eq!(present_mode(&[Fifo, Immediate], false), Immediate);
        assert_eq!(present_mode(&[Fifo, Mailbox], false), Fifo);
    }

    #[test]
    fn test_msaa_sample_count() {
        assert_eq!(msaa_sample_count(4, |_| true), 4);
        assert_eq!(msaa_sample_count(8, |count| count == 4), 4);
        assert_eq!(msaa_sample_count(4, |_| false), 1);
        assert_eq!(msaa_sample_count(1, |_| true), 1);
        assert_eq!(msaa_sample_count(0, |_| true), 1);
    }
}
