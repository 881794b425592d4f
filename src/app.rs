use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::{DemoConfig, SwayConfig},
    effect::{FrameClock, FrameContext, RotationSpeed},
    error::{Result, SwayError},
    gfx::{rendering::RenderEngine, scene::Scene},
};

/// Frames between periodic debug reports
const REPORT_INTERVAL: u64 = 600;

pub struct SwayApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Scene,
    clock: FrameClock,
    rotation_speed: RotationSpeed,
    error: Option<SwayError>,
}

impl SwayApp {
    /// Builds the scene described by `config`. The window and GPU come up
    /// once the event loop starts.
    pub fn new(config: DemoConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;

        let aspect = config.window.width as f32 / config.window.height.max(1) as f32;
        let scene = Scene::from_config(&config, aspect)?;
        let rotation_speed = RotationSpeed::new(config.sway.rotation_speed);

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                scene,
                clock: FrameClock::new(),
                rotation_speed,
                error: None,
            },
        })
    }

    /// Run the application until the window closes
    ///
    /// Returns the error that stopped the loop, if any.
    pub fn run(mut self) -> Result<()> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SwayError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = event_loop.create_window(
            WindowAttributes::default()
                .with_title(self.config.window.title.clone())
                .with_inner_size(LogicalSize::new(
                    self.config.window.width,
                    self.config.window.height,
                )),
        )?;
        let window_handle = Arc::new(window);
        let (width, height) = window_handle.inner_size().into();

        let renderer = pollster::block_on(RenderEngine::new(
            window_handle.clone(),
            width,
            height,
            &self.config,
        ))?;

        self.scene
            .init_gpu_resources(renderer.device(), renderer.object_bindings());
        self.scene
            .camera_manager
            .camera
            .resize_projection(width, height);

        self.window = Some(window_handle);
        self.render_engine = Some(renderer);
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state == ElementState::Pressed {
            if let PhysicalKey::Code(key_code) = event.physical_key {
                if key_code == KeyCode::Escape {
                    event_loop.exit();
                    return;
                }
                let current = self.rotation_speed.get();
                if let Some(speed) = speed_for_key(key_code, current, &self.config.sway) {
                    self.rotation_speed.set(speed);
                    log::info!("rotation speed {:.2}", speed);
                }
            }
        }

        self.scene.camera_manager.process_keyboard_event(event);
    }

    fn draw_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        let time = self.clock.tick();
        let frame = FrameContext::new(time, &self.rotation_speed);
        if time.frame % REPORT_INTERVAL == 0 {
            log::debug!(
                "frame {} at {:.1}s, rotation speed {:.2}",
                time.frame,
                time.seconds,
                frame.rotation_speed
            );
        }

        self.scene.update();
        self.scene.update_gpu_resources(render_engine.queue());
        render_engine.update(&self.scene.camera_manager.camera.uniform, &frame);

        match render_engine.render_frame(&self.scene) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                render_engine.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, wgpu::SurfaceError::OutOfMemory.into());
            }
            Err(e) => log::warn!("dropped frame: {}", e),
        }
    }
}

/// New rotation speed for a tuning key, or `None` if the key does not tune it
///
/// ArrowUp/ArrowDown step the speed, `0` stops the sway and `R` restores the
/// configured value.
pub fn speed_for_key(key: KeyCode, current: f32, config: &SwayConfig) -> Option<f32> {
    match key {
        KeyCode::ArrowUp => Some(current + config.speed_step),
        KeyCode::ArrowDown => Some(current - config.speed_step),
        KeyCode::Digit0 | KeyCode::Numpad0 => Some(0.0),
        KeyCode::KeyR => Some(config.rotation_speed),
        _ => None,
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(error) = self.init_window(event_loop) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event_loop, &event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.scene
                    .camera_manager
                    .camera
                    .resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.draw_frame(event_loop);
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        self.scene.camera_manager.process_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_speed_keys() {
        let config = SwayConfig::default();
        assert_abs_diff_eq!(
            speed_for_key(KeyCode::ArrowUp, 0.4, &config).unwrap(),
            0.45,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            speed_for_key(KeyCode::ArrowDown, 0.4, &config).unwrap(),
            0.35,
            epsilon = 1e-6
        );
        assert_eq!(speed_for_key(KeyCode::Digit0, 0.4, &config), Some(0.0));
        assert_eq!(speed_for_key(KeyCode::KeyR, 2.0, &config), Some(0.4));
        assert_eq!(speed_for_key(KeyCode::KeyW, 0.4, &config), None);
    }

    #[test]
    fn test_speed_may_go_negative() {
        let config = SwayConfig::default();
        let speed = speed_for_key(KeyCode::ArrowDown, 0.0, &config).unwrap();
        assert!(speed < 0.0);
    }
}
