//! Crate-level error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::gfx::shaders::InjectionPoint;

/// Errors produced by the sway crate.
#[derive(Debug, Error)]
pub enum SwayError {
    /// The configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::config::DemoConfig`].
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An OBJ model failed to load.
    #[error("failed to load model '{path}': {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// An OBJ model loaded but contained no triangles.
    #[error("model '{0}' contains no meshes")]
    EmptyModel(PathBuf),

    /// A shader patch targeted an injection point the program does not expose.
    #[error("shader program '{program}' has no {point} injection point")]
    MissingInjectionPoint {
        program: String,
        point: InjectionPoint,
    },

    /// A render pipeline was requested that was never registered.
    #[error("render pipeline '{0}' is not registered")]
    MissingPipeline(String),

    /// A pipeline referenced a shader module that was never loaded.
    #[error("shader '{0}' is not loaded")]
    MissingShader(String),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SwayError>;
