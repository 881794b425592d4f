//! # Graphics Module
//!
//! Camera, geometry, scene, GPU resources, composable shaders and the
//! render engine.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Y-up orbit camera with damped mouse controls
//! - **Geometry** ([`geometry`]) - procedural plane, slab and sphere meshes
//! - **Scene Management** ([`scene`]) - objects, meshes and OBJ loading
//! - **Resource Management** ([`resources`]) - uniforms, bind groups and the shadow map
//! - **Shaders** ([`shaders`]) - base programs with injection points for patches
//! - **Rendering Pipeline** ([`rendering`]) - shadow-depth pass then lit pass
//!
//! ## Usage
//!
//! ```no_run
//! use sway::{gfx::scene::Scene, DemoConfig};
//!
//! // Build the demo scene without a GPU; the app uploads it once a window exists
//! let scene = Scene::from_config(&DemoConfig::default(), 16.0 / 9.0)?;
//! # Ok::<(), sway::SwayError>(())
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shaders;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
