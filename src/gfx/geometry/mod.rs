//! # Procedural Geometry Generation
//!
//! Generates the meshes the demo needs without external model files.
//!
//! ## Supported Primitives
//!
//! - **Plane**: Flat plane in XY facing +Z with configurable subdivisions
//! - **Slab**: Box with its sides split along the height, the stand-in swaying model
//! - **Sphere**: UV sphere with configurable resolution
//!
//! ## Usage
//!
//! ```rust
//! use sway::gfx::geometry::{generate_plane, generate_slab};
//!
//! // The wall the shadow falls on
//! let wall = generate_plane(15.0, 15.0, 15, 1);
//!
//! // A flat slab, tall enough to show the sway varying with height
//! let slab = generate_slab(1.2, 3.0, 0.3, 48);
//! assert!(slab.triangle_count() > wall.triangle_count());
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::vertex::Vertex3D;

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    /// Create a new empty geometry data structure
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of vertices in this geometry
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles in this geometry
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Converts to the interleaved vertex format used by the renderer
    pub fn to_scene_format(&self) -> (Vec<Vertex3D>, Vec<u32>) {
        let vertices: Vec<Vertex3D> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex3D {
                position,
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
