//! # Scene Management Module
//!
//! Objects, meshes and the camera that make up what gets drawn.
//!
//! - [`Scene`] - objects plus the camera manager
//! - [`Object`] - meshes with a transform, material and optional vertex effect
//! - [`Vertex3D`] - vertex layout shared by every pipeline

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{DrawObject, Mesh, Object};
pub use scene::{Scene, SceneStatistics, MODEL_NAME, WALL_NAME};
pub use vertex::Vertex3D;
