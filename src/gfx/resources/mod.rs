// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, buffers, and bind groups for rendering.

pub mod effect_bindings;
pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use effect_bindings::EffectBindings;
pub use global_bindings::{light_view_proj, GlobalBindings, GlobalUniform};
pub use material::{Material, MaterialUniform, ObjectBindings, ObjectUniform};
pub use texture_resource::{ShadowMap, TextureResource};
