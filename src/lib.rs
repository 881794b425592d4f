// src/lib.rs
//! Sway
//!
//! A wgpu demo of an oscillating vertex rotation: a model sways about its
//! vertical axis, with a phase that varies with height, while casting an
//! animated shadow onto a wall.
//!
//! The effect is a [`ShaderPatch`](gfx::shaders::ShaderPatch) injected into
//! both the lit and the shadow-depth program, driven by a per-frame
//! [`FrameContext`](effect::FrameContext).

pub mod app;
pub mod config;
pub mod effect;
pub mod error;
pub mod gfx;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::SwayApp;
pub use config::DemoConfig;
pub use error::{Result, SwayError};
