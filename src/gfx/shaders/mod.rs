//! Composable WGSL programs
//!
//! Base programs are ordered chunk lists with named injection points; effects
//! extend them through [`ShaderPatch`] instead of editing their source.

pub mod library;
pub mod program;

pub use library::{depth_program, standard_program, MaterialVariant, EXTENSION_GROUP};
pub use program::{InjectionPoint, ShaderChunk, ShaderPatch, ShaderProgram};
