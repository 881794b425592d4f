//! Time-driven vertex effects.
//!
//! - [`sway`] - the oscillating X/Z rotation and the shader patch that injects it
//! - [`frame`] - frame clock, tunable rotation speed and the per-frame context

pub mod frame;
pub mod sway;

pub use frame::{FrameClock, FrameContext, FrameTime, RotationSpeed, SwayUniform};
pub use sway::{
    rotation_angle, sway_depth_position, sway_standard_vertex, Rotation2D, SwayParams, SwayPass,
    SwayPatch,
};

use crate::gfx::shaders::ShaderPatch;

/// Vertex effect an object can opt into. Objects with an effect are drawn
/// with the patched variants of both material programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexEffect {
    Sway,
}

impl VertexEffect {
    pub fn patch(self) -> &'static dyn ShaderPatch {
        match self {
            VertexEffect::Sway => &SwayPatch,
        }
    }

    pub fn name(self) -> &'static str {
        self.patch().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_name_matches_patch() {
        assert_eq!(VertexEffect::Sway.name(), "sway");
    }
}
