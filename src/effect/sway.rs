//! Oscillating vertex rotation.
//!
//! Every vertex is rotated in its X/Z plane by an angle that depends on its
//! local height and the frame time:
//!
//! ```text
//! angle    = sin(position.y + time) * rotation_speed
//! rotation = mat2(cos(angle), -sin(angle), sin(angle), cos(angle))
//! ```
//!
//! The matrix uses the column-major GLSL/WGSL layout, so applying it to
//! `(x, z)` yields `(cos·x + sin·z, -sin·x + cos·z)`.
//!
//! The same formula runs in two places: the lit pass rotates both the normal
//! and the position, the shadow-depth pass rotates the position only. The CPU
//! functions in this module are the reference for the WGSL that [`SwayPatch`]
//! injects into both shader variants.

use crate::{
    error::Result,
    gfx::{
        scene::vertex::Vertex3D,
        shaders::{InjectionPoint, ShaderChunk, ShaderPatch, ShaderProgram, EXTENSION_GROUP},
    },
};

/// Inputs of the effect for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwayParams {
    /// Elapsed seconds since the clock started.
    pub time: f32,
    /// Oscillation amplitude in radians.
    pub rotation_speed: f32,
}

impl SwayParams {
    pub fn new(time: f32, rotation_speed: f32) -> Self {
        Self {
            time,
            rotation_speed,
        }
    }
}

/// Sway angle for a vertex at local height `position_y`.
pub fn rotation_angle(position_y: f32, time: f32, rotation_speed: f32) -> f32 {
    (position_y + time).sin() * rotation_speed
}

/// Planar rotation in the X/Z plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation2D {
    cos: f32,
    sin: f32,
}

impl Rotation2D {
    pub fn identity() -> Self {
        Self { cos: 1.0, sin: 0.0 }
    }

    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { cos, sin }
    }

    /// Rotates an `[x, z]` pair.
    pub fn apply(&self, xz: [f32; 2]) -> [f32; 2] {
        let [x, z] = xz;
        [self.cos * x + self.sin * z, -self.sin * x + self.cos * z]
    }

    /// The rotation by the opposite angle.
    pub fn inverse(&self) -> Self {
        Self {
            cos: self.cos,
            sin: -self.sin,
        }
    }

    /// Composition: applying the result equals applying `self`, then `other`.
    pub fn then(&self, other: &Rotation2D) -> Self {
        Self {
            cos: other.cos * self.cos - other.sin * self.sin,
            sin: other.sin * self.cos + other.cos * self.sin,
        }
    }

    /// Matrix columns, in the order WGSL's `mat2x2<f32>` constructor takes them.
    pub fn columns(&self) -> [[f32; 2]; 2] {
        [[self.cos, -self.sin], [self.sin, self.cos]]
    }
}

/// Rotation computed once per vertex per pass.
///
/// The lit pass derives it before touching the normal and reuses it for the
/// position; the depth pass derives its own from the same inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwayPass {
    pub angle: f32,
    pub rotation: Rotation2D,
}

impl SwayPass {
    pub fn new(position_y: f32, params: SwayParams) -> Self {
        let angle = rotation_angle(position_y, params.time, params.rotation_speed);
        Self {
            angle,
            rotation: Rotation2D::from_angle(angle),
        }
    }

    /// Rotates the X/Z components of `v`, leaving Y untouched.
    pub fn rotate_xz(&self, v: [f32; 3]) -> [f32; 3] {
        let [x, z] = self.rotation.apply([v[0], v[2]]);
        [x, v[1], z]
    }
}

/// Lit pass: sways both the normal and the position of `vertex`.
pub fn sway_standard_vertex(vertex: &Vertex3D, params: SwayParams) -> Vertex3D {
    let pass = SwayPass::new(vertex.position[1], params);
    Vertex3D {
        normal: pass.rotate_xz(vertex.normal),
        position: pass.rotate_xz(vertex.position),
    }
}

/// Shadow-depth pass: sways the position only.
pub fn sway_depth_position(position: [f32; 3], params: SwayParams) -> [f32; 3] {
    SwayPass::new(position[1], params).rotate_xz(position)
}

const SWAY_COMMON: &str = include_str!("shaders/sway_common.wgsl");
const SWAY_ROTATION: &str = include_str!("shaders/sway_rotation.wgsl");
const SWAY_NORMAL: &str = include_str!("shaders/sway_normal.wgsl");
const SWAY_POSITION: &str = include_str!("shaders/sway_position.wgsl");

/// Uniform declarations bound at [`EXTENSION_GROUP`].
fn sway_common_source() -> String {
    SWAY_COMMON.replace("{{EXTENSION_GROUP}}", &EXTENSION_GROUP.to_string())
}

/// Shader patch injecting the sway into a [`ShaderProgram`].
///
/// Programs exposing [`InjectionPoint::BeginNormal`] get the rotation computed
/// there and reused at [`InjectionPoint::BeginVertex`]; programs without it
/// compute the rotation at `BeginVertex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwayPatch;

impl ShaderPatch for SwayPatch {
    fn name(&self) -> &str {
        "sway"
    }

    fn apply(&self, program: &mut ShaderProgram) -> Result<()> {
        // Check every target before touching the program so a failure leaves it unchanged.
        for point in [InjectionPoint::Common, InjectionPoint::BeginVertex] {
            program.require_point(point)?;
        }

        program.inject(
            InjectionPoint::Common,
            ShaderChunk::new("sway_common", sway_common_source()),
        )?;

        if program.has_point(InjectionPoint::BeginNormal) {
            program.inject(
                InjectionPoint::BeginNormal,
                ShaderChunk::new("sway_rotation", SWAY_ROTATION),
            )?;
            program.inject(
                InjectionPoint::BeginNormal,
                ShaderChunk::new("sway_normal", SWAY_NORMAL),
            )?;
        } else {
            program.inject(
                InjectionPoint::BeginVertex,
                ShaderChunk::new("sway_rotation", SWAY_ROTATION),
            )?;
        }

        program.inject(
            InjectionPoint::BeginVertex,
            ShaderChunk::new("sway_position", SWAY_POSITION),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    use crate::gfx::shaders::library::{depth_program, standard_program};

    fn assert_vec3_eq(a: [f32; 3], b: [f32; 3]) {
        for i in 0..3 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_angle_formula() {
        for &t in &[0.0f32, 0.25, 1.0, 3.7, 120.5] {
            for &y in &[-2.0f32, -0.5, 0.0, 0.8, 4.0] {
                for &s in &[0.0f32, 0.4, 1.5] {
                    let expected = (y + t).sin() * s;
                    assert_eq!(rotation_angle(y, t, s), expected);
                    assert_eq!(SwayPass::new(y, SwayParams::new(t, s)).angle, expected);
                }
            }
        }
    }

    #[test]
    fn test_rotation_is_orthogonal() {
        for i in -16..=16 {
            let angle = i as f32 * PI / 8.0;
            let r = Rotation2D::from_angle(angle);
            let product = r.then(&Rotation2D::from_angle(-angle));
            assert_abs_diff_eq!(product.cos, 1.0, epsilon = 1e-6);
            assert_abs_diff_eq!(product.sin, 0.0, epsilon = 1e-6);

            let back = r.inverse().apply(r.apply([0.3, -1.7]));
            assert_abs_diff_eq!(back[0], 0.3, epsilon = 1e-5);
            assert_abs_diff_eq!(back[1], -1.7, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_passes_produce_identical_displacement() {
        let params = SwayParams::new(2.3, 0.4);
        for &position in &[[1.0, 0.0, 0.0], [0.2, 1.4, -0.7], [-3.0, -2.5, 0.5]] {
            let vertex = Vertex3D {
                position,
                normal: [0.0, 0.0, 1.0],
            };
            let lit = sway_standard_vertex(&vertex, params);
            let depth = sway_depth_position(position, params);
            assert_eq!(lit.position, depth);
        }
    }

    #[test]
    fn test_zero_time_and_speed_is_noop() {
        let params = SwayParams::new(0.0, 0.0);
        for &y in &[-3.0, 0.0, 2.0] {
            let vertex = Vertex3D {
                position: [0.5, y, -1.25],
                normal: [0.6, 0.0, 0.8],
            };
            let swayed = sway_standard_vertex(&vertex, params);
            assert_eq!(SwayPass::new(y, params).rotation, Rotation2D::identity());
            assert_vec3_eq(swayed.position, vertex.position);
            assert_vec3_eq(swayed.normal, vertex.normal);
        }
    }

    #[test]
    fn test_scenario_origin_at_time_zero() {
        let position = sway_depth_position([1.0, 0.0, 0.0], SwayParams::new(0.0, 0.4));
        assert_vec3_eq(position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scenario_quarter_period() {
        let params = SwayParams::new(FRAC_PI_2, 0.4);
        let pass = SwayPass::new(0.0, params);
        assert_abs_diff_eq!(pass.angle, 0.4, epsilon = 1e-6);

        let position = pass.rotate_xz([1.0, 0.0, 0.0]);
        assert_abs_diff_eq!(position[0], 0.921, epsilon = 1e-3);
        assert_abs_diff_eq!(position[2], -0.389, epsilon = 1e-3);
        assert_abs_diff_eq!(position[0], 0.4f32.cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(position[2], -(0.4f32.sin()), epsilon = 1e-6);
    }

    #[test]
    fn test_normal_follows_position() {
        let params = SwayParams::new(0.7, 0.9);
        let vertex = Vertex3D {
            position: [1.0, 0.5, 0.0],
            normal: [1.0, 0.0, 0.0],
        };
        let swayed = sway_standard_vertex(&vertex, params);
        // A radial normal stays radial after the sway.
        assert_vec3_eq(swayed.normal, [swayed.position[0], 0.0, swayed.position[2]]);
        assert_eq!(swayed.position[1], 0.5);
    }

    #[test]
    fn test_columns_match_apply() {
        let r = Rotation2D::from_angle(0.4);
        let [c0, c1] = r.columns();
        let [x, z] = [0.25, -2.0];
        let by_columns = [c0[0] * x + c1[0] * z, c0[1] * x + c1[1] * z];
        assert_eq!(by_columns, r.apply([x, z]));
    }

    #[test]
    fn test_non_finite_time_propagates() {
        let position = sway_depth_position([1.0, 0.0, 1.0], SwayParams::new(f32::NAN, 0.4));
        assert!(position[0].is_nan());
        assert!(position[2].is_nan());
        assert_eq!(position[1], 0.0);
    }

    #[test]
    fn test_patch_reuses_rotation_in_standard_program() {
        let mut program = standard_program();
        program.apply(&SwayPatch).unwrap();

        let normal = program.injected(InjectionPoint::BeginNormal);
        let normal_names: Vec<&str> = normal.iter().map(|c| c.name()).collect();
        assert_eq!(normal_names, ["sway_rotation", "sway_normal"]);

        let vertex = program.injected(InjectionPoint::BeginVertex);
        let vertex_names: Vec<&str> = vertex.iter().map(|c| c.name()).collect();
        assert_eq!(vertex_names, ["sway_position"]);
    }

    #[test]
    fn test_uniform_bound_at_extension_group() {
        let binding = format!(
            "@group({}) @binding(0)\nvar<uniform> sway_params",
            EXTENSION_GROUP
        );
        for mut program in [standard_program(), depth_program()] {
            program.apply(&SwayPatch).unwrap();
            let source = program.compose();
            assert_eq!(source.matches(binding.as_str()).count(), 1);
            assert!(!source.contains("{{"));
        }
    }

    #[test]
    fn test_patch_computes_rotation_in_depth_program() {
        let mut program = depth_program();
        program.apply(&SwayPatch).unwrap();

        let vertex = program.injected(InjectionPoint::BeginVertex);
        let vertex_names: Vec<&str> = vertex.iter().map(|c| c.name()).collect();
        assert_eq!(vertex_names, ["sway_rotation", "sway_position"]);
    }

    #[test]
    fn test_angle_computed_once_per_program() {
        for mut program in [standard_program(), depth_program()] {
            program.apply(&SwayPatch).unwrap();
            let source = program.compose();
            assert_eq!(source.matches("sway_angle(v_in.position.y)").count(), 1);
        }
    }
}
