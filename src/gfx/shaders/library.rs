//! Base shader programs.
//!
//! The stage order follows the usual vertex chunk sequence: normals first,
//! then position, then projection. Patches hook in between.

use super::program::{InjectionPoint, ShaderChunk, ShaderProgram};

/// Bind group index reserved for patch uniforms in every program.
pub const EXTENSION_GROUP: u32 = 2;

const COMMON: &str = include_str!("chunks/common.wgsl");
const STANDARD_COMMON: &str = include_str!("chunks/standard_common.wgsl");
const STANDARD_VERTEX_BEGIN: &str = include_str!("chunks/standard_vertex_begin.wgsl");
const BEGINNORMAL_VERTEX: &str = include_str!("chunks/beginnormal_vertex.wgsl");
const DEFAULTNORMAL_VERTEX: &str = include_str!("chunks/defaultnormal_vertex.wgsl");
const BEGIN_VERTEX: &str = include_str!("chunks/begin_vertex.wgsl");
const PROJECT_VERTEX: &str = include_str!("chunks/project_vertex.wgsl");
const SHADOWMAP_VERTEX: &str = include_str!("chunks/shadowmap_vertex.wgsl");
const STANDARD_VERTEX_END: &str = include_str!("chunks/standard_vertex_end.wgsl");
const STANDARD_FRAGMENT: &str = include_str!("chunks/standard_fragment.wgsl");
const DEPTH_VERTEX_BEGIN: &str = include_str!("chunks/depth_vertex_begin.wgsl");
const DEPTH_PROJECT_VERTEX: &str = include_str!("chunks/depth_project_vertex.wgsl");

/// Which of the two material programs a pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialVariant {
    /// Lit colour pass with shadow lookup.
    Standard,
    /// Vertex-only pass rendering into the shadow map.
    Depth,
}

impl MaterialVariant {
    pub fn program(self) -> ShaderProgram {
        match self {
            MaterialVariant::Standard => standard_program(),
            MaterialVariant::Depth => depth_program(),
        }
    }
}

/// Lit program: exposes all three injection points.
pub fn standard_program() -> ShaderProgram {
    ShaderProgram::new("standard")
        .chunk(ShaderChunk::new("common", COMMON))
        .chunk(ShaderChunk::new("standard_common", STANDARD_COMMON))
        .hook(InjectionPoint::Common)
        .chunk(ShaderChunk::new("vertex_begin", STANDARD_VERTEX_BEGIN))
        .chunk(ShaderChunk::new("beginnormal_vertex", BEGINNORMAL_VERTEX))
        .hook(InjectionPoint::BeginNormal)
        .chunk(ShaderChunk::new("defaultnormal_vertex", DEFAULTNORMAL_VERTEX))
        .chunk(ShaderChunk::new("begin_vertex", BEGIN_VERTEX))
        .hook(InjectionPoint::BeginVertex)
        .chunk(ShaderChunk::new("project_vertex", PROJECT_VERTEX))
        .chunk(ShaderChunk::new("shadowmap_vertex", SHADOWMAP_VERTEX))
        .chunk(ShaderChunk::new("vertex_end", STANDARD_VERTEX_END))
        .chunk(ShaderChunk::new("standard_fragment", STANDARD_FRAGMENT))
}

/// Shadow-depth program: no normals, so no `BeginNormal` point.
pub fn depth_program() -> ShaderProgram {
    ShaderProgram::new("depth")
        .chunk(ShaderChunk::new("common", COMMON))
        .hook(InjectionPoint::Common)
        .chunk(ShaderChunk::new("vertex_begin", DEPTH_VERTEX_BEGIN))
        .chunk(ShaderChunk::new("begin_vertex", BEGIN_VERTEX))
        .hook(InjectionPoint::BeginVertex)
        .chunk(ShaderChunk::new("project_vertex", DEPTH_PROJECT_VERTEX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::SwayPatch;

    fn validate(label: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("'{}' failed to parse: {}", label, e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::default(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("'{}' failed validation: {:?}", label, e));
    }

    #[test]
    fn test_injection_points() {
        let standard: Vec<_> = standard_program().points().collect();
        assert_eq!(
            standard,
            [
                InjectionPoint::Common,
                InjectionPoint::BeginNormal,
                InjectionPoint::BeginVertex
            ]
        );

        let depth = depth_program();
        assert!(!depth.has_point(InjectionPoint::BeginNormal));
        assert!(depth.has_point(InjectionPoint::BeginVertex));
    }

    #[test]
    fn test_base_programs_validate() {
        for variant in [MaterialVariant::Standard, MaterialVariant::Depth] {
            let program = variant.program();
            validate(program.label(), &program.compose());
        }
    }

    #[test]
    fn test_swaying_programs_validate() {
        for variant in [MaterialVariant::Standard, MaterialVariant::Depth] {
            let program = variant.program().with_patch(&SwayPatch).unwrap();
            assert_eq!(program.patches(), ["sway"]);
            validate(program.label(), &program.compose());
        }
    }

    #[test]
    fn test_patch_binds_extension_group() {
        for variant in [MaterialVariant::Standard, MaterialVariant::Depth] {
            let source = variant.program().with_patch(&SwayPatch).unwrap().compose();
            assert!(source.contains(&format!("@group({}) @binding(0)", EXTENSION_GROUP)));
        }
    }

    #[test]
    fn test_base_logic_unchanged_by_patch() {
        let plain = standard_program().compose();
        let patched = standard_program().with_patch(&SwayPatch).unwrap().compose();
        for line in plain.lines() {
            assert!(patched.contains(line));
        }
        assert!(patched.len() > plain.len());
    }
}
