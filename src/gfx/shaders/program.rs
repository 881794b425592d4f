//! Shader programs as ordered stage lists with named injection points.
//!
//! A [`ShaderProgram`] is built from WGSL chunks in order. Between chunks it
//! may expose hooks ([`InjectionPoint`]) where patches append their own chunks
//! without touching the program's lighting or shadow code. Composition is a
//! plain concatenation in stage order; nothing is searched or replaced.

use std::borrow::Cow;
use std::fmt;

use crate::error::{Result, SwayError};

/// Named places in a program where patches may add code.
///
/// The vertex stage contract at each point:
/// - `Common`: module scope, after the shared structs and bindings.
/// - `BeginNormal`: inside `vs_main`, right after `var object_normal` is set
///   from the vertex input `v_in`.
/// - `BeginVertex`: inside `vs_main`, right after `var transformed` is set from
///   `v_in.position` and before it is projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectionPoint {
    Common,
    BeginNormal,
    BeginVertex,
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InjectionPoint::Common => "common",
            InjectionPoint::BeginNormal => "begin-normal",
            InjectionPoint::BeginVertex => "begin-vertex",
        };
        f.write_str(name)
    }
}

/// A named piece of WGSL source.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderChunk {
    name: Cow<'static, str>,
    source: Cow<'static, str>,
}

impl ShaderChunk {
    pub fn new(name: impl Into<Cow<'static, str>>, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Chunk(ShaderChunk),
    Hook {
        point: InjectionPoint,
        injected: Vec<ShaderChunk>,
    },
}

/// Something that extends a [`ShaderProgram`] through its injection points.
pub trait ShaderPatch {
    fn name(&self) -> &str;

    /// Injects the patch's chunks. Implementations should leave the program
    /// unchanged when they return an error.
    fn apply(&self, program: &mut ShaderProgram) -> Result<()>;
}

/// An ordered list of shader stages.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    label: String,
    stages: Vec<Stage>,
    patches: Vec<String>,
}

impl ShaderProgram {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            stages: Vec::new(),
            patches: Vec::new(),
        }
    }

    /// Appends a fixed chunk (builder pattern).
    pub fn chunk(mut self, chunk: ShaderChunk) -> Self {
        self.stages.push(Stage::Chunk(chunk));
        self
    }

    /// Appends an injection point (builder pattern).
    ///
    /// # Panics
    /// Panics if the program already exposes `point`.
    pub fn hook(mut self, point: InjectionPoint) -> Self {
        assert!(
            !self.has_point(point),
            "program '{}' already has a {} hook",
            self.label,
            point
        );
        self.stages.push(Stage::Hook {
            point,
            injected: Vec::new(),
        });
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Names of the patches applied so far, in order.
    pub fn patches(&self) -> &[String] {
        &self.patches
    }

    pub fn has_point(&self, point: InjectionPoint) -> bool {
        self.points().any(|p| p == point)
    }

    /// Injection points in stage order.
    pub fn points(&self) -> impl Iterator<Item = InjectionPoint> + '_ {
        self.stages.iter().filter_map(|stage| match stage {
            Stage::Hook { point, .. } => Some(*point),
            Stage::Chunk(_) => None,
        })
    }

    /// Fails with [`SwayError::MissingInjectionPoint`] if `point` is absent.
    pub fn require_point(&self, point: InjectionPoint) -> Result<()> {
        if self.has_point(point) {
            Ok(())
        } else {
            Err(SwayError::MissingInjectionPoint {
                program: self.label.clone(),
                point,
            })
        }
    }

    /// Appends `chunk` at `point`, after anything injected there before.
    pub fn inject(&mut self, point: InjectionPoint, chunk: ShaderChunk) -> Result<()> {
        let hook = self.stages.iter_mut().find_map(|stage| match stage {
            Stage::Hook { point: p, injected } if *p == point => Some(injected),
            _ => None,
        });

        match hook {
            Some(injected) => {
                injected.push(chunk);
                Ok(())
            }
            None => Err(SwayError::MissingInjectionPoint {
                program: self.label.clone(),
                point,
            }),
        }
    }

    /// Chunks injected at `point` so far.
    pub fn injected(&self, point: InjectionPoint) -> &[ShaderChunk] {
        self.stages
            .iter()
            .find_map(|stage| match stage {
                Stage::Hook { point: p, injected } if *p == point => Some(injected.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Applies `patch` and records its name.
    pub fn apply(&mut self, patch: &dyn ShaderPatch) -> Result<()> {
        patch.apply(self)?;
        log::debug!("applied shader patch '{}' to '{}'", patch.name(), self.label);
        self.patches.push(patch.name().to_owned());
        Ok(())
    }

    /// Builder-style [`ShaderProgram::apply`].
    pub fn with_patch(mut self, patch: &dyn ShaderPatch) -> Result<Self> {
        self.apply(patch)?;
        Ok(self)
    }

    /// Concatenates every stage into a single WGSL source.
    pub fn compose(&self) -> String {
        let mut source = String::new();
        for stage in &self.stages {
            match stage {
                Stage::Chunk(chunk) => push_chunk(&mut source, chunk),
                Stage::Hook { injected, .. } => {
                    for chunk in injected {
                        push_chunk(&mut source, chunk);
                    }
                }
            }
        }
        source
    }
}

fn push_chunk(source: &mut String, chunk: &ShaderChunk) {
    source.push_str(chunk.source());
    if !chunk.source().ends_with('\n') {
        source.push('\n');
    }
}
