//! # Particle FX
//!
//! Compiles procedural particle effect descriptions into GPU shader sources.
//!
//! A particle effect is authored as a data structure: a table of user variables,
//! local/world transformation lists and an optional color, each built from small
//! arithmetic expressions. The compiler turns that structure into a GLSL vertex and
//! fragment shader pair.
//!
//! ## Pipeline
//!
//! - **Validate** ([`particles::validate`]): collect every arity, ordering and naming
//!   problem as a diagnostic for the editor to highlight.
//! - **Resolve** ([`particles::resolve`]): rename every variable to a collision-free
//!   shader identifier on a deep copy of the system.
//! - **Generate** ([`render::shader`]): render expressions, transformation matrices and
//!   color into the vertex/fragment templates.
//! - **Commit** ([`editor::particle_editor`]): keep the last good shader while the user
//!   edits, and replace it only after a full successful compile.
//!
//! ### Example
//!
//! ```ignore
//! use particle_fx::config::CompilerConfig;
//! use particle_fx::editor::{EditEvent, ParticleEffectSession};
//! use particle_fx::particles::{Expression, NodePath};
//!
//! let mut session = ParticleEffectSession::new(&CompilerConfig::default())?;
//! session.working_mut().variables.insert("speed", Expression::constant(2.0));
//! session.apply(EditEvent::Add(NodePath::variable("speed")));
//! let vertex = &session.committed().unwrap().sources().vertex;
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Error types and logging setup
//! - [`config`]: Compiler configuration
//! - [`particles`]: Expression model, validator and resolver
//! - [`render`]: Shader code generation
//! - [`editor`]: Edit session and commit policy

/// Error types and logging setup
pub mod core;
/// Configuration system
pub mod config;
/// Particle expression model, semantic validation and scope resolution
pub mod particles;
/// Shader code generation
pub mod render;
/// Editor integration
pub mod editor;

pub use config::CompilerConfig;
pub use crate::core::error::{CompileError, CompileResult};
pub use editor::{CompiledEffect, EditEvent, ParticleEffectSession, SessionState};
pub use particles::{Diagnostic, Expression, System};
pub use render::{ShaderKey, ShaderSources};
