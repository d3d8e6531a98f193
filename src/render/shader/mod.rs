//! 粒子着色器代码生成
//!
//! ```text
//! ResolvedSystem ──emit──▶ ShaderFragments (glsl 渲染树) ──templates──▶ ShaderSources
//! ```

pub mod emit;
pub mod generator;
pub mod glsl;
pub mod templates;

pub use emit::{Emitter, TransformBlock};
pub use generator::{generate, ShaderFragments, ShaderGenerator, ShaderSources};
pub use glsl::{Declaration, GlslExpr, GlslType};
pub use templates::ShaderTemplates;
