//! 渲染模块
//!
//! - `shader` - 粒子表达式到 GLSL 源码的生成
//! - `shader_key` - 系统和生成源码的内容指纹

pub mod shader;
pub mod shader_key;

pub use shader::{ShaderGenerator, ShaderSources, ShaderTemplates};
pub use shader_key::ShaderKey;
