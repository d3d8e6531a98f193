//! 编辑器集成
//!
//! - `particle_editor` - 粒子效果的编辑会话与提交策略

pub mod particle_editor;

pub use particle_editor::{CompiledEffect, EditEvent, ParticleEffectSession, SessionState};
