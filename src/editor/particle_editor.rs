//! 粒子效果编辑会话
//!
//! 编辑器持有一个工作副本，用户可以随意修改；只有在编辑完成事件
//! （添加、删除、重命名、拖放、粘贴）到来时才执行编译：
//!
//! ```text
//! Editing ──apply──▶ Validating ──有诊断──▶ Invalid
//!                        │
//!                        └──无诊断──▶ Committing ──成功──▶ Committed
//!                                        │
//!                                        └──内部错误──▶ Invalid
//! ```
//!
//! 校验或生成失败时，上一次提交的结果保持不变，宿主始终可以使用最后一个可用的着色器。

use crate::config::{CompilerConfig, ConfigResult};
use crate::core::error::CompileError;
use crate::particles::{Diagnostic, NodePath, PredefinedVariables, Resolver, System, Validator};
use crate::render::shader::{ShaderGenerator, ShaderSources, ShaderTemplates};
use crate::render::shader_key::ShaderKey;
use std::fmt;

/// 编辑完成事件，携带被修改的节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Add(NodePath),
    Delete(NodePath),
    Rename(NodePath),
    Drop(NodePath),
    Paste(NodePath),
}

impl EditEvent {
    pub fn path(&self) -> &NodePath {
        match self {
            EditEvent::Add(path)
            | EditEvent::Delete(path)
            | EditEvent::Rename(path)
            | EditEvent::Drop(path)
            | EditEvent::Paste(path) => path,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditEvent::Add(_) => "add",
            EditEvent::Delete(_) => "delete",
            EditEvent::Rename(_) => "rename",
            EditEvent::Drop(_) => "drop",
            EditEvent::Paste(_) => "paste",
        }
    }
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// 工作副本已修改，尚未编译
    Editing,
    Validating,
    /// 工作副本有诊断或提交失败，对外仍暴露上一次提交的结果
    Invalid,
    Committing,
    /// 工作副本与提交结果一致
    Committed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Editing => "editing",
            SessionState::Validating => "validating",
            SessionState::Invalid => "invalid",
            SessionState::Committing => "committing",
            SessionState::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// 提交的结果：通过校验的系统及其生成的源码
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledEffect {
    system: System,
    sources: ShaderSources,
    system_key: ShaderKey,
    key: ShaderKey,
}

impl CompiledEffect {
    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    /// 生成源码的指纹，宿主可以用它缓存着色器程序
    pub fn key(&self) -> &ShaderKey {
        &self.key
    }

    pub fn system_key(&self) -> &ShaderKey {
        &self.system_key
    }
}

/// 单个粒子效果的编辑会话
///
/// 同一会话上的编辑必须由调用方串行化，每个事件处理完毕后再处理下一个。
#[derive(Debug, Clone)]
pub struct ParticleEffectSession {
    predefined: PredefinedVariables,
    generator: ShaderGenerator,
    working: System,
    committed: Option<CompiledEffect>,
    state: SessionState,
    diagnostics: Vec<Diagnostic>,
}

impl ParticleEffectSession {
    /// 创建会话；配置（包括预定义变量）必须通过校验
    pub fn new(config: &CompilerConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_generator(
            config.predefined.clone(),
            ShaderGenerator::new(config.shader.clone()),
        ))
    }

    /// 使用宿主提供的模板
    pub fn with_templates(config: &CompilerConfig, templates: ShaderTemplates) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_generator(
            config.predefined.clone(),
            ShaderGenerator::with_templates(config.shader.clone(), templates),
        ))
    }

    fn with_generator(predefined: PredefinedVariables, generator: ShaderGenerator) -> Self {
        Self {
            predefined,
            generator,
            working: System::default(),
            committed: None,
            state: SessionState::Editing,
            diagnostics: Vec::new(),
        }
    }

    /// 从已有的系统开始编辑（尚未编译）
    pub fn with_system(mut self, system: System) -> Self {
        self.working = system;
        self
    }

    pub fn working(&self) -> &System {
        &self.working
    }

    /// 修改工作副本；不会触发编译
    pub fn working_mut(&mut self) -> &mut System {
        self.state = SessionState::Editing;
        &mut self.working
    }

    /// 整体替换工作副本；不会触发编译
    pub fn replace_working(&mut self, system: System) {
        *self.working_mut() = system;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 最近一次编译的诊断，提交成功后为空
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// 最后一次成功提交的结果
    pub fn committed(&self) -> Option<&CompiledEffect> {
        self.committed.as_ref()
    }

    pub fn predefined(&self) -> &PredefinedVariables {
        &self.predefined
    }

    /// 处理编辑完成事件
    pub fn apply(&mut self, event: EditEvent) -> SessionState {
        tracing::debug!(
            target: "particle_editor",
            event = event.name(),
            path = %event.path(),
            "Edit completed"
        );
        self.compile(false)
    }

    /// 强制重新生成，即使工作副本与提交结果相同
    pub fn recompile(&mut self) -> SessionState {
        self.compile(true)
    }

    fn compile(&mut self, force: bool) -> SessionState {
        self.state = SessionState::Validating;
        let diagnostics = Validator::new(&self.predefined).validate(&self.working);
        if !diagnostics.is_empty() {
            tracing::warn!(
                target: "particle_editor",
                count = diagnostics.len(),
                "Particle effect has errors, keeping last committed shader"
            );
            self.diagnostics = diagnostics;
            self.state = SessionState::Invalid;
            return self.state;
        }

        self.state = SessionState::Committing;
        match self.commit(force) {
            Ok(()) => {
                self.diagnostics.clear();
                self.state = SessionState::Committed;
            }
            Err(error) => {
                tracing::error!(
                    target: "particle_editor",
                    error = %error,
                    "Particle effect failed to compile"
                );
                self.diagnostics = vec![Diagnostic::internal(&error)];
                self.state = SessionState::Invalid;
            }
        }
        self.state
    }

    fn commit(&mut self, force: bool) -> Result<(), CompileError> {
        let system_key = ShaderKey::of_system(&self.working)?;
        if !force
            && self
                .committed
                .as_ref()
                .is_some_and(|committed| committed.system_key == system_key)
        {
            tracing::debug!(
                target: "particle_editor",
                key = system_key.short(),
                "Particle effect unchanged, skipping generation"
            );
            return Ok(());
        }

        let system = self.working.clone();
        let resolved = Resolver::new(&self.predefined).resolve(&system)?;
        let sources = self.generator.generate(&resolved)?;
        let key = ShaderKey::of_sources(&sources);

        tracing::info!(
            target: "particle_editor",
            key = key.short(),
            variables = system.variables.len(),
            "Committed particle shader"
        );
        self.committed = Some(CompiledEffect {
            system,
            sources,
            system_key,
            key,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::particles::{DiagnosticKind, Expression, Operator, PredefinedVariable, VariableTable};

    fn session() -> ParticleEffectSession {
        ParticleEffectSession::new(&CompilerConfig::default()).unwrap()
    }

    fn add(name: &str) -> EditEvent {
        EditEvent::Add(NodePath::variable(name))
    }

    #[test]
    fn test_commit_on_valid_edit() {
        let mut session = session();
        session.working_mut().variables.insert("a", Expression::constant(1.0));
        assert_eq!(session.state(), SessionState::Editing);
        assert!(session.committed().is_none());

        assert_eq!(session.apply(add("a")), SessionState::Committed);
        let committed = session.committed().unwrap();
        assert!(committed.sources().vertex.contains("float var0 = 1.0;"));
        assert_eq!(committed.system(), session.working());
        assert!(session.diagnostics().is_empty());
    }

    #[test]
    fn test_invalid_edit_keeps_last_commit() {
        let mut session = session();
        session.working_mut().variables.insert("a", Expression::constant(1.0));
        session.apply(add("a"));
        let before = session.committed().cloned();

        session
            .working_mut()
            .variables
            .insert("b", Expression::call(Operator::Power, vec![1.0.into()]));
        assert_eq!(session.apply(add("b")), SessionState::Invalid);
        assert_eq!(session.committed().cloned(), before);
        assert_eq!(session.diagnostics().len(), 1);
        assert_eq!(session.diagnostics()[0].kind, DiagnosticKind::Arity);

        // 修复后重新提交
        if let Some(expression) = session.working_mut().variables.get_mut("b") {
            *expression = Expression::constant(2.0);
        }
        assert_eq!(session.apply(EditEvent::Paste(NodePath::variable("b"))), SessionState::Committed);
        assert_ne!(session.committed().cloned(), before);
    }

    #[test]
    fn test_internal_failure_reported_generically() {
        let mut session = session();
        session.apply(EditEvent::Paste(NodePath::root()));
        let before = session.committed().cloned();
        assert!(before.is_some());

        session
            .working_mut()
            .variables
            .insert("a", Expression::constant(f32::INFINITY));
        assert_eq!(session.apply(add("a")), SessionState::Invalid);
        assert_eq!(session.committed().cloned(), before);
        assert_eq!(session.diagnostics()[0].kind, DiagnosticKind::Internal);
        assert!(session.diagnostics()[0]
            .message
            .starts_with("internal compiler error: "));
    }

    #[test]
    fn test_unchanged_system_skips_generation() {
        let mut session = session().with_system(System {
            variables: VariableTable::new().with("a", 3.0),
            ..System::default()
        });
        session.apply(EditEvent::Drop(NodePath::variable("a")));
        let key = session.committed().map(|c| c.key().clone());

        session.working_mut();
        assert_eq!(session.apply(EditEvent::Rename(NodePath::variable("a"))), SessionState::Committed);
        assert_eq!(session.committed().map(|c| c.key().clone()), key);
        assert_eq!(session.recompile(), SessionState::Committed);
        assert_eq!(session.committed().map(|c| c.key().clone()), key);
    }

    #[test]
    fn test_replace_working() {
        let mut session = session();
        let mut system = System::new();
        system.variables.insert("time", Expression::constant(1.0));
        session.replace_working(system);
        assert_eq!(session.state(), SessionState::Editing);
        assert_eq!(session.apply(EditEvent::Delete(NodePath::root())), SessionState::Invalid);
        assert_eq!(session.diagnostics()[0].kind, DiagnosticKind::ReservedName);
        assert!(session.committed().is_none());
    }

    #[test]
    fn test_invalid_predefined_set_rejected() {
        let mut config = CompilerConfig::default();
        config.predefined = PredefinedVariables::new(vec![PredefinedVariable::new("time", "var0")]);
        assert!(matches!(
            ParticleEffectSession::new(&config),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(ParticleEffectSession::with_templates(&config, ShaderTemplates::default()).is_err());
    }

    #[test]
    fn test_event_accessors() {
        let event = EditEvent::Rename(NodePath::variable("speed"));
        assert_eq!(event.name(), "rename");
        assert_eq!(event.path(), &NodePath::variable("speed"));
        assert_eq!(SessionState::Committed.to_string(), "committed");
    }
}
