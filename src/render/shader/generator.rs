//! 着色器生成入口
//!
//! 把解析后的系统渲染为片段（结构化），再代入模板得到顶点/片元源码。

use super::emit::{Emitter, TransformBlock};
use super::glsl::{render_block, Declaration, GlslExpr};
use super::templates::{self, ShaderTemplates};
use crate::config::shader::ShaderConfig;
use crate::core::error::CompileResult;
use crate::particles::{ResolvedSystem, TransformScope};
use serde::{Deserialize, Serialize};

/// 模板中 `main()` 函数体的缩进
const BODY_INDENT: &str = "  ";

/// 生成的源码
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

/// 代入模板之前的结构化片段
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderFragments {
    pub variables: Vec<Declaration>,
    pub local: Option<TransformBlock>,
    pub world: Option<TransformBlock>,
    pub color: Option<GlslExpr>,
}

impl ShaderFragments {
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    pub fn transform(&self, scope: TransformScope) -> Option<&TransformBlock> {
        match scope {
            TransformScope::Local => self.local.as_ref(),
            TransformScope::World => self.world.as_ref(),
        }
    }
}

/// 着色器生成器
#[derive(Debug, Clone, Default)]
pub struct ShaderGenerator {
    config: ShaderConfig,
    templates: ShaderTemplates,
}

impl ShaderGenerator {
    pub fn new(config: ShaderConfig) -> Self {
        Self {
            config,
            templates: ShaderTemplates::default(),
        }
    }

    pub fn with_templates(config: ShaderConfig, templates: ShaderTemplates) -> Self {
        Self { config, templates }
    }

    pub fn config(&self) -> &ShaderConfig {
        &self.config
    }

    pub fn templates(&self) -> &ShaderTemplates {
        &self.templates
    }

    pub fn fragments(&self, resolved: &ResolvedSystem) -> CompileResult<ShaderFragments> {
        let system = resolved.system();
        let emitter = Emitter::new(&self.config);
        Ok(ShaderFragments {
            variables: emitter.variables(&system.variables)?,
            local: emitter.transformations(&system.local, TransformScope::Local)?,
            world: emitter.transformations(&system.world, TransformScope::World)?,
            color: system
                .color
                .as_ref()
                .map(|color| emitter.color(color))
                .transpose()?,
        })
    }

    pub fn generate(&self, resolved: &ResolvedSystem) -> CompileResult<ShaderSources> {
        let fragments = self.fragments(resolved)?;
        let sources = self.assemble(&fragments);
        tracing::debug!(
            target: "shader",
            variables = fragments.variables.len(),
            local = fragments.local.is_some(),
            world = fragments.world.is_some(),
            color = fragments.has_color(),
            vertex_len = sources.vertex.len(),
            "Generated particle shader sources"
        );
        Ok(sources)
    }

    /// 代入模板
    pub fn assemble(&self, fragments: &ShaderFragments) -> ShaderSources {
        let header = self.header(fragments.has_color());
        let variables = render_block(&fragments.variables, BODY_INDENT);
        let block = |scope: TransformScope| {
            fragments
                .transform(scope)
                .map(|block| {
                    let declarations: Vec<Declaration> = block.declarations().cloned().collect();
                    render_block(&declarations, BODY_INDENT)
                })
                .unwrap_or_default()
        };
        let (local, world) = (block(TransformScope::Local), block(TransformScope::World));
        let apply_world = if fragments.world.is_some() { "mtxWorld * " } else { "" };
        let apply_local = if fragments.local.is_some() { " * mtxLocal" } else { "" };
        let color = fragments
            .color
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        let vertex = templates::substitute(
            self.templates.vertex(),
            &[
                (templates::HEADER, header.as_str()),
                (templates::VARIABLES, variables.as_str()),
                (templates::MTX_LOCAL, local.as_str()),
                (templates::MTX_WORLD, world.as_str()),
                (templates::APPLY_MTX_WORLD, apply_world),
                (templates::APPLY_MTX_LOCAL, apply_local),
                (templates::COLOR, color.as_str()),
                (templates::COLOR_DEFINE, self.config.color_define.as_str()),
                (templates::RANDOM_SAMPLER, self.config.random_sampler.as_str()),
            ],
        );
        let fragment = templates::substitute(
            self.templates.fragment(),
            &[
                (templates::HEADER, header.as_str()),
                (templates::COLOR_DEFINE, self.config.color_define.as_str()),
            ],
        );
        ShaderSources { vertex, fragment }
    }

    fn header(&self, has_color: bool) -> String {
        let mut header = format!(
            "#version {}\n#define {}",
            self.config.glsl_version, self.config.shader_define
        );
        if has_color {
            header.push_str("\n#define ");
            header.push_str(&self.config.color_define);
        }
        header
    }
}

/// 使用默认配置和模板生成源码
pub fn generate(resolved: &ResolvedSystem) -> CompileResult<ShaderSources> {
    ShaderGenerator::default().generate(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CompileError;
    use crate::particles::{
        resolve, Axis, Channel, ColorExpr, Expression, Operator, System, Transformation,
        VariableTable,
    };

    fn system() -> System {
        let mut system = System::new();
        system.variables = VariableTable::new().with("spin", 45.0).with(
            "height",
            Expression::call(Operator::Random, vec!["index".into()]),
        );
        system.local.push(Transformation::translate().with(Axis::Y, "height"));
        system.world.push(Transformation::rotate().with(Axis::Z, "spin"));
        system
    }

    #[test]
    fn test_empty_system() {
        let sources = generate(&resolve(&System::new()).unwrap()).unwrap();
        assert!(sources.vertex.starts_with("#version 300 es\n#define PARTICLE\n"));
        assert!(sources.vertex.contains("mat4 mtxMeshToWorld = u_mtxMeshToWorld;"));
        assert!(!sources.vertex.contains("mtxLocal"));
        assert!(!sources.vertex.contains("#define PARTICLE_COLOR"));
        assert!(!sources.vertex.contains("/*$"));
        assert!(!sources.fragment.contains("/*$"));
    }

    #[test]
    fn test_full_system() {
        let generator = ShaderGenerator::default();
        let resolved = resolve(&system()).unwrap();
        let fragments = generator.fragments(&resolved).unwrap();
        assert_eq!(fragments.variables.len(), 2);
        assert_eq!(fragments.local.as_ref().map(|b| b.trig.len()), Some(0));
        assert_eq!(fragments.world.as_ref().map(|b| b.trig.len()), Some(7));

        let sources = generator.generate(&resolved).unwrap();
        assert!(sources.vertex.contains("float var0 = 45.0;\n  float var1 = texelFetch("));
        assert!(sources
            .vertex
            .contains("mat4 mtxMeshToWorld = mtxWorld * u_mtxMeshToWorld * mtxLocal;"));
        assert!(sources.vertex.contains("float fRadZWorld0 = radians(var0);"));
        assert!(sources.vertex.contains("uniform sampler2D u_fParticleSystemRandomNumbers;"));
    }

    #[test]
    fn test_color_define_toggles() {
        let mut system = system();
        system.color = Some(ColorExpr::new().with(Channel::R, 0.25));
        let sources = generate(&resolve(&system).unwrap()).unwrap();
        assert!(sources.vertex.contains("#define PARTICLE_COLOR"));
        assert!(sources.vertex.contains("v_vctColor = vec4(0.25, 1.0, 1.0, 1.0);"));
        assert!(sources
            .fragment
            .starts_with("#version 300 es\n#define PARTICLE\n#define PARTICLE_COLOR\n"));
    }

    #[test]
    fn test_idempotent() {
        let resolved = resolve(&system()).unwrap();
        assert_eq!(generate(&resolved).unwrap(), generate(&resolved).unwrap());
    }

    #[test]
    fn test_configured_names() {
        let config = ShaderConfig {
            glsl_version: "310 es".to_string(),
            random_sampler: "u_randomTable".to_string(),
            ..Default::default()
        };
        let sources = ShaderGenerator::new(config)
            .generate(&resolve(&system()).unwrap())
            .unwrap();
        assert!(sources.vertex.starts_with("#version 310 es"));
        assert!(sources.vertex.contains("texelFetch(u_randomTable, "));
        assert!(sources.vertex.contains("uniform sampler2D u_randomTable;"));
    }

    #[test]
    fn test_structural_error_propagates() {
        let mut system = System::new();
        system
            .variables
            .insert("a", Expression::call(Operator::Division, vec![1.0.into()]));
        let resolved = resolve(&system).unwrap();
        assert!(matches!(generate(&resolved), Err(CompileError::InvalidStructure(_))));
    }
}
