//! 作用域解析
//!
//! 生成系统的深拷贝并把所有变量名改写为着色器中的标识符：
//! 预定义变量映射到宿主提供的固定标识符，用户变量按声明顺序映射为 `var0, var1, ...`。
//! 原始系统保持不变，编辑器继续显示用户输入的名字。

use super::model::{Expression, System};
use super::predefined::{PredefinedVariables, USER_VARIABLE_PREFIX};
use super::variables::VariableTable;
use crate::core::error::{CompileError, CompileResult};
use std::collections::HashMap;

/// 名字已被改写的系统
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSystem {
    system: System,
    /// 用户变量名 → 标识符，按声明顺序
    identifiers: Vec<(String, String)>,
}

impl ResolvedSystem {
    /// 改写后的系统，所有 `Variable.name` 都是着色器标识符
    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn into_system(self) -> System {
        self.system
    }

    /// 用户变量对应的标识符
    pub fn identifier(&self, name: &str) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|(user, _)| user == name)
            .map(|(_, identifier)| identifier.as_str())
    }

    /// 按声明顺序列出 `(用户名, 标识符)`
    pub fn identifiers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.identifiers
            .iter()
            .map(|(user, identifier)| (user.as_str(), identifier.as_str()))
    }
}

/// 第 `index` 个用户变量的标识符
pub fn user_identifier(index: usize) -> String {
    format!("{}{}", USER_VARIABLE_PREFIX, index)
}

/// 作用域解析器
pub struct Resolver<'a> {
    predefined: &'a PredefinedVariables,
}

impl<'a> Resolver<'a> {
    pub fn new(predefined: &'a PredefinedVariables) -> Self {
        Self { predefined }
    }

    pub fn resolve(&self, system: &System) -> CompileResult<ResolvedSystem> {
        let mut scope: HashMap<&str, String> = HashMap::with_capacity(system.variables.len());
        let mut identifiers = Vec::with_capacity(system.variables.len());

        for (index, name) in system.variables.names().enumerate() {
            if self.predefined.contains(name) {
                tracing::warn!(target: "particles", name, "User variable shadows a predefined variable");
                return Err(CompileError::ReservedName {
                    name: name.to_string(),
                });
            }
            let identifier = user_identifier(index);
            if self
                .predefined
                .iter()
                .any(|variable| variable.identifier == identifier)
            {
                return Err(CompileError::IdentifierCollision { identifier });
            }
            scope.insert(name, identifier.clone());
            identifiers.push((name.to_string(), identifier));
        }

        let lookup = |name: &str| -> CompileResult<String> {
            self.predefined
                .identifier(name)
                .map(str::to_string)
                .or_else(|| scope.get(name).cloned())
                .ok_or_else(|| CompileError::UnknownVariable {
                    name: name.to_string(),
                })
        };

        let mut variables = VariableTable::new();
        for (name, expression) in system.variables.iter() {
            let mut expression = expression.clone();
            rename(&mut expression, &lookup)?;
            variables.insert(lookup(name)?, expression);
        }

        let mut resolved = System {
            variables,
            local: system.local.clone(),
            world: system.world.clone(),
            color: system.color.clone(),
            size: system.size,
        };
        for transformation in resolved.local.iter_mut().chain(resolved.world.iter_mut()) {
            for expression in [
                &mut transformation.x,
                &mut transformation.y,
                &mut transformation.z,
            ]
            .into_iter()
            .flatten()
            {
                rename(expression, &lookup)?;
            }
        }
        if let Some(color) = resolved.color.as_mut() {
            for expression in [&mut color.r, &mut color.g, &mut color.b, &mut color.a]
                .into_iter()
                .flatten()
            {
                rename(expression, &lookup)?;
            }
        }

        tracing::debug!(target: "particles", variables = identifiers.len(), "Resolved variable names");
        Ok(ResolvedSystem {
            system: resolved,
            identifiers,
        })
    }
}

fn rename(
    expression: &mut Expression,
    lookup: &impl Fn(&str) -> CompileResult<String>,
) -> CompileResult<()> {
    match expression {
        Expression::Constant { .. } => Ok(()),
        Expression::Variable { name } => {
            *name = lookup(name)?;
            Ok(())
        }
        Expression::FunctionCall { parameters, .. } => parameters
            .iter_mut()
            .try_for_each(|parameter| rename(parameter, lookup)),
    }
}

/// 使用默认预定义变量解析系统
pub fn resolve(system: &System) -> CompileResult<ResolvedSystem> {
    Resolver::new(&PredefinedVariables::default()).resolve(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::model::{Axis, Channel, ColorExpr, Operator, Transformation};
    use crate::particles::predefined::PredefinedVariable;

    fn sample() -> System {
        let mut system = System::new();
        system.variables = VariableTable::new()
            .with("speed", 2.0)
            .with(
                "offset",
                Expression::call(Operator::Multiplication, vec!["speed".into(), "time".into()]),
            );
        system.local.push(Transformation::translate().with(Axis::X, "offset"));
        system.color = Some(ColorExpr::new().with(Channel::A, "index"));
        system
    }

    #[test]
    fn test_renames_user_and_predefined() {
        let resolved = resolve(&sample()).unwrap();
        let system = resolved.system();

        assert_eq!(system.variables.names().collect::<Vec<_>>(), vec!["var0", "var1"]);
        assert_eq!(
            system.variables.get("var1"),
            Some(&Expression::call(
                Operator::Multiplication,
                vec!["var0".into(), "u_fParticleSystemTime".into()]
            ))
        );
        assert_eq!(system.local[0].x, Some(Expression::variable("var1")));
        assert_eq!(
            system.color.as_ref().and_then(|c| c.a.clone()),
            Some(Expression::variable("fParticleIndex"))
        );
        assert_eq!(resolved.identifier("offset"), Some("var1"));
    }

    #[test]
    fn test_input_untouched() {
        let system = sample();
        let before = system.clone();
        let _ = resolve(&system).unwrap();
        assert_eq!(system, before);
    }

    #[test]
    fn test_reserved_name_fails() {
        let mut system = System::new();
        system.variables.insert("time", Expression::constant(1.0));
        assert_eq!(
            resolve(&system),
            Err(CompileError::ReservedName {
                name: "time".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_reference_fails() {
        let mut system = System::new();
        system.world.push(Transformation::scale().with(Axis::Z, "ghost"));
        assert_eq!(
            resolve(&system),
            Err(CompileError::UnknownVariable {
                name: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_predefined_identifier_collision_fails() {
        let predefined = PredefinedVariables::new(vec![PredefinedVariable::new("time", "var0")]);
        let mut system = System::new();
        system.variables = VariableTable::new().with("a", 5.0).with("b", "time");
        assert_eq!(
            Resolver::new(&predefined).resolve(&system),
            Err(CompileError::IdentifierCollision {
                identifier: "var0".to_string()
            })
        );
    }

    #[test]
    fn test_identifiers_are_independent_of_user_names() {
        let mut system = System::new();
        system.variables = VariableTable::new()
            .with("größe", 1.0)
            .with("my var", 2.0)
            .with("float", 3.0);
        let resolved = resolve(&system).unwrap();
        assert_eq!(
            resolved.identifiers().collect::<Vec<_>>(),
            vec![("größe", "var0"), ("my var", "var1"), ("float", "var2")]
        );
    }
}
