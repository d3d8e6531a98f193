//! 语义校验
//!
//! 遍历系统并收集全部诊断信息，不修改输入，可以在编辑器每次编辑后调用：
//!
//! - 函数调用的参数个数不足（arity）
//! - 变量表内的引用指向在其之后声明的变量（ordering）
//! - 用户变量与预定义变量重名
//! - 引用了不存在的变量
//!
//! 变换和颜色表达式在所有变量声明之后执行，因此不参与顺序检查。

use super::model::{Axis, Channel, Expression, System, TransformScope};
use super::path::NodePath;
use super::predefined::PredefinedVariables;
use crate::core::error::CompileError;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// 参数个数不足
    Arity,
    /// 先使用后声明
    Ordering,
    /// 与预定义变量重名
    ReservedName,
    /// 引用了未定义的变量
    UnknownVariable,
    /// 解析或生成阶段的内部错误
    Internal,
}

/// 一条诊断：出错节点和面向用户的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: NodePath,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn arity(path: NodePath, operator: super::model::Operator) -> Self {
        let message = format!(
            "{}/{} needs at least {} parameters",
            path,
            operator,
            operator.min_arity()
        );
        Self {
            path,
            kind: DiagnosticKind::Arity,
            message,
        }
    }

    pub fn ordering(path: NodePath, name: &str) -> Self {
        Self {
            path,
            kind: DiagnosticKind::Ordering,
            message: format!("variable \"{}\" is used before its declaration", name),
        }
    }

    pub fn reserved_name(path: NodePath, name: &str) -> Self {
        Self {
            path,
            kind: DiagnosticKind::ReservedName,
            message: format!(
                "variable \"{}\" is a predefined variable and can not be redeclared",
                name
            ),
        }
    }

    pub fn unknown_variable(path: NodePath, name: &str) -> Self {
        Self {
            path,
            kind: DiagnosticKind::UnknownVariable,
            message: format!("variable \"{}\" is not defined", name),
        }
    }

    /// 提交失败时展示给用户的通用诊断
    pub fn internal(error: &CompileError) -> Self {
        Self {
            path: NodePath::root(),
            kind: DiagnosticKind::Internal,
            message: format!("internal compiler error: {}", error),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() || self.kind == DiagnosticKind::Arity {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// 变量引用：所在节点路径，以及所在变量表项的声明位置（变量表之外为 `None`）
struct Reference<'a> {
    path: NodePath,
    entry: Option<usize>,
    name: &'a str,
}

/// 语义校验器
pub struct Validator<'a> {
    predefined: &'a PredefinedVariables,
}

impl<'a> Validator<'a> {
    pub fn new(predefined: &'a PredefinedVariables) -> Self {
        Self { predefined }
    }

    /// 校验系统，返回全部诊断（为空表示可以提交）
    pub fn validate(&self, system: &System) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut references = Vec::new();

        for (position, (name, expression)) in system.variables.iter().enumerate() {
            let path = NodePath::variable(name);
            if self.predefined.contains(name) {
                diagnostics.push(Diagnostic::reserved_name(path.clone(), name));
            }
            walk(expression, path, Some(position), &mut diagnostics, &mut references);
        }

        for scope in TransformScope::ALL {
            for (index, transformation) in system.transformations(scope).iter().enumerate() {
                for axis in Axis::ALL {
                    if let Some(expression) = transformation.axis(axis) {
                        let path = NodePath::transformation(scope, index).axis(axis);
                        walk(expression, path, None, &mut diagnostics, &mut references);
                    }
                }
            }
        }

        if let Some(color) = &system.color {
            for channel in Channel::ALL {
                if let Some(expression) = color.channel(channel) {
                    let path = NodePath::color().channel(channel);
                    walk(expression, path, None, &mut diagnostics, &mut references);
                }
            }
        }

        let mut reported: HashSet<(usize, &str)> = HashSet::new();
        for reference in references {
            if self.predefined.contains(reference.name) {
                continue;
            }
            let Some(declared) = system.variables.position(reference.name) else {
                diagnostics.push(Diagnostic::unknown_variable(reference.path, reference.name));
                continue;
            };
            if let Some(entry) = reference.entry {
                if declared >= entry && reported.insert((entry, reference.name)) {
                    diagnostics.push(Diagnostic::ordering(reference.path, reference.name));
                }
            }
        }

        tracing::debug!(
            target: "particles",
            variables = system.variables.len(),
            diagnostics = diagnostics.len(),
            "Validated particle system"
        );
        diagnostics
    }
}

fn walk<'e>(
    expression: &'e Expression,
    path: NodePath,
    entry: Option<usize>,
    diagnostics: &mut Vec<Diagnostic>,
    references: &mut Vec<Reference<'e>>,
) {
    match expression {
        Expression::Constant { .. } => {}
        Expression::Variable { name } => references.push(Reference { path, entry, name }),
        Expression::FunctionCall {
            operator,
            parameters,
        } => {
            if parameters.len() < operator.min_arity() {
                diagnostics.push(Diagnostic::arity(path.clone(), *operator));
            }
            for (index, parameter) in parameters.iter().enumerate() {
                walk(
                    parameter,
                    path.clone().parameter(index),
                    entry,
                    diagnostics,
                    references,
                );
            }
        }
    }
}

/// 使用默认预定义变量校验系统
pub fn validate(system: &System) -> Vec<Diagnostic> {
    Validator::new(&PredefinedVariables::default()).validate(system)
}
