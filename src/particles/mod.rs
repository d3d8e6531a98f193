//! 粒子效果表达式
//!
//! 用户在编辑器中以数据结构的形式编写逐粒子的运动/外观表达式，
//! 本模块负责表达式模型、语义校验和作用域解析：
//!
//! ```text
//! System ──validate──▶ Vec<Diagnostic>           (为空才继续)
//!    │
//!    └────resolve────▶ ResolvedSystem ──▶ render::shader::ShaderGenerator
//! ```

pub mod model;
pub mod path;
pub mod predefined;
pub mod random;
pub mod resolve;
pub mod validate;
pub mod variables;


pub use model::{
    Axis, Channel, ColorExpr, Expression, Operator, System, TransformScope, Transformation,
    TransformationKind,
};
pub use path::{NodePath, PathSegment};
pub use predefined::{PredefinedVariable, PredefinedVariables};
pub use random::RandomTable;
pub use resolve::{resolve, ResolvedSystem, Resolver};
pub use validate::{validate, Diagnostic, DiagnosticKind, Validator};
pub use variables::{VariableTable, VariableTableError};
