//! 统一错误处理模块
//!
//! 提供编译管线范围内的错误类型定义
//!
//! ## 错误类型分层
//!
//! - **可恢复的语义错误**: 参数数量、声明顺序等问题以 `Diagnostic` 数据的形式收集，
//!   由 `particles::validate` 产生，从不作为错误抛出。
//! - **命名错误** (`CompileError::ReservedName` / `CompileError::UnknownVariable` /
//!   `CompileError::IdentifierCollision`): 由 `particles::resolve` 返回，校验通过后理论上不可达。
//! - **结构/内部错误** (`CompileError::InvalidStructure` / `CompileError::Template`):
//!   代码生成阶段的致命错误，终止本次提交。

use thiserror::Error;

/// 编译核心错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("\"{name}\" is a predefined variable and can not be redeclared")]
    ReservedName { name: String },

    #[error("\"{name}\" is not a defined variable")]
    UnknownVariable { name: String },

    #[error("predefined identifier \"{identifier}\" collides with a user variable identifier")]
    IdentifierCollision { identifier: String },

    #[error("invalid node structure: {0}")]
    InvalidStructure(String),

    #[error("shader template is missing marker {0}")]
    Template(String),
}

/// 编译结果类型别名
pub type CompileResult<T> = Result<T, CompileError>;
