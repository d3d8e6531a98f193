//! 预定义变量
//!
//! 由宿主渲染器注入的保留变量名（时间、系统大小、粒子索引等）。
//! 用户变量不能使用这些名字；解析阶段把它们映射为固定的着色器标识符。

use crate::config::ConfigError;
use crate::config::shader::is_identifier;
use serde::{Deserialize, Serialize};

/// 用户变量标识符前缀，预定义标识符不得以此开头
pub const USER_VARIABLE_PREFIX: &str = "var";

/// 单个预定义变量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedVariable {
    /// 用户可见的名字
    pub name: String,
    /// 着色器中的标识符
    pub identifier: String,
}

impl PredefinedVariable {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

/// 预定义变量集合（有序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredefinedVariables {
    entries: Vec<PredefinedVariable>,
}

impl Default for PredefinedVariables {
    fn default() -> Self {
        Self {
            entries: vec![
                PredefinedVariable::new("time", "u_fParticleSystemTime"),
                PredefinedVariable::new("size", "u_fParticleSystemSize"),
                PredefinedVariable::new("index", "fParticleIndex"),
            ],
        }
    }
}

impl PredefinedVariables {
    pub fn new(entries: Vec<PredefinedVariable>) -> Self {
        Self { entries }
    }

    /// 名字是否为保留名
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// 查找名字对应的着色器标识符
    pub fn identifier(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.identifier.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PredefinedVariable> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 验证名字唯一、标识符合法且不会与用户变量标识符冲突
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "predefined variable name must not be empty".to_string(),
                ));
            }
            if !is_identifier(&entry.identifier) {
                return Err(ConfigError::ValidationError(format!(
                    "predefined identifier \"{}\" is not a valid shader identifier",
                    entry.identifier
                )));
            }
            if entry.identifier.starts_with(USER_VARIABLE_PREFIX) {
                return Err(ConfigError::ValidationError(format!(
                    "predefined identifier \"{}\" uses the reserved prefix \"{}\"",
                    entry.identifier, USER_VARIABLE_PREFIX
                )));
            }
            let duplicate = self.entries[..i]
                .iter()
                .any(|other| other.name == entry.name || other.identifier == entry.identifier);
            if duplicate {
                return Err(ConfigError::ValidationError(format!(
                    "predefined variable \"{}\" is declared twice",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}
