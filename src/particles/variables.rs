//! 有序变量表
//!
//! 声明顺序是变量表的显式属性：代码生成按此顺序逐条输出 `float` 声明，
//! 校验器据此检查"先声明后使用"。

use super::model::Expression;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 变量表操作错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariableTableError {
    #[error("variable \"{0}\" does not exist")]
    NotFound(String),
    #[error("variable \"{0}\" already exists")]
    AlreadyExists(String),
}

/// 保持插入顺序的 `名字 → 表达式` 映射
///
/// 序列化为普通的 JSON 对象，键按声明顺序输出。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableTable {
    entries: IndexMap<String, Expression>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入变量；名字已存在时原位替换表达式并返回旧值
    pub fn insert(&mut self, name: impl Into<String>, expression: Expression) -> Option<Expression> {
        self.entries.insert(name.into(), expression)
    }

    pub fn with(mut self, name: impl Into<String>, expression: impl Into<Expression>) -> Self {
        self.insert(name, expression.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Expression> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 变量的声明位置
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.get_index_of(name)
    }

    /// 删除变量，后续变量的位置前移
    pub fn remove(&mut self, name: &str) -> Option<Expression> {
        self.entries.shift_remove(name)
    }

    /// 重命名变量，位置保持不变
    ///
    /// 只修改声明本身；引用该变量的表达式由编辑器负责更新。
    pub fn rename(&mut self, from: &str, to: impl Into<String>) -> Result<(), VariableTableError> {
        let to = to.into();
        if from != to && self.contains(&to) {
            return Err(VariableTableError::AlreadyExists(to));
        }
        let index = self
            .position(from)
            .ok_or_else(|| VariableTableError::NotFound(from.to_string()))?;
        if let Some((_, expression)) = self.entries.shift_remove_index(index) {
            self.entries.shift_insert(index, to, expression);
        }
        Ok(())
    }

    /// 把变量移动到新的声明位置，超出末尾时移到最后
    pub fn move_to(&mut self, name: &str, index: usize) -> Result<(), VariableTableError> {
        let from = self
            .position(name)
            .ok_or_else(|| VariableTableError::NotFound(name.to_string()))?;
        let last = self.entries.len() - 1;
        self.entries.move_index(from, index.min(last));
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.entries
            .iter()
            .map(|(name, expression)| (name.as_str(), expression))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Expression)> {
        self.entries
            .iter_mut()
            .map(|(name, expression)| (name.as_str(), expression))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// 声明顺序是语义的一部分，`IndexMap` 自带的比较忽略顺序
impl PartialEq for VariableTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<N: Into<String>> FromIterator<(N, Expression)> for VariableTable {
    fn from_iter<I: IntoIterator<Item = (N, Expression)>>(iter: I) -> Self {
        let mut table = VariableTable::new();
        for (name, expression) in iter {
            table.insert(name, expression);
        }
        table
    }
}
