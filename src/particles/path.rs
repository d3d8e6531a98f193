//! 节点路径
//!
//! 从系统根节点到某个表达式节点的结构化路径，诊断信息用它定位编辑器中需要高亮的节点。
//! 显示形式为以 `/` 连接的片段，例如 `variables/speed/parameters/1`、`mtxLocal/0/x`、`color/r`。

use super::model::{Axis, Channel, TransformScope};
use std::fmt;

/// 路径片段
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// 固定字段名（`variables`、`mtxLocal`、`parameters` ...）
    Field(&'static str),
    /// 映射键（变量名）
    Key(String),
    /// 列表下标
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(field) => f.write_str(field),
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// 指向系统中某个节点的路径
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// 系统根节点
    pub fn root() -> Self {
        Self::default()
    }

    /// 变量表中的一项
    pub fn variable(name: impl Into<String>) -> Self {
        Self::root().field("variables").key(name)
    }

    /// 局部或世界变换列表中的一项
    pub fn transformation(scope: TransformScope, index: usize) -> Self {
        Self::root().field(scope.field()).index(index)
    }

    /// 颜色节点
    pub fn color() -> Self {
        Self::root().field("color")
    }

    pub fn field(mut self, field: &'static str) -> Self {
        self.segments.push(PathSegment::Field(field));
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    pub fn axis(self, axis: Axis) -> Self {
        self.field(axis.name())
    }

    pub fn channel(self, channel: Channel) -> Self {
        self.field(channel.name())
    }

    /// 函数调用的第 `index` 个参数
    pub fn parameter(self, index: usize) -> Self {
        self.field("parameters").index(index)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
