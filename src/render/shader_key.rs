//! 内容指纹
//!
//! 基于 SHA256 的 64 字符 hex 字符串：
//!
//! - 系统指纹：System 的规范 JSON（变量按声明顺序序列化），相同指纹意味着生成结果相同
//! - 源码指纹：生成的顶点/片元源码，宿主用它缓存已链接的着色器程序

use super::shader::ShaderSources;
use crate::core::error::{CompileError, CompileResult};
use crate::particles::System;
use sha2::{Digest, Sha256};
use std::fmt;

/// 内容指纹
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderKey {
    hash: String,
}

impl ShaderKey {
    /// 系统的指纹
    pub fn of_system(system: &System) -> CompileResult<Self> {
        let canonical = serde_json::to_vec(system).map_err(|e| {
            CompileError::InvalidStructure(format!("failed to serialize system: {}", e))
        })?;
        Ok(Self::from_bytes(&[canonical.as_slice()]))
    }

    /// 生成源码的指纹
    pub fn of_sources(sources: &ShaderSources) -> Self {
        // 分隔符避免 ("ab", "c") 与 ("a", "bc") 得到相同的指纹
        Self::from_bytes(&[
            sources.vertex.as_bytes(),
            &b"\0"[..],
            sources.fragment.as_bytes(),
        ])
    }

    fn from_bytes(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self {
            hash: hex::encode(hasher.finalize()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// 前 16 个字符，用于日志
    pub fn short(&self) -> &str {
        &self.hash[..16]
    }

    /// 缓存文件名，例如 `<hash>.glsl`
    pub fn cache_filename(&self, extension: &str) -> String {
        format!("{}.{}", self.hash, extension)
    }
}

impl fmt::Display for ShaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}
