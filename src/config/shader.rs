use super::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// 默认随机数纹理宽度
///
/// 随机数表按此宽度折行，保证纹理保持在常见的最大纹理尺寸之内。
pub const DEFAULT_RANDOM_TEXTURE_WIDTH: u32 = 1000;

/// 着色器生成配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// GLSL 版本（写入 `#version` 行）
    pub glsl_version: String,

    /// 随机数纹理宽度 `W`
    pub random_texture_width: u32,

    /// 随机数纹理采样器的 uniform 名称
    pub random_sampler: String,

    /// 粒子着色器总是启用的宏
    pub shader_define: String,

    /// 存在颜色表达式时启用的宏
    pub color_define: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            glsl_version: "300 es".to_string(),
            random_texture_width: DEFAULT_RANDOM_TEXTURE_WIDTH,
            random_sampler: "u_fParticleSystemRandomNumbers".to_string(),
            shader_define: "PARTICLE".to_string(),
            color_define: "PARTICLE_COLOR".to_string(),
        }
    }
}

impl ShaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.random_texture_width == 0 {
            return Err(ConfigError::ValidationError(
                "random_texture_width must be positive".to_string(),
            ));
        }
        // GL_MAX_TEXTURE_SIZE 在 WebGL2 上至少为 2048
        if self.random_texture_width > 2048 {
            return Err(ConfigError::ValidationError(format!(
                "random_texture_width {} exceeds the portable texture size 2048",
                self.random_texture_width
            )));
        }
        for (field, value) in [
            ("random_sampler", &self.random_sampler),
            ("shader_define", &self.shader_define),
            ("color_define", &self.color_define),
        ] {
            if !is_identifier(value) {
                return Err(ConfigError::ValidationError(format!(
                    "{} \"{}\" is not a valid shader identifier",
                    field, value
                )));
            }
        }
        if self.glsl_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "glsl_version must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// 判断字符串是否是合法的着色器标识符
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
