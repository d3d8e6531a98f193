//! 着色器模板
//!
//! 模板是宿主提供的固定源码，生成的片段通过 `/*$name*/` 形式的标记代入。
//! 每个标记的所有出现位置都会被替换。

use crate::core::error::{CompileError, CompileResult};

/// `#version` 行和特性宏定义
pub const HEADER: &str = "/*$header*/";
/// 变量声明块
pub const VARIABLES: &str = "/*$variables*/";
/// 局部变换矩阵的声明
pub const MTX_LOCAL: &str = "/*$mtxLocal*/";
/// 世界变换矩阵的声明
pub const MTX_WORLD: &str = "/*$mtxWorld*/";
/// 存在世界变换时替换为 `mtxWorld * `
pub const APPLY_MTX_WORLD: &str = "/*$applyMtxWorld*/";
/// 存在局部变换时替换为 ` * mtxLocal`
pub const APPLY_MTX_LOCAL: &str = "/*$applyMtxLocal*/";
/// 颜色表达式
pub const COLOR: &str = "/*$color*/";
/// 颜色宏的名字
pub const COLOR_DEFINE: &str = "/*$colorDefine*/";
/// 随机数纹理采样器的名字
pub const RANDOM_SAMPLER: &str = "/*$randomSampler*/";

/// 顶点模板必须包含的标记
pub const REQUIRED_VERTEX_MARKERS: [&str; 7] = [
    HEADER,
    VARIABLES,
    MTX_LOCAL,
    MTX_WORLD,
    APPLY_MTX_WORLD,
    APPLY_MTX_LOCAL,
    COLOR,
];

/// 片元模板必须包含的标记
pub const REQUIRED_FRAGMENT_MARKERS: [&str; 1] = [HEADER];

const DEFAULT_VERTEX: &str = r#"/*$header*/

uniform mat4 u_mtxMeshToWorld;
uniform mat4 u_mtxWorldToView;
uniform vec3 u_vctCamera;
uniform mat3 u_mtxPivot;

in vec3 a_vctPosition;
in vec2 a_vctTexture;
out vec2 v_vctTexture;

#if defined(/*$colorDefine*/)
out vec4 v_vctColor;
#endif

uniform float u_fParticleSystemSize;
uniform float u_fParticleSystemTime;
uniform sampler2D /*$randomSampler*/;

uniform bool u_bParticleSystemFaceCamera;
uniform bool u_bParticleSystemRestrict;

mat4 lookAt(vec3 _vctTranslation, vec3 _vctTarget) {
  vec3 vctUp = vec3(0.0, 1.0, 0.0);
  vec3 zAxis = normalize(_vctTarget - _vctTranslation);
  vec3 xAxis = normalize(cross(vctUp, zAxis));
  vec3 yAxis = u_bParticleSystemRestrict ? vctUp : normalize(cross(zAxis, xAxis));
  zAxis = u_bParticleSystemRestrict ? normalize(cross(xAxis, vctUp)) : zAxis;

  return mat4(
    xAxis.x, xAxis.y, xAxis.z, 0.0,
    yAxis.x, yAxis.y, yAxis.z, 0.0,
    zAxis.x, zAxis.y, zAxis.z, 0.0,
    _vctTranslation.x, _vctTranslation.y, _vctTranslation.z, 1.0
  );
}

void main() {
  vec4 vctPosition = vec4(a_vctPosition, 1.0);
  float fParticleIndex = float(gl_InstanceID);

  /*$variables*/
  /*$mtxLocal*/
  /*$mtxWorld*/

  mat4 mtxMeshToWorld = /*$applyMtxWorld*/u_mtxMeshToWorld/*$applyMtxLocal*/;
  if (u_bParticleSystemFaceCamera) {
    mtxMeshToWorld =
      lookAt(vec3(mtxMeshToWorld[3][0], mtxMeshToWorld[3][1], mtxMeshToWorld[3][2]), u_vctCamera) *
      mat4(
        length(vec3(mtxMeshToWorld[0][0], mtxMeshToWorld[1][0], mtxMeshToWorld[2][0])), 0.0, 0.0, 0.0,
        0.0, length(vec3(mtxMeshToWorld[0][1], mtxMeshToWorld[1][1], mtxMeshToWorld[2][1])), 0.0, 0.0,
        0.0, 0.0, length(vec3(mtxMeshToWorld[0][2], mtxMeshToWorld[1][2], mtxMeshToWorld[2][2])), 0.0,
        0.0, 0.0, 0.0, 1.0
      );
  }

  gl_Position = u_mtxWorldToView * mtxMeshToWorld * vctPosition;
  v_vctTexture = vec2(u_mtxPivot * vec3(a_vctTexture, 1.0)).xy;
#if defined(/*$colorDefine*/)
  v_vctColor = /*$color*/;
#endif
}
"#;

const DEFAULT_FRAGMENT: &str = r#"/*$header*/

precision mediump float;

uniform vec4 u_vctColor;
uniform sampler2D u_texture;

in vec2 v_vctTexture;
#if defined(/*$colorDefine*/)
in vec4 v_vctColor;
#endif

out vec4 vctFrag;

void main() {
  vctFrag = u_vctColor * texture(u_texture, v_vctTexture);
#if defined(/*$colorDefine*/)
  vctFrag *= v_vctColor;
#endif

  if (vctFrag.a < 0.01)
    discard;
}
"#;

/// 顶点/片元模板对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderTemplates {
    vertex: String,
    fragment: String,
}

impl Default for ShaderTemplates {
    fn default() -> Self {
        Self {
            vertex: DEFAULT_VERTEX.to_string(),
            fragment: DEFAULT_FRAGMENT.to_string(),
        }
    }
}

impl ShaderTemplates {
    /// 使用宿主提供的模板；缺少必需标记时失败
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> CompileResult<Self> {
        let templates = Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        };
        check_markers(&templates.vertex, &REQUIRED_VERTEX_MARKERS)?;
        check_markers(&templates.fragment, &REQUIRED_FRAGMENT_MARKERS)?;
        Ok(templates)
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }
}

fn check_markers(template: &str, markers: &[&str]) -> CompileResult<()> {
    match markers.iter().find(|marker| !template.contains(**marker)) {
        Some(marker) => Err(CompileError::Template((*marker).to_string())),
        None => Ok(()),
    }
}

/// 依次代入 `(标记, 文本)`
pub fn substitute(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |source, (marker, value)| {
            source.replace(marker, value)
        })
}
