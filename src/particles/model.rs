//! 粒子效果表达式模型
//!
//! 表达式树（常量 / 变量 / 函数调用）以及引用它的容器结构：
//! 变量表、局部/世界变换列表、颜色。纯数据，只带形状判断和构造辅助。
//!
//! 持久化形态与编辑器保存的嵌套结构一致：
//!
//! ```text
//! { "function": "addition", "parameters": [ { "value": 1 }, { "value": "time" } ] }
//! { "transformation": "rotate", "y": { "value": 90 } }
//! { "r": { "value": 0.5 } }
//! ```

use super::variables::VariableTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 运算符（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    Power,
    /// 三次多项式 `(x, a, b, c, d)`
    Polynomial,
    SquareRoot,
    /// 以参数为索引查询随机数表
    Random,
    /// `(index, min, max)`
    RandomRange,
}

impl Operator {
    pub const ALL: [Operator; 10] = [
        Operator::Addition,
        Operator::Subtraction,
        Operator::Multiplication,
        Operator::Division,
        Operator::Modulo,
        Operator::Power,
        Operator::Polynomial,
        Operator::SquareRoot,
        Operator::Random,
        Operator::RandomRange,
    ];

    /// 最少参数个数
    pub fn min_arity(self) -> usize {
        match self {
            Operator::Addition
            | Operator::Subtraction
            | Operator::Multiplication
            | Operator::Division
            | Operator::Modulo
            | Operator::Power => 2,
            Operator::Polynomial => 5,
            Operator::SquareRoot | Operator::Random => 1,
            Operator::RandomRange => 3,
        }
    }

    /// 左结合的 n 元运算符会折叠全部参数；其余只读取固定位置的参数
    pub fn is_variadic(self) -> bool {
        matches!(
            self,
            Operator::Addition | Operator::Subtraction | Operator::Multiplication | Operator::Modulo
        )
    }

    /// 持久化与诊断信息中使用的名字
    pub fn name(self) -> &'static str {
        match self {
            Operator::Addition => "addition",
            Operator::Subtraction => "subtraction",
            Operator::Multiplication => "multiplication",
            Operator::Division => "division",
            Operator::Modulo => "modulo",
            Operator::Power => "power",
            Operator::Polynomial => "polynomial",
            Operator::SquareRoot => "squareRoot",
            Operator::Random => "random",
            Operator::RandomRange => "randomRange",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 表达式节点
///
/// 反序列化经过 `ExpressionShape`：`value` 为数字时是常量，为字符串时是变量，
/// 带有多余字段的节点直接报错。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "ExpressionShape")]
pub enum Expression {
    FunctionCall {
        #[serde(rename = "function")]
        operator: Operator,
        #[serde(default)]
        parameters: Vec<Expression>,
    },
    Constant {
        value: f32,
    },
    Variable {
        #[serde(rename = "value")]
        name: String,
    },
}

impl Expression {
    pub fn constant(value: f32) -> Self {
        Expression::Constant { value }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expression::Variable { name: name.into() }
    }

    pub fn call(operator: Operator, parameters: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            operator,
            parameters,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expression::Constant { .. })
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Expression::Variable { .. })
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Expression::FunctionCall { .. })
    }

    /// 深度优先访问树中所有变量引用
    pub fn for_each_variable<'a>(&'a self, visit: &mut impl FnMut(&'a str)) {
        match self {
            Expression::Variable { name } => visit(name),
            Expression::Constant { .. } => {}
            Expression::FunctionCall { parameters, .. } => {
                for parameter in parameters {
                    parameter.for_each_variable(visit);
                }
            }
        }
    }
}

/// 三种持久化形态，各自拒绝未知字段
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpressionShape {
    FunctionCall(FunctionCallShape),
    Constant(ConstantShape),
    Variable(VariableShape),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionCallShape {
    function: Operator,
    #[serde(default)]
    parameters: Vec<Expression>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstantShape {
    value: f32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VariableShape {
    value: String,
}

impl From<ExpressionShape> for Expression {
    fn from(shape: ExpressionShape) -> Self {
        match shape {
            ExpressionShape::FunctionCall(call) => Expression::call(call.function, call.parameters),
            ExpressionShape::Constant(constant) => Expression::constant(constant.value),
            ExpressionShape::Variable(variable) => Expression::variable(variable.value),
        }
    }
}

impl From<f32> for Expression {
    fn from(value: f32) -> Self {
        Expression::constant(value)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::constant(value as f32)
    }
}

impl From<&str> for Expression {
    fn from(name: &str) -> Self {
        Expression::variable(name)
    }
}

/// 坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// 变换类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformationKind {
    Translate,
    /// 角度以度为单位
    Rotate,
    Scale,
}

impl TransformationKind {
    /// 缺省分量取该变换的单位值
    pub fn identity(self) -> f32 {
        match self {
            TransformationKind::Translate | TransformationKind::Rotate => 0.0,
            TransformationKind::Scale => 1.0,
        }
    }
}

/// 单个变换
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    #[serde(rename = "transformation")]
    pub kind: TransformationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Expression>,
}

impl Transformation {
    pub fn new(kind: TransformationKind) -> Self {
        Self {
            kind,
            x: None,
            y: None,
            z: None,
        }
    }

    pub fn translate() -> Self {
        Self::new(TransformationKind::Translate)
    }

    pub fn rotate() -> Self {
        Self::new(TransformationKind::Rotate)
    }

    pub fn scale() -> Self {
        Self::new(TransformationKind::Scale)
    }

    /// 设置某个分量
    pub fn with(mut self, axis: Axis, expression: impl Into<Expression>) -> Self {
        *self.axis_mut(axis) = Some(expression.into());
        self
    }

    pub fn axis(&self, axis: Axis) -> Option<&Expression> {
        match axis {
            Axis::X => self.x.as_ref(),
            Axis::Y => self.y.as_ref(),
            Axis::Z => self.z.as_ref(),
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut Option<Expression> {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

/// 颜色通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    R,
    G,
    B,
    A,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];

    pub fn name(self) -> &'static str {
        match self {
            Channel::R => "r",
            Channel::G => "g",
            Channel::B => "b",
            Channel::A => "a",
        }
    }
}

/// 颜色表达式，缺省通道为 1
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorExpr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Expression>,
}

impl ColorExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Channel, expression: impl Into<Expression>) -> Self {
        *self.channel_mut(channel) = Some(expression.into());
        self
    }

    pub fn channel(&self, channel: Channel) -> Option<&Expression> {
        match channel {
            Channel::R => self.r.as_ref(),
            Channel::G => self.g.as_ref(),
            Channel::B => self.b.as_ref(),
            Channel::A => self.a.as_ref(),
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut Option<Expression> {
        match channel {
            Channel::R => &mut self.r,
            Channel::G => &mut self.g,
            Channel::B => &mut self.b,
            Channel::A => &mut self.a,
        }
    }
}

/// 变换列表所属的空间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformScope {
    Local,
    World,
}

impl TransformScope {
    pub const ALL: [TransformScope; 2] = [TransformScope::Local, TransformScope::World];

    /// 生成标识符时使用的后缀
    pub fn tag(self) -> &'static str {
        match self {
            TransformScope::Local => "Local",
            TransformScope::World => "World",
        }
    }

    /// 持久化字段名
    pub fn field(self) -> &'static str {
        match self {
            TransformScope::Local => "mtxLocal",
            TransformScope::World => "mtxWorld",
        }
    }
}

fn default_size() -> f32 {
    1.0
}

fn is_default_size(size: &f32) -> bool {
    *size == default_size()
}

/// 粒子系统描述（根节点）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    /// 用户变量表（按声明顺序）
    #[serde(default, skip_serializing_if = "VariableTable::is_empty")]
    pub variables: VariableTable,

    /// 局部变换列表
    #[serde(default, rename = "mtxLocal", skip_serializing_if = "Vec::is_empty")]
    pub local: Vec<Transformation>,

    /// 世界变换列表
    #[serde(default, rename = "mtxWorld", skip_serializing_if = "Vec::is_empty")]
    pub world: Vec<Transformation>,

    /// 粒子颜色
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorExpr>,

    /// 系统的名义大小，由宿主写入对应的 uniform
    #[serde(default = "default_size", skip_serializing_if = "is_default_size")]
    pub size: f32,
}

impl Default for System {
    fn default() -> Self {
        Self {
            variables: VariableTable::new(),
            local: Vec::new(),
            world: Vec::new(),
            color: None,
            size: default_size(),
        }
    }
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transformations(&self, scope: TransformScope) -> &[Transformation] {
        match scope {
            TransformScope::Local => &self.local,
            TransformScope::World => &self.world,
        }
    }

    pub fn transformations_mut(&mut self, scope: TransformScope) -> &mut Vec<Transformation> {
        match scope {
            TransformScope::Local => &mut self.local,
            TransformScope::World => &mut self.world,
        }
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }
}
