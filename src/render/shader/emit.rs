//! 表达式、变量块、变换矩阵和颜色的代码生成
//!
//! 输入是已经解析过的系统：所有变量名都是合法的着色器标识符。

use super::glsl::{BinaryOp, Declaration, GlslExpr, GlslType};
use crate::config::shader::{is_identifier, ShaderConfig};
use crate::core::error::{CompileError, CompileResult};
use crate::particles::{
    Axis, Channel, ColorExpr, Expression, Operator, TransformScope, Transformation,
    TransformationKind, VariableTable,
};

/// 一个变换列表生成的代码：旋转用的三角函数局部变量，以及合成后的矩阵声明
#[derive(Debug, Clone, PartialEq)]
pub struct TransformBlock {
    pub trig: Vec<Declaration>,
    pub matrix: Declaration,
}

impl TransformBlock {
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.trig.iter().chain(std::iter::once(&self.matrix))
    }
}

/// 矩阵变量名，例如 `mtxLocal`
pub fn matrix_name(scope: TransformScope) -> String {
    format!("mtx{}", scope.tag())
}

fn trig_name(function: &str, axis: Axis, scope: TransformScope, index: usize) -> String {
    format!(
        "f{}{}{}{}",
        function,
        axis.name().to_ascii_uppercase(),
        scope.tag(),
        index
    )
}

/// 代码生成器
pub struct Emitter<'a> {
    config: &'a ShaderConfig,
}

impl<'a> Emitter<'a> {
    pub fn new(config: &'a ShaderConfig) -> Self {
        Self { config }
    }

    pub fn expression(&self, expression: &Expression) -> CompileResult<GlslExpr> {
        match expression {
            Expression::Constant { value } => {
                if !value.is_finite() {
                    return Err(CompileError::InvalidStructure(format!(
                        "constant {} is not a finite number",
                        value
                    )));
                }
                Ok(GlslExpr::float(*value))
            }
            Expression::Variable { name } => {
                if !is_identifier(name) {
                    return Err(CompileError::InvalidStructure(format!(
                        "variable \"{}\" has not been resolved to an identifier",
                        name
                    )));
                }
                Ok(GlslExpr::ident(name.as_str()))
            }
            Expression::FunctionCall {
                operator,
                parameters,
            } => {
                if parameters.len() < operator.min_arity() {
                    return Err(CompileError::InvalidStructure(format!(
                        "{} needs at least {} parameters, got {}",
                        operator,
                        operator.min_arity(),
                        parameters.len()
                    )));
                }
                let args = parameters
                    .iter()
                    .map(|parameter| self.expression(parameter))
                    .collect::<CompileResult<Vec<_>>>()?;
                self.function(*operator, args)
            }
        }
    }

    fn function(&self, operator: Operator, args: Vec<GlslExpr>) -> CompileResult<GlslExpr> {
        let missing = || {
            CompileError::InvalidStructure(format!(
                "{} is missing a positional parameter",
                operator
            ))
        };
        let mut args = args.into_iter();
        let expr = match operator {
            Operator::Addition => GlslExpr::group(BinaryOp::Add, args.collect()),
            Operator::Subtraction => GlslExpr::group(BinaryOp::Sub, args.collect()),
            Operator::Multiplication => GlslExpr::group(BinaryOp::Mul, args.collect()),
            Operator::Division => GlslExpr::group(BinaryOp::Div, args.take(2).collect()),
            Operator::Modulo => {
                let first = args.next().ok_or_else(missing)?;
                args.fold(first, |accumulator, value| {
                    GlslExpr::call("mod", vec![accumulator, value])
                })
            }
            Operator::Power => GlslExpr::call("pow", args.take(2).collect()),
            Operator::Polynomial => {
                let (Some(x), Some(a), Some(b), Some(c), Some(d)) =
                    (args.next(), args.next(), args.next(), args.next(), args.next())
                else {
                    return Err(missing());
                };
                let power = |exponent: f32| {
                    GlslExpr::call("pow", vec![x.clone(), GlslExpr::float(exponent)])
                };
                GlslExpr::group(
                    BinaryOp::Add,
                    vec![
                        GlslExpr::chain(BinaryOp::Mul, vec![a, power(3.0)]),
                        GlslExpr::chain(BinaryOp::Mul, vec![b, power(2.0)]),
                        GlslExpr::chain(BinaryOp::Mul, vec![c, x.clone()]),
                        d,
                    ],
                )
            }
            Operator::SquareRoot => GlslExpr::call("sqrt", args.take(1).collect()),
            Operator::Random => self.random(args.next().ok_or_else(missing)?),
            Operator::RandomRange => {
                let (Some(index), Some(min), Some(max)) = (args.next(), args.next(), args.next())
                else {
                    return Err(missing());
                };
                GlslExpr::group(
                    BinaryOp::Add,
                    vec![
                        GlslExpr::chain(
                            BinaryOp::Mul,
                            vec![
                                self.random(index),
                                GlslExpr::group(BinaryOp::Sub, vec![max, min.clone()]),
                            ],
                        ),
                        min,
                    ],
                )
            }
        };
        Ok(expr)
    }

    /// 随机数表查询：`texelFetch(sampler, ivec2(mod(i, W), i / W), 0).r`
    fn random(&self, index: GlslExpr) -> GlslExpr {
        let width = GlslExpr::float(self.config.random_texture_width as f32);
        let texel = GlslExpr::call(
            "ivec2",
            vec![
                GlslExpr::call("mod", vec![index.clone(), width.clone()]),
                GlslExpr::group(BinaryOp::Div, vec![index, width]),
            ],
        );
        GlslExpr::member(
            GlslExpr::call(
                "texelFetch",
                vec![
                    GlslExpr::ident(self.config.random_sampler.as_str()),
                    texel,
                    GlslExpr::Int(0),
                ],
            ),
            "r",
        )
    }

    /// 每个变量一条 `float` 声明，按声明顺序
    pub fn variables(&self, table: &VariableTable) -> CompileResult<Vec<Declaration>> {
        table
            .iter()
            .map(|(name, expression)| {
                if !is_identifier(name) {
                    return Err(CompileError::InvalidStructure(format!(
                        "variable \"{}\" has not been resolved to an identifier",
                        name
                    )));
                }
                Ok(Declaration::float(name, self.expression(expression)?))
            })
            .collect()
    }

    /// 变换列表；空列表不生成任何代码
    pub fn transformations(
        &self,
        transformations: &[Transformation],
        scope: TransformScope,
    ) -> CompileResult<Option<TransformBlock>> {
        if transformations.is_empty() {
            return Ok(None);
        }

        let mut trig = Vec::new();
        let mut matrices = Vec::with_capacity(transformations.len());
        for (index, transformation) in transformations.iter().enumerate() {
            let matrix = match transformation.kind {
                TransformationKind::Rotate => {
                    for axis in Axis::ALL {
                        trig.extend(self.trig_locals(transformation, axis, scope, index)?);
                    }
                    rotation_matrix(scope, index)
                }
                TransformationKind::Translate => {
                    let [x, y, z] = self.components(transformation)?;
                    let (zero, one) = (GlslExpr::float(0.0), GlslExpr::float(1.0));
                    GlslExpr::mat4([
                        one.clone(), zero.clone(), zero.clone(), zero.clone(),
                        zero.clone(), one.clone(), zero.clone(), zero.clone(),
                        zero.clone(), zero.clone(), one.clone(), zero,
                        x, y, z, one,
                    ])
                }
                TransformationKind::Scale => {
                    let [x, y, z] = self.components(transformation)?;
                    let (zero, one) = (GlslExpr::float(0.0), GlslExpr::float(1.0));
                    GlslExpr::mat4([
                        x, zero.clone(), zero.clone(), zero.clone(),
                        zero.clone(), y, zero.clone(), zero.clone(),
                        zero.clone(), zero.clone(), z, zero.clone(),
                        zero.clone(), zero.clone(), zero, one,
                    ])
                }
            };
            matrices.push(matrix);
        }

        let value = if matrices.len() == 1 {
            matrices.swap_remove(0)
        } else {
            GlslExpr::chain(BinaryOp::Mul, matrices)
        };
        Ok(Some(TransformBlock {
            trig,
            matrix: Declaration::new(GlslType::Mat4, matrix_name(scope), value),
        }))
    }

    /// 三个分量的表达式，缺省取变换的单位值
    fn components(&self, transformation: &Transformation) -> CompileResult<[GlslExpr; 3]> {
        let identity = transformation.kind.identity();
        let component = |axis: Axis| -> CompileResult<GlslExpr> {
            match transformation.axis(axis) {
                Some(expression) => self.expression(expression),
                None => Ok(GlslExpr::float(identity)),
            }
        };
        Ok([component(Axis::X)?, component(Axis::Y)?, component(Axis::Z)?])
    }

    /// 角度只求值一次：先转为弧度，再分别求正弦和余弦
    fn trig_locals(
        &self,
        transformation: &Transformation,
        axis: Axis,
        scope: TransformScope,
        index: usize,
    ) -> CompileResult<Vec<Declaration>> {
        let sin = trig_name("Sin", axis, scope, index);
        let cos = trig_name("Cos", axis, scope, index);
        let Some(angle) = transformation.axis(axis) else {
            return Ok(vec![
                Declaration::float(sin, GlslExpr::float(0.0)),
                Declaration::float(cos, GlslExpr::float(1.0)),
            ]);
        };
        let radians = trig_name("Rad", axis, scope, index);
        Ok(vec![
            Declaration::float(
                radians.as_str(),
                GlslExpr::call("radians", vec![self.expression(angle)?]),
            ),
            Declaration::float(sin, GlslExpr::call("sin", vec![GlslExpr::ident(radians.as_str())])),
            Declaration::float(cos, GlslExpr::call("cos", vec![GlslExpr::ident(radians)])),
        ])
    }

    /// `vec4(r, g, b, a)`，缺省通道为 1.0
    pub fn color(&self, color: &ColorExpr) -> CompileResult<GlslExpr> {
        let args = Channel::ALL
            .iter()
            .map(|channel| match color.channel(*channel) {
                Some(expression) => self.expression(expression),
                None => Ok(GlslExpr::float(1.0)),
            })
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(GlslExpr::call("vec4", args))
    }
}

/// Z·Y·X 欧拉角旋转矩阵，使用预先计算的三角函数局部变量
fn rotation_matrix(scope: TransformScope, index: usize) -> GlslExpr {
    let var = |function: &str, axis: Axis| GlslExpr::ident(trig_name(function, axis, scope, index));
    let (sx, cx) = (var("Sin", Axis::X), var("Cos", Axis::X));
    let (sy, cy) = (var("Sin", Axis::Y), var("Cos", Axis::Y));
    let (sz, cz) = (var("Sin", Axis::Z), var("Cos", Axis::Z));
    let mul = |factors: Vec<&GlslExpr>| {
        GlslExpr::chain(BinaryOp::Mul, factors.into_iter().cloned().collect())
    };
    let (zero, one) = (GlslExpr::float(0.0), GlslExpr::float(1.0));

    GlslExpr::mat4([
        mul(vec![&cz, &cy]),
        mul(vec![&sz, &cy]),
        GlslExpr::negate(sy.clone()),
        zero.clone(),
        GlslExpr::chain(BinaryOp::Sub, vec![mul(vec![&cz, &sy, &sx]), mul(vec![&sz, &cx])]),
        GlslExpr::chain(BinaryOp::Add, vec![mul(vec![&sz, &sy, &sx]), mul(vec![&cz, &cx])]),
        mul(vec![&cy, &sx]),
        zero.clone(),
        GlslExpr::chain(BinaryOp::Add, vec![mul(vec![&cz, &sy, &cx]), mul(vec![&sz, &sx])]),
        GlslExpr::chain(BinaryOp::Sub, vec![mul(vec![&sz, &sy, &cx]), mul(vec![&cz, &sx])]),
        mul(vec![&cy, &cx]),
        zero.clone(),
        zero.clone(),
        zero.clone(),
        zero,
        one,
    ])
}
