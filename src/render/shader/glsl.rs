//! GLSL 渲染树
//!
//! 代码生成先构造结构化的表达式/语句，再统一渲染为文本，
//! 测试可以直接断言结构而不是匹配子串。

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlslExpr {
    /// 浮点字面量（已带小数点）
    Float(String),
    Int(i64),
    Ident(String),
    Negate(Box<GlslExpr>),
    /// 左结合链 `a op b op c`；`grouped` 时整条链外加一层括号
    Binary {
        op: BinaryOp,
        operands: Vec<GlslExpr>,
        grouped: bool,
    },
    Call {
        name: String,
        args: Vec<GlslExpr>,
    },
    Member(Box<GlslExpr>, &'static str),
}

impl GlslExpr {
    /// 浮点字面量：没有小数点时补 `.0`，避免被推断为整数
    pub fn float(value: f32) -> Self {
        GlslExpr::Float(format_float(value))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        GlslExpr::Ident(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<GlslExpr>) -> Self {
        GlslExpr::Call {
            name: name.into(),
            args,
        }
    }

    /// 带括号的左结合链
    pub fn group(op: BinaryOp, operands: Vec<GlslExpr>) -> Self {
        GlslExpr::Binary {
            op,
            operands,
            grouped: true,
        }
    }

    /// 不带括号的链，只用于操作数本身不会被拆开的场合
    pub fn chain(op: BinaryOp, operands: Vec<GlslExpr>) -> Self {
        GlslExpr::Binary {
            op,
            operands,
            grouped: false,
        }
    }

    pub fn negate(expr: GlslExpr) -> Self {
        GlslExpr::Negate(Box::new(expr))
    }

    pub fn member(expr: GlslExpr, member: &'static str) -> Self {
        GlslExpr::Member(Box::new(expr), member)
    }

    /// `mat4(...)`，按列主序给出 16 个元素
    pub fn mat4(elements: [GlslExpr; 16]) -> Self {
        GlslExpr::call("mat4", elements.into())
    }
}

impl fmt::Display for GlslExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlslExpr::Float(value) => f.write_str(value),
            GlslExpr::Int(value) => write!(f, "{}", value),
            GlslExpr::Ident(name) => f.write_str(name),
            GlslExpr::Negate(expr) => write!(f, "-{}", expr),
            GlslExpr::Binary {
                op,
                operands,
                grouped,
            } => {
                if *grouped {
                    f.write_str("(")?;
                }
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.symbol())?;
                    }
                    write!(f, "{}", operand)?;
                }
                if *grouped {
                    f.write_str(")")?;
                }
                Ok(())
            }
            GlslExpr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
            GlslExpr::Member(expr, member) => write!(f, "{}.{}", expr, member),
        }
    }
}

/// 浮点数格式化为 GLSL 字面量
pub fn format_float(value: f32) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslType {
    Float,
    Vec4,
    Mat4,
}

impl fmt::Display for GlslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlslType::Float => f.write_str("float"),
            GlslType::Vec4 => f.write_str("vec4"),
            GlslType::Mat4 => f.write_str("mat4"),
        }
    }
}

/// 局部变量声明 `<type> <name> = <value>;`
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub ty: GlslType,
    pub name: String,
    pub value: GlslExpr,
}

impl Declaration {
    pub fn new(ty: GlslType, name: impl Into<String>, value: GlslExpr) -> Self {
        Self {
            ty,
            name: name.into(),
            value,
        }
    }

    pub fn float(name: impl Into<String>, value: GlslExpr) -> Self {
        Self::new(GlslType::Float, name, value)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {};", self.ty, self.name, self.value)
    }
}

/// 按顺序渲染一组声明
///
/// 第一行不缩进（模板中的标记已经缩进），后续行以 `indent` 开头。
pub fn render_block(declarations: &[Declaration], indent: &str) -> String {
    let mut out = String::new();
    for (i, declaration) in declarations.iter().enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(indent);
        }
        out.push_str(&declaration.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_literal() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(1000.0), "1000.0");
    }

    #[test]
    fn test_grouped_chain() {
        let expr = GlslExpr::group(
            BinaryOp::Add,
            vec![GlslExpr::float(1.0), GlslExpr::float(2.0), GlslExpr::ident("x")],
        );
        assert_eq!(expr.to_string(), "(1.0 + 2.0 + x)");
    }

    #[test]
    fn test_nested_rendering() {
        let expr = GlslExpr::chain(
            BinaryOp::Add,
            vec![
                GlslExpr::chain(BinaryOp::Mul, vec![GlslExpr::ident("a"), GlslExpr::ident("b")]),
                GlslExpr::negate(GlslExpr::ident("c")),
            ],
        );
        assert_eq!(expr.to_string(), "a * b + -c");

        let call = GlslExpr::member(
            GlslExpr::call("texelFetch", vec![GlslExpr::ident("s"), GlslExpr::Int(0)]),
            "r",
        );
        assert_eq!(call.to_string(), "texelFetch(s, 0).r");
    }

    #[test]
    fn test_block() {
        let block = [
            Declaration::float("var0", GlslExpr::float(1.0)),
            Declaration::float("var1", GlslExpr::ident("var0")),
        ];
        assert_eq!(render_block(&block, "  "), "float var0 = 1.0;\n  float var1 = var0;");
        assert_eq!(render_block(&[], "  "), "");
    }
}
