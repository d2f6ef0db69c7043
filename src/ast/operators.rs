use std::fmt;

use serde::{Deserialize, Serialize};

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Logical negation
    Not,
    IsNull,
    IsNotNull,
    Abs,
    /// Natural logarithm
    Ln,
    Exp,
    Sqrt,
    Square,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Logical
    And,
    Or,

    // Comparison
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,

    // String and collection
    StartsWith,
    Contains,
    /// `left in right`, the operand-swapped form of `contains`
    In,
    MatchAll,
    MatchAny,

    /// Left operand unless null, otherwise right
    Coalesce,
}

/// Three-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TernaryOp {
    /// `x ? y : z`
    Choose,
    /// `x` matches pattern `y` with flags `z` (string or null)
    RegexpMatch,
}

/// Variadic boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NaryOp {
    All,
    Any,
}

impl UnaryOp {
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::IsNull => "is_null",
            UnaryOp::IsNotNull => "is_not_null",
            UnaryOp::Abs => "abs",
            UnaryOp::Ln => "ln",
            UnaryOp::Exp => "exp",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Square => "square",
        }
    }
}

impl BinaryOp {
    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Lte => "lte",
            BinaryOp::Gt => "gt",
            BinaryOp::Gte => "gte",
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Pow => "pow",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::StartsWith => "starts_with",
            BinaryOp::Contains => "contains",
            BinaryOp::In => "in",
            BinaryOp::MatchAll => "match_all",
            BinaryOp::MatchAny => "match_any",
            BinaryOp::Coalesce => "coalesce",
        }
    }

    /// Infix symbol, for operators rendered between their operands.
    pub fn symbol(self) -> Option<&'static str> {
        Some(match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            _ => return None,
        })
    }
}

impl TernaryOp {
    pub fn name(self) -> &'static str {
        match self {
            TernaryOp::Choose => "choose",
            TernaryOp::RegexpMatch => "regexp_match",
        }
    }
}

impl NaryOp {
    pub fn name(self) -> &'static str {
        match self {
            NaryOp::All => "all",
            NaryOp::Any => "any",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TernaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for NaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
