use std::sync::Arc;

use regex::RegexBuilder;

use crate::ast::{BinaryOp, FunctionExpr, Literal, NaryOp, TernaryOp, UnaryOp};
use crate::coerce::{self, Operand};
use crate::error::{Expected, ExprError};

/// Maximum number of operands of an `all`/`any` node.
pub const MAX_NARY_OPERANDS: usize = 32;

/// Regular expression flags understood by the engine.
pub const REGEXP_FLAGS: &str = "imsxU";

/// Expression tree node.
///
/// Nodes are immutable. Builder methods consume the receiver and return a new
/// node; child nodes are shared behind [`Arc`], so cloning an expression to
/// reuse it in several queries is cheap.
///
/// Equality is structural: `field("a") == field("a")`, while
/// `field("a") != literal("a")`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Document field reference, including the reserved `_id`
    Field(String),

    Literal(Literal),

    Function(FunctionExpr),

    /// Keyword match against text-indexed fields
    Match(TermMatch),

    Unary {
        op: UnaryOp,
        expr: Arc<Expr>,
    },

    Binary {
        op: BinaryOp,
        left: Arc<Expr>,
        right: Arc<Expr>,
    },

    Ternary {
        op: TernaryOp,
        x: Arc<Expr>,
        y: Arc<Expr>,
        z: Arc<Expr>,
    },

    /// At most [`MAX_NARY_OPERANDS`] operands
    Nary {
        op: NaryOp,
        exprs: Vec<Expr>,
    },
}

/// Text match of a single token.
///
/// Without a field the token is matched against every text-indexed field.
#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    pub token: String,
    pub field: Option<String>,
    pub weight: f32,
    /// Every term of `token` must match
    pub all: bool,
}

impl TermMatch {
    pub fn new(token: impl Into<String>) -> Self {
        TermMatch {
            token: token.into(),
            field: None,
            weight: 1.0,
            all: false,
        }
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }
}

impl From<TermMatch> for Expr {
    fn from(m: TermMatch) -> Self {
        Expr::Match(m)
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}

impl From<FunctionExpr> for Expr {
    fn from(f: FunctionExpr) -> Self {
        Expr::Function(f)
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }
}

impl Expr {
    fn unary(self, op: UnaryOp) -> Expr {
        Expr::Unary {
            op,
            expr: Arc::new(self),
        }
    }

    pub(crate) fn binary(self, op: BinaryOp, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Arc::new(self),
            right: Arc::new(right),
        }
    }

    fn coerced(
        self,
        op: BinaryOp,
        other: impl Into<Operand>,
        expected: Expected,
    ) -> Result<Expr, ExprError> {
        let right = coerce::operand(other.into(), expected)?;
        Ok(self.binary(op, right))
    }

    // Unary

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }

    pub fn is_null(self) -> Expr {
        self.unary(UnaryOp::IsNull)
    }

    pub fn is_not_null(self) -> Expr {
        self.unary(UnaryOp::IsNotNull)
    }

    pub fn abs(self) -> Expr {
        self.unary(UnaryOp::Abs)
    }

    pub fn ln(self) -> Expr {
        self.unary(UnaryOp::Ln)
    }

    pub fn exp(self) -> Expr {
        self.unary(UnaryOp::Exp)
    }

    pub fn sqrt(self) -> Expr {
        self.unary(UnaryOp::Sqrt)
    }

    pub fn square(self) -> Expr {
        self.unary(UnaryOp::Square)
    }

    // Logical

    pub fn and(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::And, other, Expected::Boolish)
    }

    pub fn or(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Or, other, Expected::Boolish)
    }

    // Comparison

    #[allow(clippy::should_implement_trait)]
    pub fn eq(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Eq, other, Expected::Comparable)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn ne(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Ne, other, Expected::Comparable)
    }

    pub fn lt(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Lt, other, Expected::Ordered)
    }

    pub fn lte(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Lte, other, Expected::Ordered)
    }

    pub fn gt(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Gt, other, Expected::Ordered)
    }

    pub fn gte(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Gte, other, Expected::Ordered)
    }

    // Arithmetic

    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Add, other, Expected::Numeric)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Sub, other, Expected::Numeric)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Mul, other, Expected::Numeric)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn div(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Div, other, Expected::Numeric)
    }

    pub fn pow(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Pow, other, Expected::Numeric)
    }

    pub fn min(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Min, other, Expected::Ordered)
    }

    pub fn max(self, other: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Max, other, Expected::Ordered)
    }

    /// `self` unless it is null, otherwise `default`.
    pub fn coalesce(self, default: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Coalesce, default, Expected::Numeric)
    }

    // String and collection

    pub fn starts_with(self, prefix: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::StartsWith, prefix, Expected::Stringy)
    }

    /// `self` (a string or list field) contains `item`.
    pub fn contains(self, item: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::Contains, item, Expected::Flexible)
    }

    /// `self` is an element of `collection`, i.e. `collection.contains(self)`.
    pub fn is_in(self, collection: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::In, collection, Expected::Iterable)
    }

    /// Every token of `tokens` (a string or string list) matches `self`.
    pub fn match_all(self, tokens: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::MatchAll, tokens, Expected::Text)
    }

    /// At least one token of `tokens` matches `self`.
    pub fn match_any(self, tokens: impl Into<Operand>) -> Result<Expr, ExprError> {
        self.coerced(BinaryOp::MatchAny, tokens, Expected::Text)
    }

    /// Matches `self` against `pattern`. Flags are drawn from [`REGEXP_FLAGS`].
    pub fn regexp_match(self, pattern: &str, flags: Option<&str>) -> Result<Expr, ExprError> {
        validate_regex(pattern, flags)?;
        let flags = match flags {
            Some(flags) => Literal::String(flags.to_string()),
            None => Literal::Null,
        };
        Ok(Expr::Ternary {
            op: TernaryOp::RegexpMatch,
            x: Arc::new(self),
            y: Arc::new(Expr::Literal(Literal::String(pattern.to_string()))),
            z: Arc::new(Expr::Literal(flags)),
        })
    }

    // Conditional

    /// `then` where `self` holds, `otherwise` elsewhere.
    pub fn choose(
        self,
        then: impl Into<Operand>,
        otherwise: impl Into<Operand>,
    ) -> Result<Expr, ExprError> {
        let y = coerce::operand(then.into(), Expected::Comparable)?;
        let z = coerce::operand(otherwise.into(), Expected::Comparable)?;
        Ok(Expr::Ternary {
            op: TernaryOp::Choose,
            x: Arc::new(self),
            y: Arc::new(y),
            z: Arc::new(z),
        })
    }

    /// Multiplies `self` by `factor` where `condition` holds.
    ///
    /// Built as `self * condition.choose(factor, 1)`.
    pub fn boost(
        self,
        condition: impl Into<Operand>,
        factor: impl Into<Operand>,
    ) -> Result<Expr, ExprError> {
        let condition = coerce::operand(condition.into(), Expected::Boolish)?;
        let factor = coerce::operand(factor.into(), Expected::Numeric)?;
        self.mul(condition.choose(factor, 1)?)
    }

    /// Builds an N-ary node, rejecting more than [`MAX_NARY_OPERANDS`] operands.
    pub fn nary(op: NaryOp, exprs: Vec<Expr>) -> Result<Expr, ExprError> {
        if exprs.len() > MAX_NARY_OPERANDS {
            return Err(ExprError::TooManyOperands {
                op,
                count: exprs.len(),
                max: MAX_NARY_OPERANDS,
            });
        }
        Ok(Expr::Nary { op, exprs })
    }

    /// Visits this node and every descendant, parents first.
    pub fn walk<'a, F: FnMut(&'a Expr)>(&'a self, f: &mut F) {
        f(self);
        match self {
            Expr::Unary { expr, .. } => expr.walk(f),
            Expr::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Expr::Ternary { x, y, z, .. } => {
                x.walk(f);
                y.walk(f);
                z.walk(f);
            }
            Expr::Nary { exprs, .. } => exprs.iter().for_each(|e| e.walk(f)),
            Expr::Field(_) | Expr::Literal(_) | Expr::Function(_) | Expr::Match(_) => {}
        }
    }
}

/// Checks that `pattern` compiles with `flags`.
pub(crate) fn validate_regex(pattern: &str, flags: Option<&str>) -> Result<(), ExprError> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.unwrap_or_default().chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'U' => builder.swap_greed(true),
            other => return Err(ExprError::InvalidRegexFlag(other)),
        };
    }
    builder
        .build()
        .map(|_| ())
        .map_err(|e| ExprError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

// Free builders

/// Reference to a document field.
pub fn field(name: impl Into<String>) -> Expr {
    Expr::Field(name.into())
}

/// Explicit literal.
pub fn literal(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

/// Text match of `token`, see [`TermMatch`].
pub fn r#match(token: impl Into<String>) -> TermMatch {
    TermMatch::new(token)
}

pub fn not(expr: impl Into<Expr>) -> Expr {
    expr.into().not()
}

pub fn abs(expr: impl Into<Expr>) -> Expr {
    expr.into().abs()
}

/// Conjunction of boolean operands.
pub fn all<O: Into<Operand>>(operands: impl IntoIterator<Item = O>) -> Result<Expr, ExprError> {
    Expr::nary(NaryOp::All, boolish(operands)?)
}

/// Disjunction of boolean operands.
pub fn any<O: Into<Operand>>(operands: impl IntoIterator<Item = O>) -> Result<Expr, ExprError> {
    Expr::nary(NaryOp::Any, boolish(operands)?)
}

fn boolish<O: Into<Operand>>(
    operands: impl IntoIterator<Item = O>,
) -> Result<Vec<Expr>, ExprError> {
    operands
        .into_iter()
        .enumerate()
        .map(|(i, op)| {
            coerce::operand(op.into(), Expected::Boolish).map_err(|e| ExprError::from(e.at(i)))
        })
        .collect()
}

pub fn min(left: impl Into<Operand>, right: impl Into<Operand>) -> Result<Expr, ExprError> {
    coerce::operand(left.into(), Expected::Ordered)?.min(right)
}

pub fn max(left: impl Into<Operand>, right: impl Into<Operand>) -> Result<Expr, ExprError> {
    coerce::operand(left.into(), Expected::Ordered)?.max(right)
}
