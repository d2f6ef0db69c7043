//! Wire representation of a query.
//!
//! Every node is a JSON object with a `"type"` discriminator and a typed
//! payload. Encoding a [`Query`] is infallible. Decoding a payload produced
//! elsewhere re-runs the construction checks (operand limits, regular
//! expressions, matrix shape) and pipeline validation, so a decoded `Query`
//! is as trustworthy as a built one.
//!
//! ```
//! use topk_query::{wire::WireQuery, Query};
//!
//! let query = topk_query::limit(10).finalize().unwrap();
//! let wire = WireQuery::from(&query);
//! assert_eq!(Query::try_from(wire).unwrap(), query);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::expressions::validate_regex;
use crate::ast::{
    BinaryOp, Expr, FunctionExpr, List, Literal, Matrix, MatrixType, NaryOp, Query, RerankOptions,
    SparseVector, Stage, TermMatch, TernaryOp, UnaryOp, Vector, VectorQuery,
};
use crate::coerce;
use crate::error::{CoercionError, ExprError, WireError};
use crate::pipeline;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireQuery {
    pub stages: Vec<WireStage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireStage {
    Select {
        exprs: Vec<WireProjection>,
    },
    Filter {
        expr: WireExpr,
    },
    Sort {
        expr: WireExpr,
        asc: bool,
    },
    Limit {
        k: u64,
    },
    #[serde(rename = "topk")]
    TopK {
        expr: WireExpr,
        k: u64,
        asc: bool,
    },
    Count,
    Rerank {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        #[serde(default)]
        fields: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        topk_multiple: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireProjection {
    pub name: String,
    pub expr: WireExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireExpr {
    Field {
        name: String,
    },
    Literal {
        value: WireLiteral,
    },
    Function {
        function: WireFunction,
    },
    Match {
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        weight: f32,
        all: bool,
    },
    Unary {
        op: UnaryOp,
        expr: Box<WireExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<WireExpr>,
        right: Box<WireExpr>,
    },
    Ternary {
        op: TernaryOp,
        x: Box<WireExpr>,
        y: Box<WireExpr>,
        z: Box<WireExpr>,
    },
    Nary {
        op: NaryOp,
        exprs: Vec<WireExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum WireLiteral {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Vector(Vector),
    SparseVector(SparseVector),
    List(List),
    Matrix(WireMatrix),
}

/// Row-major matrix; element values are carried as `f32` and narrowed to
/// `element` on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMatrix {
    pub num_cols: u32,
    pub element: MatrixType,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireFunction {
    Bm25Score,
    VectorDistance {
        field: String,
        query: VectorQuery,
        #[serde(default)]
        skip_refine: bool,
    },
    MultiVectorDistance {
        field: String,
        query: WireMatrix,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        candidates: Option<u32>,
    },
    SemanticSimilarity {
        field: String,
        query: String,
    },
}

// Encoding

impl From<&Query> for WireQuery {
    fn from(query: &Query) -> Self {
        let stages: Vec<WireStage> = query.stages().iter().map(WireStage::from).collect();
        trace!(stages = stages.len(), "encoded query");
        WireQuery { stages }
    }
}

impl From<&Stage> for WireStage {
    fn from(stage: &Stage) -> Self {
        match stage {
            Stage::Select { exprs } => WireStage::Select {
                exprs: exprs
                    .iter()
                    .map(|(name, expr)| WireProjection {
                        name: name.clone(),
                        expr: expr.into(),
                    })
                    .collect(),
            },
            Stage::Filter { expr } => WireStage::Filter { expr: expr.into() },
            Stage::Sort { expr, asc } => WireStage::Sort {
                expr: expr.into(),
                asc: *asc,
            },
            Stage::Limit { k } => WireStage::Limit { k: *k },
            Stage::TopK { expr, k, asc } => WireStage::TopK {
                expr: expr.into(),
                k: *k,
                asc: *asc,
            },
            Stage::Count => WireStage::Count,
            Stage::Rerank(options) => WireStage::Rerank {
                model: options.model.clone(),
                query: options.query.clone(),
                fields: options.fields.clone(),
                topk_multiple: options.topk_multiple,
            },
        }
    }
}

impl From<&Expr> for WireExpr {
    fn from(expr: &Expr) -> Self {
        let boxed = |e: &Arc<Expr>| Box::new(WireExpr::from(e.as_ref()));
        match expr {
            Expr::Field(name) => WireExpr::Field { name: name.clone() },
            Expr::Literal(lit) => WireExpr::Literal { value: lit.into() },
            Expr::Function(f) => WireExpr::Function { function: f.into() },
            Expr::Match(m) => WireExpr::Match {
                token: m.token.clone(),
                field: m.field.clone(),
                weight: m.weight,
                all: m.all,
            },
            Expr::Unary { op, expr } => WireExpr::Unary {
                op: *op,
                expr: boxed(expr),
            },
            Expr::Binary { op, left, right } => WireExpr::Binary {
                op: *op,
                left: boxed(left),
                right: boxed(right),
            },
            Expr::Ternary { op, x, y, z } => WireExpr::Ternary {
                op: *op,
                x: boxed(x),
                y: boxed(y),
                z: boxed(z),
            },
            Expr::Nary { op, exprs } => WireExpr::Nary {
                op: *op,
                exprs: exprs.iter().map(WireExpr::from).collect(),
            },
        }
    }
}

impl From<&Literal> for WireLiteral {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Null => WireLiteral::Null,
            Literal::Bool(b) => WireLiteral::Bool(*b),
            Literal::I32(n) => WireLiteral::I32(*n),
            Literal::I64(n) => WireLiteral::I64(*n),
            Literal::U32(n) => WireLiteral::U32(*n),
            Literal::U64(n) => WireLiteral::U64(*n),
            Literal::F32(n) => WireLiteral::F32(*n),
            Literal::F64(n) => WireLiteral::F64(*n),
            Literal::String(s) => WireLiteral::String(s.clone()),
            Literal::Bytes(b) => WireLiteral::Bytes(b.clone()),
            Literal::Vector(v) => WireLiteral::Vector(v.clone()),
            Literal::SparseVector(v) => WireLiteral::SparseVector(v.clone()),
            Literal::List(l) => WireLiteral::List(l.clone()),
            Literal::Matrix(m) => WireLiteral::Matrix(m.into()),
        }
    }
}

impl From<&Matrix> for WireMatrix {
    fn from(m: &Matrix) -> Self {
        WireMatrix {
            num_cols: m.num_cols(),
            element: m.matrix_type(),
            values: m.values().to_f32(),
        }
    }
}

impl From<&FunctionExpr> for WireFunction {
    fn from(f: &FunctionExpr) -> Self {
        match f {
            FunctionExpr::Bm25Score => WireFunction::Bm25Score,
            FunctionExpr::VectorDistance {
                field,
                query,
                skip_refine,
            } => WireFunction::VectorDistance {
                field: field.clone(),
                query: query.clone(),
                skip_refine: *skip_refine,
            },
            FunctionExpr::MultiVectorDistance {
                field,
                query,
                candidates,
            } => WireFunction::MultiVectorDistance {
                field: field.clone(),
                query: query.into(),
                candidates: *candidates,
            },
            FunctionExpr::SemanticSimilarity { field, query } => {
                WireFunction::SemanticSimilarity {
                    field: field.clone(),
                    query: query.clone(),
                }
            }
        }
    }
}

// Decoding

impl TryFrom<WireQuery> for Query {
    type Error = WireError;

    fn try_from(wire: WireQuery) -> Result<Self, WireError> {
        let stages = wire
            .stages
            .into_iter()
            .map(Stage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        pipeline::validate(&stages)?;
        trace!(stages = stages.len(), "decoded query");
        Ok(Query::new(stages))
    }
}

impl TryFrom<WireStage> for Stage {
    type Error = WireError;

    fn try_from(wire: WireStage) -> Result<Self, WireError> {
        Ok(match wire {
            WireStage::Select { exprs } => Stage::Select {
                exprs: exprs
                    .into_iter()
                    .map(|p| Ok((p.name, Expr::try_from(p.expr)?)))
                    .collect::<Result<_, WireError>>()?,
            },
            WireStage::Filter { expr } => Stage::Filter {
                expr: expr.try_into()?,
            },
            WireStage::Sort { expr, asc } => Stage::Sort {
                expr: expr.try_into()?,
                asc,
            },
            WireStage::Limit { k } => Stage::Limit { k },
            WireStage::TopK { expr, k, asc } => Stage::TopK {
                expr: expr.try_into()?,
                k,
                asc,
            },
            WireStage::Count => Stage::Count,
            WireStage::Rerank {
                model,
                query,
                fields,
                topk_multiple,
            } => Stage::Rerank(RerankOptions {
                model,
                query,
                fields,
                topk_multiple,
            }),
        })
    }
}

impl TryFrom<WireExpr> for Expr {
    type Error = WireError;

    fn try_from(wire: WireExpr) -> Result<Self, WireError> {
        let arc = |e: Box<WireExpr>| Expr::try_from(*e).map(Arc::new);
        Ok(match wire {
            WireExpr::Field { name } => Expr::Field(name),
            WireExpr::Literal { value } => Expr::Literal(value.try_into()?),
            WireExpr::Function { function } => Expr::Function(function.try_into()?),
            WireExpr::Match {
                token,
                field,
                weight,
                all,
            } => Expr::Match(TermMatch {
                token,
                field,
                weight,
                all,
            }),
            WireExpr::Unary { op, expr } => Expr::Unary {
                op,
                expr: arc(expr)?,
            },
            WireExpr::Binary { op, left, right } => Expr::Binary {
                op,
                left: arc(left)?,
                right: arc(right)?,
            },
            WireExpr::Ternary { op, x, y, z } => {
                let (x, y, z) = (arc(x)?, arc(y)?, arc(z)?);
                if op == TernaryOp::RegexpMatch {
                    check_regexp(&y, &z)?;
                }
                Expr::Ternary { op, x, y, z }
            }
            WireExpr::Nary { op, exprs } => {
                let exprs = exprs
                    .into_iter()
                    .map(Expr::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Expr::nary(op, exprs)?
            }
        })
    }
}

fn check_regexp(pattern: &Expr, flags: &Expr) -> Result<(), ExprError> {
    let not_literal = ExprError::RegexNotLiteral {
        op: TernaryOp::RegexpMatch.name(),
    };
    let Expr::Literal(Literal::String(pattern)) = pattern else {
        return Err(not_literal);
    };
    match flags {
        Expr::Literal(Literal::String(flags)) => validate_regex(pattern, Some(flags)),
        Expr::Literal(Literal::Null) => validate_regex(pattern, None),
        _ => Err(not_literal),
    }
}

impl TryFrom<WireLiteral> for Literal {
    type Error = WireError;

    fn try_from(wire: WireLiteral) -> Result<Self, WireError> {
        Ok(match wire {
            WireLiteral::Null => Literal::Null,
            WireLiteral::Bool(b) => Literal::Bool(b),
            WireLiteral::I32(n) => Literal::I32(n),
            WireLiteral::I64(n) => Literal::I64(n),
            WireLiteral::U32(n) => Literal::U32(n),
            WireLiteral::U64(n) => Literal::U64(n),
            WireLiteral::F32(n) => Literal::F32(n),
            WireLiteral::F64(n) => Literal::F64(n),
            WireLiteral::String(s) => Literal::String(s),
            WireLiteral::Bytes(b) => Literal::Bytes(b),
            WireLiteral::Vector(v) => Literal::Vector(v),
            WireLiteral::SparseVector(v) => Literal::SparseVector(normalize_sparse(v)?),
            WireLiteral::List(l) => Literal::List(l),
            WireLiteral::Matrix(m) => Literal::Matrix(m.try_into()?),
        })
    }
}

impl TryFrom<WireMatrix> for Matrix {
    type Error = WireError;

    fn try_from(wire: WireMatrix) -> Result<Self, WireError> {
        if wire.values.is_empty() {
            return Err(CoercionError::EmptyMatrix.into());
        }
        if wire.num_cols == 0 {
            return Err(CoercionError::EmptyRow { row: 0 }.into());
        }
        if wire.values.len() % wire.num_cols as usize != 0 {
            return Err(WireError::RaggedMatrix {
                len: wire.values.len(),
                num_cols: wire.num_cols,
            });
        }
        let values: Vec<Value> = wire
            .values
            .iter()
            .map(|&v| Value::Float(v as f64))
            .collect();
        let values = coerce::matrix_values(wire.element, values.iter())?;
        Ok(Matrix::from_parts(wire.num_cols, values))
    }
}

impl TryFrom<WireFunction> for FunctionExpr {
    type Error = WireError;

    fn try_from(wire: WireFunction) -> Result<Self, WireError> {
        Ok(match wire {
            WireFunction::Bm25Score => FunctionExpr::Bm25Score,
            WireFunction::VectorDistance {
                field,
                query,
                skip_refine,
            } => FunctionExpr::VectorDistance {
                field,
                query: match query {
                    VectorQuery::Sparse(v) => VectorQuery::Sparse(normalize_sparse(v)?),
                    dense => dense,
                },
                skip_refine,
            },
            WireFunction::MultiVectorDistance {
                field,
                query,
                candidates,
            } => FunctionExpr::MultiVectorDistance {
                field,
                query: query.try_into()?,
                candidates,
            },
            WireFunction::SemanticSimilarity { field, query } => {
                FunctionExpr::SemanticSimilarity { field, query }
            }
        })
    }
}

/// Re-sorts indices and checks that indices and values pair up.
fn normalize_sparse(v: SparseVector) -> Result<SparseVector, WireError> {
    let check = |indices: usize, values: usize| {
        if indices == values {
            Ok(())
        } else {
            Err(WireError::SparseLength { indices, values })
        }
    };
    Ok(match v {
        SparseVector::F32 { indices, values } => {
            check(indices.len(), values.len())?;
            SparseVector::f32(indices.into_iter().zip(values))
        }
        SparseVector::U8 { indices, values } => {
            check(indices.len(), values.len())?;
            SparseVector::u8(indices.into_iter().zip(values))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::field;

    #[test]
    fn test_stage_tags() {
        let json = serde_json::to_value(WireStage::TopK {
            expr: (&field("score")).into(),
            k: 10,
            asc: false,
        })
        .unwrap();
        assert_eq!(json["type"], "topk");
        assert_eq!(json["expr"]["type"], "field");
        assert_eq!(json["expr"]["name"], "score");
    }

    #[test]
    fn test_literal_tags() {
        let json = serde_json::to_value(WireLiteral::from(&Literal::I32(1))).unwrap();
        assert_eq!(json, serde_json::json!({"type": "i32", "value": 1}));
    }

    #[test]
    fn test_sparse_length_mismatch() {
        let v = SparseVector::F32 {
            indices: vec![1, 2],
            values: vec![1.0],
        };
        assert!(matches!(
            normalize_sparse(v),
            Err(WireError::SparseLength {
                indices: 2,
                values: 1
            })
        ));
    }
}
