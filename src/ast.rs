//! # Query AST
//!
//! This module defines the typed syntax tree of a search query: the
//! expressions used in filters, projections and scoring formulas, and the
//! stages that chain them into a pipeline.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[literal]** - Typed literal payloads (scalars, bytes, vectors, lists, matrices)
//! - **[expressions]** - Expression nodes and their fluent builders
//! - **[operators]** - Unary, binary, ternary and N-ary operators
//! - **[functions]** - Engine-evaluated scoring functions
//! - **[stages]** - Pipeline stages (select, filter, sort, limit, topk, count, rerank)
//! - **[query]** - Finalized, validated stage sequence
//!
//! ## Quick Start
//!
//! ```
//! use topk_query::{field, r#match, select};
//!
//! let query = select([("title", field("title"))])
//!     .filter(r#match("love").field("summary"))
//!     .topk(field("score"), 10, true)
//!     .finalize()
//!     .unwrap();
//!
//! assert_eq!(query.stages().len(), 3);
//! ```
//!
//! ## Core Concepts
//!
//! ### Immutable Trees
//!
//! Every builder returns a new node. Children are reference counted, so an
//! expression such as `field("rank")` can be cloned into any number of queries.
//!
//! ### Coercion
//!
//! Binary builders take either an expression or a raw value. Raw values go
//! through [`coerce`](crate::coerce), which rejects shapes the operator cannot
//! use (a boolean in arithmetic, a list in `contains`, `NaN` anywhere) at
//! construction time.
//!
//! ```
//! use topk_query::{field, literal};
//!
//! assert_eq!(field("a").add(1).unwrap(), field("a").add(literal(1)).unwrap());
//! assert!(field("a").add(true).is_err());
//! ```
//!
//! ### Collectors
//!
//! A query materializes its output through exactly one collector:
//!
//! - **limit** `limit(k)` - first `k` documents
//! - **topk** `topk(expr, k, asc)` - `k` documents ordered by `expr`
//! - **count** `count()` - number of matching documents
//!
//! `sort` orders without bounding and must be followed by `limit`.
//!
//! ## Examples
//!
//! ### Range Filter
//!
//! ```text
//! filter((field("year") <= 1950i32) && (field("year") >= 1948i32)).limit(100)
//! ```
//!
//! ### Hybrid Scoring
//!
//! ```text
//! select(score: (vector_distance("embedding", f32[0.1, 0.2]) * bm25_score()))
//!     .filter(match("love", field: "summary"))
//!     .topk(field("score"), 10, desc)
//! ```
pub mod expressions;
pub mod functions;
pub mod literal;
pub mod operators;
pub mod query;
pub mod stages;

pub use expressions::{
    Expr, MAX_NARY_OPERANDS, REGEXP_FLAGS, TermMatch, abs, all, any, field, literal, max, min, not,
    r#match,
};
pub use functions::{FunctionExpr, VectorDistanceOptions, VectorQuery};
pub(crate) use literal::matrix_shape;
pub use literal::{
    List, ListType, Literal, Matrix, MatrixType, MatrixValues, SparseVector, Vector, VectorType,
};
pub use operators::{BinaryOp, NaryOp, TernaryOp, UnaryOp};
pub use query::Query;
pub use stages::{RerankOptions, Stage, StageKind};
