//! Scoring function builders.
//!
//! ```
//! use topk_query::fns;
//! use topk_query::ast::Vector;
//!
//! let score = fns::vector_distance("embedding", Vector::f32([0.1, 0.2]), Default::default())
//!     .mul(fns::bm25_score())
//!     .unwrap();
//! ```

use crate::ast::{Expr, FunctionExpr, Matrix, VectorDistanceOptions, VectorQuery};

/// BM25 score. The engine rejects it unless the filter has a text match.
pub fn bm25_score() -> Expr {
    Expr::Function(FunctionExpr::Bm25Score)
}

/// Distance between a vector-indexed `field` and `query`.
pub fn vector_distance(
    field: impl Into<String>,
    query: impl Into<VectorQuery>,
    options: VectorDistanceOptions,
) -> Expr {
    Expr::Function(FunctionExpr::VectorDistance {
        field: field.into(),
        query: query.into(),
        skip_refine: options.skip_refine,
    })
}

/// Distance between a multi-vector `field` and a query matrix.
///
/// `candidates` bounds how many documents are scored exactly.
pub fn multi_vector_distance(
    field: impl Into<String>,
    query: Matrix,
    candidates: Option<u32>,
) -> Expr {
    Expr::Function(FunctionExpr::MultiVectorDistance {
        field: field.into(),
        query,
        candidates,
    })
}

/// Similarity between a semantically indexed `field` and `query`.
pub fn semantic_similarity(field: impl Into<String>, query: impl Into<String>) -> Expr {
    Expr::Function(FunctionExpr::SemanticSimilarity {
        field: field.into(),
        query: query.into(),
    })
}
