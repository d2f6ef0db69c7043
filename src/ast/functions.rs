use serde::{Deserialize, Serialize};

use crate::ast::{Matrix, SparseVector, Vector};

/// Engine-evaluated scoring functions.
///
/// The engine checks that the referenced field carries the matching index
/// (keyword, vector, multi-vector or semantic); the builder does not.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionExpr {
    /// BM25 score of the document for the text-match terms in the filter
    Bm25Score,

    /// Distance between `field` and a dense or sparse query vector
    VectorDistance {
        field: String,
        query: VectorQuery,
        skip_refine: bool,
    },

    /// Late-interaction distance between a multi-vector `field` and a query matrix
    MultiVectorDistance {
        field: String,
        query: Matrix,
        candidates: Option<u32>,
    },

    /// Similarity between `field` and a text query, embedded by the engine
    SemanticSimilarity { field: String, query: String },
}

/// Query operand of [`FunctionExpr::VectorDistance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "vector", rename_all = "snake_case")]
pub enum VectorQuery {
    Dense(Vector),
    Sparse(SparseVector),
}

impl From<Vector> for VectorQuery {
    fn from(v: Vector) -> Self {
        VectorQuery::Dense(v)
    }
}

impl From<Vec<f32>> for VectorQuery {
    fn from(v: Vec<f32>) -> Self {
        VectorQuery::Dense(Vector::F32(v))
    }
}

impl From<SparseVector> for VectorQuery {
    fn from(v: SparseVector) -> Self {
        VectorQuery::Sparse(v)
    }
}

/// Options for [`vector_distance`](crate::fns::vector_distance).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorDistanceOptions {
    /// Return approximate distances without re-scoring candidates
    pub skip_refine: bool,
}

impl FunctionExpr {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionExpr::Bm25Score => "bm25_score",
            FunctionExpr::VectorDistance { .. } => "vector_distance",
            FunctionExpr::MultiVectorDistance { .. } => "multi_vector_distance",
            FunctionExpr::SemanticSimilarity { .. } => "semantic_similarity",
        }
    }
}
