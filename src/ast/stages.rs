use std::fmt;

use crate::ast::Expr;

/// Pipeline stage.
///
/// `limit`, `topk` and `count` are collectors: a finalized query has exactly
/// one of them, and only `rerank` may follow it.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Projection, in insertion order
    ///
    /// # Example
    /// ```text
    /// select(title: field("title"), score: fns::bm25_score())
    /// ```
    Select { exprs: Vec<(String, Expr)> },

    /// Keeps documents for which `expr` holds
    Filter { expr: Expr },

    /// Orders results without bounding them
    Sort { expr: Expr, asc: bool },

    /// Bounds the number of results
    Limit { k: u64 },

    /// Orders by `expr` and keeps the first `k`
    TopK { expr: Expr, k: u64, asc: bool },

    /// Returns the number of matching documents instead of documents
    Count,

    /// Refines collected results with a reranking model
    Rerank(RerankOptions),
}

/// Options of a [`Stage::Rerank`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RerankOptions {
    pub model: Option<String>,
    /// Text query; the engine derives one from the filter when absent
    pub query: Option<String>,
    pub fields: Vec<String>,
    /// Candidates considered per returned document
    pub topk_multiple: Option<u32>,
}

impl RerankOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn topk_multiple(mut self, multiple: u32) -> Self {
        self.topk_multiple = Some(multiple);
        self
    }
}

/// Discriminant of a [`Stage`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Select,
    Filter,
    Sort,
    Limit,
    TopK,
    Count,
    Rerank,
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Select { .. } => StageKind::Select,
            Stage::Filter { .. } => StageKind::Filter,
            Stage::Sort { .. } => StageKind::Sort,
            Stage::Limit { .. } => StageKind::Limit,
            Stage::TopK { .. } => StageKind::TopK,
            Stage::Count => StageKind::Count,
            Stage::Rerank(_) => StageKind::Rerank,
        }
    }

    /// Expressions held directly by this stage.
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Stage::Select { exprs } => exprs.iter().map(|(_, e)| e).collect(),
            Stage::Filter { expr } | Stage::Sort { expr, .. } | Stage::TopK { expr, .. } => {
                vec![expr]
            }
            Stage::Limit { .. } | Stage::Count | Stage::Rerank(_) => Vec::new(),
        }
    }
}

impl StageKind {
    pub fn is_collector(self) -> bool {
        matches!(self, StageKind::Limit | StageKind::TopK | StageKind::Count)
    }

    /// Stages that define the result ordering.
    pub fn is_ordering(self) -> bool {
        matches!(self, StageKind::Sort | StageKind::TopK)
    }

    pub fn name(self) -> &'static str {
        match self {
            StageKind::Select => "select",
            StageKind::Filter => "filter",
            StageKind::Sort => "sort",
            StageKind::Limit => "limit",
            StageKind::TopK => "topk",
            StageKind::Count => "count",
            StageKind::Rerank => "rerank",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
