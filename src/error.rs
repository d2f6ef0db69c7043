//! Error types for query construction, wire decoding and engine responses.
//!
//! Construction-time errors ([`CoercionError`], [`ExprError`], [`PipelineError`])
//! describe a mistake at the call site and never reach the transport.
//! [`EngineError`] is reported by the remote engine and carried verbatim.

use std::fmt;

use thiserror::Error;

use crate::ast::{NaryOp, StageKind};

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("coercion error: {0}")]
    Coercion(#[from] CoercionError),

    #[error("expression error: {0}")]
    Expr(#[from] ExprError),

    #[error("invalid pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// A pipeline collected by `count` was passed to `Collection::query`.
    #[error("query collects a count, use Collection::count")]
    CountQuery,

    /// The engine answered with a response of the wrong shape.
    #[error("malformed response: expected {expected}, got {got}")]
    MalformedResponse {
        expected: &'static str,
        got: &'static str,
    },
}

/// The operand shape a builder expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Numeric,
    Boolish,
    Stringy,
    Ordered,
    Comparable,
    Flexible,
    Iterable,
    Text,
    Scalar,
    Bytes,
    Vector,
    SparseVector,
    List,
    Matrix,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Expected::Numeric => "numeric",
            Expected::Boolish => "boolean",
            Expected::Stringy => "string",
            Expected::Ordered => "ordered (number or string)",
            Expected::Comparable => "comparable",
            Expected::Flexible => "string or number",
            Expected::Iterable => "string or list",
            Expected::Text => "string or string list",
            Expected::Scalar => "literal",
            Expected::Bytes => "bytes",
            Expected::Vector => "vector",
            Expected::SparseVector => "sparse vector",
            Expected::List => "list",
            Expected::Matrix => "matrix",
        };
        f.write_str(name)
    }
}

/// Runtime category of a rejected input.
///
/// Stable and matchable, so callers can tell a boolean apart from a `NaN`
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Null,
    Boolean,
    Integer,
    Float,
    NaN,
    Infinity,
    String,
    Bytes,
    Array,
    Object,
    Vector,
    SparseVector,
    List,
    Matrix,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Null => "null",
            Category::Boolean => "boolean",
            Category::Integer => "integer",
            Category::Float => "float",
            Category::NaN => "NaN",
            Category::Infinity => "infinity",
            Category::String => "string",
            Category::Bytes => "bytes",
            Category::Array => "array",
            Category::Object => "object",
            Category::Vector => "vector",
            Category::SparseVector => "sparse vector",
            Category::List => "list",
            Category::Matrix => "matrix",
        };
        f.write_str(name)
    }
}

/// Conversion of a host value into a typed literal failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("unsupported {expected} operand: {found}")]
    Unsupported { expected: Expected, found: Category },

    #[error("value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("value {value} cannot be interpreted as an integer")]
    NotAnInteger { value: f64 },

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<CoercionError>,
    },

    #[error("list elements must share one type: element {index} is {found}, expected {first}")]
    MixedList {
        index: usize,
        first: Category,
        found: Category,
    },

    #[error("invalid sparse vector index `{0}`, must be a non-negative 32-bit integer")]
    InvalidSparseIndex(String),

    #[error("cannot create matrix from empty list")]
    EmptyMatrix,

    #[error("cannot create matrix: row {row} is empty")]
    EmptyRow { row: usize },

    #[error("all rows must have the same length: row {row} has length {len}, but expected {expected}")]
    RowLength {
        row: usize,
        len: usize,
        expected: usize,
    },
}

impl CoercionError {
    /// The runtime category that was rejected, if the failure was caused by
    /// an input of the wrong kind.
    pub fn category(&self) -> Option<Category> {
        match self {
            CoercionError::Unsupported { found, .. } => Some(*found),
            CoercionError::MixedList { found, .. } => Some(*found),
            CoercionError::Element { source, .. } => source.category(),
            _ => None,
        }
    }

    pub(crate) fn at(self, index: usize) -> Self {
        CoercionError::Element {
            index,
            source: Box::new(self),
        }
    }
}

/// Building an expression node failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("{op} accepts at most {max} operands, got {count}")]
    TooManyOperands {
        op: NaryOp,
        count: usize,
        max: usize,
    },

    #[error("invalid regular expression `{pattern}`: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("unsupported regular expression flag `{0}`")]
    InvalidRegexFlag(char),

    #[error("{op} pattern must be a string literal")]
    RegexNotLiteral { op: &'static str },
}

impl ExprError {
    /// Shortcut to the rejected input category of a coercion failure.
    pub fn category(&self) -> Option<Category> {
        match self {
            ExprError::Coercion(e) => e.category(),
            _ => None,
        }
    }
}

/// A stage sequence that cannot be finalized into a query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("query has no collector stage, add one of limit, topk or count")]
    MissingCollector,

    #[error("stage {position}: {second} conflicts with {first}, a query has exactly one collector")]
    MultipleCollectors {
        position: usize,
        first: StageKind,
        second: StageKind,
    },

    #[error("stage {position}: {second} conflicts with {first}, a query has at most one ordering")]
    MultipleOrderings {
        position: usize,
        first: StageKind,
        second: StageKind,
    },

    #[error("stage {position}: rerank must follow a collector stage")]
    MisplacedRerank { position: usize },

    #[error("stage {position}: rerank cannot refine a count")]
    RerankAfterCount { position: usize },

    #[error("stage {position}: rerank may appear only once")]
    MultipleReranks { position: usize },

    #[error("stage {position}: {stage} cannot follow the collector")]
    StageAfterCollector { position: usize, stage: StageKind },

    #[error("stage {position}: {stage} requires k > 0")]
    ZeroBound { position: usize, stage: StageKind },

    #[error("stage {position}: select requires at least one projection")]
    EmptyProjection { position: usize },

    #[error("stage {position}: {source}")]
    InvalidExpr {
        position: usize,
        #[source]
        source: ExprError,
    },

    #[error("stage {position}: match weight for `{token}` must be finite, got {weight}")]
    InvalidWeight {
        position: usize,
        token: String,
        weight: f32,
    },
}

/// Decoding or encoding a wire payload failed.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("matrix payload has {len} values, not a multiple of {num_cols} columns")]
    RaggedMatrix { len: usize, num_cols: u32 },

    #[error("sparse vector has {indices} indices but {values} values")]
    SparseLength { indices: usize, values: usize },
}

/// Error reported by the remote engine.
///
/// Messages are kept exactly as the engine sent them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("query lsn timeout")]
    QueryLsnTimeout,

    #[error("permission denied")]
    PermissionDenied,

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("document too large: {0}")]
    DocumentTooLarge(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = CoercionError::Unsupported {
            expected: Expected::Numeric,
            found: Category::Boolean,
        };
        assert_eq!(err.to_string(), "unsupported numeric operand: boolean");
    }

    #[test]
    fn test_element_category_passes_through() {
        let err = CoercionError::OutOfRange {
            value: "300".into(),
            target: "u8",
        }
        .at(2);
        assert_eq!(err.to_string(), "element 2: value 300 is out of range for u8");
        assert_eq!(err.category(), None);

        let err = CoercionError::Unsupported {
            expected: Expected::Bytes,
            found: Category::String,
        }
        .at(0);
        assert_eq!(err.category(), Some(Category::String));
    }

    #[test]
    fn test_row_length_display() {
        let err = CoercionError::RowLength {
            row: 1,
            len: 1,
            expected: 2,
        };
        assert_eq!(
            err.to_string(),
            "all rows must have the same length: row 1 has length 1, but expected 2"
        );
    }

    #[test]
    fn test_error_wraps_pipeline() {
        let err: Error = PipelineError::MissingCollector.into();
        assert!(err.to_string().starts_with("invalid pipeline:"));
    }
}
