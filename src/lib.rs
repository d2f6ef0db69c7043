pub mod ast;
pub mod coerce;
pub mod error;
pub mod fns;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod transport;
pub mod value;
pub mod wire;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{
    Expr, Literal, MAX_NARY_OPERANDS, Query, Stage, abs, all, any, field, literal, max, min, not,
    r#match,
};
pub use coerce::Operand;
pub use error::{CoercionError, EngineError, Error, ExprError, PipelineError, WireError};
pub use output::{from_json, to_json, to_json_pretty};
pub use pipeline::{Pipeline, count, filter, limit, select, sort, topk};
pub use transport::{Collection, ConsistencyLevel, QueryOptions, Transport};
pub use value::Value;
