//! Boundary to the remote engine.
//!
//! The engine is reached through a [`Transport`]; this crate only shapes the
//! request. [`Collection`] finalizes and encodes a pipeline before handing it
//! over, so a query that fails validation never reaches the transport.
//! Engine errors come back as [`EngineError`] and are returned unchanged.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ast::Query;
use crate::error::{EngineError, Error};
use crate::pipeline::Pipeline;
use crate::wire::WireQuery;

/// A document returned by the engine: field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Read consistency requested from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    /// Reflects everything indexed so far
    Indexed,
    /// Reflects every acknowledged write
    Strong,
}

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Log sequence number; results reflect writes up to this point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<ConsistencyLevel>,
}

impl QueryOptions {
    pub fn lsn(mut self, lsn: impl Into<String>) -> Self {
        self.lsn = Some(lsn.into());
        self
    }

    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency = Some(level);
        self
    }
}

/// Payload handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: WireQuery,
    #[serde(flatten)]
    pub options: QueryOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    Documents(Vec<Document>),
    Count(u64),
}

impl QueryResponse {
    fn kind(&self) -> &'static str {
        match self {
            QueryResponse::Documents(_) => "documents",
            QueryResponse::Count(_) => "count",
        }
    }
}

/// Sends encoded queries to the engine.
pub trait Transport {
    fn query(&self, collection: &str, request: QueryRequest)
    -> Result<QueryResponse, EngineError>;
}

/// Query entry point for one collection.
pub struct Collection<'a, T: Transport> {
    transport: &'a T,
    name: String,
}

impl<'a, T: Transport> Collection<'a, T> {
    pub fn new(transport: &'a T, name: impl Into<String>) -> Self {
        Collection {
            transport,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs a document query. A pipeline collected by `count` is rejected
    /// without being sent; use [`Collection::count`] for those.
    pub fn query(&self, pipeline: Pipeline, options: QueryOptions) -> Result<Vec<Document>, Error> {
        let query = pipeline.finalize()?;
        if query.is_count() {
            debug!(collection = %self.name, "count pipeline passed to query");
            return Err(Error::CountQuery);
        }
        match self.send(&query, options)? {
            QueryResponse::Documents(docs) => Ok(docs),
            other => Err(Error::MalformedResponse {
                expected: "documents",
                got: other.kind(),
            }),
        }
    }

    /// Appends a `count` collector to `pipeline` and runs it.
    pub fn count(&self, pipeline: Pipeline, options: QueryOptions) -> Result<u64, Error> {
        let query = pipeline.count().finalize()?;
        match self.send(&query, options)? {
            QueryResponse::Count(n) => Ok(n),
            other => Err(Error::MalformedResponse {
                expected: "count",
                got: other.kind(),
            }),
        }
    }

    fn send(&self, query: &Query, options: QueryOptions) -> Result<QueryResponse, Error> {
        debug!(
            collection = %self.name,
            stages = query.stages().len(),
            consistency = ?options.consistency,
            lsn = options.lsn.is_some(),
            "sending query"
        );
        let request = QueryRequest {
            query: WireQuery::from(query),
            options,
        };
        self.transport.query(&self.name, request).map_err(|e| {
            warn!(collection = %self.name, error = %e, "engine rejected query");
            Error::Engine(e)
        })
    }
}
