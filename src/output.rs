//! JSON output for finalized queries.
//!
//! This module renders the [wire](crate::wire) payload of a [`Query`] as JSON,
//! compact or pretty-printed, and reads one back. Output is deterministic:
//! stages, projections and operands keep their construction order.
//!
//! # Examples
//!
//! ```
//! use topk_query::count;
//! use topk_query::output::{from_json, to_json};
//!
//! let query = count().finalize().unwrap();
//!
//! // Compact output
//! assert_eq!(to_json(&query).unwrap(), r#"{"stages":[{"type":"count"}]}"#);
//!
//! // And back
//! assert_eq!(from_json(r#"{"stages":[{"type":"count"}]}"#).unwrap(), query);
//! ```

use tracing::debug;

use crate::ast::Query;
use crate::error::WireError;
use crate::wire::WireQuery;

/// Converts a query to compact JSON.
///
/// No indentation or extra whitespace, suitable for the transport.
pub fn to_json(query: &Query) -> Result<String, WireError> {
    let json = serde_json::to_string(&WireQuery::from(query))?;
    debug!(bytes = json.len(), "serialized query");
    Ok(json)
}

/// Converts a query to JSON with 2-space indentation, one property per line.
pub fn to_json_pretty(query: &Query) -> Result<String, WireError> {
    Ok(serde_json::to_string_pretty(&WireQuery::from(query))?)
}

/// Parses and validates a JSON wire payload.
pub fn from_json(json: &str) -> Result<Query, WireError> {
    let wire: WireQuery = serde_json::from_str(json)?;
    Query::try_from(wire)
}
