//! Validate and render wire payloads

use super::CliError;
use crate::ast::StageKind;
use crate::output::{from_json, to_json, to_json_pretty};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// JSON wire payload
    pub input: Option<String>,
    /// Print the normalized payload instead of canonical text
    pub json: bool,
    /// Pretty-print JSON output
    pub pretty: bool,
}

/// Result of a successful check
#[derive(Debug)]
pub struct CheckReport {
    pub stages: usize,
    pub collector: StageKind,
    /// Canonical text, or normalized JSON when requested
    pub output: String,
}

/// Decode and validate a payload
pub fn execute_check(options: &CheckOptions) -> Result<CheckReport, CliError> {
    let input = options.input.as_deref().ok_or(CliError::NoInput)?;
    let query = from_json(input)?;

    let output = if options.json {
        render_json(&query, options.pretty)?
    } else {
        query.to_string()
    };

    Ok(CheckReport {
        stages: query.stages().len(),
        collector: query.collector(),
        output,
    })
}

/// Decode a payload and re-emit it normalized
pub fn execute_render(input: &str, pretty: bool) -> Result<String, CliError> {
    let query = from_json(input)?;
    render_json(&query, pretty)
}

fn render_json(query: &crate::Query, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        to_json_pretty(query)
    } else {
        to_json(query)
    }?;
    Ok(json)
}
