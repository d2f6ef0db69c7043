//! CLI support for topk-query
//!
//! Provides programmatic access to the topkq commands for embedding in other
//! tools.

mod check;
mod docs;
mod literal;

pub use check::{CheckOptions, CheckReport, execute_check, execute_render};
pub use docs::{DocCategory, get_doc_category, get_docs_overview};
pub use literal::{LiteralOptions, LiteralShape, execute_literal};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("invalid query: {0}")]
    Wire(#[from] crate::WireError),

    #[error("invalid literal: {0}")]
    Coercion(#[from] crate::CoercionError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("unknown element type '{element}' for {shape}")]
    UnknownElement { shape: &'static str, element: String },

    #[error("unknown category: '{0}'\nRun 'topkq docs' to see available categories.")]
    UnknownCategory(String),
}
