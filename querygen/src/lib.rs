//! Natural-language to read-only SQL over MySQL, backed by a hosted LLM

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod sql;
pub mod web;

pub use error::QueryError;
pub use pipeline::{QueryPipeline, QueryRequest, QueryResponse};
