//! Prompt-to-SQL pipeline
//!
//! One request runs these stages in order, any of which may end it early:
//! 1. Validate input and build a lazy database handle
//! 2. Reject prompts with modification intent (no database or model calls)
//! 3. List tables, ask the model which ones matter, keep only real ones
//! 4. Describe the chosen tables and ask the model for SQL
//! 5. Sanitize, reject non-read statements, execute

use serde::{Deserialize, Serialize};

use crate::db::{ConnectionDescriptor, Connector, Database, Row, TableSchema};
use crate::error::{QueryError, QueryResult};
use crate::llm::Llm;
use crate::prompts;
use crate::sql::guard::{DANGEROUS_PROMPT_MESSAGE, UNSAFE_SQL_MESSAGE};
use crate::sql::{
    blocked_sql_keyword, dangerous_prompt_word, has_stacked_statements, is_select, sanitize_sql,
    strip_terminators,
};

pub const MISSING_INPUT_MESSAGE: &str = "Prompt or DB connection details missing.";
pub const NO_VALID_TABLES_MESSAGE: &str = "No valid tables found in prompt.";
pub const NO_SQL_MESSAGE: &str = "Model did not return any SQL.";

/// Body of a query request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub connection: Option<ConnectionDescriptor>,
}

/// Outcome of a query request. Serializes to exactly one of the wire shapes
/// `{sql, data}`, `{sql, message}`, `{sql, error}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// Rows of a read query
    Rows { sql: String, data: Vec<Row> },
    /// Row count of a non-read statement
    Affected { sql: String, message: String },
    /// Generated SQL refused by the read-only gate
    Rejected { sql: String, error: String },
    /// Any other failure or refusal
    Failed { error: String },
}

impl QueryResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        QueryResponse::Failed {
            error: error.into(),
        }
    }

    /// The error text, if this response reports one
    pub fn error(&self) -> Option<&str> {
        match self {
            QueryResponse::Rejected { error, .. } | QueryResponse::Failed { error } => Some(error),
            _ => None,
        }
    }
}

impl From<QueryError> for QueryResponse {
    fn from(err: QueryError) -> Self {
        match &err {
            QueryError::Schema { .. } => QueryResponse::failed(err.to_string()),
            _ if err.is_provider_error() => {
                QueryResponse::failed(format!("LLM provider error: {}", err))
            }
            _ => QueryResponse::failed(format!("Server error: {}", err)),
        }
    }
}

/// Parse the model's comma-separated table list, keeping only real tables.
///
/// Order of first mention is kept and duplicates are dropped.
pub fn select_tables(model_output: &str, existing_tables: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for name in model_output.split(',').map(str::trim) {
        if name.is_empty() || selected.iter().any(|s| s == name) {
            continue;
        }
        if existing_tables.iter().any(|t| t == name) {
            selected.push(name.to_string());
        }
    }
    selected
}

/// The request handler, generic over the model and the database connector
pub struct QueryPipeline<L, C> {
    llm: L,
    connector: C,
}

impl<L: Llm, C: Connector> QueryPipeline<L, C> {
    pub fn new(llm: L, connector: C) -> Self {
        Self { llm, connector }
    }

    pub fn llm(&self) -> &L {
        &self.llm
    }

    /// Run one request to completion. Never fails: every error becomes a response.
    pub async fn run(&self, request: &QueryRequest) -> QueryResponse {
        let prompt = request.prompt.as_deref().unwrap_or_default();
        let descriptor = match &request.connection {
            Some(d) if !d.is_empty() && !prompt.trim().is_empty() => d,
            _ => return QueryResponse::failed(MISSING_INPUT_MESSAGE),
        };

        let db = match self.connector.connect(descriptor) {
            Ok(db) => db,
            Err(e) => {
                tracing::error!("Failed to build connection: {}", e);
                return QueryError::from(e).into();
            }
        };

        let response = match self.answer(db.as_ref(), prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Query failed: {}", e);
                e.into()
            }
        };

        db.close().await;
        response
    }

    async fn answer(&self, db: &dyn Database, prompt: &str) -> QueryResult<QueryResponse> {
        if let Some(word) = dangerous_prompt_word(prompt) {
            tracing::warn!(word, "Rejected prompt with modification intent");
            return Ok(QueryResponse::failed(DANGEROUS_PROMPT_MESSAGE));
        }

        let existing_tables = db.list_tables().await?;
        tracing::debug!(tables = ?existing_tables, "Existing tables");

        let table_reply = self
            .llm
            .complete(&prompts::table_selection(&existing_tables, prompt))
            .await?;
        tracing::debug!(reply = %table_reply, "Raw table selection");

        let tables = select_tables(&table_reply, &existing_tables);
        tracing::info!(tables = ?tables, "Validated tables");

        if tables.is_empty() {
            return Ok(QueryResponse::failed(NO_VALID_TABLES_MESSAGE));
        }

        let schema = self.introspect(db, &tables).await?;

        let raw_sql = self
            .llm
            .complete(&prompts::sql_generation(&schema, prompt))
            .await?;
        tracing::debug!(raw = %raw_sql, "Raw SQL from model");

        let sql = sanitize_sql(&raw_sql);

        if let Some(keyword) = blocked_sql_keyword(&sql) {
            tracing::warn!(keyword, sql = %sql, "Blocked non-read SQL");
            return Ok(QueryResponse::Rejected {
                sql,
                error: UNSAFE_SQL_MESSAGE.to_string(),
            });
        }

        // A read prefix says nothing about what follows a `;`
        if has_stacked_statements(&sql) {
            tracing::warn!(sql = %sql, "Blocked stacked statements");
            return Ok(QueryResponse::Rejected {
                sql,
                error: UNSAFE_SQL_MESSAGE.to_string(),
            });
        }

        if sql.is_empty() {
            return Ok(QueryResponse::failed(NO_SQL_MESSAGE));
        }

        tracing::info!(sql = %sql, "Executing");

        let statement = strip_terminators(&sql);
        if is_select(statement) {
            let data = db.fetch_rows(statement).await?;
            Ok(QueryResponse::Rows { sql, data })
        } else {
            let affected = db.execute(statement).await?;
            Ok(QueryResponse::Affected {
                message: format!("{} rows affected.", affected),
                sql,
            })
        }
    }

    /// Describe each table; the first failure aborts with that table's name.
    async fn introspect(&self, db: &dyn Database, tables: &[String]) -> QueryResult<String> {
        let mut schemas = Vec::with_capacity(tables.len());
        for table in tables {
            let columns = db
                .describe_table(table)
                .await
                .map_err(|source| QueryError::Schema {
                    table: table.clone(),
                    source,
                })?;
            schemas.push(TableSchema {
                table: table.clone(),
                columns,
            });
        }

        Ok(schemas
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
