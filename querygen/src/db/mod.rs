//! Database access: connection descriptors, the per-request handle, and introspection

pub mod mysql;

pub use mysql::MySqlConnector;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One result row as column name to JSON value, in column order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Errors from the database layer
#[derive(Error, Debug)]
pub enum DbError {
    /// The descriptor cannot be turned into connection options
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Any driver-level failure, including connecting on first use
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// User-supplied credentials for one request's database
#[derive(Clone, Default, Deserialize)]
pub struct ConnectionDescriptor {
    #[serde(default)]
    pub host: String,
    /// Kept as text: browsers commonly send the port as a string
    #[serde(default, deserialize_with = "port_as_string")]
    pub port: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
}

impl ConnectionDescriptor {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        [&self.host, &self.port, &self.user, &self.password, &self.database]
            .iter()
            .all(|field| field.trim().is_empty())
    }

    /// Check required fields and parse the port
    pub fn validate(&self) -> Result<u16, DbError> {
        let missing: Vec<&str> = [
            ("host", &self.host),
            ("port", &self.port),
            ("user", &self.user),
            ("database", &self.database),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(DbError::InvalidConnection(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        match self.port.trim().parse::<u16>() {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(DbError::InvalidConnection(format!(
                "invalid port '{}'",
                self.port
            ))),
        }
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Accept the port as a JSON number, a string, or null.
fn port_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<PortValue>::deserialize(deserializer)? {
        Some(PortValue::Number(n)) => n.to_string(),
        Some(PortValue::Text(s)) => s,
        None => String::new(),
    })
}

/// Column as reported by `DESCRIBE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// Schema of one table, rendered as `table(col1 type1, col2 type2)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.data_type))
            .collect();
        write!(f, "{}({})", self.table, columns.join(", "))
    }
}

/// A request-scoped database handle.
///
/// Every call runs in its own transaction that commits on success.
#[async_trait]
pub trait Database: Send + Sync {
    /// Names of all tables in the connected schema
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;

    /// Columns of one table. `table` must come from `list_tables`.
    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, DbError>;

    /// Run a read statement and materialize every row
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Run any other statement and return the affected row count
    async fn execute(&self, sql: &str) -> Result<u64, DbError>;

    /// Release the underlying connection
    async fn close(&self);
}

/// Builds database handles from descriptors
pub trait Connector: Send + Sync {
    /// Construct a handle without touching the network
    fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Database>, DbError>;
}

impl<T: Connector + ?Sized> Connector for Arc<T> {
    fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Database>, DbError> {
        (**self).connect(descriptor)
    }
}
