//! MySQL handle built on a lazily-connecting single-connection sqlx pool

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Row as _, TypeInfo, ValueRef};

use super::{ColumnInfo, ConnectionDescriptor, Connector, Database, DbError, Row};

/// How long the first statement may wait for the connection to open
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connector for MySQL-compatible servers
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    /// Translate a descriptor into driver options
    pub fn connect_options(descriptor: &ConnectionDescriptor) -> Result<MySqlConnectOptions, DbError> {
        let port = descriptor.validate()?;

        let mut options = MySqlConnectOptions::new()
            .host(descriptor.host.trim())
            .port(port)
            .username(descriptor.user.trim())
            .database(descriptor.database.trim());

        if !descriptor.password.is_empty() {
            options = options.password(&descriptor.password);
        }

        Ok(options)
    }
}

impl Connector for MySqlConnector {
    fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Database>, DbError> {
        let options = Self::connect_options(descriptor)?;

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        tracing::debug!(
            host = %descriptor.host,
            database = %descriptor.database,
            "Built lazy MySQL handle"
        );

        Ok(Box::new(MySqlDatabase { pool }))
    }
}

/// Request-scoped MySQL handle
pub struct MySqlDatabase {
    pool: MySqlPool,
}

#[async_trait]
impl Database for MySqlDatabase {
    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut tx = self.pool.begin().await?;
        // SHOW and DESCRIBE go over the text protocol; a bare &str is never prepared
        let rows = (&mut *tx).fetch_all("SHOW TABLES").await?;
        tx.commit().await?;

        rows.iter().map(|row| text_at(row, 0)).collect()
    }

    async fn describe_table(&self, table: &str) -> Result<Vec<ColumnInfo>, DbError> {
        let sql = format!("DESCRIBE {}", quote_identifier(table));

        let mut tx = self.pool.begin().await?;
        let rows = (&mut *tx).fetch_all(sql.as_str()).await?;
        tx.commit().await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: text_at(row, 0)?,
                    data_type: text_at(row, 1)?,
                })
            })
            .collect()
    }

    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        // Prepared, so the server accepts exactly one statement
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(sql).fetch_all(&mut *tx).await?;
        tx.commit().await?;

        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn execute(&self, sql: &str) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(sql).execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Backtick-quote an identifier, doubling embedded backticks
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Read a text column that may come back as a binary string on some servers
fn text_at(row: &MySqlRow, index: usize) -> Result<String, DbError> {
    match row.try_get::<String, _>(index) {
        Ok(text) => Ok(text),
        Err(_) => {
            let bytes = row.try_get::<Vec<u8>, _>(index)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

fn row_to_json(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| (column.name().to_string(), map_mysql_value(row, i)))
        .collect()
}

fn map_mysql_value(row: &MySqlRow, index: usize) -> Value {
    let value_ref = match row.try_get_raw(index) {
        Ok(v) => v,
        Err(_) => return Value::Null,
    };

    if value_ref.is_null() {
        return Value::Null;
    }

    let type_info = value_ref.type_info();
    let type_name = type_info.name();

    let typed = match type_name {
        "BOOLEAN" => row.try_get::<bool, _>(index).ok().map(Value::Bool),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get::<i64, _>(index).ok().map(Value::from)
        }
        name if name.ends_with("UNSIGNED") => row.try_get::<u64, _>(index).ok().map(Value::from),
        "FLOAT" | "DOUBLE" => row
            .try_get::<f64, _>(index)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "DECIMAL" => row
            .try_get::<sqlx::types::BigDecimal, _>(index)
            .ok()
            .map(|d| Value::String(d.to_string())),
        "DATETIME" | "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(index)
            .ok()
            .map(|t| Value::String(t.to_string())),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .ok()
            .map(|d| Value::String(d.to_string())),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .ok()
            .map(|t| Value::String(t.to_string())),
        "JSON" => row.try_get::<Value, _>(index).ok(),
        _ => None,
    };

    // Anything unrecognized or that failed strict decoding is returned as text
    typed.unwrap_or_else(|| match text_at(row, index) {
        Ok(text) => Value::String(text),
        Err(e) => {
            tracing::warn!(column = index, type_name, "Could not decode value: {}", e);
            Value::Null
        }
    })
}
