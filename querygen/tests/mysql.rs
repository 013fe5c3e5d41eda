//! Tests against a live MySQL server
//!
//! These tests require a reachable server. Connection details come from
//! `QUERYGEN_TEST_DB_HOST`, `_PORT`, `_USER`, `_PASSWORD` and `_NAME`
//! (defaults: localhost, 3306, root, empty, querygen_test).
//!
//! Run with: cargo test -p querygen --test mysql -- --include-ignored

use querygen::db::{ConnectionDescriptor, Connector, MySqlConnector};
use serde_json::json;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn descriptor() -> ConnectionDescriptor {
    ConnectionDescriptor {
        host: env_or("QUERYGEN_TEST_DB_HOST", "localhost"),
        port: env_or("QUERYGEN_TEST_DB_PORT", "3306"),
        user: env_or("QUERYGEN_TEST_DB_USER", "root"),
        password: env_or("QUERYGEN_TEST_DB_PASSWORD", ""),
        database: env_or("QUERYGEN_TEST_DB_NAME", "querygen_test"),
    }
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn test_introspect_and_select() {
    let db = MySqlConnector.connect(&descriptor()).expect("Failed to build handle");
    let table = format!("qg_people_{}", std::process::id());

    db.execute(&format!(
        "CREATE TABLE {} (id INT PRIMARY KEY, name VARCHAR(40), score DECIMAL(5,2), active BOOLEAN)",
        table
    ))
    .await
    .expect("Failed to create table");

    let result = async {
        let inserted = db
            .execute(&format!(
                "INSERT INTO {} VALUES (1, 'Ada', 9.50, TRUE), (2, NULL, 7.25, FALSE)",
                table
            ))
            .await
            .expect("Failed to insert");
        assert_eq!(inserted, 2);

        let tables = db.list_tables().await.expect("Failed to list tables");
        assert!(tables.contains(&table), "{table} missing from {tables:?}");

        let columns = db.describe_table(&table).await.expect("Failed to describe");
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "score", "active"]);
        assert!(columns[1].data_type.starts_with("varchar"));

        let rows = db
            .fetch_rows(&format!("SELECT id, name, score, active FROM {} ORDER BY id", table))
            .await
            .expect("Failed to select");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[0]["name"], json!("Ada"));
        assert_eq!(rows[0]["score"], json!("9.50"));
        assert_eq!(rows[1]["name"], json!(null));
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["id", "name", "score", "active"]);
    }
    .await;

    db.execute(&format!("DROP TABLE {}", table))
        .await
        .expect("Failed to drop table");
    db.close().await;

    result
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn test_unknown_table_fails_describe() {
    let db = MySqlConnector.connect(&descriptor()).expect("Failed to build handle");
    assert!(db.describe_table("definitely_not_a_table").await.is_err());
    db.close().await;
}

#[tokio::test]
#[ignore = "requires a MySQL server"]
async fn test_stacked_statements_are_refused_by_server() {
    let db = MySqlConnector.connect(&descriptor()).expect("Failed to build handle");
    let table = format!("qg_victim_{}", std::process::id());

    db.execute(&format!("CREATE TABLE {} (id INT)", table))
        .await
        .expect("Failed to create table");

    let stacked = format!("SELECT 1; DROP TABLE {}", table);
    assert!(db.fetch_rows(&stacked).await.is_err());
    assert!(db.execute(&stacked).await.is_err());

    let tables = db.list_tables().await.expect("Failed to list tables");
    assert!(tables.contains(&table), "{table} was dropped");

    db.execute(&format!("DROP TABLE {}", table))
        .await
        .expect("Failed to drop table");
    db.close().await;
}

#[tokio::test]
async fn test_unreachable_server_fails_on_first_query() {
    let mut d = descriptor();
    d.host = "127.0.0.1".to_string();
    d.port = "1".to_string();

    // Building the handle never touches the network
    let db = MySqlConnector.connect(&d).expect("Failed to build handle");
    assert!(db.list_tables().await.is_err());
    db.close().await;
}
