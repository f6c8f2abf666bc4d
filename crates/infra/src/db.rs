//! Postgres connection pool and schema bootstrap.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::repository::StoreError;

const SCHEMA: &str = include_str!("../sql/schema.sql");

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared Postgres pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to connect to postgres: {e}")))?;

        tracing::info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    /// Run the bundled schema script in one round trip. Every statement is
    /// `IF NOT EXISTS`, so this is safe on every start.
    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("failed to apply schema: {e}")))?;
        tracing::debug!("schema applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Statements of the bundled script with `--` comment lines removed.
    fn statements(script: &str) -> Vec<String> {
        let code: String = script
            .lines()
            .filter(|l| !l.trim_start().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        code.split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[test]
    fn bundled_schema_holds_only_idempotent_ddl() {
        let statements = statements(SCHEMA);
        assert!(!statements.is_empty());
        for statement in &statements {
            assert!(statement.starts_with("CREATE"), "not a DDL statement: {statement:?}");
            assert!(statement.contains("IF NOT EXISTS"), "not idempotent: {statement:?}");
        }
    }

    #[test]
    fn comments_carry_no_statement_terminators() {
        for line in SCHEMA.lines().filter(|l| l.trim_start().starts_with("--")) {
            assert!(!line.contains(';'), "`;` inside comment: {line:?}");
        }
    }

    #[test]
    fn cash_entries_are_keyed_by_register() {
        let table = statements(SCHEMA)
            .into_iter()
            .find(|s| s.starts_with("CREATE TABLE IF NOT EXISTS cash_entries"))
            .unwrap();
        assert!(table.contains("register"));
        assert!(table.contains("payment_method"));
    }
}
