use serde_json::Value;
use sqlx::{postgres::PgArguments, postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;

use crate::config;
use crate::error::ApiError;

/// Build the connection pool from DATABASE_URL.
///
/// The pool is created once at startup and handed to the router as state;
/// the resource layer only ever borrows it.
pub async fn connect() -> Result<PgPool, ApiError> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|_| ApiError::internal_server_error("DATABASE_URL not configured"))?;

    let db_config = &config::config().database;
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.connection_timeout))
        .connect(&url)
        .await?;

    tracing::info!("Created database pool");
    Ok(pool)
}

/// Bind a JSON parameter value onto a typed query. Predicate and SET-clause
/// parameters travel as `serde_json::Value`; only scalars ever reach here.
pub fn bind_value_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        other => q.bind(other.to_string()),
    }
}
