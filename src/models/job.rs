use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use crate::database::bind_value_as;
use crate::database::update::sql_for_partial_update;
use crate::error::ApiError;
use crate::filter::{FilterWhere, JobFilter};

/// Equity is read back as the text of the stored NUMERIC so the exact
/// decimal representation round-trips ("0.1" stays "0.1").
const JOB_COLUMNS: &str = "id, title, salary, equity::text AS equity, company_handle";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<String>,
    pub company_handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobInput {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<String>,
    pub company_handle: String,
}

impl JobInput {
    fn validate(&self) -> Result<Option<Decimal>, ApiError> {
        if self.title.is_empty() {
            return Err(ApiError::bad_request("title cannot be empty"));
        }
        if matches!(self.salary, Some(s) if s < 0) {
            return Err(ApiError::bad_request("salary must be non-negative"));
        }
        parse_equity(self.equity.as_deref())
    }
}

/// Partial update payload; id and companyHandle are immutable and any
/// attempt to send them is rejected before this type is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub salary: Option<i32>,
    pub equity: Option<String>,
}

impl JobUpdate {
    fn validate(&self) -> Result<Option<Decimal>, ApiError> {
        if matches!(&self.title, Some(t) if t.is_empty()) {
            return Err(ApiError::bad_request("title cannot be empty"));
        }
        if matches!(self.salary, Some(s) if s < 0) {
            return Err(ApiError::bad_request("salary must be non-negative"));
        }
        parse_equity(self.equity.as_deref())
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = vec![];
        if let Some(title) = &self.title {
            fields.push(("title", json!(title)));
        }
        if let Some(salary) = self.salary {
            fields.push(("salary", json!(salary)));
        }
        if let Some(equity) = &self.equity {
            fields.push(("equity", json!(equity)));
        }
        fields
    }
}

/// Parse and range-check an equity value. Equity lives in [0, 1].
fn parse_equity(equity: Option<&str>) -> Result<Option<Decimal>, ApiError> {
    match equity {
        None => Ok(None),
        Some(raw) => {
            let value = Decimal::from_str(raw)
                .map_err(|_| ApiError::bad_request(format!("Invalid equity: {}", raw)))?;
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ApiError::bad_request("equity must be between 0 and 1"));
            }
            Ok(Some(value))
        }
    }
}

impl Job {
    /// Create a job after confirming the referenced company exists; both
    /// statements share one transaction.
    pub async fn create(pool: &PgPool, input: &JobInput) -> Result<Job, ApiError> {
        let equity = input.validate()?;

        let mut tx = pool.begin().await?;

        let company = sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
            .bind(&input.company_handle)
            .fetch_optional(&mut *tx)
            .await?;
        if company.is_none() {
            return Err(ApiError::not_found(format!(
                "No company: {}",
                input.company_handle
            )));
        }

        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            JOB_COLUMNS
        );
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(&input.title)
            .bind(input.salary)
            .bind(equity)
            .bind(&input.company_handle)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(job)
    }

    /// List jobs matching the filter, ordered by id.
    pub async fn find_all(pool: &PgPool, filter: &JobFilter) -> Result<Vec<Job>, ApiError> {
        filter.validate()?;

        let compiled = FilterWhere::generate(&filter.predicates(), 1);
        let sql = if compiled.query.is_empty() {
            format!("SELECT {} FROM jobs ORDER BY id", JOB_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM jobs WHERE {} ORDER BY id",
                JOB_COLUMNS, compiled.query
            )
        };

        let mut q = sqlx::query_as::<_, Job>(&sql);
        for param in compiled.params.iter() {
            q = bind_value_as(q, param);
        }
        Ok(q.fetch_all(pool).await?)
    }

    /// Jobs belonging to one company, ordered by id.
    pub async fn find_by_company(pool: &PgPool, handle: &str) -> Result<Vec<Job>, ApiError> {
        let sql = format!(
            "SELECT {} FROM jobs WHERE company_handle = $1 ORDER BY id",
            JOB_COLUMNS
        );
        Ok(sqlx::query_as::<_, Job>(&sql)
            .bind(handle)
            .fetch_all(pool)
            .await?)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Job, ApiError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {}", id)))
    }

    /// Partial update; id and companyHandle stay fixed.
    pub async fn update(pool: &PgPool, id: i32, data: &JobUpdate) -> Result<Job, ApiError> {
        let equity = data.validate()?;

        let fields = data.fields();
        let set = sql_for_partial_update(&fields, &[], 1)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {}",
            set.set_clause,
            set.values.len() + 1,
            JOB_COLUMNS
        );

        // Equity binds as NUMERIC, everything else through the generic binder
        let mut q = sqlx::query_as::<_, Job>(&sql);
        for (name, value) in fields.iter() {
            if *name == "equity" {
                q = q.bind(equity);
            } else {
                q = bind_value_as(q, value);
            }
        }
        q.bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {}", id)))
    }

    pub async fn remove(pool: &PgPool, id: i32) -> Result<(), ApiError> {
        sqlx::query_scalar::<_, i32>("DELETE FROM jobs WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {}", id)))?;
        Ok(())
    }
}
