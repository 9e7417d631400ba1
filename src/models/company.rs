use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, PgPool};

use crate::database::bind_value_as;
use crate::database::update::sql_for_partial_update;
use crate::error::ApiError;
use crate::filter::{CompanyFilter, FilterWhere};
use crate::models::job::Job;

const COMPANY_COLUMNS: &str = "handle, name, num_employees, description, logo_url";

/// Logical-to-physical column renames for partial updates
const COLUMN_MAP: &[(&str, &str)] = &[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub num_employees: Option<i32>,
    pub description: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyWithJobs {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyInput {
    pub handle: String,
    pub name: String,
    pub num_employees: Option<i32>,
    pub description: String,
    pub logo_url: Option<String>,
}

impl CompanyInput {
    fn validate(&self) -> Result<(), ApiError> {
        if self.handle.is_empty() {
            return Err(ApiError::bad_request("handle cannot be empty"));
        }
        if self.handle != self.handle.to_lowercase() {
            return Err(ApiError::bad_request("handle must be lowercase"));
        }
        if self.name.is_empty() {
            return Err(ApiError::bad_request("name cannot be empty"));
        }
        if matches!(self.num_employees, Some(n) if n < 0) {
            return Err(ApiError::bad_request("numEmployees must be non-negative"));
        }
        Ok(())
    }
}

/// Partial update payload; handle is immutable and not accepted here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub num_employees: Option<i32>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

impl CompanyUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        if matches!(self.num_employees, Some(n) if n < 0) {
            return Err(ApiError::bad_request("numEmployees must be non-negative"));
        }
        Ok(())
    }

    /// Lower to an ordered field list for the SET-clause builder.
    fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = vec![];
        if let Some(name) = &self.name {
            fields.push(("name", json!(name)));
        }
        if let Some(num) = self.num_employees {
            fields.push(("numEmployees", json!(num)));
        }
        if let Some(description) = &self.description {
            fields.push(("description", json!(description)));
        }
        if let Some(logo_url) = &self.logo_url {
            fields.push(("logoUrl", json!(logo_url)));
        }
        fields
    }
}

impl Company {
    /// Create a company. Duplicate handles are rejected inside the same
    /// transaction that performs the insert.
    pub async fn create(pool: &PgPool, input: &CompanyInput) -> Result<Company, ApiError> {
        input.validate()?;

        let mut tx = pool.begin().await?;

        let existing = sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
            .bind(&input.handle)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(ApiError::bad_request(format!(
                "Duplicate company: {}",
                input.handle
            )));
        }

        let sql = format!(
            "INSERT INTO companies (handle, name, num_employees, description, logo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            COMPANY_COLUMNS
        );
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(&input.handle)
            .bind(&input.name)
            .bind(input.num_employees)
            .bind(&input.description)
            .bind(&input.logo_url)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(company)
    }

    /// List companies matching the filter, ordered by name. Empty result is
    /// success, not NotFound.
    pub async fn find_all(pool: &PgPool, filter: &CompanyFilter) -> Result<Vec<Company>, ApiError> {
        filter.validate()?;

        let compiled = FilterWhere::generate(&filter.predicates(), 1);
        let sql = if compiled.query.is_empty() {
            format!("SELECT {} FROM companies ORDER BY name", COMPANY_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM companies WHERE {} ORDER BY name",
                COMPANY_COLUMNS, compiled.query
            )
        };

        let mut q = sqlx::query_as::<_, Company>(&sql);
        for param in compiled.params.iter() {
            q = bind_value_as(q, param);
        }
        Ok(q.fetch_all(pool).await?)
    }

    /// Fetch one company with its jobs.
    pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyWithJobs, ApiError> {
        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No company: {}", handle)))?;

        let jobs = Job::find_by_company(pool, handle).await?;
        Ok(CompanyWithJobs { company, jobs })
    }

    /// Partial update; handle is immutable.
    pub async fn update(
        pool: &PgPool,
        handle: &str,
        data: &CompanyUpdate,
    ) -> Result<Company, ApiError> {
        data.validate()?;

        let fields = data.fields();
        let set = sql_for_partial_update(&fields, COLUMN_MAP, 1)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {}",
            set.set_clause,
            set.values.len() + 1,
            COMPANY_COLUMNS
        );

        let mut q = sqlx::query_as::<_, Company>(&sql);
        for param in set.values.iter() {
            q = bind_value_as(q, param);
        }
        q.bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No company: {}", handle)))
    }

    /// Delete a company; jobs cascade at the store level.
    pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), ApiError> {
        sqlx::query_scalar::<_, String>("DELETE FROM companies WHERE handle = $1 RETURNING handle")
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No company: {}", handle)))?;
        Ok(())
    }
}
