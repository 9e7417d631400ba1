use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, PgPool};

use crate::auth::{hash_password, verify_password};
use crate::database::bind_value_as;
use crate::database::update::sql_for_partial_update;
use crate::error::ApiError;

const USER_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

const COLUMN_MAP: &[(&str, &str)] = &[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Row shape for credential checks; the hash never leaves this module.
#[derive(Debug, FromRow)]
struct UserCredentials {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
    is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithJobs {
    #[serde(flatten)]
    pub user: User,
    /// Ids of jobs this user has applied to (derived join, ordered)
    pub jobs: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserInput {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl UserInput {
    fn validate(&self) -> Result<(), ApiError> {
        if self.username.is_empty() {
            return Err(ApiError::bad_request("username cannot be empty"));
        }
        if self.password.len() < 5 {
            return Err(ApiError::bad_request("password must be at least 5 characters"));
        }
        validate_email(&self.email)
    }
}

/// Partial update payload; username and isAdmin are immutable here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserUpdate {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if matches!(&self.password, Some(p) if p.len() < 5) {
            return Err(ApiError::bad_request("password must be at least 5 characters"));
        }
        Ok(())
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = vec![];
        if let Some(first_name) = &self.first_name {
            fields.push(("firstName", json!(first_name)));
        }
        if let Some(last_name) = &self.last_name {
            fields.push(("lastName", json!(last_name)));
        }
        if let Some(email) = &self.email {
            fields.push(("email", json!(email)));
        }
        if let Some(password) = &self.password {
            fields.push(("password", json!(hash_password(password))));
        }
        fields
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(())
}

impl User {
    /// Register a user; duplicate usernames are rejected inside the insert
    /// transaction. The password is stored only as a salted hash.
    pub async fn register(pool: &PgPool, input: &UserInput) -> Result<User, ApiError> {
        input.validate()?;

        let mut tx = pool.begin().await?;

        let existing = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(&input.username)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(ApiError::bad_request(format!(
                "Duplicate username: {}",
                input.username
            )));
        }

        let hashed = hash_password(&input.password);
        let sql = format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&input.username)
            .bind(&hashed)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(input.is_admin)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Verify username/password. Failure is Unauthorized and does not reveal
    /// which part was wrong.
    pub async fn authenticate(
        pool: &PgPool,
        username: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let row = sqlx::query_as::<_, UserCredentials>(
            "SELECT username, password, first_name, last_name, email, is_admin \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(creds) if verify_password(password, &creds.password) => Ok(User {
                username: creds.username,
                first_name: creds.first_name,
                last_name: creds.last_name,
                email: creds.email,
                is_admin: creds.is_admin,
            }),
            _ => Err(ApiError::unauthorized("Invalid username/password")),
        }
    }

    /// List all users, ordered by username.
    pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, ApiError> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?)
    }

    /// Fetch one user plus the ids of jobs they applied to.
    pub async fn get(pool: &PgPool, username: &str) -> Result<UserWithJobs, ApiError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {}", username)))?;

        let jobs = sqlx::query_scalar::<_, i32>(
            "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(UserWithJobs { user, jobs })
    }

    /// Partial update; username is immutable.
    pub async fn update(pool: &PgPool, username: &str, data: &UserUpdate) -> Result<User, ApiError> {
        data.validate()?;

        let fields = data.fields();
        let set = sql_for_partial_update(&fields, COLUMN_MAP, 1)?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = ${} RETURNING {}",
            set.set_clause,
            set.values.len() + 1,
            USER_COLUMNS
        );

        let mut q = sqlx::query_as::<_, User>(&sql);
        for param in set.values.iter() {
            q = bind_value_as(q, param);
        }
        q.bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {}", username)))
    }

    /// Delete a user; applications cascade at the store level.
    pub async fn remove(pool: &PgPool, username: &str) -> Result<(), ApiError> {
        sqlx::query_scalar::<_, String>("DELETE FROM users WHERE username = $1 RETURNING username")
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {}", username)))?;
        Ok(())
    }

    /// Record that a user applied to a job. Both entities must exist and a
    /// duplicate application is an error, not a no-op; all checks share the
    /// insert transaction.
    pub async fn apply(pool: &PgPool, username: &str, job_id: i32) -> Result<(), ApiError> {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(ApiError::not_found(format!("No user: {}", username)));
        }

        let job = sqlx::query_scalar::<_, i32>("SELECT id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;
        if job.is_none() {
            return Err(ApiError::not_found(format!("No job: {}", job_id)));
        }

        let applied = sqlx::query_scalar::<_, i32>(
            "SELECT job_id FROM applications WHERE username = $1 AND job_id = $2",
        )
        .bind(username)
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;
        if applied.is_some() {
            return Err(ApiError::bad_request(format!(
                "User {} already applied to job {}",
                username, job_id
            )));
        }

        sqlx::query("INSERT INTO applications (username, job_id) VALUES ($1, $2)")
            .bind(username)
            .bind(job_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
