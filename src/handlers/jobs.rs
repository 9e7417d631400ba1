use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;

use super::parse_body;
use crate::error::ApiError;
use crate::filter::JobFilter;
use crate::models::job::{Job, JobInput, JobUpdate};
use crate::policy::{authorize, Caller, RoutePolicy};

/// POST /jobs (AdminOnly)
pub async fn create(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    let input: JobInput = parse_body(body)?;
    let job = Job::create(&pool, &input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// GET /jobs (Public) - optional title/minSalary/maxSalary/hasEquity filters
pub async fn list(
    State(pool): State<PgPool>,
    Query(filter): Query<JobFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = Job::find_all(&pool, &filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// GET /jobs/:id (Public)
pub async fn get(
    State(pool): State<PgPool>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let job = Job::get(&pool, id).await?;
    Ok(Json(json!({ "job": job })))
}

/// PATCH /jobs/:id (AdminOnly) - partial body excluding id/companyHandle
pub async fn update(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    let data: JobUpdate = parse_body(body)?;
    let job = Job::update(&pool, id, &data).await?;
    Ok(Json(json!({ "job": job })))
}

/// DELETE /jobs/:id (AdminOnly)
pub async fn remove(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    Job::remove(&pool, id).await?;
    Ok(Json(json!({ "deleted": id.to_string() })))
}
