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
use crate::filter::CompanyFilter;
use crate::models::company::{Company, CompanyInput, CompanyUpdate};
use crate::policy::{authorize, Caller, RoutePolicy};

/// POST /companies (AdminOnly)
pub async fn create(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    let input: CompanyInput = parse_body(body)?;
    let company = Company::create(&pool, &input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": company }))))
}

/// GET /companies (Public) - optional name/minEmployees/maxEmployees filters
pub async fn list(
    State(pool): State<PgPool>,
    Query(filter): Query<CompanyFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let companies = Company::find_all(&pool, &filter).await?;
    Ok(Json(json!({ "companies": companies })))
}

/// GET /companies/:handle (Public) - includes the company's jobs
pub async fn get(
    State(pool): State<PgPool>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let company = Company::get(&pool, &handle).await?;
    Ok(Json(json!({ "company": company })))
}

/// PATCH /companies/:handle (AdminOnly) - partial body excluding handle
pub async fn update(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path(handle): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    let data: CompanyUpdate = parse_body(body)?;
    let company = Company::update(&pool, &handle, &data).await?;
    Ok(Json(json!({ "company": company })))
}

/// DELETE /companies/:handle (AdminOnly)
pub async fn remove(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    Company::remove(&pool, &handle).await?;
    Ok(Json(json!({ "deleted": handle })))
}
