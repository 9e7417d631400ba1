use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;

use super::parse_body;
use crate::auth::create_token;
use crate::error::ApiError;
use crate::models::user::{User, UserInput, UserUpdate};
use crate::policy::{authorize, Caller, RoutePolicy};

/// POST /users (AdminOnly) - admin-created account, may itself be admin
pub async fn create(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    let input: UserInput = parse_body(body)?;
    let user = User::register(&pool, &input).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user, "token": token }))))
}

/// GET /users (AdminOnly)
pub async fn list(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::AdminOnly)?;
    let users = User::find_all(&pool).await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/:username (SelfOrAdmin) - includes applied job ids
pub async fn get(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::SelfOrAdmin(&username))?;
    let user = User::get(&pool, &username).await?;
    Ok(Json(json!({ "user": user })))
}

/// PATCH /users/:username (SelfOrAdmin) - partial body excluding
/// username/isAdmin
pub async fn update(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::SelfOrAdmin(&username))?;
    let data: UserUpdate = parse_body(body)?;
    let user = User::update(&pool, &username, &data).await?;
    Ok(Json(json!({ "user": user })))
}

/// DELETE /users/:username (SelfOrAdmin)
pub async fn remove(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::SelfOrAdmin(&username))?;
    User::remove(&pool, &username).await?;
    Ok(Json(json!({ "deleted": username })))
}

/// POST /users/:username/jobs/:id (SelfOrAdmin)
pub async fn apply(
    State(pool): State<PgPool>,
    Extension(caller): Extension<Caller>,
    Path((username, job_id)): Path<(String, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&caller, RoutePolicy::SelfOrAdmin(&username))?;
    User::apply(&pool, &username, job_id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "applied": job_id.to_string() }))))
}
