use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;

use super::parse_body;
use crate::auth::create_token;
use crate::error::ApiError;
use crate::models::user::{User, UserInput};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoginPayload {
    username: String,
    password: String,
}

/// Self-registration payload. Role selection is not available here; admin
/// accounts are created through POST /users by an existing admin.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RegisterPayload {
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    email: String,
}

/// POST /auth/token - exchange credentials for a bearer token
pub async fn token(
    State(pool): State<PgPool>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: LoginPayload = parse_body(body)?;
    let user = User::authenticate(&pool, &payload.username, &payload.password).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok(Json(json!({ "token": token })))
}

/// POST /auth/register - self-register a new (non-admin) user
pub async fn register(
    State(pool): State<PgPool>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: RegisterPayload = parse_body(body)?;
    let input = UserInput {
        username: payload.username,
        password: payload.password,
        first_name: payload.first_name,
        last_name: payload.last_name,
        email: payload.email,
        is_admin: false,
    };
    let user = User::register(&pool, &input).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}
