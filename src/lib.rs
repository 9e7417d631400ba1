use axum::{
    routing::{get, post},
    Router,
};
use serde_json::json;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod policy;

/// Build the router. The pool is the only shared state; every request
/// borrows it through axum state.
pub fn app(pool: PgPool) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(company_routes())
        .merge(job_routes())
        .merge(user_routes())
        // Identity extraction runs on every route; policies are evaluated
        // inside the handlers
        .layer(axum::middleware::from_fn(middleware::caller_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}

fn auth_routes() -> Router<PgPool> {
    use handlers::auth;

    Router::new()
        .route("/auth/token", post(auth::token))
        .route("/auth/register", post(auth::register))
}

fn company_routes() -> Router<PgPool> {
    use handlers::companies;

    Router::new()
        .route("/companies", post(companies::create).get(companies::list))
        .route(
            "/companies/:handle",
            get(companies::get)
                .patch(companies::update)
                .delete(companies::remove),
        )
}

fn job_routes() -> Router<PgPool> {
    use handlers::jobs;

    Router::new()
        .route("/jobs", post(jobs::create).get(jobs::list))
        .route(
            "/jobs/:id",
            get(jobs::get).patch(jobs::update).delete(jobs::remove),
        )
}

fn user_routes() -> Router<PgPool> {
    use handlers::users;

    Router::new()
        .route("/users", post(users::create).get(users::list))
        .route(
            "/users/:username",
            get(users::get).patch(users::update).delete(users::remove),
        )
        .route("/users/:username/jobs/:id", post(users::apply))
}

async fn health(
    axum::extract::State(pool): axum::extract::State<PgPool>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
