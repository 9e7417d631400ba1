use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth;
use crate::config;
use crate::policy::Caller;

/// Identity-extraction middleware.
///
/// Reads the bearer token from the `authorization` header and injects a
/// `Caller` request extension. A missing, malformed, or invalid token yields
/// `Caller::Anonymous` rather than a hard failure; route policies decide
/// whether anonymous access is acceptable.
pub async fn caller_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let caller = match extract_bearer_token(&headers) {
        Some(token) => {
            let secret = &config::config().security.jwt_secret;
            match auth::verify_token(&token, secret) {
                Ok(claims) => claims.caller(),
                Err(e) => {
                    tracing::debug!("Rejecting bearer token: {}", e);
                    Caller::Anonymous
                }
            }
        }
        None => Caller::Anonymous,
    };

    request.extensions_mut().insert(caller);
    next.run(request).await
}

/// Extract the bearer token from the Authorization header, if any.
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))?;

    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
