pub mod auth;
pub mod companies;
pub mod jobs;
pub mod users;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Deserialize a JSON body into a typed payload, surfacing shape problems
/// (missing/unknown/ill-typed fields) as BadRequest rather than a transport
/// level rejection.
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::bad_request(e.to_string()))
}
