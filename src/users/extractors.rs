use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::ApiError;

/// `{id}` path segment. Anything that is not an integer cannot name a user,
/// so it is rejected as not found rather than as a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let raw = match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(raw)) => raw,
            Err(_) => {
                let last = parts.uri.path().rsplit('/').next().unwrap_or_default();
                return Err(ApiError::NotFound(last.to_string()));
            }
        };

        raw.parse::<i64>()
            .map(UserId)
            .map_err(|_| ApiError::NotFound(raw))
    }
}

/// JSON body whose rejection is answered with the failure envelope.
///
/// The body is read as JSON whatever the content type says, and an empty
/// body counts as `{}` so that the field rules report what is missing.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            warn!(error = %rejection.body_text(), "unreadable request body");
            ApiError::MalformedBody(rejection.body_text())
        })?;

        let parsed: Result<T, serde_json::Error> = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice(b"{}")
        } else {
            serde_json::from_slice(&bytes)
        };

        parsed.map(JsonBody).map_err(|e| {
            warn!(error = %e, "rejected request body");
            ApiError::MalformedBody(e.to_string())
        })
    }
}
