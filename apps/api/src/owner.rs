use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::errors::AppError;

/// Header set by the authentication layer in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user a request acts on behalf of.
///
/// Read from request parts rather than an extension so it can precede
/// `Multipart` in a handler's argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerId(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(OwnerId)
            .ok_or(AppError::Unauthorized)
    }
}
