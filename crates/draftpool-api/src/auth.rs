//! Caller identity.
//!
//! Authentication happens upstream; requests reach this service with the
//! verified user id in the `x-user-id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use draftpool_core::error::DomainError;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the verified caller id.
pub const CALLER_HEADER: &str = "x-user-id";

/// The verified caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub Uuid);

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(CALLER_HEADER).ok_or_else(|| {
            DomainError::Validation(format!("missing {CALLER_HEADER} header"))
        })?;
        let text = value
            .to_str()
            .map_err(|_| DomainError::Validation(format!("{CALLER_HEADER} is not ASCII")))?;
        let id = Uuid::parse_str(text.trim()).map_err(|e| {
            DomainError::Validation(format!("{CALLER_HEADER} is not a UUID: {e}"))
        })?;
        Ok(Self(id))
    }
}
