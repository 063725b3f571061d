use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_HEADER: &str = "x-user-id";

/// Verified id of the user making the request. Authentication happens
/// upstream; this only reads the forwarded header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ACTOR_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-Id header"))?;

        let value = header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid X-User-Id header format"))?;

        Uuid::parse_str(value.trim())
            .map(ActorId)
            .map_err(|_| ApiError::unauthorized("Invalid X-User-Id header format"))
    }
}
