use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::application::ports::IdentityVerifier;
use crate::domain::UserId;

use super::error::ApiError;

/// Verified caller identity, extracted from `Authorization: Bearer`.
/// Endpoints that take this reject unauthenticated requests with 401; the
/// chat relay deliberately does not (guest mode).
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<dyn IdentityVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        let verifier = Arc::<dyn IdentityVerifier>::from_ref(state);
        let user_id = verifier.verify(token).await.map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            ApiError::Unauthorized
        })?;

        Ok(CurrentUser(user_id))
    }
}
