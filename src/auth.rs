//! Caller identity, normally established by an upstream auth gateway
//! that verifies credentials and forwards `x-user-id` / `x-user-role`
//! headers. This extractor is the seam the handlers consume it through.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::Role;

#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .ok_or(AppError::Unauthorized)?
            .to_string();

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("student")
            .parse()?;

        Ok(Identity { id, role })
    }
}
