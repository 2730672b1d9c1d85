use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::jwt::{get_bearer_token, validate_jwt};
use crate::error::HttpAppError;
use crate::state::AppState;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: String, // user_id
    pub iat: i64,
    pub exp: i64,
}

/// The caller, as identified by a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

// Extracted from request parts so it can precede `Multipart`.
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = get_bearer_token(&parts.headers).map_err(|e| state.http_error(e))?;
        let user_id =
            validate_jwt(token, state.config.jwt_secret()).map_err(|e| state.http_error(e))?;
        Ok(AuthUser { user_id })
    }
}
