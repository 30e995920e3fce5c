use super::ApiError;
use crate::fitlog::token::TokenSigner;
use anyhow::anyhow;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Identity carried by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let signer = parts
            .extensions
            .get::<Arc<TokenSigner>>()
            .cloned()
            .ok_or_else(|| ApiError::Internal(anyhow!("token signer extension missing")))?;

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("You have no token!".to_string()))?;

        let claims = signer.verify(token).map_err(|err| {
            debug!("Rejected bearer token: {}", err);

            ApiError::Unauthorized("Invalid token!".to_string())
        })?;

        Ok(Self {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
