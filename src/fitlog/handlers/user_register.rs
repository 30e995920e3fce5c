use super::{ApiError, AuthResponse, Message};
use crate::fitlog::{store::UserStore, token::TokenSigner, user::NewUser};
use anyhow::Context;
use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path= "/api/users",
    request_body = NewUser,
    responses (
        (status = 200, description = "Registration successful", body = AuthResponse, content_type = "application/json"),
        (status = 400, description = "Username or email already exists, or the payload is invalid", body = Message),
        (status = 500, description = "Server error", body = Message),
    ),
    tag= "users"
)]
#[instrument(skip(store, signer))]
pub async fn create_user(
    store: Extension<Arc<dyn UserStore>>,
    signer: Extension<Arc<TokenSigner>>,
    payload: Option<Json<NewUser>>,
) -> Result<Json<AuthResponse>, ApiError> {
    // an absent or unreadable body is validated like an empty record
    let new_user = payload.map(|Json(new_user)| new_user).unwrap_or_default();

    let user = store.create(new_user).await?;

    debug!("User created: {}", user.id);

    let token = signer
        .sign(&user)
        .context("failed to sign token")
        .map_err(ApiError::Internal)?;

    Ok(Json(AuthResponse { token, user }))
}
