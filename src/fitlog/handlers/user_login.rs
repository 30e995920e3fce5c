use super::{ApiError, AuthResponse, Message};
use crate::fitlog::{
    store::{FindOptions, UserFilter, UserStore},
    token::TokenSigner,
};
use anyhow::Context;
use axum::{extract::Extension, Json};
use serde::Deserialize;
use std::{fmt, sync::Arc};
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Default)]
pub struct UserLogin {
    username: Option<String>,
    email: Option<String>,
    #[schema(format = Password)]
    #[serde(default)]
    password: String,
}

impl fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserLogin")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[utoipa::path(
    post,
    path= "/api/users/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful", body = AuthResponse, content_type = "application/json"),
        (status = 400, description = "User not found or incorrect password", body = Message),
        (status = 500, description = "Server error", body = Message),
    ),
    tag= "users"
)]
#[instrument(skip(store, signer))]
pub async fn login(
    store: Extension<Arc<dyn UserStore>>,
    signer: Extension<Arc<TokenSigner>>,
    payload: Option<Json<UserLogin>>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Some(Json(credentials)) = payload else {
        return Err(ApiError::BadRequest("Missing payload".to_string()));
    };

    let UserLogin {
        username,
        email,
        password,
    } = credentials;

    if username.is_none() && email.is_none() {
        debug!("Login without username or email");

        return Err(ApiError::BadRequest("User not found".to_string()));
    }

    let filter = UserFilter::UsernameOrEmail { username, email };

    let Some(user) = store.find_one(&filter, FindOptions::default()).await? else {
        debug!("User not found");

        return Err(ApiError::BadRequest("User not found".to_string()));
    };

    let correct = user
        .is_correct_password(&password)
        .await
        .map_err(ApiError::Internal)?;

    if !correct {
        debug!("Incorrect password for {}", user.id);

        return Err(ApiError::BadRequest("Incorrect password".to_string()));
    }

    let token = signer
        .sign(&user)
        .context("failed to sign token")
        .map_err(ApiError::Internal)?;

    debug!("Login successful");

    Ok(Json(AuthResponse { token, user }))
}
