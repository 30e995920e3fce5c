use super::{ApiError, Message, SessionUser};
use crate::fitlog::{
    store::{FindOptions, UserFilter, UserStore},
    user::User,
};
use anyhow::Context;
use axum::{
    extract::{Extension, Path},
    Json,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Look up one user, without the internal version and with workouts expanded.
///
/// # Errors
/// `NotFound` when nothing matches, `Internal` on any store fault.
pub async fn get_single_user(store: &dyn UserStore, filter: UserFilter) -> Result<User, ApiError> {
    let options = FindOptions::default().without_version().populate();

    match store.find_one(&filter, options).await? {
        Some(user) => Ok(user),
        None => {
            debug!("User not found: {:?}", filter);

            Err(ApiError::NotFound)
        }
    }
}

#[utoipa::path(
    get,
    path= "/api/users/me",
    responses (
        (status = 200, description = "The authenticated user", body = User, content_type = "application/json"),
        (status = 401, description = "Missing or invalid token", body = Message),
        (status = 404, description = "User not found", body = Message),
        (status = 500, description = "Server error", body = Message),
    ),
    security(("bearer" = [])),
    tag= "users"
)]
#[instrument(skip(store))]
pub async fn me(
    store: Extension<Arc<dyn UserStore>>,
    session: SessionUser,
) -> Result<Json<User>, ApiError> {
    get_single_user(store.0.as_ref(), UserFilter::Id(session.id))
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path= "/api/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses (
        (status = 200, description = "User found", body = User, content_type = "application/json"),
        (status = 404, description = "User not found", body = Message),
        (status = 500, description = "Server error", body = Message),
    ),
    tag= "users"
)]
#[instrument(skip(store))]
pub async fn user_by_id(
    store: Extension<Arc<dyn UserStore>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    // A malformed id is a lookup fault, not a miss.
    let id = Uuid::parse_str(&id)
        .with_context(|| format!("malformed user id: {id}"))
        .map_err(ApiError::Internal)?;

    get_single_user(store.0.as_ref(), UserFilter::Id(id))
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path= "/api/users/username/{username}",
    params(("username" = String, Path, description = "Username")),
    responses (
        (status = 200, description = "User found", body = User, content_type = "application/json"),
        (status = 404, description = "User not found", body = Message),
        (status = 500, description = "Server error", body = Message),
    ),
    tag= "users"
)]
#[instrument(skip(store))]
pub async fn user_by_username(
    store: Extension<Arc<dyn UserStore>>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    get_single_user(store.0.as_ref(), UserFilter::Username(username))
        .await
        .map(Json)
}
