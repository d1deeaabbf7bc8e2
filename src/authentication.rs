use crate::{
    crud_ops::SharedStorage,
    entities::{NewUser, User},
    error::ApiError,
    validation,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;

// Checks credentials only. No session is issued and no route requires one.

pub async fn sign_up(
    Extension(store): Extension<SharedStorage>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(body) = payload?;
    let credentials = validation::credentials(&body)?;

    // cheap early exit; the insert below re-checks under the store lock
    if store
        .get_user_by_username(&credentials.username)
        .await
        .is_some()
    {
        return Err(taken(&credentials.username));
    }

    // argon2 hashing is blocking, hence `tokio::task::spawn_blocking()`
    let NewUser { username, password } = credentials;
    let password =
        tokio::task::spawn_blocking(move || password_auth::generate_hash(password)).await?;

    let Some(user) = store
        .create_user_if_absent(NewUser {
            username: username.clone(),
            password,
        })
        .await
    else {
        return Err(taken(&username));
    };
    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

fn taken(username: &str) -> ApiError {
    ApiError::Conflict(format!("username {username:?} is already taken"))
}

pub async fn sign_in(
    Extension(store): Extension<SharedStorage>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(body) = payload?;
    let credentials = validation::credentials(&body)?;

    let Some(user) = store.get_user_by_username(&credentials.username).await else {
        tracing::debug!(username = %credentials.username, "sign in for unknown user");
        return Err(ApiError::Unauthorized);
    };

    let verified = tokio::task::spawn_blocking(move || {
        password_auth::verify_password(credentials.password, &user.password)
            .is_ok()
            .then_some(user)
    })
    .await?;

    verified.map(Json).ok_or(ApiError::Unauthorized)
}

pub async fn get_user(
    path: Result<Path<i64>, PathRejection>,
    Extension(store): Extension<SharedStorage>,
) -> Result<Json<User>, ApiError> {
    let Path(id) = path?;
    store
        .get_user(id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("user"))
}
