use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::{ApiError, FailureEnvelope},
    state::AppState,
    users::{
        dto::{CreateUserRequest, SuccessEnvelope, UpdateUserRequest, UserPayload},
        extractors::{JsonBody, UserId},
        repo_types::{NewUser, User, UserChanges},
        validation::{validate_create, validate_update},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(show_user).put(update_user).delete(delete_user),
        )
}

fn log_rejection(op: &'static str) -> impl Fn(ApiError) -> ApiError {
    move |e| {
        if let ApiError::Validation(msg) = &e {
            warn!(%msg, op, "validation failed");
        }
        e
    }
}

async fn existing_user(state: &AppState, id: i64) -> Result<User, ApiError> {
    match state.store.find_by_id(id).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id = id, "user not found");
            Err(ApiError::NotFound(id.to_string()))
        }
    }
}

/// Get list of users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "Successful response", body = [UserPayload]),
        (status = 500, description = "Internal server error", body = FailureEnvelope)
    )
)]
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserPayload>>, ApiError> {
    let expose = state.config.expose_password_hash;
    let users = state
        .store
        .list()
        .await?
        .into_iter()
        .map(|u| UserPayload::from_user(u, expose))
        .collect();
    Ok(Json(users))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = SuccessEnvelope),
        (status = 422, description = "Validation failed", body = FailureEnvelope),
        (status = 500, description = "Internal server error", body = FailureEnvelope)
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<Json<SuccessEnvelope>, ApiError> {
    let input = validate_create(state.store.as_ref(), &payload)
        .await
        .map_err(log_rejection("create"))?;

    let password_hash = match state.hasher.hash(&input.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!(error = %e, "hash_password failed");
            return Err(ApiError::Internal);
        }
    };

    let user = state
        .store
        .create(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
        })
        .await
        .map_err(ApiError::from)
        .map_err(log_rejection("create"))?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok(Json(SuccessEnvelope::message("User created successfully!")))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = SuccessEnvelope),
        (status = 404, description = "User not found", body = FailureEnvelope)
    )
)]
#[instrument(skip(state))]
pub async fn show_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<SuccessEnvelope>, ApiError> {
    let user = existing_user(&state, id).await?;
    let data = UserPayload::from_user(user, state.config.expose_password_hash);
    Ok(Json(SuccessEnvelope::with_data(
        "User retrieved successfully!",
        data,
    )))
}

/// Update a user's name and email
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = SuccessEnvelope),
        (status = 404, description = "User not found", body = FailureEnvelope),
        (status = 422, description = "Validation failed", body = FailureEnvelope),
        (status = 500, description = "Internal server error", body = FailureEnvelope)
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    payload: Result<JsonBody<UpdateUserRequest>, ApiError>,
) -> Result<Json<SuccessEnvelope>, ApiError> {
    // The target must exist before the body is looked at.
    existing_user(&state, id).await?;
    let JsonBody(payload) = payload?;

    let input = validate_update(state.store.as_ref(), id, &payload)
        .await
        .map_err(log_rejection("update"))?;

    let user = state
        .store
        .update(
            id,
            UserChanges {
                name: input.name,
                email: input.email,
            },
        )
        .await
        .map_err(ApiError::from)
        .map_err(log_rejection("update"))?;

    info!(user_id = user.id, "user updated");
    Ok(Json(SuccessEnvelope::message("User updated successfully!")))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = SuccessEnvelope),
        (status = 404, description = "User not found", body = FailureEnvelope),
        (status = 500, description = "Internal server error", body = FailureEnvelope)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<SuccessEnvelope>, ApiError> {
    existing_user(&state, id).await?;

    if !state.store.delete(id).await? {
        // Removed by someone else between the lookup and the delete.
        return Err(ApiError::NotFound(id.to_string()));
    }

    info!(user_id = id, "user deleted");
    Ok(Json(SuccessEnvelope::message("User deleted successfully!")))
}
