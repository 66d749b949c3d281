use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

use crate::{
    error::FailureEnvelope,
    state::AppState,
    users::dto::{CreateUserRequest, SuccessEnvelope, UpdateUserRequest, UserPayload},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::users::handlers::list_users,
        crate::users::handlers::create_user,
        crate::users::handlers::show_user,
        crate::users::handlers::update_user,
        crate::users::handlers::delete_user
    ),
    components(schemas(
        CreateUserRequest,
        UpdateUserRequest,
        UserPayload,
        SuccessEnvelope,
        FailureEnvelope
    )),
    tags((name = "users", description = "User management")),
    info(
        title = "User Management API",
        description = "CRUD endpoints for user records",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

pub fn docs_routes() -> Router<AppState> {
    Router::new().route(
        "/docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
