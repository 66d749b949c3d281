use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::users::repo_types::User;

/// Request body for `POST /api/users`.
///
/// Fields stay loosely typed so that a missing field, a `null` and a value
/// of the wrong JSON type each produce their own validation message.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(value_type = String, example = "John Doe")]
    pub name: Option<Value>,
    #[schema(value_type = String, example = "john@example.com")]
    pub email: Option<Value>,
    #[schema(value_type = String, example = "secret123")]
    pub password: Option<Value>,
    #[schema(value_type = String, example = "secret123")]
    pub password_confirmation: Option<Value>,
}

/// Request body for `PUT /api/users/{id}`. Passwords are not updatable here.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(value_type = String, example = "Jane Doe")]
    pub name: Option<Value>,
    #[schema(value_type = String, example = "jane@example.com")]
    pub email: Option<Value>,
}

/// A user as returned by list and read.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserPayload {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Stored argon2 hash. Omitted when `EXPOSE_PASSWORD_HASH=false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl UserPayload {
    pub fn from_user(user: User, expose_password_hash: bool) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            password: expose_password_hash.then_some(user.password),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Body of every 2xx response except list.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessEnvelope {
    #[schema(example = true)]
    pub status: bool,
    #[schema(example = "User created successfully!")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UserPayload>,
}

impl SuccessEnvelope {
    pub fn message(message: &str) -> Self {
        Self {
            status: true,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn with_data(message: &str, data: UserPayload) -> Self {
        Self {
            status: true,
            message: message.to_string(),
            data: Some(data),
        }
    }
}
