//! Input rules for creating and updating users.
//!
//! Rules are checked field by field in declaration order and the first
//! failing rule decides the response. String inputs are trimmed (passwords
//! excepted) and an empty string counts as missing.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::ApiError;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest};
use crate::users::repo::UserStore;

pub const NAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 20;

pub const EMAIL_TAKEN: &str = "The email has already been taken.";
const EMAIL_INVALID: &str = "The email field must be a valid email address.";
const PASSWORD_MISMATCH: &str = "The password field confirmation does not match.";

/// Validated input for a new user. `password` is still plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUserInput {
    pub name: String,
    pub email: String,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug, PartialEq)]
enum Input<'a> {
    Missing,
    Text(String),
    Other(&'a Value),
}

fn normalize(value: Option<&Value>, trim: bool) -> Input<'_> {
    match value {
        None | Some(Value::Null) => Input::Missing,
        Some(Value::String(s)) => {
            let s = if trim { s.trim() } else { s.as_str() };
            if s.is_empty() {
                Input::Missing
            } else {
                Input::Text(s.to_string())
            }
        }
        Some(Value::Array(items)) if items.is_empty() => Input::Missing,
        Some(other) => Input::Other(other),
    }
}

fn required(field: &str) -> String {
    format!("The {field} field is required.")
}

fn too_long(field: &str, max: usize) -> String {
    format!("The {field} field must not be greater than {max} characters.")
}

fn check_name(value: Option<&Value>) -> Result<String, String> {
    match normalize(value, true) {
        Input::Missing => Err(required("name")),
        Input::Other(_) => Err("The name field must be a string.".to_string()),
        Input::Text(name) if name.chars().count() > NAME_MAX => Err(too_long("name", NAME_MAX)),
        Input::Text(name) => Ok(name),
    }
}

/// Every email rule except uniqueness, which needs the store.
fn check_email_format(value: Option<&Value>) -> Result<String, String> {
    match normalize(value, true) {
        Input::Missing => Err(required("email")),
        Input::Other(_) => Err(EMAIL_INVALID.to_string()),
        Input::Text(email) if email.chars().count() > EMAIL_MAX => {
            Err(too_long("email", EMAIL_MAX))
        }
        Input::Text(email) if !is_valid_email(&email) => Err(EMAIL_INVALID.to_string()),
        Input::Text(email) => Ok(email),
    }
}

fn check_password(password: Option<&Value>, confirmation: Option<&Value>) -> Result<String, String> {
    let password = match normalize(password, false) {
        Input::Missing => return Err(required("password")),
        other => other,
    };
    if password != normalize(confirmation, false) {
        return Err(PASSWORD_MISMATCH.to_string());
    }
    // Numbers are measured by their text form, which is also what gets hashed.
    let text = match password {
        Input::Text(p) => Some(p),
        Input::Other(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    match text {
        Some(p) if (PASSWORD_MIN..=PASSWORD_MAX).contains(&p.chars().count()) => Ok(p),
        _ => Err(format!(
            "The password field must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters."
        )),
    }
}

/// Fails when `email` belongs to a user other than `except`.
async fn check_email_unique(
    store: &dyn UserStore,
    email: &str,
    except: Option<i64>,
) -> Result<(), ApiError> {
    match store.find_by_email(email).await? {
        Some(existing) if Some(existing.id) != except => {
            Err(ApiError::Validation(EMAIL_TAKEN.to_string()))
        }
        _ => Ok(()),
    }
}

pub async fn validate_create(
    store: &dyn UserStore,
    req: &CreateUserRequest,
) -> Result<CreateUserInput, ApiError> {
    let name = check_name(req.name.as_ref()).map_err(ApiError::Validation)?;
    let email = check_email_format(req.email.as_ref()).map_err(ApiError::Validation)?;
    check_email_unique(store, &email, None).await?;
    let password = check_password(req.password.as_ref(), req.password_confirmation.as_ref())
        .map_err(ApiError::Validation)?;
    Ok(CreateUserInput {
        name,
        email,
        password,
    })
}

/// Same rules as create minus the password; the user's own email is not a
/// uniqueness conflict.
pub async fn validate_update(
    store: &dyn UserStore,
    id: i64,
    req: &UpdateUserRequest,
) -> Result<UpdateUserInput, ApiError> {
    let name = check_name(req.name.as_ref()).map_err(ApiError::Validation)?;
    let email = check_email_format(req.email.as_ref()).map_err(ApiError::Validation)?;
    check_email_unique(store, &email, Some(id)).await?;
    Ok(UpdateUserInput { name, email })
}
