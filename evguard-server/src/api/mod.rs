//! HTTP API.
//!
//! # Endpoints
//!
//! - `GET   /users`      – list users (paginated)
//! - `POST  /users`      – create a user
//! - `GET   /users/{id}` – fetch one user
//! - `PATCH /users/{id}` – partially update a user, on behalf of `X-User-Id`
//! - `GET   /clients`      – list clients (paginated)
//! - `POST  /clients`      – register a client
//! - `GET   /clients/{id}` – fetch one client
//! - `PATCH /clients/{id}` – partially update a client
//! - `GET   /audit`      – recent signal deliveries

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use evguard_core::entities::clients::ClientError;
use evguard_core::entities::users::UserError;
use evguard_sdk::objects::ErrorResponse;

use crate::state::AppState;

mod audit;
mod clients;
mod extractors;
mod users;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).patch(users::update_user),
        )
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/clients/{id}",
            get(clients::get_client).patch(clients::update_client),
        )
        .route("/audit", get(audit::list_audit))
}

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A user command failed.
    User(UserError),
    /// A client command failed.
    Client(ClientError),
    /// The requested resource does not exist.
    NotFound,
    /// The `X-User-Id` header is malformed.
    BadRequest(&'static str),
    /// The `X-User-Id` header names an unknown user.
    Unauthorized(&'static str),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        ApiError::User(err)
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        ApiError::Client(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::User(e) => {
                let status = match &e {
                    UserError::NotFound(_) => StatusCode::NOT_FOUND,
                    UserError::EmailTaken(_) => StatusCode::CONFLICT,
                    UserError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                    UserError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, e.to_string())
            }
            ApiError::Client(e) => {
                let status = match &e {
                    ClientError::NotFound(_) => StatusCode::NOT_FOUND,
                    ClientError::CodeTaken(_) => StatusCode::CONFLICT,
                    ClientError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
                };
                (status, e.to_string())
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "resource not found".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
