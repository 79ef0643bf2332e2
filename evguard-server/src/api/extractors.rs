//! Custom Axum extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use evguard_core::entities::users::{GetUserById, Responsible};
use evguard_sdk::objects::USER_ID_HEADER;
use kanau::processor::Processor;
use uuid::Uuid;

use super::ApiError;
use crate::state::AppState;

/// The user a request acts on behalf of, from the `X-User-Id` header.
///
/// A request without the header is a system call and carries `None`.
/// Privileges are always read from the current user record. A session
/// flagged by a `user:updated` handler is re-validated here and its flag
/// cleared.
pub struct ResponsibleUser(pub Option<Responsible>);

impl FromRequestParts<AppState> for ResponsibleUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(ResponsibleUser(None));
        };

        let id: Uuid = header
            .to_str()
            .ok()
            .and_then(|raw| raw.parse().ok())
            .ok_or(ApiError::BadRequest("invalid X-User-Id header"))?;

        let user = state
            .processor
            .process(GetUserById { id })
            .await?
            .ok_or(ApiError::Unauthorized("unknown user in X-User-Id header"))?;

        if state.revocations.take(user.id) {
            tracing::info!(
                user_id = %user.id,
                is_admin = user.is_admin,
                "Session re-validated after profile update"
            );
        }

        Ok(ResponsibleUser(Some(Responsible {
            id: user.id,
            is_admin: user.is_admin,
        })))
    }
}
