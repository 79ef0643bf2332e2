//! User handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use evguard_core::entities::users::{CreateUser, GetUserById, ListUsers, UpdateUser, User};
use evguard_sdk::objects::user::MAX_PAGE_SIZE;
use evguard_sdk::objects::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserResponse};
use kanau::processor::Processor;
use uuid::Uuid;

use super::ApiError;
use super::extractors::ResponsibleUser;
use crate::state::AppState;

/// Convert a `User` (domain model) into a `UserResponse` (API model).
fn to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        is_admin: user.is_admin,
        created_at: user.created_at.unix_timestamp(),
        updated_at: user.updated_at.unix_timestamp(),
    }
}

/// `GET /users` - list users in creation order.
pub async fn list_users(
    state: State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .processor
        .process(ListUsers {
            offset: query.offset,
            limit: query.limit.min(MAX_PAGE_SIZE),
        })
        .await?;
    Ok(Json(users.iter().map(to_response).collect::<Vec<_>>()))
}

/// `POST /users` - create a user.
///
/// Queues `user:created` for delivery after the response is produced.
pub async fn create_user(
    state: State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .processor
        .process(CreateUser {
            email: body.email,
            name: body.name,
            is_admin: body.is_admin,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(&user))))
}

/// `GET /users/{id}` - fetch one user.
pub async fn get_user(
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .processor
        .process(GetUserById { id })
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_response(&user)))
}

/// `PATCH /users/{id}` - partially update a user.
///
/// Non-admin callers may only update themselves. Queues `user:updated`.
pub async fn update_user(
    state: State<AppState>,
    ResponsibleUser(responsible): ResponsibleUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .processor
        .process(UpdateUser {
            id,
            responsible,
            email: body.email,
            name: body.name,
            is_admin: body.is_admin,
        })
        .await?;
    Ok(Json(to_response(&user)))
}
