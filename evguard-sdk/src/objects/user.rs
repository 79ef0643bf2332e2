//! User API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default page size for `GET /users`.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Largest page size accepted by `GET /users`.
pub const MAX_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    /// Unix timestamp (seconds).
    pub created_at: i64,
    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Body of `PATCH /users/{id}`. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

/// Query string of `GET /users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ListUsersQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_body() {
        let body: UpdateUserRequest = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();
        assert_eq!(body.name.as_deref(), Some("Ana"));
        assert!(body.email.is_none());
        assert!(body.is_admin.is_none());
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"name":"Ana"}"#);
    }

    #[test]
    fn test_create_defaults_to_non_admin() {
        let body: CreateUserRequest =
            serde_json::from_str(r#"{"email":"a@b.c","name":"Ana"}"#).unwrap();
        assert!(!body.is_admin);
    }
}
