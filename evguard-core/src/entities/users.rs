//! User records and the commands that read and write them.
//!
//! Records live in memory for the lifetime of the process. Writes queue a
//! deferred signal (`user:created`, `user:updated`) carrying the user id.

use crate::framework::ServiceProcessor;
use crate::signals::topics;
use kanau::processor::Processor;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The caller on whose behalf a write is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Responsible {
    pub id: Uuid,
    pub is_admin: bool,
}

/// Shared in-memory user table.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    inner: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(Uuid),
    #[error("email already registered: {0}")]
    EmailTaken(String),
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

fn validate_email(email: &str) -> Result<(), UserError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(UserError::InvalidInput("email must look like name@domain")),
    }
}

fn validate_name(name: &str) -> Result<(), UserError> {
    if name.trim().is_empty() {
        return Err(UserError::InvalidInput("name must not be empty"));
    }
    Ok(())
}

fn email_in_use(table: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    table
        .values()
        .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GetUserById {
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct ListUsers {
    pub offset: usize,
    pub limit: usize,
}

/// Partial update. Fields left as `None` are kept.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub id: Uuid,
    /// `None` for system calls that bypass permission checks.
    pub responsible: Option<Responsible>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub is_admin: Option<bool>,
}

impl Processor<CreateUser> for ServiceProcessor {
    type Output = User;
    type Error = UserError;
    #[tracing::instrument(skip_all, err, name = "USERS:CreateUser")]
    async fn process(&self, cmd: CreateUser) -> Result<User, UserError> {
        validate_email(&cmd.email)?;
        validate_name(&cmd.name)?;

        let user = {
            let mut table = self.users.inner.write().await;
            if email_in_use(&table, &cmd.email, None) {
                return Err(UserError::EmailTaken(cmd.email));
            }
            let now = OffsetDateTime::now_utc();
            let user = User {
                id: Uuid::now_v7(),
                email: cmd.email,
                name: cmd.name,
                is_admin: cmd.is_admin,
                created_at: now,
                updated_at: now,
            };
            table.insert(user.id, user.clone());
            user
        };

        self.defer_signal(topics::USER_CREATED, vec![json!(user.id)]);
        Ok(user)
    }
}

impl Processor<GetUserById> for ServiceProcessor {
    type Output = Option<User>;
    type Error = UserError;
    async fn process(&self, query: GetUserById) -> Result<Option<User>, UserError> {
        Ok(self.users.inner.read().await.get(&query.id).cloned())
    }
}

impl Processor<ListUsers> for ServiceProcessor {
    type Output = Vec<User>;
    type Error = UserError;
    async fn process(&self, query: ListUsers) -> Result<Vec<User>, UserError> {
        let table = self.users.inner.read().await;
        let mut users: Vec<User> = table.values().cloned().collect();
        drop(table);
        users.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(users
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

impl Processor<UpdateUser> for ServiceProcessor {
    type Output = User;
    type Error = UserError;
    #[tracing::instrument(skip_all, err, name = "USERS:UpdateUser", fields(user_id = %cmd.id))]
    async fn process(&self, cmd: UpdateUser) -> Result<User, UserError> {
        if let Some(responsible) = cmd.responsible {
            if !responsible.is_admin && responsible.id != cmd.id {
                return Err(UserError::PermissionDenied(
                    "user cannot update other users",
                ));
            }
            if !responsible.is_admin && cmd.is_admin == Some(true) {
                return Err(UserError::PermissionDenied(
                    "only admins can grant admin rights",
                ));
            }
        }
        if let Some(email) = &cmd.email {
            validate_email(email)?;
        }
        if let Some(name) = &cmd.name {
            validate_name(name)?;
        }

        let user = {
            let mut table = self.users.inner.write().await;
            if let Some(email) = &cmd.email {
                if email_in_use(&table, email, Some(cmd.id)) {
                    return Err(UserError::EmailTaken(email.clone()));
                }
            }
            let user = table.get_mut(&cmd.id).ok_or(UserError::NotFound(cmd.id))?;
            if let Some(email) = cmd.email {
                user.email = email;
            }
            if let Some(name) = cmd.name {
                user.name = name;
            }
            if let Some(is_admin) = cmd.is_admin {
                user.is_admin = is_admin;
            }
            user.updated_at = OffsetDateTime::now_utc();
            user.clone()
        };

        self.defer_signal(topics::USER_UPDATED, vec![json!(user.id)]);
        Ok(user)
    }
}
