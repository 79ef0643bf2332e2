pub mod audit;
pub mod client;
pub mod user;

pub use audit::AuditEntryResponse;
pub use client::{ClientResponse, CreateClientRequest, ListClientsQuery, UpdateClientRequest};
pub use user::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserResponse};

use serde::{Deserialize, Serialize};

/// Header carrying the id of the user performing a request.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// JSON body returned for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
