//! Client handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use evguard_core::entities::clients::{
    Client, CreateClient, GetClientById, ListClients, UpdateClient,
};
use evguard_sdk::objects::user::MAX_PAGE_SIZE;
use evguard_sdk::objects::{
    ClientResponse, CreateClientRequest, ListClientsQuery, UpdateClientRequest,
};
use kanau::processor::Processor;
use uuid::Uuid;

use super::ApiError;
use crate::state::AppState;

fn to_response(client: &Client) -> ClientResponse {
    ClientResponse {
        id: client.id,
        code: client.code.clone(),
        name: client.name.clone(),
        is_active: client.is_active,
        created_at: client.created_at.unix_timestamp(),
        updated_at: client.updated_at.unix_timestamp(),
    }
}

/// `GET /clients`
pub async fn list_clients(
    state: State<AppState>,
    Query(query): Query<ListClientsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let clients = state
        .processor
        .process(ListClients {
            offset: query.offset,
            limit: query.limit.min(MAX_PAGE_SIZE),
        })
        .await?;
    Ok(Json(clients.iter().map(to_response).collect::<Vec<_>>()))
}

/// `POST /clients` - register a client. Queues `client:created`.
pub async fn create_client(
    state: State<AppState>,
    Json(body): Json<CreateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state
        .processor
        .process(CreateClient {
            code: body.code,
            name: body.name,
            is_active: body.is_active,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(&client))))
}

/// `GET /clients/{id}`
pub async fn get_client(
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state
        .processor
        .process(GetClientById { id })
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(to_response(&client)))
}

/// `PATCH /clients/{id}` - rename or (de)activate a client. Queues `client:updated`.
pub async fn update_client(
    state: State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateClientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let client = state
        .processor
        .process(UpdateClient {
            id,
            name: body.name,
            is_active: body.is_active,
        })
        .await?;
    Ok(Json(to_response(&client)))
}
