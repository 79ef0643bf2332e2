//! API clients: external systems that publish events into eventsguard.
//!
//! Writes queue `client:created` / `client:updated` carrying the client id.

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
pub struct Client {
    pub id: Uuid,
    /// Short unique identifier chosen by the operator, e.g. `billing`.
    pub code: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct ClientStore {
    inner: Arc<RwLock<HashMap<Uuid, Client>>>,
}

impl ClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("client not found: {0}")]
    NotFound(Uuid),
    #[error("client code already registered: {0}")]
    CodeTaken(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

fn validate_code(code: &str) -> Result<(), ClientError> {
    let valid = !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ClientError::InvalidInput(
            "code must be non-empty and use only letters, digits, '-' or '_'",
        ));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), ClientError> {
    if name.trim().is_empty() {
        return Err(ClientError::InvalidInput("name must not be empty"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CreateClient {
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GetClientById {
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct ListClients {
    pub offset: usize,
    pub limit: usize,
}

/// Partial update. The code is immutable once registered.
#[derive(Debug, Clone)]
pub struct UpdateClient {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl Processor<CreateClient> for ServiceProcessor {
    type Output = Client;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "CLIENTS:CreateClient")]
    async fn process(&self, cmd: CreateClient) -> Result<Client, ClientError> {
        validate_code(&cmd.code)?;
        validate_name(&cmd.name)?;

        let client = {
            let mut table = self.clients.inner.write().await;
            if table.values().any(|c| c.code == cmd.code) {
                return Err(ClientError::CodeTaken(cmd.code));
            }
            let now = OffsetDateTime::now_utc();
            let client = Client {
                id: Uuid::now_v7(),
                code: cmd.code,
                name: cmd.name,
                is_active: cmd.is_active,
                created_at: now,
                updated_at: now,
            };
            table.insert(client.id, client.clone());
            client
        };

        self.defer_signal(topics::CLIENT_CREATED, vec![json!(client.id)]);
        Ok(client)
    }
}

impl Processor<GetClientById> for ServiceProcessor {
    type Output = Option<Client>;
    type Error = ClientError;
    async fn process(&self, query: GetClientById) -> Result<Option<Client>, ClientError> {
        Ok(self.clients.inner.read().await.get(&query.id).cloned())
    }
}

impl Processor<ListClients> for ServiceProcessor {
    type Output = Vec<Client>;
    type Error = ClientError;
    async fn process(&self, query: ListClients) -> Result<Vec<Client>, ClientError> {
        let mut clients: Vec<Client> = self.clients.inner.read().await.values().cloned().collect();
        clients.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(clients
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

impl Processor<UpdateClient> for ServiceProcessor {
    type Output = Client;
    type Error = ClientError;
    #[tracing::instrument(skip_all, err, name = "CLIENTS:UpdateClient", fields(client_id = %cmd.id))]
    async fn process(&self, cmd: UpdateClient) -> Result<Client, ClientError> {
        if let Some(name) = &cmd.name {
            validate_name(name)?;
        }

        let client = {
            let mut table = self.clients.inner.write().await;
            let client = table
                .get_mut(&cmd.id)
                .ok_or(ClientError::NotFound(cmd.id))?;
            if let Some(name) = cmd.name {
                client.name = name;
            }
            if let Some(is_active) = cmd.is_active {
                client.is_active = is_active;
            }
            client.updated_at = OffsetDateTime::now_utc();
            client.clone()
        };

        self.defer_signal(topics::CLIENT_UPDATED, vec![json!(client.id)]);
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::users::UserStore;
    use crate::signals::SignalBus;
    use parking_lot::Mutex;
    use serde_json::Value;

    fn processor() -> ServiceProcessor {
        ServiceProcessor::new(UserStore::new(), ClientStore::new(), SignalBus::default())
    }

    fn create(code: &str) -> CreateClient {
        CreateClient {
            code: code.to_string(),
            name: "Billing".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_client_writes_queue_signals() {
        let processor = processor();
        let seen = Arc::new(Mutex::new(Vec::<Vec<Value>>::new()));
        let sink = seen.clone();
        processor.signals.subscribe_fn("client:*", move |args| {
            sink.lock().push(args.to_vec());
            Ok(())
        });

        let client = processor.process(create("billing")).await.unwrap();
        let updated = processor
            .process(UpdateClient {
                id: client.id,
                name: None,
                is_active: Some(false),
            })
            .await
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.name, "Billing");

        assert_eq!(processor.signals.pending_len(), 2);
        assert!(seen.lock().is_empty());
        let summary = processor.signals.process_queue().unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(
            *seen.lock(),
            vec![vec![json!(client.id)], vec![json!(client.id)]]
        );
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let processor = processor();
        processor.process(create("billing")).await.unwrap();
        let err = processor.process(create("billing")).await.unwrap_err();
        assert!(matches!(err, ClientError::CodeTaken(code) if code == "billing"));
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let processor = processor();
        for code in ["", "has space", "a/b"] {
            let err = processor.process(create(code)).await.unwrap_err();
            assert!(matches!(err, ClientError::InvalidInput(_)), "code {code:?}");
        }

        let client = processor.process(create("crm")).await.unwrap();
        let err = processor
            .process(UpdateClient {
                id: client.id,
                name: Some("  ".to_string()),
                is_active: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_client_queues_nothing() {
        let processor = processor();
        processor.signals.subscribe_fn("client:#", |_| Ok(()));
        let id = Uuid::now_v7();
        let err = processor
            .process(UpdateClient {
                id,
                name: Some("Ghost".to_string()),
                is_active: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(missing) if missing == id));
        assert_eq!(processor.signals.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_list_and_get_clients() {
        let processor = processor();
        let first = processor.process(create("a")).await.unwrap();
        let second = processor.process(create("b")).await.unwrap();

        let page = processor
            .process(ListClients {
                offset: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(page, vec![first.clone(), second]);

        let found = processor.process(GetClientById { id: first.id }).await.unwrap();
        assert_eq!(found, Some(first));
    }
}
