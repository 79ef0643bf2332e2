//! Axum server setup and router configuration.

use crate::api;
use crate::middleware::flush_signals;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
///
/// Every route runs behind [`flush_signals`], so signals deferred by a
/// handler are delivered once that request completes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(api::router())
        .layer(middleware::from_fn_with_state(
            state.signals.clone(),
            flush_signals,
        ))
        // Add state to all routes
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    pending_signals: usize,
}

/// Simple health check - returns OK if the server is running.
async fn health_check(state: State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        pending_signals: state.signals.pending_len(),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use evguard_core::config::{RuntimeConfig, ServerConfig, SignalsConfig};
    use evguard_sdk::objects::{AuditEntryResponse, ClientResponse, USER_ID_HEADER, UserResponse};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(&RuntimeConfig {
            server: ServerConfig {
                listen: SocketAddr::from(([127, 0, 0, 1], 0)),
            },
            signals: SignalsConfig::default(),
        })
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        user: Option<uuid::Uuid>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header(USER_ID_HEADER, user.to_string());
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_user(router: &Router, email: &str, is_admin: bool) -> UserResponse {
        let (status, body) = send(
            router,
            "POST",
            "/users",
            None,
            Some(json!({ "email": email, "name": "Test", "is_admin": is_admin })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = build_router(test_state());
        let (status, body) = send(&router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["pending_signals"], 0);
    }

    #[tokio::test]
    async fn test_create_user_flushes_signal_after_request() {
        let state = test_state();
        let router = build_router(state.clone());

        let user = create_user(&router, "ana@example.com", false).await;

        assert_eq!(state.signals.pending_len(), 0);
        let (_, body) = send(&router, "GET", "/audit", None, None).await;
        let entries: Vec<AuditEntryResponse> = serde_json::from_value(body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].topic, "user:created");
        assert_eq!(entries[0].args, vec![json!(user.id)]);
    }

    #[tokio::test]
    async fn test_audit_tells_created_from_updated() {
        let router = build_router(test_state());
        let user = create_user(&router, "ana@example.com", false).await;
        let (status, _) = send(
            &router,
            "PATCH",
            &format!("/users/{}", user.id),
            None,
            Some(json!({ "name": "Ana Maria" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&router, "GET", "/audit", None, None).await;
        let entries: Vec<AuditEntryResponse> = serde_json::from_value(body).unwrap();
        let topics: Vec<&str> = entries.iter().map(|e| e.topic.as_str()).collect();
        assert_eq!(topics, vec!["user:created", "user:updated"]);
        assert_eq!(entries[0].args, entries[1].args);
    }

    #[tokio::test]
    async fn test_flagged_session_is_revalidated_on_next_request() {
        let state = test_state();
        let router = build_router(state.clone());
        let root = create_user(&router, "root@example.com", true).await;

        let (status, _) = send(
            &router,
            "PATCH",
            &format!("/users/{}", root.id),
            None,
            Some(json!({ "is_admin": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.revocations.is_marked(root.id));

        // the demoted user is re-read, so admin-only updates now fail
        let other = create_user(&router, "bo@example.com", false).await;
        let (status, _) = send(
            &router,
            "PATCH",
            &format!("/users/{}", other.id),
            Some(root.id),
            Some(json!({ "name": "Bob" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!state.revocations.is_marked(root.id));
    }

    #[tokio::test]
    async fn test_client_routes() {
        let state = test_state();
        let router = build_router(state.clone());

        let (status, body) = send(
            &router,
            "POST",
            "/clients",
            None,
            Some(json!({ "code": "billing", "name": "Billing" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let client: ClientResponse = serde_json::from_value(body).unwrap();
        assert!(client.is_active);

        let (status, _) = send(
            &router,
            "POST",
            "/clients",
            None,
            Some(json!({ "code": "billing", "name": "Again" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &router,
            "PATCH",
            &format!("/clients/{}", client.id),
            None,
            Some(json!({ "is_active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_active"], false);

        let (status, body) = send(&router, "GET", "/clients", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));

        let missing = format!("/clients/{}", uuid::Uuid::now_v7());
        let (status, _) = send(&router, "GET", &missing, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert_eq!(state.signals.pending_len(), 0);
        let (_, body) = send(&router, "GET", "/audit", None, None).await;
        let entries: Vec<AuditEntryResponse> = serde_json::from_value(body).unwrap();
        let topics: Vec<&str> = entries.iter().map(|e| e.topic.as_str()).collect();
        assert_eq!(topics, vec!["client:created", "client:updated"]);
    }

    #[tokio::test]
    async fn test_self_update_marks_sessions() {
        let state = test_state();
        let router = build_router(state.clone());
        let user = create_user(&router, "ana@example.com", false).await;

        let (status, body) = send(
            &router,
            "PATCH",
            &format!("/users/{}", user.id),
            Some(user.id),
            Some(json!({ "name": "Ana Maria" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Ana Maria");
        assert!(state.revocations.is_marked(user.id));
        assert_eq!(state.signals.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_update_of_other_user_is_forbidden() {
        let state = test_state();
        let router = build_router(state.clone());
        let ana = create_user(&router, "ana@example.com", false).await;
        let bo = create_user(&router, "bo@example.com", false).await;

        let (status, body) = send(
            &router,
            "PATCH",
            &format!("/users/{}", ana.id),
            Some(bo.id),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("permission denied"));
        assert!(!state.revocations.is_marked(ana.id));
    }

    #[tokio::test]
    async fn test_admin_may_update_anyone() {
        let state = test_state();
        let router = build_router(state.clone());
        let ana = create_user(&router, "ana@example.com", false).await;
        let root = create_user(&router, "root@example.com", true).await;

        let (status, _) = send(
            &router,
            "PATCH",
            &format!("/users/{}", ana.id),
            Some(root.id),
            Some(json!({ "is_admin": true })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(state.revocations.is_marked(ana.id));
    }

    #[tokio::test]
    async fn test_bad_responsible_header() {
        let router = build_router(test_state());
        let ana = create_user(&router, "ana@example.com", false).await;
        let uri = format!("/users/{}", ana.id);

        let (status, _) = send(&router, "PATCH", &uri, Some(uuid::Uuid::now_v7()), Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .method("PATCH")
            .uri(&uri)
            .header(USER_ID_HEADER, "not-a-uuid")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_queue_is_flushed_even_when_handler_fails() {
        let state = test_state();
        let router = build_router(state.clone());
        let ghost = uuid::Uuid::now_v7();
        state
            .signals
            .after_transaction("user:updated", vec![json!(ghost)])
            .unwrap();
        assert_eq!(state.signals.pending_len(), 1);

        let (status, _) = send(
            &router,
            "GET",
            &format!("/users/{}", uuid::Uuid::now_v7()),
            None,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.signals.pending_len(), 0);
        assert!(state.revocations.is_marked(ghost));
    }

    #[tokio::test]
    async fn test_list_and_get_users() {
        let router = build_router(test_state());
        let ana = create_user(&router, "ana@example.com", false).await;
        create_user(&router, "bo@example.com", false).await;

        let (status, body) = send(&router, "GET", "/users?limit=1", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let page: Vec<UserResponse> = serde_json::from_value(body).unwrap();
        assert_eq!(page, vec![ana.clone()]);

        let (status, body) = send(&router, "GET", &format!("/users/{}", ana.id), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ana@example.com");

        let (status, _) = send(
            &router,
            "POST",
            "/users",
            None,
            Some(json!({ "email": "ana@example.com", "name": "Dup" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
