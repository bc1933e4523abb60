//! Shared helpers for the integration tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use portfolio_backend::api::{build_router, AppState};
use portfolio_backend::config::{AuthConfig, MediaConfig, ServerConfig};
use portfolio_backend::content::ContentServices;
use portfolio_backend::search::{SearchConfig, SearchIndexSynchronizer, SearchIndexes, SearchService};
use portfolio_backend::state::{DocumentStore, InMemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";
pub const PERMISSION: &str = "write:content";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn DocumentStore>,
    pub synchronizer: SearchIndexSynchronizer,
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        enabled: true,
        hs256_secret: Some(SECRET.to_string()),
        required_permission: Some(PERMISSION.to_string()),
        ..Default::default()
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        cors_allowed_origins: Vec::new(),
    }
}

/// In-memory store and indexes wired the same way the server does it
pub fn test_app() -> TestApp {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let search_config = SearchConfig::default();
    let indexes = SearchIndexes::open(&search_config).unwrap();
    let synchronizer = SearchIndexSynchronizer::new(indexes.clone(), store.clone());
    let content = ContentServices::new(
        store.clone(),
        Some(synchronizer.clone()),
        MediaConfig::default(),
    );
    let state = AppState::new(
        content,
        SearchService::new(indexes, search_config),
        synchronizer.clone(),
        auth_config(),
        server_config(),
    );

    TestApp {
        router: build_router(state),
        store,
        synchronizer,
    }
}

pub fn token_with(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn admin_token() -> String {
    token_with(json!({
        "sub": "admin@example.com",
        "exp": chrono::Utc::now().timestamp() + 600,
        "permissions": [PERMISSION],
    }))
}

impl TestApp {
    /// Send a request and decode the JSON response body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let token = admin_token();
        self.send(method, uri, Some(&token), body).await
    }
}
