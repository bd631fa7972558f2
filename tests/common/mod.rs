#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ai_farming::{
    ai::{AssistantBackend, CompletionRequest, TranscriptionRequest},
    api::create_router,
    app_state::AppState,
    auth::hash_password,
    config::Config,
    error::AppResult,
    models::{Language, NewUser, Role, UserPatch},
    store::{MemoryStore, Store},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

/// Assistant backend that records what it was asked and answers canned text.
#[derive(Default)]
pub struct StubAssistant {
    pub completions: Mutex<Vec<CompletionRequest>>,
    pub transcriptions: Mutex<Vec<TranscriptionRequest>>,
    pub silent: bool,
}

#[async_trait]
impl AssistantBackend for StubAssistant {
    async fn complete(&self, request: CompletionRequest) -> AppResult<Option<String>> {
        let turns = request.messages.len();
        self.completions.lock().unwrap().push(request);
        if self.silent {
            return Ok(None);
        }
        Ok(Some(format!("stub reply after {} messages", turns)))
    }

    async fn transcribe(&self, request: TranscriptionRequest) -> AppResult<String> {
        let bytes = request.audio.len();
        self.transcriptions.lock().unwrap().push(request);
        Ok(format!("heard {} bytes", bytes))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub assistant: Arc<StubAssistant>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_assistant(StubAssistant::default())
    }

    pub fn with_assistant(assistant: StubAssistant) -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://unused".to_string()),
            "JWT_SECRET" => Some("integration-secret".to_string()),
            _ => None,
        })
        .expect("test config");

        let store = Arc::new(MemoryStore::new());
        let assistant = Arc::new(assistant);
        let state = AppState::from_parts(&config, store.clone(), assistant.clone());

        Self {
            router: create_router(state.clone()),
            state,
            store,
            assistant,
        }
    }

    pub async fn request(
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
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    /// Registers a farmer and returns `(token, user id)`.
    pub async fn register(&self, name: &str, email: &str) -> (String, Uuid) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "name": name, "email": email, "password": "secret123" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let token = body["token"].as_str().unwrap().to_string();
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        (token, id)
    }

    /// Creates an active admin directly in the store and returns `(token, id)`.
    pub async fn admin(&self) -> (String, Uuid) {
        let user = self
            .store
            .create_user(NewUser {
                name: "Admin".to_string(),
                email: format!("admin-{}@farm.io", Uuid::new_v4()),
                password_hash: hash_password("adminpass").unwrap(),
                farm_size: String::new(),
                poultry_type: String::new(),
                preferred_language: Language::En,
                role: Role::Admin,
            })
            .await
            .unwrap();
        (self.state.tokens.issue(user.id).unwrap(), user.id)
    }

    pub async fn deactivate(&self, id: Uuid) {
        let patch = UserPatch { is_active: Some(false), ..Default::default() };
        self.store.update_user(id, patch).await.unwrap();
    }
}
