#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use campus_discipline_api::{
    auth::Registration,
    config::{AppConfig, MIN_BCRYPT_COST},
    database::MemoryStore,
    server,
    state::AppState,
    types::Role,
};

pub const PASSWORD: &str = "secret123";
pub const ADMIN: &str = "A001";
pub const STAFF: &str = "E001";
pub const STUDENT: &str = "S001";
pub const OTHER_STUDENT: &str = "S002";
pub const STUDENT_NUMBER: &str = "2024-0001";

pub const ENGINEERING: i32 = 1;
pub const NURSING: i32 = 2;
pub const COMPUTER_SCIENCE: i32 = 10;

/// Router over an in-memory store seeded with one account per role
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn registration(id: &str, name: &str, role: Role) -> Registration {
    Registration {
        id: id.to_string(),
        student_number: None,
        employee_number: None,
        name: name.to_string(),
        email: None,
        password: PASSWORD.to_string(),
        role_id: Some(role.id()),
        department_id: None,
        program_id: None,
        year_level: None,
        status: None,
        batch: None,
        photo: None,
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = "integration-test-secret".to_string();
    config.security.bcrypt_cost = MIN_BCRYPT_COST;
    config.api.enable_request_logging = false;
    config
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Result<Self> {
        let store = Arc::new(
            MemoryStore::new()
                .with_department(ENGINEERING, "Engineering")
                .with_department(NURSING, "Nursing")
                .with_program(COMPUTER_SCIENCE, "Computer Science"),
        );
        let state = AppState::new(config, store.clone()).await?;

        let mut student = registration(STUDENT, "Cruz, Ana", Role::Student);
        student.student_number = Some(STUDENT_NUMBER.to_string());
        student.department_id = Some(ENGINEERING);
        student.year_level = Some("1".to_string());

        for reg in [
            registration(ADMIN, "Registrar Admin", Role::Administrator),
            registration(STAFF, "Discipline Officer", Role::Staff),
            student,
            registration(OTHER_STUDENT, "Reyes, Ben", Role::Student),
        ] {
            state
                .credentials
                .register(reg, Role::Student)
                .await
                .context("seeding account")?;
        }

        Ok(Self {
            router: server::app(state.clone()),
            state,
            store,
        })
    }

    /// Sends a request; `token` goes into the Authorization header verbatim
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, HeaderMap, Bytes)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, bytes))
    }

    /// Like [`TestApp::send`] but parses the body as JSON
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let (status, _, bytes) = self.send(method, uri, token, body).await?;
        let value = serde_json::from_slice(&bytes)
            .with_context(|| format!("non-JSON body from {}: {:?}", uri, String::from_utf8_lossy(&bytes)))?;
        Ok((status, value))
    }

    /// Logs in and returns the raw token
    pub async fn login(&self, identifier: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .json(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "identifier": identifier, "password": password })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login for {} failed: {} {}", identifier, status, body);

        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response without token")
    }
}
