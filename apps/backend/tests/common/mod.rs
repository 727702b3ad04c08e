#![allow(dead_code)]

//! Common test utilities and fixtures for integration tests.
//!
//! `TestContext::new` runs the full router on in-memory stores seeded with
//! the default accounts. `TestContext::with_database` uses PostgreSQL
//! (set DATABASE_URL) and is only used by ignored tests.

pub mod fixtures;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use academy_backend::db::{PgSheetStore, SheetStore, Sheets};
use academy_backend::services::auth::default_users;
use academy_backend::services::storage::MemoryObjectStore;
use academy_backend::{build_router, AppState};

/// Test context holding the application state and router.
pub struct TestContext {
    pub state: AppState,
    app: Router,
}

impl TestContext {
    /// In-memory tables and images, default accounts seeded.
    pub async fn new() -> Self {
        Self::from_state(AppState::in_memory()).await
    }

    /// Tables in PostgreSQL.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn with_database() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = PgSheetStore::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        let store: Arc<dyn SheetStore> = Arc::new(db);
        let state = AppState::new(store, Arc::new(MemoryObjectStore::new()));
        Self::from_state(state).await
    }

    /// Tables in the given store, images in memory.
    pub async fn with_store(store: Arc<dyn SheetStore>) -> Self {
        Self::from_state(AppState::new(store, Arc::new(MemoryObjectStore::new()))).await
    }

    async fn from_state(state: AppState) -> Self {
        state
            .sheets
            .seed_users(default_users())
            .await
            .expect("Failed to seed default users");

        let app = build_router(state.clone());
        Self { state, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).unwrap()
    }

    pub fn sheets(&self) -> &Sheets {
        &self.state.sheets
    }

    /// Log in and return the bearer token.
    pub async fn login(server: &TestServer, id: &str, password: &str) -> String {
        let response = server
            .post("/api/auth/login")
            .json(&json!({ "id": id, "password": password }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["token"].as_str().unwrap().to_string()
    }

    /// Format authorization header value.
    pub fn auth_header_value(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
    }
}
