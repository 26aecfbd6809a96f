//! Drives the full router against an in-memory database and a scratch
//! blob directory.

use crate::{
    config::AppConfig,
    db::test_pool,
    models::user::Owner,
    routes::routes::routes,
    state::AppState,
    testutil::{seed_customer, seed_owner, seed_session},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
    router: Router,
    storage_dir: PathBuf,
}

impl TestApp {
    pub async fn new() -> Self {
        let storage_dir = std::env::temp_dir().join(format!("venue-desk-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&storage_dir).unwrap();
        let config = AppConfig::for_tests(storage_dir.to_string_lossy());

        let state = AppState::new(Arc::new(test_pool().await), config);
        let router = routes(state.config.max_upload_bytes).with_state(state.clone());
        Self {
            state,
            router,
            storage_dir,
        }
    }

    pub async fn owner_session(&self) -> (Owner, String) {
        let owner = seed_owner(&self.state.db, "ANITA").await;
        let token = seed_session(&self.state.db, owner.id, "owner").await;
        (owner, token)
    }

    pub async fn customer_session(&self) -> String {
        let customer = seed_customer(&self.state.db, "Ravi").await;
        seed_session(&self.state.db, customer.id, "customer").await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("user-session={token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, token: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::COOKIE, format!("user-session={token}"))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Rows in the blob metadata table.
    pub async fn blob_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM blobs")
            .fetch_one(&*self.state.db)
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_dir);
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
