//! Shared setup for API integration tests

#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{http::header, test, web};
use serde_json::Value;

use cn_api::app::AppState;
use cn_core::domain::entities::user::{NewUser, User};
use cn_core::domain::password;
use cn_core::repositories::UserDirectory;
use cn_core::services::EventHub;
use cn_infra::{InMemoryPostRepository, InMemoryRefreshLedger, InMemoryUserDirectory};
use cn_shared::AppConfig;

pub type TestState = AppState<InMemoryRefreshLedger, InMemoryUserDirectory, InMemoryPostRepository>;

/// Handles to the backends behind a test app
pub struct TestContext {
    pub state: web::Data<TestState>,
    pub ledger: InMemoryRefreshLedger,
    pub users: InMemoryUserDirectory,
    pub hub: EventHub,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.auth.bcrypt_cost = 4;
    config
}

pub fn test_context() -> TestContext {
    let ledger = InMemoryRefreshLedger::new();
    let users = InMemoryUserDirectory::new();
    let posts = InMemoryPostRepository::new();
    let hub = EventHub::new(32);

    let state = web::Data::new(AppState::new(
        test_config(),
        Arc::new(ledger.clone()),
        Arc::new(users.clone()),
        Arc::new(posts),
        hub.clone(),
    ));

    TestContext {
        state,
        ledger,
        users,
        hub,
    }
}

/// Store an account directly, bypassing signup
pub async fn seed_user(users: &InMemoryUserDirectory, name: &str, email: &str, plaintext: &str) -> User {
    let user = User::new(NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: password::hash(plaintext, 4).unwrap(),
    });
    users.create(user).await.unwrap()
}

pub fn bearer(token: &Value) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token.as_str().unwrap()))
}

pub fn login_request(email: &str, password: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({ "email": email, "password": password }))
}

pub fn refresh_request(refresh_token: &Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth/refresh")
        .set_json(serde_json::json!({ "refresh_token": refresh_token }))
}
