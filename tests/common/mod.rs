#![allow(dead_code)]

use axum_test::TestServer;
use sqlx::PgPool;
use std::sync::Arc;

use shortlink::application::services::SessionService;
use shortlink::infrastructure::persistence::seed_demo_data;
use shortlink::routes::router;
use shortlink::state::AppState;
use shortlink::utils::token_generator::TokenGenerator;

pub const TEST_SESSION_SECRET: &str = "test-session-secret-0123456789";
pub const TEST_TOKEN_SALT: &str = "test-salt";
pub const BASE_URL: &str = "http://sho.rt";

pub fn create_test_state(pool: PgPool) -> AppState {
    AppState::new(
        Arc::new(pool),
        TokenGenerator::with_default_alphabet(TEST_TOKEN_SALT, 6).unwrap(),
        SessionService::new(TEST_SESSION_SECRET, "admin"),
        BASE_URL,
        1,
    )
}

pub async fn seed(pool: &PgPool) {
    seed_demo_data(pool).await.unwrap();
}

/// Server over the full router, on a database holding the demo data.
pub async fn seeded_server(pool: PgPool) -> TestServer {
    seed(&pool).await;
    TestServer::new(router(create_test_state(pool))).unwrap()
}

/// Logs in and returns the `Cookie` header value for the session.
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/login")
        .json(&serde_json::json!({ "username": username, "password": password }))
        .await;

    assert_eq!(response.status_code(), 200, "login as {username} failed");

    let set_cookie = response.header("set-cookie");
    set_cookie
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

pub async fn click_counter(pool: &PgPool, link_id: i64) -> i64 {
    sqlx::query_scalar("SELECT click_counter FROM links WHERE id = $1")
        .bind(link_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
