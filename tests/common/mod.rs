// tests/common/mod.rs
#![allow(dead_code)]

use fanfeed::{config::Config, db, routes, state::AppState, utils::jwt::sign_jwt};
use reqwest::{RequestBuilder, Response};
use serde_json::{Value, json};
use sqlx::SqlitePool;

pub const SECRET: &str = "test_secret_for_integration_tests";

pub const ALICE: (i64, &str) = (1, "alice");
pub const BORA: (i64, &str) = (2, "bora");
pub const STAFF: (i64, &str) = (9, "moderator");

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    /// Same pool the server uses, for asserting on stored rows.
    pub pool: SqlitePool,
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        rust_log: "error".to_string(),
        log_dir: "logs".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
    }
}

/// Spawns the app on a random port backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool).await.expect("Failed to migrate database");

    let state = AppState {
        pool: pool.clone(),
        config: test_config(),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        pool,
    }
}

pub fn token((id, name): (i64, &str)) -> String {
    sign_jwt(id, name, "user", SECRET, 600).unwrap()
}

pub fn staff_token() -> String {
    sign_jwt(STAFF.0, STAFF.1, "staff", SECRET, 600).unwrap()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    pub fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_auth(self.client.get(self.url(path)), token)
    }

    pub fn post(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_auth(self.client.post(self.url(path)), token)
    }

    pub fn patch(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_auth(self.client.patch(self.url(path)), token)
    }

    pub fn delete(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_auth(self.client.delete(self.url(path)), token)
    }

    /// Creates a post and returns its id.
    pub async fn create_post(&self, token: &str, title: &str) -> i64 {
        let resp = self
            .post("/posts", Some(token))
            .json(&json!({ "title": title, "content": "Content" }))
            .send()
            .await
            .expect("Failed to create post");
        assert_eq!(resp.status().as_u16(), 201);
        resp.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
    }

    pub async fn try_comment(
        &self,
        token: &str,
        post_id: i64,
        content: &str,
        parent: Option<i64>,
    ) -> Response {
        self.post(&format!("/posts/{}/comments", post_id), Some(token))
            .json(&json!({ "content": content, "parent": parent }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a comment (or reply) and returns its id.
    pub async fn create_comment(
        &self,
        token: &str,
        post_id: i64,
        content: &str,
        parent: Option<i64>,
    ) -> i64 {
        let resp = self.try_comment(token, post_id, content, parent).await;
        assert_eq!(resp.status().as_u16(), 201);
        resp.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
    }

    pub async fn json(&self, builder: RequestBuilder) -> Value {
        builder
            .send()
            .await
            .expect("Failed to execute request")
            .json::<Value>()
            .await
            .expect("Failed to parse json")
    }
}

fn with_auth(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
        None => builder,
    }
}

pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("expected a json array")
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}
