// Shared by every integration test binary; each one uses a different subset.
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use notes_api::{
    app::{router, AppState},
    config::AppConfig,
    database::{MemoryStore, Stores},
};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub base_url: String,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = AppConfig::from_lookup(|key| match key {
            "JWT_SECRET" => Some("integration-test-secret".to_string()),
            "NOTES_STORE" => Some("memory".to_string()),
            "NOTES_API_HOST" => Some("127.0.0.1".to_string()),
            _ => None,
        })?;
        let state = AppState::new(config, Stores::from_backend(Arc::new(MemoryStore::new())))?;
        let app = router(state);

        // Each #[tokio::test] owns a runtime that dies with the test, so the
        // server gets a runtime of its own on a detached thread
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("failed to build server runtime");

            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
                    .await
                    .expect("failed to bind test port");
                axum::serve(listener, app).await.expect("test server");
            });
        });

        Ok(Self { base_url })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to start test server"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Unique email per call so tests sharing the server never collide
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, unique_suffix())
}

fn unique_suffix() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{}-{}", nanos, COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Register a user and return the created record
pub async fn register(client: &reqwest::Client, server: &TestServer, email: &str, password: &str) -> Result<Value> {
    let res = client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "user_name": "tester", "user_email": email, "password": password }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
    Ok(res.json().await?)
}

/// Log in with the form flow and return the bearer token
pub async fn login(client: &reqwest::Client, server: &TestServer, email: &str, password: &str) -> Result<String> {
    let res = client
        .post(server.url("/api/auth/login"))
        .form(&[("username", email), ("password", password)])
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
    let body: Value = res.json().await?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .context("login response had no access_token")
}

/// Register then log in, returning (user, token)
pub async fn signed_in_user(client: &reqwest::Client, server: &TestServer, prefix: &str) -> Result<(Value, String)> {
    let email = unique_email(prefix);
    let user = register(client, server, &email, "secret1").await?;
    let token = login(client, server, &email, "secret1").await?;
    Ok((user, token))
}
