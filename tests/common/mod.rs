#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use hospital_registry::app::{build_app, AppState};
use hospital_registry::config::AppConfig;
use hospital_registry::testing::{sample_patient, MemoryStore};

pub const ADMIN: (&str, &str) = ("admin", "admin12345");
pub const NURSE: (&str, &str) = ("nurse", "nurse12345");
pub const DISABLED: (&str, &str) = ("retired", "retired12345");

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub api_url: String,
    pub client: reqwest::Client,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    /// Starts the app on the current test runtime. Each `#[tokio::test]` owns
    /// its runtime, so every test gets its own server and store.
    async fn spawn(store: MemoryStore) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = AppConfig::from_source(|key| match key {
            "API_BASE_PATH" => Some("/api".to_string()),
            "APP_DEBUG" => Some("false".to_string()),
            _ => None,
        });
        let store = Arc::new(store);
        let state = AppState::new(config, store.clone())?;
        let app = build_app(state);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            api_url: format!("{}/api", base_url),
            base_url,
            client: reqwest::Client::new(),
            store,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Logs in and returns the issued credential.
    pub async fn login(&self, (username, password): (&str, &str)) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login for {} failed: {}", username, res.status());

        let body: Value = res.json().await?;
        body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response carried no token")
    }
}

/// Accounts every test server starts with.
pub fn seeded_store() -> Result<MemoryStore> {
    Ok(MemoryStore::new()
        .with_user(ADMIN.0, ADMIN.1, "admin", true)?
        .with_user(NURSE.0, NURSE.1, "user", true)?
        .with_user(DISABLED.0, DISABLED.1, "user", false)?)
}

pub async fn start_server() -> Result<TestServer> {
    start_server_with(seeded_store()?).await
}

pub async fn start_server_with(store: MemoryStore) -> Result<TestServer> {
    let server = TestServer::spawn(store).await?;
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

/// Store with the seeded accounts plus three patients.
pub fn store_with_patients() -> Result<MemoryStore> {
    Ok(seeded_store()?
        .with_patient(sample_patient("10000001", "Ana", "Gomez"))
        .with_patient(sample_patient("10000002", "Bruno", "Diaz"))
        .with_patient(sample_patient("10000003", "Carla", "Gomez")))
}

/// A create/update body that passes every patient rule.
pub fn patient_body(numero_documento: &str) -> Value {
    json!({
        "tipo_documento_id": 1,
        "numero_documento": numero_documento,
        "nombre1": "Luisa",
        "apellido1": "Martinez",
        "genero_id": 2,
        "departamento_id": 1,
        "municipio_id": 2,
        "correo": "luisa@example.com",
        "telefono": "3001234567",
        "fecha_nacimiento": "1988-02-29"
    })
}
