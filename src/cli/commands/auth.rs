use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{fail, output_success};
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to server and print the issued credential")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
        #[arg(long, help = "API base URL (defaults to REGISTRY_API_URL, then the local server)")]
        url: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password, url } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password()?,
            };
            let base_url = url.unwrap_or_else(default_base_url);
            login(&base_url, &username, &password, output_format).await
        }
    }
}

async fn login(base_url: &str, username: &str, password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let endpoint = format!("{}/auth/login", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .with_context(|| format!("failed to reach {}", endpoint))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("{} returned a non-JSON response ({})", endpoint, status))?;

    if !status.is_success() {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("login failed");
        return Err(fail(&output_format, message, Some(status.as_str())));
    }

    let data = body.get("data").cloned().unwrap_or(Value::Null);
    output_success(&output_format, &format!("Logged in as {}", username), Some(data))
}

/// `REGISTRY_API_URL`, else the address the server binary would bind from the same environment.
fn default_base_url() -> String {
    if let Ok(url) = std::env::var("REGISTRY_API_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }
    let config = AppConfig::from_env();
    format!("http://localhost:{}{}", config.server.port, config.server.base_path)
}

fn prompt_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
