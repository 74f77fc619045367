use anyhow::Context;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub public_base_url: String,
    pub allowed_origins: Vec<String>,
    pub store_timeout_ms: u64,
    pub redirect_status: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            _ => DatabaseBackend::Sqlite,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./snip.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"));

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let store_timeout_ms = std::env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .context("STORE_TIMEOUT_MS must be milliseconds")?;

        let redirect_status = parse_redirect_status(std::env::var("REDIRECT_STATUS").ok());

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            public_base_url,
            allowed_origins,
            store_timeout_ms,
            redirect_status,
        })
    }
}

/// Parse REDIRECT_STATUS; anything that is not a redirect status code,
/// including unparseable values, warns and falls back to 302.
fn parse_redirect_status(raw: Option<String>) -> u16 {
    let Some(raw) = raw else {
        return 302;
    };

    let parsed = raw
        .trim()
        .parse::<u16>()
        .ok()
        .and_then(|v| StatusCode::from_u16(v).ok())
        .filter(StatusCode::is_redirection);

    match parsed {
        Some(code) => code.as_u16(),
        None => {
            tracing::warn!("REDIRECT_STATUS '{raw}' is not a redirect status, using 302");
            302
        }
    }
}
