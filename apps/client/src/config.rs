use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted storage/auth service (`https://<ref>.supabase.co`).
    pub storage_url: String,
    /// Anonymous API key sent with every storage/auth request.
    pub storage_anon_key: String,
    /// Base URL of the document generation service.
    pub generator_url: String,
    /// Directory holding the local persistent slots (dossier, prefs, session).
    pub data_dir: PathBuf,
    /// Directory generated documents are downloaded into.
    pub output_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            storage_url: require_env("STORAGE_URL")?,
            storage_anon_key: require_env("STORAGE_ANON_KEY")?,
            generator_url: std::env::var("GENERATOR_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            data_dir: match std::env::var("DATA_DIR") {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => default_data_dir()?,
            },
            output_dir: PathBuf::from(
                std::env::var("OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
            ),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine a data directory; set DATA_DIR")?;
    Ok(base.join("cvespresso"))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
