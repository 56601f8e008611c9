use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub allora: AlloraConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlloraConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_base_url() -> String { "https://api.allora.network/v2".to_string() }
fn default_request_timeout() -> u64 { 30 }

impl AlloraConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub allora_chain: String,
    pub allora_api_key: String,
    pub api_port: u16,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            allora_chain: std::env::var("ALLORA_CHAIN")
                .unwrap_or_else(|_| "testnet".to_string()),
            allora_api_key: std::env::var("ALLORA_API_KEY")
                .context("ALLORA_API_KEY not set")?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("API_PORT is not a valid port number")?,
        })
    }
}
