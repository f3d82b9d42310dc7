use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::model::credential::{ApiKey, CredentialSource};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model identifiers and generation knobs handed to the gateway.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub chat_model: String,
    pub analysis_model: String,
    pub quiz_model: String,
    pub thinking_budget: u32,
    pub max_reply_chars: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_model: "gemini-3-flash-preview".to_string(),
            analysis_model: "gemini-3-pro-preview".to_string(),
            quiz_model: "gemini-3-flash-preview".to_string(),
            thinking_budget: 32768,
            max_reply_chars: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub models: ModelConfig,
    pub request_timeout: Option<Duration>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = ModelConfig::default();

        let base_url = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let models = ModelConfig {
            chat_model: env::var("CHAT_MODEL").unwrap_or(defaults.chat_model),
            analysis_model: env::var("ANALYSIS_MODEL").unwrap_or(defaults.analysis_model),
            quiz_model: env::var("QUIZ_MODEL").unwrap_or(defaults.quiz_model),
            thinking_budget: parse_var("THINKING_BUDGET")?.unwrap_or(defaults.thinking_budget),
            max_reply_chars: parse_var("MAX_REPLY_CHARS")?,
        };
        let request_timeout = parse_var::<u64>("REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs);
        let host = env::var("BIND_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("PORT")?.unwrap_or(8080);

        info!("Using completion service at: {}", base_url);
        info!(
            "Models: chat={}, analysis={}, quiz={}",
            models.chat_model, models.analysis_model, models.quiz_model
        );

        Ok(Self {
            base_url,
            models,
            request_timeout,
            host,
            port,
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}

const API_KEY_VAR: &str = "API_KEY";

/// Resolves `API_KEY` from the dotenv file, read fresh on every call so a key
/// written after startup is picked up, then from the process environment.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    path: PathBuf,
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::with_path(".env")
    }
}

impl EnvCredentialSource {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn from_file(&self) -> Option<ApiKey> {
        let entries = match dotenv::from_path_iter(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No credential file at {}: {}", self.path.display(), e);
                return None;
            }
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter(|(key, _)| key == API_KEY_VAR)
            .last()
            .and_then(|(_, value)| ApiKey::new(value))
    }
}

impl CredentialSource for EnvCredentialSource {
    fn resolve(&self) -> Option<ApiKey> {
        self.from_file()
            .or_else(|| env::var(API_KEY_VAR).ok().and_then(ApiKey::new))
    }
}
