use std::net::SocketAddr;

use crate::error::{ConverterError, Result};

pub const API_KEY_VAR: &str = "API_KEY";
pub const API_BASE_VAR: &str = "API_BASE";
pub const MODEL_VAR: &str = "MODEL";
pub const SYSTEM_PROMPT_VAR: &str = "SYSTEM_PROMPT";
pub const RELAY_ADDR_VAR: &str = "RELAY_ADDR";

/// Relay listens on all interfaces, port 5000, unless `RELAY_ADDR` says otherwise.
pub fn default_relay_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

/// Connection settings for the chat-completion endpoint.
#[derive(Clone)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// Settings for the chat relay server.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub completion: CompletionConfig,
    pub system_prompt: String,
    pub bind: SocketAddr,
}

/// Loads `.env` from the working directory into the process environment.
/// A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env: {e}"),
    }
}

/// Reads a variable from the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required<F>(lookup: &F, key: &'static str, missing: &mut Vec<&'static str>) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(key);
            String::new()
        }
    }
}

impl CompletionConfig {
    /// Builds the config from a variable lookup, reporting every missing key at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let config = Self::collect(&lookup, &mut missing);
        if missing.is_empty() {
            Ok(config)
        } else {
            Err(ConverterError::ConfigurationMissing(missing))
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    fn collect<F>(lookup: &F, missing: &mut Vec<&'static str>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: required(lookup, API_KEY_VAR, missing),
            endpoint: required(lookup, API_BASE_VAR, missing),
            model: required(lookup, MODEL_VAR, missing),
        }
    }
}

impl RelayConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let completion = CompletionConfig::collect(&lookup, &mut missing);
        let system_prompt = required(&lookup, SYSTEM_PROMPT_VAR, &mut missing);
        if !missing.is_empty() {
            return Err(ConverterError::ConfigurationMissing(missing));
        }

        let bind = match lookup(RELAY_ADDR_VAR).filter(|v| !v.trim().is_empty()) {
            None => default_relay_addr(),
            Some(addr) => addr.trim().parse::<SocketAddr>().map_err(|_| ConverterError::ConfigurationInvalid {
                key: RELAY_ADDR_VAR,
                value: addr,
            })?,
        };

        Ok(Self {
            completion,
            system_prompt,
            bind,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }
}
