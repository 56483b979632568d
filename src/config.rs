use std::env;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

fn get_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn get_env_bool(key: &str, default: bool) -> bool {
    match get_env(key) {
        None => default,
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"),
    }
}

fn get_env_usize(key: &str, default: usize) -> Result<usize> {
    match get_env(key) {
        None => Ok(default),
        Some(v) => Ok(v
            .parse::<usize>()
            .map_err(|e| anyhow!("{key} invalid int: {e}"))?),
    }
}

fn get_env_string(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Network
    pub api_base_url: String,
    pub http_timeout_secs: u64,

    // Navigation guard
    pub guard_fencing: bool,

    // Chat buffer
    pub max_chat_messages: usize,

    // Refresh loop timing
    pub unread_refresh_secs: u64,

    // Storage
    pub storage_path: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let api_base_url = get_env_string("API_BASE_URL", "http://localhost:8000/api")
            .trim_end_matches('/')
            .to_string();

        let s = Self {
            api_base_url,
            http_timeout_secs: get_env_usize("HTTP_TIMEOUT_SECS", 10)? as u64,
            guard_fencing: get_env_bool("GUARD_FENCING", true),
            max_chat_messages: get_env_usize("MAX_CHAT_MESSAGES", 5)?,
            unread_refresh_secs: get_env_usize("UNREAD_REFRESH_SECS", 30)? as u64,
            storage_path: get_env_string("STOCKDESK_STORAGE", "./data/stockdesk.sqlite"),
        };

        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(anyhow!(
                "API_BASE_URL must be an http(s) url (got {})",
                self.api_base_url
            ));
        }
        if self.max_chat_messages < 1 {
            return Err(anyhow!(
                "MAX_CHAT_MESSAGES must be >= 1 (got {})",
                self.max_chat_messages
            ));
        }
        if self.unread_refresh_secs < 1 {
            return Err(anyhow!(
                "UNREAD_REFRESH_SECS must be >= 1 (got {})",
                self.unread_refresh_secs
            ));
        }
        if self.http_timeout_secs < 1 {
            return Err(anyhow!(
                "HTTP_TIMEOUT_SECS must be >= 1 (got {})",
                self.http_timeout_secs
            ));
        }
        Ok(())
    }
}
