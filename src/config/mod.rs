// src/config/mod.rs
// All tunables come from the process environment (plus .env via dotenvy).

use std::str::FromStr;

/// Accepted names for the video-catalog API key. Hosted dashboards have
/// produced every one of these spellings at some point.
const CATALOG_KEY_ALIASES: &[&str] = &["YT_API_KEY", "YT_APIKEY", "YOUTUBE_API_KEY", "YT_KEY"];

/// Accepted names for the target channel identifier.
const CHANNEL_ALIASES: &[&str] = &["YT_CHANNEL_ID", "YOUTUBE_CHANNEL_ID", "CHANNEL_ID"];

#[derive(Debug, Clone)]
pub struct RelayConfig {
    // ── Credentials
    pub gemini_api_key: Option<String>,
    pub catalog_api_key: Option<String>,
    pub channel_id: Option<String>,

    // ── Server
    pub host: String,
    pub port: u16,
    pub assets_dir: String,

    // ── Relay behavior
    pub show_name: String,
    pub gemini_model: String,
    pub guardrail_enabled: bool,
    /// How many recent uploads the "most popular" ranking scans.
    pub popular_window: usize,
}

/// Returns the first non-empty env var among `keys`. Falls back to scanning
/// every variable with its name trimmed, because hosted environment tabs have
/// shipped keys with accidental leading/trailing whitespace.
fn env_any(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(val) = std::env::var(key) {
            let val = val.trim();
            if !val.is_empty() {
                return Some(val.to_string());
            }
        }
        for (name, val) in std::env::vars() {
            if name.trim() == *key && !val.trim().is_empty() {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

/// Parse an env var, tolerating trailing comments and whitespace.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    tracing::warn!("config: {} = '{}' failed to parse, using default", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: env_any(&["GEMINI_API_KEY"]),
            catalog_api_key: env_any(CATALOG_KEY_ALIASES),
            channel_id: env_any(CHANNEL_ALIASES),
            host: env_var_or("HOST", "0.0.0.0".to_string()),
            port: env_var_or("PORT", 3000),
            assets_dir: env_var_or("ASSETS_DIR", "public".to_string()),
            show_name: env_var_or("SHOW_NAME", "the show".to_string()),
            gemini_model: env_var_or("GEMINI_MODEL", "gemini-2.5-flash".to_string()),
            guardrail_enabled: env_var_or("GUARDRAIL_ENABLED", true),
            popular_window: env_var_or("POPULAR_WINDOW", 25),
        }
    }

    /// Server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Catalog key masked for the debug endpoint: first 4 characters only.
    pub fn catalog_key_preview(&self) -> Option<String> {
        self.catalog_api_key
            .as_ref()
            .map(|k| format!("{}...", k.chars().take(4).collect::<String>()))
    }

    /// True when both catalog credentials are present.
    pub fn catalog_configured(&self) -> bool {
        self.catalog_api_key.is_some() && self.channel_id.is_some()
    }

    /// Log which credentials are present (booleans only, never values).
    pub fn log_presence(&self) {
        tracing::info!(
            has_gemini = self.gemini_api_key.is_some(),
            has_catalog_key = self.catalog_api_key.is_some(),
            has_channel = self.channel_id.is_some(),
            "boot env check"
        );
    }
}
