// src/common/config.rs
//! Runtime configuration read from the environment (and `.env` via dotenv)

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::dev_mode::DevModeConfig;
use super::error::AppError;

pub const DEFAULT_AVATAR_BUCKET: &str = "avatars";
/// Joined onto the per-user config directory
pub const SESSION_FILE_NAME: &str = "monynha/session.json";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub avatar_bucket: String,
    /// `None` keeps the session in memory only
    pub session_file: Option<PathBuf>,
    pub http_timeout: Duration,
    pub dev_mode: DevModeConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|key| env::var(key).ok());
        config.dev_mode = DevModeConfig::from_env();
        config
    }

    /// Builds the config from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let supabase_url = get("SUPABASE_URL").map(|url| url.trim_end_matches('/').to_string());
        let supabase_anon_key = get("SUPABASE_ANON_KEY");
        let avatar_bucket =
            get("AVATAR_BUCKET").unwrap_or_else(|| DEFAULT_AVATAR_BUCKET.to_string());

        let session_file = match get("SESSION_FILE") {
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            Some(value) => Some(PathBuf::from(value)),
            None => default_session_file(&get),
        };

        let http_timeout_secs = get("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            supabase_url,
            supabase_anon_key,
            avatar_bucket,
            session_file,
            http_timeout: Duration::from_secs(http_timeout_secs),
            dev_mode: DevModeConfig {
                enabled: false,
                user_email: "dev@test.com".to_string(),
                user_name: "Dev User".to_string(),
            },
        }
    }

    /// Project URL and anon key, both required outside dev mode
    pub fn provider_credentials(&self) -> Result<(String, String), AppError> {
        let url = self
            .supabase_url
            .clone()
            .ok_or_else(|| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let key = self
            .supabase_anon_key
            .clone()
            .ok_or_else(|| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "SUPABASE_URL must start with http:// or https://, got '{}'",
                url
            )));
        }

        Ok((url, key))
    }
}

/// `$XDG_CONFIG_HOME/monynha/session.json`, else `$HOME/.config/...`.
/// Without either the session is kept in memory only.
fn default_session_file<F>(get: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = get("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(dir).join(SESSION_FILE_NAME));
    }

    get("HOME").map(|home| PathBuf::from(home).join(".config").join(SESSION_FILE_NAME))
}
