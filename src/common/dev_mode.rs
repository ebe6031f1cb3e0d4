// src/common/dev_mode.rs
//! Development mode configuration and utilities
//! Swaps the hosted provider for the in-memory one, with a signed-in dev user

use std::env;

use crate::auth::models::Identity;

/// Fixed id so the dev user's profile survives across commands in one run
pub const DEV_USER_ID: &str = "00000000-0000-0000-0000-000000000001";
pub const DEV_USER_PASSWORD: &str = "dev-password";

#[derive(Debug, Clone)]
pub struct DevModeConfig {
    pub enabled: bool,
    pub user_email: String,
    pub user_name: String,
}

impl DevModeConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        let user_email = env::var("DEV_USER_EMAIL").unwrap_or_else(|_| "dev@test.com".to_string());

        let user_name = env::var("DEV_USER_NAME").unwrap_or_else(|_| "Dev User".to_string());

        Self {
            enabled,
            user_email,
            user_name,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Identity the in-memory provider signs in on startup
    pub fn dev_identity(&self) -> Identity {
        Identity {
            id: DEV_USER_ID.to_string(),
            email: Some(self.user_email.clone()),
        }
    }
}

/// Print dev mode status on startup
pub fn print_dev_mode_status(config: &DevModeConfig) {
    if config.enabled {
        eprintln!("⚠️  DEV MODE ENABLED: in-memory provider, nothing leaves this process");
        eprintln!("   Dev User: {} ({})", config.user_name, config.user_email);
        eprintln!();
    }
}

const DEV_MODE_FLAGS: &[&str] = &["--dev", "--dev-mode", "--no-dev", "--prod", "--production"];

/// Splits the leading mode flags from the command and its arguments.
/// Anything after the command name is left to the command, even if it
/// looks like a flag.
pub fn split_cli_args(args: &[String]) -> (Vec<String>, Vec<String>) {
    let flags = args
        .iter()
        .take_while(|arg| DEV_MODE_FLAGS.contains(&arg.as_str()))
        .count();

    (args[..flags].to_vec(), args[flags..].to_vec())
}

/// CLI argument parsing for dev mode
pub fn parse_dev_mode_args(args: &[String]) -> Option<bool> {
    for arg in args {
        match arg.as_str() {
            "--dev" | "--dev-mode" => return Some(true),
            "--no-dev" | "--prod" | "--production" => return Some(false),
            _ => {}
        }
    }

    None
}

/// Override dev mode from CLI args
pub fn apply_cli_override(mut config: DevModeConfig, args: &[String]) -> DevModeConfig {
    if let Some(cli_dev_mode) = parse_dev_mode_args(args) {
        config.enabled = cli_dev_mode;
    }

    config
}
