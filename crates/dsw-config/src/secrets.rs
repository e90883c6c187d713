//! Single source of truth for runtime secret resolution, mirroring the
//! teacher's `mqk-config::secrets`.
//!
//! # Contract
//! - The config file stores only **env var NAMES**
//!   (`broker_config.<active_broker>.keys_env.api_key`, etc.), never values.
//! - Callers invoke [`resolve_secrets_for_mode`] once at startup and pass the
//!   result into constructors; `std::env::var` is never called anywhere else.
//! - `Debug` on [`ResolvedSecrets`] redacts every value.
//! - Error messages name the env var, never its value.
//!
//! # Mode-aware enforcement
//! - `Live`: broker api_key + api_secret are required.
//! - `Paper`: broker api_key + api_secret are required.
//! - `Backtest`: nothing required — a backtest never talks to a broker.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::consumption::RunMode;

/// All runtime-resolved secrets for one engine instantiation.
/// **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub broker_api_key: Option<String>,
    pub broker_api_secret: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("broker_api_key", &self.broker_api_key.as_ref().map(|_| "<REDACTED>"))
            .field("broker_api_secret", &self.broker_api_secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

struct SecretEnvNames {
    api_key_var: String,
    api_secret_var: String,
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Reads `broker_config.<active_broker>.keys_env.{api_key,api_secret}` from
/// the raw config JSON, falling back to well-known default env var names if
/// the adapter config doesn't override them.
fn parse_env_names(config_json: &Value, active_broker: &str) -> SecretEnvNames {
    let base = format!("/broker_config/{active_broker}/keys_env");
    SecretEnvNames {
        api_key_var: read_str_at(config_json, &format!("{base}/api_key"))
            .unwrap_or_else(|| "DSW_BROKER_API_KEY".to_string()),
        api_secret_var: read_str_at(config_json, &format!("{base}/api_secret"))
            .unwrap_or_else(|| "DSW_BROKER_API_SECRET".to_string()),
    }
}

/// Resolve broker secrets from the environment for the given run mode.
///
/// # Errors
/// Returns `Err` naming the env var NAME of the first missing required
/// variable; the value is never mentioned.
pub fn resolve_secrets_for_mode(config_json: &Value, active_broker: &str, mode: RunMode) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json, active_broker);
    let broker_api_key = resolve_env(&names.api_key_var);
    let broker_api_secret = resolve_env(&names.api_secret_var);

    match mode {
        RunMode::Live => {
            if broker_api_key.is_none() {
                bail!("SECRETS_MISSING mode=live: required env var '{}' (broker api_key) is not set or empty", names.api_key_var);
            }
            if broker_api_secret.is_none() {
                bail!("SECRETS_MISSING mode=live: required env var '{}' (broker api_secret) is not set or empty", names.api_secret_var);
            }
        }
        RunMode::Paper => {
            if broker_api_key.is_none() {
                bail!("SECRETS_MISSING mode=paper: required env var '{}' (broker api_key) is not set or empty", names.api_key_var);
            }
            if broker_api_secret.is_none() {
                bail!("SECRETS_MISSING mode=paper: required env var '{}' (broker api_secret) is not set or empty", names.api_secret_var);
            }
        }
        RunMode::Backtest => {
            // A backtest never places a broker order; keys are optional.
        }
    }

    Ok(ResolvedSecrets { broker_api_key, broker_api_secret })
}
