//! Static JSON configuration, the live-mode safety gate, and secret
//! resolution (§6). Grounded on the teacher's `mqk-config` crate, with one
//! deliberate simplification: §6 specifies a single static JSON file, not
//! the teacher's layered-YAML-with-deep-merge scheme, so `load_config`
//! reads one file and skips `deep_merge` entirely. The canonicalize-and-hash
//! step the teacher uses for config audit logging is kept unchanged.

mod consumption;
mod secrets;

pub use consumption::{consumed_pointers, RunMode};
pub use secrets::{resolve_secrets_for_mode, ResolvedSecrets};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dsw_risk::RiskConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path} as JSON: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("live mode requires --confirm-live, which was not passed")]
    LiveGateMissingFlag,
    #[error("live mode requires ALGO_LIVE_CONFIRMED=true in the environment, which was not set")]
    LiveGateMissingEnv,
    #[error("{0}")]
    Secrets(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Paper,
    Live,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStopSection {
    pub enabled: bool,
    pub activation_pct: f64,
    pub trail_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerSection {
    pub trip_threshold: u32,
    pub trip_window_seconds: u64,
}

/// `risk.*`. `limits` is the subset the risk manager itself consumes
/// (`dsw_risk::RiskConfig`); `max_hold_days`, `trailing_stop` and
/// `circuit_breaker` are siblings in the same JSON object, flattened in
/// because they're consumed by other components (orchestrator, circuit
/// breaker) rather than the risk engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSection {
    #[serde(flatten)]
    pub limits: RiskConfig,
    pub max_hold_days: i64,
    pub trailing_stop: TrailingStopSection,
    pub circuit_breaker: CircuitBreakerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    pub ai_output_dir: PathBuf,
    pub market_data_dir: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSection {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

/// Root config shape (§6). `broker_config` is kept as raw JSON per adapter
/// name since its shape varies per broker and the core never inspects it —
/// only the concrete `BrokerAdapter` implementation named by `active_broker`
/// reads its own sub-object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub active_broker: String,
    pub trading_mode: TradingMode,
    pub capital: f64,
    pub polling_interval_minutes: u32,
    pub risk: RiskSection,
    pub paths: PathsSection,
    pub webhook: WebhookSection,
    #[serde(default)]
    pub broker_config: HashMap<String, Value>,
}

/// A config file, loaded and canonicalized, with its audit hash (§7: config
/// errors fail fast at startup, so this is the first thing a binary does).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub raw_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<LoadedConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let raw_json: Value =
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    let config: AppConfig = serde_json::from_value(raw_json.clone())
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

    let sorted = sort_keys(&raw_json);
    let canonical_json = serde_json::to_string(&sorted).expect("json serialization must not fail");
    let mut hasher = Sha256::new();
    hasher.update(canonical_json.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig { config, raw_json, canonical_json, config_hash })
}

/// Canonicalize JSON by sorting all object keys recursively, so two configs
/// that differ only in key order hash identically.
fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// §6: starting in live mode requires BOTH `--confirm-live` and
/// `ALGO_LIVE_CONFIRMED=true`; missing either aborts before any broker call.
/// A no-op in paper mode.
pub fn enforce_live_gate(mode: TradingMode, confirm_live_flag: bool) -> Result<(), ConfigError> {
    if mode != TradingMode::Live {
        return Ok(());
    }
    if !confirm_live_flag {
        return Err(ConfigError::LiveGateMissingFlag);
    }
    let env_confirmed = std::env::var("ALGO_LIVE_CONFIRMED").map(|v| v == "true").unwrap_or(false);
    if !env_confirmed {
        return Err(ConfigError::LiveGateMissingEnv);
    }
    Ok(())
}
