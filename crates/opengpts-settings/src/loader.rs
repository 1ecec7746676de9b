//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`OpenGptsSettings::default()`]
//! 2. If `~/.opengpts/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate cross-field constraints
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::OpenGptsSettings;

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string())
}

/// Resolve the path to the settings file (`~/.opengpts/settings.json`).
pub fn settings_path() -> PathBuf {
    PathBuf::from(home_dir())
        .join(".opengpts")
        .join("settings.json")
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{rest}", home_dir()),
        None => path.to_string(),
    }
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<OpenGptsSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, or the merged result fails validation, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<OpenGptsSettings> {
    let defaults = serde_json::to_value(OpenGptsSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: OpenGptsSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut OpenGptsSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Empty strings are treated as unset
/// - Invalid values are ignored with a warning (fall back to file/default)
///
/// `OPENGPTS_STORE_URL` wins over `REDIS_URL` when both are set.
pub fn apply_overrides_from<F>(settings: &mut OpenGptsSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let ranged_u32 = |name: &str, min: u32, max: u32| {
        let val = lookup(name)?;
        let result = parse_u32_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
        }
        result
    };
    let ranged_usize = |name: &str, min: usize, max: usize| {
        let val = lookup(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    };

    // ── Store ───────────────────────────────────────────────────────
    if let Some(v) = string("REDIS_URL") {
        settings.store.url = v;
    }
    if let Some(v) = string("OPENGPTS_STORE_URL") {
        settings.store.url = v;
    }
    if let Some(v) = ranged_u32("OPENGPTS_POOL_SIZE", 1, 256) {
        settings.store.pool_size = v;
    }

    // ── Ingest ──────────────────────────────────────────────────────
    if let Some(v) = ranged_usize("OPENGPTS_CHUNK_SIZE", 1, 100_000) {
        settings.ingest.chunk_size = v;
    }
    if let Some(v) = ranged_usize("OPENGPTS_CHUNK_OVERLAP", 0, 100_000) {
        settings.ingest.chunk_overlap = v;
    }
    if let Some(v) = string("OPENGPTS_VECTOR_DB") {
        settings.ingest.vector_db_path = v;
    }
    if let Some(v) = string("OPENAI_API_KEY") {
        settings.ingest.embedding.api_key = Some(v);
    }
    if let Some(v) = string("OPENAI_BASE_URL") {
        settings.ingest.embedding.base_url = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = string("OPENGPTS_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
