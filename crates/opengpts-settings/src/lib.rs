//! # opengpts-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`OpenGptsSettings::default()`]
//! 2. **User file**: `~/.opengpts/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `REDIS_URL`, `OPENGPTS_*` and `OPENAI_*`
//!    overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use opengpts_settings::load_settings;
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("store: {}", settings.store.url);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, expand_home, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = OpenGptsSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn default_settings_are_valid() {
        let settings = OpenGptsSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.store.url, "sqlite://~/.opengpts/store.db");
        assert_eq!(settings.ingest.chunk_size, 1000);
        assert_eq!(settings.ingest.chunk_overlap, 200);
        assert_eq!(settings.ingest.index_name, "opengpts");
        assert_eq!(settings.logging.level, "warn");
    }
}
