//! Store configuration and environment overrides.
//!
//! # Responsibility
//! - Hold storage keys, retention and timing settings in one place.
//! - Resolve overrides from process environment without failing startup.
//!
//! # Invariants
//! - Invalid or non-positive overrides fall back to defaults and are logged.

use log::warn;

/// Slot holding the serialized active collection.
pub const ACTIVE_STORAGE_KEY: &str = "contacts_app_contacts_v1";
/// Slot holding the serialized trash collection.
pub const TRASH_STORAGE_KEY: &str = "contacts_app_trash_v1";
/// Seven days in milliseconds.
pub const DEFAULT_RETENTION_MS: i64 = 7 * 24 * 60 * 60 * 1000;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: i64 = 220;
pub const DEFAULT_SEED_LATENCY_MS: u64 = 300;

const RETENTION_ENV: &str = "CONTACTS_RETENTION_MS";
const DEBOUNCE_ENV: &str = "CONTACTS_DEBOUNCE_MS";
const SEED_LATENCY_ENV: &str = "CONTACTS_SEED_LATENCY_MS";

/// Runtime settings for [`crate::ContactStore`] and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub active_key: String,
    pub trash_key: String,
    /// Trash entries at or beyond this age are pruned.
    pub retention_ms: i64,
    pub search_debounce_ms: i64,
    /// Artificial delay applied by [`crate::SampleSeed`].
    pub seed_latency_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            active_key: ACTIVE_STORAGE_KEY.to_string(),
            trash_key: TRASH_STORAGE_KEY.to_string(),
            retention_ms: DEFAULT_RETENTION_MS,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            seed_latency_ms: DEFAULT_SEED_LATENCY_MS,
        }
    }
}

impl StoreConfig {
    /// Builds defaults, then applies `CONTACTS_*` environment overrides.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StoreConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = positive_override(&lookup, RETENTION_ENV) {
            config.retention_ms = value;
        }
        if let Some(value) = positive_override(&lookup, DEBOUNCE_ENV) {
            config.search_debounce_ms = value;
        }
        if let Some(value) = positive_override(&lookup, SEED_LATENCY_ENV) {
            config.seed_latency_ms = value.unsigned_abs();
        }
        config
    }
}

fn positive_override(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<i64> {
    let raw = lookup(name)?;
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!("event=config_override module=config status=ignored var={name}");
            None
        }
    }
}
