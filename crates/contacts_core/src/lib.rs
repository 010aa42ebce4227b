//! Core contact lifecycle logic for the contacts app.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod seed;
pub mod service;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{
    normalize_phone, Contact, ContactDraft, ContactId, ContactValidationError, Lifecycle,
    TrashEntry, TrashEntryId,
};
pub use repo::kv_repo::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError, StoreResult,
};
pub use search::debounce::Debouncer;
pub use search::filter::{search_contacts, ContactQuery, TeamFilter, ALL_TEAMS, DEFAULT_TEAMS};
pub use seed::{sample_contacts, SampleSeed, SeedError, SeedSource};
pub use service::contact_store::{
    Clock, ConfirmPrompt, ContactStore, ContactStoreError, LoadState, ManualClock,
    StoreOpResult, SystemClock,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
