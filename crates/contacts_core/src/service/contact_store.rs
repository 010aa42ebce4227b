//! Contact lifecycle store.
//!
//! # Responsibility
//! - Own the active and trash collections for one session.
//! - Enforce lifecycle transitions: create, update, soft delete, restore,
//!   purge, empty and retention expiry.
//! - Persist both collections to durable slots after every mutation.
//!
//! # Invariants
//! - A contact lives in exactly one collection.
//! - Every mutation runs to completion under `&mut self`; no interleaving.
//! - Persistence failures never fail the mutation that triggered them; the
//!   in-memory collections stay authoritative and a warning is logged.
//! - Issued ids are strictly increasing for the lifetime of the store.

use crate::config::StoreConfig;
use crate::model::contact::{
    Contact, ContactDraft, ContactId, ContactValidationError, Lifecycle, TrashEntry, TrashEntryId,
    TrashRecord,
};
use crate::repo::kv_repo::{read_json, write_json, KeyValueStore};
use crate::search::debounce::Debouncer;
use crate::search::filter::{search_contacts, ContactQuery};
use crate::seed::{SeedError, SeedSource};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const EMPTY_TRASH_PROMPT: &str = "Empty the Recycle Bin? This permanently deletes all items.";
pub const PURGE_PROMPT: &str = "Delete permanently?";

/// Source of epoch-millisecond timestamps.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Shared, manually advanced clock for tests and replay tooling.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Yes/no collaborator consulted before permanent removal.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Errors surfaced synchronously by store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactStoreError {
    Validation(ContactValidationError),
    /// No active contact carries this id.
    ContactNotFound(ContactId),
    /// The trash no longer holds this entry.
    TrashEntryNotFound(TrashEntryId),
    /// The seed list has not resolved yet; the active collection is not
    /// writable.
    NotReady,
}

impl Display for ContactStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid {}: {err}", err.field()),
            Self::ContactNotFound(id) => write!(f, "contact not found: {id}"),
            Self::TrashEntryNotFound(entry_id) => write!(f, "trash entry not found: {entry_id}"),
            Self::NotReady => write!(f, "contacts are still loading"),
        }
    }
}

impl Error for ContactStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactValidationError> for ContactStoreError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type StoreOpResult<T> = Result<T, ContactStoreError>;

/// Whether the active collection has been populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Waiting for the seed source.
    Loading,
    Ready,
}

/// Session-scoped owner of the active and trash collections.
pub struct ContactStore<S: KeyValueStore, C: Clock = SystemClock> {
    backend: S,
    clock: C,
    config: StoreConfig,
    active: Vec<Contact>,
    trash: Vec<TrashEntry>,
    load_state: LoadState,
    last_issued_id: ContactId,
    pending_search: Debouncer<ContactQuery>,
}

impl<S: KeyValueStore, C: Clock> ContactStore<S, C> {
    /// Loads persisted collections without touching any seed source.
    ///
    /// When no readable active list exists the store stays
    /// [`LoadState::Loading`] until [`ContactStore::complete_seed`] is called.
    /// Persisted trash is pruned of expired entries and rewritten at once.
    pub fn initialize(backend: S, clock: C, config: StoreConfig) -> Self {
        let pending_search = Debouncer::from_config(&config);
        let mut store = Self {
            backend,
            clock,
            config,
            active: Vec::new(),
            trash: Vec::new(),
            load_state: LoadState::Loading,
            last_issued_id: 0,
            pending_search,
        };
        store.load_active();
        store.load_trash();
        store.last_issued_id = store.max_known_id();
        store
    }

    /// Initializes the store and resolves the seed source if needed.
    pub fn open(backend: S, clock: C, config: StoreConfig, seed: &impl SeedSource) -> Self {
        let mut store = Self::initialize(backend, clock, config);
        if store.is_loading() {
            store.complete_seed(seed.fetch());
        }
        store
    }

    /// Finishes a pending seed load.
    ///
    /// A failed seed leaves the active list empty but marks the store ready;
    /// nothing is persisted so the next session retries the seed. Returns
    /// `false` when the store was not waiting for a seed.
    pub fn complete_seed(&mut self, seeded: Result<Vec<Contact>, SeedError>) -> bool {
        if self.load_state == LoadState::Ready {
            warn!("event=seed_apply module=store status=ignored reason=already_ready");
            return false;
        }
        match seeded {
            Ok(contacts) => {
                info!(
                    "event=seed_apply module=store status=ok count={}",
                    contacts.len()
                );
                self.active = contacts;
                self.last_issued_id = self.max_known_id();
                self.load_state = LoadState::Ready;
                self.persist_active();
            }
            Err(err) => {
                warn!("event=seed_apply module=store status=error error={err}");
                self.active.clear();
                self.load_state = LoadState::Ready;
            }
        }
        true
    }

    /// Validates and prepends a new contact.
    pub fn create(&mut self, draft: ContactDraft) -> StoreOpResult<Contact> {
        self.ensure_ready()?;
        let draft = draft.normalized();
        if let Err(err) = draft.validate() {
            info!(
                "event=contact_create module=store status=rejected field={}",
                err.field()
            );
            return Err(err.into());
        }

        let contact = draft.into_contact(self.next_id());
        self.active.insert(0, contact.clone());
        info!(
            "event=contact_create module=store status=ok id={} active_count={}",
            contact.id,
            self.active.len()
        );
        self.persist_active();
        Ok(contact)
    }

    /// Replaces an active contact in place, keeping its id and position.
    pub fn update(&mut self, contact: Contact) -> StoreOpResult<Contact> {
        self.ensure_ready()?;
        let index = self
            .active_index(contact.id)
            .ok_or(ContactStoreError::ContactNotFound(contact.id))?;
        let contact = contact.normalized();
        if let Err(err) = contact.validate() {
            info!(
                "event=contact_update module=store status=rejected id={} field={}",
                contact.id,
                err.field()
            );
            return Err(err.into());
        }

        self.active[index] = contact.clone();
        info!(
            "event=contact_update module=store status=ok id={}",
            contact.id
        );
        self.persist_active();
        Ok(contact)
    }

    /// Moves an active contact into the trash, stamped with the current time.
    pub fn soft_delete(&mut self, id: ContactId) -> StoreOpResult<TrashEntry> {
        self.ensure_ready()?;
        let index = self
            .active_index(id)
            .ok_or(ContactStoreError::ContactNotFound(id))?;

        let entry = self.active.remove(index).into_trash(self.clock.now_ms());
        self.trash.insert(0, entry.clone());
        info!(
            "event=contact_soft_delete module=store status=ok id={} trash_count={}",
            id,
            self.trash.len()
        );
        self.persist_active();
        self.persist_trash();
        Ok(entry)
    }

    /// Moves a trash entry back to the active list under a fresh id.
    pub fn restore(&mut self, entry_id: TrashEntryId) -> StoreOpResult<Contact> {
        self.ensure_ready()?;
        let index = self
            .trash_index(entry_id)
            .ok_or(ContactStoreError::TrashEntryNotFound(entry_id))?;

        let entry = self.trash.remove(index);
        let previous_id = entry.contact.id;
        let restored = entry.restore(self.next_id());
        self.active.insert(0, restored.clone());
        info!(
            "event=contact_restore module=store status=ok previous_id={} id={}",
            previous_id, restored.id
        );
        self.persist_active();
        self.persist_trash();
        Ok(restored)
    }

    /// Permanently removes exactly one trash entry.
    pub fn purge(&mut self, entry_id: TrashEntryId) -> StoreOpResult<TrashEntry> {
        let index = self
            .trash_index(entry_id)
            .ok_or(ContactStoreError::TrashEntryNotFound(entry_id))?;

        let entry = self.trash.remove(index);
        info!(
            "event=contact_purge module=store status=ok id={} trash_count={}",
            entry.contact.id,
            self.trash.len()
        );
        self.persist_trash();
        Ok(entry)
    }

    /// Asks for confirmation, then purges one entry.
    ///
    /// Returns `Ok(None)` when the prompt is declined.
    pub fn purge_confirmed(
        &mut self,
        entry_id: TrashEntryId,
        prompt: &impl ConfirmPrompt,
    ) -> StoreOpResult<Option<TrashEntry>> {
        if self.trash_index(entry_id).is_none() {
            return Err(ContactStoreError::TrashEntryNotFound(entry_id));
        }
        if !prompt.confirm(PURGE_PROMPT) {
            info!("event=contact_purge module=store status=declined");
            return Ok(None);
        }
        self.purge(entry_id).map(Some)
    }

    /// Clears the trash after confirmation. Returns whether anything changed.
    pub fn empty_trash(&mut self, prompt: &impl ConfirmPrompt) -> bool {
        if !prompt.confirm(EMPTY_TRASH_PROMPT) {
            info!("event=trash_empty module=store status=declined");
            return false;
        }
        let removed = self.trash.len();
        self.trash.clear();
        info!("event=trash_empty module=store status=ok removed={removed}");
        self.persist_trash();
        true
    }

    /// Drops trash entries that outlived the retention window.
    ///
    /// Returns the number of entries removed; persists only when non-zero.
    pub fn prune_expired(&mut self) -> usize {
        let removed = self.retain_unexpired();
        if removed > 0 {
            info!("event=trash_prune module=store status=ok removed={removed}");
            self.persist_trash();
        }
        removed
    }

    /// Removes both persisted slots and hands the backend back so the host
    /// can reinitialize from scratch.
    pub fn reset(mut self) -> S {
        for key in [&self.config.active_key, &self.config.trash_key] {
            if let Err(err) = self.backend.remove(key) {
                warn!("event=store_reset module=store status=error slot={key} error={err}");
            }
        }
        info!("event=store_reset module=store status=ok");
        self.backend
    }

    /// Filters the active list by name substring and team label.
    pub fn search(&self, query: &str, team_filter: &str) -> Vec<&Contact> {
        self.search_with(&ContactQuery::new(query, team_filter))
    }

    pub fn search_with(&self, query: &ContactQuery) -> Vec<&Contact> {
        search_contacts(&self.active, query)
    }

    /// Records a keystroke; supersedes any search still waiting out the
    /// debounce delay. Returns the deadline for the host timer.
    pub fn schedule_search(&mut self, query: &str, team_filter: &str) -> i64 {
        let now_ms = self.clock.now_ms();
        self.pending_search
            .schedule(ContactQuery::new(query, team_filter), now_ms)
    }

    /// Runs the most recently scheduled search once its delay has elapsed.
    pub fn poll_search(&mut self) -> Option<Vec<&Contact>> {
        let query = self.pending_search.poll(self.clock.now_ms())?;
        Some(search_contacts(&self.active, &query))
    }

    /// Reports which collection currently holds `id`.
    ///
    /// Active wins when the same id exists in both collections' history.
    pub fn lifecycle_of(&self, id: ContactId) -> Option<Lifecycle> {
        if self.active_index(id).is_some() {
            return Some(Lifecycle::Active);
        }
        self.trash
            .iter()
            .find(|entry| entry.contact.id == id)
            .map(TrashEntry::lifecycle)
    }

    pub fn active(&self) -> &[Contact] {
        &self.active
    }

    pub fn trash(&self) -> &[TrashEntry] {
        &self.trash
    }

    pub fn trash_count(&self) -> usize {
        self.trash.len()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn load_active(&mut self) {
        match read_json::<Vec<Contact>, _>(&self.backend, &self.config.active_key) {
            Ok(Some(contacts)) => {
                info!(
                    "event=store_load module=store status=ok slot=active count={}",
                    contacts.len()
                );
                self.active = contacts;
                self.load_state = LoadState::Ready;
            }
            Ok(None) => {
                info!("event=store_load module=store status=absent slot=active");
            }
            Err(err) => {
                warn!("event=store_load module=store status=error slot=active error={err}");
            }
        }
    }

    fn load_trash(&mut self) {
        let records = match read_json::<Vec<TrashRecord>, _>(&self.backend, &self.config.trash_key)
        {
            Ok(Some(records)) => records,
            Ok(None) => return,
            Err(err) => {
                warn!("event=store_load module=store status=error slot=trash error={err}");
                return;
            }
        };

        let now_ms = self.clock.now_ms();
        self.trash = records
            .into_iter()
            .map(|record| TrashEntry::from_record(record, now_ms))
            .collect();
        let pruned = self.retain_unexpired();
        info!(
            "event=store_load module=store status=ok slot=trash count={} pruned={pruned}",
            self.trash.len()
        );
        self.persist_trash();
    }

    fn retain_unexpired(&mut self) -> usize {
        let now_ms = self.clock.now_ms();
        let retention_ms = self.config.retention_ms;
        let before = self.trash.len();
        self.trash
            .retain(|entry| !entry.is_expired(now_ms, retention_ms));
        before - self.trash.len()
    }

    fn persist_active(&mut self) {
        if let Err(err) = write_json(&mut self.backend, &self.config.active_key, &self.active) {
            warn!("event=persist module=store status=error slot=active error={err}");
        }
    }

    fn persist_trash(&mut self) {
        if let Err(err) = write_json(&mut self.backend, &self.config.trash_key, &self.trash) {
            warn!("event=persist module=store status=error slot=trash error={err}");
        }
    }

    fn ensure_ready(&self) -> StoreOpResult<()> {
        match self.load_state {
            LoadState::Ready => Ok(()),
            LoadState::Loading => Err(ContactStoreError::NotReady),
        }
    }

    fn next_id(&mut self) -> ContactId {
        let id = self
            .clock
            .now_ms()
            .max(self.last_issued_id.saturating_add(1));
        self.last_issued_id = id;
        id
    }

    fn max_known_id(&self) -> ContactId {
        self.active
            .iter()
            .map(|contact| contact.id)
            .chain(self.trash.iter().map(|entry| entry.contact.id))
            .chain(std::iter::once(self.last_issued_id))
            .max()
            .unwrap_or(0)
    }

    fn active_index(&self, id: ContactId) -> Option<usize> {
        self.active.iter().position(|contact| contact.id == id)
    }

    fn trash_index(&self, entry_id: TrashEntryId) -> Option<usize> {
        self.trash.iter().position(|entry| entry.entry_id == entry_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContactStore, ContactStoreError, ManualClock};
    use crate::config::StoreConfig;
    use crate::model::contact::ContactDraft;
    use crate::repo::kv_repo::{KeyValueStore, MemoryKeyValueStore};
    use crate::seed::SampleSeed;

    #[test]
    fn ids_stay_strictly_increasing_within_one_millisecond() {
        let clock = ManualClock::new(1_000);
        let mut store = ContactStore::open(
            MemoryKeyValueStore::new(),
            clock,
            StoreConfig::default(),
            &SampleSeed::instant(),
        );

        let first = store.create(ContactDraft::new("A", "123456")).unwrap();
        let second = store.create(ContactDraft::new("B", "123456")).unwrap();
        assert_eq!(first.id, 1_000);
        assert_eq!(second.id, 1_001);
    }

    #[test]
    fn mutations_are_rejected_while_seed_is_pending() {
        let mut store = ContactStore::initialize(
            MemoryKeyValueStore::new(),
            ManualClock::new(0),
            StoreConfig::default(),
        );
        assert!(store.is_loading());

        let err = store.create(ContactDraft::new("A", "123456")).unwrap_err();
        assert_eq!(err, ContactStoreError::NotReady);
        assert!(store.active().is_empty());
    }

    #[test]
    fn every_active_mutation_is_gated_while_loading() {
        let mut backend = MemoryKeyValueStore::new();
        backend.insert_raw(
            "contacts_app_trash_v1",
            r#"[{"id":7,"name":"Kept","phone":"1234567","deletedAt":900}]"#,
        );
        let mut store =
            ContactStore::initialize(backend, ManualClock::new(1_000), StoreConfig::default());
        assert!(store.is_loading());
        let entry_id = store.trash()[0].entry_id;

        let mut ghost = store.trash()[0].contact.clone();
        ghost.name = "Ghost".to_string();
        assert_eq!(store.update(ghost).unwrap_err(), ContactStoreError::NotReady);
        assert_eq!(store.soft_delete(7).unwrap_err(), ContactStoreError::NotReady);
        assert_eq!(
            store.restore(entry_id).unwrap_err(),
            ContactStoreError::NotReady
        );
        assert_eq!(store.trash_count(), 1);

        let purged = store.purge(entry_id).unwrap();
        assert_eq!(purged.contact.id, 7);
        assert_eq!(store.trash_count(), 0);
        assert_eq!(
            store.backend().get("contacts_app_trash_v1").unwrap().as_deref(),
            Some("[]")
        );
        assert!(store.is_loading());
    }

    #[test]
    fn scheduled_search_runs_after_configured_delay_with_last_input() {
        let clock = ManualClock::new(10_000);
        let config = StoreConfig {
            search_debounce_ms: 100,
            ..StoreConfig::default()
        };
        let mut store = ContactStore::open(
            MemoryKeyValueStore::new(),
            clock.clone(),
            config,
            &SampleSeed::instant(),
        );

        assert_eq!(store.schedule_search("r", "All"), 10_100);
        clock.advance(50);
        assert_eq!(store.schedule_search("ravi", "All"), 10_150);

        clock.advance(60);
        assert!(store.poll_search().is_none());

        clock.advance(40);
        let hits = store
            .poll_search()
            .unwrap()
            .into_iter()
            .map(|contact| contact.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(hits, vec!["Ravi Patel".to_string()]);
        assert!(store.poll_search().is_none());
    }

    #[test]
    fn complete_seed_is_ignored_once_ready() {
        let mut store = ContactStore::open(
            MemoryKeyValueStore::new(),
            ManualClock::new(0),
            StoreConfig::default(),
            &SampleSeed::instant(),
        );
        assert!(!store.complete_seed(Ok(Vec::new())));
        assert_eq!(store.active().len(), 3);
    }
}
