//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the contact store lifecycle to Dart via FRB.
//! - Hold one process-wide store per session behind a mutex.
//! - Translate core errors into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Only one mutation runs at a time; the store mutex serializes calls.
//! - Confirmation for destructive operations is collected by the UI and
//!   passed in as `confirmed`.
//! - The seed fetch never runs under the store mutex; sync calls made while
//!   it is in flight see a `loading` snapshot.

use contacts_core::db::open_db;
use contacts_core::{
    core_version as core_version_inner, default_log_level, init_logging as init_logging_inner,
    ping as ping_inner, Contact, ContactDraft, ContactStore, ContactStoreError, SampleSeed,
    SeedSource, SqliteKeyValueStore, StoreConfig, SystemClock, TrashEntry, TrashEntryId,
    DEFAULT_TEAMS,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Duration;
use uuid::Uuid;

const CONTACTS_DB_FILE_NAME: &str = "contacts_app.sqlite3";
const CONTACTS_DB_PATH_ENV: &str = "CONTACTS_DB_PATH";

type SessionStore = ContactStore<SqliteKeyValueStore, SystemClock>;

static CONTACTS_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSION_STORE: Mutex<Option<SessionStore>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Log level the host should pass to [`contacts_init_logging`] by default.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_default_log_level() -> String {
    default_log_level().to_owned()
}

/// Pins the SQLite file used for the session store.
///
/// Must be called before the first store access. Repeating the same path is
/// accepted; switching paths afterwards returns an error message.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = CONTACTS_DB_PATH.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "contacts db already configured at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

/// Contact row shaped for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactItem {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub country: String,
    pub phone: String,
    pub role: String,
    pub photo: String,
}

/// Recycle-bin row shaped for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashItem {
    /// Trash membership identity; pass back to restore/purge.
    pub entry_id: String,
    pub contact: ContactItem,
    /// Epoch milliseconds.
    pub deleted_at: i64,
}

/// Full view of both collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsSnapshot {
    pub ok: bool,
    pub loading: bool,
    pub contacts: Vec<ContactItem>,
    pub trash: Vec<TrashItem>,
    pub message: String,
}

/// Result envelope for single-record mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactActionResponse {
    pub ok: bool,
    /// Id of the created, updated or restored contact.
    pub contact_id: Option<i64>,
    /// Field at fault for validation failures (`name|email|phone`).
    pub field: Option<String>,
    pub message: String,
}

impl ContactActionResponse {
    fn success(message: impl Into<String>, contact_id: Option<i64>) -> Self {
        Self {
            ok: true,
            contact_id,
            field: None,
            message: message.into(),
        }
    }

    fn failure(operation: &str, err: &ContactStoreError) -> Self {
        let field = match err {
            ContactStoreError::Validation(inner) => Some(inner.field().to_string()),
            _ => None,
        };
        Self {
            ok: false,
            contact_id: None,
            field,
            message: format!("{operation} failed: {err}"),
        }
    }

    fn unavailable(operation: &str, message: String) -> Self {
        Self {
            ok: false,
            contact_id: None,
            field: None,
            message: format!("{operation} failed: {message}"),
        }
    }
}

/// Search response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsSearchResponse {
    pub items: Vec<ContactItem>,
    /// Size of the unfiltered active collection.
    pub total: u32,
    pub message: String,
}

/// Opens the session store, resolving the sample seed when nothing is
/// persisted yet.
///
/// # FFI contract
/// - Async on the Dart side: seed resolution may take a few hundred ms.
/// - Sync calls made meanwhile return `loading = true` without waiting.
/// - Idempotent; later calls return the current snapshot.
pub fn contacts_bootstrap() -> ContactsSnapshot {
    bootstrap_session(&SESSION_STORE, "contacts_bootstrap")
}

/// Returns both collections without mutating anything.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_list() -> ContactsSnapshot {
    snapshot_or_error("contacts_list")
}

/// Creates a contact from form input.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_create(
    name: String,
    email: String,
    country: String,
    phone: String,
    role: String,
    photo: String,
) -> ContactActionResponse {
    let draft = ContactDraft::new(name, phone)
        .with_email(email)
        .with_country(country)
        .with_role(role)
        .with_photo(photo);
    run_action("contacts_create", |store| {
        store
            .create(draft)
            .map(|contact| ContactActionResponse::success("Contact created.", Some(contact.id)))
    })
}

/// Replaces an existing active contact, keeping its id and position.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_update(contact: ContactItem) -> ContactActionResponse {
    run_action("contacts_update", |store| {
        store
            .update(from_contact_item(contact))
            .map(|contact| ContactActionResponse::success("Contact updated.", Some(contact.id)))
    })
}

/// Moves an active contact into the recycle bin.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_soft_delete(id: i64) -> ContactActionResponse {
    run_action("contacts_soft_delete", |store| {
        store
            .soft_delete(id)
            .map(|_| ContactActionResponse::success("Moved to Recycle Bin.", None))
    })
}

/// Restores one recycle-bin entry under a fresh id.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_restore(entry_id: String) -> ContactActionResponse {
    let Some(entry_id) = parse_entry_id(&entry_id) else {
        return ContactActionResponse::unavailable(
            "contacts_restore",
            format!("invalid entry id `{entry_id}`"),
        );
    };
    run_action("contacts_restore", |store| {
        store
            .restore(entry_id)
            .map(|contact| ContactActionResponse::success("Contact restored.", Some(contact.id)))
    })
}

/// Permanently deletes one recycle-bin entry when `confirmed`.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_purge(entry_id: String, confirmed: bool) -> ContactActionResponse {
    let Some(entry_id) = parse_entry_id(&entry_id) else {
        return ContactActionResponse::unavailable(
            "contacts_purge",
            format!("invalid entry id `{entry_id}`"),
        );
    };
    run_action("contacts_purge", |store| {
        store
            .purge_confirmed(entry_id, &|_: &str| confirmed)
            .map(|purged| match purged {
                Some(_) => ContactActionResponse::success("Deleted permanently.", None),
                None => ContactActionResponse::success("Cancelled.", None),
            })
    })
}

/// Empties the recycle bin when `confirmed`.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_empty_trash(confirmed: bool) -> ContactActionResponse {
    run_action("contacts_empty_trash", |store| {
        if store.empty_trash(&|_: &str| confirmed) {
            Ok(ContactActionResponse::success("Recycle Bin emptied.", None))
        } else {
            Ok(ContactActionResponse::success("Cancelled.", None))
        }
    })
}

/// Clears all persisted contact data and reinitializes from the seed.
///
/// # FFI contract
/// - Async on the Dart side; equivalent to a fresh install.
pub fn contacts_reset() -> ContactsSnapshot {
    {
        let mut guard = lock_session();
        if let Some(store) = guard.take() {
            drop(store.reset());
        } else if let Err(err) = open_session_store().map(|store| drop(store.reset())) {
            return error_snapshot("contacts_reset", err);
        }
    }
    bootstrap_session(&SESSION_STORE, "contacts_reset")
}

/// Team labels for the sidebar, `All` first.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_team_options() -> Vec<String> {
    DEFAULT_TEAMS.iter().map(|team| (*team).to_owned()).collect()
}

/// Filters active contacts by name substring and team label (`All` for
/// every team).
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_search(query: String, team: String) -> ContactsSearchResponse {
    let result = with_session_store(|store| {
        let total = store.active().len();
        search_response(store.search(query.as_str(), team.as_str()), total)
    });
    result.unwrap_or_else(|err| search_failure("contacts_search", err))
}

/// Records a keystroke for debounced search and returns the epoch-ms
/// deadline at which the host should call [`contacts_search_poll`].
///
/// A newer keystroke replaces the pending one.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_search_schedule(query: String, team: String) -> i64 {
    with_session_store(|store| store.schedule_search(query.as_str(), team.as_str()))
        .unwrap_or_else(|err| {
            warn!("event=search_schedule module=ffi status=error error={err}");
            0
        })
}

/// Runs the pending debounced search once its delay has elapsed.
///
/// Returns `None` while the delay is still running or nothing is pending.
#[flutter_rust_bridge::frb(sync)]
pub fn contacts_search_poll() -> Option<ContactsSearchResponse> {
    let result = with_session_store(|store| {
        let total = store.active().len();
        store
            .poll_search()
            .map(|hits| search_response(hits, total))
    });
    result.unwrap_or_else(|err| Some(search_failure("contacts_search_poll", err)))
}

fn search_response(hits: Vec<&Contact>, total: usize) -> ContactsSearchResponse {
    let items = hits.into_iter().map(to_contact_item).collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No contacts found.".to_string()
    } else {
        format!("Showing {} of {total}.", items.len())
    };
    ContactsSearchResponse {
        items,
        total: u32::try_from(total).unwrap_or(u32::MAX),
        message,
    }
}

fn search_failure(operation: &str, err: String) -> ContactsSearchResponse {
    ContactsSearchResponse {
        items: Vec::new(),
        total: 0,
        message: format!("{operation} failed: {err}"),
    }
}

fn resolve_db_path() -> PathBuf {
    CONTACTS_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(CONTACTS_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(CONTACTS_DB_FILE_NAME)
        })
        .clone()
}

/// Opens the store without seeding; it stays loading until
/// [`bootstrap_session`] resolves the seed.
fn open_session_store() -> Result<SessionStore, String> {
    let db_path = resolve_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("contacts DB open failed: {err}"))?;
    Ok(ContactStore::initialize(
        SqliteKeyValueStore::new(conn),
        SystemClock,
        StoreConfig::from_env(),
    ))
}

/// Resolves the seed for a loading store with the mutex released during the
/// fetch. Concurrent bootstraps may both fetch; the first to finish wins.
fn bootstrap_session(session: &Mutex<Option<SessionStore>>, operation: &str) -> ContactsSnapshot {
    let latency_ms = {
        let mut guard = lock(session);
        let pending = match store_in(&mut guard) {
            Ok(store) => store
                .is_loading()
                .then(|| store.config().seed_latency_ms),
            Err(err) => return error_snapshot(operation, err),
        };
        let Some(latency_ms) = pending else {
            return snapshot_in(&mut guard, operation);
        };
        latency_ms
    };

    let seeded = SampleSeed::new(Duration::from_millis(latency_ms)).fetch();

    let mut guard = lock(session);
    if let Some(store) = guard.as_mut() {
        if store.is_loading() {
            store.complete_seed(seeded);
        }
    }
    snapshot_in(&mut guard, operation)
}

fn lock_session() -> MutexGuard<'static, Option<SessionStore>> {
    lock(&SESSION_STORE)
}

fn lock(session: &Mutex<Option<SessionStore>>) -> MutexGuard<'_, Option<SessionStore>> {
    session.lock().unwrap_or_else(|poisoned| {
        warn!("event=session_lock module=ffi status=recovered reason=poisoned");
        poisoned.into_inner()
    })
}

fn store_in<'a>(
    guard: &'a mut MutexGuard<'_, Option<SessionStore>>,
) -> Result<&'a mut SessionStore, String> {
    if guard.is_none() {
        **guard = Some(open_session_store()?);
    }
    guard
        .as_mut()
        .ok_or_else(|| "contacts store unavailable".to_string())
}

fn with_session_store<T>(f: impl FnOnce(&mut SessionStore) -> T) -> Result<T, String> {
    let mut guard = lock_session();
    let store = store_in(&mut guard)?;
    Ok(f(store))
}

fn run_action(
    operation: &str,
    f: impl FnOnce(&mut SessionStore) -> Result<ContactActionResponse, ContactStoreError>,
) -> ContactActionResponse {
    match with_session_store(f) {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => ContactActionResponse::failure(operation, &err),
        Err(err) => ContactActionResponse::unavailable(operation, err),
    }
}

fn snapshot_or_error(operation: &str) -> ContactsSnapshot {
    let mut guard = lock_session();
    snapshot_in(&mut guard, operation)
}

fn snapshot_in(
    guard: &mut MutexGuard<'_, Option<SessionStore>>,
    operation: &str,
) -> ContactsSnapshot {
    match store_in(guard) {
        Ok(store) => ContactsSnapshot {
            ok: true,
            loading: store.is_loading(),
            contacts: store.active().iter().map(to_contact_item).collect(),
            trash: store.trash().iter().map(to_trash_item).collect(),
            message: String::new(),
        },
        Err(err) => error_snapshot(operation, err),
    }
}

fn error_snapshot(operation: &str, err: String) -> ContactsSnapshot {
    ContactsSnapshot {
        ok: false,
        loading: false,
        contacts: Vec::new(),
        trash: Vec::new(),
        message: format!("{operation} failed: {err}"),
    }
}

fn parse_entry_id(raw: &str) -> Option<TrashEntryId> {
    Uuid::parse_str(raw.trim()).ok()
}

fn to_contact_item(contact: &Contact) -> ContactItem {
    ContactItem {
        id: contact.id,
        name: contact.name.clone(),
        email: contact.email.clone(),
        country: contact.country.clone(),
        phone: contact.phone.clone(),
        role: contact.role.clone(),
        photo: contact.photo.clone(),
    }
}

fn to_trash_item(entry: &TrashEntry) -> TrashItem {
    TrashItem {
        entry_id: entry.entry_id.to_string(),
        contact: to_contact_item(&entry.contact),
        deleted_at: entry.deleted_at,
    }
}

fn from_contact_item(item: ContactItem) -> Contact {
    Contact {
        id: item.id,
        name: item.name,
        email: item.email,
        country: item.country,
        phone: item.phone,
        role: item.role,
        photo: item.photo,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        bootstrap_session, contacts_bootstrap, contacts_create, contacts_default_log_level,
        contacts_empty_trash, contacts_init_logging, contacts_list, contacts_purge,
        contacts_restore, contacts_search, contacts_search_poll, contacts_search_schedule,
        contacts_soft_delete, contacts_team_options, contacts_update, core_version, lock, ping,
        snapshot_in,
    };
    use contacts_core::db::open_db_in_memory;
    use contacts_core::{ContactStore, SqliteKeyValueStore, StoreConfig, SystemClock};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!contacts_init_logging("info".to_string(), String::new()).is_empty());
        assert!(!contacts_init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn default_log_level_and_team_options_are_exposed() {
        assert!(["debug", "info"].contains(&contacts_default_log_level().as_str()));
        let teams = contacts_team_options();
        assert_eq!(teams.first().map(String::as_str), Some("All"));
        assert!(teams.iter().any(|team| team == "Engineering"));
    }

    #[test]
    fn sync_snapshot_reports_loading_while_seed_is_in_flight() {
        let config = StoreConfig {
            seed_latency_ms: 400,
            ..StoreConfig::default()
        };
        let store = ContactStore::initialize(
            SqliteKeyValueStore::new(open_db_in_memory().unwrap()),
            SystemClock,
            config,
        );
        let session = Mutex::new(Some(store));

        thread::scope(|scope| {
            let bootstrap = scope.spawn(|| bootstrap_session(&session, "contacts_bootstrap"));
            thread::sleep(Duration::from_millis(50));

            let started = Instant::now();
            let during = snapshot_in(&mut lock(&session), "contacts_list");
            assert!(started.elapsed() < Duration::from_millis(200));
            assert!(during.ok, "{}", during.message);
            assert!(during.loading);
            assert!(during.contacts.is_empty());

            let done = bootstrap.join().unwrap();
            assert!(done.ok, "{}", done.message);
            assert!(!done.loading);
            assert_eq!(done.contacts.len(), 3);
        });

        let after = snapshot_in(&mut lock(&session), "contacts_list");
        assert!(!after.loading);
        assert_eq!(after.contacts[1].name, "Ravi Patel");
    }

    #[test]
    fn bootstrap_returns_ready_snapshot() {
        let snapshot = contacts_bootstrap();
        assert!(snapshot.ok, "{}", snapshot.message);
        assert!(!snapshot.loading);
    }

    #[test]
    fn create_validation_failure_reports_field() {
        ready_session();
        let response = contacts_create(
            "Bad Phone".to_string(),
            String::new(),
            "+91".to_string(),
            "12a34".to_string(),
            String::new(),
            String::new(),
        );
        assert!(!response.ok);
        assert_eq!(response.field.as_deref(), Some("phone"));
    }

    #[test]
    fn create_search_update_delete_restore_purge_flow() {
        ready_session();
        let token = unique_token("ffi-flow");
        let created = contacts_create(
            token.clone(),
            "flow@example.com".to_string(),
            "+1".to_string(),
            "555-000-1234".to_string(),
            "Engineering".to_string(),
            String::new(),
        );
        assert!(created.ok, "{}", created.message);
        let id = created.contact_id.expect("create should return id");

        let found = contacts_search(token.to_uppercase(), "engineering".to_string());
        let item = found
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .expect("created contact should be searchable");
        assert_eq!(item.phone, "5550001234");

        let mut edited = item.clone();
        edited.role = "Design".to_string();
        let updated = contacts_update(edited);
        assert!(updated.ok, "{}", updated.message);
        assert_eq!(updated.contact_id, Some(id));

        assert!(contacts_soft_delete(id).ok);
        let entry = contacts_list()
            .trash
            .into_iter()
            .find(|entry| entry.contact.name == token)
            .expect("deleted contact should be in trash");
        assert_eq!(entry.contact.role, "Design");

        let restored = contacts_restore(entry.entry_id.clone());
        assert!(restored.ok, "{}", restored.message);
        let restored_id = restored.contact_id.expect("restore should return id");
        assert_ne!(restored_id, id);

        assert!(contacts_soft_delete(restored_id).ok);
        let entry = contacts_list()
            .trash
            .into_iter()
            .find(|entry| entry.contact.name == token)
            .expect("deleted contact should be in trash again");

        let cancelled = contacts_purge(entry.entry_id.clone(), false);
        assert!(cancelled.ok);
        assert!(contacts_list()
            .trash
            .iter()
            .any(|item| item.entry_id == entry.entry_id));

        let purged = contacts_purge(entry.entry_id.clone(), true);
        assert!(purged.ok, "{}", purged.message);
        assert!(!contacts_list()
            .trash
            .iter()
            .any(|item| item.entry_id == entry.entry_id));
    }

    #[test]
    fn restore_rejects_malformed_entry_id() {
        let response = contacts_restore("not-a-uuid".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid entry id"));
    }

    #[test]
    fn empty_trash_without_confirmation_is_cancelled() {
        let response = contacts_empty_trash(false);
        assert!(response.ok);
        assert_eq!(response.message, "Cancelled.");
    }

    #[test]
    fn debounced_search_applies_only_the_last_keystroke() {
        ready_session();
        let token = unique_token("ffi-debounce");
        assert!(
            contacts_create(
                token.clone(),
                String::new(),
                "+91".to_string(),
                "9000000001".to_string(),
                "Product".to_string(),
                String::new(),
            )
            .ok
        );

        contacts_search_schedule("zzz-no-such-name".to_string(), "All".to_string());
        let due_at = contacts_search_schedule(token.clone(), "All".to_string());
        assert!(due_at > 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        let response = loop {
            if let Some(response) = contacts_search_poll() {
                break response;
            }
            assert!(Instant::now() < deadline, "debounced search never fired");
            thread::sleep(Duration::from_millis(20));
        };
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].name, token);
    }

    fn ready_session() {
        let snapshot = contacts_bootstrap();
        assert!(snapshot.ok, "{}", snapshot.message);
        assert!(!snapshot.loading);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
