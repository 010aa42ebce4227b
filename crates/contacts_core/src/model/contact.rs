//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record and its recycle-bin projection.
//! - Own draft normalization and field validation rules.
//! - Provide lifecycle transitions between active and trashed phases.
//!
//! # Invariants
//! - `Contact` never carries a deletion timestamp.
//! - `TrashEntry` always carries `deleted_at`.
//! - `TrashEntry::entry_id` identifies one trash membership and is never
//!   persisted; it is regenerated every time trash is decoded.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static PHONE_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{6,15}$").expect("valid phone regex"));

/// Calling code used when a draft does not pick one.
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

/// Identifier for active and trashed contacts.
///
/// Unique within one collection only; restore assigns a fresh value.
pub type ContactId = i64;

/// Identity of a single trash membership.
pub type TrashEntryId = Uuid;

/// Lifecycle phase of a stored contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Visible and editable in the main list.
    Active,
    /// Resides in the recycle bin since `deleted_at` (epoch milliseconds).
    Trashed { deleted_at: i64 },
}

/// Field-level validation failures for contact writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// Name is empty after trimming.
    EmptyName,
    /// Email is present but not shaped like `local@domain.tld`.
    InvalidEmail(String),
    /// Phone does not contain 6 to 15 digits.
    InvalidPhone(String),
}

impl ContactValidationError {
    /// Returns the wire name of the field at fault.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyName => "name",
            Self::InvalidEmail(_) => "email",
            Self::InvalidPhone(_) => "phone",
        }
    }
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name is required"),
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
            Self::InvalidPhone(value) => {
                write!(f, "phone should be 6-15 digits, got `{value}`")
            }
        }
    }
}

impl Error for ContactValidationError {}

/// Canonical contact record.
///
/// Serialized with the wire keys `id, name, email, country, phone, role,
/// photo`. Optional fields decode as empty strings when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: String,
    /// Opaque image handle supplied by the host file picker.
    #[serde(default)]
    pub photo: String,
}

/// Unsaved contact input coming from the host form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    pub email: String,
    pub country: String,
    pub phone: String,
    pub role: String,
    pub photo: String,
}

impl Default for ContactDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            country: DEFAULT_COUNTRY_CODE.to_string(),
            phone: String::new(),
            role: String::new(),
            photo: String::new(),
        }
    }
}

impl ContactDraft {
    /// Creates a draft with the two required fields set.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = photo.into();
        self
    }

    /// Trims text fields and strips non-digits from `phone`.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            country: self.country,
            phone: normalize_phone(&self.phone),
            role: self.role,
            photo: self.photo,
        }
    }

    /// Validates normalized draft fields in form order: name, email, phone.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        validate_fields(&self.name, &self.email, &self.phone)
    }

    /// Materializes the draft as an active contact with the given id.
    pub fn into_contact(self, id: ContactId) -> Contact {
        Contact {
            id,
            name: self.name,
            email: self.email,
            country: self.country,
            phone: self.phone,
            role: self.role,
            photo: self.photo,
        }
    }
}

impl Contact {
    /// Applies the same normalization as [`ContactDraft::normalized`].
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: normalize_phone(&self.phone),
            ..self
        }
    }

    /// Validates user-editable fields.
    ///
    /// Records loaded from storage or the seed source are not re-validated.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        validate_fields(&self.name, &self.email, &self.phone)
    }

    /// Moves this contact into the trash phase.
    pub fn into_trash(self, deleted_at: i64) -> TrashEntry {
        TrashEntry {
            entry_id: Uuid::new_v4(),
            contact: self,
            deleted_at,
        }
    }
}

/// A soft-deleted contact held in the recycle bin.
///
/// Serializes as the contact fields plus `deletedAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrashEntry {
    #[serde(skip)]
    pub entry_id: TrashEntryId,
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(rename = "deletedAt")]
    pub deleted_at: i64,
}

impl TrashEntry {
    /// Decodes a persisted trash record.
    ///
    /// Records missing `deletedAt` are stamped with `now_ms` so the trash
    /// invariant holds and the retention window starts from this load.
    pub fn from_record(record: TrashRecord, now_ms: i64) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            contact: record.contact,
            deleted_at: record.deleted_at.unwrap_or(now_ms),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle::Trashed {
            deleted_at: self.deleted_at,
        }
    }

    /// Returns whether this entry has outlived the retention window.
    pub fn is_expired(&self, now_ms: i64, retention_ms: i64) -> bool {
        now_ms.saturating_sub(self.deleted_at) >= retention_ms
    }

    /// Leaves the trash phase under a new contact id.
    pub fn restore(self, new_id: ContactId) -> Contact {
        Contact {
            id: new_id,
            ..self.contact
        }
    }
}

/// Wire shape for trash decoding, tolerant of a missing `deletedAt`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrashRecord {
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(rename = "deletedAt", default)]
    pub deleted_at: Option<i64>,
}

/// Strips every non-ASCII-digit character from phone input.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|ch| ch.is_ascii_digit()).collect()
}

fn validate_fields(name: &str, email: &str, phone: &str) -> Result<(), ContactValidationError> {
    if name.trim().is_empty() {
        return Err(ContactValidationError::EmptyName);
    }
    if !email.is_empty() && !EMAIL_RE.is_match(email) {
        return Err(ContactValidationError::InvalidEmail(email.to_string()));
    }
    if !PHONE_DIGITS_RE.is_match(phone) {
        return Err(ContactValidationError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}
