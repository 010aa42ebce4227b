//! Fallback contact data used when nothing is persisted yet.
//!
//! # Responsibility
//! - Define the seed provider contract consumed during store bootstrap.
//! - Ship the built-in sample list with simulated fetch latency.
//!
//! # Invariants
//! - A seed is fetched at most once per store initialization.
//! - Seed records are trusted and bypass form validation.

use crate::model::contact::Contact;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Failure reported by a seed provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    Unavailable(String),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "seed source unavailable: {message}"),
        }
    }
}

impl Error for SeedError {}

/// Provider of the initial ordered contact list.
///
/// Implementations may block (network, disk, artificial latency); hosts that
/// need a responsive UI call it off the UI thread and hand the result to
/// [`crate::ContactStore::complete_seed`].
pub trait SeedSource {
    fn fetch(&self) -> Result<Vec<Contact>, SeedError>;
}

/// Built-in three-person sample list.
#[derive(Debug, Clone)]
pub struct SampleSeed {
    latency: Duration,
}

impl SampleSeed {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Sample list without any simulated delay.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Default for SampleSeed {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_SEED_LATENCY_MS))
    }
}

impl SeedSource for SampleSeed {
    fn fetch(&self) -> Result<Vec<Contact>, SeedError> {
        let started_at = Instant::now();
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        let contacts = sample_contacts();
        info!(
            "event=seed_fetch module=seed status=ok count={} duration_ms={}",
            contacts.len(),
            started_at.elapsed().as_millis()
        );
        Ok(contacts)
    }
}

/// Returns the sample contacts in display order.
pub fn sample_contacts() -> Vec<Contact> {
    vec![
        sample(1, "Aisha Khan", "aisha.khan@example.com", "+91", "9876543210", "Product"),
        sample(2, "Ravi Patel", "ravi.patel@example.com", "+91", "9123456789", "Engineering"),
        sample(3, "Emily Johnson", "emily.johnson@example.com", "+1", "5551234567", "Design"),
    ]
}

fn sample(id: i64, name: &str, email: &str, country: &str, phone: &str, role: &str) -> Contact {
    Contact {
        id,
        name: name.to_string(),
        email: email.to_string(),
        country: country.to_string(),
        phone: phone.to_string(),
        role: role.to_string(),
        photo: String::new(),
    }
}
