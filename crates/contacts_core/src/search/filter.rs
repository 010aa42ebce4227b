//! Name and team filtering over the active collection.
//!
//! # Responsibility
//! - Provide a pure, allocation-light filter preserving collection order.
//!
//! # Invariants
//! - Never reorders results.
//! - Blank query text matches every name.
//! - Team `All` matches every role, including empty roles.

use crate::model::contact::Contact;

/// Sentinel team label that disables role filtering.
pub const ALL_TEAMS: &str = "All";

/// Team labels offered by the default sidebar, sentinel first.
pub const DEFAULT_TEAMS: [&str; 5] = [ALL_TEAMS, "Product", "Engineering", "Design", "Marketing"];

/// Role constraint for a contact query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TeamFilter {
    #[default]
    All,
    /// Case-insensitive exact role match.
    Role(String),
}

impl TeamFilter {
    /// Parses a host label; the exact label `All` is the sentinel.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label == ALL_TEAMS {
            Self::All
        } else {
            Self::Role(label.to_lowercase())
        }
    }

    pub fn matches(&self, role: &str) -> bool {
        match self {
            Self::All => true,
            Self::Role(expected) => role.to_lowercase() == expected.to_lowercase(),
        }
    }
}

/// Filter options for [`search_contacts`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactQuery {
    /// Raw query text; trimmed and lowercased before matching.
    pub text: String,
    pub team: TeamFilter,
}

impl ContactQuery {
    pub fn new(text: impl Into<String>, team_label: &str) -> Self {
        Self {
            text: text.into(),
            team: TeamFilter::parse(team_label),
        }
    }
}

/// Returns contacts whose name contains the query and whose role matches.
pub fn search_contacts<'a>(contacts: &'a [Contact], query: &ContactQuery) -> Vec<&'a Contact> {
    let needle = query.text.trim().to_lowercase();
    contacts
        .iter()
        .filter(|contact| needle.is_empty() || contact.name.to_lowercase().contains(&needle))
        .filter(|contact| query.team.matches(&contact.role))
        .collect()
}
