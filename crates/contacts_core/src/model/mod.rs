//! Domain model for the contact lifecycle.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Model active and trashed phases as distinct types.
//!
//! # Invariants
//! - Deletion is a soft move into the recycle bin; permanent removal only
//!   happens through purge, empty or retention expiry.

pub mod contact;
