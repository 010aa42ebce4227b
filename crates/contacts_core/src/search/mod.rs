//! Contact list filtering and input debouncing.
//!
//! # Responsibility
//! - Provide the pure name/team filter over the active collection.
//! - Model type-as-you-search delay as a host-polled state machine.

pub mod debounce;
pub mod filter;
