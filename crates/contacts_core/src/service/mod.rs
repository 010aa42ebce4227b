//! Core use-case services.
//!
//! # Responsibility
//! - Own the contact lifecycle state and its transitions.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod contact_store;
