//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the durable slot contract the contact store persists through.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories store opaque serialized values; lifecycle rules live in
//!   `service`.

pub mod kv_repo;
