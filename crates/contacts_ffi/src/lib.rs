//! Flutter bridge crate for the contacts core.
//!
//! Only `api` is scanned by flutter_rust_bridge codegen.

pub mod api;
