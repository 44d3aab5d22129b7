//! Canonical logging facility
//!
//! Single initialization point for `tracing` plus structured operation
//! macros. All kernel and engine logging goes through the canonical field
//! keys in `docdex_core_types::schema`.

pub mod init;
pub mod macros;

pub use init::{init, Profile};
