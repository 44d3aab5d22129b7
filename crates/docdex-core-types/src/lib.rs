//! Core types shared across docdex facilities
//!
//! This crate provides foundational types used by the indexing kernel,
//! the engine layer, and the logging facility:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
