//! Snapshot manifests for instance trees
//!
//! A manifest is the canonical, order-stable representation of an index's
//! instance tree: child nodes in creation order, document IDs sorted. The
//! tree digest hashes the shape alone; the manifest digest also covers the
//! generation timestamp. Persistence collaborators store manifests;
//! the tree digest is what tests and the audit trail compare.
//!
//! ## Non-Responsibilities
//!
//! - Persistence (external collaborator)
//! - Orchestration (handled by `docdex-engine`)

pub mod digest;
pub mod manifest;

pub use digest::{compute_manifest_digest, compute_tree_digest};
pub use manifest::{generate_manifest, IndexManifest, ManifestNode};
