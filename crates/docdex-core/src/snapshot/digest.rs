//! Digest computation for snapshot manifests
//!
//! Deterministic SHA256 digests over canonical JSON serialization:
//!
//! - **Tree digest**: hash of the shape alone (values, structure,
//!   attachments). Stable across timestamps; two idempotent passes
//!   produce the same tree digest.
//! - **Manifest digest**: hash of the full manifest including
//!   `generated_at`.

use sha2::{Digest, Sha256};

use crate::errors::Result;
use crate::snapshot::manifest::{IndexManifest, ManifestNode};

/// Compute the shape digest of a tree
///
/// # Errors
/// Returns `Serialization` if JSON serialization fails.
pub fn compute_tree_digest(root: &ManifestNode) -> Result<String> {
    let canonical = serde_json::to_string(root)?;
    Ok(hash_string(&canonical))
}

/// Compute the full manifest digest (includes `generated_at`)
///
/// # Errors
/// Returns `Serialization` if JSON serialization fails.
pub fn compute_manifest_digest(manifest: &IndexManifest) -> Result<String> {
    let canonical = serde_json::to_string(manifest)?;
    Ok(hash_string(&canonical))
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
