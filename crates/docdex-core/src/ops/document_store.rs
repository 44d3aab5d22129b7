use std::collections::HashMap;

use crate::errors::{IndexError, Result};
use crate::model::{DocumentContext, DocumentRecord};

/// In-memory store of document records
///
/// Holds the attributes the indexer evaluates against. Durable storage of
/// documents is an external collaborator's concern; this store backs the
/// CLI and tests, and is the source for [`DocumentContext`] construction.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: HashMap<String, DocumentRecord>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document record
    pub fn insert(&mut self, record: DocumentRecord) {
        self.documents.insert(record.id.clone(), record);
    }

    /// Get a document by ID
    ///
    /// # Errors
    /// Returns `DocumentNotFound` if the document doesn't exist.
    pub fn get(&self, id: &str) -> Result<&DocumentRecord> {
        self.documents
            .get(id)
            .ok_or_else(|| IndexError::DocumentNotFound {
                document_id: id.to_string(),
            })
    }

    /// Remove a document by ID
    ///
    /// # Errors
    /// Returns `DocumentNotFound` if the document doesn't exist.
    pub fn remove(&mut self, id: &str) -> Result<DocumentRecord> {
        self.documents
            .remove(id)
            .ok_or_else(|| IndexError::DocumentNotFound {
                document_id: id.to_string(),
            })
    }

    /// Build the evaluation context for a document
    ///
    /// # Errors
    /// Returns `DocumentNotFound` if the document doesn't exist.
    pub fn context(&self, id: &str) -> Result<DocumentContext> {
        Ok(DocumentContext::from_record(self.get(id)?))
    }

    /// Evaluation contexts for every stored document, sorted by ID
    pub fn contexts(&self) -> Vec<DocumentContext> {
        let mut ids: Vec<&String> = self.documents.keys().collect();
        ids.sort();
        ids.iter()
            .filter_map(|id| self.documents.get(*id))
            .map(DocumentContext::from_record)
            .collect()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
