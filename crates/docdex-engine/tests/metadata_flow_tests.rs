//! Metadata resolution flowing into indexing
//!
//! Values pass through the resolver (validators, restricted choice sets,
//! defaults) before they are stored on documents and evaluated by index
//! templates.

use docdex_core::model::{
    DocumentContext, DocumentRecord, DocumentTypeBinding, MetadataType, TemplateNode,
    TemplateTree,
};
use docdex_core::ops::{DocumentStore, MetadataRegistry};
use docdex_engine::IndexRegistry;

fn metadata_registry() -> MetadataRegistry {
    let mut metadata = MetadataRegistry::new();
    metadata.register_type(MetadataType::new("language").with_lookup("models.languages"));
    metadata.register_type(MetadataType::new("date").with_lookup("iso_date"));
    metadata.register_type(MetadataType::new("origin").with_default("\"scanner\""));
    metadata
        .bind(DocumentTypeBinding::new("invoice", "language", true))
        .unwrap();
    metadata
        .bind(DocumentTypeBinding::new("invoice", "origin", false))
        .unwrap();
    metadata
}

#[test]
fn test_choice_constrained_value_feeds_the_index() {
    let metadata = metadata_registry();
    let registry = IndexRegistry::new();
    registry.set_template(
        "by-language",
        TemplateTree::with_roots(vec![TemplateNode::new("metadata.language")]),
    );

    // A value from the restricted set is accepted and indexed
    let language = metadata
        .resolve_value("language", Some("eng"))
        .unwrap()
        .unwrap();
    let record = DocumentRecord::new("d1", "invoice", "Invoice 42")
        .with_metadata("language", language);
    let mut store = DocumentStore::new();
    store.insert(record);

    registry
        .reindex_one(&store.context("d1").unwrap(), "by-language")
        .unwrap();
    registry
        .with_state("by-language", |state| {
            assert_eq!(state.node_count(), 2);
            let leaf = state.nodes_for_document("d1");
            assert_eq!(
                state.path_values(leaf.iter().next().unwrap()).unwrap(),
                vec!["eng"]
            );
            Ok(())
        })
        .unwrap();

    // A value outside the set never reaches the index
    let err = metadata
        .resolve_value("language", Some("klingon"))
        .unwrap_err();
    assert_eq!(err.code(), "ERR_INVALID_CHOICE");
}

#[test]
fn test_validator_lookup_normalizes_before_indexing() {
    let metadata = metadata_registry();

    // "iso_date" is a validator, not a choice set: input is transformed
    let value = metadata
        .resolve_value("date", Some("01/02/2020"))
        .unwrap()
        .unwrap();
    assert_eq!(value, "2020-02-01");
}

#[test]
fn test_document_type_defaults_resolve() {
    let metadata = metadata_registry();

    // "language" is required but has no default: defaults resolution fails
    let err = metadata.resolve_defaults("invoice").unwrap_err();
    assert_eq!(err.code(), "ERR_REQUIRED_VALUE_MISSING");

    // Unbound document types have no defaults
    assert!(metadata.resolve_defaults("memo").unwrap().is_empty());
}

#[test]
fn test_defaulted_metadata_indexes_like_any_other() {
    let metadata = metadata_registry();
    let registry = IndexRegistry::new();
    registry.set_template(
        "by-origin",
        TemplateTree::with_roots(vec![TemplateNode::new("metadata.origin")]),
    );

    let origin = metadata.resolve_value("origin", None).unwrap().unwrap();
    assert_eq!(origin, "scanner");

    let ctx = DocumentContext::new("d1").with_metadata("origin", origin);
    registry.reindex_one(&ctx, "by-origin").unwrap();

    registry
        .with_state("by-origin", |state| {
            let leaf = state.nodes_for_document("d1");
            assert_eq!(
                state.path_values(leaf.iter().next().unwrap()).unwrap(),
                vec!["scanner"]
            );
            Ok(())
        })
        .unwrap();
}
