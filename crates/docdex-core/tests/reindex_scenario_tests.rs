//! End-to-end reconciliation scenarios against one index state

use docdex_core::model::{DocumentContext, TemplateNode, TemplateTree};
use docdex_core::ops::{reindex, remove_document, IndexState};
use docdex_core::rules::check_invariants;

fn year_category_template() -> TemplateTree {
    TemplateTree::with_roots(vec![
        TemplateNode::new("metadata.year").child(TemplateNode::new("metadata.category")),
    ])
}

fn doc(id: &str, year: &str, category: &str) -> DocumentContext {
    DocumentContext::new(id)
        .with_metadata("year", year)
        .with_metadata("category", category)
}

/// Two documents sharing a year: one "2020" node, two category leaves.
/// Removing the first prunes its leaf but leaves the shared year intact.
#[test]
fn test_shared_year_two_categories() {
    let mut state = IndexState::new();
    let template = year_category_template();

    reindex(&mut state, &template, &doc("D1", "2020", "invoice"), "idx").unwrap();
    reindex(&mut state, &template, &doc("D2", "2020", "receipt"), "idx").unwrap();
    check_invariants(&state, "idx").unwrap();

    // root + 2020 + invoice + receipt
    assert_eq!(state.node_count(), 4);

    let d1_leaf = state.nodes_for_document("D1");
    let d2_leaf = state.nodes_for_document("D2");
    assert_eq!(
        state.path_values(d1_leaf.iter().next().unwrap()).unwrap(),
        vec!["2020", "invoice"]
    );
    assert_eq!(
        state.path_values(d2_leaf.iter().next().unwrap()).unwrap(),
        vec!["2020", "receipt"]
    );

    let removed = remove_document(&mut state, "D1", "idx").unwrap();
    check_invariants(&state, "idx").unwrap();

    assert_eq!(removed.nodes_removed.len(), 1);
    assert_eq!(state.node_count(), 3);
    assert_eq!(state.nodes_for_document("D2").len(), 1);
}

/// Fan-out: a multi-valued field yields one sibling node per value, each
/// carrying the document independently through deeper levels.
#[test]
fn test_fan_out_descends_independently() {
    let mut state = IndexState::new();
    let template = TemplateTree::with_roots(vec![
        TemplateNode::new("metadata.tags").child(TemplateNode::new("metadata.year")),
    ]);

    let ctx = DocumentContext::new("D1")
        .with_metadata("tags", serde_json::json!(["A", "B"]))
        .with_metadata("year", "2020");
    reindex(&mut state, &template, &ctx, "idx").unwrap();
    check_invariants(&state, "idx").unwrap();

    // root + A + B + two "2020" leaves (one under each tag)
    assert_eq!(state.node_count(), 5);
    assert_eq!(state.nodes_for_document("D1").len(), 2);

    // Dropping one tag prunes that branch only
    let ctx = DocumentContext::new("D1")
        .with_metadata("tags", serde_json::json!(["A"]))
        .with_metadata("year", "2020");
    reindex(&mut state, &template, &ctx, "idx").unwrap();
    check_invariants(&state, "idx").unwrap();

    assert_eq!(state.node_count(), 3);
    assert_eq!(state.nodes_for_document("D1").len(), 1);
}

/// Repeated reconciliation of an unchanged population mutates nothing.
#[test]
fn test_steady_state_is_noop() {
    let mut state = IndexState::new();
    let template = year_category_template();
    let docs = [
        doc("D1", "2020", "invoice"),
        doc("D2", "2020", "receipt"),
        doc("D3", "2021", "invoice"),
    ];

    for ctx in &docs {
        reindex(&mut state, &template, ctx, "idx").unwrap();
    }
    for ctx in &docs {
        let result = reindex(&mut state, &template, ctx, "idx").unwrap();
        assert!(result.is_noop(), "expected no-op for {}", ctx.document_id);
    }
}

/// A template edit (out-of-band) followed by re-reconciliation moves
/// documents to the new shape and leaves no stale branches behind.
#[test]
fn test_template_edit_reshapes_tree() {
    let mut state = IndexState::new();
    let by_year = year_category_template();
    let by_category = TemplateTree::with_roots(vec![
        TemplateNode::new("metadata.category").child(TemplateNode::new("metadata.year")),
    ]);
    let docs = [doc("D1", "2020", "invoice"), doc("D2", "2021", "receipt")];

    for ctx in &docs {
        reindex(&mut state, &by_year, ctx, "idx").unwrap();
    }
    for ctx in &docs {
        reindex(&mut state, &by_category, ctx, "idx").unwrap();
    }
    check_invariants(&state, "idx").unwrap();

    // root + invoice/2020 + receipt/2021
    assert_eq!(state.node_count(), 5);
    let d1_leaf = state.nodes_for_document("D1");
    assert_eq!(
        state.path_values(d1_leaf.iter().next().unwrap()).unwrap(),
        vec!["invoice", "2020"]
    );
}
