use crate::errors::Result;
use crate::ops::IndexState;

/// Render an instance tree to Markdown
///
/// Generates a deterministic outline of the tree:
/// - the index ID as H1
/// - one nested list item per node, in creation order, showing the value,
///   the attached document count, and the document IDs
///
/// # Errors
/// Propagates `NodeNotFound` if the arena is inconsistent.
pub fn render_index(state: &IndexState, index_id: &str) -> Result<String> {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", index_id));

    let root = state.get_node(state.root_id())?;
    if root.child_ids.is_empty() {
        output.push_str("(empty)\n");
        return Ok(output);
    }

    for child_id in &root.child_ids {
        render_node(state, child_id, 0, &mut output)?;
    }

    Ok(output)
}

fn render_node(
    state: &IndexState,
    node_id: &str,
    depth: usize,
    output: &mut String,
) -> Result<()> {
    let node = state.get_node(node_id)?;

    let indent = "  ".repeat(depth);
    if node.documents.is_empty() {
        output.push_str(&format!("{}- {}\n", indent, node.value));
    } else {
        let docs: Vec<&str> = node.documents.iter().map(String::as_str).collect();
        output.push_str(&format!(
            "{}- {} ({} document{}: {})\n",
            indent,
            node.value,
            docs.len(),
            if docs.len() == 1 { "" } else { "s" },
            docs.join(", ")
        ));
    }

    for child_id in &node.child_ids {
        render_node(state, child_id, depth + 1, output)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentContext, TemplateNode, TemplateTree};
    use crate::ops::reindex;

    #[test]
    fn test_render_empty_index() {
        let state = IndexState::new();
        let rendered = render_index(&state, "by-year").unwrap();

        assert!(rendered.starts_with("# by-year\n"));
        assert!(rendered.contains("(empty)"));
    }

    #[test]
    fn test_render_nested_tree() {
        let mut state = IndexState::new();
        let template = TemplateTree::with_roots(vec![
            TemplateNode::new("metadata.year").child(TemplateNode::new("metadata.category")),
        ]);
        let ctx = DocumentContext::new("d1")
            .with_metadata("year", "2020")
            .with_metadata("category", "invoice");
        reindex(&mut state, &template, &ctx, "by-year").unwrap();

        let rendered = render_index(&state, "by-year").unwrap();

        assert!(rendered.contains("- 2020\n"));
        assert!(rendered.contains("  - invoice (1 document: d1)\n"));
    }
}
