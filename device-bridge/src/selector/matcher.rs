use crate::hierarchy::HierarchyNode;

use super::parser::{Criterion, Key, Selector};

/// A node that satisfied a selector, with its location in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub node: &'a HierarchyNode,
    /// Child indices from the root; empty for the root itself
    pub path: Vec<usize>,
    pub depth: usize,
}

impl Selector {
    /// True when every criterion matches `node` found at `depth`
    pub fn matches(&self, node: &HierarchyNode, depth: usize) -> bool {
        self.criteria()
            .iter()
            .all(|criterion| criterion_matches(criterion, node, depth))
    }
}

fn criterion_matches(criterion: &Criterion, node: &HierarchyNode, depth: usize) -> bool {
    match criterion.key {
        Key::Depth => criterion.matches_value(&depth.to_string()),
        key => key
            .attribute_name()
            .and_then(|name| node.attr(name))
            .is_some_and(|value| criterion.matches_value(value)),
    }
}

/// First node in document order (depth-first, pre-order) matching `selector`
pub fn find_first<'a>(root: &'a HierarchyNode, selector: &Selector) -> Option<Match<'a>> {
    let mut stack: Vec<(&HierarchyNode, Vec<usize>)> = vec![(root, Vec::new())];

    while let Some((node, path)) = stack.pop() {
        let depth = path.len();
        if selector.matches(node, depth) {
            return Some(Match { node, path, depth });
        }
        for (index, child) in node.children().iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(index);
            stack.push((child, child_path));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse;

    fn button(text: &str, id: &str) -> HierarchyNode {
        HierarchyNode::new("node")
            .with_attr("text", text)
            .with_attr("resource-id", id)
            .with_attr("clickable", "true")
            .with_attr("scrollable", "false")
    }

    fn tree() -> HierarchyNode {
        HierarchyNode::new("hierarchy").with_attr("rotation", "0").with_child(
            HierarchyNode::new("node")
                .with_attr("text", "")
                .with_attr("resource-id", "android:id/content")
                .with_attr("content-desc", "Main")
                .with_child(
                    HierarchyNode::new("node")
                        .with_attr("resource-id", "com.example:id/list")
                        .with_attr("scrollable", "true")
                        .with_child(button("Hello world", "com.example:id/first"))
                        .with_child(button("Hello again", "com.example:id/second")),
                )
                .with_child(button("OK", "android:id/button1")),
        )
    }

    #[test]
    fn test_literal_match() {
        let root = tree();
        let found = find_first(&root, &parse("res@android:id/button1").unwrap()).unwrap();
        assert_eq!(found.node.attr("text"), Some("OK"));
        assert_eq!(found.path, vec![0, 1]);
        assert_eq!(found.depth, 2);
    }

    #[test]
    fn test_first_match_in_document_order() {
        let root = tree();
        let found = find_first(&root, &parse("text@$Hello.*").unwrap()).unwrap();
        assert_eq!(found.node.attr("resource-id"), Some("com.example:id/first"));
        assert_eq!(found.path, vec![0, 0, 0]);
    }

    #[test]
    fn test_pattern_requires_full_match() {
        let root = tree();
        assert!(find_first(&root, &parse("text@$world").unwrap()).is_none());
        assert!(find_first(&root, &parse("text@$.*world").unwrap()).is_some());
    }

    #[test]
    fn test_all_criteria_must_match() {
        let root = tree();
        let found = find_first(&root, &parse("text@$Hello.*,res@com.example:id/second").unwrap())
            .unwrap();
        assert_eq!(found.path, vec![0, 0, 1]);

        assert!(find_first(&root, &parse("text@OK,clickable@false").unwrap()).is_none());
    }

    #[test]
    fn test_missing_attribute_never_matches() {
        let root = tree();
        // only the content node has content-desc; a catch-all pattern still needs the attribute
        let found = find_first(&root, &parse("desc@$.*").unwrap()).unwrap();
        assert_eq!(found.path, vec![0]);

        let list_text = parse("res@com.example:id/list,text@$.*").unwrap();
        assert!(find_first(&root, &list_text).is_none());
    }

    #[test]
    fn test_depth_criterion() {
        let root = tree();
        let found = find_first(&root, &parse("depth@3").unwrap()).unwrap();
        assert_eq!(found.path, vec![0, 0, 0]);

        let found = find_first(&root, &parse("depth@0").unwrap()).unwrap();
        assert!(found.path.is_empty());
        assert_eq!(found.node.tag(), "hierarchy");

        assert!(find_first(&root, &parse("depth@$[4-9]").unwrap()).is_none());
    }

    #[test]
    fn test_scrollable_and_clickable() {
        let root = tree();
        let found = find_first(&root, &parse("scrollable@true").unwrap()).unwrap();
        assert_eq!(found.node.attr("resource-id"), Some("com.example:id/list"));
    }
}
