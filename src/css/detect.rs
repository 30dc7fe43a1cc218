//! Decide whether a draft still styles the selected node.

use super::SelectableNode;
use super::blocks::parse_blocks;
use super::resolve::matches_node;

/// Whether any rule in `css`, top-level or inside `@media`, matches `node`
/// directly or once state pseudo-classes are stripped.
///
/// Unlike extraction this applies no identity filter: it answers "does this
/// draft still style the selected node at all".
pub fn does_css_target_element<N: SelectableNode + ?Sized>(css: &str, node: &N) -> bool {
    if css.trim().is_empty() {
        return false;
    }

    parse_blocks(css)
        .iter()
        .flat_map(|block| block.selectors())
        .any(|selector| matches_node(node, selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::FakeNode;

    #[test]
    fn test_detects_top_level_and_media_rules() {
        let node = FakeNode::new(Some("code"), &[], &["#code", "input"]);

        assert!(does_css_target_element("#code { color: red; }", &node));
        assert!(!does_css_target_element(".instruction { color: red; }", &node));
        assert!(does_css_target_element("@media print { #code { x: 1 } }", &node));
        assert!(does_css_target_element("input:focus { x: 1 }", &node));
    }

    #[test]
    fn test_ignores_opaque_blocks_and_blank_input() {
        let node = FakeNode::new(Some("code"), &[], &["#code"]);

        assert!(!does_css_target_element("", &node));
        assert!(!does_css_target_element("@supports (x: y) { #code { x: 1 } }", &node));
        assert!(!does_css_target_element("#code { color: red;", &node));
    }
}
