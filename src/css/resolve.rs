//! Decides whether a selector list belongs to a target node.

use std::collections::HashSet;

use super::SelectableNode;
use super::selector::{normalize_selector, simplify_selector};

/// Direct match, falling back to the selector with state pseudo-classes and
/// pseudo-elements stripped.
pub(crate) fn matches_node<N: SelectableNode + ?Sized>(node: &N, selector: &str) -> bool {
    if node.test_selector(selector) {
        return true;
    }

    let simplified = simplify_selector(selector);
    !simplified.is_empty() && simplified != selector && node.test_selector(&simplified)
}

/// Relevance-filtered matcher used when editing one node's rules.
///
/// A node with an `#id` or `.class` only claims rules that match it directly,
/// or that name one of its identity tokens and match once simplified. This
/// keeps generic rules such as `input:focus` or ancestor self-rules out of the
/// node's editing scope. Anonymous nodes accept any direct or simplified
/// match.
pub(crate) struct ScopeMatcher<'n, N: ?Sized> {
    node: &'n N,
    tokens: Vec<String>,
}

impl<'n, N: SelectableNode + ?Sized> ScopeMatcher<'n, N> {
    pub fn new(node: &'n N) -> Self {
        Self {
            node,
            tokens: node.identity_tokens(),
        }
    }

    pub fn matches(&self, selector: &str) -> bool {
        if self.tokens.is_empty() {
            return matches_node(self.node, selector);
        }
        if self.node.test_selector(selector) {
            return true;
        }
        self.references_identity(selector) && matches_node(self.node, selector)
    }

    fn references_identity(&self, selector: &str) -> bool {
        self.tokens.iter().any(|token| selector.contains(token.as_str()))
    }
}

/// Whether `selector` normalizes to a member of `set`.
pub(crate) fn overlaps(selector: &str, set: &HashSet<String>) -> bool {
    if set.is_empty() {
        return false;
    }
    let normalized = normalize_selector(selector);
    !normalized.is_empty() && set.contains(&normalized)
}
