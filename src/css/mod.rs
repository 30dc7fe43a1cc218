//! Selector-scoped CSS fragment engine.
//!
//! Lets an editor work on the rules that belong to one selected element
//! without disturbing the rest of a stylesheet. Every operation reparses the
//! stylesheet text from scratch and returns new text; untouched blocks are
//! copied through byte for byte.
//!
//! All entry points are total: malformed CSS never produces an error. An
//! unterminated trailing block is ignored, a replacement payload without a
//! usable selector is rejected by returning the source unchanged, and a
//! selector the node cannot evaluate counts as "no match".
//!
//! The node side is abstracted by [`SelectableNode`]. [`crate::dom::NodeRef`]
//! implements it on top of an html5ever document, but any host that can test
//! a selector against its own element type can plug in.

mod blocks;
mod detect;
mod extract;
mod replace;
mod resolve;
mod selector;

pub use blocks::{Block, BlockKind, parse_blocks};
pub use detect::does_css_target_element;
pub use extract::{extract_for_target, get_css_for_element_from_text};
pub use replace::{
    InsertPosition, ReplaceOptions, can_apply_replacement, replace_css_by_selector_in_text,
    replace_css_for_element_in_text,
};
pub use selector::{
    STATE_PSEUDO_CLASSES, is_valid_replacement_selector, normalize_selector,
    normalized_selectors, simplify_selector,
};

/// A document node that style rules can be scoped to.
pub trait SelectableNode {
    /// The node's `id` attribute, if any.
    fn id(&self) -> Option<&str>;

    /// Class tokens from the `class` attribute.
    fn classes(&self) -> &[String];

    /// Whether the node matches a selector list, like `Element.matches`.
    ///
    /// Must not panic. Selectors the implementation cannot evaluate report
    /// `false`.
    fn test_selector(&self, selector: &str) -> bool;

    /// `#id` and `.class` tokens identifying this node, in that order.
    fn identity_tokens(&self) -> Vec<String> {
        let id = self.id().filter(|id| !id.is_empty()).map(|id| format!("#{id}"));
        let classes = self
            .classes()
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| format!(".{c}"));
        id.into_iter().chain(classes).collect()
    }
}

impl<T: SelectableNode + ?Sized> SelectableNode for &T {
    fn id(&self) -> Option<&str> {
        (**self).id()
    }

    fn classes(&self) -> &[String] {
        (**self).classes()
    }

    fn test_selector(&self, selector: &str) -> bool {
        (**self).test_selector(selector)
    }
}

/// What an extraction is scoped to.
#[derive(Clone, Copy)]
pub enum Target<'a> {
    /// A live node, matched through the scoped resolver.
    Node(&'a dyn SelectableNode),
    /// A raw selector list, matched by normalized text equality.
    Selector(&'a str),
}

impl std::fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Node(node) => f
                .debug_struct("Node")
                .field("id", &node.id())
                .field("classes", &node.classes())
                .finish(),
            Target::Selector(selector) => f.debug_tuple("Selector").field(selector).finish(),
        }
    }
}

/// In-memory node for unit tests: matches only a fixed set of selector texts.
#[cfg(test)]
pub(crate) struct FakeNode {
    pub id: Option<&'static str>,
    pub classes: Vec<String>,
    pub matches: Vec<&'static str>,
}

#[cfg(test)]
impl FakeNode {
    pub fn new(id: Option<&'static str>, classes: &[&str], matches: &[&'static str]) -> Self {
        Self {
            id,
            classes: classes.iter().map(|c| c.to_string()).collect(),
            matches: matches.to_vec(),
        }
    }
}

#[cfg(test)]
impl SelectableNode for FakeNode {
    fn id(&self) -> Option<&str> {
        self.id
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn test_selector(&self, selector: &str) -> bool {
        self.matches.contains(&selector)
    }
}
