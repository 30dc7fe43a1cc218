//! Host document model.
//!
//! The CSS engine only needs a node that can report its identity and test a
//! selector. Outside a browser that capability comes from this module: HTML
//! is parsed with html5ever into an arena tree, and element handles match
//! selectors through the `selectors` crate.
//!
//! ```
//! use stylescope::dom::Document;
//! use stylescope::css::get_css_for_element_from_text;
//!
//! let doc = Document::parse_html(r#"<div id="kc-code"><p>Demo</p></div>"#);
//! let p = doc.select("#kc-code p").unwrap();
//!
//! let css = "#kc-code p { color: black; }\n\n.other { color: blue; }";
//! assert_eq!(get_css_for_element_from_text(css, &p), "#kc-code p { color: black; }");
//! ```

mod element;
mod sink;
mod tree;

pub use element::{NodeRef, PseudoClass, ScopeSelectors, parse_selector_list};
pub use tree::{Attribute, DomTree, Node, NodeData, NodeId};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::error::{Error, Result};
use sink::DomSink;

/// A parsed HTML document.
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
}

impl Document {
    /// Parse HTML markup. Fragments are wrapped in `html`/`body` the way a
    /// browser would.
    pub fn parse_html(html: &str) -> Self {
        let tree = parse_document(DomSink::new(), ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes())
            .into_tree();
        Self { tree }
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Element handle for a node id, if it names an element.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.tree
            .is_element(id)
            .then(|| NodeRef::new(&self.tree, id))
    }

    /// All elements matching `selector`, in document order.
    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeRef<'_>>> {
        let list = parse_selector_list(selector).map_err(|reason| Error::InvalidSelector {
            selector: selector.to_string(),
            reason,
        })?;
        Ok(self
            .tree
            .elements()
            .map(|id| NodeRef::new(&self.tree, id))
            .filter(|node| node.matches_list(&list))
            .collect())
    }

    /// First element matching `selector`, like `querySelector`.
    pub fn query(&self, selector: &str) -> Result<Option<NodeRef<'_>>> {
        let list = parse_selector_list(selector).map_err(|reason| Error::InvalidSelector {
            selector: selector.to_string(),
            reason,
        })?;
        Ok(self
            .tree
            .elements()
            .map(|id| NodeRef::new(&self.tree, id))
            .find(|node| node.matches_list(&list)))
    }

    /// First element matching `selector`, failing when there is none.
    pub fn select(&self, selector: &str) -> Result<NodeRef<'_>> {
        self.query(selector)?
            .ok_or_else(|| Error::NoMatchingElement(selector.to_string()))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.tree.set_attr(node, name, value);
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.tree.remove_attr(node, name);
    }
}
