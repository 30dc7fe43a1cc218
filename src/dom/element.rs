//! Selector matching against [`DomTree`] elements.
//!
//! Implements the `selectors` crate traits so that a node can answer
//! `test_selector` the way a browser's `Element.matches` would, for a static
//! (never hovered, never focused) document.

use std::fmt;

use cssparser::{CowRcStr, ParseError, Parser as CssParser, ParserInput, SourceLocation};
use html5ever::{LocalName, Namespace};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{ParseRelative, SelectorList, SelectorParseErrorKind};
use selectors::{OpaqueElement, SelectorImpl};

use super::tree::{DomTree, NodeData, NodeId};
use crate::css::SelectableNode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSelectors;

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Ident(pub String);

impl precomputed_hash::PrecomputedHash for Ident {
    fn precomputed_hash(&self) -> u32 {
        self.0
            .bytes()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32))
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Ident {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for Ident {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl cssparser::ToCss for Ident {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        cssparser::serialize_identifier(&self.0, dest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementName(pub LocalName);

impl precomputed_hash::PrecomputedHash for ElementName {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for ElementName {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl AsRef<str> for ElementName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl From<String> for ElementName {
    fn from(s: String) -> Self {
        Self(LocalName::from(s))
    }
}

impl<'a> From<&'a str> for ElementName {
    fn from(s: &'a str) -> Self {
        Self(LocalName::from(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NamespaceUrl(pub Namespace);

impl precomputed_hash::PrecomputedHash for NamespaceUrl {
    fn precomputed_hash(&self) -> u32 {
        self.0.precomputed_hash()
    }
}

impl cssparser::ToCss for NamespaceUrl {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(self.0.as_ref())
    }
}

impl From<String> for NamespaceUrl {
    fn from(s: String) -> Self {
        Self(Namespace::from(s))
    }
}

impl<'a> From<&'a str> for NamespaceUrl {
    fn from(s: &'a str) -> Self {
        Self(Namespace::from(s))
    }
}

/// Pseudo-elements never match a document node, so none are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl cssparser::ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = ScopeSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// State pseudo-classes understood by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    Link,
    AnyLink,
    Visited,
    Hover,
    Active,
    Focus,
    FocusVisible,
    FocusWithin,
    Target,
    Checked,
    Disabled,
    Enabled,
    Required,
    Optional,
    Invalid,
    Valid,
    ReadOnly,
    ReadWrite,
    PlaceholderShown,
}

const PSEUDO_CLASS_NAMES: &[(&str, PseudoClass)] = &[
    ("link", PseudoClass::Link),
    ("any-link", PseudoClass::AnyLink),
    ("visited", PseudoClass::Visited),
    ("hover", PseudoClass::Hover),
    ("active", PseudoClass::Active),
    ("focus", PseudoClass::Focus),
    ("focus-visible", PseudoClass::FocusVisible),
    ("focus-within", PseudoClass::FocusWithin),
    ("target", PseudoClass::Target),
    ("checked", PseudoClass::Checked),
    ("disabled", PseudoClass::Disabled),
    ("enabled", PseudoClass::Enabled),
    ("required", PseudoClass::Required),
    ("optional", PseudoClass::Optional),
    ("invalid", PseudoClass::Invalid),
    ("valid", PseudoClass::Valid),
    ("read-only", PseudoClass::ReadOnly),
    ("read-write", PseudoClass::ReadWrite),
    ("placeholder-shown", PseudoClass::PlaceholderShown),
];

impl PseudoClass {
    fn from_name(name: &str) -> Option<Self> {
        PSEUDO_CLASS_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, pc)| pc)
    }

    fn name(self) -> &'static str {
        PSEUDO_CLASS_NAMES
            .iter()
            .find(|&&(_, pc)| pc == self)
            .map(|&(n, _)| n)
            .unwrap_or_default()
    }
}

impl selectors::parser::NonTSPseudoClass for PseudoClass {
    type Impl = ScopeSelectors;

    fn is_active_or_hover(&self) -> bool {
        matches!(self, Self::Hover | Self::Active)
    }

    fn is_user_action_state(&self) -> bool {
        matches!(
            self,
            Self::Hover | Self::Active | Self::Focus | Self::FocusVisible | Self::FocusWithin
        )
    }
}

impl cssparser::ToCss for PseudoClass {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_char(':')?;
        dest.write_str(self.name())
    }
}

impl<'i> selectors::parser::Parser<'i> for ScopeSelectors {
    type Impl = ScopeSelectors;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_is_and_where(&self) -> bool {
        true
    }

    fn parse_non_ts_pseudo_class(
        &self,
        location: SourceLocation,
        name: CowRcStr<'i>,
    ) -> Result<PseudoClass, ParseError<'i, Self::Error>> {
        match PseudoClass::from_name(&name) {
            Some(pc) => Ok(pc),
            None => Err(location.new_custom_error(
                SelectorParseErrorKind::UnsupportedPseudoClassOrElement(name),
            )),
        }
    }
}

impl SelectorImpl for ScopeSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = Ident;
    type Identifier = Ident;
    type LocalName = ElementName;
    type NamespaceUrl = NamespaceUrl;
    type NamespacePrefix = Ident;
    type BorrowedLocalName = ElementName;
    type BorrowedNamespaceUrl = NamespaceUrl;
    type NonTSPseudoClass = PseudoClass;
    type PseudoElement = PseudoElement;
}

/// Parse a comma-separated selector list, consuming the whole input.
pub fn parse_selector_list(selector: &str) -> Result<SelectorList<ScopeSelectors>, String> {
    let mut input = ParserInput::new(selector);
    let mut parser = CssParser::new(&mut input);
    parser
        .parse_entirely(|p| SelectorList::parse(&ScopeSelectors, p, ParseRelative::No))
        .map_err(|err| format!("{:?}", err.kind))
}

/// Handle to an element of a [`DomTree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a DomTree,
    node: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(tree: &'a DomTree, node: NodeId) -> Self {
        Self { tree, node }
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn tag_name(&self) -> Option<&'a str> {
        self.tree.element_name(self.node).map(|n| n.as_ref())
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.tree.get_attr(self.node, name)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        selectors::Element::parent_element(self)
    }

    /// Test against a parsed selector list.
    pub fn matches_list(&self, list: &SelectorList<ScopeSelectors>) -> bool {
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );
        list.slice()
            .iter()
            .any(|selector| selectors::matching::matches_selector(selector, 0, None, self, &mut context))
    }

    /// `Element.matches`, with unparseable selectors reported as no match.
    pub fn matches(&self, selector: &str) -> bool {
        match parse_selector_list(selector) {
            Ok(list) => self.matches_list(&list),
            Err(reason) => {
                tracing::trace!(selector, %reason, "selector not supported by matcher");
                false
            }
        }
    }

    fn is_named(&self, names: &[&str]) -> bool {
        self.tag_name().is_some_and(|n| names.contains(&n))
    }

    fn has_attr(&self, name: &str) -> bool {
        self.tree.has_attr(self.node, name)
    }

    fn is_form_field(&self) -> bool {
        self.is_named(&["input", "select", "textarea"])
    }

    fn is_disableable(&self) -> bool {
        self.is_named(&[
            "button", "input", "select", "textarea", "fieldset", "optgroup", "option",
        ])
    }

    fn is_invalid(&self) -> bool {
        self.is_form_field()
            && self.has_attr("required")
            && self.attr("value").is_none_or(|v| v.is_empty())
            && !self.has_attr("checked")
    }

    fn is_read_write(&self) -> bool {
        if self.has_attr("readonly") || self.has_attr("disabled") {
            return false;
        }
        if self.is_named(&["textarea"]) {
            return true;
        }
        if self.is_named(&["input"]) {
            let kind = self.attr("type").unwrap_or("text").to_ascii_lowercase();
            return !matches!(
                kind.as_str(),
                "checkbox"
                    | "radio"
                    | "button"
                    | "submit"
                    | "reset"
                    | "image"
                    | "file"
                    | "hidden"
                    | "color"
                    | "range"
            );
        }
        self.attr("contenteditable")
            .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("node", &self.node)
            .field("tag", &self.tag_name())
            .field("id", &self.tree.element_id(self.node))
            .finish()
    }
}

impl SelectableNode for NodeRef<'_> {
    fn id(&self) -> Option<&str> {
        self.tree.element_id(self.node)
    }

    fn classes(&self) -> &[String] {
        self.tree.element_classes(self.node)
    }

    fn test_selector(&self, selector: &str) -> bool {
        self.matches(selector)
    }
}

impl<'a> selectors::Element for NodeRef<'a> {
    type Impl = ScopeSelectors;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self)
    }

    fn parent_element(&self) -> Option<Self> {
        let parent = self.tree.get(self.node)?.parent;
        self.tree
            .is_element(parent)
            .then(|| Self::new(self.tree, parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let mut current = self.tree.get(self.node)?.prev_sibling;
        while current.is_some() {
            if self.tree.is_element(current) {
                return Some(Self::new(self.tree, current));
            }
            current = self.tree.get(current)?.prev_sibling;
        }
        None
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let mut current = self.tree.get(self.node)?.next_sibling;
        while current.is_some() {
            if self.tree.is_element(current) {
                return Some(Self::new(self.tree, current));
            }
            current = self.tree.get(current)?.next_sibling;
        }
        None
    }

    fn first_element_child(&self) -> Option<Self> {
        self.tree
            .children(self.node)
            .find(|&child| self.tree.is_element(child))
            .map(|child| Self::new(self.tree, child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &ElementName) -> bool {
        self.tree
            .element_name(self.node)
            .is_some_and(|n| n == &name.0)
    }

    fn has_namespace(&self, ns: &NamespaceUrl) -> bool {
        self.tree
            .element_namespace(self.node)
            .is_some_and(|n| n == &ns.0)
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tree.element_name(self.node) == other.tree.element_name(other.node)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&NamespaceUrl>,
        local_name: &ElementName,
        operation: &AttrSelectorOperation<&Ident>,
    ) -> bool {
        let Some(NodeData::Element { attrs, .. }) = self.tree.get(self.node).map(|n| &n.data)
        else {
            return false;
        };

        attrs
            .iter()
            .filter(|attr| match ns {
                NamespaceConstraint::Any => true,
                NamespaceConstraint::Specific(ns) => attr.name.ns == ns.0,
            })
            .find(|attr| attr.name.local == local_name.0)
            .is_some_and(|attr| operation.eval_str(&attr.value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &PseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match pc {
            PseudoClass::Link | PseudoClass::AnyLink => self.is_link(),
            PseudoClass::Visited
            | PseudoClass::Hover
            | PseudoClass::Active
            | PseudoClass::Focus
            | PseudoClass::FocusVisible
            | PseudoClass::FocusWithin
            | PseudoClass::Target => false,
            PseudoClass::Checked => {
                (self.is_named(&["input"]) && self.has_attr("checked"))
                    || (self.is_named(&["option"]) && self.has_attr("selected"))
            }
            PseudoClass::Disabled => self.is_disableable() && self.has_attr("disabled"),
            PseudoClass::Enabled => self.is_disableable() && !self.has_attr("disabled"),
            PseudoClass::Required => self.is_form_field() && self.has_attr("required"),
            PseudoClass::Optional => self.is_form_field() && !self.has_attr("required"),
            PseudoClass::Invalid => self.is_invalid(),
            PseudoClass::Valid => self.is_form_field() && !self.is_invalid(),
            PseudoClass::ReadWrite => self.is_read_write(),
            PseudoClass::ReadOnly => !self.is_read_write(),
            PseudoClass::PlaceholderShown => {
                self.is_named(&["input", "textarea"])
                    && self.has_attr("placeholder")
                    && self.attr("value").is_none_or(|v| v.is_empty())
            }
        }
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        self.is_named(&["a", "area"]) && self.has_attr("href")
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &Ident, case_sensitivity: CaseSensitivity) -> bool {
        self.tree
            .element_id(self.node)
            .is_some_and(|own| case_sensitivity.eq(own.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &Ident, case_sensitivity: CaseSensitivity) -> bool {
        self.tree
            .element_classes(self.node)
            .iter()
            .any(|c| case_sensitivity.eq(c.as_bytes(), name.0.as_bytes()))
    }

    fn has_custom_state(&self, _name: &Ident) -> bool {
        false
    }

    fn imported_part(&self, _name: &Ident) -> Option<Ident> {
        None
    }

    fn is_part(&self, _name: &Ident) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.tree.children(self.node).all(|child| {
            match self.tree.get(child).map(|n| &n.data) {
                Some(NodeData::Element { .. }) => false,
                Some(NodeData::Text(t)) => t.is_empty(),
                _ => true,
            }
        })
    }

    fn is_root(&self) -> bool {
        self.tree
            .get(self.node)
            .and_then(|n| self.tree.get(n.parent))
            .is_some_and(|parent| matches!(parent.data, NodeData::Document))
    }

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn node<'a>(doc: &'a Document, selector: &str) -> NodeRef<'a> {
        doc.select(selector).expect("element present")
    }

    #[test]
    fn test_type_class_and_id_selectors() {
        let doc = Document::parse_html(r#"<p id="main" class="intro highlight">Hello</p>"#);
        let p = node(&doc, "p");

        assert!(p.matches("p"));
        assert!(p.matches(".intro.highlight"));
        assert!(p.matches("p#main"));
        assert!(!p.matches("#other"));
        assert!(!p.matches("div"));
    }

    #[test]
    fn test_combinators() {
        let doc = Document::parse_html(
            r##"<div id="kc-registration"><span><a href="#">Register</a></span><em>x</em></div>"##,
        );
        let a = node(&doc, "a");
        let em = node(&doc, "em");

        assert!(a.matches("#kc-registration > span > a"));
        assert!(a.matches("#kc-registration a"));
        assert!(!a.matches("#kc-registration > a"));
        assert!(em.matches("span + em"));
        assert!(em.matches("span ~ em"));
    }

    #[test]
    fn test_selector_list_matches_any_entry() {
        let doc = Document::parse_html(r#"<div class="kcInputClass"><input id="code"></div>"#);
        let input = node(&doc, "#code");

        assert!(input.matches("select, .kcInputClass input"));
        assert!(!input.matches("select, textarea"));
    }

    #[test]
    fn test_is_and_not() {
        let doc = Document::parse_html(
            r#"<div class="wrapper"><input class="kcInputClass" id="demo-input"></div>"#,
        );
        let input = node(&doc, "#demo-input");

        assert!(input.matches(".wrapper :is(input.kcInputClass, textarea.kcInputClass)"));
        assert!(input.matches(":where(input):not(.other)"));
        assert!(!input.matches(".wrapper :is(input.kcInputClass:focus)"));
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let doc = Document::parse_html(
            r#"<div><button id="first-btn">A</button><button id="second-btn">B</button></div>"#,
        );

        assert!(node(&doc, "#first-btn").matches("button:nth-of-type(1)"));
        assert!(!node(&doc, "#second-btn").matches("button:nth-of-type(1)"));
        assert!(node(&doc, "#second-btn").matches("button:last-child"));
        assert!(node(&doc, "html").matches(":root"));
    }

    #[test]
    fn test_state_pseudo_classes_in_static_document() {
        let doc = Document::parse_html(
            r#"<form><input id="a" required><input id="b" disabled value="x"><input id="c" type="checkbox" checked></form>"#,
        );

        assert!(!node(&doc, "#a").matches("input:hover"));
        assert!(!node(&doc, "#a").matches("input:focus-visible"));
        assert!(node(&doc, "#a").matches("input:required:invalid"));
        assert!(node(&doc, "#b").matches("input:disabled:optional"));
        assert!(node(&doc, "#b").matches("input:read-only"));
        assert!(node(&doc, "#a").matches("input:read-write:enabled"));
        assert!(node(&doc, "#c").matches(":checked"));
    }

    #[test]
    fn test_unsupported_syntax_is_no_match() {
        let doc = Document::parse_html(r#"<p id="demo-p">x</p>"#);
        let p = node(&doc, "p");

        assert!(!p.matches("p::before"));
        assert!(!p.matches("p:unknown-state"));
        assert!(!p.matches("p {"));
        assert!(!p.matches(""));
        assert!(parse_selector_list("p:unknown-state").is_err());
    }

    #[test]
    fn test_attribute_selectors() {
        let doc = Document::parse_html(r#"<div data-kc-client="name" lang="en-US">x</div>"#);
        let div = node(&doc, "div");

        assert!(div.matches(r#"[data-kc-client="name"]"#));
        assert!(div.matches("[lang|=en]"));
        assert!(!div.matches("[data-kc-client=other]"));
    }
}
