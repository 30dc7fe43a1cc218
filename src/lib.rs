//! # stylescope
//!
//! Selector-scoped editing of CSS stylesheets.
//!
//! A theme editor lets its user click an element in a preview and edit
//! "the CSS for this element". This crate does the text work behind that:
//! it finds the rules of a large stylesheet that belong to one node, and
//! splices an edited version back in without duplicating rules, losing
//! unrelated ones, or corrupting the sheet while the user is mid-keystroke.
//!
//! ## Features
//!
//! - Block parser that keeps every untouched rule byte for byte, including
//!   `@import url(...)` values with semicolons and opaque at-rules
//! - Relevance-filtered matching: a node with an `id` or class only claims
//!   the rules that actually name it or match it directly
//! - `@media` subset extraction and in-place replacement
//! - Rejection of half-typed payloads (`.subtitle . {`, bare selectors)
//! - html5ever-backed host document with a `selectors` matcher
//! - Editor workspace that decides when drafts commit and emits undo entries
//!
//! ## Quick Start
//!
//! ```
//! use stylescope::css::{ReplaceOptions, get_css_for_element_from_text, replace_css_for_element_in_text};
//! use stylescope::dom::Document;
//!
//! let doc = Document::parse_html(r#"<div class="wrapper"><input class="kcInputClass"></div>"#);
//! let input = doc.select("input").unwrap();
//!
//! let css = ".wrapper :is(input.kcInputClass:focus, textarea.kcInputClass:focus) {\n  border-color: red;\n}\n\n.other {\n  color: blue;\n}";
//! assert!(get_css_for_element_from_text(css, &input).starts_with(".wrapper :is("));
//!
//! let next = replace_css_for_element_in_text(
//!     css,
//!     &input,
//!     ".wrapper input.kcInputClass {\n  border-color: green;\n}",
//!     ReplaceOptions::default(),
//! );
//! assert_eq!(next, ".wrapper input.kcInputClass {\n  border-color: green;\n}\n\n.other {\n  color: blue;\n}");
//! ```

pub mod css;
pub mod dom;
pub mod error;
pub mod workspace;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use css::{
    InsertPosition, ReplaceOptions, SelectableNode, Target, does_css_target_element,
    extract_for_target, get_css_for_element_from_text, replace_css_by_selector_in_text,
    replace_css_for_element_in_text,
};
pub use dom::Document;
pub use error::{Error, Result};
pub use workspace::{HistoryEntry, HistorySink, Scope, StyleWorkspace};
