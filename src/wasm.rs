//! WASM bindings for browser-based editors.
//!
//! A browser host would normally implement [`SelectableNode`] over its live
//! DOM. These bindings instead take the preview markup plus a selector that
//! locates the edited node, and run the html5ever document on the Rust side.
//!
//! [`SelectableNode`]: crate::css::SelectableNode

use wasm_bindgen::prelude::*;

use crate::css::{self, InsertPosition, ReplaceOptions};
use crate::dom::Document;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn options(insert_at_start: bool) -> ReplaceOptions {
    if insert_at_start {
        ReplaceOptions::insert_at(InsertPosition::Start)
    } else {
        ReplaceOptions::default()
    }
}

/// Rules of `css` belonging to the element `node_selector` finds in `html`.
#[wasm_bindgen]
pub fn css_for_element(css: &str, html: &str, node_selector: &str) -> Result<String, JsValue> {
    let doc = Document::parse_html(html);
    let node = doc
        .select(node_selector)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(css::get_css_for_element_from_text(css, &node))
}

/// Replace the located element's rules in `css` with `new_css`.
#[wasm_bindgen]
pub fn replace_css_for_element(
    css: &str,
    html: &str,
    node_selector: &str,
    new_css: &str,
    insert_at_start: bool,
) -> Result<String, JsValue> {
    let doc = Document::parse_html(html);
    let node = doc
        .select(node_selector)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(css::replace_css_for_element_in_text(
        css,
        &node,
        new_css,
        options(insert_at_start),
    ))
}

/// Replace the rules of `css` whose selectors appear in `new_css`.
#[wasm_bindgen]
pub fn replace_css_by_selector(css: &str, new_css: &str, insert_at_start: bool) -> String {
    css::replace_css_by_selector_in_text(css, new_css, options(insert_at_start))
}

/// Whether any rule of `css` styles the located element.
#[wasm_bindgen]
pub fn css_targets_element(css: &str, html: &str, node_selector: &str) -> Result<bool, JsValue> {
    let doc = Document::parse_html(html);
    let node = doc
        .select(node_selector)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(css::does_css_target_element(css, &node))
}
