//! Pull the rules belonging to a target out of a stylesheet.

use std::collections::HashSet;

use super::blocks::{BlockKind, parse_blocks, render_media};
use super::resolve::{ScopeMatcher, overlaps};
use super::selector::normalize_selector;
use super::{SelectableNode, Target};

/// The rules of `css` that belong to `node`, in source order.
///
/// Top-level rules are copied verbatim. An `@media` block is kept with only
/// its matching inner rules, re-indented under a fresh wrapper. Other
/// at-rules never belong to a node. Blocks are separated by a blank line;
/// nothing matching yields `""`.
pub fn get_css_for_element_from_text<N: SelectableNode + ?Sized>(css: &str, node: &N) -> String {
    if css.trim().is_empty() {
        return String::new();
    }
    let matcher = ScopeMatcher::new(node);
    extract_matching(css, |selector| matcher.matches(selector))
}

/// Like [`get_css_for_element_from_text`], but the target may also be a raw
/// selector list, matched against each rule by normalized text.
pub fn extract_for_target(css: &str, target: Target<'_>) -> String {
    match target {
        Target::Node(node) => get_css_for_element_from_text(css, node),
        Target::Selector(selector) => {
            let wanted: HashSet<String> = [normalize_selector(selector)].into();
            extract_matching(css, |candidate| overlaps(candidate, &wanted))
        }
    }
}

fn extract_matching(css: &str, is_match: impl Fn(&str) -> bool) -> String {
    let mut kept = Vec::new();

    for block in parse_blocks(css) {
        match block.kind {
            BlockKind::Rule => {
                if is_match(block.prelude) {
                    kept.push(block.raw.to_string());
                }
            }
            BlockKind::Media => {
                let inner: Vec<&str> = block
                    .inner_rules()
                    .filter(|rule| is_match(rule.prelude))
                    .map(|rule| rule.raw)
                    .collect();
                if !inner.is_empty() {
                    kept.push(render_media(block.prelude, inner));
                }
            }
            BlockKind::AtRule | BlockKind::Comment => {}
        }
    }

    kept.join("\n\n")
}
