//! Property tests for the fragment engine invariants.

use proptest::prelude::*;

use stylescope::css::{
    ReplaceOptions, SelectableNode, get_css_for_element_from_text, parse_blocks,
    replace_css_by_selector_in_text, replace_css_for_element_in_text,
};

/// Node that matches exactly one selector text.
struct Fixed {
    id: &'static str,
    selector: &'static str,
}

impl SelectableNode for Fixed {
    fn id(&self) -> Option<&str> {
        Some(self.id)
    }

    fn classes(&self) -> &[String] {
        &[]
    }

    fn test_selector(&self, selector: &str) -> bool {
        selector == self.selector
    }
}

const NODE: Fixed = Fixed {
    id: "demo-p",
    selector: "#demo-p",
};

fn declarations() -> impl Strategy<Value = String> {
    "[a-z-]{1,10}: [a-z0-9#% ]{0,12}(rgb\\([0-9, ]{0,8}\\))?;?"
}

fn class_rules() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        ("[a-z]{1,8}", declarations()).prop_map(|(class, decl)| format!(".{class} {{\n  {decl}\n}}")),
        0..6,
    )
}

/// A block that never belongs to [`NODE`].
fn other_block() -> impl Strategy<Value = String> {
    prop_oneof![
        ("[a-z]{1,8}", declarations()).prop_map(|(class, decl)| format!(".{class} {{\n  {decl}\n}}")),
        ("[a-z ]{0,12}", "[a-z]{1,8}", declarations())
            .prop_map(|(note, class, decl)| format!("/* {note} */\n.{class} {{\n  {decl}\n}}")),
        (320u32..1400, "[a-z]{1,8}", declarations()).prop_map(|(width, class, decl)| {
            format!("@media (min-width: {width}px) {{\n  .{class} {{\n    {decl}\n  }}\n}}")
        }),
        "[a-z]{1,8}".prop_map(|family| {
            format!("@import url('https://fonts.example/css2?family={family}:wght@400;700&display=swap');")
        }),
        "[a-z]{1,8}".prop_map(|name| {
            format!("@font-face {{\n  font-family: {name};\n  src: url(fonts/*/{name}.woff2);\n}}")
        }),
    ]
}

/// Blocks in source order, and the subset that never belongs to [`NODE`].
#[derive(Debug, Clone)]
struct Sheet {
    blocks: Vec<String>,
    untouched: Vec<String>,
}

impl Sheet {
    fn css(&self) -> String {
        self.blocks.join("\n\n")
    }
}

/// Unrelated blocks of every kind, with at most one top-level rule and one
/// `@media` rule for [`NODE`] placed among them.
fn sheet() -> impl Strategy<Value = Sheet> {
    (
        prop::collection::vec(other_block(), 0..6),
        prop::option::of((0usize..8, declarations())),
        prop::option::of((0usize..8, "[a-z]{1,8}", declarations(), any::<bool>())),
        any::<bool>(),
    )
        .prop_map(|(mut untouched, rule, media, footer)| {
            let mut blocks = untouched.clone();
            if let Some((at, decl)) = rule {
                blocks.insert(at.min(blocks.len()), format!("#demo-p {{\n  {decl}\n}}"));
            }
            if let Some((at, class, decl, node_first)) = media {
                let own = format!("#demo-p {{\n    {decl}\n  }}");
                let other = format!(".{class} {{\n    color: red;\n  }}");
                let (a, b) = if node_first { (own, other) } else { (other, own) };
                let wrapper = format!("@media (max-width: 768px) {{\n  {a}\n\n  {b}\n}}");
                blocks.insert(at.min(blocks.len()), wrapper);
            }
            if footer {
                blocks.push("/* end of theme */".to_string());
                untouched.push("/* end of theme */".to_string());
            }
            Sheet { blocks, untouched }
        })
}

proptest! {
    #[test]
    fn prop_operations_never_panic(css in "\\PC{0,120}", new_css in "\\PC{0,40}") {
        let _ = parse_blocks(&css);
        let _ = get_css_for_element_from_text(&css, &NODE);
        let _ = replace_css_for_element_in_text(&css, &NODE, &new_css, ReplaceOptions::default());
        let _ = replace_css_by_selector_in_text(&css, &new_css, ReplaceOptions::default());
    }

    #[test]
    fn prop_payload_without_rule_is_rejected(css in "\\PC{0,80}", fragment in "[.#a-z \n]{1,30}") {
        prop_assume!(!fragment.trim().is_empty());
        prop_assert_eq!(
            replace_css_by_selector_in_text(&css, &fragment, ReplaceOptions::default()),
            css.clone()
        );
        prop_assert_eq!(
            replace_css_for_element_in_text(&css, &NODE, &fragment, ReplaceOptions::default()),
            css
        );
    }

    #[test]
    fn prop_blocks_parse_back_verbatim(sheet in sheet()) {
        let css = sheet.css();
        let raws: Vec<&str> = parse_blocks(&css).iter().map(|b| b.raw).collect();
        prop_assert_eq!(raws, sheet.blocks.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn prop_incremental_edits_leave_one_rule(sheet in sheet(), steps in prop::collection::vec(declarations(), 1..8)) {
        let mut css = sheet.css();
        for decl in &steps {
            let edit = format!("#demo-p {{\n  {decl}\n}}");
            css = replace_css_for_element_in_text(&css, &NODE, &edit, ReplaceOptions::default());
        }

        prop_assert_eq!(css.matches("#demo-p {").count(), 1);
        for block in &sheet.untouched {
            prop_assert!(css.contains(block.as_str()), "lost block: {}", block);
        }
    }

    #[test]
    fn prop_extract_then_replace_is_identity(sheet in sheet()) {
        let css = sheet.css();
        let fragment = get_css_for_element_from_text(&css, &NODE);
        prop_assert_eq!(
            replace_css_for_element_in_text(&css, &NODE, &fragment, ReplaceOptions::default()),
            css
        );
    }

    #[test]
    fn prop_blank_replacement_removes_only_node_rules(sheet in sheet()) {
        let next = replace_css_for_element_in_text(&sheet.css(), &NODE, "", ReplaceOptions::default());

        prop_assert!(!next.contains("#demo-p"));
        for block in &sheet.untouched {
            prop_assert!(next.contains(block.as_str()), "lost block: {}", block);
        }
    }

    #[test]
    fn prop_blank_replacement_of_plain_rules(rules in class_rules(), decl in declarations()) {
        let mut blocks = rules.clone();
        blocks.push(format!("#demo-p {{\n  {decl}\n}}"));
        let css = blocks.join("\n\n");

        let next = replace_css_for_element_in_text(&css, &NODE, "", ReplaceOptions::default());
        prop_assert_eq!(next, rules.join("\n\n"));
    }
}
