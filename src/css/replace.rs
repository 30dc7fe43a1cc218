//! Splice edited rules back into a stylesheet.

use std::borrow::Cow;
use std::collections::HashSet;

use super::SelectableNode;
use super::blocks::{Block, BlockKind, parse_blocks, render_media};
use super::resolve::{ScopeMatcher, overlaps};
use super::selector::normalized_selectors;

/// Where replacement CSS goes when no existing block matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize, clap::ValueEnum))]
#[cfg_attr(feature = "cli", serde(rename_all = "lowercase"))]
pub enum InsertPosition {
    Start,
    #[default]
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplaceOptions {
    pub insert_position_when_missing: InsertPosition,
}

impl ReplaceOptions {
    pub fn insert_at(position: InsertPosition) -> Self {
        Self {
            insert_position_when_missing: position,
        }
    }
}

/// Whether `new_css` may be committed: blank (a deletion), or containing at
/// least one rule with a usable selector.
pub fn can_apply_replacement(new_css: &str) -> bool {
    new_css.trim().is_empty() || !normalized_selectors(new_css).is_empty()
}

/// Replace the rules of `css` that belong to `node` with `new_css`.
///
/// A block is replaced when it belongs to the node, or when its selector also
/// appears in `new_css` (so retyping a rule under a new selector that no
/// longer matches still replaces the old one instead of duplicating it).
/// The first replaced block receives `new_css`; later ones are removed.
///
/// Returns `css` unchanged when `new_css` holds no usable selector.
pub fn replace_css_for_element_in_text<N: SelectableNode + ?Sized>(
    css: &str,
    node: &N,
    new_css: &str,
    options: ReplaceOptions,
) -> String {
    if !can_apply_replacement(new_css) {
        tracing::debug!(new_css, "replacement has no usable selector, keeping source");
        return css.to_string();
    }

    let selectors = normalized_selectors(new_css);
    let matcher = ScopeMatcher::new(node);
    splice(
        css,
        new_css,
        |selector| matcher.matches(selector) || overlaps(selector, &selectors),
        options,
    )
}

/// Replace the rules of `css` whose selector appears in `new_css`, or add
/// `new_css` if none does.
pub fn replace_css_by_selector_in_text(css: &str, new_css: &str, options: ReplaceOptions) -> String {
    if !can_apply_replacement(new_css) {
        tracing::debug!(new_css, "replacement has no usable selector, keeping source");
        return css.to_string();
    }

    let selectors: HashSet<String> = normalized_selectors(new_css);
    splice(css, new_css, |selector| overlaps(selector, &selectors), options)
}

fn splice(
    css: &str,
    new_css: &str,
    is_match: impl Fn(&str) -> bool,
    options: ReplaceOptions,
) -> String {
    let replacement = new_css.trim();
    let blocks = parse_blocks(css);
    let is_hit = |block: &Block<'_>| block.kind == BlockKind::Rule && is_match(block.prelude);
    let plan = Plan::new(&blocks, replacement, &is_hit);

    let mut out: Vec<Cow<'_, str>> = Vec::new();
    let mut matched = false;
    let mut inserted = false;

    for (index, block) in blocks.iter().enumerate() {
        match block.kind {
            BlockKind::Rule if is_hit(block) => {
                matched = true;
                emit_once(&mut out, &plan.rest, &mut inserted);
            }
            BlockKind::Media if block.children.iter().any(&is_hit) => {
                matched = true;
                if let Some(&(_, inner)) = plan.merged.iter().find(|(at, _)| *at == index) {
                    if plan.anchor == Some(index) {
                        emit_once(&mut out, &plan.rest, &mut inserted);
                    }
                    out.push(merge_media(block, &is_hit, inner).into());
                    continue;
                }

                emit_once(&mut out, &plan.rest, &mut inserted);
                let kept: Vec<&str> = block
                    .children
                    .iter()
                    .filter(|child| !is_hit(child))
                    .map(|child| child.raw)
                    .collect();
                if !kept.is_empty() {
                    out.push(render_media(block.prelude, kept).into());
                }
            }
            _ => out.push(block.raw.into()),
        }
    }

    if !matched && replacement.is_empty() {
        return css.to_string();
    }

    if !inserted && !plan.rest.is_empty() {
        tracing::debug!(position = ?options.insert_position_when_missing, "no existing rule matched, inserting");
        match options.insert_position_when_missing {
            InsertPosition::Start => out.insert(0, plan.rest.clone()),
            InsertPosition::End => out.push(plan.rest.clone()),
        }
    }

    out.join("\n\n")
}

fn emit_once<'s>(out: &mut Vec<Cow<'s, str>>, text: &Cow<'s, str>, emitted: &mut bool) {
    if !*emitted && !text.is_empty() {
        out.push(text.clone());
        *emitted = true;
    }
}

/// How the replacement is distributed over the existing blocks.
///
/// An `@media` block in the replacement whose query matches an existing
/// `@media` block holding the node's rules is merged into that block in
/// place. Everything else (`rest`) goes where the first other match was.
struct Plan<'r> {
    rest: Cow<'r, str>,
    /// Existing media block index and the inner text replacing its matches.
    merged: Vec<(usize, &'r str)>,
    /// Block where `rest` is emitted when it has no other match to land on.
    anchor: Option<usize>,
}

impl<'r> Plan<'r> {
    fn new(blocks: &[Block<'_>], replacement: &'r str, is_hit: &impl Fn(&Block<'_>) -> bool) -> Self {
        let mut plan = Plan {
            rest: replacement.into(),
            merged: Vec::new(),
            anchor: None,
        };
        if replacement.is_empty() {
            return plan;
        }

        let parts = parse_blocks(replacement);
        let mut claimed = vec![false; parts.len()];
        for (index, block) in blocks.iter().enumerate() {
            if block.kind != BlockKind::Media || !block.children.iter().any(is_hit) {
                continue;
            }
            let key = media_key(block.prelude);
            let part = parts.iter().enumerate().position(|(i, part)| {
                !claimed[i] && part.kind == BlockKind::Media && media_key(part.prelude) == key
            });
            if let Some(i) = part
                && let Some(inner) = inner_text(&parts[i])
            {
                claimed[i] = true;
                plan.merged.push((index, inner));
            }
        }
        if plan.merged.is_empty() {
            return plan;
        }

        plan.rest = parts
            .iter()
            .zip(&claimed)
            .filter(|(_, claimed)| !**claimed)
            .map(|(part, _)| part.raw)
            .collect::<Vec<_>>()
            .join("\n\n")
            .into();

        let other_hit = blocks.iter().enumerate().any(|(index, block)| match block.kind {
            BlockKind::Rule => is_hit(block),
            BlockKind::Media => {
                block.children.iter().any(is_hit) && !plan.merged.iter().any(|(at, _)| *at == index)
            }
            _ => false,
        });
        if !other_hit {
            plan.anchor = plan.merged.first().map(|(at, _)| *at);
        }
        plan
    }
}

fn media_key(query: &str) -> String {
    query.split_whitespace().collect::<String>().to_ascii_lowercase()
}

/// Source text from the first to the last child of a media block.
fn inner_text<'r>(media: &Block<'r>) -> Option<&'r str> {
    let first = media.children.first()?;
    let last = media.children.last()?;
    let start = offset_in(media.raw, first.raw);
    let end = offset_in(media.raw, last.raw) + last.raw.len();
    Some(&media.raw[start..end])
}

fn offset_in(outer: &str, inner: &str) -> usize {
    inner.as_ptr() as usize - outer.as_ptr() as usize
}

/// Rewrite a media block in place: the first matching child becomes `inner`,
/// later matching children are removed with the whitespace before them, and
/// every other byte is kept.
fn merge_media(block: &Block<'_>, is_hit: impl Fn(&Block<'_>) -> bool, inner: &str) -> String {
    let raw = block.raw;
    let mut out = String::with_capacity(raw.len() + inner.len());
    let mut copied = 0;
    let mut prev_end = 0;
    let mut replaced = false;

    for child in &block.children {
        let start = offset_in(raw, child.raw);
        let end = start + child.raw.len();
        if is_hit(child) {
            if replaced {
                out.push_str(&raw[copied..prev_end]);
            } else {
                out.push_str(&raw[copied..start]);
                out.push_str(inner);
                replaced = true;
            }
            copied = end;
        }
        prev_end = end;
    }

    out.push_str(&raw[copied..]);
    out
}
