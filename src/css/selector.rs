//! Selector text normalization and validation.
//!
//! These helpers work on selector *text* only. Structural matching against a
//! node is the host's job; here we only canonicalize spelling so two
//! selector lists can be compared, reject obviously half-typed selectors,
//! and strip state-dependent parts before a fallback match.

use std::collections::HashSet;

use super::blocks::parse_blocks;

/// State pseudo-classes removed by [`simplify_selector`].
pub const STATE_PSEUDO_CLASSES: &[&str] = &[
    "hover",
    "active",
    "focus",
    "focus-visible",
    "focus-within",
    "visited",
    "target",
    "checked",
    "disabled",
    "enabled",
    "required",
    "optional",
    "invalid",
    "valid",
    "read-only",
    "read-write",
];

const COMBINATORS: &[char] = &['>', '+', '~'];

/// Canonical spelling of a selector list for equality checks: trimmed,
/// combinators without surrounding whitespace, other whitespace runs
/// collapsed to one space.
///
/// ```
/// use stylescope::css::normalize_selector;
///
/// assert_eq!(normalize_selector("  #kc-form  >  .row\n  a "), "#kc-form>.row a");
/// ```
pub fn normalize_selector(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len());
    let mut pending_space = false;

    for c in selector.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !COMBINATORS.contains(&c) && !out.ends_with(COMBINATORS) {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}

/// Whether a normalized selector is usable as a replacement target.
///
/// A selector made of nothing, or containing a bare `.` or `#` token, is a
/// fragment caught mid-typing and must not be committed.
pub fn is_valid_replacement_selector(normalized: &str) -> bool {
    let mut tokens = normalized
        .split(|c: char| c.is_whitespace() || c == ',' || COMBINATORS.contains(&c))
        .filter(|t| !t.is_empty())
        .peekable();

    if tokens.peek().is_none() {
        return false;
    }
    tokens.all(|t| t != "." && t != "#")
}

/// Valid normalized selectors of every rule in `css`, including rules nested
/// in `@media` blocks.
pub fn normalized_selectors(css: &str) -> HashSet<String> {
    parse_blocks(css)
        .iter()
        .flat_map(|block| block.selectors())
        .map(normalize_selector)
        .filter(|s| is_valid_replacement_selector(s))
        .collect()
}

/// Strip what a static document can never match: pseudo-elements, the state
/// pseudo-classes in [`STATE_PSEUDO_CLASSES`], and any `:not()`, `:is()` or
/// `:where()` left empty by that. Whitespace is collapsed.
///
/// ```
/// use stylescope::css::simplify_selector;
///
/// assert_eq!(
///     simplify_selector("#demo-input:hover, input:focus-visible::placeholder"),
///     "#demo-input, input"
/// );
/// ```
pub fn simplify_selector(selector: &str) -> String {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut simplified = strip_pseudos(trimmed);
    loop {
        let next = strip_empty_functional(&simplified);
        if next == simplified {
            break;
        }
        simplified = next;
    }

    simplified.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `::name`, `::name(...)` and whole-identifier state pseudo-classes.
fn strip_pseudos(selector: &str) -> String {
    let bytes = selector.as_bytes();
    let mut out = String::with_capacity(selector.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b':' {
            i += 1;
            continue;
        }

        let (name_start, is_element) = if bytes.get(i + 1) == Some(&b':') {
            (i + 2, true)
        } else {
            (i + 1, false)
        };
        let name_end = ident_end(bytes, name_start);
        let name = &selector[name_start..name_end];

        let end = if is_element && !name.is_empty() {
            match bytes.get(name_end) {
                Some(b'(') => bytes[name_end..]
                    .iter()
                    .position(|&b| b == b')')
                    .map_or(bytes.len(), |p| name_end + p + 1),
                _ => name_end,
            }
        } else if !is_element && STATE_PSEUDO_CLASSES.contains(&name) {
            name_end
        } else {
            i = name_end.max(i + 1);
            continue;
        };

        out.push_str(&selector[copied..i]);
        copied = end;
        i = end;
    }

    out.push_str(&selector[copied..]);
    out
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn ident_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    end
}

/// One pass removing `:not()`, `:is()` and `:where()` with blank arguments.
fn strip_empty_functional(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len());
    let mut rest = selector;

    'scan: while let Some(colon) = rest.find(':') {
        for name in [":not(", ":is(", ":where("] {
            let Some(args) = rest[colon..].strip_prefix(name) else {
                continue;
            };
            let args_trimmed = args.trim_start();
            if let Some(after) = args_trimmed.strip_prefix(')') {
                out.push_str(&rest[..colon]);
                rest = after;
                continue 'scan;
            }
        }
        out.push_str(&rest[..=colon]);
        rest = &rest[colon + 1..];
    }

    out.push_str(rest);
    out
}
