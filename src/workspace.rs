//! Editor-side driver for the fragment engine.
//!
//! A [`StyleWorkspace`] owns the full stylesheet and the text currently in
//! the editor (the draft). Depending on the [`Scope`], the editor shows the
//! whole stylesheet or just the rules of the selected node. Drafts are
//! committed back into the stylesheet as soon as they are safe to apply,
//! and every effective change is reported to a [`HistorySink`] so an undo
//! store can record it.
//!
//! ```
//! use stylescope::dom::Document;
//! use stylescope::workspace::{HistoryEntry, Scope, StyleWorkspace};
//!
//! let doc = Document::parse_html(r#"<div id="kc-code"><p>Demo</p></div>"#);
//! let p = doc.select("#kc-code p").unwrap();
//! let scope = Scope::Element(&p);
//!
//! let mut workspace = StyleWorkspace::new("#kc-code p { color: black; }\n\n.other { color: blue; }", scope);
//! assert_eq!(workspace.draft(), "#kc-code p { color: black; }");
//!
//! let mut history: Vec<HistoryEntry> = Vec::new();
//! workspace.set_draft(scope, "#kc-code p { color: red; }", &mut history);
//! assert_eq!(workspace.source(), "#kc-code p { color: red; }\n\n.other { color: blue; }");
//! assert_eq!(history.len(), 1);
//! ```

use crate::css::{
    InsertPosition, ReplaceOptions, SelectableNode, does_css_target_element,
    get_css_for_element_from_text, replace_css_for_element_in_text,
};

/// Coalescing key attached to history entries produced by editor typing.
pub const USER_EDIT_COALESCE_KEY: &str = "css-editor-user";

/// What the editor is currently showing.
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    /// The whole stylesheet.
    All,
    /// Rules belonging to one selected node.
    Element(&'a dyn SelectableNode),
    /// Nothing selected; the editor is empty and read-only.
    None,
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::All => f.write_str("All"),
            Scope::Element(node) => f
                .debug_struct("Element")
                .field("id", &node.id())
                .field("classes", &node.classes())
                .finish(),
            Scope::None => f.write_str("None"),
        }
    }
}

/// One undoable change of the full stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub before: String,
    pub after: String,
    /// Entries sharing a key within the store's time window collapse into
    /// one undo step.
    pub coalesce_key: &'static str,
}

/// Receives history entries; the undo store lives outside this crate.
pub trait HistorySink {
    fn record(&mut self, entry: HistoryEntry);
}

impl HistorySink for Vec<HistoryEntry> {
    fn record(&mut self, entry: HistoryEntry) {
        self.push(entry);
    }
}

#[derive(Debug, Clone)]
pub struct StyleWorkspace {
    source: String,
    /// Editor text derived from `source` for the current scope.
    source_editor_css: String,
    draft: String,
}

impl StyleWorkspace {
    pub fn new(source: impl Into<String>, scope: Scope<'_>) -> Self {
        let source = source.into();
        let source_editor_css = editor_css_for(&source, scope);
        Self {
            draft: source_editor_css.clone(),
            source_editor_css,
            source,
        }
    }

    /// The full stylesheet.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The text currently in the editor.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Whether the draft differs from what the stylesheet holds for the scope.
    pub fn has_pending_draft(&self) -> bool {
        normalize_css(&self.draft) != normalize_css(&self.source_editor_css)
    }

    /// Editor text for `scope`, derived from the current stylesheet.
    pub fn editor_css(&self, scope: Scope<'_>) -> String {
        editor_css_for(&self.source, scope)
    }

    /// Store a new draft and commit it right away when that is safe.
    ///
    /// In [`Scope::All`] every change commits. In a node scope the draft
    /// commits once it is a balanced rule block whose first selector is
    /// unchanged or still targets the node, or when the draft was cleared.
    /// Anything else waits for [`commit`](Self::commit).
    ///
    /// Returns whether the stylesheet changed.
    pub fn set_draft(&mut self, scope: Scope<'_>, draft: &str, history: &mut impl HistorySink) -> bool {
        self.draft = draft.to_string();

        let node = match scope {
            Scope::All => return self.commit_draft(scope, draft, history),
            Scope::Element(node) => Some(node),
            Scope::None => None,
        };

        if is_rule_block(draft) {
            let signature = first_rule_selector_signature(draft);
            let unchanged = !signature.is_empty()
                && signature == first_rule_selector_signature(&self.source_editor_css);
            let still_targets = node.is_some_and(|node| does_css_target_element(draft, node));

            if unchanged || still_targets {
                return self.commit_draft(scope, draft, history);
            }
        }

        if draft.trim().is_empty() && !self.source_editor_css.trim().is_empty() {
            return self.commit_draft(scope, draft, history);
        }

        tracing::trace!(?scope, "draft held until commit");
        false
    }

    /// Commit the pending draft, e.g. when the editor loses focus.
    pub fn commit(&mut self, scope: Scope<'_>, history: &mut impl HistorySink) -> bool {
        let draft = self.draft.clone();
        self.commit_draft(scope, &draft, history)
    }

    /// Switch the editor to another scope, committing any pending draft
    /// under the scope it was written for first.
    pub fn change_scope(&mut self, previous: Scope<'_>, next: Scope<'_>, history: &mut impl HistorySink) {
        if self.has_pending_draft() {
            let draft = self.draft.clone();
            if let Some(css) = resolve_committed_css(&self.source, &self.source_editor_css, &draft, previous) {
                self.apply_source(css, previous, history);
            }
        }
        self.sync_from_source(next);
    }

    /// Replace the stylesheet from outside the editor (undo, redo, import).
    /// The draft is reset and nothing is recorded.
    pub fn set_source(&mut self, css: impl Into<String>, scope: Scope<'_>) {
        self.source = css.into();
        self.sync_from_source(scope);
    }

    fn commit_draft(&mut self, scope: Scope<'_>, draft: &str, history: &mut impl HistorySink) -> bool {
        match resolve_committed_css(&self.source, &self.source_editor_css, draft, scope) {
            Some(css) => self.apply_source(css, scope, history),
            None => false,
        }
    }

    fn apply_source(&mut self, css: String, scope: Scope<'_>, history: &mut impl HistorySink) -> bool {
        if css == self.source {
            return false;
        }

        tracing::debug!(?scope, before = self.source.len(), after = css.len(), "committing stylesheet edit");
        let before = std::mem::replace(&mut self.source, css);
        history.record(HistoryEntry {
            before,
            after: self.source.clone(),
            coalesce_key: USER_EDIT_COALESCE_KEY,
        });
        self.source_editor_css = editor_css_for(&self.source, scope);
        true
    }

    fn sync_from_source(&mut self, scope: Scope<'_>) {
        self.source_editor_css = editor_css_for(&self.source, scope);
        self.draft = self.source_editor_css.clone();
    }
}

fn editor_css_for(source: &str, scope: Scope<'_>) -> String {
    match scope {
        Scope::All => source.to_string(),
        Scope::Element(node) => get_css_for_element_from_text(source, node),
        Scope::None => String::new(),
    }
}

/// The stylesheet that committing `draft` under `scope` would produce, or
/// `None` when the draft must not be committed or changes nothing.
pub fn resolve_committed_css(
    source: &str,
    source_editor_css: &str,
    draft: &str,
    scope: Scope<'_>,
) -> Option<String> {
    let node = match scope {
        Scope::All => {
            return (normalize_css(draft) != normalize_css(source_editor_css)).then(|| draft.to_string());
        }
        Scope::Element(node) => node,
        Scope::None => return None,
    };

    let options = ReplaceOptions::insert_at(InsertPosition::Start);
    let next = if draft.trim().is_empty() {
        replace_css_for_element_in_text(source, node, "", options)
    } else {
        if !is_rule_block(draft) {
            return None;
        }
        let cleaned = strip_trailing_incomplete_rule(draft);
        if cleaned.is_empty() {
            return None;
        }
        replace_css_for_element_in_text(source, node, cleaned, options)
    };

    (next != source).then_some(next)
}

/// Line endings unified to `\n`, outer whitespace trimmed.
pub fn normalize_css(css: &str) -> String {
    css.replace("\r\n", "\n").trim().to_string()
}

/// Whether `css` contains braces and all of them balance.
pub fn is_rule_block(css: &str) -> bool {
    let trimmed = css.trim();
    if !trimmed.contains('{') || !trimmed.contains('}') {
        return false;
    }

    let mut depth = 0i32;
    for b in trimmed.bytes() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Cut everything after the last top-level `}`, dropping a selector the
/// user started typing but has not opened yet.
pub fn strip_trailing_incomplete_rule(css: &str) -> &str {
    let trimmed = css.trim();
    let mut depth = 0i32;
    let mut last_close = None;

    for (i, b) in trimmed.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    last_close = Some(i);
                }
            }
            _ => {}
        }
    }

    match last_close {
        Some(i) => trimmed[..=i].trim(),
        None => trimmed,
    }
}

/// The first rule's selector list with whitespace normalized, or `""`.
pub fn first_rule_selector_signature(css: &str) -> String {
    let Some((prelude, _)) = css.trim().split_once('{') else {
        return String::new();
    };

    let collapsed = prelude.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(", ")
        .trim()
        .to_string()
}
