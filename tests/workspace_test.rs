//! Editor sessions driven through the workspace.

use stylescope::dom::Document;
use stylescope::workspace::{HistoryEntry, Scope, StyleWorkspace, USER_EDIT_COALESCE_KEY};

const THEME_CSS: &str = include_str!("fixtures/theme.css");
const LOGIN_HTML: &str = include_str!("fixtures/login.html");

#[test]
fn test_typing_session_records_one_entry_per_effective_change() {
    let doc = Document::parse_html(LOGIN_HTML);
    let login = doc.select("#kc-login").unwrap();
    let scope = Scope::Element(&login);
    let mut workspace = StyleWorkspace::new(THEME_CSS, scope);
    let mut history: Vec<HistoryEntry> = Vec::new();

    assert!(workspace.draft().starts_with("#kc-login {\n  background-color: #2563eb;\n}"));

    for step in [
        "#kc-login {\n  background-color: #16\n}",
        "#kc-login {\n  background-color: #16a34a\n}",
        "#kc-login {\n  background-color: #16a34a;\n  bor",
        "#kc-login {\n  background-color: #16a34a;\n  border: none;\n}",
    ] {
        workspace.set_draft(scope, step, &mut history);
    }

    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|e| e.coalesce_key == USER_EDIT_COALESCE_KEY));
    assert_eq!(history[0].before, THEME_CSS);
    for pair in history.windows(2) {
        assert_eq!(pair[0].after, pair[1].before);
    }

    let source = workspace.source();
    assert!(source.contains("#kc-login {\n  background-color: #16a34a;\n  border: none;\n}"));
    assert_eq!(source.matches("#kc-login {").count(), 1);
    assert!(source.contains("#kc-header-wrapper {\n    font-size: 18px;\n  }"));
}

#[test]
fn test_switching_to_all_styles_shows_committed_source() {
    let doc = Document::parse_html(LOGIN_HTML);
    let header = doc.select("#kc-header-wrapper").unwrap();
    let scope = Scope::Element(&header);
    let mut workspace = StyleWorkspace::new(THEME_CSS, scope);
    let mut history: Vec<HistoryEntry> = Vec::new();

    workspace.set_draft(scope, ".brand-title {\n  font-size: 24px;\n}", &mut history);
    assert!(history.is_empty());

    workspace.change_scope(scope, Scope::All, &mut history);
    assert_eq!(history.len(), 1);
    assert_eq!(workspace.draft(), workspace.source());
    assert!(workspace.source().contains(".brand-title {\n  font-size: 24px;\n}"));
    assert!(!workspace.source().contains("#kc-header-wrapper"));
}

#[test]
fn test_undo_restores_editor_text() {
    let doc = Document::parse_html(LOGIN_HTML);
    let username = doc.select("#username").unwrap();
    let scope = Scope::Element(&username);
    let mut workspace = StyleWorkspace::new(THEME_CSS, scope);
    let mut history: Vec<HistoryEntry> = Vec::new();
    let original_draft = workspace.draft().to_string();

    assert!(workspace.set_draft(scope, "", &mut history));
    assert_eq!(workspace.editor_css(scope), "");

    let entry = history.pop().expect("deletion recorded");
    workspace.set_source(entry.before, scope);
    assert_eq!(workspace.draft(), original_draft);
    assert!(history.is_empty());
}
