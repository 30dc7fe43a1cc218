//! Benchmarks for per-keystroke fragment operations.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use stylescope::css::{
    ReplaceOptions, does_css_target_element, get_css_for_element_from_text, parse_blocks,
    replace_css_for_element_in_text,
};
use stylescope::dom::Document;

const THEME_CSS: &str = include_str!("../tests/fixtures/theme.css");
const LOGIN_HTML: &str = include_str!("../tests/fixtures/login.html");

/// A theme-sized stylesheet: the fixture followed by many unrelated rules.
fn large_stylesheet() -> String {
    let mut css = String::from(THEME_CSS.trim());
    for i in 0..2000 {
        css.push_str(&format!(
            "\n\n.generated-{i} > .child-{i}:hover {{\n  color: #{:06x};\n  margin: {}px;\n}}",
            i * 97,
            i % 32
        ));
        if i % 200 == 0 {
            css.push_str(&format!(
                "\n\n@media (min-width: {}px) {{\n  .generated-{i} {{\n    display: none;\n  }}\n}}",
                320 + i
            ));
        }
    }
    css
}

fn bench_parse(c: &mut Criterion) {
    let css = large_stylesheet();

    c.bench_function("parse_blocks", |b| b.iter(|| parse_blocks(black_box(&css))));
}

fn bench_keystroke(c: &mut Criterion) {
    let css = large_stylesheet();
    let doc = Document::parse_html(LOGIN_HTML);
    let login = doc.select("#kc-login").unwrap();
    let draft = "#kc-login {\n  background-color: #16a34a;\n}";

    let mut group = c.benchmark_group("keystroke");
    group.bench_function("extract", |b| {
        b.iter(|| get_css_for_element_from_text(black_box(&css), &login))
    });
    group.bench_function("replace", |b| {
        b.iter(|| {
            replace_css_for_element_in_text(
                black_box(&css),
                &login,
                black_box(draft),
                ReplaceOptions::default(),
            )
        })
    });
    group.bench_function("targets", |b| {
        b.iter(|| does_css_target_element(black_box(draft), &login))
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_keystroke);
criterion_main!(benches);
