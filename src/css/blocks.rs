//! Top-level block parser.
//!
//! Splits a stylesheet into rules, `@media` blocks and opaque at-rules while
//! keeping each block's exact source text, so untouched blocks can be
//! written back byte for byte. Declarations are never decomposed.

use std::ops::Range;

use cssparser::{
    AtRuleParser, CowRcStr, ParseError, Parser, ParserInput, ParserState, QualifiedRuleParser,
    StyleSheetParser, Token,
};
use memchr::memmem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "kebab-case"))]
pub enum BlockKind {
    /// Qualified rule: `selector-list { declarations }`.
    Rule,
    /// `@media <query> { rules }`.
    Media,
    /// Any other at-rule, kept opaque (`@import ...;`, `@font-face {}`, ...).
    AtRule,
    /// Comments after the last block of a level.
    Comment,
}

/// One block of a parsed stylesheet, borrowing the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub kind: BlockKind,
    /// Exact source text, including comments directly in front of the block.
    pub raw: &'a str,
    /// Selector list for rules, query text for `@media`, the text before
    /// `;` or `{` for other at-rules. Empty for comments.
    pub prelude: &'a str,
    /// Inner blocks of an `@media` block: rules, plus opaque at-rules
    /// (a nested `@media` is one of those).
    pub children: Vec<Block<'a>>,
}

impl<'a> Block<'a> {
    pub fn selector(&self) -> Option<&'a str> {
        (self.kind == BlockKind::Rule).then_some(self.prelude)
    }

    pub fn media_query(&self) -> Option<&'a str> {
        (self.kind == BlockKind::Media).then_some(self.prelude)
    }

    /// Rules nested in an `@media` block.
    pub fn inner_rules(&self) -> impl Iterator<Item = &Block<'a>> {
        self.children.iter().filter(|b| b.kind == BlockKind::Rule)
    }

    /// Every selector list in this block: its own, or its inner rules'.
    pub fn selectors(&self) -> Vec<&'a str> {
        match self.kind {
            BlockKind::Rule => vec![self.prelude],
            BlockKind::Media => self.inner_rules().map(|r| r.prelude).collect(),
            BlockKind::AtRule | BlockKind::Comment => Vec::new(),
        }
    }
}

/// Parse a stylesheet into its top-level blocks.
///
/// Never fails: an unterminated trailing construct (missing `}` or `;`) is
/// dropped, and blank input yields no blocks.
pub fn parse_blocks(css: &str) -> Vec<Block<'_>> {
    let text = css.trim();
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parse_level(text, &mut parser, true)
}

/// Render an `@media` wrapper around the given inner block texts.
pub(crate) fn render_media<'a>(query: &str, inner: impl IntoIterator<Item = &'a str>) -> String {
    let body = inner
        .into_iter()
        .map(|raw| format!("  {raw}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("@media {query} {{\n{body}\n}}")
}

/// Parse blocks from the parser's position to the end of its input: the end
/// of the stylesheet, or the `}` of the enclosing `@media`.
///
/// Each block's `raw` runs from the end of the previous block, so comments in
/// between belong to the block that follows them.
fn parse_level<'a>(text: &'a str, input: &mut Parser<'_, '_>, allow_media: bool) -> Vec<Block<'a>> {
    let mut level = LevelParser { text, allow_media };
    let mut rules = StyleSheetParser::new(input, &mut level);
    let mut cursor = rules.input.position().byte_index();
    let mut blocks = Vec::new();

    while let Some(result) = rules.next() {
        let end = rules.input.position().byte_index();
        match result {
            Ok(mut block) => {
                let raw = text[cursor..end].trim_start();
                if !raw.ends_with(['}', ';']) {
                    tracing::trace!(offset = cursor, "dropping unterminated css tail");
                    break;
                }
                block.raw = raw;
                blocks.push(block);
            }
            Err((_, skipped)) => tracing::trace!(skipped, "skipping unparseable css"),
        }
        cursor = end;
    }

    let tail = text[cursor..rules.input.position().byte_index()].trim();
    if !tail.is_empty() && only_comments(tail) {
        blocks.push(Block {
            kind: BlockKind::Comment,
            raw: tail,
            prelude: "",
            children: Vec::new(),
        });
    }

    blocks
}

fn only_comments(mut rest: &str) -> bool {
    while let Some(body) = rest.strip_prefix("/*") {
        match memmem::find(body.as_bytes(), b"*/") {
            Some(close) => rest = body[close + 2..].trim_start(),
            None => return true,
        }
    }
    rest.is_empty()
}

/// Rule parser for one nesting level. Preludes are byte ranges into `text`;
/// `raw` is filled in by [`parse_level`] once the closing token is consumed.
struct LevelParser<'a> {
    text: &'a str,
    allow_media: bool,
}

impl<'a> LevelParser<'a> {
    fn block(&self, kind: BlockKind, prelude: Range<usize>, children: Vec<Block<'a>>) -> Block<'a> {
        Block {
            kind,
            raw: "",
            prelude: self.text[prelude].trim(),
            children,
        }
    }
}

struct AtPrelude {
    media: bool,
    /// Text after the at-keyword, up to `;` or `{`.
    query: Range<usize>,
}

impl<'a, 'i> AtRuleParser<'i> for LevelParser<'a> {
    type Prelude = AtPrelude;
    type AtRule = Block<'a>;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let start = input.position().byte_index();
        while input.next().is_ok() {}
        Ok(AtPrelude {
            media: self.allow_media && name.eq_ignore_ascii_case("media"),
            query: start..input.position().byte_index(),
        })
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        let prelude = start.position().byte_index()..prelude.query.end;
        Ok(self.block(BlockKind::AtRule, prelude, Vec::new()))
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        if prelude.media {
            let children = parse_level(self.text, input, false);
            return Ok(self.block(BlockKind::Media, prelude.query, children));
        }
        let prelude = start.position().byte_index()..prelude.query.end;
        Ok(self.block(BlockKind::AtRule, prelude, Vec::new()))
    }
}

impl<'a, 'i> QualifiedRuleParser<'i> for LevelParser<'a> {
    type Prelude = Range<usize>;
    type QualifiedRule = Block<'a>;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // Unmatched `}` left over from a broken block above.
        loop {
            let state = input.state();
            if !matches!(input.next(), Ok(&Token::CloseCurlyBracket)) {
                input.reset(&state);
                break;
            }
        }

        let start = input.position().byte_index();
        while input.next().is_ok() {}
        let end = input.position().byte_index();
        if self.text[start..end].trim().is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(start..end)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        _input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Ok(self.block(BlockKind::Rule, prelude, Vec::new()))
    }
}
