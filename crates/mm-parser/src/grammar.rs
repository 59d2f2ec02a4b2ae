//! Single-line grammars of the markdown dialect.
//!
//! Each recognizer looks at one source line in isolation; the state machine
//! in `markdown_parser` decides which of them apply.

use chumsky::prelude::*;
use mm_core::find_anchor_links;

type Extra<'a> = extra::Err<Rich<'a, char>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Heading<'a> {
    pub(crate) level: usize,
    pub(crate) title: &'a str,
    pub(crate) id: &'a str,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Chumsky line parsers
// ---------------------------------------------------------------------------

/// `##`..`######`, whitespace, then the rest of the line.
fn heading_parser<'a>() -> impl Parser<'a, &'a str, (usize, &'a str), Extra<'a>> {
    let required_ws = any()
        .filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .to(());

    just('#')
        .repeated()
        .at_least(2)
        .at_most(6)
        .to_slice()
        .map(str::len)
        .then_ignore(required_ws)
        .then(any().repeated().to_slice())
        .then_ignore(end())
}

fn meta_start_parser<'a>() -> impl Parser<'a, &'a str, (), Extra<'a>> {
    let inline_ws = any().filter(|c: &char| c.is_whitespace()).repeated().to(());

    inline_ws
        .ignore_then(just('>'))
        .ignore_then(inline_ws)
        .ignore_then(just("[!meta]"))
        .ignore_then(inline_ws)
        .then_ignore(end())
}

/// `> key: value`
fn meta_field_parser<'a>() -> impl Parser<'a, &'a str, (&'a str, &'a str), Extra<'a>> {
    let inline_ws = any().filter(|c: &char| c.is_whitespace()).repeated().to(());
    let word = any()
        .filter(|c: &char| is_word_char(*c))
        .repeated()
        .at_least(1)
        .to_slice();

    just('>')
        .ignore_then(inline_ws)
        .ignore_then(word)
        .then_ignore(just(':'))
        .then_ignore(inline_ws)
        .then(any().repeated().to_slice())
        .then_ignore(end())
}

fn fence_parser<'a>(opener: &'static str) -> impl Parser<'a, &'a str, (), Extra<'a>> {
    let inline_ws = any().filter(|c: &char| c.is_whitespace()).repeated().to(());

    just(opener).ignore_then(inline_ws).then_ignore(end())
}

/// `type: target, target` inside an edges fence (line already trimmed).
fn fence_line_parser<'a>() -> impl Parser<'a, &'a str, (&'a str, &'a str), Extra<'a>> {
    let inline_ws = any().filter(|c: &char| c.is_whitespace()).repeated().to(());
    let word = any()
        .filter(|c: &char| is_word_char(*c))
        .repeated()
        .at_least(1)
        .to_slice();

    word.then_ignore(just(':'))
        .then_ignore(inline_ws)
        .then(any().repeated().at_least(1).to_slice())
        .then_ignore(end())
}

// ---------------------------------------------------------------------------
// Recognizers
// ---------------------------------------------------------------------------

pub(crate) fn parse_heading(line: &str) -> Option<Heading<'_>> {
    let (level, rest) = heading_parser().parse(line).into_result().ok()?;
    let (title, id) = split_anchor(rest)?;
    Some(Heading { level, title, id })
}

/// Split `Title text {#c-id}` into the title and the trailing anchor id.
fn split_anchor(rest: &str) -> Option<(&str, &str)> {
    let body = rest.trim_end().strip_suffix('}')?;
    let open = body.rfind("{#")?;
    let id = &body[open + 2..];
    let title = body[..open].trim();
    (mm_core::is_anchor_id(id) && !title.is_empty()).then_some((title, id))
}

pub(crate) fn is_meta_start(line: &str) -> bool {
    meta_start_parser().parse(line).into_result().is_ok()
}

pub(crate) fn parse_meta_field(line: &str) -> Option<(&str, &str)> {
    let (key, value) = meta_field_parser().parse(line).into_result().ok()?;
    Some((key, value.trim()))
}

pub(crate) fn is_edges_fence_open(line: &str) -> bool {
    fence_parser("```edges").parse(line).into_result().is_ok()
}

pub(crate) fn is_fence_close(line: &str) -> bool {
    fence_parser("```").parse(line).into_result().is_ok()
}

pub(crate) fn parse_fence_line(trimmed: &str) -> Option<(&str, &str)> {
    let (edge_type, targets) = fence_line_parser().parse(trimmed).into_result().ok()?;
    Some((edge_type, targets.trim()))
}

/// Targets of every `[text](#c-id)` link in `line`, left to right.
pub(crate) fn inline_link_targets(line: &str) -> Vec<&str> {
    find_anchor_links(line)
        .into_iter()
        .map(|link| link.target)
        .collect()
}
