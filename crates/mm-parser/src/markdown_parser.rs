use mm_core::Vocabulary;

use crate::builder::GraphBuilder;
use crate::{ParseError, ParseResult, grammar};

enum LineState {
    Body,
    Meta,
    Edges {
        opened_at: usize,
        buffer: Vec<(usize, String)>,
    },
}

pub(crate) fn parse_markdown(
    input: &str,
    source: &str,
    vocabulary: &dyn Vocabulary,
) -> Result<ParseResult, ParseError> {
    let mut builder = GraphBuilder::new(source, vocabulary);
    let mut state = LineState::Body;

    for (index, line) in input.lines().enumerate() {
        let line_number = index + 1;

        if let Some(heading) = grammar::parse_heading(line) {
            warn_if_unclosed(&mut builder, &state);
            state = LineState::Body;
            builder.open_node(heading.level, heading.title, heading.id, line_number)?;
            continue;
        }

        match &mut state {
            LineState::Edges { buffer, .. } => {
                if grammar::is_fence_close(line) {
                    let lines = std::mem::take(buffer);
                    builder.add_fence_edges(&lines);
                    state = LineState::Body;
                } else {
                    buffer.push((line_number, line.to_string()));
                }
                continue;
            }
            LineState::Meta => {
                if grammar::is_meta_start(line) {
                    continue;
                }
                let field = grammar::parse_meta_field(line).filter(|_| builder.has_open_node());
                if let Some((key, value)) = field {
                    builder.apply_meta(key, value, line_number);
                    continue;
                }
                // Block ended; fall through and treat the line as body.
                state = LineState::Body;
            }
            LineState::Body => {}
        }

        state = body_line(&mut builder, line, line_number);
    }

    warn_if_unclosed(&mut builder, &state);
    Ok(builder.finish())
}

fn body_line(builder: &mut GraphBuilder<'_>, line: &str, line_number: usize) -> LineState {
    if grammar::is_meta_start(line) {
        return LineState::Meta;
    }
    if grammar::is_edges_fence_open(line) {
        return LineState::Edges {
            opened_at: line_number,
            buffer: Vec::new(),
        };
    }
    builder.push_body_line(line);
    LineState::Body
}

fn warn_if_unclosed(builder: &mut GraphBuilder<'_>, state: &LineState) {
    if let LineState::Edges { opened_at, buffer } = state {
        builder.add_warning(
            format!(
                "Unclosed edges block ({} line(s) discarded)",
                buffer.len()
            ),
            Some(*opened_at),
        );
    }
}
