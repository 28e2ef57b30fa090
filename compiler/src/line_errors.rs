//! The lexical diagnostic engine.
//!
//! Given one block line from the nester, this turns every lexical defect
//! attached to its tokens into a human-readable diagnostic: the physical
//! source line(s) are rendered printable (escaping invalid encodings,
//! control characters, combining marks and surrogates), co-located defects
//! on the same line are folded into a single report with one highlight per
//! occurrence, and carriers whose defects were folded elsewhere are tainted
//! so they stay silent for the rest of the pass.
//!
//! The engine never fails: every input condition either becomes a
//! diagnostic or is ignored.

use smallvec::SmallVec;

use crate::reporting::{
    Code, Context, Diagnostic, Document, DocumentNode, Explanation, Highlight, Paragraph,
    SourceCodeBlock, TextSpan,
};
use crate::strings::{decode_utf8, CodePoint, DecodedItem, Rope, View};
use crate::tokens::{
    BlockLine, CommentLiteral, IdentifierLiteral, Insignificant, InvalidEncoding, Line,
    LineElement, NewLineIndentation, NewlineError, NumberError, NumberLiteral, OperatorError,
    OperatorLiteral, StringErrorKind, StringLiteral, Token, UnexpectedCharacter,
};

type ViewMarkers<'a> = SmallVec<[View<'a>; 4]>;

/// Report every lexical defect of `line`, in source order, to `ctx`.
///
/// Calling this twice on the same block line reports nothing the second
/// time: every carrier that contributed to a diagnostic is tainted.
pub fn report_line_errors<C: Context>(line: &BlockLine<'_>, ctx: &mut C) {
    line.for_each(|element| match element {
        LineElement::Insignificant(insignificant) => match insignificant {
            Insignificant::NewLineIndentation(newline) => report_newline(line, newline, ctx),
            Insignificant::CommentLiteral(comment) => report_comment(line, comment, ctx),
            Insignificant::InvalidEncoding(encoding) => {
                report_invalid_encoding(line, encoding, ctx)
            }
            Insignificant::UnexpectedCharacter(unexpected) => {
                report_unexpected_character(line, unexpected, ctx)
            }
            _ => {}
        },
        LineElement::Token(token) => match token {
            Token::StringLiteral(literal) => report_string_literal(line, literal, ctx),
            Token::NumberLiteral(literal) => report_number_literal(line, literal, ctx),
            Token::IdentifierLiteral(identifier) => report_identifier(line, identifier, ctx),
            Token::OperatorLiteral(literal) => report_operator_literal(line, literal, ctx),
            _ => {}
        },
    });
}

/// The smallest view covering every token and insignificant of the line.
/// Empty when the line is empty.
pub fn block_line_extent<'a>(line: &BlockLine<'a>) -> View<'a> {
    let mut bounds: Option<(usize, usize)> = None;
    let mut include = |input: View<'a>| {
        let begin = input.offset_in(line.source);
        let end = begin + input.byte_count();
        bounds = Some(match bounds {
            Some((b, e)) => (b.min(begin), e.max(end)),
            None => (begin, end),
        });
    };
    if let Some(first) = line.tokens.first() {
        include(first.input());
    }
    if let Some(last) = line.tokens.last() {
        include(last.input());
    }
    if let Some(first) = line.insignificants.first() {
        include(first.input());
    }
    if let Some(last) = line.insignificants.last() {
        include(last.input());
    }
    match bounds {
        Some((begin, end)) => line.source.subview(begin..end),
        None => line.source.subview(0..0),
    }
}

/// Widen `view` to the enclosing physical line boundaries, but never beyond
/// the block line's own extent.
pub fn expand_to_physical_line<'a>(line: &BlockLine<'a>, view: View<'a>) -> View<'a> {
    let all = block_line_extent(line);
    debug_assert!(view.is_part_of(all));
    let bytes = all.as_bytes();
    let mut begin = view.offset_in(all);
    let mut end = begin + view.byte_count();
    while begin > 0 && bytes[begin - 1] != b'\r' && bytes[begin - 1] != b'\n' {
        begin -= 1;
    }
    while end < bytes.len() && bytes[end] != b'\r' && bytes[end] != b'\n' {
        end += 1;
    }
    all.subview(begin..end)
}

/// A printable rendering of a source view together with the spans the given
/// markers occupy inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EscapedMarkers {
    pub text: String,
    pub spans: Vec<TextSpan>,
}

/// Render `view` as a printable line, tracking where each marker lands.
///
/// Invalid encodings, control characters, combining marks, noncharacters
/// and surrogates are replaced by backslash escapes; backslashes are
/// doubled. Span positions advance by one per untouched code point but by
/// the full rendered length of an escape, so they address columns of the
/// rendered text rather than bytes of the original. When nothing needed
/// escaping and no line break was crossed, the view is returned verbatim
/// and the spans are plain byte offsets.
pub fn escape_source_line(view: View<'_>, markers: &[View<'_>]) -> EscapedMarkers {
    let ranges: Vec<(usize, usize)> = markers
        .iter()
        .map(|marker| {
            debug_assert!(marker.is_part_of(view));
            let begin = marker.offset_in(view);
            (begin, begin + marker.byte_count())
        })
        .collect();
    let mut spans = vec![TextSpan::UNSET; markers.len()];

    let update_markers = |spans: &mut [TextSpan], position: usize, offset: i32| {
        for (&(marker_begin, marker_end), span) in ranges.iter().zip(spans.iter_mut()) {
            if marker_begin <= position && span.start == -1 {
                span.start = offset;
            }
            if marker_end <= position && span.length == -1 {
                span.length = offset - span.start;
            }
        }
    };

    let mut output = Rope::new();
    let mut begin = 0usize;
    let mut offset = 0i32;
    let mut requires_escapes = false;
    let mut saw_newline = false;

    for item in decode_utf8(view) {
        let item_begin = item.input().offset_in(view);
        update_markers(&mut spans, item_begin, offset);
        match item {
            DecodedItem::CodePoint { input, code_point } => {
                if code_point.is_combining_mark()
                    || code_point.is_control()
                    || code_point.is_non_character()
                    || code_point.is_surrogate()
                {
                    push_escaped(
                        view,
                        input,
                        &mut output,
                        &mut begin,
                        &mut offset,
                        &mut requires_escapes,
                        &mut saw_newline,
                    );
                } else if code_point == CodePoint::from('\\') {
                    // double the backslash; this alone does not force the
                    // escaped rendering
                    let end = item_begin + input.byte_count();
                    output.push_view(view.subview(begin..end));
                    output.push_code_point(code_point);
                    begin = end;
                    offset += 2;
                } else {
                    offset += 1;
                }
            }
            DecodedItem::Error { input } => {
                push_escaped(
                    view,
                    input,
                    &mut output,
                    &mut begin,
                    &mut offset,
                    &mut requires_escapes,
                    &mut saw_newline,
                );
            }
        }
    }
    output.push_view(view.subview(begin..view.byte_count()));
    update_markers(&mut spans, view.byte_count(), offset);

    if !requires_escapes && !saw_newline {
        for (&(marker_begin, marker_end), span) in ranges.iter().zip(spans.iter_mut()) {
            span.start = marker_begin as i32;
            span.length = (marker_end - marker_begin) as i32;
        }
        return EscapedMarkers {
            text: view.to_string_lossy(),
            spans,
        };
    }

    EscapedMarkers {
        text: output.into_string(),
        spans,
    }
}

fn push_escaped<'a>(
    view: View<'a>,
    input: View<'a>,
    output: &mut Rope<'a>,
    begin: &mut usize,
    offset: &mut i32,
    requires_escapes: &mut bool,
    saw_newline: &mut bool,
) {
    let item_begin = input.offset_in(view);
    output.push_view(view.subview(*begin..item_begin));
    let escape = escaped_form(input.as_bytes());
    if input.as_bytes() == b"\n" {
        *saw_newline = true;
    } else {
        *requires_escapes = true;
    }
    *offset += escape.len() as i32;
    output.push_string(escape);
    *begin = item_begin + input.byte_count();
}

fn escaped_form(bytes: &[u8]) -> String {
    if let [byte] = bytes {
        match byte {
            0x0A => "\\n\n".to_owned(),
            0x0D => "\\r".to_owned(),
            0x09 => "\\t".to_owned(),
            0x00 => "\\0".to_owned(),
            _ => format!("\\[{byte:x}]"),
        }
    } else {
        let mut text = String::from("\\[");
        for byte in bytes {
            text.push_str(&format!("{byte:02x}"));
        }
        text.push(']');
        text
    }
}

/// Sweep the line for decode-error carriers co-located with `token_lines`
/// and fold their markers into `markers`, tainting every carrier other than
/// the one currently reporting (identified by its input view).
fn collect_decode_error_markers<'a>(
    markers: &mut ViewMarkers<'a>,
    line: &BlockLine<'a>,
    token_lines: View<'a>,
    reporter: View<'a>,
) {
    line.for_each(|element| match element {
        LineElement::Insignificant(Insignificant::InvalidEncoding(encoding)) => {
            if encoding.is_tainted.get() || !encoding.input.is_part_of(token_lines) {
                return;
            }
            markers.push(encoding.input);
            if !encoding.input.ptr_eq(reporter) {
                encoding.is_tainted.set(true);
            }
        }
        LineElement::Insignificant(Insignificant::CommentLiteral(comment)) => {
            if comment.is_tainted.get() || !comment.input.is_part_of(token_lines) {
                return;
            }
            markers.extend(comment.decode_errors.iter().map(|error| error.input));
            if !comment.input.ptr_eq(reporter) {
                comment.is_tainted.set(true);
            }
        }
        LineElement::Token(Token::IdentifierLiteral(identifier)) => {
            if identifier.is_tainted.get() || !identifier.input.is_part_of(token_lines) {
                return;
            }
            markers.extend(identifier.decode_errors.iter().map(|error| error.input));
            if !identifier.input.ptr_eq(reporter) {
                identifier.is_tainted.set(true);
            }
        }
        LineElement::Insignificant(Insignificant::NewLineIndentation(newline)) => {
            if newline.is_tainted.get() || !newline.input.is_part_of(token_lines) {
                return;
            }
            // only steal from a newline whose defects are decode errors and
            // nothing else
            if newline
                .value
                .errors
                .iter()
                .any(|error| !matches!(error, NewlineError::DecodedErrorPosition(_)))
            {
                return;
            }
            markers.extend(newline.value.errors.iter().map(NewlineError::input));
            if !newline.input.ptr_eq(reporter) {
                newline.is_tainted.set(true);
            }
        }
        _ => {}
    });
}

fn report_decode_error_markers<C: Context>(
    origin_line: Line,
    token_lines: View<'_>,
    markers: &[View<'_>],
    ctx: &mut C,
) {
    let paragraph = if markers.len() == 1 {
        "The UTF8-decoder encountered an invalid encoding"
    } else {
        "The UTF8-decoder encountered multiple invalid encodings"
    };
    let escaped = escape_source_line(token_lines, markers);
    report_with_source(ctx, 1, "Invalid UTF8 Encoding", paragraph, escaped, origin_line);
}

fn report_decode_errors<'a, C: Context>(
    line: &BlockLine<'a>,
    input: View<'a>,
    origin_line: Line,
    ctx: &mut C,
) {
    let token_lines = expand_to_physical_line(line, input);
    let mut markers = ViewMarkers::new();
    collect_decode_error_markers(&mut markers, line, token_lines, input);
    report_decode_error_markers(origin_line, token_lines, &markers, ctx);
}

fn report_identifier<'a, C: Context>(
    line: &BlockLine<'a>,
    identifier: &IdentifierLiteral<'a>,
    ctx: &mut C,
) {
    if identifier.is_tainted.get() || identifier.decode_errors.is_empty() {
        return;
    }
    report_decode_errors(line, identifier.input, identifier.position.line, ctx);
    identifier.is_tainted.set(true);
}

fn report_comment<'a, C: Context>(
    line: &BlockLine<'a>,
    comment: &CommentLiteral<'a>,
    ctx: &mut C,
) {
    if comment.is_tainted.get() || comment.decode_errors.is_empty() {
        return;
    }
    report_decode_errors(line, comment.input, comment.position.line, ctx);
    comment.is_tainted.set(true);
}

fn report_invalid_encoding<'a, C: Context>(
    line: &BlockLine<'a>,
    encoding: &InvalidEncoding<'a>,
    ctx: &mut C,
) {
    if encoding.is_tainted.get() {
        return;
    }
    report_decode_errors(line, encoding.input, encoding.position.line, ctx);
    encoding.is_tainted.set(true);
}

fn report_newline<'a, C: Context>(
    line: &BlockLine<'a>,
    newline: &NewLineIndentation<'a>,
    ctx: &mut C,
) {
    if newline.is_tainted.get() || !newline.value.has_errors() {
        return;
    }

    let token_lines = expand_to_physical_line(line, newline.input);

    // Decode errors report against the line this newline terminates.
    let mut markers: ViewMarkers = newline
        .value
        .errors
        .iter()
        .filter_map(|error| match error {
            NewlineError::DecodedErrorPosition(error) => Some(error.input),
            NewlineError::MixedIndentCharacter(_) => None,
        })
        .collect();
    if !markers.is_empty() {
        if markers.len() == newline.value.errors.len() {
            // All errors are decode errors: the sweep below re-collects
            // them, keeping dedup symmetric with sibling carriers.
            markers.clear();
        }
        collect_decode_error_markers(&mut markers, line, token_lines, newline.input);
        report_decode_error_markers(
            newline.position.line.preceding(),
            token_lines,
            &markers,
            ctx,
        );
    }

    let mut markers: ViewMarkers = newline
        .value
        .errors
        .iter()
        .filter_map(|error| match error {
            NewlineError::MixedIndentCharacter(error) => Some(error.input),
            NewlineError::DecodedErrorPosition(_) => None,
        })
        .collect();
    if !markers.is_empty() {
        for insignificant in &line.insignificants {
            let Insignificant::NewLineIndentation(other) = insignificant else {
                continue;
            };
            if other.input.ptr_eq(newline.input) {
                continue; // own markers are already collected
            }
            if other.is_tainted.get() || !other.input.is_part_of(token_lines) {
                continue;
            }
            if other
                .value
                .errors
                .iter()
                .any(|error| !matches!(error, NewlineError::MixedIndentCharacter(_)))
            {
                continue;
            }
            markers.extend(other.value.errors.iter().map(NewlineError::input));
            other.is_tainted.set(true);
        }

        let escaped = escape_source_line(token_lines, &markers);
        report_with_source(
            ctx,
            3,
            "Mixed Indentation Characters",
            "The indentation mixes tabs and spaces.",
            escaped,
            newline.position.line.preceding(),
        );
    }

    newline.is_tainted.set(true);
}

fn report_unexpected_character<'a, C: Context>(
    line: &BlockLine<'a>,
    unexpected: &UnexpectedCharacter<'a>,
    ctx: &mut C,
) {
    if unexpected.is_tainted.get() {
        return;
    }

    let token_lines = expand_to_physical_line(line, unexpected.input);

    let mut markers = ViewMarkers::new();
    for insignificant in &line.insignificants {
        let Insignificant::UnexpectedCharacter(other) = insignificant else {
            continue;
        };
        if !other.input.is_part_of(token_lines) {
            continue;
        }
        markers.push(other.input);
        if !other.input.ptr_eq(unexpected.input) {
            other.is_tainted.set(true);
        }
    }

    let paragraph = if markers.len() == 1 {
        "The tokenizer encountered a character that is not part of any Rebuild language token."
    } else {
        "The tokenizer encountered multiple characters that are not part of any Rebuild language token."
    };
    let escaped = escape_source_line(token_lines, &markers);
    report_with_source(
        ctx,
        2,
        "Unexpected characters",
        paragraph,
        escaped,
        unexpected.position.line,
    );
    unexpected.is_tainted.set(true);
}

fn report_string_literal<'a, C: Context>(
    line: &BlockLine<'a>,
    literal: &StringLiteral<'a>,
    ctx: &mut C,
) {
    if literal.is_tainted.get() || !literal.value.has_errors() {
        return;
    }

    let token_lines = expand_to_physical_line(line, literal.input);

    let mut reported_kinds = 0u8;
    for error in &literal.value.errors {
        let kind_bit = 1u8 << (error.kind as u8);
        if reported_kinds & kind_bit != 0 {
            continue;
        }
        reported_kinds |= kind_bit;

        let markers: ViewMarkers = literal
            .value
            .errors
            .iter()
            .filter(|other| other.kind == error.kind)
            .map(|other| other.input)
            .collect();

        let (number, heading, paragraph) = match error.kind {
            StringErrorKind::InvalidEncoding => {
                // Rendered through the shared decode-error block, but with
                // the string's own markers only; sibling carriers keep
                // their own reports.
                report_decode_error_markers(literal.position.line, token_lines, &markers, ctx);
                continue;
            }
            StringErrorKind::EndOfInput => {
                (10, "Unexpected end of input", "The string was not terminated.")
            }
            StringErrorKind::InvalidEscape => (
                11,
                "Unkown escape sequence",
                "These Escape sequences are unknown.",
            ),
            StringErrorKind::InvalidControl => (
                12,
                "Unkown control characters",
                "Use of invalid control characters. Use escape sequences.",
            ),
            StringErrorKind::InvalidDecimalUnicode => (
                13,
                "Invalid decimal unicode",
                "Use of invalid decimal unicode values.",
            ),
            StringErrorKind::InvalidHexUnicode => (
                14,
                "Invalid hexadecimal unicode",
                "Use of invalid hexadecimal unicode values.",
            ),
        };
        let escaped = escape_source_line(token_lines, &markers);
        report_with_source(ctx, number, heading, paragraph, escaped, literal.position.line);
    }

    literal.is_tainted.set(true);
}

fn report_number_literal<'a, C: Context>(
    line: &BlockLine<'a>,
    literal: &NumberLiteral<'a>,
    ctx: &mut C,
) {
    if literal.is_tainted.get() || !literal.value.has_errors() {
        return;
    }

    let token_lines = expand_to_physical_line(line, literal.input);

    let mut reported_kinds = 0u8;
    for error in &literal.value.errors {
        let kind_bit = 1u8 << error.kind_index();
        if reported_kinds & kind_bit != 0 {
            continue;
        }
        reported_kinds |= kind_bit;

        let markers: ViewMarkers = literal
            .value
            .errors
            .iter()
            .filter(|other| other.kind_index() == error.kind_index())
            .map(NumberError::input)
            .collect();

        let (number, heading, paragraph) = match error {
            NumberError::DecodedErrorPosition(_) => {
                report_decode_error_markers(literal.position.line, token_lines, &markers, ctx);
                continue;
            }
            NumberError::MissingExponent { .. } => (
                20,
                "Missing exponent value",
                "After the exponent sign an actual value is expected.",
            ),
            NumberError::MissingValue { .. } => (
                21,
                "Missing value",
                "After the radix sign an actual value is expected.",
            ),
            NumberError::MissingBoundary { .. } => (
                22,
                "Missing boundary",
                "The number literal ends with an unknown suffix.",
            ),
        };
        let escaped = escape_source_line(token_lines, &markers);
        report_with_source(ctx, number, heading, paragraph, escaped, literal.position.line);
    }

    literal.is_tainted.set(true);
}

fn report_operator_literal<'a, C: Context>(
    line: &BlockLine<'a>,
    literal: &OperatorLiteral<'a>,
    ctx: &mut C,
) {
    if literal.is_tainted.get() || !literal.value.has_errors() {
        return;
    }

    let token_lines = expand_to_physical_line(line, literal.input);

    let mut reported_kinds = 0u8;
    for error in &literal.value.errors {
        let kind_bit = 1u8 << error.kind_index();
        if reported_kinds & kind_bit != 0 {
            continue;
        }
        reported_kinds |= kind_bit;

        let markers: ViewMarkers = literal
            .value
            .errors
            .iter()
            .filter(|other| other.kind_index() == error.kind_index())
            .map(OperatorError::input)
            .collect();

        let (number, heading, paragraph) = match error {
            OperatorError::DecodedErrorPosition(_) => {
                report_decode_error_markers(literal.position.line, token_lines, &markers, ctx);
                continue;
            }
            OperatorError::WrongClose { .. } => (
                30,
                "Operator wrong close",
                "The closing sign does not match the opening sign.",
            ),
            OperatorError::UnexpectedClose { .. } => (
                31,
                "Operator unexpected close",
                "There was no opening sign before the closing sign.",
            ),
            OperatorError::NotClosed { .. } => (
                32,
                "Operator not closed",
                "The operator ends before the closing sign was found.",
            ),
        };
        let escaped = escape_source_line(token_lines, &markers);
        report_with_source(ctx, number, heading, paragraph, escaped, literal.position.line);
    }

    literal.is_tainted.set(true);
}

fn report_with_source<C: Context>(
    ctx: &mut C,
    number: u16,
    heading: &str,
    paragraph: &str,
    escaped: EscapedMarkers,
    origin_line: Line,
) {
    let EscapedMarkers { text, spans } = escaped;
    let highlights = spans.into_iter().map(Highlight::bare).collect();
    let document = Document {
        nodes: vec![
            DocumentNode::Paragraph(Paragraph {
                text: paragraph.to_owned(),
            }),
            DocumentNode::SourceCodeBlock(SourceCodeBlock {
                text,
                highlights,
                caption: String::new(),
                origin_line,
            }),
        ],
    };
    ctx.report_diagnostic(Diagnostic {
        code: Code::lexer(number),
        parts: vec![Explanation {
            heading: heading.to_owned(),
            document,
        }],
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::build::BlockLineBuilder;
    use crate::tokens::{Position, TagToken};

    fn span(start: i32, length: i32) -> TextSpan {
        TextSpan { start, length }
    }

    #[test]
    fn extent_covers_tokens_and_insignificants() {
        let source = View::new(b"  a b  ");
        let line = BlockLineBuilder::new(source)
            .token(Token::IdentifierLiteral(IdentifierLiteral::new(
                source.subview(2..3),
                Position::new(1, 3),
            )))
            .insignificant(Insignificant::WhiteSpaceSeparator(TagToken::new(
                source.subview(3..4),
                Position::new(1, 4),
            )))
            .token(Token::IdentifierLiteral(IdentifierLiteral::new(
                source.subview(4..5),
                Position::new(1, 5),
            )))
            .build();

        let extent = block_line_extent(&line);
        assert_eq!(extent.offset_in(source), 2);
        assert_eq!(extent.as_bytes(), b"a b");
    }

    #[test]
    fn extent_of_empty_line_is_empty() {
        let source = View::new(b"abc");
        let line = BlockLineBuilder::new(source).build();
        assert!(block_line_extent(&line).is_empty());
    }

    #[test]
    fn expansion_stops_at_line_breaks_and_extent() {
        let source = View::new(b"ab\ncd\nef");
        let line = BlockLineBuilder::new(source)
            .insignificant(Insignificant::NewLineIndentation(NewLineIndentation::new(
                source.subview(2..3),
                Position::new(2, 1),
                Default::default(),
            )))
            .token(Token::IdentifierLiteral(IdentifierLiteral::new(
                source.subview(3..5),
                Position::new(2, 1),
            )))
            .insignificant(Insignificant::NewLineIndentation(NewLineIndentation::new(
                source.subview(5..6),
                Position::new(3, 1),
                Default::default(),
            )))
            .build();

        let expanded = expand_to_physical_line(&line, source.subview(4..5));
        assert_eq!(expanded.as_bytes(), b"cd");
    }

    #[test]
    fn escapes_single_invalid_byte_with_column_spans() {
        let source = View::new(b"ab\xFFcd");
        let view = source.subview(0..5);
        let escaped = escape_source_line(view, &[view.subview(2..3)]);
        assert_eq!(escaped.text, "ab\\[ff]cd");
        assert_eq!(escaped.spans, vec![span(2, 5)]);
    }

    #[test]
    fn fast_path_returns_view_verbatim() {
        let source = View::new(b"plain text");
        let view = source.subview(0..10);
        let escaped = escape_source_line(view, &[view.subview(6..10)]);
        assert_eq!(escaped.text, "plain text");
        assert_eq!(escaped.spans, vec![span(6, 4)]);
    }

    #[test]
    fn tab_escapes_and_span_covers_rendered_text() {
        let source = View::new(b"a\tb");
        let view = source.subview(0..3);
        let escaped = escape_source_line(view, &[view]);
        assert_eq!(escaped.text, "a\\tb");
        assert_eq!(escaped.spans, vec![span(0, 4)]);
    }

    #[test]
    fn backslash_doubling_alone_keeps_fast_path() {
        let source = View::new(b"a\\b");
        let view = source.subview(0..3);
        let escaped = escape_source_line(view, &[view.subview(1..2)]);
        assert_eq!(escaped.text, "a\\b");
        assert_eq!(escaped.spans, vec![span(1, 1)]);
    }

    #[test]
    fn backslash_doubles_once_escaping_is_forced() {
        let source = View::new(b"a\\b\t");
        let view = source.subview(0..4);
        let escaped = escape_source_line(view, &[]);
        assert_eq!(escaped.text, "a\\\\b\\t");
    }

    #[test]
    fn line_feed_forces_escaped_rendering() {
        let source = View::new(b"ab\ncd");
        let view = source.subview(0..5);
        let escaped = escape_source_line(view, &[view.subview(3..4)]);
        assert_eq!(escaped.text, "ab\\n\ncd");
        // after "ab" (2 columns) the LF escape is 3 bytes, then "c" starts
        assert_eq!(escaped.spans, vec![span(5, 1)]);
    }

    #[test]
    fn control_carriage_return_and_nul_escapes() {
        let source = View::new(b"\rx\x00");
        let view = source.subview(0..3);
        let escaped = escape_source_line(view, &[]);
        assert_eq!(escaped.text, "\\rx\\0");
    }

    #[test]
    fn combining_mark_is_escaped_as_its_bytes() {
        // "e" followed by U+0300 (combining grave accent, CC 80)
        let source = View::new(b"e\xCC\x80f");
        let view = source.subview(0..4);
        let escaped = escape_source_line(view, &[view.subview(1..3)]);
        assert_eq!(escaped.text, "e\\[cc80]f");
        assert_eq!(escaped.spans, vec![span(1, 7)]);
    }

    #[test]
    fn truncated_sequence_escapes_present_bytes() {
        let source = View::new(b"a\xE0\x80z");
        let view = source.subview(0..4);
        let escaped = escape_source_line(view, &[view.subview(1..3)]);
        assert_eq!(escaped.text, "a\\[e080]z");
        assert_eq!(escaped.spans, vec![span(1, 7)]);
    }

    #[test]
    fn marker_at_view_end_resolves() {
        let source = View::new(b"abc");
        let view = source.subview(0..3);
        let escaped = escape_source_line(view, &[view.subview(3..3)]);
        assert_eq!(escaped.spans, vec![span(3, 0)]);
    }
}
