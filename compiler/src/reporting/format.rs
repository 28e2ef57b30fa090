//! Text rendering of diagnostics.
//!
//! Source code blocks arrive pre-escaped with spans into the rendered text,
//! so the block text itself is handed to ariadne as the source to annotate.
//! Colour is an opt-in switch; default rendering stays plain.

use std::io;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::reporting::{Diagnostic, DocumentNode, SourceCodeBlock};

pub(crate) fn write_diagnostic(
    diagnostic: &Diagnostic,
    out: &mut impl io::Write,
    colourful: bool,
) -> io::Result<()> {
    for part in &diagnostic.parts {
        for node in &part.document.nodes {
            match node {
                DocumentNode::Paragraph(paragraph) => writeln!(out, "{}", paragraph.text)?,
                DocumentNode::SourceCodeBlock(block) => {
                    write_source_block(diagnostic, &part.heading, block, out, colourful)?;
                }
            }
        }
    }
    Ok(())
}

fn write_source_block(
    diagnostic: &Diagnostic,
    heading: &str,
    block: &SourceCodeBlock,
    out: &mut impl io::Write,
    colourful: bool,
) -> io::Result<()> {
    let id = diagnostic.code.category.clone();
    let offset = block
        .highlights
        .iter()
        .map(|highlight| highlight.span.start.max(0) as usize)
        .min()
        .unwrap_or(0);

    let mut report = Report::build(ReportKind::Error, id.clone(), offset)
        .with_config(Config::default().with_color(colourful))
        .with_message(format!(
            "[{}-{}] {}",
            diagnostic.code.category, diagnostic.code.number, heading
        ));

    for highlight in &block.highlights {
        let start = highlight.span.start.max(0) as usize;
        let end = start + highlight.span.length.max(0) as usize;
        let mut label = Label::new((id.clone(), start..end));
        for annotation in &highlight.annotations {
            label = label.with_message(annotation);
        }
        if colourful {
            label = label.with_color(Color::Red);
        }
        report = report.with_label(label);
    }

    let note = if block.caption.is_empty() {
        format!("source from line {}", block.origin_line.0)
    } else {
        format!("{} (line {})", block.caption, block.origin_line.0)
    };
    report = report.with_note(note);

    report
        .finish()
        .write((id, Source::from(block.text.as_str())), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::{
        Code, Document, Explanation, Highlight, Paragraph, TextSpan,
    };
    use crate::tokens::Line;

    #[test]
    fn renders_heading_paragraph_and_excerpt() {
        let diagnostic = Diagnostic {
            code: Code::lexer(1),
            parts: vec![Explanation {
                heading: "Invalid UTF8 Encoding".to_owned(),
                document: Document {
                    nodes: vec![
                        DocumentNode::Paragraph(Paragraph {
                            text: "The UTF8-decoder encountered an invalid encoding".to_owned(),
                        }),
                        DocumentNode::SourceCodeBlock(SourceCodeBlock {
                            text: "ab\\[ff]cd".to_owned(),
                            highlights: vec![Highlight::bare(TextSpan {
                                start: 2,
                                length: 5,
                            })],
                            caption: String::new(),
                            origin_line: Line(3),
                        }),
                    ],
                },
            }],
        };

        let mut output = Vec::new();
        write_diagnostic(&diagnostic, &mut output, false).unwrap();
        let text = String::from_utf8_lossy(&output);

        assert!(text.contains("The UTF8-decoder encountered an invalid encoding"));
        assert!(text.contains("[rebuild-lexer-1] Invalid UTF8 Encoding"));
        assert!(text.contains("ab\\[ff]cd"));
        assert!(text.contains("line 3"));
    }
}
