//! The diagnostic value model and the sink it is delivered to.
//!
//! A `Diagnostic` is a stable code plus one or more `Explanation` parts;
//! each part is a heading over a small document of paragraphs and source
//! code blocks. Source code blocks carry text that has already been escaped
//! for printing; their highlight spans index into that rendered text, never
//! into the original source.

use std::fmt;

use serde::Serialize;

use crate::tokens::Line;

pub(crate) mod format;

/// A byte span into the rendered text of one source code block.
///
/// `-1` is the "not yet observed" sentinel while the escaper is still
/// scanning; fully built diagnostics only contain resolved spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TextSpan {
    pub start: i32,
    pub length: i32,
}

impl TextSpan {
    pub const UNSET: TextSpan = TextSpan {
        start: -1,
        length: -1,
    };

    pub fn is_resolved(&self) -> bool {
        self.start >= 0 && self.length >= 0
    }
}

/// Stable diagnostic identity: a category string plus a number unique
/// within it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Code {
    pub category: String,
    pub number: u16,
}

impl Code {
    /// A code in the lexer's category.
    pub fn lexer(number: u16) -> Self {
        Self {
            category: "rebuild-lexer".to_owned(),
            number,
        }
    }
}

/// One highlighted span of a source code block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub span: TextSpan,
    pub annotations: Vec<String>,
}

impl Highlight {
    pub fn bare(span: TextSpan) -> Self {
        Self {
            span,
            annotations: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub text: String,
}

/// An escaped excerpt of the offending source line(s).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceCodeBlock {
    pub text: String,
    pub highlights: Vec<Highlight>,
    pub caption: String,
    pub origin_line: Line,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DocumentNode {
    Paragraph(Paragraph),
    SourceCodeBlock(SourceCodeBlock),
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct Document {
    pub nodes: Vec<DocumentNode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub heading: String,
    pub document: Document,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: Code,
    pub parts: Vec<Explanation>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            writeln!(
                f,
                "[{}-{}] {}",
                self.code.category, self.code.number, part.heading
            )?;
            for node in &part.document.nodes {
                if let DocumentNode::Paragraph(paragraph) = node {
                    writeln!(f, "{}", paragraph.text)?;
                }
            }
        }
        Ok(())
    }
}

/// Where the engine delivers diagnostics. Delivery is synchronous and
/// move-only; diagnostics arrive in emission order.
pub trait Context {
    fn report_diagnostic(&mut self, diagnostic: Diagnostic);
}

/// The default sink: collects diagnostics for later rendering.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_any(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Render all collected diagnostics to a string. Colour is off by
    /// default; pass `true` for terminal output with highlighting.
    pub fn pretty_string(&self, colourful: bool) -> String {
        let mut output = Vec::new();
        for diagnostic in &self.diagnostics {
            format::write_diagnostic(diagnostic, &mut output, colourful).unwrap();
        }
        String::from_utf8_lossy(&output).into_owned()
    }
}

impl Context for Diagnostics {
    fn report_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
