#![deny(clippy::all)]

//! Front-end of the Rebuild compiler.
//!
//! The scanner, filter and nester stages turn raw source bytes into block
//! lines: the significant tokens of one semantic line together with the
//! whitespace, comments, newlines and lexical error carriers around them.
//! This crate holds that token model and the diagnostic engine that walks a
//! block line and reports every lexical defect it carries as a
//! human-readable diagnostic with escaped source excerpts and highlighted
//! spans.
//!
//! ```
//! use compiler::tokens::build::BlockLineBuilder;
//! use compiler::tokens::{IdentifierLiteral, Position, Token};
//! use compiler::{report_line_errors, Diagnostics, View};
//!
//! let source = View::new(b"x");
//! let line = BlockLineBuilder::new(source)
//!     .token(Token::IdentifierLiteral(IdentifierLiteral::new(
//!         source,
//!         Position::new(1, 1),
//!     )))
//!     .build();
//!
//! let mut diagnostics = Diagnostics::new();
//! report_line_errors(&line, &mut diagnostics);
//! assert!(!diagnostics.has_any());
//! ```

mod line_errors;
pub mod reporting;
pub mod strings;
pub mod tokens;

pub use line_errors::{
    block_line_extent, escape_source_line, expand_to_physical_line, report_line_errors,
    EscapedMarkers,
};
pub use reporting::{Code, Context, Diagnostic, Diagnostics, TextSpan};
pub use strings::View;
pub use tokens::BlockLine;
