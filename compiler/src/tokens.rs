//! The nester-level token model: everything the scanner, filter and nester
//! stages hand to the diagnostic engine for one block line.
//!
//! A block line keeps its significant tokens and its insignificants (white
//! space, comments, newlines, lexical error carriers) in two sequences, each
//! sorted by the begin of its `input` view; all inputs are disjoint and point
//! into the one source buffer of the compilation. `for_each` walks both
//! sequences interleaved in source order.
//!
//! Taint flags are interior-mutable: reporting a defect folds co-located
//! sibling defects into one diagnostic and marks the carriers so a later
//! visit stays silent. The transition is one-way (`false` to `true`) within
//! a reporting pass.

use std::cell::Cell;

use serde::Serialize;

use crate::strings::View;

/// 1-based source line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Line(pub u32);

impl Line {
    /// The line before this one. Newline tokens logically belong to the
    /// line they terminate, so their reports use the preceding line.
    pub fn preceding(self) -> Line {
        debug_assert!(self.0 > 0);
        Line(self.0 - 1)
    }
}

/// 1-based source column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Column(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: Line,
    pub column: Column,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line: Line(line),
            column: Column(column),
        }
    }
}

/// Bytes the UTF-8 decoder could not turn into a scalar, as recorded by the
/// scanner inside a larger token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedErrorPosition<'a> {
    pub input: View<'a>,
}

/// An indentation character that does not match the rest of the indent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MixedIndentCharacter<'a> {
    pub input: View<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewlineError<'a> {
    DecodedErrorPosition(DecodedErrorPosition<'a>),
    MixedIndentCharacter(MixedIndentCharacter<'a>),
}

impl<'a> NewlineError<'a> {
    pub fn input(&self) -> View<'a> {
        match *self {
            NewlineError::DecodedErrorPosition(e) => e.input,
            NewlineError::MixedIndentCharacter(e) => e.input,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StringErrorKind {
    EndOfInput,
    InvalidEncoding,
    InvalidEscape,
    InvalidControl,
    InvalidDecimalUnicode,
    InvalidHexUnicode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringError<'a> {
    pub kind: StringErrorKind,
    pub input: View<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberError<'a> {
    DecodedErrorPosition(DecodedErrorPosition<'a>),
    MissingExponent { input: View<'a> },
    MissingValue { input: View<'a> },
    MissingBoundary { input: View<'a> },
}

impl<'a> NumberError<'a> {
    pub fn input(&self) -> View<'a> {
        match *self {
            NumberError::DecodedErrorPosition(e) => e.input,
            NumberError::MissingExponent { input } => input,
            NumberError::MissingValue { input } => input,
            NumberError::MissingBoundary { input } => input,
        }
    }

    pub fn kind_index(&self) -> u8 {
        match self {
            NumberError::DecodedErrorPosition(_) => 0,
            NumberError::MissingExponent { .. } => 1,
            NumberError::MissingValue { .. } => 2,
            NumberError::MissingBoundary { .. } => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorError<'a> {
    DecodedErrorPosition(DecodedErrorPosition<'a>),
    WrongClose { input: View<'a> },
    UnexpectedClose { input: View<'a> },
    NotClosed { input: View<'a> },
}

impl<'a> OperatorError<'a> {
    pub fn input(&self) -> View<'a> {
        match *self {
            OperatorError::DecodedErrorPosition(e) => e.input,
            OperatorError::WrongClose { input } => input,
            OperatorError::UnexpectedClose { input } => input,
            OperatorError::NotClosed { input } => input,
        }
    }

    pub fn kind_index(&self) -> u8 {
        match self {
            OperatorError::DecodedErrorPosition(_) => 0,
            OperatorError::WrongClose { .. } => 1,
            OperatorError::UnexpectedClose { .. } => 2,
            OperatorError::NotClosed { .. } => 3,
        }
    }
}

/// A token that carries nothing but its place in the source: separators,
/// brackets and the nester's structural error markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagToken<'a> {
    pub input: View<'a>,
    pub position: Position,
}

impl<'a> TagToken<'a> {
    pub fn new(input: View<'a>, position: Position) -> Self {
        Self { input, position }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct StringLiteralValue<'a> {
    /// The decoded text, as far as the scanner got.
    pub text: String,
    pub errors: Vec<StringError<'a>>,
}

impl StringLiteralValue<'_> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NumberLiteralValue<'a> {
    pub errors: Vec<NumberError<'a>>,
}

impl NumberLiteralValue<'_> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct OperatorLiteralValue<'a> {
    pub errors: Vec<OperatorError<'a>>,
}

impl OperatorLiteralValue<'_> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct IndentationValue<'a> {
    pub errors: Vec<NewlineError<'a>>,
}

impl IndentationValue<'_> {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringLiteral<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub value: StringLiteralValue<'a>,
    pub is_tainted: Cell<bool>,
}

impl<'a> StringLiteral<'a> {
    pub fn new(input: View<'a>, position: Position, value: StringLiteralValue<'a>) -> Self {
        Self {
            input,
            position,
            value,
            is_tainted: Cell::new(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberLiteral<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub value: NumberLiteralValue<'a>,
    pub is_tainted: Cell<bool>,
}

impl<'a> NumberLiteral<'a> {
    pub fn new(input: View<'a>, position: Position, value: NumberLiteralValue<'a>) -> Self {
        Self {
            input,
            position,
            value,
            is_tainted: Cell::new(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorLiteral<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub value: OperatorLiteralValue<'a>,
    pub is_tainted: Cell<bool>,
}

impl<'a> OperatorLiteral<'a> {
    pub fn new(input: View<'a>, position: Position, value: OperatorLiteralValue<'a>) -> Self {
        Self {
            input,
            position,
            value,
            is_tainted: Cell::new(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierLiteral<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub decode_errors: Vec<DecodedErrorPosition<'a>>,
    pub is_tainted: Cell<bool>,
}

impl<'a> IdentifierLiteral<'a> {
    pub fn new(input: View<'a>, position: Position) -> Self {
        Self {
            input,
            position,
            decode_errors: Vec::new(),
            is_tainted: Cell::new(false),
        }
    }

    pub fn with_decode_errors(mut self, decode_errors: Vec<DecodedErrorPosition<'a>>) -> Self {
        self.decode_errors = decode_errors;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentLiteral<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub decode_errors: Vec<DecodedErrorPosition<'a>>,
    pub is_tainted: Cell<bool>,
}

impl<'a> CommentLiteral<'a> {
    pub fn new(input: View<'a>, position: Position) -> Self {
        Self {
            input,
            position,
            decode_errors: Vec::new(),
            is_tainted: Cell::new(false),
        }
    }

    pub fn with_decode_errors(mut self, decode_errors: Vec<DecodedErrorPosition<'a>>) -> Self {
        self.decode_errors = decode_errors;
        self
    }
}

/// A byte run the scanner could not decode at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidEncoding<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub is_tainted: Cell<bool>,
}

impl<'a> InvalidEncoding<'a> {
    pub fn new(input: View<'a>, position: Position) -> Self {
        Self {
            input,
            position,
            is_tainted: Cell::new(false),
        }
    }
}

/// A well-formed character that starts no Rebuild token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnexpectedCharacter<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub is_tainted: Cell<bool>,
}

impl<'a> UnexpectedCharacter<'a> {
    pub fn new(input: View<'a>, position: Position) -> Self {
        Self {
            input,
            position,
            is_tainted: Cell::new(false),
        }
    }
}

/// A line break plus the indentation that follows it. Its `position` is the
/// start of the new line; defects are reported against the line it ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLineIndentation<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub value: IndentationValue<'a>,
    pub is_tainted: Cell<bool>,
}

impl<'a> NewLineIndentation<'a> {
    pub fn new(input: View<'a>, position: Position, value: IndentationValue<'a>) -> Self {
        Self {
            input,
            position,
            value,
            is_tainted: Cell::new(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BlockLiteralValue<'a> {
    pub lines: Vec<BlockLine<'a>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLiteral<'a> {
    pub input: View<'a>,
    pub position: Position,
    pub value: BlockLiteralValue<'a>,
}

/// Significant tokens of a block line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    BlockLiteral(BlockLiteral<'a>),
    ColonSeparator(TagToken<'a>),
    CommaSeparator(TagToken<'a>),
    SquareBracketOpen(TagToken<'a>),
    SquareBracketClose(TagToken<'a>),
    BracketOpen(TagToken<'a>),
    BracketClose(TagToken<'a>),
    StringLiteral(StringLiteral<'a>),
    NumberLiteral(NumberLiteral<'a>),
    IdentifierLiteral(IdentifierLiteral<'a>),
    OperatorLiteral(OperatorLiteral<'a>),
}

impl<'a> Token<'a> {
    pub fn input(&self) -> View<'a> {
        match self {
            Token::BlockLiteral(t) => t.input,
            Token::ColonSeparator(t)
            | Token::CommaSeparator(t)
            | Token::SquareBracketOpen(t)
            | Token::SquareBracketClose(t)
            | Token::BracketOpen(t)
            | Token::BracketClose(t) => t.input,
            Token::StringLiteral(t) => t.input,
            Token::NumberLiteral(t) => t.input,
            Token::IdentifierLiteral(t) => t.input,
            Token::OperatorLiteral(t) => t.input,
        }
    }
}

/// Insignificant elements of a block line: separators the filter kept for
/// position, comments, newlines and the lexical error carriers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Insignificant<'a> {
    CommentLiteral(CommentLiteral<'a>),
    WhiteSpaceSeparator(TagToken<'a>),
    InvalidEncoding(InvalidEncoding<'a>),
    UnexpectedCharacter(UnexpectedCharacter<'a>),
    SemicolonSeparator(TagToken<'a>),
    NewLineIndentation(NewLineIndentation<'a>),
    BlockStartColon(TagToken<'a>),
    BlockEndIdentifier(TagToken<'a>),
    UnexpectedColon(TagToken<'a>),
    UnexpectedIndent(TagToken<'a>),
    UnexpectedTokensAfterEnd(TagToken<'a>),
    UnexpectedBlockEnd(TagToken<'a>),
    MissingBlockEnd(TagToken<'a>),
    MisIndentedBlockEnd(TagToken<'a>),
}

impl<'a> Insignificant<'a> {
    pub fn input(&self) -> View<'a> {
        match self {
            Insignificant::CommentLiteral(t) => t.input,
            Insignificant::InvalidEncoding(t) => t.input,
            Insignificant::UnexpectedCharacter(t) => t.input,
            Insignificant::NewLineIndentation(t) => t.input,
            Insignificant::WhiteSpaceSeparator(t)
            | Insignificant::SemicolonSeparator(t)
            | Insignificant::BlockStartColon(t)
            | Insignificant::BlockEndIdentifier(t)
            | Insignificant::UnexpectedColon(t)
            | Insignificant::UnexpectedIndent(t)
            | Insignificant::UnexpectedTokensAfterEnd(t)
            | Insignificant::UnexpectedBlockEnd(t)
            | Insignificant::MisIndentedBlockEnd(t)
            | Insignificant::MissingBlockEnd(t) => t.input,
        }
    }
}

/// One element of a block line in source order.
#[derive(Clone, Copy, Debug)]
pub enum LineElement<'t, 'a> {
    Token(&'t Token<'a>),
    Insignificant(&'t Insignificant<'a>),
}

impl<'a> LineElement<'_, 'a> {
    pub fn input(&self) -> View<'a> {
        match self {
            LineElement::Token(t) => t.input(),
            LineElement::Insignificant(i) => i.input(),
        }
    }
}

/// A semantic line: the significant tokens of one physical line together
/// with the surrounding insignificants, plus the source view both index
/// into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockLine<'a> {
    pub source: View<'a>,
    pub tokens: Vec<Token<'a>>,
    pub insignificants: Vec<Insignificant<'a>>,
}

impl<'a> BlockLine<'a> {
    /// Visit every element in source order, interleaving the two sorted
    /// sequences on the begin of their input. Inputs are disjoint; a tie is
    /// impossible, but would yield the token first.
    pub fn for_each<'t>(&'t self, mut f: impl FnMut(LineElement<'t, 'a>)) {
        let mut tokens = self.tokens.iter().peekable();
        let mut insignificants = self.insignificants.iter().peekable();
        loop {
            let next_token = tokens.peek().map(|t| t.input().begin_addr());
            let next_insignificant = insignificants.peek().map(|i| i.input().begin_addr());
            match (next_token, next_insignificant) {
                (Some(t), Some(i)) => {
                    if t <= i {
                        if let Some(token) = tokens.next() {
                            f(LineElement::Token(token));
                        }
                    } else if let Some(insignificant) = insignificants.next() {
                        f(LineElement::Insignificant(insignificant));
                    }
                }
                (Some(_), None) => {
                    if let Some(token) = tokens.next() {
                        f(LineElement::Token(token));
                    }
                }
                (None, Some(_)) => {
                    if let Some(insignificant) = insignificants.next() {
                        f(LineElement::Insignificant(insignificant));
                    }
                }
                (None, None) => break,
            }
        }
    }
}

pub mod build {
    //! Terse assembly of block lines, shared by the nester and the tests.

    use super::*;

    pub struct BlockLineBuilder<'a> {
        line: BlockLine<'a>,
    }

    impl<'a> BlockLineBuilder<'a> {
        pub fn new(source: View<'a>) -> Self {
            Self {
                line: BlockLine {
                    source,
                    tokens: Vec::new(),
                    insignificants: Vec::new(),
                },
            }
        }

        pub fn token(mut self, token: Token<'a>) -> Self {
            self.line.tokens.push(token);
            self
        }

        pub fn insignificant(mut self, insignificant: Insignificant<'a>) -> Self {
            self.line.insignificants.push(insignificant);
            self
        }

        pub fn build(self) -> BlockLine<'a> {
            debug_assert!(sorted_and_contained(
                self.line.tokens.iter().map(Token::input),
                self.line.source,
            ));
            debug_assert!(sorted_and_contained(
                self.line.insignificants.iter().map(Insignificant::input),
                self.line.source,
            ));
            self.line
        }
    }

    fn sorted_and_contained<'a>(
        inputs: impl Iterator<Item = View<'a>>,
        source: View<'a>,
    ) -> bool {
        let mut previous_end = 0;
        for input in inputs {
            if !input.is_part_of(source) {
                return false;
            }
            if input.begin_addr() < previous_end {
                return false;
            }
            previous_end = input.end_addr();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::build::BlockLineBuilder;
    use super::*;

    #[test]
    fn for_each_interleaves_in_source_order() {
        let source = View::new(b"a b");
        let line = BlockLineBuilder::new(source)
            .token(Token::IdentifierLiteral(IdentifierLiteral::new(
                source.subview(0..1),
                Position::new(1, 1),
            )))
            .token(Token::IdentifierLiteral(IdentifierLiteral::new(
                source.subview(2..3),
                Position::new(1, 3),
            )))
            .insignificant(Insignificant::WhiteSpaceSeparator(TagToken::new(
                source.subview(1..2),
                Position::new(1, 2),
            )))
            .build();

        let mut order = Vec::new();
        line.for_each(|element| {
            order.push(element.input().offset_in(source));
        });
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn error_kind_indices_are_distinct() {
        let source = View::new(b"1e");
        let input = source.subview(0..2);
        let errors = [
            NumberError::DecodedErrorPosition(DecodedErrorPosition { input }),
            NumberError::MissingExponent { input },
            NumberError::MissingValue { input },
            NumberError::MissingBoundary { input },
        ];
        let mut seen = std::collections::HashSet::new();
        for error in &errors {
            assert!(seen.insert(error.kind_index()));
        }
    }

    #[test]
    fn preceding_line() {
        assert_eq!(Line(7).preceding(), Line(6));
    }
}
