use super::code_point::CodePoint;
use super::view::View;

/// An append-only piecewise string.
///
/// The escaper interleaves borrowed source runs with small generated escape
/// sequences; a rope keeps that cheap and flattens once at the end. No
/// normalization happens: the byte count of a rope is the sum of its pieces.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rope<'a> {
    pieces: Vec<Piece<'a>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece<'a> {
    CodePoint(CodePoint),
    Owned(String),
    Borrowed(View<'a>),
}

impl<'a> Rope<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_code_point(&mut self, code_point: CodePoint) {
        self.pieces.push(Piece::CodePoint(code_point));
    }

    pub fn push_string(&mut self, string: String) {
        if !string.is_empty() {
            self.pieces.push(Piece::Owned(string));
        }
    }

    pub fn push_view(&mut self, view: View<'a>) {
        if !view.is_empty() {
            self.pieces.push(Piece::Borrowed(view));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn byte_count(&self) -> usize {
        self.pieces
            .iter()
            .map(|piece| match piece {
                Piece::CodePoint(cp) => cp.utf8_byte_count(),
                Piece::Owned(s) => s.len(),
                Piece::Borrowed(v) => v.byte_count(),
            })
            .sum()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.byte_count());
        for piece in self.pieces {
            match piece {
                Piece::CodePoint(cp) => cp.encode_utf8_into(&mut result),
                Piece::Owned(s) => result.extend_from_slice(s.as_bytes()),
                Piece::Borrowed(v) => result.extend_from_slice(v.as_bytes()),
            }
        }
        result
    }

    pub fn into_string(self) -> String {
        let bytes = self.into_bytes();
        match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_pieces_in_order() {
        let source = View::new(b"hello world");
        let mut rope = Rope::new();
        rope.push_view(source.subview(0..5));
        rope.push_string(", ".to_owned());
        rope.push_view(source.subview(6..11));
        rope.push_code_point(CodePoint('!' as u32));

        assert_eq!(rope.byte_count(), 13);
        assert_eq!(rope.into_string(), "hello, world!");
    }

    #[test]
    fn skips_empty_pieces() {
        let source = View::new(b"abc");
        let mut rope = Rope::new();
        rope.push_view(source.subview(1..1));
        rope.push_string(String::new());
        assert!(rope.is_empty());
        assert_eq!(rope.byte_count(), 0);
        assert_eq!(rope.into_string(), "");
    }

    #[test]
    fn counts_code_point_widths() {
        let mut rope = Rope::new();
        rope.push_code_point(CodePoint(0x20AC));
        assert_eq!(rope.byte_count(), 3);
        assert_eq!(rope.into_string(), "\u{20AC}");
    }
}
