use super::code_point::CodePoint;
use super::view::View;

/// One step of UTF-8 decoding: either a scalar with the bytes it was decoded
/// from, or the maximal malformed byte run the decoder had to skip. The
/// `input` views of consecutive items tile the decoded view exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodedItem<'a> {
    CodePoint { input: View<'a>, code_point: CodePoint },
    Error { input: View<'a> },
}

impl<'a> DecodedItem<'a> {
    pub fn input(&self) -> View<'a> {
        match *self {
            DecodedItem::CodePoint { input, .. } => input,
            DecodedItem::Error { input } => input,
        }
    }
}

/// Lazily decode a view as UTF-8.
///
/// The decoder reconstructs the raw bit pattern of each sequence; surrogate
/// and noncharacter values come out as code points and are left to the
/// caller's classification. Stray continuation bytes and impossible lead
/// bytes become one-byte errors, truncated sequences become an error over
/// the lead byte plus the continuations that were present.
pub fn decode_utf8(view: View<'_>) -> Utf8Decoder<'_> {
    Utf8Decoder { view, pos: 0 }
}

pub struct Utf8Decoder<'a> {
    view: View<'a>,
    pos: usize,
}

impl<'a> Iterator for Utf8Decoder<'a> {
    type Item = DecodedItem<'a>;

    fn next(&mut self) -> Option<DecodedItem<'a>> {
        let bytes = self.view.as_bytes();
        let start = self.pos;
        let lead = *bytes.get(start)?;

        let (expected, mut value) = match lead {
            0x00..=0x7F => {
                self.pos = start + 1;
                return Some(DecodedItem::CodePoint {
                    input: self.view.subview(start..self.pos),
                    code_point: CodePoint(lead as u32),
                });
            }
            0xC0..=0xDF => (2, (lead & 0x1F) as u32),
            0xE0..=0xEF => (3, (lead & 0x0F) as u32),
            0xF0..=0xF7 => (4, (lead & 0x07) as u32),
            _ => {
                // stray continuation byte or impossible lead
                self.pos = start + 1;
                return Some(DecodedItem::Error {
                    input: self.view.subview(start..self.pos),
                });
            }
        };

        let mut consumed = 1;
        while consumed < expected {
            match bytes.get(start + consumed) {
                Some(&b) if b & 0xC0 == 0x80 => {
                    value = (value << 6) | (b & 0x3F) as u32;
                    consumed += 1;
                }
                _ => {
                    self.pos = start + consumed;
                    return Some(DecodedItem::Error {
                        input: self.view.subview(start..self.pos),
                    });
                }
            }
        }

        self.pos = start + expected;
        Some(DecodedItem::CodePoint {
            input: self.view.subview(start..self.pos),
            code_point: CodePoint(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<DecodedItem<'_>> {
        decode_utf8(View::new(bytes)).collect()
    }

    #[test]
    fn decodes_ascii() {
        let items = decode(b"ab");
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            DecodedItem::CodePoint {
                input: View::new(b"ab").subview(0..1),
                code_point: CodePoint('a' as u32),
            }
        );
    }

    #[test]
    fn decodes_multi_byte_scalars() {
        let euro = b"\xE2\x82\xAC";
        let items = decode(euro);
        assert_eq!(items.len(), 1);
        match items[0] {
            DecodedItem::CodePoint { input, code_point } => {
                assert_eq!(code_point, CodePoint(0x20AC));
                assert_eq!(input.byte_count(), 3);
            }
            DecodedItem::Error { .. } => panic!("expected a code point"),
        }
    }

    #[test]
    fn reports_stray_continuation_as_single_byte_error() {
        let items = decode(b"a\xFFb");
        assert_eq!(items.len(), 3);
        match items[1] {
            DecodedItem::Error { input } => assert_eq!(input.as_bytes(), b"\xFF"),
            DecodedItem::CodePoint { .. } => panic!("expected an error"),
        }
    }

    #[test]
    fn reports_truncated_sequence_over_present_bytes() {
        let items = decode(b"\xE0\x80x");
        assert_eq!(items.len(), 2);
        match items[0] {
            DecodedItem::Error { input } => assert_eq!(input.as_bytes(), b"\xE0\x80"),
            DecodedItem::CodePoint { .. } => panic!("expected an error"),
        }
    }

    #[test]
    fn surrogate_bit_patterns_come_out_as_code_points() {
        let items = decode(b"\xED\xA0\x80");
        assert_eq!(items.len(), 1);
        match items[0] {
            DecodedItem::CodePoint { code_point, .. } => {
                assert_eq!(code_point, CodePoint(0xD800));
                assert!(code_point.is_surrogate());
            }
            DecodedItem::Error { .. } => panic!("expected a code point"),
        }
    }

    #[test]
    fn inputs_tile_the_view() {
        let bytes = b"a\xC2\xA2\xFF\xE2\x82";
        let view = View::new(bytes);
        let mut covered = 0;
        for item in decode_utf8(view) {
            assert_eq!(item.input().offset_in(view), covered);
            covered += item.input().byte_count();
        }
        assert_eq!(covered, bytes.len());
    }
}
