//! String-layer primitives shared by the scanner and the diagnostic engine:
//! borrowed byte views, raw code points with escape-relevant classification,
//! a forgiving UTF-8 decoder, and the rope the escaper writes into.

mod code_point;
mod decode;
mod rope;
mod view;

pub use code_point::CodePoint;
pub use decode::{decode_utf8, DecodedItem, Utf8Decoder};
pub use rope::Rope;
pub use view::View;
