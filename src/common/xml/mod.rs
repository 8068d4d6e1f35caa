//! XML text helpers shared by the tree parser and serializer.

mod escape;

pub use escape::{decode_char_ref, escape_attr, escape_text};
