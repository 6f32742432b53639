//! Address and value codecs for S7 data-block tags
//!
//! This crate covers the pure, I/O-free half of the tag engine: parsing the
//! textual `DB<n>.DB<K><offset>[.<bit>]` address notation into a structured
//! location, and converting between big-endian wire bytes and scaled
//! engineering values. Everything here is deterministic and panic-free for
//! arbitrary input text; buffer offsets are the caller's responsibility.

pub mod address;
pub mod value;

pub use address::{AddressKind, ResolvedAddress};
pub use value::ValueCodec;
