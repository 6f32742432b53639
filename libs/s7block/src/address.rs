//! Textual DB address parsing
//!
//! Accepts the compact S7 notation `DB<n>.DB<K><offset>[.<bit>]` where `<K>`
//! selects the field kind (`X` bit, `W` 16-bit word, `D` 32-bit real) and the
//! leading `DB<n>.` block designator may be omitted, defaulting to block 1.
//! Parsing never fails: text outside the grammar resolves to
//! [`AddressKind::Invalid`] with all numeric fields zeroed, so downstream span
//! computation degrades to zero width instead of underflowing.

/// Field kind encoded by the address letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Single bit inside a byte (`DBX`)
    Bit,
    /// Big-endian signed 16-bit word (`DBW`)
    Word16,
    /// Big-endian IEEE-754 binary32 (`DBD`)
    Real32,
    /// Text did not match the grammar
    Invalid,
}

impl AddressKind {
    /// Width in bytes of the field on the wire.
    pub fn width(self) -> u32 {
        match self {
            AddressKind::Bit => 1,
            AddressKind::Word16 => 2,
            AddressKind::Real32 => 4,
            AddressKind::Invalid => 0,
        }
    }
}

/// A parsed tag location inside a numbered data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddress {
    /// Data block number, >= 1 for valid addresses
    pub db_number: u16,
    /// Field kind
    pub kind: AddressKind,
    /// Byte offset inside the block
    pub byte_offset: u32,
    /// Bit index 0-7, meaningful only for [`AddressKind::Bit`]
    pub bit_offset: u8,
}

impl ResolvedAddress {
    /// Sentinel returned for text outside the grammar.
    pub const INVALID: Self = Self {
        db_number: 0,
        kind: AddressKind::Invalid,
        byte_offset: 0,
        bit_offset: 0,
    };

    /// Parse the textual notation. Pure and infallible; see module docs.
    pub fn parse(text: &str) -> Self {
        let normalized = text.trim().to_ascii_uppercase();

        let Some(rest) = normalized.strip_prefix("DB") else {
            return Self::INVALID;
        };

        // Block number scan stops at the first non-digit. A consumed block
        // number must be followed by the ".DB" of the field designator;
        // otherwise the kind letter follows "DB" directly and block 1 applies.
        let (block_digits, after_block) = scan_digits(rest);
        let (db_number, body) = if let Some(body) = after_block.strip_prefix(".DB") {
            (if block_digits == 0 { 1 } else { block_digits as u16 }, body)
        } else if after_block.len() == rest.len() {
            (1, rest)
        } else {
            return Self::INVALID;
        };

        let kind = match body.chars().next() {
            Some('X') => AddressKind::Bit,
            Some('W') => AddressKind::Word16,
            Some('D') => AddressKind::Real32,
            _ => return Self::INVALID,
        };

        let (byte_offset, after_offset) = scan_digits(&body[1..]);

        let bit_offset = if kind == AddressKind::Bit {
            // Bit fields require the ".<bit>" suffix. Indexes beyond 7 are
            // accepted numerically; configuring one is a caller error.
            let Some(bit_part) = after_offset.strip_prefix('.') else {
                return Self::INVALID;
            };
            scan_digits(bit_part).0 as u8
        } else {
            0
        };

        Self {
            db_number,
            kind,
            byte_offset,
            bit_offset,
        }
    }

    /// First byte past the field, i.e. `byte_offset + width`.
    pub fn end_offset(&self) -> u32 {
        self.byte_offset + self.kind.width()
    }

    /// Whether the address matched the grammar.
    pub fn is_valid(&self) -> bool {
        self.kind != AddressKind::Invalid
    }
}

/// Tolerant integer scan: consumes leading ASCII digits, yielding 0 when
/// there are none, and returns the unconsumed remainder.
fn scan_digits(s: &str) -> (u32, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let value = s[..end].parse().unwrap_or(0);
    (value, &s[end..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_and_default_block_agree() {
        let explicit = ResolvedAddress::parse("DB1.DBW8");
        let implicit = ResolvedAddress::parse("DBW8");
        assert_eq!(explicit, implicit);
        assert_eq!(explicit.db_number, 1);
        assert_eq!(explicit.kind, AddressKind::Word16);
        assert_eq!(explicit.byte_offset, 8);
    }

    #[test]
    fn parses_bit_address() {
        let addr = ResolvedAddress::parse("DB5.DBX10.3");
        assert_eq!(addr.db_number, 5);
        assert_eq!(addr.kind, AddressKind::Bit);
        assert_eq!(addr.byte_offset, 10);
        assert_eq!(addr.bit_offset, 3);
    }

    #[test]
    fn parses_real_address() {
        let addr = ResolvedAddress::parse("DB2.DBD20");
        assert_eq!(addr.db_number, 2);
        assert_eq!(addr.kind, AddressKind::Real32);
        assert_eq!(addr.byte_offset, 20);
        assert_eq!(addr.end_offset(), 24);
    }

    #[test]
    fn zero_block_normalizes_to_one() {
        assert_eq!(ResolvedAddress::parse("DB0.DBW4").db_number, 1);
    }

    #[test]
    fn lowercase_is_accepted() {
        assert_eq!(
            ResolvedAddress::parse("db3.dbx1.7"),
            ResolvedAddress::parse("DB3.DBX1.7")
        );
    }

    #[test]
    fn garbage_is_invalid_not_panic() {
        for text in ["garbage", "", "DB", "DBQ4", "DB5.Q", "MW100", "DB5X10.3"] {
            let addr = ResolvedAddress::parse(text);
            assert_eq!(addr, ResolvedAddress::INVALID, "input {text:?}");
            assert_eq!(addr.end_offset(), 0);
        }
    }

    #[test]
    fn bit_without_separator_is_invalid() {
        assert!(!ResolvedAddress::parse("DBX10").is_valid());
        assert!(!ResolvedAddress::parse("DB2.DBX4").is_valid());
    }

    #[test]
    fn word_trailing_text_is_ignored() {
        // The grammar only reads the offset digits for W/D kinds.
        let addr = ResolvedAddress::parse("DB1.DBW8.2");
        assert_eq!(addr.kind, AddressKind::Word16);
        assert_eq!(addr.byte_offset, 8);
    }

    #[test]
    fn missing_offset_scans_to_zero() {
        let addr = ResolvedAddress::parse("DBW");
        assert_eq!(addr.kind, AddressKind::Word16);
        assert_eq!(addr.byte_offset, 0);
    }
}
