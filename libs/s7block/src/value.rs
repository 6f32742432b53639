//! Raw byte span <-> engineering value conversion
//!
//! All multi-byte fields are big-endian (most significant byte first), the
//! byte order the controller stores them in. Real32 values are reinterpreted
//! bit-for-bit, never numerically converted. None of these operations fail;
//! offsets are validated by the caller, which always sizes the buffer to
//! cover every configured tag, so an out-of-range index is a programming
//! error and panics via slice indexing.

/// Stateless byte codec with engineering-unit scaling.
pub struct ValueCodec;

impl ValueCodec {
    /// Decode a signed 16-bit word at `offset`, widened to `f64`.
    pub fn decode_word16(buf: &[u8], offset: usize) -> f64 {
        f64::from(i16::from_be_bytes([buf[offset], buf[offset + 1]]))
    }

    /// Decode an IEEE-754 binary32 at `offset`, reinterpreted from the four
    /// big-endian bytes.
    pub fn decode_real32(buf: &[u8], offset: usize) -> f64 {
        f64::from(f32::from_be_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ]))
    }

    /// Decode a single bit of the byte at `offset`: `(byte >> bit) & 1`.
    pub fn decode_bit(buf: &[u8], offset: usize, bit: u8) -> bool {
        (buf[offset] >> bit) & 1 == 1
    }

    /// Encode a signed 16-bit word, big-endian.
    pub fn encode_word16(raw: i16) -> [u8; 2] {
        raw.to_be_bytes()
    }

    /// Encode an IEEE-754 binary32, big-endian.
    pub fn encode_real32(raw: f32) -> [u8; 4] {
        raw.to_be_bytes()
    }

    /// Set or clear one bit of `byte`, leaving the other bits untouched.
    /// The surrounding read-modify-write of the owning byte is the caller's
    /// responsibility.
    pub fn encode_bit(byte: u8, bit: u8, value: bool) -> u8 {
        if value {
            byte | (1 << bit)
        } else {
            byte & !(1 << bit)
        }
    }

    /// Normalize a configured scale factor: values <= 0 act as 1.0 so
    /// decode/encode never divide by zero or flip sign.
    pub fn effective_scale(scale: f64) -> f64 {
        if scale <= 0.0 {
            1.0
        } else {
            scale
        }
    }

    /// Raw numeric value -> engineering value.
    pub fn apply_scale(raw: f64, scale: f64) -> f64 {
        raw * Self::effective_scale(scale)
    }

    /// Engineering value -> raw numeric value.
    pub fn remove_scale(engineering: f64, scale: f64) -> f64 {
        engineering / Self::effective_scale(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word16_round_trip() {
        for raw in [0i16, 1, -1, 42, -32768, 32767, 256, -300] {
            let bytes = ValueCodec::encode_word16(raw);
            let mut buf = vec![0u8; 4];
            buf[1..3].copy_from_slice(&bytes);
            assert_eq!(ValueCodec::decode_word16(&buf, 1), f64::from(raw));
        }
    }

    #[test]
    fn word16_is_big_endian() {
        let buf = [0x01, 0x02];
        assert_eq!(ValueCodec::decode_word16(&buf, 0), 258.0);
        assert_eq!(ValueCodec::encode_word16(258), [0x01, 0x02]);
    }

    #[test]
    fn real32_round_trip_is_bit_exact() {
        for raw in [0.0f32, 1.5, -273.15, f32::MIN_POSITIVE, 3.4e38, -0.0] {
            let bytes = ValueCodec::encode_real32(raw);
            let decoded = ValueCodec::decode_real32(&bytes, 0) as f32;
            assert_eq!(decoded.to_bits(), raw.to_bits());
        }
    }

    #[test]
    fn bit_round_trip_all_indexes() {
        for bit in 0..8u8 {
            for value in [false, true] {
                let byte = ValueCodec::encode_bit(0b0101_0101, bit, value);
                assert_eq!(ValueCodec::decode_bit(&[byte], 0, bit), value);
            }
        }
    }

    #[test]
    fn encode_bit_preserves_neighbors() {
        let original = 0b0101_0101u8;
        let set = ValueCodec::encode_bit(original, 1, true);
        assert_eq!(set ^ original, 0b0000_0010);
        let cleared = ValueCodec::encode_bit(original, 0, false);
        assert_eq!(cleared ^ original, 0b0000_0001);
        // Writing the current value changes nothing
        assert_eq!(ValueCodec::encode_bit(original, 0, true), original);
    }

    #[test]
    fn scale_application() {
        assert_eq!(ValueCodec::apply_scale(100.0, 0.1), 10.0);
        assert_eq!(ValueCodec::remove_scale(10.0, 0.1), 100.0);
    }

    #[test]
    fn non_positive_scale_acts_as_unity() {
        assert_eq!(ValueCodec::apply_scale(7.0, 0.0), 7.0);
        assert_eq!(ValueCodec::apply_scale(7.0, -2.5), 7.0);
        assert_eq!(ValueCodec::remove_scale(7.0, 0.0), 7.0);
    }
}
