//! # Canonical Byte Encoding
//!
//! The binary layout every node recomputes when it checks a signature. If two
//! clients disagree on a single byte here, one of them produces signatures the
//! chain rejects, so this module is deliberately small and boring.
//!
//! ## Primitives
//!
//! - **varint**: unsigned LEB128: 7 bits per byte, least-significant group
//!   first, high bit set on every byte except the last. Used for lengths,
//!   counts, operation tags, and object instances.
//! - **fixed-width integers**: little-endian for everything the protocol
//!   pins to a width (weights, percentages, timestamps, amounts). Big-endian
//!   helpers exist for the few foreign layouts that need them.
//! - **length-prefixed bytes**: `varint(len) || raw bytes`, no terminator.
//! - **optionals**: `0x00` when absent, `0x01 || value` when present.
//! - **sequences**: `varint(count) || item*` in the order given.
//!
//! Composite values concatenate their fields in declared order, no padding.
//!
//! Encoding never fails. Range checks (negative amounts, over-long names)
//! belong to the builders that construct values, before anything reaches an
//! [`Encoder`].

use bytes::{BufMut, BytesMut};

/// A value with exactly one canonical byte representation.
pub trait ByteEncode {
    /// Append this value's canonical bytes to the encoder.
    fn encode(&self, enc: &mut Encoder);

    /// Convenience: encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        self.encode(&mut enc);
        enc.finish()
    }
}

/// Append-only byte sink implementing the protocol primitives.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(128),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Unsigned LEB128 varint.
    pub fn put_varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.put_u8(byte);
                return;
            }
            self.buf.put_u8(byte | 0x80);
        }
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn put_u16_le(&mut self, value: u16) {
        self.buf.put_u16_le(value);
    }

    pub fn put_u32_le(&mut self, value: u32) {
        self.buf.put_u32_le(value);
    }

    pub fn put_u64_le(&mut self, value: u64) {
        self.buf.put_u64_le(value);
    }

    pub fn put_i64_le(&mut self, value: i64) {
        self.buf.put_i64_le(value);
    }

    pub fn put_u16_be(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    pub fn put_u32_be(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Raw bytes with no length prefix. Only for fields whose width is fixed
    /// by the protocol (chain id, compressed keys).
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// `varint(len) || bytes`.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_varint(bytes.len() as u64);
        self.buf.put_slice(bytes);
    }

    /// UTF-8 string, length-prefixed like any other byte string.
    pub fn put_str(&mut self, value: &str) {
        self.put_bytes(value.as_bytes());
    }

    /// `0x00` for `None`, `0x01 || value` for `Some`.
    pub fn put_optional<T: ByteEncode>(&mut self, value: Option<&T>) {
        match value {
            Some(inner) => {
                self.buf.put_u8(0x01);
                inner.encode(self);
            }
            None => self.buf.put_u8(0x00),
        }
    }

    /// `varint(count) || item*`, in slice order. Callers that need a sorted
    /// set sort before calling.
    pub fn put_seq<T: ByteEncode>(&mut self, items: &[T]) {
        self.put_varint(items.len() as u64);
        for item in items {
            item.encode(self);
        }
    }

    /// An empty extension set. Every Graphene operation and transaction
    /// carries one after its declared fields.
    pub fn put_empty_extensions(&mut self) {
        self.put_varint(0);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

impl ByteEncode for u8 {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u8(*self);
    }
}

impl ByteEncode for u16 {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u16_le(*self);
    }
}

impl ByteEncode for u32 {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u32_le(*self);
    }
}

impl ByteEncode for u64 {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u64_le(*self);
    }
}

impl ByteEncode for String {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(self);
    }
}

impl<A: ByteEncode, B: ByteEncode> ByteEncode for (A, B) {
    fn encode(&self, enc: &mut Encoder) {
        self.0.encode(enc);
        self.1.encode(enc);
    }
}

/// Encoded width of `value` as a varint.
pub fn varint_len(mut value: u64) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(value: u64) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.put_varint(value);
        enc.finish()
    }

    #[test]
    fn varint_known_vectors() {
        assert_eq!(varint(0), vec![0x00]);
        assert_eq!(varint(1), vec![0x01]);
        assert_eq!(varint(127), vec![0x7F]);
        assert_eq!(varint(128), vec![0x80, 0x01]);
        assert_eq!(varint(300), vec![0xAC, 0x02]);
        assert_eq!(varint(28828), vec![0x9C, 0xE1, 0x01]);
        assert_eq!(varint(u64::MAX).len(), 10);
    }

    #[test]
    fn varint_len_matches_encoding() {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, 1 << 35, u64::MAX] {
            assert_eq!(varint_len(value), varint(value).len(), "value {value}");
        }
    }

    #[test]
    fn varint_is_injective_over_boundaries() {
        // Neighbouring values around each 7-bit boundary must not collide.
        let mut seen = std::collections::HashSet::new();
        for shift in 0..63 {
            let base = 1u64 << shift;
            for value in [base - 1, base, base + 1] {
                seen.insert((value, varint(value)));
            }
        }
        let encodings: std::collections::HashSet<_> = seen.iter().map(|(_, b)| b.clone()).collect();
        let values: std::collections::HashSet<_> = seen.iter().map(|(v, _)| *v).collect();
        assert_eq!(encodings.len(), values.len());
    }

    #[test]
    fn fixed_width_endianness() {
        let mut enc = Encoder::new();
        enc.put_u16_le(0x0102);
        enc.put_u32_le(0x01020304);
        enc.put_u16_be(0x0102);
        enc.put_u32_be(0x01020304);
        assert_eq!(
            enc.finish(),
            vec![0x02, 0x01, 0x04, 0x03, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn length_prefixed_string_has_no_terminator() {
        let mut enc = Encoder::new();
        enc.put_str("some data");
        let bytes = enc.finish();
        assert_eq!(bytes[0], 9);
        assert_eq!(&bytes[1..], b"some data");
    }

    #[test]
    fn optional_markers() {
        let mut enc = Encoder::new();
        enc.put_optional::<u16>(None);
        enc.put_optional(Some(&7u16));
        assert_eq!(enc.finish(), vec![0x00, 0x01, 0x07, 0x00]);
    }

    #[test]
    fn sequence_is_count_prefixed_and_ordered() {
        let mut enc = Encoder::new();
        enc.put_seq(&[3u8, 1, 2]);
        assert_eq!(enc.finish(), vec![0x03, 0x03, 0x01, 0x02]);
    }

    #[test]
    fn encoding_is_deterministic() {
        let value = (String::from("graphene"), 42u32);
        assert_eq!(value.to_bytes(), value.to_bytes());
    }
}
