//! Compact-u16 length prefixes.
//!
//! Solana prefixes every variable-length vector in a transaction with a
//! little-endian base-128 varint of at most three bytes. Apply with
//! `#[serde(with = "short_vec")]`; the element encoding is untouched.

use std::fmt;
use std::marker::PhantomData;

use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Longest legal encoding: 7 + 7 + 2 bits.
const MAX_ENCODING_LENGTH: usize = 3;

/// A u16 that serializes as a compact varint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShortU16(pub u16);

impl Serialize for ShortU16 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Emitted as a tuple of bytes; the declared arity is ignored by the
        // binary encoder.
        let mut seq = serializer.serialize_tuple(1)?;
        let mut rem = self.0;
        loop {
            let mut byte = (rem & 0x7f) as u8;
            rem >>= 7;
            if rem == 0 {
                seq.serialize_element(&byte)?;
                break;
            }
            byte |= 0x80;
            seq.serialize_element(&byte)?;
        }
        seq.end()
    }
}

struct ShortU16Visitor;

impl<'de> Visitor<'de> for ShortU16Visitor {
    type Value = ShortU16;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a compact-u16 byte sequence")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ShortU16, A::Error> {
        let mut value: u32 = 0;
        for nth in 0..MAX_ENCODING_LENGTH {
            let byte: u8 = seq
                .next_element()?
                .ok_or_else(|| de::Error::custom("short_vec length ran out of bytes"))?;
            // Continuation bytes of zero would make the encoding ambiguous.
            if byte == 0 && nth != 0 {
                return Err(de::Error::custom("short_vec length has a zero continuation"));
            }
            value |= u32::from(byte & 0x7f) << (nth * 7);
            if byte & 0x80 == 0 {
                return u16::try_from(value)
                    .map(ShortU16)
                    .map_err(|_| de::Error::custom("short_vec length exceeds u16"));
            }
        }
        Err(de::Error::custom("short_vec length is longer than 3 bytes"))
    }
}

impl<'de> Deserialize<'de> for ShortU16 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<ShortU16, D::Error> {
        deserializer.deserialize_tuple(MAX_ENCODING_LENGTH, ShortU16Visitor)
    }
}

/// Serialize a slice with a compact-u16 length prefix.
pub fn serialize<S: Serializer, T: Serialize>(
    elements: &[T],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let length = u16::try_from(elements.len())
        .map_err(|_| serde::ser::Error::custom("vector is too long for a short_vec"))?;
    let mut seq = serializer.serialize_tuple(1 + elements.len())?;
    seq.serialize_element(&ShortU16(length))?;
    for element in elements {
        seq.serialize_element(element)?;
    }
    seq.end()
}

struct ShortVecVisitor<T> {
    _element: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for ShortVecVisitor<T> {
    type Value = Vec<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a short_vec-prefixed vector")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<T>, A::Error> {
        let length: ShortU16 = seq
            .next_element()?
            .ok_or_else(|| de::Error::custom("short_vec is missing its length"))?;
        let length = usize::from(length.0);
        let mut elements = Vec::with_capacity(length.min(1024));
        for index in 0..length {
            let element: T = seq
                .next_element()?
                .ok_or_else(|| de::Error::invalid_length(index, &self))?;
            elements.push(element);
        }
        Ok(elements)
    }
}

/// Deserialize a slice with a compact-u16 length prefix.
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    deserializer.deserialize_tuple(
        usize::MAX,
        ShortVecVisitor {
            _element: PhantomData,
        },
    )
}
