//! Codecs for every value kind the format knows.
//!
//! [`Element`] is the single seam: a field, list element, map key or value,
//! or array cell is anything implementing it. Compound codecs recurse through
//! the same trait, so containers nest freely.

pub mod array;
pub mod class;
pub mod enumeration;
pub mod list;
pub mod map;
pub mod scalar;

use std::borrow::Cow;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::scanner::Record;
use crate::tag::ValueKind;

/// A value with a wire representation.
pub trait Element: Sized + 'static {
    /// Kind selecting the record's Start tag and codec.
    const KIND: ValueKind;

    /// Identity string written into container headers for this element type.
    fn type_identity() -> Cow<'static, str>;

    /// Append this value as one record named by `name_hash`.
    ///
    /// Writing nothing is allowed and means the value is absent.
    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError>;

    /// Rebuild a value from `record`, which the scanner has already bounded.
    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError>;
}

/// `None` writes no record at all; a present record decodes to `Some`.
impl<E: Element> Element for Option<E> {
    const KIND: ValueKind = E::KIND;

    fn type_identity() -> Cow<'static, str> {
        E::type_identity()
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        match self {
            Some(value) => value.encode(name_hash, enc),
            None => Ok(()),
        }
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        E::decode(dec, record).map(Some)
    }
}

/// Decode every record in a container's inner range as `E`, in stream order.
pub(crate) fn decode_elements<E: Element>(
    dec: &mut Decoder<'_>,
    record: &Record,
) -> Result<Vec<E>, PersistError> {
    dec.nested(|dec| {
        let mut items = Vec::new();
        for item in dec.records(record.inner.clone()) {
            let item = item?;
            items.push(E::decode(dec, &item)?);
        }
        Ok(items)
    })
}

/// Warn when a container header names a different element type than the
/// destination declares. The destination's type wins.
pub(crate) fn check_element_identity<E: Element>(found: &str, offset: usize) {
    let expected = E::type_identity();
    if found != expected {
        tracing::debug!(
            offset,
            found,
            expected = %expected,
            "container element identity differs from destination"
        );
    }
}
