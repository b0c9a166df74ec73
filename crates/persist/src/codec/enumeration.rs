//! Fieldless enums, stored by their integer representation.
//!
//! An enum record's header names the enum type; its single nested record is
//! an `Int` named `value` holding the variant's representation.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::hash::name_hash;
use crate::scanner::Record;
use crate::tag::Tag;
use crate::wire::{put_i32, put_str};

/// Name of the record holding the variant representation.
pub const VALUE_FIELD: &str = "value";

/// A fieldless enum with a stable integer representation per variant.
///
/// Implement it with [`persist_enum!`](crate::persist_enum), which also
/// provides the matching [`Element`](crate::Element) impl.
pub trait PersistEnum: Copy + 'static {
    const TYPE_NAME: &'static str;

    fn to_repr(self) -> i32;

    fn from_repr(repr: i32) -> Option<Self>;
}

pub fn encode_enum<T: PersistEnum>(
    value: T,
    hash: i32,
    enc: &mut Encoder<'_>,
) -> Result<(), PersistError> {
    let open = enc.open(Tag::EnumStart, hash, |buf| put_str(buf, T::TYPE_NAME))?;
    put_i32(enc.scalar(Tag::Int, name_hash(VALUE_FIELD)), value.to_repr());
    enc.close(open)
}

pub fn decode_enum<T: PersistEnum>(dec: &mut Decoder<'_>, record: &Record) -> Result<T, PersistError> {
    dec.expect_tag(record, Tag::EnumStart)?;
    let identity = dec.identity(record)?;
    if identity != T::TYPE_NAME {
        return Err(PersistError::IdentityMismatch {
            expected: T::TYPE_NAME.to_string(),
            found: identity.to_string(),
        });
    }
    let value_hash = name_hash(VALUE_FIELD);
    let repr = dec.nested(|dec| {
        for inner in dec.records(record.inner.clone()) {
            let inner = inner?;
            if inner.tag == Tag::Int && inner.name_hash == value_hash {
                return inner.payload(dec.data()).i32().map(Some);
            }
        }
        Ok(None)
    })?;
    let repr = repr.ok_or_else(|| {
        PersistError::format(record.offset, format!("enum {identity} has no value record"))
    })?;
    T::from_repr(repr).ok_or_else(|| PersistError::UnknownVariant {
        type_name: T::TYPE_NAME.to_string(),
        repr,
    })
}

/// Implement [`PersistEnum`] and [`Element`](crate::Element) for a fieldless enum.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, Default, PartialEq)]
/// enum Faction { #[default] Neutral, Guild, Outlaw }
///
/// persist_enum!(Faction, "game::Faction", [Neutral, Guild, Outlaw]);
/// ```
#[macro_export]
macro_rules! persist_enum {
    ($ty:ty, $name:expr, [$($variant:ident),+ $(,)?]) => {
        impl $crate::PersistEnum for $ty {
            const TYPE_NAME: &'static str = $name;

            fn to_repr(self) -> i32 {
                self as i32
            }

            fn from_repr(repr: i32) -> ::core::option::Option<Self> {
                $(
                    if repr == <$ty>::$variant as i32 {
                        return ::core::option::Option::Some(<$ty>::$variant);
                    }
                )+
                ::core::option::Option::None
            }
        }

        impl $crate::Element for $ty {
            const KIND: $crate::ValueKind = $crate::ValueKind::Enum;

            fn type_identity() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(<$ty as $crate::PersistEnum>::TYPE_NAME)
            }

            fn encode(
                &self,
                name_hash: i32,
                enc: &mut $crate::Encoder<'_>,
            ) -> ::core::result::Result<(), $crate::PersistError> {
                $crate::codec::enumeration::encode_enum(*self, name_hash, enc)
            }

            fn decode(
                dec: &mut $crate::Decoder<'_>,
                record: &$crate::Record,
            ) -> ::core::result::Result<Self, $crate::PersistError> {
                $crate::codec::enumeration::decode_enum(dec, record)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Element;
    use crate::config::CodecConfig;
    use crate::scanner::Scanner;
    use crate::types::TypeRegistry;
    use crate::wire::put_record_prefix;

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    enum Mood {
        #[default]
        Calm,
        Angry = 5,
        Sleepy,
    }

    crate::persist_enum!(Mood, "tests::Mood", [Calm, Angry, Sleepy]);

    fn decode<E: Element>(bytes: &[u8]) -> Result<E, PersistError> {
        let config = CodecConfig::default();
        let types = TypeRegistry::new();
        let mut dec = Decoder::new(bytes, &types, &config);
        let record = Scanner::over(bytes).next().unwrap()?;
        E::decode(&mut dec, &record)
    }

    fn enum_record(identity: &str, repr: i32) -> Vec<u8> {
        let mut inner = Vec::new();
        put_record_prefix(&mut inner, Tag::Int, name_hash(VALUE_FIELD));
        put_i32(&mut inner, repr);
        let mut bytes = Vec::new();
        put_record_prefix(&mut bytes, Tag::EnumStart, 0);
        put_str(&mut bytes, identity).unwrap();
        put_i32(&mut bytes, inner.len() as i32);
        bytes.extend_from_slice(&inner);
        put_record_prefix(&mut bytes, Tag::EnumEnd, 0);
        bytes
    }

    #[test]
    fn variants_round_trip_by_repr() {
        for mood in [Mood::Calm, Mood::Angry, Mood::Sleepy] {
            let config = CodecConfig::default();
            let mut enc = Encoder::new(&config);
            mood.encode(0, &mut enc).unwrap();
            assert_eq!(decode::<Mood>(&enc.into_bytes()).unwrap(), mood);
        }
        assert_eq!(Mood::Sleepy.to_repr(), 6);
    }

    #[test]
    fn matches_hand_built_record() {
        assert_eq!(decode::<Mood>(&enum_record("tests::Mood", 5)).unwrap(), Mood::Angry);
    }

    #[test]
    fn unknown_repr_is_recoverable() {
        let err = decode::<Mood>(&enum_record("tests::Mood", 2)).unwrap_err();
        assert!(matches!(err, PersistError::UnknownVariant { repr: 2, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn other_enum_identity_is_recoverable() {
        let err = decode::<Mood>(&enum_record("tests::Weather", 0)).unwrap_err();
        assert!(matches!(err, PersistError::IdentityMismatch { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn missing_value_record_is_format_violation() {
        let mut bytes = Vec::new();
        put_record_prefix(&mut bytes, Tag::EnumStart, 0);
        put_str(&mut bytes, "tests::Mood").unwrap();
        put_i32(&mut bytes, 0);
        put_record_prefix(&mut bytes, Tag::EnumEnd, 0);
        assert!(matches!(
            decode::<Mood>(&bytes),
            Err(PersistError::FormatViolation { .. })
        ));
    }
}
