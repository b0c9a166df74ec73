//! Wire tags and the mappings between value kinds, tags, and codecs.
//!
//! A Rust value is classified statically through [`crate::Element::KIND`]:
//! scalars by exact type, then enumerations, fixed-rank arrays, ordered lists
//! and maps. That kind fixes the Start tag a record is written with, and the
//! Start tag in turn selects the codec that owns the Start/End pair on decode.

use std::fmt;

use crate::error::PersistError;

/// Byte identifying the kind of the record that follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Tag {
    Byte = 1,
    Int = 2,
    UInt = 3,
    Double = 4,
    Text = 5,
    Vector3 = 6,
    ClassStart = 7,
    ClassEnd = 8,
    ListStart = 9,
    ListEnd = 10,
    ArrayStart = 11,
    ArrayEnd = 12,
    WrapperStart = 13,
    WrapperEnd = 14,
    EnumStart = 15,
    EnumEnd = 16,
    MapStart = 17,
    MapEnd = 18,
}

impl Tag {
    /// Decode a tag byte read at `offset`.
    pub fn from_byte(byte: u8, offset: usize) -> Result<Self, PersistError> {
        let tag = match byte {
            1 => Self::Byte,
            2 => Self::Int,
            3 => Self::UInt,
            4 => Self::Double,
            5 => Self::Text,
            6 => Self::Vector3,
            7 => Self::ClassStart,
            8 => Self::ClassEnd,
            9 => Self::ListStart,
            10 => Self::ListEnd,
            11 => Self::ArrayStart,
            12 => Self::ArrayEnd,
            13 => Self::WrapperStart,
            14 => Self::WrapperEnd,
            15 => Self::EnumStart,
            16 => Self::EnumEnd,
            17 => Self::MapStart,
            18 => Self::MapEnd,
            other => {
                return Err(PersistError::format(
                    offset,
                    format!("unknown tag byte {other}"),
                ));
            }
        };
        Ok(tag)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Fixed payload width of a scalar tag, `None` for variable or compound tags.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Byte => Some(1),
            Self::Int | Self::UInt => Some(4),
            Self::Double => Some(8),
            Self::Vector3 => Some(24),
            _ => None,
        }
    }

    pub fn is_start(self) -> bool {
        self.end_tag().is_some()
    }

    pub fn is_end(self) -> bool {
        matches!(
            self,
            Self::ClassEnd
                | Self::ListEnd
                | Self::ArrayEnd
                | Self::WrapperEnd
                | Self::EnumEnd
                | Self::MapEnd
        )
    }

    /// The End tag closing a Start tag.
    pub fn end_tag(self) -> Option<Self> {
        match self {
            Self::ClassStart => Some(Self::ClassEnd),
            Self::ListStart => Some(Self::ListEnd),
            Self::ArrayStart => Some(Self::ArrayEnd),
            Self::WrapperStart => Some(Self::WrapperEnd),
            Self::EnumStart => Some(Self::EnumEnd),
            Self::MapStart => Some(Self::MapEnd),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Semantic kind of a Rust value as seen by the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Byte,
    Int,
    UInt,
    Double,
    Text,
    Vector3,
    Enum,
    Array,
    List,
    Map,
    Class,
}

impl ValueKind {
    /// Tag that opens a record of this kind.
    pub fn start_tag(self) -> Tag {
        match self {
            Self::Byte => Tag::Byte,
            Self::Int => Tag::Int,
            Self::UInt => Tag::UInt,
            Self::Double => Tag::Double,
            Self::Text => Tag::Text,
            Self::Vector3 => Tag::Vector3,
            Self::Enum => Tag::EnumStart,
            Self::Array => Tag::ArrayStart,
            Self::List => Tag::ListStart,
            Self::Map => Tag::MapStart,
            Self::Class => Tag::ClassStart,
        }
    }

    pub fn codec(self) -> CodecKind {
        match self {
            Self::Byte | Self::Int | Self::UInt | Self::Double | Self::Text | Self::Vector3 => {
                CodecKind::Scalar
            }
            Self::Enum => CodecKind::Enum,
            Self::Array => CodecKind::Array,
            Self::List => CodecKind::List,
            Self::Map => CodecKind::Map,
            Self::Class => CodecKind::Class,
        }
    }
}

/// Handler family responsible for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    Scalar,
    Class,
    List,
    Map,
    Enum,
    Array,
}

/// Per-field declaration selecting which codec handles the field.
pub type FieldMarker = CodecKind;

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Tag; 18] = [
        Tag::Byte,
        Tag::Int,
        Tag::UInt,
        Tag::Double,
        Tag::Text,
        Tag::Vector3,
        Tag::ClassStart,
        Tag::ClassEnd,
        Tag::ListStart,
        Tag::ListEnd,
        Tag::ArrayStart,
        Tag::ArrayEnd,
        Tag::WrapperStart,
        Tag::WrapperEnd,
        Tag::EnumStart,
        Tag::EnumEnd,
        Tag::MapStart,
        Tag::MapEnd,
    ];

    #[test]
    fn every_tag_byte_decodes_to_itself() {
        for tag in ALL {
            assert_eq!(Tag::from_byte(tag.as_byte(), 0).unwrap(), tag);
        }
    }

    #[test]
    fn unknown_tag_byte_is_format_violation() {
        assert!(matches!(
            Tag::from_byte(0, 3),
            Err(PersistError::FormatViolation { offset: 3, .. })
        ));
        assert!(Tag::from_byte(200, 0).is_err());
    }

    #[test]
    fn every_start_has_exactly_one_end() {
        for tag in ALL {
            if let Some(end) = tag.end_tag() {
                assert!(end.is_end());
                assert!(!tag.is_end());
            }
        }
        let starts = ALL.iter().filter(|t| t.is_start()).count();
        let ends = ALL.iter().filter(|t| t.is_end()).count();
        assert_eq!(starts, ends);
    }
}
