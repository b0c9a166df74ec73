use std::borrow::Cow;

use crate::codec::{Element, check_element_identity, decode_elements};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::hash::index_hash;
use crate::scanner::Record;
use crate::tag::{Tag, ValueKind};
use crate::wire::put_str;

/// Ordered sequence; element `i` is named by the hash of `i`.
impl<E: Element> Element for Vec<E> {
    const KIND: ValueKind = ValueKind::List;

    fn type_identity() -> Cow<'static, str> {
        Cow::Owned(format!("list<{}>", E::type_identity()))
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        let element = E::type_identity();
        let open = enc.open(Tag::ListStart, name_hash, |buf| put_str(buf, &element))?;
        for (i, item) in self.iter().enumerate() {
            let before = enc.position();
            item.encode(index_hash(i), enc)?;
            if enc.position() == before {
                return Err(PersistError::format(
                    before,
                    format!("list element {i} wrote no record"),
                ));
            }
        }
        enc.close(open)
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        dec.expect_tag(record, Tag::ListStart)?;
        check_element_identity::<E>(dec.identity(record)?, record.offset);
        decode_elements(dec, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::scanner::Scanner;
    use crate::types::TypeRegistry;

    fn round_trip<E: Element>(value: &E) -> Result<E, PersistError> {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        value.encode(1, &mut enc)?;
        let bytes = enc.into_bytes();
        let types = TypeRegistry::new();
        let mut dec = Decoder::new(&bytes, &types, &config);
        let record = Scanner::over(&bytes).next().unwrap()?;
        E::decode(&mut dec, &record)
    }

    #[test]
    fn order_is_preserved() {
        assert_eq!(round_trip(&vec![3, 1, 2]).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn empty_list_still_writes_a_record() {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        Vec::<u8>::new().encode(1, &mut enc).unwrap();
        assert!(enc.position() > 0);
        assert!(round_trip(&Vec::<u8>::new()).unwrap().is_empty());
    }

    #[test]
    fn elements_are_named_by_index() {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        vec![10u8, 20].encode(1, &mut enc).unwrap();
        let bytes = enc.into_bytes();
        let list = Scanner::over(&bytes).next().unwrap().unwrap();
        let hashes: Vec<i32> = Scanner::new(&bytes, list.inner)
            .map(|r| r.unwrap().name_hash)
            .collect();
        assert_eq!(hashes, [index_hash(0), index_hash(1)]);
    }

    #[test]
    fn nested_lists_round_trip() {
        let value = vec![vec!["a".to_string()], vec![], vec!["b".into(), "c".into()]];
        assert_eq!(round_trip(&value).unwrap(), value);
        assert_eq!(
            Vec::<Vec<String>>::type_identity(),
            "list<list<string>>"
        );
    }

    #[test]
    fn absent_element_is_refused() {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        let err = vec![Some(1), None, Some(2)].encode(1, &mut enc).unwrap_err();
        assert!(matches!(
            err,
            PersistError::FormatViolation { ref reason, .. } if reason.contains("element 1")
        ));
    }

    #[test]
    fn present_options_round_trip() {
        let value = vec![Some(4u8), Some(5)];
        assert_eq!(round_trip(&value).unwrap(), value);
    }

    #[test]
    fn element_of_wrong_kind_fails() {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        vec![1u32, 2].encode(1, &mut enc).unwrap();
        let bytes = enc.into_bytes();
        let types = TypeRegistry::new();
        let mut dec = Decoder::new(&bytes, &types, &config);
        let record = Scanner::over(&bytes).next().unwrap().unwrap();
        assert!(matches!(
            Vec::<i32>::decode(&mut dec, &record),
            Err(PersistError::TypeMismatch { .. })
        ));
    }
}
