//! Key/value maps.
//!
//! Entries are written as alternating key and value records, both named by
//! the entry index. Decoding pairs records strictly by position: record `2i`
//! is the key and record `2i + 1` its value.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::codec::Element;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::hash::index_hash;
use crate::scanner::Record;
use crate::tag::{Tag, ValueKind};

fn encode_entries<'m, K, V>(
    entries: impl Iterator<Item = (&'m K, &'m V)>,
    name_hash: i32,
    enc: &mut Encoder<'_>,
) -> Result<(), PersistError>
where
    K: Element,
    V: Element,
{
    let open = enc.open(Tag::MapStart, name_hash, |_| Ok(()))?;
    for (index, (key, value)) in entries.enumerate() {
        let hash = index_hash(index);
        let before = enc.position();
        key.encode(hash, enc)?;
        let after_key = enc.position();
        value.encode(hash, enc)?;
        // Pairing is positional: both halves must be present.
        let missing = if after_key == before {
            "key"
        } else if enc.position() == after_key {
            "value"
        } else {
            continue;
        };
        return Err(PersistError::format(
            before,
            format!("map entry {index} wrote no {missing} record"),
        ));
    }
    enc.close(open)
}

fn decode_pairs<K, V>(
    dec: &mut Decoder<'_>,
    record: &Record,
    mut insert: impl FnMut(K, V),
) -> Result<(), PersistError>
where
    K: Element,
    V: Element,
{
    dec.expect_tag(record, Tag::MapStart)?;
    dec.nested(|dec| {
        let records = dec
            .records(record.inner.clone())
            .collect::<Result<Vec<_>, _>>()?;
        if records.len() % 2 != 0 {
            return Err(PersistError::format(
                record.offset,
                format!("map holds {} records, expected key/value pairs", records.len()),
            ));
        }
        for pair in records.chunks_exact(2) {
            let key = K::decode(dec, &pair[0])?;
            let value = V::decode(dec, &pair[1])?;
            insert(key, value);
        }
        Ok(())
    })
}

impl<K, V> Element for BTreeMap<K, V>
where
    K: Element + Ord,
    V: Element,
{
    const KIND: ValueKind = ValueKind::Map;

    fn type_identity() -> Cow<'static, str> {
        Cow::Owned(format!("map<{},{}>", K::type_identity(), V::type_identity()))
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        encode_entries(self.iter(), name_hash, enc)
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        let mut map = BTreeMap::new();
        decode_pairs(dec, record, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

impl<K, V, S> Element for HashMap<K, V, S>
where
    K: Element + Eq + Hash,
    V: Element,
    S: BuildHasher + Default + 'static,
{
    const KIND: ValueKind = ValueKind::Map;

    fn type_identity() -> Cow<'static, str> {
        Cow::Owned(format!("map<{},{}>", K::type_identity(), V::type_identity()))
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        encode_entries(self.iter(), name_hash, enc)
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        let mut map = HashMap::default();
        decode_pairs(dec, record, |k, v| {
            map.insert(k, v);
        })?;
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::scanner::Scanner;
    use crate::types::TypeRegistry;
    use crate::wire::{put_i32, put_record_prefix};

    fn encode<E: Element>(value: &E) -> Vec<u8> {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        value.encode(9, &mut enc).unwrap();
        enc.into_bytes()
    }

    fn decode<E: Element>(bytes: &[u8]) -> Result<E, PersistError> {
        let config = CodecConfig::default();
        let types = TypeRegistry::new();
        let mut dec = Decoder::new(bytes, &types, &config);
        let record = Scanner::over(bytes).next().unwrap()?;
        E::decode(&mut dec, &record)
    }

    #[test]
    fn btree_map_round_trips() {
        let map = BTreeMap::from([("gold".to_string(), 12u32), ("iron".to_string(), 3)]);
        assert_eq!(decode::<BTreeMap<String, u32>>(&encode(&map)).unwrap(), map);
    }

    #[test]
    fn hash_map_round_trips() {
        let map: HashMap<i32, String> = HashMap::from([(1, "one".into()), (2, "two".into())]);
        assert_eq!(decode::<HashMap<i32, String>>(&encode(&map)).unwrap(), map);
    }

    #[test]
    fn entry_with_absent_value_is_refused() {
        let map = BTreeMap::from([(1, Some(5u8)), (2, None), (3, Some(7))]);
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        let err = map.encode(9, &mut enc).unwrap_err();
        assert!(matches!(
            err,
            PersistError::FormatViolation { ref reason, .. }
                if reason.contains("entry 1") && reason.contains("value")
        ));
    }

    #[test]
    fn entry_with_absent_key_is_refused() {
        let map = BTreeMap::from([(None, 1u8), (Some(2i32), 2)]);
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        assert!(matches!(
            map.encode(9, &mut enc),
            Err(PersistError::FormatViolation { ref reason, .. }) if reason.contains("key")
        ));
    }

    #[test]
    fn odd_record_count_is_format_violation() {
        let mut inner = Vec::new();
        put_record_prefix(&mut inner, Tag::Int, index_hash(0));
        put_i32(&mut inner, 1);
        let mut bytes = Vec::new();
        put_record_prefix(&mut bytes, Tag::MapStart, 9);
        put_i32(&mut bytes, inner.len() as i32);
        bytes.extend_from_slice(&inner);
        put_record_prefix(&mut bytes, Tag::MapEnd, 9);

        assert!(matches!(
            decode::<BTreeMap<i32, i32>>(&bytes),
            Err(PersistError::FormatViolation { .. })
        ));
    }

    #[test]
    fn map_of_lists_round_trips() {
        let map = BTreeMap::from([(0u8, vec![1.5f64, 2.5]), (1, vec![])]);
        assert_eq!(decode::<BTreeMap<u8, Vec<f64>>>(&encode(&map)).unwrap(), map);
    }
}
