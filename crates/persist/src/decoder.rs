use std::ops::Range;

use crate::config::CodecConfig;
use crate::error::PersistError;
use crate::field::Persistable;
use crate::scanner::{Record, Scanner};
use crate::tag::Tag;
use crate::types::TypeRegistry;

/// Read side of one decode pass over a borrowed buffer.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    types: &'a TypeRegistry,
    config: &'a CodecConfig,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8], types: &'a TypeRegistry, config: &'a CodecConfig) -> Self {
        Self {
            data,
            types,
            config,
            depth: 0,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    pub fn config(&self) -> &'a CodecConfig {
        self.config
    }

    /// Sibling records inside `range`.
    pub fn records(&self, range: Range<usize>) -> Scanner<'a> {
        Scanner::new(self.data, range)
    }

    /// Run `f` one compound level deeper, enforcing the configured depth limit.
    pub fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, PersistError>,
    ) -> Result<T, PersistError> {
        if self.depth >= self.config.max_depth {
            return Err(PersistError::NestingTooDeep {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Fail with `TypeMismatch` unless `record` starts with `expected`.
    pub fn expect_tag(&self, record: &Record, expected: Tag) -> Result<(), PersistError> {
        if record.tag == expected {
            Ok(())
        } else {
            Err(PersistError::TypeMismatch {
                expected: expected.to_string(),
                found: record.tag.to_string(),
            })
        }
    }

    /// Type-identity string at the head of a class, list, enum or array header.
    pub fn identity(&self, record: &Record) -> Result<&'a str, PersistError> {
        record.payload(self.data).str(self.config.max_string_len)
    }

    /// Pour the records in `inner` into the matching fields of `target`.
    ///
    /// Records without a matching field are dropped; fields without a record
    /// keep their current value. Records that fail to resolve a type or
    /// variant are skipped with a warning.
    pub fn pour(
        &mut self,
        target: &mut dyn Persistable,
        inner: Range<usize>,
    ) -> Result<(), PersistError> {
        for record in self.records(inner) {
            let record = record?;
            let Some(index) = target.match_field(record.tag, record.name_hash) else {
                tracing::trace!(
                    tag = %record.tag,
                    name_hash = record.name_hash,
                    target = target.type_identity(),
                    "no matching field, record skipped"
                );
                continue;
            };
            match target.decode_field(index, self, &record) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(
                        offset = record.offset,
                        target = target.type_identity(),
                        error = %e,
                        "record skipped"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
