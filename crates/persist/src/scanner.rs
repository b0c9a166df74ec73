//! Shallow, single-pass scan of sibling records.
//!
//! The scanner reads each record's tag and name hash, then works out the
//! record's extent from the fixed scalar widths or the compound header's
//! inner length. It never interprets nested payloads; those are resolved
//! later, and only for records a decoder actually asks for.

use std::ops::Range;

use crate::error::PersistError;
use crate::tag::Tag;
use crate::wire::{ByteReader, RECORD_PREFIX_LEN};

/// One record found at the current nesting depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: Tag,
    pub name_hash: i32,
    /// Offset of the tag byte.
    pub offset: usize,
    /// Offset of the first byte after the tag and name hash.
    pub body: usize,
    /// Nested records of a compound. Empty (at `end`) for scalars.
    pub inner: Range<usize>,
    /// One past the record, including a compound's End record.
    pub end: usize,
}

impl Record {
    pub fn is_compound(&self) -> bool {
        self.tag.is_start()
    }

    /// Reader over the scalar payload, or over a compound's header fields.
    pub fn payload<'a>(&self, data: &'a [u8]) -> ByteReader<'a> {
        let stop = if self.is_compound() {
            self.inner.start
        } else {
            self.end
        };
        ByteReader::bounded(data, self.body, stop)
    }
}

/// Iterator over the records in `range`, yielding at most one error.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8], range: Range<usize>) -> Self {
        Self {
            data,
            pos: range.start,
            end: range.end.min(data.len()),
            done: false,
        }
    }

    /// Scan an entire buffer from the start.
    pub fn over(data: &'a [u8]) -> Self {
        Self::new(data, 0..data.len())
    }

    fn read_record(&mut self) -> Result<Record, PersistError> {
        let offset = self.pos;
        let mut reader = ByteReader::bounded(self.data, offset, self.end);
        let tag = reader.tag()?;
        let name_hash = reader.i32()?;
        let body = reader.pos();

        if tag.is_end() {
            return Err(PersistError::format(
                offset,
                format!("{tag} without a matching start"),
            ));
        }

        if let Some(width) = tag.fixed_width() {
            reader.take(width)?;
            let end = reader.pos();
            return Ok(Record {
                tag,
                name_hash,
                offset,
                body,
                inner: end..end,
                end,
            });
        }

        match tag {
            Tag::Text => {
                let len = reader.length()?;
                reader.take(len)?;
                let end = reader.pos();
                return Ok(Record {
                    tag,
                    name_hash,
                    offset,
                    body,
                    inner: end..end,
                    end,
                });
            }
            Tag::ClassStart | Tag::ListStart | Tag::EnumStart => {
                skip_identity(&mut reader)?;
            }
            Tag::ArrayStart => {
                skip_identity(&mut reader)?;
                let rank = reader.u8()? as usize;
                reader.take(rank)?;
            }
            Tag::WrapperStart => {
                reader.u8()?;
            }
            Tag::MapStart => {}
            _ => unreachable!("scalar and end tags are handled above"),
        }

        let inner_len = reader.length()?;
        let inner_start = reader.pos();
        reader.take(inner_len)?;
        let inner = inner_start..reader.pos();

        let closing_at = reader.pos();
        let closing = reader.tag()?;
        let closing_hash = reader.i32()?;
        let expected = tag.end_tag();
        if Some(closing) != expected || closing_hash != name_hash {
            return Err(PersistError::format(
                closing_at,
                format!(
                    "expected {} for record at offset {offset}, found {closing}",
                    expected.map(|t| t.to_string()).unwrap_or_default()
                ),
            ));
        }

        Ok(Record {
            tag,
            name_hash,
            offset,
            body,
            inner,
            end: reader.pos(),
        })
    }
}

fn skip_identity(reader: &mut ByteReader<'_>) -> Result<(), PersistError> {
    let len = reader.length()?;
    reader.take(len)?;
    Ok(())
}

impl Iterator for Scanner<'_> {
    type Item = Result<Record, PersistError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.end {
            return None;
        }
        match self.read_record() {
            Ok(record) => {
                self.pos = record.end;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for Scanner<'_> {}

/// Byte length of the End record closing a compound.
pub const END_RECORD_LEN: usize = RECORD_PREFIX_LEN;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{put_f64, put_i32, put_record_prefix, put_str, put_u8};

    fn class_record(buf: &mut Vec<u8>, hash: i32, identity: &str, inner: &[u8]) {
        put_record_prefix(buf, Tag::ClassStart, hash);
        put_str(buf, identity).unwrap();
        put_i32(buf, inner.len() as i32);
        buf.extend_from_slice(inner);
        put_record_prefix(buf, Tag::ClassEnd, hash);
    }

    #[test]
    fn scans_scalars_in_order() {
        let mut buf = Vec::new();
        put_record_prefix(&mut buf, Tag::Int, 1);
        put_i32(&mut buf, 7);
        put_record_prefix(&mut buf, Tag::Double, 2);
        put_f64(&mut buf, 0.5);
        put_record_prefix(&mut buf, Tag::Text, 3);
        put_str(&mut buf, "abc").unwrap();

        let records: Vec<Record> = Scanner::over(&buf).collect::<Result<_, _>>().unwrap();
        let tags: Vec<Tag> = records.iter().map(|r| r.tag).collect();
        assert_eq!(tags, [Tag::Int, Tag::Double, Tag::Text]);
        assert_eq!(records[0].body, 5);
        assert_eq!(records[1].offset, 9);
        assert_eq!(records[2].end, buf.len());
    }

    #[test]
    fn compound_is_skipped_without_descending() {
        let mut nested = Vec::new();
        put_record_prefix(&mut nested, Tag::Byte, 9);
        put_u8(&mut nested, 0xff);

        let mut buf = Vec::new();
        class_record(&mut buf, 4, "demo::Thing", &nested);
        put_record_prefix(&mut buf, Tag::Byte, 5);
        put_u8(&mut buf, 1);

        let records: Vec<Record> = Scanner::over(&buf).collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, Tag::ClassStart);
        assert_eq!(records[1].name_hash, 5);
    }

    #[test]
    fn inner_length_lands_on_matching_end() {
        let mut inner = Vec::new();
        put_record_prefix(&mut inner, Tag::Int, 1);
        put_i32(&mut inner, 3);
        let mut buf = Vec::new();
        class_record(&mut buf, 77, "t", &inner);

        let record = Scanner::over(&buf).next().unwrap().unwrap();
        let mut reader = ByteReader::new(&buf, record.inner.end);
        assert_eq!(reader.tag().unwrap(), Tag::ClassEnd);
        assert_eq!(reader.i32().unwrap(), 77);
        assert_eq!(record.end, buf.len());
        assert_eq!(record.end - record.inner.end, END_RECORD_LEN);
    }

    #[test]
    fn wrong_end_tag_is_format_violation() {
        let mut buf = Vec::new();
        put_record_prefix(&mut buf, Tag::MapStart, 1);
        put_i32(&mut buf, 0);
        put_record_prefix(&mut buf, Tag::ListEnd, 1);

        let err = Scanner::over(&buf).next().unwrap().unwrap_err();
        assert!(matches!(err, PersistError::FormatViolation { .. }));
    }

    #[test]
    fn stray_end_is_format_violation() {
        let mut buf = Vec::new();
        put_record_prefix(&mut buf, Tag::ClassEnd, 0);
        assert!(Scanner::over(&buf).next().unwrap().is_err());
    }

    #[test]
    fn inner_length_past_buffer_is_truncated() {
        let mut buf = Vec::new();
        put_record_prefix(&mut buf, Tag::MapStart, 1);
        put_i32(&mut buf, 100);
        let err = Scanner::over(&buf).next().unwrap().unwrap_err();
        assert!(matches!(err, PersistError::TruncatedStream { .. }));
    }

    #[test]
    fn scanner_stops_after_first_error() {
        let buf = [Tag::Int.as_byte(), 0, 0];
        let mut scanner = Scanner::over(&buf);
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn array_header_skips_rank_and_extents() {
        let mut buf = Vec::new();
        put_record_prefix(&mut buf, Tag::ArrayStart, 2);
        put_str(&mut buf, "i32").unwrap();
        put_u8(&mut buf, 2);
        put_u8(&mut buf, 1);
        put_u8(&mut buf, 1);
        let mut inner = Vec::new();
        put_record_prefix(&mut inner, Tag::Int, 0);
        put_i32(&mut inner, 5);
        put_i32(&mut buf, inner.len() as i32);
        buf.extend_from_slice(&inner);
        put_record_prefix(&mut buf, Tag::ArrayEnd, 2);

        let record = Scanner::over(&buf).next().unwrap().unwrap();
        assert_eq!(record.inner.len(), inner.len());
        assert_eq!(record.end, buf.len());
    }
}
