use crate::config::CodecConfig;
use crate::error::PersistError;
use crate::tag::Tag;
use crate::wire::{patch_len, put_i32, put_record_prefix};

/// Append-only writer for one encode pass.
///
/// Compound records are written in a single pass: the header reserves the
/// inner-length slot, nested records follow, and [`Encoder::close`] patches
/// the slot and appends the End record.
#[derive(Debug)]
pub struct Encoder<'c> {
    buf: Vec<u8>,
    config: &'c CodecConfig,
    depth: usize,
}

/// A compound whose End record has not been written yet.
#[must_use = "an opened compound must be closed"]
#[derive(Debug)]
pub struct OpenCompound {
    tag: Tag,
    name_hash: i32,
    len_slot: usize,
}

impl<'c> Encoder<'c> {
    pub fn new(config: &'c CodecConfig) -> Self {
        Self {
            buf: Vec::new(),
            config,
            depth: 0,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        self.config
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Drop everything written after `position`.
    pub fn truncate(&mut self, position: usize) {
        self.buf.truncate(position);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write a scalar record's `[tag][hash]` prefix and return the buffer for its payload.
    pub fn scalar(&mut self, tag: Tag, name_hash: i32) -> &mut Vec<u8> {
        put_record_prefix(&mut self.buf, tag, name_hash);
        &mut self.buf
    }

    /// Open a compound record.
    ///
    /// `header` writes the fields between the name hash and the inner length
    /// (type identity, rank and extents, category).
    pub fn open(
        &mut self,
        tag: Tag,
        name_hash: i32,
        header: impl FnOnce(&mut Vec<u8>) -> Result<(), PersistError>,
    ) -> Result<OpenCompound, PersistError> {
        if self.depth >= self.config.max_depth {
            return Err(PersistError::NestingTooDeep {
                limit: self.config.max_depth,
            });
        }
        let start = self.buf.len();
        put_record_prefix(&mut self.buf, tag, name_hash);
        if let Err(err) = header(&mut self.buf) {
            self.truncate(start);
            return Err(err);
        }
        self.depth += 1;
        let len_slot = self.buf.len();
        put_i32(&mut self.buf, 0);
        Ok(OpenCompound {
            tag,
            name_hash,
            len_slot,
        })
    }

    /// Patch the inner length of `open` and write its End record.
    pub fn close(&mut self, open: OpenCompound) -> Result<(), PersistError> {
        let inner_len = self.buf.len() - (open.len_slot + 4);
        patch_len(&mut self.buf, open.len_slot, "inner length", inner_len)?;
        let end = open
            .tag
            .end_tag()
            .ok_or_else(|| PersistError::format(open.len_slot, "opened a non-compound tag"))?;
        put_record_prefix(&mut self.buf, end, open.name_hash);
        self.depth -= 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use crate::wire::put_u8;

    #[test]
    fn close_patches_inner_length() {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        let open = enc.open(Tag::MapStart, 3, |_| Ok(())).unwrap();
        put_u8(enc.scalar(Tag::Byte, 1), 9);
        enc.close(open).unwrap();
        let bytes = enc.into_bytes();

        let record = Scanner::over(&bytes).next().unwrap().unwrap();
        assert_eq!(record.tag, Tag::MapStart);
        assert_eq!(record.inner.len(), 6);
        assert_eq!(record.end, bytes.len());
    }

    #[test]
    fn open_beyond_max_depth_fails() {
        let config = CodecConfig {
            max_depth: 1,
            ..CodecConfig::default()
        };
        let mut enc = Encoder::new(&config);
        let _outer = enc.open(Tag::MapStart, 0, |_| Ok(())).unwrap();
        assert!(matches!(
            enc.open(Tag::MapStart, 0, |_| Ok(())),
            Err(PersistError::NestingTooDeep { limit: 1 })
        ));
    }

    #[test]
    fn failed_header_leaves_no_trace() {
        let config = CodecConfig {
            max_depth: 1,
            ..CodecConfig::default()
        };
        let mut enc = Encoder::new(&config);
        let err = enc.open(Tag::ClassStart, 5, |buf| {
            put_u8(buf, 1);
            Err(PersistError::format(0, "bad header"))
        });
        assert!(err.is_err());
        assert_eq!(enc.position(), 0);

        // the failed open did not use up the only depth slot
        let open = enc.open(Tag::MapStart, 0, |_| Ok(())).unwrap();
        enc.close(open).unwrap();
    }

    #[test]
    fn truncate_rolls_back() {
        let config = CodecConfig::default();
        let mut enc = Encoder::new(&config);
        let mark = enc.position();
        put_u8(enc.scalar(Tag::Byte, 1), 9);
        enc.truncate(mark);
        assert_eq!(enc.position(), 0);
    }
}
