//! Fixed-width little-endian primitives.
//!
//! Floats of any precision travel as 8-byte doubles; a vector is three
//! consecutive doubles. Text is an `i32` byte length followed by UTF-8.

use glam::Vec3;

use crate::error::PersistError;
use crate::tag::Tag;

/// Bytes taken by the `[tag][name hash]` prefix of every record.
pub const RECORD_PREFIX_LEN: usize = 1 + 4;

pub fn put_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

pub fn put_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_f64(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Write a length as the format's signed 32-bit length field.
pub fn put_len(buf: &mut Vec<u8>, what: &'static str, len: usize) -> Result<(), PersistError> {
    let len = i32::try_from(len).map_err(|_| PersistError::LimitExceeded {
        what,
        actual: len,
        limit: i32::MAX as usize,
    })?;
    put_i32(buf, len);
    Ok(())
}

pub fn put_str(buf: &mut Vec<u8>, value: &str) -> Result<(), PersistError> {
    put_len(buf, "text length", value.len())?;
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

pub fn put_vec3(buf: &mut Vec<u8>, value: Vec3) {
    put_f64(buf, value.x as f64);
    put_f64(buf, value.y as f64);
    put_f64(buf, value.z as f64);
}

pub fn put_record_prefix(buf: &mut Vec<u8>, tag: Tag, name_hash: i32) {
    put_u8(buf, tag.as_byte());
    put_i32(buf, name_hash);
}

/// Overwrite a previously reserved `i32` length slot.
pub fn patch_len(
    buf: &mut [u8],
    slot: usize,
    what: &'static str,
    len: usize,
) -> Result<(), PersistError> {
    let len = i32::try_from(len).map_err(|_| PersistError::LimitExceeded {
        what,
        actual: len,
        limit: i32::MAX as usize,
    })?;
    buf[slot..slot + 4].copy_from_slice(&len.to_le_bytes());
    Ok(())
}

/// Bounds-checked cursor over a byte range.
///
/// Reads never go past `end`, even when the underlying slice is longer, so a
/// nested record cannot read into its parent's trailing bytes.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            end: data.len(),
        }
    }

    pub fn bounded(data: &'a [u8], pos: usize, end: usize) -> Self {
        Self {
            data,
            pos,
            end: end.min(data.len()),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], PersistError> {
        let available = self.end.saturating_sub(self.pos);
        if n > available {
            return Err(PersistError::TruncatedStream {
                offset: self.pos,
                needed: n,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], PersistError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, PersistError> {
        Ok(self.take(1)?[0])
    }

    pub fn i32(&mut self) -> Result<i32, PersistError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32, PersistError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn f64(&mut self) -> Result<f64, PersistError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Read a signed length field, rejecting negative values.
    pub fn length(&mut self) -> Result<usize, PersistError> {
        let at = self.pos;
        let len = self.i32()?;
        usize::try_from(len).map_err(|_| PersistError::format(at, format!("negative length {len}")))
    }

    pub fn tag(&mut self) -> Result<Tag, PersistError> {
        let at = self.pos;
        Tag::from_byte(self.u8()?, at)
    }

    /// Read length-prefixed UTF-8, refusing declared lengths above `max_len`.
    pub fn str(&mut self, max_len: usize) -> Result<&'a str, PersistError> {
        let len = self.length()?;
        if len > max_len {
            return Err(PersistError::LimitExceeded {
                what: "text length",
                actual: len,
                limit: max_len,
            });
        }
        let at = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map_err(|e| PersistError::format(at, format!("invalid UTF-8: {e}")))
    }

    pub fn vec3(&mut self) -> Result<Vec3, PersistError> {
        let x = self.f64()?;
        let y = self.f64()?;
        let z = self.f64()?;
        Ok(Vec3::new(x as f32, y as f32, z as f32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut buf = Vec::new();
        put_i32(&mut buf, 0x0102_0304);
        assert_eq!(buf, [4, 3, 2, 1]);

        let mut buf = Vec::new();
        put_u32(&mut buf, u32::MAX);
        assert_eq!(ByteReader::new(&buf, 0).u32().unwrap(), u32::MAX);
    }

    #[test]
    fn text_is_byte_length_prefixed() {
        let mut buf = Vec::new();
        put_str(&mut buf, "héllo").unwrap();
        // 'é' is two bytes in UTF-8
        assert_eq!(&buf[..4], &6i32.to_le_bytes());
        let mut reader = ByteReader::new(&buf, 0);
        assert_eq!(reader.str(64).unwrap(), "héllo");
        assert_eq!(reader.pos(), buf.len());
    }

    #[test]
    fn vector_travels_as_three_doubles() {
        let mut buf = Vec::new();
        put_vec3(&mut buf, Vec3::new(1.5, -2.0, 0.25));
        assert_eq!(buf.len(), 24);
        let v = ByteReader::new(&buf, 0).vec3().unwrap();
        assert_eq!(v, Vec3::new(1.5, -2.0, 0.25));
    }

    #[test]
    fn short_buffer_is_truncated_stream() {
        let buf = [1u8, 2, 3];
        let err = ByteReader::new(&buf, 0).i32().unwrap_err();
        assert!(matches!(
            err,
            PersistError::TruncatedStream {
                offset: 0,
                needed: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn bounded_reader_stops_at_end() {
        let buf = [0u8; 16];
        let mut reader = ByteReader::bounded(&buf, 2, 5);
        assert!(reader.take(3).is_ok());
        assert!(reader.u8().is_err());
    }

    #[test]
    fn negative_length_is_format_violation() {
        let mut buf = Vec::new();
        put_i32(&mut buf, -1);
        assert!(matches!(
            ByteReader::new(&buf, 0).length(),
            Err(PersistError::FormatViolation { .. })
        ));
    }

    #[test]
    fn oversized_text_is_refused_before_reading() {
        let mut buf = Vec::new();
        put_i32(&mut buf, 1_000);
        assert!(matches!(
            ByteReader::new(&buf, 0).str(10),
            Err(PersistError::LimitExceeded { actual: 1_000, .. })
        ));
    }

    #[test]
    fn patch_len_overwrites_slot() {
        let mut buf = Vec::new();
        put_i32(&mut buf, 0);
        patch_len(&mut buf, 0, "inner length", 42).unwrap();
        assert_eq!(ByteReader::new(&buf, 0).i32().unwrap(), 42);
    }
}
