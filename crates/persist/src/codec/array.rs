//! Fixed-shape arrays.
//!
//! An array header carries the element identity, the rank, and one `u8`
//! extent per dimension. Cells follow in row-major order, each named by
//! the hash of its flat index.

use std::borrow::Cow;

use crate::codec::{Element, check_element_identity, decode_elements};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::hash::index_hash;
use crate::scanner::Record;
use crate::tag::{Tag, ValueKind};
use crate::wire::{put_str, put_u8};

/// Largest rank and largest extent an array header can express.
pub const MAX_EXTENT: usize = u8::MAX as usize;

/// A row-major multi-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<E> {
    extents: Vec<usize>,
    cells: Vec<E>,
}

impl<E> Grid<E> {
    /// Build a grid; `cells.len()` must equal the product of `extents`.
    pub fn new(extents: Vec<usize>, cells: Vec<E>) -> Result<Self, PersistError> {
        let Some(expected) = cell_count(&extents) else {
            return Err(PersistError::LimitExceeded {
                what: "grid cells",
                actual: cells.len(),
                limit: usize::MAX,
            });
        };
        if extents.is_empty() || expected != cells.len() {
            return Err(PersistError::LimitExceeded {
                what: "grid cells",
                actual: cells.len(),
                limit: expected,
            });
        }
        Ok(Self { extents, cells })
    }

    /// One-dimensional grid over `cells`.
    pub fn from_vec(cells: Vec<E>) -> Self {
        Self {
            extents: vec![cells.len()],
            cells,
        }
    }

    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    pub fn cells(&self) -> &[E] {
        &self.cells
    }

    pub fn get(&self, index: &[usize]) -> Option<&E> {
        self.flat(index).and_then(|i| self.cells.get(i))
    }

    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut E> {
        self.flat(index).and_then(|i| self.cells.get_mut(i))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.cells.iter()
    }

    fn flat(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.extents.len() {
            return None;
        }
        let mut flat = 0;
        for (&i, &extent) in index.iter().zip(&self.extents) {
            if i >= extent {
                return None;
            }
            flat = flat * extent + i;
        }
        Some(flat)
    }
}

/// Product of `extents`, or `None` if it overflows.
fn cell_count(extents: &[usize]) -> Option<usize> {
    extents.iter().try_fold(1usize, |n, &e| n.checked_mul(e))
}

impl<E> Default for Grid<E> {
    fn default() -> Self {
        Self {
            extents: vec![0],
            cells: Vec::new(),
        }
    }
}

fn encode_cells<E: Element>(
    extents: &[usize],
    cells: &[E],
    name_hash: i32,
    enc: &mut Encoder<'_>,
) -> Result<(), PersistError> {
    if extents.len() > MAX_EXTENT {
        return Err(PersistError::LimitExceeded {
            what: "array rank",
            actual: extents.len(),
            limit: MAX_EXTENT,
        });
    }
    if let Some(&extent) = extents.iter().find(|&&e| e > MAX_EXTENT) {
        return Err(PersistError::LimitExceeded {
            what: "array extent",
            actual: extent,
            limit: MAX_EXTENT,
        });
    }
    let element = E::type_identity();
    let open = enc.open(Tag::ArrayStart, name_hash, |buf| {
        put_str(buf, &element)?;
        put_u8(buf, extents.len() as u8);
        for &extent in extents {
            put_u8(buf, extent as u8);
        }
        Ok(())
    })?;
    for (i, cell) in cells.iter().enumerate() {
        let before = enc.position();
        cell.encode(index_hash(i), enc)?;
        if enc.position() == before {
            return Err(PersistError::format(
                before,
                format!("array cell {i} wrote no record"),
            ));
        }
    }
    enc.close(open)
}

/// Read the header of an array record and decode its cells.
fn decode_cells<E: Element>(
    dec: &mut Decoder<'_>,
    record: &Record,
) -> Result<(Vec<usize>, Vec<E>), PersistError> {
    dec.expect_tag(record, Tag::ArrayStart)?;
    let mut header = record.payload(dec.data());
    let identity = header.str(dec.config().max_string_len)?;
    check_element_identity::<E>(identity, record.offset);
    let rank = header.u8()? as usize;
    let extents = (0..rank)
        .map(|_| header.u8().map(usize::from))
        .collect::<Result<Vec<_>, _>>()?;
    let expected = cell_count(&extents).ok_or_else(|| {
        PersistError::format(
            record.offset,
            format!("array extents {extents:?} overflow the cell count"),
        )
    })?;
    let cells = decode_elements::<E>(dec, record)?;
    if rank == 0 || cells.len() != expected {
        return Err(PersistError::format(
            record.offset,
            format!(
                "array of extents {extents:?} holds {} cells",
                cells.len()
            ),
        ));
    }
    Ok((extents, cells))
}

impl<E: Element> Element for Grid<E> {
    const KIND: ValueKind = ValueKind::Array;

    fn type_identity() -> Cow<'static, str> {
        Cow::Owned(format!("grid<{}>", E::type_identity()))
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        encode_cells(&self.extents, &self.cells, name_hash, enc)
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        let (extents, cells) = decode_cells(dec, record)?;
        Ok(Self { extents, cells })
    }
}

/// Fixed-length arrays are rank-one grids whose extent must match `N`.
impl<E: Element, const N: usize> Element for [E; N] {
    const KIND: ValueKind = ValueKind::Array;

    fn type_identity() -> Cow<'static, str> {
        Cow::Owned(format!("[{}; {N}]", E::type_identity()))
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        encode_cells(&[N], self, name_hash, enc)
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        let (extents, cells) = decode_cells::<E>(dec, record)?;
        if extents != [N] {
            return Err(PersistError::format(
                record.offset,
                format!("expected a [{N}] array, found extents {extents:?}"),
            ));
        }
        cells.try_into().map_err(|cells: Vec<E>| {
            PersistError::format(record.offset, format!("{} cells for [{N}]", cells.len()))
        })
    }
}
