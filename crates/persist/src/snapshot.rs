//! Snapshots: one wrapper record per top-level unit, tagged by category.
//!
//! Each wrapper holds the unit's root class record. On decode the wrapper's
//! category selects the registered target; wrappers for categories nobody
//! registered are stepped over whole.

use std::fmt;

use crate::codec::class::{decode_into, encode_object};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::engine::Engine;
use crate::error::PersistError;
use crate::field::Persistable;
use crate::hash::name_hash;
use crate::tag::Tag;
use crate::wire::put_u8;

/// Discriminator selecting which top-level unit a wrapper belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Category(pub u8);

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category {}", self.0)
    }
}

/// Outcome of a snapshot decode, by category in stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    pub loaded: Vec<Category>,
    /// Wrappers whose category had no registered target.
    pub skipped: Vec<Category>,
}

fn encode_units<'a>(
    engine: &Engine,
    units: impl IntoIterator<Item = (Category, &'a str, &'a dyn Persistable)>,
) -> Result<Vec<u8>, PersistError> {
    let _span = tracing::debug_span!("encode_snapshot").entered();
    let mut enc = Encoder::new(engine.config());
    let mut count = 0usize;
    for (category, name, object) in units {
        let hash = name_hash(name);
        let open = enc.open(Tag::WrapperStart, hash, |buf| {
            put_u8(buf, category.0);
            Ok(())
        })?;
        encode_object(object, hash, &mut enc)?;
        enc.close(open)?;
        tracing::trace!(%category, unit = name, "unit encoded");
        count += 1;
    }
    let bytes = enc.into_bytes();
    tracing::debug!(units = count, bytes = bytes.len(), "snapshot encoded");
    Ok(bytes)
}

/// Encode each `(category, object)` unit in order, naming each wrapper after
/// the object's type identity.
///
/// Units are left untouched; see [`SnapshotOrchestrator::save`] for the
/// encode-then-reset cycle.
pub fn encode_snapshot(
    engine: &Engine,
    units: &[(Category, &dyn Persistable)],
) -> Result<Vec<u8>, PersistError> {
    encode_units(
        engine,
        units
            .iter()
            .map(|&(category, object)| (category, object.type_identity(), object)),
    )
}

/// Decode every wrapper in `bytes` into the target registered for its category.
pub fn decode_snapshot(
    engine: &Engine,
    bytes: &[u8],
    targets: &mut [(Category, &mut (dyn Persistable + 'static))],
) -> Result<SnapshotReport, PersistError> {
    let _span = tracing::debug_span!("decode_snapshot", bytes = bytes.len()).entered();
    let mut dec = Decoder::new(bytes, engine.types(), engine.config());
    let mut report = SnapshotReport::default();
    for record in dec.records(0..bytes.len()) {
        let record = record?;
        if record.tag != Tag::WrapperStart {
            tracing::trace!(tag = %record.tag, offset = record.offset, "non-wrapper record skipped");
            continue;
        }
        let category = Category(record.payload(bytes).u8()?);
        let Some((_, target)) = targets.iter_mut().find(|(c, _)| *c == category) else {
            tracing::debug!(%category, offset = record.offset, "unregistered category skipped");
            report.skipped.push(category);
            continue;
        };
        let target: &mut dyn Persistable = &mut **target;
        dec.nested(|dec| {
            let class = dec
                .records(record.inner.clone())
                .find(|r| r.as_ref().map_or(true, |r| r.tag == Tag::ClassStart))
                .ok_or_else(|| {
                    PersistError::format(record.offset, format!("{category} wrapper holds no class"))
                })??;
            decode_into(dec, &class, target).map_err(PersistError::at_root)
        })?;
        report.loaded.push(category);
    }
    tracing::debug!(
        loaded = report.loaded.len(),
        skipped = report.skipped.len(),
        "snapshot decoded"
    );
    Ok(report)
}

struct Unit<'u> {
    category: Category,
    name: String,
    object: &'u mut (dyn Persistable + 'static),
}

/// Owns the category → unit table for one set of top-level objects.
///
/// Units are borrowed for the orchestrator's lifetime, so the objects stay
/// owned by the caller and are mutated in place by decode and reset.
pub struct SnapshotOrchestrator<'u> {
    engine: Engine,
    units: Vec<Unit<'u>>,
}

impl<'u> SnapshotOrchestrator<'u> {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            units: Vec::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Register `object` under `category`; the wrapper and its root class are
    /// named `name`. Units encode in registration order.
    pub fn register(
        &mut self,
        category: Category,
        name: impl Into<String>,
        object: &'u mut (dyn Persistable + 'static),
    ) -> Result<(), PersistError> {
        if self.units.iter().any(|u| u.category == category) {
            return Err(PersistError::DuplicateCategory(category.0));
        }
        self.units.push(Unit {
            category,
            name: name.into(),
            object,
        });
        Ok(())
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.units.iter().map(|u| u.category)
    }

    /// Encode all units without resetting them.
    pub fn encode_snapshot(&self) -> Result<Vec<u8>, PersistError> {
        encode_units(
            &self.engine,
            self.units
                .iter()
                .map(|u| (u.category, u.name.as_str(), &*u.object as &dyn Persistable)),
        )
    }

    /// Return every unit to its canonical empty state.
    pub fn reset_all(&mut self) {
        for unit in &mut self.units {
            unit.object.reset_canonical();
            tracing::trace!(category = %unit.category, unit = %unit.name, "unit reset");
        }
    }

    /// Encode all units, then reset them. Units are only reset once the
    /// whole snapshot encoded successfully.
    pub fn save(&mut self) -> Result<Vec<u8>, PersistError> {
        let bytes = self.encode_snapshot()?;
        self.reset_all();
        Ok(bytes)
    }

    /// Decode `bytes` into the registered units.
    pub fn decode_snapshot(&mut self, bytes: &[u8]) -> Result<SnapshotReport, PersistError> {
        let mut targets: Vec<(Category, &mut (dyn Persistable + 'static))> = self
            .units
            .iter_mut()
            .map(|u| (u.category, &mut *u.object))
            .collect();
        decode_snapshot(&self.engine, bytes, &mut targets)
    }
}

impl fmt::Debug for SnapshotOrchestrator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotOrchestrator")
            .field("engine", &self.engine)
            .field(
                "units",
                &self
                    .units
                    .iter()
                    .map(|u| (u.category.0, u.name.as_str()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
