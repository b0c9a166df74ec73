//! Statically declared field tables and the object-safe view over them.
//!
//! Every persistable type lists its fields once, in declaration order, each
//! with a name, a marker selecting its codec, and an accessor pair. The
//! table is built on first use and shared for the life of the process.

use std::any::Any;
use std::fmt;

use crate::codec::Element;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::hash::name_hash;
use crate::scanner::Record;
use crate::tag::{CodecKind, FieldMarker, Tag, ValueKind};

type EncodeFn<T> = Box<dyn Fn(&T, &mut Encoder<'_>) -> Result<(), PersistError> + Send + Sync>;
type DecodeFn<T> =
    Box<dyn Fn(&mut T, &mut Decoder<'_>, &Record) -> Result<(), PersistError> + Send + Sync>;

/// A type that can be written to and poured from a tagged stream.
///
/// ```ignore
/// impl Persist for Hero {
///     const TYPE_NAME: &'static str = "game::Hero";
///
///     fn fields() -> &'static FieldTable<Self> {
///         static FIELDS: OnceLock<FieldTable<Hero>> = OnceLock::new();
///         FIELDS.get_or_init(|| {
///             FieldTable::builder()
///                 .scalar("health", |h| &h.health, |h| &mut h.health)
///                 .list("items", |h| &h.items, |h| &mut h.items)
///                 .build()
///         })
///     }
/// }
/// ```
pub trait Persist: Default + 'static {
    /// Globally unique type identity written into class headers.
    const TYPE_NAME: &'static str;

    fn fields() -> &'static FieldTable<Self>;

    /// Return to the canonical empty state used after a snapshot is taken.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Object-safe view of a [`Persist`] type, used wherever the concrete type
/// is only known at runtime.
pub trait Persistable: Any {
    /// Identity of the runtime type, not of any declared base.
    fn type_identity(&self) -> &'static str;

    /// Encode every marked field in declaration order; returns how many
    /// fields produced output.
    fn encode_fields(&self, enc: &mut Encoder<'_>) -> Result<usize, PersistError>;

    /// Index of the first field accepting a record with this tag and name hash.
    fn match_field(&self, tag: Tag, name_hash: i32) -> Option<usize>;

    fn decode_field(
        &mut self,
        index: usize,
        dec: &mut Decoder<'_>,
        record: &Record,
    ) -> Result<(), PersistError>;

    fn reset_canonical(&mut self);

    fn as_any(&self) -> &dyn Any;
}

impl<T: Persist> Persistable for T {
    fn type_identity(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn encode_fields(&self, enc: &mut Encoder<'_>) -> Result<usize, PersistError> {
        T::fields().encode(self, enc)
    }

    fn match_field(&self, tag: Tag, name_hash: i32) -> Option<usize> {
        T::fields().find(tag, name_hash)
    }

    fn decode_field(
        &mut self,
        index: usize,
        dec: &mut Decoder<'_>,
        record: &Record,
    ) -> Result<(), PersistError> {
        let field = T::fields().fields.get(index).ok_or_else(|| {
            PersistError::format(record.offset, format!("no field at index {index}"))
        })?;
        (field.decode)(self, dec, record)
    }

    fn reset_canonical(&mut self) {
        Persist::reset(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for dyn Persistable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.type_identity())
    }
}

/// One serializable field of `T`.
pub struct FieldDescriptor<T> {
    name: &'static str,
    name_hash: i32,
    marker: FieldMarker,
    kind: ValueKind,
    encode: EncodeFn<T>,
    decode: DecodeFn<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn name_hash(&self) -> i32 {
        self.name_hash
    }

    pub fn marker(&self) -> FieldMarker {
        self.marker
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the marker selects the codec the field's Rust type needs.
    ///
    /// Mismatched fields write nothing and never match a record.
    pub fn is_supported(&self) -> bool {
        self.marker == self.kind.codec()
    }

    fn accepts(&self, tag: Tag, name_hash: i32) -> bool {
        self.is_supported() && self.kind.start_tag() == tag && self.name_hash == name_hash
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("name_hash", &self.name_hash)
            .field("marker", &self.marker)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Ordered field descriptors of a persistable type.
pub struct FieldTable<T> {
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> FieldTable<T> {
    pub fn builder() -> FieldTableBuilder<T> {
        FieldTableBuilder { fields: Vec::new() }
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field, in declaration order, accepting the record.
    pub fn find(&self, tag: Tag, name_hash: i32) -> Option<usize> {
        self.fields.iter().position(|f| f.accepts(tag, name_hash))
    }

    /// Encode all supported fields of `value`; returns how many wrote bytes.
    pub fn encode(&self, value: &T, enc: &mut Encoder<'_>) -> Result<usize, PersistError> {
        let mut written = 0;
        for field in self.fields.iter().filter(|f| f.is_supported()) {
            let before = enc.position();
            (field.encode)(value, enc)?;
            if enc.position() > before {
                written += 1;
            }
        }
        Ok(written)
    }
}

impl<T> fmt::Debug for FieldTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}

/// Builder for a [`FieldTable`]; fields are recorded in call order.
pub struct FieldTableBuilder<T> {
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> FieldTableBuilder<T> {
    /// Declare a field handled by the codec `marker` selects.
    pub fn field<F, G, M>(mut self, marker: FieldMarker, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Element,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let hash = name_hash(name);
        if marker != F::KIND.codec() {
            tracing::warn!(
                field = name,
                ?marker,
                kind = ?F::KIND,
                "field marker does not fit the field type; field will not be persisted"
            );
        }
        if self
            .fields
            .iter()
            .any(|f| f.name_hash == hash && f.kind == F::KIND && f.name != name)
        {
            tracing::warn!(field = name, "name hash collides with an earlier field");
        }
        self.fields.push(FieldDescriptor {
            name,
            name_hash: hash,
            marker,
            kind: F::KIND,
            encode: Box::new(move |value: &T, enc: &mut Encoder<'_>| get(value).encode(hash, enc)),
            decode: Box::new(
                move |value: &mut T, dec: &mut Decoder<'_>, record: &Record| {
                    *get_mut(value) = F::decode(dec, record)?;
                    Ok(())
                },
            ),
        });
        self
    }

    pub fn scalar<F, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Element,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.field(CodecKind::Scalar, name, get, get_mut)
    }

    pub fn class<F, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Element,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.field(CodecKind::Class, name, get, get_mut)
    }

    pub fn list<F, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Element,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.field(CodecKind::List, name, get, get_mut)
    }

    pub fn map<F, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Element,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.field(CodecKind::Map, name, get, get_mut)
    }

    pub fn enumeration<F, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Element,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.field(CodecKind::Enum, name, get, get_mut)
    }

    pub fn array<F, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Element,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.field(CodecKind::Array, name, get, get_mut)
    }

    pub fn build(self) -> FieldTable<T> {
        FieldTable {
            fields: self.fields,
        }
    }
}
