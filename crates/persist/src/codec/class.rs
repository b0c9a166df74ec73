//! Nested objects, written as a class record carrying the runtime type identity.

use std::borrow::Cow;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::codec::Element;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::field::{Persist, Persistable};
use crate::scanner::Record;
use crate::tag::{Tag, ValueKind};
use crate::wire::put_str;

/// Write `obj` as one class record named by `name_hash`.
///
/// A class whose fields all wrote nothing is refused with
/// `NothingToSerialize`; an empty class record would carry no state.
pub fn encode_object(
    obj: &dyn Persistable,
    name_hash: i32,
    enc: &mut Encoder<'_>,
) -> Result<(), PersistError> {
    let identity = obj.type_identity();
    let open = enc.open(Tag::ClassStart, name_hash, |buf| put_str(buf, identity))?;
    if obj.encode_fields(enc)? == 0 {
        return Err(PersistError::NothingToSerialize(identity.to_string()));
    }
    enc.close(open)
}

/// Pour a class record into an existing object of the same identity.
pub fn decode_into(
    dec: &mut Decoder<'_>,
    record: &Record,
    target: &mut dyn Persistable,
) -> Result<(), PersistError> {
    dec.expect_tag(record, Tag::ClassStart)?;
    let identity = dec.identity(record)?;
    if identity != target.type_identity() {
        return Err(PersistError::IdentityMismatch {
            expected: target.type_identity().to_string(),
            found: identity.to_string(),
        });
    }
    dec.nested(|dec| dec.pour(target, record.inner.clone()))
}

impl<C: Persist> Element for C {
    const KIND: ValueKind = ValueKind::Class;

    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed(C::TYPE_NAME)
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        encode_object(self, name_hash, enc)
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        let mut value = C::default();
        decode_into(dec, record, &mut value)?;
        Ok(value)
    }
}

/// An object whose concrete type is chosen at runtime.
///
/// On decode the stream's type identity picks the constructor from the
/// decoder's [`TypeRegistry`](crate::TypeRegistry), so a field declared as
/// `Option<Polymorph>` round-trips whichever registered type it held.
pub struct Polymorph(Box<dyn Persistable>);

impl Polymorph {
    pub fn new<T: Persist>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn type_identity(&self) -> &'static str {
        self.0.type_identity()
    }

    pub fn downcast_ref<T: Persist>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }
}

impl Deref for Polymorph {
    type Target = dyn Persistable;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl DerefMut for Polymorph {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.0
    }
}

impl fmt::Debug for Polymorph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Polymorph").field(&self.type_identity()).finish()
    }
}

impl Element for Polymorph {
    const KIND: ValueKind = ValueKind::Class;

    fn type_identity() -> Cow<'static, str> {
        Cow::Borrowed("dyn Persistable")
    }

    fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
        encode_object(&*self.0, name_hash, enc)
    }

    fn decode(dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
        dec.expect_tag(record, Tag::ClassStart)?;
        let identity = dec.identity(record)?;
        let mut value = dec.types().create(identity)?;
        decode_into(dec, record, &mut *value)?;
        Ok(Self(value))
    }
}
