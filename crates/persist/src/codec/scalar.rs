use std::borrow::Cow;

use glam::Vec3;

use crate::codec::Element;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::scanner::Record;
use crate::tag::ValueKind;
use crate::wire::{ByteReader, put_f64, put_i32, put_str, put_u8, put_u32, put_vec3};

/// Implements [`Element`] for a fixed-kind scalar.
macro_rules! scalar_element {
    ($ty:ty, $kind:ident, $identity:literal, |$v:ident, $buf:ident| $put:expr, |$r:ident, $dec:ident| $get:expr) => {
        impl Element for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn type_identity() -> Cow<'static, str> {
                Cow::Borrowed($identity)
            }

            fn encode(&self, name_hash: i32, enc: &mut Encoder<'_>) -> Result<(), PersistError> {
                let $v = self;
                let $buf = enc.scalar(Self::KIND.start_tag(), name_hash);
                $put
            }

            fn decode($dec: &mut Decoder<'_>, record: &Record) -> Result<Self, PersistError> {
                $dec.expect_tag(record, Self::KIND.start_tag())?;
                let mut $r: ByteReader<'_> = record.payload($dec.data());
                $get
            }
        }
    };
}

scalar_element!(u8, Byte, "u8", |v, buf| {
    put_u8(buf, *v);
    Ok(())
}, |r, _dec| r.u8());

scalar_element!(i32, Int, "i32", |v, buf| {
    put_i32(buf, *v);
    Ok(())
}, |r, _dec| r.i32());

scalar_element!(u32, UInt, "u32", |v, buf| {
    put_u32(buf, *v);
    Ok(())
}, |r, _dec| r.u32());

scalar_element!(f64, Double, "f64", |v, buf| {
    put_f64(buf, *v);
    Ok(())
}, |r, _dec| r.f64());

// Single precision is widened on the wire and narrowed back on read.
scalar_element!(f32, Double, "f32", |v, buf| {
    put_f64(buf, *v as f64);
    Ok(())
}, |r, _dec| Ok(r.f64()? as f32));

scalar_element!(String, Text, "string", |v, buf| put_str(buf, v), |r, dec| {
    Ok(r.str(dec.config().max_string_len)?.to_owned())
});

scalar_element!(Vec3, Vector3, "vec3", |v, buf| {
    put_vec3(buf, *v);
    Ok(())
}, |r, _dec| r.vec3());
