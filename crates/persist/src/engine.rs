use crate::codec::class::{decode_into, encode_object};
use crate::config::CodecConfig;
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::PersistError;
use crate::field::Persistable;
use crate::hash::name_hash;
use crate::scanner::Scanner;
use crate::tag::Tag;
use crate::types::TypeRegistry;

/// Entry point for encoding and decoding whole objects.
///
/// Holds the type registry consulted for polymorphic fields and the limits
/// applied to every pass. Both are read-only during a pass, so one engine
/// can serve any number of encodes and decodes.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    types: TypeRegistry,
    config: CodecConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode `root` as a single class record named after its own type.
    pub fn encode(&self, root: &dyn Persistable) -> Result<Vec<u8>, PersistError> {
        self.encode_named(root.type_identity(), root)
    }

    /// Encode `root` as a single class record named `name`.
    pub fn encode_named(&self, name: &str, root: &dyn Persistable) -> Result<Vec<u8>, PersistError> {
        let _span = tracing::debug_span!("encode", root = root.type_identity()).entered();
        let mut enc = Encoder::new(&self.config);
        encode_object(root, name_hash(name), &mut enc)?;
        let bytes = enc.into_bytes();
        tracing::debug!(bytes = bytes.len(), "encoded");
        Ok(bytes)
    }

    /// Pour an encoded root class into `target`.
    ///
    /// The stream must hold exactly one class record whose identity matches
    /// `target`. Fields the stream lacks keep their current values.
    pub fn decode(&self, bytes: &[u8], target: &mut dyn Persistable) -> Result<(), PersistError> {
        let _span = tracing::debug_span!("decode", target = target.type_identity()).entered();
        let mut records = Scanner::over(bytes);
        let root = records
            .next()
            .ok_or_else(|| PersistError::format(0, "empty stream"))??;
        if root.tag != Tag::ClassStart {
            return Err(PersistError::format(
                root.offset,
                format!("root record is {}, expected {}", root.tag, Tag::ClassStart),
            ));
        }
        if let Some(extra) = records.next() {
            let offset = extra.map(|r| r.offset).unwrap_or(root.end);
            return Err(PersistError::format(offset, "trailing data after root record"));
        }
        let mut dec = Decoder::new(bytes, &self.types, &self.config);
        decode_into(&mut dec, &root, target).map_err(PersistError::at_root)
    }
}

/// Encode `root` with default limits and an empty registry.
pub fn encode(root: &dyn Persistable) -> Result<Vec<u8>, PersistError> {
    Engine::default().encode(root)
}

/// Decode into `target` with default limits and an empty registry.
pub fn decode(bytes: &[u8], target: &mut dyn Persistable) -> Result<(), PersistError> {
    Engine::default().decode(bytes, target)
}
